/// Errors from reading a scene configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

/// Fatal setup errors. Asset load failures are never fatal and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("no mount target: the output surface is missing")]
    MissingMount,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
