use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use momiji_assets::{FsAssetLoader, LoadTier};
use momiji_render::{DebugTextRenderer, Viewport};
use momiji_stage::{sun_direction, FrameLoop, SceneConfig, SystemClock};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "momiji-cli", about = "CLI tool for the momiji garden scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the default scene config
    Config {
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: Format,
    },
    /// List the models a config would load, by tier
    Catalog {
        /// Scene config (.yaml, .yml or .json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the sun direction for an inclination and azimuth
    Sun {
        #[arg(long, default_value = "0.49")]
        inclination: f64,
        #[arg(long, default_value = "0.205")]
        azimuth: f64,
    },
    /// Run the frame loop headless and print the last frame
    Run {
        /// Number of ticks to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Directory asset paths are resolved against
        #[arg(long, default_value = ".")]
        assets: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Orbit the camera around the garden automatically
        #[arg(long)]
        auto_rotate: bool,
        /// Draw directly instead of through the post-processing chain
        #[arg(long)]
        no_post: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("momiji-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", momiji_common::crate_info());
            println!("assets: {}", momiji_assets::crate_info());
            println!("scene: {}", momiji_scene::crate_info());
            println!("render: {}", momiji_render::crate_info());
            println!("stage: {}", momiji_stage::crate_info());
        }
        Commands::Config { format } => {
            let config = SceneConfig::default();
            let text = match format {
                Format::Yaml => config.to_yaml()?,
                Format::Json => config.to_json()?,
            };
            println!("{text}");
        }
        Commands::Catalog { config } => {
            let config = load_config(config.as_ref())?;
            let catalog = &config.catalog;
            for (name, tier) in [("core", LoadTier::Core), ("extra", LoadTier::Extra)] {
                let entries: Vec<_> = catalog.entries.iter().filter(|e| e.tier == tier).collect();
                println!("{name} ({}):", entries.len());
                for entry in entries {
                    let t = entry.transform();
                    println!(
                        "  {} pos=({:.2}, {:.2}, {:.2}) scale=({:.3}, {:.3}, {:.3})",
                        entry.label(),
                        t.position.x,
                        t.position.y,
                        t.position.z,
                        t.scale.x,
                        t.scale.y,
                        t.scale.z,
                    );
                }
            }
            for foliage in &catalog.foliage {
                println!(
                    "foliage: {} decorated with {} from {}",
                    foliage.base.label(),
                    foliage.decoration.label(),
                    foliage.positions
                );
            }
            println!("water normals: {}", catalog.water_normals);
            println!("background: {}", catalog.background);
            println!("font: {}", catalog.font);
        }
        Commands::Sun {
            inclination,
            azimuth,
        } => {
            let dir = sun_direction(inclination, azimuth);
            println!(
                "inclination={inclination} azimuth={azimuth} -> ({:.6}, {:.6}, {:.6})",
                dir.x, dir.y, dir.z
            );
        }
        Commands::Run {
            frames,
            width,
            height,
            assets,
            config,
            auto_rotate,
            no_post,
        } => {
            let mut config = load_config(config.as_ref())?;
            if auto_rotate && config.camera.auto_rotate.is_none() {
                config.camera.auto_rotate = Some(Default::default());
            }
            if no_post {
                config.post.enabled = false;
            }
            let viewport = (width > 0 && height > 0).then(|| Viewport::new(width, height));

            let mut frame_loop = FrameLoop::mount(
                &config,
                viewport,
                Box::new(FsAssetLoader::new(assets)?),
                DebugTextRenderer::new(),
                Box::new(SystemClock::new(config.clock.utc_offset_minutes)),
            )?;
            let summary = frame_loop.run(frames);
            frame_loop.shutdown();

            println!(
                "ticks={} drawn={} waiting={} first_paint={:?}",
                summary.ticks,
                summary.drawn,
                summary.waiting,
                frame_loop.first_paint()
            );
            if let Some(fps) = frame_loop.frame_timer().fps() {
                println!("mean_fps={fps:.1}");
            }
            println!(
                "placed={} failed={} clock_regenerations={}",
                frame_loop.assembler().placed(),
                frame_loop.assembler().failed(),
                frame_loop.clock_display().regenerations()
            );
            match summary.last_frame {
                Some(frame) => print!("{frame}"),
                None => println!("core assets never finished loading; nothing drawn"),
            }
        }
    }

    Ok(())
}
