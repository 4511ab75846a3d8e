//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers cannot mutate the scene graph.
//! - The post-processing chain is fixed: render, depth of field, output.
//!
//! Ships a debug text renderer used by the headless runner and tests. The
//! trait is stable; GPU backends implement it without changing consumers.

mod camera;
mod post;
mod renderer;

pub use camera::{AutoRotate, OrbitConstraints, OrbitControls, PerspectiveCamera};
pub use post::{BokehPass, PostProcessing, ToneMapping, Viewport};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "momiji-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
