use std::fmt::Write as _;

use momiji_scene::{NodeContent, SceneGraph};

use crate::camera::PerspectiveCamera;
use crate::post::{PostProcessing, ToneMapping, Viewport};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene graph and a camera, then produces output.
/// It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Draw the scene directly.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output;

    /// Draw the scene through the post-processing chain.
    fn render_composed(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        post: &PostProcessing,
    ) -> Self::Output;

    fn set_size(&mut self, viewport: Viewport);

    fn size(&self) -> Viewport;

    fn set_tone_mapping(&mut self, tone_mapping: ToneMapping);
}

/// Produces a human-readable description of each frame.
/// Useful for CLI output, logging, and testing the frame loop.
#[derive(Debug)]
pub struct DebugTextRenderer {
    viewport: Viewport,
    tone_mapping: ToneMapping,
    frames: u64,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(1, 1),
            tone_mapping: ToneMapping::default(),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    fn describe(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}, exposure {:.2}) ===",
            self.frames,
            self.viewport.width,
            self.viewport.height,
            self.tone_mapping.exposure()
        );
        let _ = writeln!(
            out,
            "Nodes: {} ({} model subtrees)",
            scene.len(),
            scene.model_count()
        );
        let p = camera.position;
        let t = camera.target;
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov, camera.aspect
        );
        if let Some(fog) = scene.fog() {
            let _ = writeln!(out, "Fog: {:.0}..{:.0}", fog.near, fog.far);
        }

        for (id, node) in scene.nodes() {
            let detail = match &node.content {
                NodeContent::Text(text) => format!(" \"{}\"", text.text),
                NodeContent::Water(water) => format!(" t={:.4}", water.time),
                NodeContent::Model(model) => format!(" meshes={}", model.meshes.len()),
                _ => String::new(),
            };
            let p = node.transform.position;
            let _ = writeln!(
                out,
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2}){}",
                id.short(),
                node.content.kind(),
                node.label,
                p.x,
                p.y,
                p.z,
                detail
            );
        }
        out
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> String {
        self.describe(scene, camera)
    }

    fn render_composed(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        post: &PostProcessing,
    ) -> String {
        let mut out = self.describe(scene, camera);
        let _ = writeln!(
            out,
            "Passes: {} (focus {:.2}, aperture {:.4}, max blur {:.3}, aspect {:.3})",
            PostProcessing::PASSES.join(" -> "),
            post.bokeh.focus,
            post.bokeh.aperture,
            post.bokeh.max_blur,
            post.bokeh.aspect
        );
        out
    }

    fn set_size(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn size(&self) -> Viewport {
        self.viewport
    }

    fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        self.tone_mapping = tone_mapping;
    }
}
