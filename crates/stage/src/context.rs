use momiji_render::{OrbitControls, PerspectiveCamera, PostProcessing, Viewport};
use momiji_scene::SceneGraph;

/// Mutable scene state owned by the frame loop and lent to each component.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub graph: SceneGraph,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    /// Present when drawing goes through the post-processing chain.
    pub post: Option<PostProcessing>,
    pub viewport: Viewport,
    /// Current angle of the scripted orbit, radians.
    pub orbit_angle: f32,
}

impl SceneContext {
    /// Match the camera and post chain to a new viewport.
    pub fn apply_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
        if let Some(post) = &mut self.post {
            post.set_aspect(viewport.aspect());
        }
    }

    /// Water animation phase of the first water surface.
    pub fn water_time(&mut self) -> Option<f32> {
        self.graph.waters_mut().next().map(|w| w.time)
    }
}
