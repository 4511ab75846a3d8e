//! Preview Backend: wgpu drawing of the garden scene as proxy geometry.
//!
//! Draws each loaded model as a box at its world placement, the water and the
//! clock text as thin slabs, with sun lighting, linear fog and ACES tone
//! mapping. Textures and the depth-of-field pass are not drawn.
//!
//! # Invariants
//! - The renderer never mutates the scene graph.
//! - A lost or outdated surface is reconfigured and the frame is skipped.

mod frame;
mod gpu;
mod shaders;

use momiji_render::{PerspectiveCamera, PostProcessing, Renderer, ToneMapping, Viewport};
use momiji_scene::SceneGraph;

pub use frame::{
    build_instances, clear_color, frame_uniforms, FrameUniforms, InstanceData, MAX_INSTANCES,
    MODEL_PROXY_SIZE,
};
pub use gpu::PreviewPipeline;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("cannot create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter")]
    NoAdapter,
    #[error("cannot open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface frame unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// What one presented frame contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewFrame {
    pub instances: usize,
    pub composed: bool,
}

/// Window-backed [`Renderer`] presenting through a wgpu surface.
pub struct PreviewRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: PreviewPipeline,
    viewport: Viewport,
    tone_mapping: ToneMapping,
    warned_bokeh: bool,
}

impl PreviewRenderer {
    /// Open a surface on `target` and set up the pipeline at `viewport`'s physical size.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> Result<Self, PreviewError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(PreviewError::NoAdapter)?;
        tracing::info!(adapter = ?adapter.get_info().name, "GPU adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("momiji_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let (width, height) = viewport.physical_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipeline = PreviewPipeline::new(&device, format, config.width, config.height);
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            viewport,
            tone_mapping: ToneMapping::default(),
            warned_bokeh: false,
        })
    }

    fn draw(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        composed: bool,
    ) -> Result<PreviewFrame, PreviewError> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.config);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let instances = build_instances(scene);
        let uniforms = frame_uniforms(scene, camera, self.tone_mapping);
        self.pipeline.draw(
            &self.device,
            &self.queue,
            &view,
            clear_color(scene),
            &uniforms,
            &instances,
        );
        output.present();

        Ok(PreviewFrame {
            instances: instances.len().min(MAX_INSTANCES),
            composed,
        })
    }
}

impl Renderer for PreviewRenderer {
    type Output = Result<PreviewFrame, PreviewError>;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output {
        self.draw(scene, camera, false)
    }

    fn render_composed(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        post: &PostProcessing,
    ) -> Self::Output {
        if !self.warned_bokeh {
            tracing::warn!(
                focus = post.bokeh.focus,
                aperture = post.bokeh.aperture,
                "depth of field is not drawn by the preview backend"
            );
            self.warned_bokeh = true;
        }
        let tone_mapping = std::mem::replace(&mut self.tone_mapping, post.output);
        let frame = self.draw(scene, camera, true);
        self.tone_mapping = tone_mapping;
        frame
    }

    fn set_size(&mut self, viewport: Viewport) {
        let (width, height) = viewport.physical_size();
        self.viewport = viewport;
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.pipeline.resize(&self.device, width, height);
        tracing::debug!(width, height, "surface resized");
    }

    fn size(&self) -> Viewport {
        self.viewport
    }

    fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        self.tone_mapping = tone_mapping;
    }
}

pub fn crate_info() -> &'static str {
    "momiji-render-wgpu v0.1.0"
}
