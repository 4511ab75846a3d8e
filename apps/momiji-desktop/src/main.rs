use anyhow::Result;
use clap::Parser;
use momiji_assets::FsAssetLoader;
use momiji_render::Viewport;
use momiji_render_wgpu::{PreviewError, PreviewRenderer};
use momiji_stage::{FrameLoop, FrameOutcome, SceneConfig, SetupError, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll per wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

#[derive(Parser)]
#[command(name = "momiji-desktop", about = "Momiji garden viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory asset paths are resolved against
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Scene config (.yaml, .yml or .json); defaults reproduce the garden
    #[arg(long)]
    config: Option<PathBuf>,

    /// Orbit the camera around the garden automatically
    #[arg(long)]
    auto_rotate: bool,
}

fn viewport_of(window: &Window) -> Viewport {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<u32>(scale);
    Viewport {
        width: logical.width,
        height: logical.height,
        pixel_ratio: scale as f32,
    }
}

struct GardenApp {
    config: SceneConfig,
    loader: FsAssetLoader,
    window: Option<Arc<Window>>,
    frame_loop: Option<FrameLoop<PreviewRenderer>>,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl GardenApp {
    fn new(config: SceneConfig, loader: FsAssetLoader) -> Self {
        Self {
            config,
            loader,
            window: None,
            frame_loop: None,
            dragging: false,
            cursor: None,
        }
    }

    /// Open the window and build the scene into it.
    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SetupError> {
        let attrs = Window::default_attributes()
            .with_title("Momiji Garden")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!(error = %e, "cannot create window");
                return Err(SetupError::MissingMount);
            }
        };
        let viewport = viewport_of(&window);
        let renderer = match PreviewRenderer::new(window.clone(), viewport) {
            Ok(renderer) => renderer,
            Err(e) => {
                tracing::error!(error = %e, "cannot open render surface");
                return Err(SetupError::MissingMount);
            }
        };

        let frame_loop = FrameLoop::mount(
            &self.config,
            Some(viewport),
            Box::new(self.loader.clone()),
            renderer,
            Box::new(SystemClock::new(self.config.clock.utc_offset_minutes)),
        )?;
        window.request_redraw();
        self.window = Some(window);
        self.frame_loop = Some(frame_loop);
        Ok(())
    }
}

impl ApplicationHandler for GardenApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.mount(event_loop) {
            tracing::error!(error = %e, "scene setup failed");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(frame_loop)) = (&self.window, &mut self.frame_loop) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                frame_loop.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                frame_loop.resize(viewport_of(window));
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    frame_loop.orbit_by_pixels(
                        (position.x - last.x) as f32,
                        (position.y - last.y) as f32,
                    );
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_NOTCH,
                };
                frame_loop.zoom(notches);
            }
            WindowEvent::RedrawRequested => {
                match frame_loop.tick() {
                    FrameOutcome::Drawn(Err(PreviewError::Surface(
                        e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated),
                    ))) => {
                        tracing::debug!(error = %e, "surface reconfigured, frame skipped");
                    }
                    FrameOutcome::Drawn(Err(PreviewError::Surface(wgpu::SurfaceError::OutOfMemory))) => {
                        tracing::error!("GPU out of memory");
                        frame_loop.shutdown();
                        event_loop.exit();
                        return;
                    }
                    FrameOutcome::Drawn(Err(e)) => {
                        tracing::warn!(error = %e, "frame dropped");
                    }
                    FrameOutcome::Drawn(Ok(_)) | FrameOutcome::Waiting => {}
                    FrameOutcome::Stopped => {
                        event_loop.exit();
                        return;
                    }
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("momiji-desktop starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if cli.auto_rotate && config.camera.auto_rotate.is_none() {
        config.camera.auto_rotate = Some(Default::default());
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let loader = FsAssetLoader::new(cli.assets)?;
    let mut app = GardenApp::new(config, loader);
    event_loop.run_app(&mut app)?;

    Ok(())
}
