//! The per-frame driver.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use momiji_assets::AssetLoader;
use momiji_render::{AutoRotate, OrbitControls, PerspectiveCamera, PostProcessing, Renderer, Viewport};
use momiji_scene::SceneGraph;

use crate::assembler::{AssemblyEvent, SceneAssembler};
use crate::clock::{TimeDisplayUpdater, WallClock};
use crate::config::SceneConfig;
use crate::context::SceneContext;
use crate::environment::EnvironmentSetup;
use crate::error::SetupError;

/// Water phase advance per tick, calibrated for 60 ticks per second.
pub const WATER_PHASE_STEP: f32 = 0.4 / 60.0;

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome<O> {
    Drawn(O),
    /// Core assets are still loading; nothing was drawn.
    Waiting,
    /// The loop has been stopped.
    Stopped,
}

/// Shared running flag. Clone it to stop the loop from elsewhere on the same thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn stop(&self) {
        self.0.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.0.get()
    }
}

/// Totals from [`FrameLoop::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary<O> {
    pub ticks: u64,
    pub drawn: u64,
    pub waiting: u64,
    pub last_frame: Option<O>,
}

/// Wall-clock interval between consecutive ticks, with a smoothed mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
    mean_ms: Option<f64>,
}

impl FrameTimer {
    /// Weight of the newest interval in the mean.
    const SMOOTHING: f64 = 0.1;

    /// Record a tick at `now`. Returns the milliseconds since the previous tick.
    pub fn lap(&mut self, now: Instant) -> Option<f64> {
        let last = self.last.replace(now)?;
        let ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
        self.mean_ms = Some(match self.mean_ms {
            Some(mean) => mean + (ms - mean) * Self::SMOOTHING,
            None => ms,
        });
        Some(ms)
    }

    pub fn mean_ms(&self) -> Option<f64> {
        self.mean_ms
    }

    pub fn fps(&self) -> Option<f64> {
        self.mean_ms.filter(|ms| *ms > 0.0).map(|ms| 1000.0 / ms)
    }
}

/// Owns the scene context and every component, and advances them once per
/// display refresh.
///
/// A tick first lands whatever loads finished since the previous tick, then
/// runs its steps in a fixed order without suspending: camera orbit, water
/// phase, clock check, draw. Drawing is held back until the core assets have
/// all settled.
pub struct FrameLoop<R: Renderer> {
    context: SceneContext,
    assembler: SceneAssembler,
    environment: EnvironmentSetup,
    clock_display: TimeDisplayUpdater,
    loader: Box<dyn AssetLoader>,
    clock: Box<dyn WallClock>,
    renderer: R,
    auto_rotate: Option<AutoRotate>,
    running: StopHandle,
    cancelled: bool,
    ticks: u64,
    first_paint: Option<u64>,
    frame_timer: FrameTimer,
}

impl<R: Renderer> FrameLoop<R> {
    /// Build the scene into the given mount. `None` means the output surface
    /// is missing; setup is abandoned and nothing is created.
    pub fn mount(
        config: &SceneConfig,
        viewport: Option<Viewport>,
        loader: Box<dyn AssetLoader>,
        mut renderer: R,
        clock: Box<dyn WallClock>,
    ) -> Result<Self, SetupError> {
        let Some(viewport) = viewport else {
            tracing::error!("mount target missing; scene setup aborted");
            return Err(SetupError::MissingMount);
        };
        let _span = tracing::info_span!("mount", width = viewport.width, height = viewport.height).entered();

        let mut graph = SceneGraph::new();
        let cam = config.camera;
        let mut camera = PerspectiveCamera::new(cam.fov, viewport.aspect(), cam.near, cam.far);
        camera.position = cam.position;

        let environment =
            EnvironmentSetup::apply(&config.environment, &config.catalog, &mut graph, loader.as_ref());

        let mut controls = OrbitControls::new(environment.camera_bounds());
        controls.update(&mut camera);

        let tone_mapping = environment.tone_mapping();
        renderer.set_size(viewport);
        renderer.set_tone_mapping(tone_mapping);

        let post = config.post.enabled.then(|| {
            let mut post = PostProcessing::new(config.post.bokeh, tone_mapping);
            post.set_aspect(viewport.aspect());
            post
        });

        let assembler = SceneAssembler::start(&config.catalog, loader.as_ref());
        let clock_display = TimeDisplayUpdater::new(config.catalog.font.clone(), &config.clock);

        tracing::info!(
            post = post.is_some(),
            auto_rotate = cam.auto_rotate.is_some(),
            "scene mounted"
        );

        Ok(Self {
            context: SceneContext {
                graph,
                camera,
                controls,
                post,
                viewport,
                orbit_angle: 0.0,
            },
            assembler,
            environment,
            clock_display,
            loader,
            clock,
            renderer,
            auto_rotate: cam.auto_rotate,
            running: StopHandle::new(),
            cancelled: false,
            ticks: 0,
            first_paint: None,
            frame_timer: FrameTimer::default(),
        })
    }

    /// Run one frame.
    pub fn tick(&mut self) -> FrameOutcome<R::Output> {
        if !self.running.is_running() {
            self.cancel_loads();
            return FrameOutcome::Stopped;
        }
        self.ticks += 1;
        let _span = tracing::debug_span!("tick", n = self.ticks).entered();
        if let Some(frame_ms) = self.frame_timer.lap(Instant::now()) {
            tracing::debug!(frame_ms, fps = self.frame_timer.fps().unwrap_or(0.0), "frame time");
        }

        let ctx = &mut self.context;
        for event in self.assembler.settle(&mut ctx.graph) {
            if event == AssemblyEvent::CoreReady {
                tracing::info!(tick = self.ticks, "core scene complete");
            }
        }
        self.environment.settle(&mut ctx.graph);
        self.clock_display.settle(&mut ctx.graph);

        if let Some(spin) = &self.auto_rotate {
            spin.advance(&mut ctx.orbit_angle, &mut ctx.camera);
        }

        for water in ctx.graph.waters_mut() {
            water.time += WATER_PHASE_STEP;
        }

        self.clock_display
            .check(self.clock.as_ref(), self.loader.as_ref());

        if !self.assembler.is_core_ready() {
            return FrameOutcome::Waiting;
        }
        if self.first_paint.is_none() {
            tracing::info!(tick = self.ticks, "first paint");
            self.first_paint = Some(self.ticks);
        }

        let frame = match &ctx.post {
            Some(post) => self.renderer.render_composed(&ctx.graph, &ctx.camera, post),
            None => self.renderer.render(&ctx.graph, &ctx.camera),
        };
        FrameOutcome::Drawn(frame)
    }

    /// Tick until stopped or `max_ticks` ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> RunSummary<R::Output> {
        let mut summary = RunSummary {
            ticks: 0,
            drawn: 0,
            waiting: 0,
            last_frame: None,
        };
        while summary.ticks < max_ticks {
            match self.tick() {
                FrameOutcome::Drawn(frame) => {
                    summary.drawn += 1;
                    summary.last_frame = Some(frame);
                }
                FrameOutcome::Waiting => summary.waiting += 1,
                FrameOutcome::Stopped => break,
            }
            summary.ticks += 1;
        }
        summary
    }

    /// Respond to a viewport size change. Applying the same size twice is a no-op.
    pub fn resize(&mut self, viewport: Viewport) {
        self.context.apply_viewport(viewport);
        self.renderer.set_size(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "resized");
    }

    /// Orbit from a mouse drag, in pixels.
    pub fn orbit_by_pixels(&mut self, dx: f32, dy: f32) {
        let ctx = &mut self.context;
        ctx.controls.rotate_by_pixels(dx, dy);
        ctx.controls.update(&mut ctx.camera);
    }

    /// Zoom from a wheel step. Positive moves closer.
    pub fn zoom(&mut self, delta: f32) {
        let ctx = &mut self.context;
        ctx.controls.zoom(delta);
        ctx.controls.update(&mut ctx.camera);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    /// Stop the loop and cancel every load still in flight.
    pub fn shutdown(&mut self) {
        self.running.stop();
        self.cancel_loads();
    }

    fn cancel_loads(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        let cancelled = self.assembler.cancel_all()
            + self.environment.cancel_all()
            + self.clock_display.cancel_all();
        tracing::info!(ticks = self.ticks, cancelled, "frame loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick on which the first frame was drawn.
    pub fn first_paint(&self) -> Option<u64> {
        self.first_paint
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.context
    }

    pub fn assembler(&self) -> &SceneAssembler {
        &self.assembler
    }

    pub fn environment(&self) -> &EnvironmentSetup {
        &self.environment
    }

    pub fn clock_display(&self) -> &TimeDisplayUpdater {
        &self.clock_display
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
