//! Stage: assembles the garden scene and drives it frame by frame.
//!
//! The [`FrameLoop`] owns a [`SceneContext`] and the four components that
//! write into it: [`SceneAssembler`], [`EnvironmentSetup`],
//! [`TimeDisplayUpdater`] and the camera/water animation. Asynchronous loads
//! are owned as cancellable task sets and land between frames.
//!
//! # Invariants
//! - A tick never suspends; its steps always run in the same order.
//! - A failed asset load is logged and leaves that element absent. It is never fatal.
//! - The core batch reports readiness exactly once, after every core load settles.
//! - At most one clock text mesh is in the graph at any time.

mod assembler;
mod clock;
mod config;
mod context;
mod environment;
mod error;
mod foliage;
mod frame_loop;
mod tasks;

#[cfg(test)]
mod testing;

pub use assembler::{AssemblyEvent, CoreBatch, SceneAssembler};
pub use clock::{
    format_minute, ClockPhase, ClockSettings, RefreshKind, SystemClock, TimeDisplayUpdater,
    WallClock, MINUTES_PER_DAY,
};
pub use config::{CameraSettings, PostSettings, SceneConfig};
pub use context::SceneContext;
pub use environment::{
    sun_direction, EnvironmentParameters, EnvironmentSetup, SkyParameters, WaterParameters,
};
pub use error::{ConfigError, SetupError};
pub use foliage::{compose as compose_foliage, parse_positions, SplitMix64};
pub use frame_loop::{
    FrameLoop, FrameOutcome, FrameTimer, RunSummary, StopHandle, WATER_PHASE_STEP,
};
pub use tasks::TaskSet;

pub fn crate_info() -> &'static str {
    "momiji-stage v0.1.0"
}
