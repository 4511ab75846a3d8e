//! The clock readout: a text mesh rebuilt whenever the wall-clock minute changes.

use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use momiji_assets::{AssetError, AssetLoader};
use momiji_common::{NodeId, Transform};
use momiji_scene::{NodeContent, SceneGraph, TextMesh, TextStyle};
use serde::{Deserialize, Serialize};

use crate::tasks::TaskSet;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Source of the current minute of the day, in [0, 1440).
pub trait WallClock {
    fn minute_of_day(&self) -> u32;
}

/// System time shifted by a fixed UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    pub utc_offset_minutes: i32,
}

impl SystemClock {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self { utc_offset_minutes }
    }
}

impl WallClock for SystemClock {
    fn minute_of_day(&self) -> u32 {
        let minutes = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_secs() / 60) as i64)
            .unwrap_or(0);
        (minutes + self.utc_offset_minutes as i64).rem_euclid(MINUTES_PER_DAY as i64) as u32
    }
}

/// `HH:MM` for a minute of the day.
pub fn format_minute(minute: u32) -> String {
    let minute = minute % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Where and how the readout is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    pub utc_offset_minutes: i32,
    pub position: Vec3,
    pub scale: f32,
    pub style: TextStyle,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            position: Vec3::new(-18.0, 2.0, 5.0),
            scale: 0.1,
            style: TextStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    /// No build in flight.
    Stable,
    /// At least one text build in flight.
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// First reading since startup.
    Initial,
    /// The minute changed since the last reading.
    Rollover,
}

struct Build {
    minute: u32,
    result: Result<TextMesh, AssetError>,
}

/// Keeps a single text mesh in the graph showing the current time.
///
/// Overlapping builds are not serialised: whichever resolves last is what
/// stays in the graph.
pub struct TimeDisplayUpdater {
    font_path: String,
    style: TextStyle,
    placement: Transform,
    observed: Option<u32>,
    shown_minute: Option<u32>,
    shown: Option<NodeId>,
    builds: TaskSet<Build>,
    regenerations: u64,
}

impl TimeDisplayUpdater {
    pub fn new(font_path: impl Into<String>, settings: &ClockSettings) -> Self {
        Self {
            font_path: font_path.into(),
            style: settings.style,
            placement: Transform {
                position: settings.position,
                scale: Vec3::splat(settings.scale),
                ..Transform::default()
            },
            observed: None,
            shown_minute: None,
            shown: None,
            builds: TaskSet::new(),
            regenerations: 0,
        }
    }

    /// Record a minute reading. Returns what kind of refresh it calls for, if any.
    pub fn observe(&mut self, minute: u32) -> Option<RefreshKind> {
        let kind = match self.observed {
            Some(last) if last == minute => return None,
            Some(_) => RefreshKind::Rollover,
            None => RefreshKind::Initial,
        };
        self.observed = Some(minute);
        if kind == RefreshKind::Rollover {
            self.regenerations += 1;
        }
        Some(kind)
    }

    /// Read the clock and start a text build if the minute changed.
    pub fn check(&mut self, clock: &dyn WallClock, loader: &dyn AssetLoader) -> Option<RefreshKind> {
        let minute = clock.minute_of_day();
        let kind = self.observe(minute)?;
        tracing::debug!(minute, ?kind, "clock refresh");

        let text = format_minute(minute);
        let style = self.style;
        let font = loader.load_font(&self.font_path);
        self.builds.spawn(async move {
            let result = font.await.map(|font| TextMesh {
                text,
                font_family: font.family,
                style,
            });
            Build { minute, result }
        });
        Some(kind)
    }

    /// Swap in finished builds, in completion order. Returns the minute now shown if it changed.
    pub fn settle(&mut self, graph: &mut SceneGraph) -> Option<u32> {
        let mut swapped = None;
        for build in self.builds.poll_ready() {
            match build.result {
                Ok(mesh) => {
                    if let Some(old) = self.shown.take() {
                        graph.detach(old);
                    }
                    let label = format!("clock {}", mesh.text);
                    self.shown = Some(graph.attach(label, self.placement, NodeContent::Text(mesh)));
                    self.shown_minute = Some(build.minute);
                    swapped = Some(build.minute);
                }
                Err(e) => {
                    tracing::warn!(minute = build.minute, error = %e, "clock text build failed; keeping previous text");
                }
            }
        }
        swapped
    }

    pub fn phase(&self) -> ClockPhase {
        if self.builds.is_empty() {
            ClockPhase::Stable
        } else {
            ClockPhase::Refreshing
        }
    }

    /// Minute-boundary rebuilds since startup, not counting the initial build.
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    /// Minute shown by the text mesh in the graph.
    pub fn shown_minute(&self) -> Option<u32> {
        self.shown_minute
    }

    pub fn shown_node(&self) -> Option<NodeId> {
        self.shown
    }

    pub fn cancel_all(&mut self) -> usize {
        self.builds.cancel_all()
    }
}
