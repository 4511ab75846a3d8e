//! Scene: the shared scene graph that assembly, environment and clock write
//! into and renderers read from.
//!
//! # Invariants
//! - Detaching a node removes its whole subtree; no orphan survives.
//! - A node's transform is exactly what was set; nothing re-derives it.

mod graph;
mod node;

pub use graph::SceneGraph;
pub use node::{
    Fog, Light, LightKind, NodeContent, SceneNode, SkyDome, TextMesh, TextStyle, WaterSurface,
};

pub fn crate_info() -> &'static str {
    "momiji-scene v0.1.0"
}
