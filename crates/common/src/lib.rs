//! Common: value types shared by every momiji crate.
//!
//! # Invariants
//! - Rotations are stored as XYZ Euler angles in radians, never re-derived
//!   from quaternions, so declared transforms round-trip exactly.

mod types;

pub use types::{NodeId, Rgb, Scale, Transform};

pub fn crate_info() -> &'static str {
    "momiji-common v0.1.0"
}
