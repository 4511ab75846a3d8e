use std::sync::Arc;

use glam::Vec3;
use momiji_assets::{ModelData, TextureData};
use momiji_common::{NodeId, Rgb, Transform};
use serde::{Deserialize, Serialize};

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub label: String,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub content: NodeContent,
}

/// What a node draws or emits.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// Pure transform, no geometry.
    Group,
    /// A loaded model subtree. Shared with whoever decoded it.
    Model(Arc<ModelData>),
    Light(Light),
    Water(WaterSurface),
    Sky(SkyDome),
    Text(TextMesh),
}

impl NodeContent {
    pub fn kind(&self) -> &'static str {
        match self {
            NodeContent::Group => "group",
            NodeContent::Model(_) => "model",
            NodeContent::Light(_) => "light",
            NodeContent::Water(_) => "water",
            NodeContent::Sky(_) => "sky",
            NodeContent::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f32,
    /// Follows the camera; the node transform is an offset from the camera position.
    pub attached_to_camera: bool,
}

impl Light {
    pub fn new(kind: LightKind, color: Rgb, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            attached_to_camera: false,
        }
    }
}

/// Animated reflective water plane.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterSurface {
    pub width: f32,
    pub height: f32,
    /// Edge length of the square reflection texture.
    pub texture_size: u32,
    pub sun_color: Rgb,
    pub water_color: Rgb,
    pub distortion_scale: f32,
    /// Unit vector toward the sun.
    pub sun_direction: Vec3,
    /// Animation phase, advanced once per frame.
    pub time: f32,
    /// Normal map. Absent until its load resolves.
    pub normals: Option<TextureData>,
}

/// Atmospheric sky model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyDome {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub scale: f32,
    pub sun_position: Vec3,
}

/// Extrusion settings for 3D text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_offset: f32,
    pub bevel_segments: u32,
    pub color: Rgb,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 100.0,
            depth: 1.0,
            curve_segments: 12,
            bevel_thickness: 10.0,
            bevel_size: 8.0,
            bevel_offset: 0.0,
            bevel_segments: 5,
            color: Rgb::WHITE,
        }
    }
}

/// An extruded text mesh built from a typeface.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    pub text: String,
    pub font_family: String,
    pub style: TextStyle,
}

/// Distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Rgb::BLACK,
            near: 1.0,
            far: 250.0,
        }
    }
}
