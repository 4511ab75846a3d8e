use serde::{Deserialize, Serialize};

/// Output surface size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    AcesFilmic { exposure: f32 },
}

impl ToneMapping {
    pub fn exposure(&self) -> f32 {
        match self {
            ToneMapping::None => 1.0,
            ToneMapping::AcesFilmic { exposure } => *exposure,
        }
    }
}

impl Default for ToneMapping {
    fn default() -> Self {
        ToneMapping::AcesFilmic { exposure: 1.0 }
    }
}

/// Depth-of-field pass settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BokehPass {
    /// Focus distance from the camera.
    pub focus: f32,
    pub aperture: f32,
    /// Largest blur radius.
    pub max_blur: f32,
    /// Follows the viewport; overwritten on resize.
    pub aspect: f32,
}

impl Default for BokehPass {
    fn default() -> Self {
        Self {
            focus: 1.0,
            aperture: 0.025,
            max_blur: 0.01,
            aspect: 1.0,
        }
    }
}

/// The fixed post-processing chain: scene render, depth of field, tone-mapped output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessing {
    pub bokeh: BokehPass,
    pub output: ToneMapping,
}

impl PostProcessing {
    pub const PASSES: [&'static str; 3] = ["render", "bokeh", "output"];

    pub fn new(bokeh: BokehPass, output: ToneMapping) -> Self {
        Self { bokeh, output }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.bokeh.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(1600, 900).aspect(), 1600.0 / 900.0);
        assert_eq!(Viewport::new(10, 0).aspect(), 10.0);
    }

    #[test]
    fn physical_size_honours_pixel_ratio() {
        let vp = Viewport {
            width: 800,
            height: 600,
            pixel_ratio: 2.0,
        };
        assert_eq!(vp.physical_size(), (1600, 1200));
    }

    #[test]
    fn tone_mapping_defaults_to_aces_at_one() {
        assert_eq!(ToneMapping::default().exposure(), 1.0);
        let parsed: ToneMapping =
            serde_json::from_str(r#"{ "curve": "aces_filmic", "exposure": 0.5 }"#).unwrap();
        assert_eq!(parsed, ToneMapping::AcesFilmic { exposure: 0.5 });
    }

    #[test]
    fn post_chain_order_is_fixed() {
        let mut post = PostProcessing::new(BokehPass::default(), ToneMapping::default());
        post.set_aspect(2.0);
        assert_eq!(post.bokeh.aspect, 2.0);
        assert_eq!(PostProcessing::PASSES, ["render", "bokeh", "output"]);
    }
}
