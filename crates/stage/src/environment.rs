use std::f64::consts::PI;

use glam::{DVec3, Vec3};
use momiji_assets::{AssetCatalog, AssetError, AssetLoader, TextureData, TextureMapping, TextureWrap};
use momiji_common::{NodeId, Rgb, Transform};
use momiji_render::{OrbitConstraints, ToneMapping};
use momiji_scene::{Fog, Light, LightKind, NodeContent, SceneGraph, SkyDome, WaterSurface};
use serde::{Deserialize, Serialize};

use crate::tasks::TaskSet;

/// Tunable environment inputs. Read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentParameters {
    /// Sun elevation parameter in [0, 1]; 0.5 is the horizon.
    pub sun_inclination: f64,
    /// Sun bearing parameter in [0, 1].
    pub sun_azimuth: f64,
    pub fog: Fog,
    pub tone_mapping_exposure: f32,
    pub camera_bounds: OrbitConstraints,
    pub water: WaterParameters,
    pub sky: SkyParameters,
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        Self {
            sun_inclination: 0.49,
            sun_azimuth: 0.205,
            fog: Fog::default(),
            tone_mapping_exposure: 1.0,
            camera_bounds: OrbitConstraints::default(),
            water: WaterParameters::default(),
            sky: SkyParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParameters {
    pub width: f32,
    pub height: f32,
    pub texture_size: u32,
    pub sun_color: Rgb,
    pub water_color: Rgb,
    pub distortion_scale: f32,
}

impl Default for WaterParameters {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 50.0,
            texture_size: 512,
            sun_color: Rgb::WHITE,
            water_color: Rgb(0x001e0f),
            distortion_scale: 3.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParameters {
    /// The environment texture is the visible background unless this is set.
    pub visible: bool,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub scale: f32,
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            visible: false,
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            scale: 10000.0,
        }
    }
}

/// Unit vector toward the sun from spherical parameters in [0, 1].
pub fn sun_direction(inclination: f64, azimuth: f64) -> DVec3 {
    let theta = PI * (inclination - 0.5);
    let phi = 2.0 * PI * (azimuth - 0.5);
    DVec3::new(
        phi.cos(),
        phi.sin() * theta.sin(),
        phi.sin() * theta.cos(),
    )
}

enum TextureLoad {
    WaterNormals(Result<TextureData, AssetError>),
    Background(Result<TextureData, AssetError>),
}

/// Applied environment: lights, water, optional sky, fog and the background texture.
pub struct EnvironmentSetup {
    sun: DVec3,
    water: NodeId,
    sky: Option<NodeId>,
    tone_mapping: ToneMapping,
    camera_bounds: OrbitConstraints,
    loads: TaskSet<TextureLoad>,
}

impl EnvironmentSetup {
    /// Configure the graph from `params`. Texture loads start here and land
    /// through [`settle`](Self::settle).
    pub fn apply(
        params: &EnvironmentParameters,
        catalog: &AssetCatalog,
        graph: &mut SceneGraph,
        loader: &dyn AssetLoader,
    ) -> Self {
        let sun = sun_direction(params.sun_inclination, params.sun_azimuth);
        tracing::info!(
            inclination = params.sun_inclination,
            azimuth = params.sun_azimuth,
            x = sun.x,
            y = sun.y,
            z = sun.z,
            "sun direction"
        );

        graph.attach(
            "ambient light",
            Transform::at(Vec3::new(10.0, 10.0, 10.0)),
            NodeContent::Light(Light::new(LightKind::Ambient, Rgb::WHITE, 1.0)),
        );
        graph.attach(
            "directional light",
            Transform::at(Vec3::new(20.0, 20.0, 20.0)),
            NodeContent::Light(Light::new(LightKind::Directional, Rgb::WHITE, 1.0)),
        );
        graph.attach(
            "camera light",
            Transform::at(Vec3::new(10.0, 10.0, 10.0)),
            NodeContent::Light(Light {
                attached_to_camera: true,
                ..Light::new(LightKind::Point, Rgb::WHITE, 1.0)
            }),
        );

        let w = params.water;
        let water = graph.attach(
            "water",
            Transform {
                rotation: Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
                ..Transform::default()
            },
            NodeContent::Water(WaterSurface {
                width: w.width,
                height: w.height,
                texture_size: w.texture_size,
                sun_color: w.sun_color,
                water_color: w.water_color,
                distortion_scale: w.distortion_scale,
                sun_direction: sun.normalize().as_vec3(),
                time: 0.0,
                normals: None,
            }),
        );

        let s = params.sky;
        let sky = s.visible.then(|| {
            graph.attach(
                "sky",
                Transform {
                    scale: Vec3::splat(s.scale),
                    ..Transform::default()
                },
                NodeContent::Sky(SkyDome {
                    turbidity: s.turbidity,
                    rayleigh: s.rayleigh,
                    mie_coefficient: s.mie_coefficient,
                    mie_directional_g: s.mie_directional_g,
                    scale: s.scale,
                    sun_position: sun.as_vec3(),
                }),
            )
        });

        graph.set_fog(params.fog);

        let mut loads = TaskSet::new();
        let normals = loader.load_texture(&catalog.water_normals);
        loads.spawn(async move { TextureLoad::WaterNormals(normals.await) });
        let background = loader.load_texture(&catalog.background);
        loads.spawn(async move { TextureLoad::Background(background.await) });

        Self {
            sun,
            water,
            sky,
            tone_mapping: ToneMapping::AcesFilmic {
                exposure: params.tone_mapping_exposure,
            },
            camera_bounds: params.camera_bounds,
            loads,
        }
    }

    /// Apply texture loads that finished since the last call. Returns how many landed.
    pub fn settle(&mut self, graph: &mut SceneGraph) -> usize {
        let mut applied = 0;
        for load in self.loads.poll_ready() {
            match load {
                TextureLoad::WaterNormals(Ok(mut texture)) => {
                    texture.wrap = TextureWrap::Repeat;
                    tracing::debug!(path = %texture.path, width = texture.width, height = texture.height, "water normals loaded");
                    if let Some(NodeContent::Water(surface)) =
                        graph.get_mut(self.water).map(|node| &mut node.content)
                    {
                        surface.normals = Some(texture);
                        applied += 1;
                    }
                }
                TextureLoad::Background(Ok(mut texture)) => {
                    texture.mapping = TextureMapping::EquirectangularReflection;
                    tracing::debug!(path = %texture.path, digest = %texture.digest, "background loaded");
                    graph.set_background(texture.clone());
                    graph.set_environment(texture);
                    applied += 1;
                }
                TextureLoad::WaterNormals(Err(e)) | TextureLoad::Background(Err(e)) => {
                    tracing::warn!(error = %e, "environment texture failed to load");
                }
            }
        }
        applied
    }

    pub fn sun_direction(&self) -> DVec3 {
        self.sun
    }

    pub fn water(&self) -> NodeId {
        self.water
    }

    pub fn sky(&self) -> Option<NodeId> {
        self.sky
    }

    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    pub fn camera_bounds(&self) -> OrbitConstraints {
        self.camera_bounds
    }

    pub fn pending(&self) -> usize {
        self.loads.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        self.loads.cancel_all()
    }
}
