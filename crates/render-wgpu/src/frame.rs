use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use momiji_common::Rgb;
use momiji_render::{PerspectiveCamera, ToneMapping};
use momiji_scene::{NodeContent, SceneGraph};

/// Edge length of the box standing in for a loaded model, world units.
pub const MODEL_PROXY_SIZE: f32 = 4.0;
/// Thickness of the water and text slabs.
pub const SLAB_DEPTH: f32 = 0.05;
pub const MAX_INSTANCES: usize = 10_000;

const DEFAULT_SUN: Vec3 = Vec3::new(0.3, 1.0, 0.5);

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_range: [f32; 4],
    pub sun_dir: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

/// One box per drawable node, in graph order.
///
/// Models keep their world position and rotation but are drawn at a fixed
/// size, since loaded mesh data carries no bounds. Water and text become thin
/// slabs. Lights, sky and groups produce nothing.
pub fn build_instances(scene: &SceneGraph) -> Vec<InstanceData> {
    let mut instances = Vec::new();
    for (id, node) in scene.nodes() {
        if instances.len() >= MAX_INSTANCES {
            tracing::warn!(max = MAX_INSTANCES, "instance limit reached, skipping the rest");
            break;
        }
        let Some(world) = scene.world_matrix(id) else {
            continue;
        };
        let instance = match &node.content {
            NodeContent::Model(model) => {
                let (_, rotation, translation) = world.to_scale_rotation_translation();
                let placed = Mat4::from_scale_rotation_translation(
                    Vec3::splat(MODEL_PROXY_SIZE),
                    rotation,
                    translation,
                );
                InstanceData::new(placed, model.primary_color())
            }
            NodeContent::Water(water) => InstanceData::new(
                world * Mat4::from_scale(Vec3::new(water.width, water.height, SLAB_DEPTH)),
                opaque(water.water_color),
            ),
            NodeContent::Text(text) => {
                let width = text.text.chars().count() as f32 * text.style.size * 0.6;
                let depth = text.style.depth + text.style.bevel_thickness;
                InstanceData::new(
                    world * Mat4::from_scale(Vec3::new(width, text.style.size, depth)),
                    opaque(text.style.color),
                )
            }
            NodeContent::Group | NodeContent::Light(_) | NodeContent::Sky(_) => continue,
        };
        instances.push(instance);
    }
    instances
}

pub fn frame_uniforms(
    scene: &SceneGraph,
    camera: &PerspectiveCamera,
    tone_mapping: ToneMapping,
) -> FrameUniforms {
    let sun = scene
        .nodes()
        .find_map(|(_, node)| match &node.content {
            NodeContent::Water(water) => Some(water.sun_direction),
            _ => None,
        })
        .filter(|dir| dir.length_squared() > 0.0)
        .unwrap_or(DEFAULT_SUN)
        .normalize();
    let aces = matches!(tone_mapping, ToneMapping::AcesFilmic { .. });
    let (fog_color, fog_range) = match scene.fog() {
        Some(fog) => {
            let [r, g, b] = fog.color.to_array();
            ([r, g, b, 1.0], [fog.near, fog.far, flag(aces), 0.0])
        }
        None => ([0.0; 4], [0.0, 0.0, flag(aces), 0.0]),
    };
    FrameUniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        camera: [
            camera.position.x,
            camera.position.y,
            camera.position.z,
            tone_mapping.exposure(),
        ],
        fog_color,
        fog_range,
        sun_dir: [sun.x, sun.y, sun.z, 0.0],
    }
}

/// Fog colour when fog is set, otherwise a dark slate.
pub fn clear_color(scene: &SceneGraph) -> wgpu::Color {
    let [r, g, b] = scene
        .fog()
        .map(|fog| fog.color)
        .map(Rgb::to_array)
        .unwrap_or([0.1, 0.1, 0.15]);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

fn opaque(color: Rgb) -> [f32; 4] {
    let [r, g, b] = color.to_array();
    [r, g, b, 1.0]
}

fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use momiji_assets::{ContentDigest, MaterialInfo, ModelData};
    use momiji_common::Transform;
    use momiji_scene::{Fog, Light, LightKind, TextMesh, TextStyle, WaterSurface};
    use std::sync::Arc;

    fn red_model() -> Arc<ModelData> {
        Arc::new(ModelData {
            source: "bench.glb".into(),
            meshes: Vec::new(),
            materials: vec![MaterialInfo {
                name: "paint".into(),
                base_color: [1.0, 0.0, 0.0, 1.0],
            }],
            digest: ContentDigest::default(),
        })
    }

    #[test]
    fn models_become_fixed_size_boxes() {
        let mut scene = SceneGraph::new();
        let transform = Transform {
            scale: Vec3::splat(0.01),
            ..Transform::at(Vec3::new(5.0, 0.0, -3.0))
        };
        scene.attach("bench", transform, NodeContent::Model(red_model()));
        scene.attach(
            "sun",
            Transform::default(),
            NodeContent::Light(Light::new(LightKind::Directional, Rgb::WHITE, 1.0)),
        );

        let instances = build_instances(&scene);
        assert_eq!(instances.len(), 1);
        let box_ = instances[0];
        assert_eq!(box_.model_0[0], MODEL_PROXY_SIZE);
        assert_eq!(&box_.model_3[..3], &[5.0, 0.0, -3.0]);
        assert_eq!(box_.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn water_and_text_become_slabs() {
        let mut scene = SceneGraph::new();
        scene.attach(
            "water",
            Transform::default(),
            NodeContent::Water(WaterSurface {
                width: 100.0,
                height: 50.0,
                texture_size: 512,
                sun_color: Rgb::WHITE,
                water_color: Rgb(0x001e0f),
                distortion_scale: 3.7,
                sun_direction: Vec3::Y,
                time: 0.0,
                normals: None,
            }),
        );
        scene.attach(
            "clock 12:00",
            Transform::default(),
            NodeContent::Text(TextMesh {
                text: "12:00".into(),
                font_family: "Helvetiker".into(),
                style: TextStyle::default(),
            }),
        );

        let instances = build_instances(&scene);
        assert_eq!(instances.len(), 2);
        let water = instances
            .iter()
            .find(|i| i.model_0[0] == 100.0)
            .expect("water slab");
        assert_eq!(water.model_1[1], 50.0);
        assert_eq!(water.model_2[2], SLAB_DEPTH);
        let text = instances
            .iter()
            .find(|i| i.color == [1.0, 1.0, 1.0, 1.0])
            .expect("text slab");
        assert_eq!(text.model_1[1], TextStyle::default().size);
    }

    #[test]
    fn uniforms_carry_fog_and_exposure() {
        let mut scene = SceneGraph::new();
        scene.set_fog(Fog {
            color: Rgb(0xff0000),
            near: 1.0,
            far: 250.0,
        });
        let camera = PerspectiveCamera::default();
        let uniforms = frame_uniforms(&scene, &camera, ToneMapping::AcesFilmic { exposure: 0.5 });
        assert_eq!(uniforms.camera[3], 0.5);
        assert_eq!(uniforms.fog_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.fog_range, [1.0, 250.0, 1.0, 0.0]);
        let sun = Vec3::from_slice(&uniforms.sun_dir[..3]);
        assert!((sun.length() - 1.0).abs() < 1e-5);

        let plain = frame_uniforms(&SceneGraph::new(), &camera, ToneMapping::None);
        assert_eq!(plain.fog_color[3], 0.0);
        assert_eq!(plain.fog_range[2], 0.0);
    }

    #[test]
    fn clear_color_follows_fog() {
        let mut scene = SceneGraph::new();
        assert_eq!(clear_color(&scene).b, 0.15f32 as f64);
        scene.set_fog(Fog::default());
        let clear = clear_color(&scene);
        assert_eq!((clear.r, clear.g, clear.b), (0.0, 0.0, 0.0));
    }
}
