/// WGSL shader for proxy boxes: sun-lit, tone-mapped, fogged.
pub const PREVIEW_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    // xyz: camera position, w: exposure
    camera: vec4<f32>,
    // rgb: fog colour, w: 1 when fog is on
    fog_color: vec4<f32>,
    // x: near, y: far, z: 1 when ACES tone mapping is on
    fog_range: vec4<f32>,
    sun_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.world_pos = world_pos.xyz;
    out.color = instance.color;
    return out;
}

fn aces(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(normalize(in.world_normal), normalize(uniforms.sun_dir.xyz)), 0.0);
    var color = in.color.rgb * (0.3 + diffuse * 0.7) * uniforms.camera.w;
    if (uniforms.fog_range.z > 0.5) {
        color = aces(color);
    }
    if (uniforms.fog_color.w > 0.5) {
        let dist = distance(in.world_pos, uniforms.camera.xyz);
        let span = max(uniforms.fog_range.y - uniforms.fog_range.x, 0.0001);
        let f = clamp((dist - uniforms.fog_range.x) / span, 0.0, 1.0);
        color = mix(color, uniforms.fog_color.rgb, f);
    }
    return vec4<f32>(color, in.color.a);
}
"#;
