use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera aimed at a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov: 55.0,
            aspect: 1.0,
            near: 1.0,
            far: 20000.0,
            position: Vec3::new(30.0, 30.0, 100.0),
            target: Vec3::ZERO,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Limits for interactive orbiting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConstraints {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from straight up, in radians. Just under π/2 keeps the camera above ground.
    pub max_polar_angle: f32,
}

impl Default for OrbitConstraints {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 10.0, 0.0),
            min_distance: 40.0,
            max_distance: 200.0,
            max_polar_angle: std::f32::consts::PI * 0.495,
        }
    }
}

/// Orbit controls: accumulate drag and wheel input, then move the camera
/// on a sphere around the target within the constraints.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub constraints: OrbitConstraints,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(constraints: OrbitConstraints) -> Self {
        Self {
            constraints,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Rotate by angles in radians. Positive `delta_phi` tilts toward the ground.
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        self.delta_theta -= delta_theta * self.rotate_speed;
        self.delta_phi += delta_phi * self.rotate_speed;
    }

    /// Rotate from a mouse drag in pixels.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32) {
        let per_pixel = 0.004;
        self.rotate(dx * per_pixel, dy * per_pixel);
    }

    /// Positive `delta` zooms in.
    pub fn zoom(&mut self, delta: f32) {
        let factor = 1.0 + delta.abs() * self.zoom_speed * 0.1;
        if delta > 0.0 {
            self.scale /= factor;
        } else if delta < 0.0 {
            self.scale *= factor;
        }
    }

    /// Apply accumulated input to the camera, clamp it, and clear the input.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let c = self.constraints;
        let offset = camera.position - c.target;
        let radius = offset.length().max(f32::EPSILON);

        let theta = offset.x.atan2(offset.z) + self.delta_theta;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.delta_phi)
            .clamp(0.0, c.max_polar_angle);
        let radius = (radius * self.scale).clamp(c.min_distance, c.max_distance);

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;

        camera.position = c.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        camera.target = c.target;
    }
}

/// Scripted orbit: a fixed-radius circle around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRotate {
    pub radius: f32,
    pub height: f32,
    /// Angle subtracted each tick, radians.
    pub step: f32,
}

impl Default for AutoRotate {
    fn default() -> Self {
        Self {
            radius: 100.0,
            height: 30.0,
            step: 0.002,
        }
    }
}

impl AutoRotate {
    /// Advance `angle` by one step and move the camera onto the circle, aimed at the origin.
    pub fn advance(&self, angle: &mut f32, camera: &mut PerspectiveCamera) {
        *angle -= self.step;
        camera.position = Vec3::new(
            self.radius * angle.cos(),
            self.height,
            self.radius * angle.sin(),
        );
        camera.look_at(Vec3::ZERO);
    }
}
