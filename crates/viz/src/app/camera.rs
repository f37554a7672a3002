use glam::{Mat4, Vec3};

/// Camera circling a fixed target; slowly spins on its own, scroll zooms.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Yaw rate in radians per second.
    pub spin: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 4.0,
            yaw: 0.0,
            pitch: 0.35,
            spin: 0.2,
            fov: 1.047, // 60 degrees in radians
            near: 0.01,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 1.5;
    const MAX_DISTANCE: f32 = 20.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn on_scroll(&mut self, delta: f32) {
        self.distance =
            (self.distance * (1.0 - delta * 0.1)).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    pub fn update(&mut self, dt: f32) {
        self.yaw = (self.yaw + self.spin * dt) % std::f32::consts::TAU;
    }
}
