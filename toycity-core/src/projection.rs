/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Steepest the camera may look up or down
pub const MAX_PITCH_DEGREES: f32 = 89.0;
/// Narrowest and widest vertical field of view reachable by zooming
pub const ZOOM_RANGE_DEGREES: (f32, f32) = (1.0, 45.0);

/// Look-at camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn looking_at(position: Point3<f32>, target: Point3<f32>, aspect: f32) -> Self {
        Self {
            position,
            target,
            aspect,
            ..Self::default()
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the perspective projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit vector from the camera towards its target
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z())
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward()
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x)
    }

    /// Move the camera and its target together
    pub fn translate(&mut self, offset: &Vector3<f32>) {
        self.position += offset;
        self.target += offset;
    }

    /// Heading around `up` and elevation of the view direction, in radians
    pub fn yaw_pitch(&self) -> (f32, f32) {
        let forward = self.forward();
        (forward.z.atan2(forward.x), forward.y.clamp(-1.0, 1.0).asin())
    }

    /// Turn the view direction in place.
    ///
    /// Pitch stops short of straight up or down so `up` stays usable; the
    /// distance to the target is kept.
    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let (yaw, pitch) = self.yaw_pitch();
        let limit = MAX_PITCH_DEGREES.to_radians();
        let yaw = yaw + yaw_delta;
        let pitch = (pitch + pitch_delta).clamp(-limit, limit);

        let direction = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        let distance = (self.target - self.position).norm().max(1.0);
        self.target = self.position + direction * distance;
    }

    /// Narrow the field of view by `delta_degrees` (negative widens)
    pub fn zoom(&mut self, delta_degrees: f32) {
        let (narrowest, widest) = ZOOM_RANGE_DEGREES;
        self.fov = (self.fov.to_degrees() - delta_degrees)
            .clamp(narrowest, widest)
            .to_radians();
    }
}

/// Perspective-divide a clip-space position with `w > 0` and map it to pixels.
///
/// The returned depth is NDC z.
pub fn clip_to_screen(clip: &Vector4<f32>, width: u32, height: u32) -> (f32, f32, f32) {
    let ndc = clip.xyz() / clip.w;
    let x = (ndc.x + 1.0) * 0.5 * width as f32;
    let y = (1.0 - ndc.y) * 0.5 * height as f32;
    (x, y, ndc.z)
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_relative_eq!(camera.forward(), -Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::new(80, 40);
        let clip = camera.view_projection() * Point3::origin().to_homogeneous();
        assert!(clip.w > 0.0);
        let (x, y, depth) = clip_to_screen(&clip, 80, 40);
        assert_relative_eq!(x, 40.0, epsilon = 1e-4);
        assert_relative_eq!(y, 20.0, epsilon = 1e-4);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_points_behind_camera_have_negative_w() {
        let camera = Camera::new(80, 40);
        let clip = camera.view_projection() * Point3::new(0.0, 0.0, 10.0).to_homogeneous();
        assert!(clip.w < 0.0);
    }

    #[test]
    fn test_look_turns_in_place() {
        let mut camera = Camera::looking_at(Point3::new(0.0, 3.0, 15.0), Point3::new(0.0, 3.0, 0.0), 1.0);
        camera.look(std::f32::consts::FRAC_PI_2, 0.0);
        assert_eq!(camera.position, Point3::new(0.0, 3.0, 15.0));
        assert_relative_eq!(camera.forward(), Vector3::x(), epsilon = 1e-5);
        assert_relative_eq!((camera.target - camera.position).norm(), 15.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.look(0.0, 10.0);
        let (_, pitch) = camera.yaw_pitch();
        assert_relative_eq!(pitch, MAX_PITCH_DEGREES.to_radians(), epsilon = 1e-3);
        assert!(camera.right().norm() > 0.99);

        camera.look(0.0, -20.0);
        let (_, pitch) = camera.yaw_pitch();
        assert_relative_eq!(pitch, -MAX_PITCH_DEGREES.to_radians(), epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom(5.0);
        assert_relative_eq!(camera.fov.to_degrees(), 40.0, epsilon = 1e-3);
        camera.zoom(100.0);
        assert_relative_eq!(camera.fov.to_degrees(), 1.0, epsilon = 1e-3);
        camera.zoom(-100.0);
        assert_relative_eq!(camera.fov.to_degrees(), 45.0, epsilon = 1e-3);
    }

    #[test]
    fn test_translate_keeps_direction() {
        let mut camera = Camera::looking_at(Point3::new(0.0, 3.0, 15.0), Point3::new(0.0, 3.0, 0.0), 1.0);
        let forward = camera.forward();
        camera.translate(&(forward * 2.0));
        assert_relative_eq!(camera.position, Point3::new(0.0, 3.0, 13.0), epsilon = 1e-5);
        assert_relative_eq!(camera.forward(), forward, epsilon = 1e-5);
        assert_relative_eq!(camera.right(), Vector3::x(), epsilon = 1e-5);
    }
}
