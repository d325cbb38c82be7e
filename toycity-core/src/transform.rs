/// Affine transform builders and rotation state
use nalgebra::{Matrix4, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation matrix applying Z, then Y, then X to column vectors
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        rz * ry * rx
    }

    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    pub fn scale_matrix(factors: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(factors)
    }

    /// `translate(position) * scale(extent)`: geometry is scaled first, then moved.
    pub fn placement_matrix(position: &Vector3<f32>, extent: &Vector3<f32>) -> Matrix4<f32> {
        Self::translation_matrix(position) * Self::scale_matrix(extent)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state, RotationState::new(0.0, 0.0, 0.0));

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        assert_relative_eq!(matrix, Matrix4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_placement_scales_before_translating() {
        let m = Transform::placement_matrix(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(2.0, 2.0, 2.0));
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(3.0, 4.0, 5.0), epsilon = 1e-6);
    }
}
