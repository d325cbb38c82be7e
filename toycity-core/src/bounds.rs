/// Axis-aligned bounds and auto-fit into the canonical `[-1, 1]` volume
use nalgebra::{Matrix4, Point3, Vector3};
use thiserror::Error;

use crate::transform::Transform;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    #[error("mesh has no vertices")]
    Empty,
    #[error("mesh has zero extent on every axis")]
    Degenerate,
    #[error("mesh has non-finite coordinates or extent")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Component-wise bounds of `points`, `None` when there are none
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self { min: *first, max: *first }, |b, p| Self {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// Centering translation and uniform scale that fit a mesh into `[-1, 1]^3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    pub center: Point3<f32>,
    pub scale: f32,
}

impl Normalization {
    /// `scale(s) * translate(-center)`
    pub fn transform(&self) -> Matrix4<f32> {
        Transform::scale_matrix(&Vector3::repeat(self.scale)) * Transform::translation_matrix(&-self.center.coords)
    }

    pub fn apply_to(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from((point - self.center) * self.scale)
    }

    /// Rewrite `points` in place into the canonical volume
    pub fn apply(&self, points: &mut [Point3<f32>]) {
        for p in points {
            *p = self.apply_to(p);
        }
    }
}

/// Derive the auto-fit for a flattened vertex buffer.
///
/// Fails without computing anything when `vertices` is empty, and when the
/// largest extent is zero (every vertex at one point). NaN or infinite
/// coordinates, or an extent that overflows `f32`, are rejected too.
pub fn normalize(vertices: &[Point3<f32>]) -> Result<Normalization, BoundsError> {
    if vertices.iter().any(|p| p.coords.iter().any(|c| !c.is_finite())) {
        return Err(BoundsError::NonFinite);
    }
    let bounds = Aabb::from_points(vertices).ok_or(BoundsError::Empty)?;
    let largest = bounds.extent().max();
    if !largest.is_finite() {
        return Err(BoundsError::NonFinite);
    }
    if largest <= 0.0 {
        return Err(BoundsError::Degenerate);
    }
    Ok(Normalization {
        min: bounds.min,
        max: bounds.max,
        center: bounds.center(),
        scale: 2.0 / largest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ]
    }

    #[test]
    fn test_bounds_of_triangle() {
        let n = normalize(&triangle()).unwrap();
        assert_relative_eq!(n.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(n.max, Point3::new(2.0, 4.0, 0.0));
        assert_relative_eq!(n.center, Point3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(n.scale, 0.5);
    }

    #[test]
    fn test_empty_is_unavailable() {
        assert_eq!(normalize(&[]), Err(BoundsError::Empty));
        assert_eq!(Aabb::from_points(&[]), None);
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let points = [Point3::new(3.0, 3.0, 3.0); 4];
        assert_eq!(normalize(&points), Err(BoundsError::Degenerate));
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let mut points = triangle();
        points[0].x = f32::INFINITY;
        assert_eq!(normalize(&points), Err(BoundsError::NonFinite));

        points[0].x = f32::NAN;
        assert_eq!(normalize(&points), Err(BoundsError::NonFinite));
    }

    #[test]
    fn test_overflowing_extent_is_rejected() {
        let points = [Point3::new(-f32::MAX, 0.0, 0.0), Point3::new(f32::MAX, 0.0, 0.0)];
        assert_eq!(normalize(&points), Err(BoundsError::NonFinite));
    }

    #[test]
    fn test_flat_mesh_still_fits() {
        let points = [Point3::new(-1.0, 5.0, 0.0), Point3::new(3.0, 5.0, 0.0)];
        let n = normalize(&points).unwrap();
        assert_relative_eq!(n.scale, 0.5);
    }

    #[test]
    fn test_fitted_mesh_spans_canonical_volume() {
        let mut points = triangle();
        let n = normalize(&points).unwrap();
        n.apply(&mut points);

        let fitted = Aabb::from_points(&points).unwrap();
        assert_relative_eq!(fitted.center(), Point3::origin(), epsilon = 1e-6);
        assert_relative_eq!(fitted.extent().max(), 2.0, epsilon = 1e-6);
        assert!(points.iter().all(|p| p.coords.amax() <= 1.0 + 1e-6));
    }

    #[test]
    fn test_transform_matches_apply() {
        let n = normalize(&triangle()).unwrap();
        let matrix = n.transform();
        for p in triangle() {
            assert_relative_eq!(matrix.transform_point(&p), n.apply_to(&p), epsilon = 1e-6);
        }
    }
}
