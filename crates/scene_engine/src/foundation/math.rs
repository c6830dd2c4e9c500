//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph and renderer.
//! Everything is single precision and column-major, matching what graphics
//! backends expect for uniform uploads.

pub use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Local transform of a scene node: translation, rotation and per-axis scale
///
/// The composed matrix is `translate(translation) * rotate(rotation) * scale(scale)`,
/// so scale is applied first and translation last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    /// Translation relative to the parent
    pub translation: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Component-wise scale
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl LocalTransform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Convert to a homogeneous transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

/// Projection matrix helpers
pub mod projection {
    use super::Mat4;

    /// OpenGL-style perspective projection (right-handed, clip z in [-1, 1])
    ///
    /// `fov_y` is the vertical field of view in radians and `aspect` is
    /// width / height of the viewport in pixels.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let cot = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = cot / aspect;
        result[(1, 1)] = cot;
        result[(2, 2)] = -(far + near) / (far - near);
        result[(2, 3)] = (-2.0 * far * near) / (far - near);
        result[(3, 2)] = -1.0;
        result
    }

    /// Orthographic projection sized in pixels of the viewport
    ///
    /// One world unit maps to half a pixel span, with depth mapped to [0, 1]
    /// between `near` and `far`.
    pub fn orthographic(width: u32, height: u32, near: f32, far: f32) -> Mat4 {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);

        Mat4::new(
            2.0 / w, 0.0, 0.0, 0.0,
            0.0, 2.0 / h, 0.0, 0.0,
            0.0, 0.0, 1.0 / (far - near), -near / (far - near),
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_local_transform_identity() {
        assert_relative_eq!(LocalTransform::identity().to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_local_transform_applies_scale_then_rotation_then_translation() {
        let transform = LocalTransform {
            translation: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        // (1, 0, 0) -> scaled (2, 0, 0) -> rotated (0, 2, 0) -> translated (10, 2, 0)
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(10.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_maps_near_and_far_planes() {
        let proj = projection::perspective(constants::HALF_PI, 1.0, 1.0, 10.0);

        let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -10.0, 1.0);

        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_scales_by_resolution() {
        let proj = projection::orthographic(800, 600, 0.0, 1.0);
        assert_relative_eq!(proj[(0, 0)], 2.0 / 800.0);
        assert_relative_eq!(proj[(1, 1)], 2.0 / 600.0);
        assert_relative_eq!(proj[(2, 2)], 1.0);
    }
}
