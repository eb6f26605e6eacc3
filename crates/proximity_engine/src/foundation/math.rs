//! Math utilities and types
//!
//! Type aliases over nalgebra for the 3D math the detection engine needs.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform a point by a homogeneous world matrix.
pub fn transform_point(matrix: &Mat4, p: Vec3) -> Vec3 {
    matrix.transform_point(&Point3::new(p.x, p.y, p.z)).coords
}

/// Split a rigid (possibly scaled) world matrix into translation, a pure
/// rotation basis, and per-axis scale factors.
///
/// The kinematic model drives link poses directly, so matrices are assumed
/// affine with no shear; scale is recovered from the column norms.
pub fn decompose_world(matrix: &Mat4) -> (Vec3, Mat3, Vec3) {
    let translation = Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    let mut basis = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mut scale = Vec3::new(1.0, 1.0, 1.0);
    for c in 0..3 {
        let mut col = basis.column(c).into_owned();
        let norm = col.norm();
        if norm > f32::EPSILON {
            scale[c] = norm;
            col /= norm;
            basis.set_column(c, &col);
        }
    }
    (translation, basis, scale)
}
