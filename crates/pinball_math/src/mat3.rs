//! 3x3 matrix utilities for ball orientation
//!
//! Ball orientation is a rotation matrix advanced each sub-step by the
//! skew-symmetric matrix of the angular velocity. Integration adds small
//! non-rotational errors, so the matrix is re-orthonormalized after every
//! update.

use crate::Vec3;

/// 3x3 matrix type (column-major: `m[column][row]`)
pub type Mat3 = [[f32; 3]; 3];

/// Identity matrix
pub const IDENTITY: Mat3 = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Skew-symmetric matrix of `w`, so that `transform(skew_symmetric(w), v) == w.cross(v)`
pub fn skew_symmetric(w: Vec3) -> Mat3 {
    [
        [0.0, w.z, -w.y],
        [-w.z, 0.0, w.x],
        [w.y, -w.x, 0.0],
    ]
}

/// Multiply two 3x3 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat3, b: Mat3) -> Mat3 {
    let mut result = [[0.0f32; 3]; 3];

    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Component-wise `a + b * s`
#[allow(clippy::needless_range_loop)]
pub fn add_scaled(a: Mat3, b: Mat3, s: f32) -> Mat3 {
    let mut result = a;
    for i in 0..3 {
        for j in 0..3 {
            result[i][j] += b[i][j] * s;
        }
    }
    result
}

/// Transform a Vec3 by a 3x3 matrix (column-major)
pub fn transform(m: Mat3, v: Vec3) -> Vec3 {
    get_column(m, 0) * v.x + get_column(m, 1) * v.y + get_column(m, 2) * v.z
}

/// Get a column vector from a matrix
pub fn get_column(m: Mat3, col: usize) -> Vec3 {
    Vec3::new(m[col][0], m[col][1], m[col][2])
}

/// Transpose a matrix
pub fn transpose(m: Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Gram-Schmidt re-orthonormalization of the columns
///
/// Column 0 keeps its direction, column 1 is made perpendicular to it and
/// column 2 is rebuilt as their cross product. A degenerate input falls back
/// to the identity.
pub fn orthonormalize(m: Mat3) -> Mat3 {
    let c0 = get_column(m, 0).normalized();
    let c1 = get_column(m, 1);
    let c1 = (c1 - c0 * c0.dot(c1)).normalized();
    let c2 = c0.cross(c1);

    if c0 == Vec3::ZERO || c1 == Vec3::ZERO || !c2.is_finite() {
        return IDENTITY;
    }

    [c0.to_array(), c1.to_array(), c2.to_array()]
}
