//! Mathematical utilities (Rodrigues rotations, quad alignment).

use nalgebra::{Matrix3, Vector3};

/// The canonical quad normal. Splat quads start out flat in the XY plane
/// facing +Z and are rotated onto the splat's normal.
pub const QUAD_NORMAL: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);

/// Tolerance for treating two unit vectors as (anti-)parallel.
const ALIGN_EPS: f32 = 1e-6;

/// Build a rotation matrix from the Rodrigues axis-angle formula.
///
/// For a unit axis a and angle θ (c = cos θ, s = sin θ):
/// R = | c + aₓ²(1-c)        aₓa_y(1-c) - a_z s   aₓa_z(1-c) + a_y s |
///     | a_yaₓ(1-c) + a_z s  c + a_y²(1-c)        a_ya_z(1-c) - aₓ s |
///     | a_zaₓ(1-c) - a_y s  a_za_y(1-c) + aₓ s   c + a_z²(1-c)      |
///
/// The axis must be unit length; the caller normalizes.
pub fn rotation_matrix(axis: &Vector3<f32>, angle: f32) -> Matrix3<f32> {
    let c = angle.cos();
    let s = angle.sin();
    let sub_c = 1.0 - c;
    let (ax, ay, az) = (axis.x, axis.y, axis.z);

    Matrix3::new(
        c + ax * ax * sub_c,
        ax * ay * sub_c - az * s,
        ax * az * sub_c + ay * s,
        ay * ax * sub_c + az * s,
        c + ay * ay * sub_c,
        ay * az * sub_c - ax * s,
        az * ax * sub_c - ay * s,
        az * ay * sub_c + ax * s,
        c + az * az * sub_c,
    )
}

/// Build the rotation that maps the canonical quad normal (0,0,1) onto
/// `normal`.
///
/// The rotation axis is the normalized cross product of the two normals and
/// the angle their arccosine. Two degenerate cases need explicit handling:
///
/// - `normal` parallel to (0,0,1): no rotation, identity.
/// - `normal` anti-parallel to (0,0,1): the cross product vanishes and the
///   axis is undefined. Any axis perpendicular to (0,0,1) gives a valid
///   half-turn; we fix +X so the result is deterministic.
///
/// `normal` is re-normalized here, so callers may pass unnormalized input.
pub fn align_to_normal(normal: &Vector3<f32>) -> Matrix3<f32> {
    let n = normal.normalize();
    let dot = QUAD_NORMAL.dot(&n).clamp(-1.0, 1.0);

    if dot >= 1.0 - ALIGN_EPS {
        return Matrix3::identity();
    }
    if dot <= -1.0 + ALIGN_EPS {
        // Anti-parallel: zero cross product, so pick a perpendicular axis.
        return rotation_matrix(&Vector3::x(), std::f32::consts::PI);
    }

    let axis = QUAD_NORMAL.cross(&n).normalize();
    rotation_matrix(&axis, dot.acos())
}
