//! Geometric primitives shared by bones, builders and constraint authoring.
//!
//! Bones are described by a head point, a tail point and an align vector. The
//! local frame is always derived from those three values:
//!
//! - `y = normalize(tail - head)`
//! - `x = normalize(y × align)` (retried with a perturbed align vector when
//!   `align` is parallel to `y`)
//! - `z = x × y`

use glam::{DMat4, DVec3, DVec4};

/// Distance under which two points are treated as coincident.
pub const POINT_EPSILON: f64 = 1e-4;

/// Component magnitude under which a vector is treated as zero.
pub const ZERO_EPSILON: f64 = 1e-6;

/// Returns true when every component of `v` is within [`ZERO_EPSILON`] of zero.
pub fn vector_is_zero(v: DVec3) -> bool {
    v.abs().max_element() <= ZERO_EPSILON
}

/// Orthonormal frame of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub x: DVec3,
    pub y: DVec3,
    pub z: DVec3,
}

/// Derives the frame of the segment `head -> tail` rolled towards `align`.
///
/// Returns `None` when the segment has zero length or no perpendicular axis
/// can be found.
pub fn segment_axes(head: DVec3, tail: DVec3, align: DVec3) -> Option<Axes> {
    let y = tail - head;
    if vector_is_zero(y) {
        return None;
    }
    let y = y.normalize();

    let mut c = y.cross(align);
    if vector_is_zero(c) {
        c = y.cross(DVec3::new(align.x, -align.z, align.y));
    }
    if vector_is_zero(c) {
        return None;
    }
    let x = c.normalize();
    let z = x.cross(y).normalize();

    Some(Axes { x, y, z })
}

/// Builds the 4x4 local matrix with columns `(x, y, z, head)`.
pub fn frame_matrix(axes: &Axes, head: DVec3) -> DMat4 {
    DMat4::from_cols(
        axes.x.extend(0.0),
        axes.y.extend(0.0),
        axes.z.extend(0.0),
        DVec4::new(head.x, head.y, head.z, 1.0),
    )
}

/// Angle between two directions in degrees.
///
/// The dot product is clamped so that numerically parallel or antiparallel
/// inputs yield exactly 0 or 180.
pub fn degrees_between(a: DVec3, b: DVec3) -> f64 {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Intersects the infinite line through `p0` and `p1` with the plane through
/// `plane_co` with normal `plane_no`.
///
/// Returns `None` when the line is parallel to the plane.
pub fn intersect_line_plane(p0: DVec3, p1: DVec3, plane_co: DVec3, plane_no: DVec3) -> Option<DVec3> {
    let u = p1 - p0;
    let denom = plane_no.dot(u);
    if denom.abs() <= ZERO_EPSILON {
        return None;
    }
    let t = plane_no.dot(plane_co - p0) / denom;
    Some(p0 + u * t)
}

/// Translation part of an affine matrix.
pub fn translation_of(m: &DMat4) -> DVec3 {
    m.w_axis.truncate()
}

/// Arithmetic mean of a set of points; `None` for an empty set.
pub fn mean_point(points: &[DVec3]) -> Option<DVec3> {
    if points.is_empty() {
        return None;
    }
    let sum: DVec3 = points.iter().copied().sum();
    Some(sum / points.len() as f64)
}

/// Mirror transform across the YZ plane (negates X).
pub fn mirror_x() -> DMat4 {
    DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0))
}

/// Converts a serialized `[x, y, z]` triple.
pub fn vec3(v: [f64; 3]) -> DVec3 {
    DVec3::from_array(v)
}
