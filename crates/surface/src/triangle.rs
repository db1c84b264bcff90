//! Single-triangle primitives: closest point and ray intersection.
//!
//! Both queries report barycentric weights as `(w0, w1, w2)` for the
//! triangle corners `(a, b, c)`, so `p = w0 * a + w1 * b + w2 * c`.

use glam::{Vec2, Vec3};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-7;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray, in units of the direction's length
    pub t: f32,
    /// Barycentric weights for the three corners
    pub barycentric: Vec3,
}

/// Barycentric weights of the point on triangle `abc` closest to `p`.
///
/// Walks the Voronoi regions of the triangle (three vertices, three edges,
/// then the face). Edge results carry an exact zero for the opposite corner.
pub fn closest_point_barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Vec3::X;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Vec3::Y;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Vec3::Z;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Vec3::new(1.0 - v, v, 0.0);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let v = d2 / (d2 - d6);
        return Vec3::new(1.0 - v, 0.0, v);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let v = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Vec3::new(0.0, 1.0 - v, v);
    }

    let denom = va + vb + vc;
    if denom.abs() < f32::MIN_POSITIVE {
        // Degenerate triangle that slipped past every region test
        return Vec3::X;
    }
    let v = vb / denom;
    let w = vc / denom;
    Vec3::new(1.0 - v - w, v, w)
}

/// Moller-Trumbore ray-triangle intersection.
///
/// Hits on either winding are reported. Hits behind the origin are not.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    a: Vec3,
    b: Vec3,
    c: Vec3,
) -> Option<TriangleHit> {
    let edge1 = b - a;
    let edge2 = c - a;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - a;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < 0.0 {
        return None;
    }

    Some(TriangleHit {
        t,
        barycentric: Vec3::new(1.0 - u - v, u, v),
    })
}

/// Apply barycentric weights to three corner values.
pub fn interpolate_vec3(barycentric: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a * barycentric.x + b * barycentric.y + c * barycentric.z
}

/// Apply barycentric weights to three corner UVs.
pub fn interpolate_vec2(barycentric: Vec3, a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    a * barycentric.x + b * barycentric.y + c * barycentric.z
}
