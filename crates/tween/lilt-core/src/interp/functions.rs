//! Interpolation helpers:
//! - component-wise lerp/add/sub for fixed-size arrays
//! - quaternion slerp (unclamped, shortest arc) with an nlerp fallback
//! - cubic-bezier timing curves

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

/// `a + d * t` per component. Exact `a` at t = 0 and `a + d` at t = 1.
#[inline]
pub fn add_scaled<const N: usize>(a: [f32; N], d: [f32; N], t: f32) -> [f32; N] {
    let mut out = a;
    for i in 0..N {
        out[i] = a[i] + d[i] * t;
    }
    out
}

#[inline]
pub fn sub<const N: usize>(a: [f32; N], b: [f32; N]) -> [f32; N] {
    let mut out = a;
    for i in 0..N {
        out[i] = a[i] - b[i];
    }
    out
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion; zero-length input yields the identity.
#[inline]
pub fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 && len2.is_finite() {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
        q
    } else {
        [0.0, 0.0, 0.0, 1.0]
    }
}

/// Quaternion NLERP with shortest-arc correction.
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Spherical interpolation (x, y, z, w) along the shortest arc.
///
/// `t` is not clamped: values past 1 keep rotating at the same angular rate,
/// which incremental cycles rely on. Nearly parallel inputs fall back to NLERP.
pub fn slerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    let mut d = dot4(a, b);
    if d < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
        d = -d;
    }
    if d > 0.9995 {
        return nlerp_quat(a, b, t);
    }
    let theta = d.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    normalize4([
        a[0] * wa + b[0] * wb,
        a[1] * wa + b[1] * wb,
        a[2] * wa + b[2] * wb,
        a[3] * wa + b[3] * wb,
    ])
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 ∈ [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx4(a: [f32; 4], b: [f32; 4]) {
        for i in 0..4 {
            assert!((a[i] - b[i]).abs() < 1e-5, "left={a:?} right={b:?}");
        }
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let id = [0.0, 0.0, 0.0, 1.0];
        let half = std::f32::consts::FRAC_PI_4;
        // 90 degrees about Z
        let z90 = [0.0, 0.0, half.sin(), half.cos()];
        approx4(slerp_quat(id, z90, 0.0), id);
        approx4(slerp_quat(id, z90, 1.0), z90);
        let q = std::f32::consts::FRAC_PI_8;
        approx4(slerp_quat(id, z90, 0.5), [0.0, 0.0, q.sin(), q.cos()]);
    }

    #[test]
    fn slerp_takes_the_shortest_arc() {
        let id = [0.0, 0.0, 0.0, 1.0];
        let neg = [0.0, 0.0, 0.0, -1.0];
        let out = slerp_quat(id, neg, 0.5);
        assert!((out[3].abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bezier_linear_fast_path() {
        assert_eq!(bezier_ease_t(0.3, 0.0, 0.0, 1.0, 1.0), 0.3);
        let mid = bezier_ease_t(0.5, 0.42, 0.0, 0.58, 1.0);
        assert!((mid - 0.5).abs() < 1e-3);
    }
}
