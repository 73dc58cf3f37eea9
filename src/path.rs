//! Path interpolators: pure functions over a vector of control points,
//! evaluated at a normalized parameter `t ∈ [0,1]`.
//!
//! A [`Tween`](crate::tween::Tween) with waypoints assembles, per scalar
//! component, a control-point vector `[start, w0, w1, ..., target]` and hands
//! it to a [`Path`] instead of doing a plain linear lerp.

/// A path evaluator over `n` control points (`points[0]` is the start value,
/// `points[n-1]` is the target value, interior points are waypoints).
pub trait Path {
    /// Evaluate the path at `t ∈ [0,1]` given `points.len() >= 2`.
    fn compute(&self, t: f64, points: &[f64]) -> f64;
}

/// Piecewise-linear interpolation through the control points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl Path for Linear {
    fn compute(&self, t: f64, points: &[f64]) -> f64 {
        let segments = points.len() - 1;
        if segments == 0 {
            return points[0];
        }
        let scaled = t.clamp(0.0, 1.0) * segments as f64;
        let idx = (scaled.floor() as usize).min(segments - 1);
        let local_t = scaled - idx as f64;
        points[idx] + (points[idx + 1] - points[idx]) * local_t
    }
}

/// Catmull-Rom spline through the control points. This is the default path
/// used when a [`Tween`](crate::tween::Tween) has waypoints but no explicit
/// path was set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatmullRom;

impl Path for CatmullRom {
    fn compute(&self, t: f64, points: &[f64]) -> f64 {
        let segments = points.len() - 1;
        if segments == 0 {
            return points[0];
        }
        let scaled = t.clamp(0.0, 1.0) * segments as f64;
        let idx = (scaled.floor() as usize).min(segments - 1);
        let local_t = scaled - idx as f64;

        let p0 = point_at(points, idx as isize - 1);
        let p1 = point_at(points, idx as isize);
        let p2 = point_at(points, idx as isize + 1);
        let p3 = point_at(points, idx as isize + 2);

        catmull_rom_segment(p0, p1, p2, p3, local_t)
    }
}

/// Clamp-to-edge lookup for Catmull-Rom's phantom points at the ends of the
/// control point list.
fn point_at(points: &[f64], i: isize) -> f64 {
    let last = points.len() as isize - 1;
    points[i.clamp(0, last) as usize]
}

fn catmull_rom_segment(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}
