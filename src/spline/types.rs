use bevy::prelude::*;

/// The interpolation used by every curve of a spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Default)]
pub enum SplineType {
    /// Straight segments between consecutive nodes.
    Linear,
    /// Cubic Bézier segments shaped by each node's direction handle.
    #[default]
    CubicBezier,
}

/// Evaluate a cubic Bézier in Bernstein form.
///
/// `p0` and `p3` are on the curve, `p1` and `p2` are handles.
pub fn cubic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    let mt3 = mt2 * mt;

    p0 * mt3 + p1 * 3.0 * mt2 * t + p2 * 3.0 * mt * t2 + p3 * t3
}

/// Evaluate the derivative of a cubic Bézier.
pub fn cubic_bezier_derivative(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;

    (p1 - p0) * 3.0 * mt2 + (p2 - p1) * 6.0 * mt * t + (p3 - p2) * 3.0 * t2
}
