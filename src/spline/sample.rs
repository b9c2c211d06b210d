use bevy::prelude::*;

use crate::geometry::CoordinateFrame;

/// An immutable sample of a curve at a given time.
///
/// Carries everything needed to place geometry on the curve: location,
/// tangent, up vector, cross-section scale, and where the sample sits in its
/// curve in both distance and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    /// Location on the curve.
    pub location: Vec3,
    /// Unit tangent, or zero where the derivative vanishes.
    pub tangent: Vec3,
    /// Interpolated up vector.
    pub up: Vec3,
    /// Interpolated cross-section scale.
    pub scale: Vec2,
    /// Distance from the start of the owning curve.
    pub distance_in_curve: f32,
    /// Time in [0, 1] within the owning curve.
    pub time_in_curve: f32,
    /// Index of the owning curve within its spline.
    pub curve_index: usize,
}

impl CurveSample {
    /// Linearly interpolate between two samples.
    ///
    /// The tangent is renormalized after interpolation. The curve index is
    /// taken from `a`.
    pub fn lerp(a: &CurveSample, b: &CurveSample, t: f32) -> CurveSample {
        CurveSample {
            location: a.location.lerp(b.location, t),
            tangent: a.tangent.lerp(b.tangent, t).normalize_or_zero(),
            up: a.up.lerp(b.up, t),
            scale: a.scale.lerp(b.scale, t),
            distance_in_curve: a.distance_in_curve
                + (b.distance_in_curve - a.distance_in_curve) * t,
            time_in_curve: a.time_in_curve + (b.time_in_curve - a.time_in_curve) * t,
            curve_index: a.curve_index,
        }
    }

    /// The rotation that maps local +X onto the tangent and local +Y onto
    /// the orthonormalized up vector.
    pub fn rotation(&self) -> Quat {
        CoordinateFrame::from_tangent_with_up(self.tangent, self.up).to_rotation()
    }

    /// Bend a template vertex onto this sample.
    ///
    /// The vertex X coordinate is consumed by the caller's distance mapping,
    /// so only Y and Z survive: scaled by the sample scale (`scale.y` on Y,
    /// `scale.x` on Z), rotated into the curve frame and translated to the
    /// sample location. The normal gets the same rotation.
    pub fn bend_vertex(&self, position: Vec3, normal: Vec3) -> (Vec3, Vec3) {
        let rotation = self.rotation();
        let scaled = Vec3::new(0.0, position.y * self.scale.y, position.z * self.scale.x);
        (rotation * scaled + self.location, rotation * normal)
    }
}
