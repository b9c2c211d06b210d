//! Geometry utilities for spline-based calculations.

use bevy::prelude::*;

/// A local coordinate frame defined by tangent, right, and up vectors.
///
/// Used for orienting bent geometry along curves. The frame is constructed
/// from a tangent direction with automatic handling of degenerate cases
/// (e.g., when the tangent is parallel to the preferred up).
#[derive(Debug, Clone, Copy)]
pub struct CoordinateFrame {
    /// The tangent (forward along the curve) direction.
    pub tangent: Vec3,
    /// The right direction (perpendicular to tangent and up).
    pub right: Vec3,
    /// The corrected up direction (perpendicular to tangent and right).
    pub up: Vec3,
}

impl CoordinateFrame {
    /// Build a coordinate frame from a tangent direction using Y-up convention.
    ///
    /// Handles degenerate cases where tangent is parallel to Y by falling back
    /// to using X as the reference axis.
    pub fn from_tangent(tangent: Vec3) -> Self {
        Self::from_tangent_with_up(tangent, Vec3::Y)
    }

    /// Build a coordinate frame from a tangent and preferred up direction.
    ///
    /// The actual up vector may differ from `preferred_up` to maintain
    /// orthogonality with the tangent.
    pub fn from_tangent_with_up(tangent: Vec3, preferred_up: Vec3) -> Self {
        let tangent = tangent.normalize_or_zero();

        let right = tangent.cross(preferred_up).normalize_or_zero();
        let up = right.cross(tangent).normalize_or_zero();

        // Handle degenerate case: tangent parallel to preferred_up
        let (right, up) = if right.length_squared() < 0.001 {
            let right = tangent.cross(Vec3::X).normalize_or_zero();
            let up = right.cross(tangent).normalize_or_zero();
            (right, up)
        } else {
            (right, up)
        };

        Self { tangent, right, up }
    }

    /// Check if this frame is valid (non-degenerate).
    pub fn is_valid(&self) -> bool {
        self.right.length_squared() > 0.001 && self.up.length_squared() > 0.001
    }

    /// Convert to a rotation quaternion.
    ///
    /// The rotation orients geometry so that:
    /// - Its local +X (the bend axis) points along `tangent`
    /// - Its local +Y points along `up`
    /// - Its local +Z points along `right`
    ///
    /// Returns identity when the frame is degenerate.
    pub fn to_rotation(&self) -> Quat {
        if !self.is_valid() {
            return Quat::IDENTITY;
        }
        Quat::from_mat3(&Mat3::from_cols(self.tangent, self.up, self.right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tangent_basic() {
        let frame = CoordinateFrame::from_tangent(Vec3::Z);
        assert!(frame.is_valid());
        assert!((frame.tangent - Vec3::Z).length() < 0.001);
        assert!((frame.up - Vec3::Y).length() < 0.001);
        assert!((frame.right - Vec3::NEG_X).length() < 0.001);
    }

    #[test]
    fn test_from_tangent_degenerate() {
        // Tangent parallel to Y should still produce a valid frame
        let frame = CoordinateFrame::from_tangent(Vec3::Y);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_rotation_maps_x_onto_tangent() {
        let frame = CoordinateFrame::from_tangent(Vec3::Z);
        let rotation = frame.to_rotation();

        assert!((rotation * Vec3::X - Vec3::Z).length() < 0.001);
        assert!((rotation * Vec3::Y - Vec3::Y).length() < 0.001);
        assert!((rotation * Vec3::Z - Vec3::NEG_X).length() < 0.001);
    }

    #[test]
    fn test_rotation_along_x_is_identity() {
        let frame = CoordinateFrame::from_tangent(Vec3::X);
        let rotation = frame.to_rotation();

        assert!((rotation * Vec3::X - Vec3::X).length() < 0.001);
        assert!((rotation * Vec3::Y - Vec3::Y).length() < 0.001);
    }

    #[test]
    fn test_degenerate_tangent_gives_identity() {
        let frame = CoordinateFrame::from_tangent(Vec3::ZERO);
        assert_eq!(frame.to_rotation(), Quat::IDENTITY);
    }
}
