use bevy::prelude::*;

/// A control node of a spline.
///
/// The direction handle is an absolute point, not an offset: the outgoing
/// Bézier control point is `direction` itself, and the incoming one is its
/// mirror through the position.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Default)]
pub struct SplineNode {
    /// Node position.
    pub position: Vec3,
    /// Absolute position of the outgoing direction handle.
    pub direction: Vec3,
    /// Preferred up vector at this node.
    pub up: Vec3,
    /// Cross-section scale at this node.
    pub scale: Vec2,
}

impl Default for SplineNode {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            up: Vec3::Y,
            scale: Vec2::ONE,
        }
    }
}

impl SplineNode {
    /// Create a node from a position and an absolute direction handle.
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
            ..default()
        }
    }

    /// Set the up vector.
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Set the cross-section scale.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// The incoming handle, mirroring the outgoing one through the position.
    pub fn inverse_direction(&self) -> Vec3 {
        2.0 * self.position - self.direction
    }
}
