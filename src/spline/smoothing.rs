use bevy::prelude::*;

use super::Spline;

/// Automatically shapes direction handles from neighbor positions.
///
/// Attach next to a [`Spline`] to get smooth curvature through the nodes
/// without placing handles by hand. Each tick the node positions are
/// compared against the last smoothed state; when they drift, every handle
/// is recomputed from the directions to the neighboring nodes.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SplineSmoother {
    /// Handle length as a fraction of the average neighbor distance.
    pub tension: f32,
    #[reflect(ignore)]
    cached_positions: Vec<Vec3>,
    #[reflect(ignore)]
    cached_tension: f32,
}

impl Default for SplineSmoother {
    fn default() -> Self {
        Self {
            tension: 0.3,
            cached_positions: Vec::new(),
            cached_tension: f32::NAN,
        }
    }
}

impl SplineSmoother {
    /// Create a smoother with a custom tension.
    pub fn new(tension: f32) -> Self {
        Self {
            tension,
            ..default()
        }
    }
}

/// Compute the smoothed absolute direction handle for a node.
///
/// The handle direction is the difference of the unit vectors towards the
/// previous and next node, and its length is the average neighbor distance
/// scaled by `tension`. Endpoints use their single neighbor.
pub fn smoothed_direction(
    previous: Option<Vec3>,
    position: Vec3,
    next: Option<Vec3>,
    tension: f32,
) -> Vec3 {
    let mut direction = Vec3::ZERO;
    let mut average_magnitude = 0.0;
    if let Some(previous) = previous {
        let to_previous = position - previous;
        average_magnitude += to_previous.length();
        direction += to_previous.normalize_or_zero();
    }
    if let Some(next) = next {
        let to_next = position - next;
        average_magnitude += to_next.length();
        direction -= to_next.normalize_or_zero();
    }
    average_magnitude *= 0.5;
    position + direction.normalize_or_zero() * average_magnitude * tension
}

/// Recompute direction handles on splines whose node positions moved.
pub fn smooth_splines(mut splines: Query<(&mut Spline, &mut SplineSmoother)>) {
    for (mut spline, mut smoother) in &mut splines {
        if !spline.is_valid() {
            continue;
        }

        let positions: Vec<Vec3> = spline.nodes().iter().map(|n| n.position).collect();
        if positions == smoother.cached_positions && smoother.tension == smoother.cached_tension {
            continue;
        }

        let tension = smoother.tension;
        for index in 0..positions.len() {
            let previous = index.checked_sub(1).map(|i| positions[i]);
            let next = positions.get(index + 1).copied();
            let direction = smoothed_direction(previous, positions[index], next, tension);
            // Index is in range by construction.
            let _ = spline.set_node_direction(index, direction);
        }

        smoother.cached_positions = positions;
        smoother.cached_tension = tension;
    }
}
