mod components;
mod curve;
mod node;
mod sample;
mod smoothing;
mod types;

pub use components::*;
pub use curve::Curve;
pub use curve::*;
pub use node::*;
pub use sample::*;
pub use smoothing::*;
pub use types::*;

use bevy::prelude::*;

/// Plugin that registers spline types and keeps splines consistent.
///
/// Registers reflection data for scene serialization, rebuilds the derived
/// curve chain on splines restored from scenes, and runs the optional
/// direction smoothing.
pub struct SplinePlugin;

impl Plugin for SplinePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SplineType>()
            .register_type::<SplineNode>()
            .register_type::<Spline>()
            .register_type::<SplineSmoother>()
            .add_systems(Update, (refresh_loaded_splines, smooth_splines).chain());
    }
}

/// Rebuild derived curves on splines that arrive without them, e.g. after
/// scene deserialization.
fn refresh_loaded_splines(mut splines: Query<(Entity, &mut Spline), Added<Spline>>) {
    for (entity, mut spline) in &mut splines {
        if spline.node_count() < 2 {
            warn!("spline on {entity} has fewer than two nodes and will not be sampled");
            continue;
        }
        if !spline.is_valid() {
            spline.refresh_curves();
        }
    }
}
