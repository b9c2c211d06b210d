//! # bevy_spline_bend
//!
//! A Bevy plugin for bending template meshes along 3D splines.
//!
//! ## Features
//!
//! - Linear and cubic Bézier splines with per-node up vectors and
//!   cross-section scale
//! - Arc-length sampling, closest-point projection, and loop binding
//! - Three filling policies: once, repeat, stretch
//! - Three UV policies: repeat, extend, stretch, chainable across benders
//! - Automatic direction smoothing from neighbor positions
//! - Optional trimesh colliders on the bent geometry via avian3d
//! - Serializable with Bevy's scene system (RON format)
//!
//! ## Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_spline_bend::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(SplineBendPlugins)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
//!     // A spline whose handles are shaped automatically
//!     let spline = commands
//!         .spawn((
//!             Spline::from_nodes(
//!                 SplineType::CubicBezier,
//!                 vec![
//!                     SplineNode::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::ZERO),
//!                     SplineNode::new(Vec3::new(0.0, 2.0, 3.0), Vec3::ZERO),
//!                     SplineNode::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO),
//!                 ],
//!             )
//!             .unwrap(),
//!             SplineSmoother::default(),
//!         ))
//!         .id();
//!
//!     // Tile a template mesh along it
//!     let template = meshes.add(Cuboid::new(2.0, 0.2, 1.0));
//!     commands.spawn(
//!         SplineBender::new(spline, template).with_fill_mode(FillMode::Repeat),
//!     );
//! }
//! ```
//!
//! ## Plugins
//!
//! - [`SplinePlugin`]: spline types, scene registration, smoothing (required)
//! - [`SplineBendPlugin`]: mesh bending along splines (adds `SplinePlugin`
//!   when missing)
//! - [`SplineBendPlugins`]: both of the above

use bevy::app::{PluginGroup, PluginGroupBuilder};

pub mod bend;
pub mod error;
pub mod geometry;
pub mod spline;

pub use bend::SplineBendPlugin;
pub use spline::SplinePlugin;

/// Plugin group with the full spline and bending stack.
pub struct SplineBendPlugins;

impl PluginGroup for SplineBendPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(SplinePlugin)
            .add(SplineBendPlugin)
    }
}

/// Convenient re-exports of commonly used types.
pub mod prelude {
    pub use crate::bend::{
        BendTarget, BentMesh, FillMode, GeneratedBendMesh, MeshBender, MeshVertex, SourceMesh,
        SplineBendPlugin, SplineBender, UvMode,
    };
    pub use crate::error::{BendError, BendResult, SplineError, SplineResult};
    pub use crate::spline::{
        Curve, CurveSample, Spline, SplineNode, SplinePlugin, SplineSmoother, SplineType,
    };
    pub use crate::SplineBendPlugins;
}
