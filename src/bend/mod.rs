mod bender;
mod source;
mod systems;

pub use bender::*;
pub use source::*;
pub use systems::*;

use bevy::prelude::*;

use crate::spline::SplinePlugin;

/// Plugin that bends template meshes along splines.
///
/// The template must be modeled with **X as the bend axis**: the span from
/// its minimum to its maximum X coordinate is what gets mapped onto the
/// spline, while Y and Z form the cross-section. Y is scaled by each node's
/// `scale.y` and Z by `scale.x`.
///
/// # Usage
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_spline_bend::prelude::*;
///
/// fn setup(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
///     let spline = commands.spawn(Spline::default()).id();
///     let template = meshes.add(Cuboid::new(2.0, 0.2, 1.0));
///
///     commands.spawn(
///         SplineBender::new(spline, template)
///             .with_fill_mode(FillMode::Repeat)
///             .with_uv_mode(UvMode::Extend),
///     );
/// }
/// ```
///
/// Each tick the bender is recomputed only when its configuration or its
/// spline changed; the result lands on a child entity carrying
/// [`GeneratedBendMesh`], inheriting the bender's material.
pub struct SplineBendPlugin;

impl Plugin for SplineBendPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<SplinePlugin>() {
            app.add_plugins(SplinePlugin);
        }

        app.register_type::<SplineBender>()
            .register_type::<FillMode>()
            .register_type::<UvMode>()
            .register_type::<BendTarget>()
            .add_systems(
                Update,
                (systems::init_bender_states, systems::update_bend_meshes).chain(),
            );
    }
}

/// Component that bends a template mesh along a spline.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SplineBender {
    /// The spline entity to bend along.
    pub spline: Entity,
    /// Handle to the template mesh.
    #[reflect(ignore)]
    pub source_mesh: Handle<Mesh>,
    /// The curve or interval the template fills.
    pub target: BendTarget,
    /// How the template's span fills the target.
    pub fill_mode: FillMode,
    /// How texture coordinates react to the filling.
    pub uv_mode: UvMode,
    /// U offset chaining this bender's UVs after another's.
    pub u_offset: f32,
    /// Translation applied to the template before bending.
    pub mesh_translation: Vec3,
    /// Rotation applied to the template before bending.
    pub mesh_rotation: Quat,
    /// Scale applied to the template before bending.
    pub mesh_scale: Vec3,
    /// Whether to keep a trimesh collider in sync with the bent mesh.
    pub generate_collider: bool,
    /// Whether to automatically recompute when the spline changes.
    pub auto_update: bool,
}

impl Default for SplineBender {
    fn default() -> Self {
        Self {
            spline: Entity::PLACEHOLDER,
            source_mesh: Handle::default(),
            target: BendTarget::default(),
            fill_mode: FillMode::default(),
            uv_mode: UvMode::default(),
            u_offset: 0.0,
            mesh_translation: Vec3::ZERO,
            mesh_rotation: Quat::IDENTITY,
            mesh_scale: Vec3::ONE,
            generate_collider: false,
            auto_update: true,
        }
    }
}

impl SplineBender {
    /// Create a new bender configuration.
    pub fn new(spline: Entity, source_mesh: Handle<Mesh>) -> Self {
        Self {
            spline,
            source_mesh,
            ..default()
        }
    }

    /// Set the target curve or interval.
    pub fn with_target(mut self, target: BendTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the fill mode.
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    /// Set the UV mode.
    pub fn with_uv_mode(mut self, uv_mode: UvMode) -> Self {
        self.uv_mode = uv_mode;
        self
    }

    /// Set the U offset.
    pub fn with_u_offset(mut self, u_offset: f32) -> Self {
        self.u_offset = u_offset;
        self
    }

    /// Set the template pre-transform.
    pub fn with_mesh_transform(mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.mesh_translation = translation;
        self.mesh_rotation = rotation;
        self.mesh_scale = scale;
        self
    }

    /// Keep a trimesh collider in sync with the bent mesh.
    pub fn with_collider(mut self, generate_collider: bool) -> Self {
        self.generate_collider = generate_collider;
        self
    }
}

/// Marker component for the generated bend mesh entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct GeneratedBendMesh {
    /// The [`SplineBender`] entity this mesh belongs to.
    pub bender: Entity,
}

/// Per-bender working state, inserted alongside every [`SplineBender`].
///
/// Holds the [`MeshBender`] between ticks so its deferred-compute checkpoint
/// can coalesce edits, plus enough bookkeeping to notice when the template
/// or the target spline entity was swapped out.
#[derive(Component, Debug, Default)]
pub struct BenderState {
    pub(crate) bender: MeshBender,
    pub(crate) source_key: Option<(AssetId<Mesh>, Vec3, Quat, Vec3)>,
    pub(crate) spline: Option<Entity>,
}
