use avian3d::prelude::*;
use bevy::prelude::*;

use crate::spline::Spline;

use super::{BenderState, GeneratedBendMesh, SourceMesh, SplineBender};

/// Insert working state for benders that arrived without it.
pub fn init_bender_states(
    mut commands: Commands,
    benders: Query<Entity, (With<SplineBender>, Without<BenderState>)>,
) {
    for entity in &benders {
        commands.entity(entity).insert(BenderState::default());
    }
}

/// The per-tick bend checkpoint.
///
/// Syncs each bender's configuration into its [`MeshBender`](super::MeshBender),
/// rebuilds the template snapshot when its handle or pre-transform changed,
/// and recomputes at most once per tick no matter how many edits the spline
/// took since the last one. Fresh buffers land on a child entity carrying
/// [`GeneratedBendMesh`] together with the bender's material and, when
/// enabled, a trimesh collider.
pub fn update_bend_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut benders: Query<(
        Entity,
        &SplineBender,
        &mut BenderState,
        Option<&MeshMaterial3d<StandardMaterial>>,
    )>,
    splines: Query<&Spline>,
    bend_mesh_children: Query<&Children>,
    existing_bend_meshes: Query<(), With<GeneratedBendMesh>>,
) {
    for (bender_entity, config, mut state, material) in &mut benders {
        let Ok(spline) = splines.get(config.spline) else {
            continue;
        };
        if !spline.is_valid() {
            continue;
        }

        // Rebuild the template snapshot when the handle or pre-transform
        // moved. A not-yet-loaded asset is retried next tick.
        let source_key = (
            config.source_mesh.id(),
            config.mesh_translation,
            config.mesh_rotation,
            config.mesh_scale,
        );
        if state.source_key != Some(source_key) {
            let Some(mesh) = meshes.get(&config.source_mesh) else {
                continue;
            };
            let source = SourceMesh::from_mesh(mesh).and_then(|builder| {
                builder
                    .with_translation(config.mesh_translation)
                    .with_rotation(config.mesh_rotation)
                    .with_scale(config.mesh_scale)
                    .finish()
            });
            match source {
                Ok(source) => {
                    state.bender.set_source(source);
                    state.source_key = Some(source_key);
                }
                Err(err) => {
                    warn!("cannot build bend template for {bender_entity}: {err}");
                    state.source_key = Some(source_key);
                    continue;
                }
            }
        }

        state.bender.set_target(config.target);
        state.bender.set_fill_mode(config.fill_mode);
        state.bender.set_uv_mode(config.uv_mode);
        state.bender.set_u_offset(config.u_offset);
        // Revisions of different splines are unrelated, so retargeting to
        // another spline entity forces a rebuild.
        if state.spline != Some(config.spline) {
            state.spline = Some(config.spline);
            state.bender.mark_dirty();
        }

        if !config.auto_update && !state.bender.is_dirty() {
            continue;
        }

        let bent = match state.bender.compute_if_needed(spline) {
            Ok(Some(bent)) => bent,
            Ok(None) => continue,
            Err(err) => {
                warn!("bending failed for {bender_entity}: {err}");
                continue;
            }
        };
        debug!(
            "bent mesh for {bender_entity}: {} vertices, {} triangles",
            bent.vertex_count(),
            bent.triangle_count()
        );

        let mesh = bent.to_mesh();
        let collider = if config.generate_collider {
            Collider::trimesh_from_mesh(&mesh)
        } else {
            None
        };
        let mesh_handle = meshes.add(mesh);

        // Find or create the mesh entity
        let mut found_mesh_entity = None;
        if let Ok(children) = bend_mesh_children.get(bender_entity) {
            for child in children.iter() {
                if existing_bend_meshes.get(child).is_ok() {
                    found_mesh_entity = Some(child);
                    break;
                }
            }
        }

        if let Some(mesh_entity) = found_mesh_entity {
            let mut entity_commands = commands.entity(mesh_entity);
            entity_commands.insert(Mesh3d(mesh_handle));
            if let Some(mat) = material {
                entity_commands.insert(mat.clone());
            }
            if let Some(collider) = collider {
                entity_commands.insert(collider);
            }
        } else {
            let mut entity_commands = commands.spawn((
                Mesh3d(mesh_handle),
                Transform::default(),
                Visibility::default(),
                GeneratedBendMesh {
                    bender: bender_entity,
                },
            ));

            if let Some(mat) = material {
                entity_commands.insert(mat.clone());
            }
            if let Some(collider) = collider {
                entity_commands.insert((collider, RigidBody::Static));
            }

            let mesh_entity = entity_commands.id();
            commands.entity(bender_entity).add_child(mesh_entity);
        }
    }
}
