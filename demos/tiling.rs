//! Example tiling a template mesh curve by curve with continuous UVs.
//!
//! Each curve of the spline gets its own bender in `Repeat` fill. The
//! `Extend` UV mode plus a running U offset stitch the copies into one
//! uninterrupted texture space across curve seams.
//!
//! Run with: `cargo run --example tiling`

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_spline_bend::prelude::FillMode;
use bevy_spline_bend::prelude::*;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Spline Tiling Example".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(SplineBendPlugins)
        .add_systems(Startup, setup)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(14.0, 14.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Lighting
    commands.spawn(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Shape the spline up front so curve lengths are known before spawning.
    let spline = Spline::from_nodes(
        SplineType::CubicBezier,
        vec![
            SplineNode::new(Vec3::new(-12.0, 0.0, -6.0), Vec3::new(-8.0, 0.0, -6.0)),
            SplineNode::new(Vec3::new(-2.0, 2.0, 2.0), Vec3::new(1.0, 2.0, 4.0)),
            SplineNode::new(Vec3::new(6.0, 0.0, -2.0), Vec3::new(9.0, 0.0, -4.0)),
            SplineNode::new(Vec3::new(12.0, 0.0, 6.0), Vec3::new(14.0, 0.0, 9.0)),
        ],
    )
    .unwrap();
    let curve_lengths: Vec<f32> = spline.curves().iter().map(|c| c.length()).collect();
    let spline_entity = commands.spawn(spline).id();

    // A plank-like template, two units long on the bend axis.
    let template_length = 2.0;
    let template = meshes.add(Cuboid::new(template_length, 0.3, 2.0));

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.55, 0.35),
        perceptual_roughness: 0.8,
        ..default()
    });

    // One bender per curve; the U offset advances by the copies the
    // previous curves emitted, keeping the texture continuous.
    let mut u_offset = 0.0;
    for (index, length) in curve_lengths.iter().enumerate() {
        commands.spawn((
            SplineBender::new(spline_entity, template.clone())
                .with_target(BendTarget::Curve { index })
                .with_fill_mode(FillMode::Repeat)
                .with_uv_mode(UvMode::Extend)
                .with_u_offset(u_offset)
                .with_collider(true),
            MeshMaterial3d(material.clone()),
            Transform::default(),
            Visibility::Inherited,
        ));
        u_offset += (length / template_length).floor();
    }

    // Ground plane with a collider so dropped props can land on it.
    let ground = meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(40.0)));
    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.4, 0.3),
        perceptual_roughness: 1.0,
        ..default()
    });
    commands.spawn((
        Mesh3d(ground),
        MeshMaterial3d(ground_material),
        Transform::from_xyz(0.0, -1.5, 0.0),
        RigidBody::Static,
        Collider::half_space(Vec3::Y),
    ));
}
