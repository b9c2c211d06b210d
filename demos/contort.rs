//! Example animating a mesh stretched over a sliding spline interval.
//!
//! Run with: `cargo run --example contort`

use bevy::prelude::*;
use bevy_spline_bend::prelude::*;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Spline Contort Example".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(SplineBendPlugins)
        .add_systems(Startup, setup)
        .add_systems(Update, slide_interval)
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
        Transform::from_xyz(12.0, 10.0, 16.0).looking_at(Vec3::ZERO, Vec3::Y),
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

    // A winding spline; handles are placed by the smoother.
    let spline = commands
        .spawn((
            Spline::from_nodes(
                SplineType::CubicBezier,
                vec![
                    SplineNode::new(Vec3::new(-10.0, 0.0, -4.0), Vec3::ZERO),
                    SplineNode::new(Vec3::new(-4.0, 1.0, 2.0), Vec3::ZERO),
                    SplineNode::new(Vec3::new(2.0, 3.0, -2.0), Vec3::ZERO),
                    SplineNode::new(Vec3::new(8.0, 0.0, 4.0), Vec3::ZERO),
                ],
            )
            .unwrap(),
            SplineSmoother::default(),
        ))
        .id();

    // The template that slides along the spline.
    let template = meshes.add(Cuboid::new(4.0, 0.6, 1.2));

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.8, 0.3, 0.2),
        perceptual_roughness: 0.6,
        ..default()
    });

    commands.spawn((
        SplineBender::new(spline, template)
            .with_fill_mode(FillMode::Stretch)
            .with_uv_mode(UvMode::Stretch)
            .with_target(BendTarget::Interval {
                start: 0.0,
                end: 6.0,
            }),
        MeshMaterial3d(material),
        Transform::default(),
        Visibility::Inherited,
    ));

    // Ground plane
    let ground = meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(30.0)));
    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.4, 0.3),
        perceptual_roughness: 1.0,
        ..default()
    });
    commands.spawn((
        Mesh3d(ground),
        MeshMaterial3d(ground_material),
        Transform::from_xyz(0.0, -1.0, 0.0),
    ));
}

/// Slide the bender's interval back and forth along the spline.
fn slide_interval(
    time: Res<Time>,
    mut benders: Query<&mut SplineBender>,
    splines: Query<&Spline>,
) {
    for mut bender in &mut benders {
        let Ok(spline) = splines.get(bender.spline) else {
            continue;
        };
        let window = 6.0_f32.min(spline.length());
        let travel = spline.length() - window;
        if travel <= 0.0 {
            continue;
        }
        // Ping-pong between the spline ends.
        let phase = (time.elapsed_secs() * 0.3).fract() * 2.0;
        let start = travel * if phase < 1.0 { phase } else { 2.0 - phase };
        bender.target = BendTarget::Interval {
            start,
            end: start + window,
        };
    }
}
