//! End-to-end physics scenarios
//!
//! These tests drive the full scheduler through `PhysicsWorld::step` and
//! check physical properties of the result:
//! 1. Ball-ball restitution and event firing
//! 2. Resting contact stability under gravity
//! 3. Continuous detection of fast impacts against thin walls
//! 4. Broad-phase rebuild idempotence
//! 5. Reproducibility with a seeded random source

use pinball_math::Vec3;
use pinball_physics::{
    Aabb, BallKey, Collider, HitShape, HitSphere, HitTarget, HitTriangle, NullSink, PhysicsConfig, PhysicsEvent,
    PhysicsMaterial, PhysicsWorld, TableSettings,
};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const RADIUS: f32 = 25.0;

fn level_world() -> PhysicsWorld {
    PhysicsWorld::new(PhysicsConfig::default(), TableSettings::level_frictionless())
}

fn ball_hits(events: &[PhysicsEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, PhysicsEvent::Hit(hit) if matches!(hit.event.target, HitTarget::Ball(_))))
        .count()
}

fn center_distance(world: &PhysicsWorld, a: BallKey, b: BallKey) -> f32 {
    let pa = world.ball(a).expect("ball a").position;
    let pb = world.ball(b).expect("ball b").position;
    (pa - pb).length()
}

// ==================== Ball-Ball Tests ====================

/// Two balls 100 apart, A at (50,0,0) toward resting B
#[test]
fn test_two_ball_head_on_collision() {
    let mut world = level_world();
    let a = world.create_ball(Vec3::new(100.0, 500.0, RADIUS), Vec3::new(50.0, 0.0, 0.0), RADIUS, 1.0);
    let b = world.create_ball(Vec3::new(200.0, 500.0, RADIUS), Vec3::ZERO, RADIUS, 1.0);

    let mut events: Vec<PhysicsEvent> = Vec::new();
    for step in 0..40 {
        world.step(&mut events);
        let distance = center_distance(&world, a, b);
        assert!(
            distance >= 2.0 * RADIUS - 0.001,
            "balls interpenetrate at sub-step {}: distance {}",
            step,
            distance
        );
    }

    assert_eq!(ball_hits(&events), 1, "exactly one ball-ball event expected");

    // Impulse -(1 + 0.8) * dot / 2 with dot = -50
    let va = world.ball(a).unwrap().velocity;
    let vb = world.ball(b).unwrap().velocity;
    assert!((va.x - 5.0).abs() < 0.01, "ball A velocity {:?}", va);
    assert!((vb.x - 45.0).abs() < 0.01, "ball B velocity {:?}", vb);
    assert!(va.y.abs() < 0.001 && vb.y.abs() < 0.001);
}

#[test]
fn test_ball_ball_restitution_ratio() {
    let mut world = level_world();
    let a = world.create_ball(Vec3::new(300.0, 500.0, RADIUS), Vec3::new(12.0, 0.0, 0.0), RADIUS, 1.0);
    let b = world.create_ball(Vec3::new(420.0, 500.0, RADIUS), Vec3::new(-8.0, 0.0, 0.0), RADIUS, 1.0);

    let approach = 20.0;
    for _ in 0..100 {
        world.step(&mut NullSink);
    }

    let va = world.ball(a).unwrap().velocity;
    let vb = world.ball(b).unwrap().velocity;
    let separation = vb.x - va.x;
    assert!(
        (separation - 0.8 * approach).abs() < 0.01,
        "separating speed {} should be 0.8 x {}",
        separation,
        approach
    );

    // Momentum is conserved for equal masses
    assert!((va.x + vb.x - 4.0).abs() < 0.01);
}

#[test]
fn test_ball_against_frozen_ball() {
    let mut world = level_world();
    let a = world.create_ball(Vec3::new(100.0, 500.0, RADIUS), Vec3::new(20.0, 0.0, 0.0), RADIUS, 1.0);
    let b = world.create_ball(Vec3::new(200.0, 500.0, RADIUS), Vec3::ZERO, RADIUS, 1.0);
    world.set_frozen(b, true);

    for _ in 0..60 {
        world.step(&mut NullSink);
    }

    // Infinite mass: A bounces back at 0.8 of its speed, B never moves
    assert!((world.ball(a).unwrap().velocity.x + 16.0).abs() < 0.01);
    assert_eq!(world.ball(b).unwrap().position, Vec3::new(200.0, 500.0, RADIUS));
}

// ==================== Contact Tests ====================

#[test]
fn test_resting_ball_stays_on_playfield() {
    let table = TableSettings {
        slope_degrees: 0.0,
        ..TableSettings::default()
    };
    let gravity_step = table.gravity * PhysicsConfig::default().phys_factor();
    let mut world = PhysicsWorld::new(PhysicsConfig::default(), table);
    let key = world.create_ball(Vec3::new(500.0, 1000.0, RADIUS), Vec3::ZERO, RADIUS, 1.0);

    let touch = world.config().contact.touch_distance;
    for step in 0..1000 {
        world.step(&mut NullSink);
        let ball = world.ball(key).unwrap();
        assert!(
            (ball.position.z - RADIUS).abs() <= touch,
            "ball drifted to z = {} at sub-step {}",
            ball.position.z,
            step
        );
        // The contact impulse pre-compensates the next gravity increment
        assert!(ball.velocity.z.abs() <= gravity_step + 0.001);
    }

    let ball = world.ball(key).unwrap();
    assert!((ball.position.x - 500.0).abs() < 0.001);
    assert!((ball.position.y - 1000.0).abs() < 0.001);
    // Normal velocity seen by the next sub-step is zero
    assert!((ball.velocity.z - gravity_step).abs() < 0.001);
}

#[test]
fn test_ball_rolls_down_sloped_table() {
    let mut world = PhysicsWorld::new(PhysicsConfig::default(), TableSettings::default());
    let key = world.create_ball(Vec3::new(500.0, 200.0, RADIUS), Vec3::ZERO, RADIUS, 1.0);

    for _ in 0..500 {
        world.step(&mut NullSink);
    }

    let ball = world.ball(key).unwrap();
    assert!(ball.position.y > 200.0, "ball should roll toward the player");
    assert!((ball.position.z - RADIUS).abs() < 0.1, "ball should stay on the playfield");
    // Rolling on a frictional surface spins the ball about x
    assert!(ball.angular_velocity().x.abs() > 0.0);
}

// ==================== Continuous Detection Tests ====================

fn add_thin_wall(world: &mut PhysicsWorld) -> pinball_physics::ColliderId {
    // Zero-thickness wall at x = 500 facing -x
    let lower = HitTriangle::new(
        Vec3::new(500.0, 0.0, 0.0),
        Vec3::new(500.0, 0.0, 100.0),
        Vec3::new(500.0, 1000.0, 0.0),
    )
    .expect("lower wall triangle");
    let upper = HitTriangle::new(
        Vec3::new(500.0, 1000.0, 0.0),
        Vec3::new(500.0, 0.0, 100.0),
        Vec3::new(500.0, 1000.0, 100.0),
    )
    .expect("upper wall triangle");

    let id = world.add_collider(Collider::new(HitShape::Triangle(lower)).with_events(0.0));
    world.add_collider(Collider::new(HitShape::Triangle(upper)).with_events(0.0));
    id
}

#[test]
fn test_fast_ball_never_tunnels_through_thin_wall() {
    // From well below one box size per sub-step to far beyond the table width
    let speeds = [1.0, 10.0, 100.0, 500.0, 1_000.0, 5_000.0, 20_000.0];

    for speed in speeds {
        let mut world = level_world();
        add_thin_wall(&mut world);
        let contact_x = 500.0 - RADIUS;
        let start = Vec3::new(contact_x - speed * 0.45, 500.0, RADIUS);
        let key = world.create_ball(start, Vec3::new(speed, 0.0, 0.0), RADIUS, 1.0);

        let mut events: Vec<PhysicsEvent> = Vec::new();
        for _ in 0..10 {
            world.step(&mut events);
            let x = world.ball(key).unwrap().position.x;
            assert!(x <= contact_x + 0.01, "speed {}: ball passed the wall (x = {})", speed, x);
        }

        let hits = events.iter().filter(|e| matches!(e, PhysicsEvent::Hit(_))).count();
        assert_eq!(hits, 1, "speed {}: wall should report one hit", speed);
        assert!(world.ball(key).unwrap().velocity.x < 0.0, "speed {}: ball should bounce back", speed);
    }
}

// ==================== Broad Phase Tests ====================

#[test]
fn test_dynamic_rebuild_is_idempotent() {
    let mut world = level_world();
    for i in 0..20 {
        let x = 50.0 + (i % 5) as f32 * 120.0;
        let y = 50.0 + (i / 5) as f32 * 120.0;
        world.create_ball(Vec3::new(x, y, RADIUS), Vec3::new(i as f32, 0.0, 0.0), RADIUS, 1.0);
    }

    let queries = [
        Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(200.0, 200.0, 50.0)),
        Aabb::new(Vec3::new(280.0, 150.0, 0.0), Vec3::new(300.0, 420.0, 50.0)),
        Aabb::EVERYTHING,
    ];

    let before: Vec<Vec<BallKey>> = queries.iter().map(|q| world.query_dynamic(q)).collect();
    world.rebuild_dynamic_index();
    let after: Vec<Vec<BallKey>> = queries.iter().map(|q| world.query_dynamic(q)).collect();

    assert_eq!(before, after);
    assert_eq!(after[2].len(), 20);
}

// ==================== Determinism Tests ====================

fn scatter_table_world(seed: u64) -> PhysicsWorld {
    let table = TableSettings {
        difficulty: 1.0,
        ..TableSettings::default()
    };
    let mut world =
        PhysicsWorld::new(PhysicsConfig::default(), table).with_rng(Box::new(Pcg32::seed_from_u64(seed)));

    let scattering = PhysicsMaterial::new(0.9, 0.1, 0.3, 0.15);
    for (x, y) in [(300.0, 700.0), (500.0, 900.0), (700.0, 700.0), (500.0, 1200.0)] {
        world.add_collider(
            Collider::new(HitShape::Sphere(HitSphere {
                center: Vec3::new(x, y, RADIUS),
                radius: 30.0,
            }))
            .with_material(scattering),
        );
    }

    world.create_ball(Vec3::new(320.0, 300.0, RADIUS), Vec3::new(0.5, 3.0, 0.0), RADIUS, 1.0);
    world.create_ball(Vec3::new(510.0, 400.0, RADIUS), Vec3::new(0.0, 4.0, 0.0), RADIUS, 1.0);
    world.create_ball(Vec3::new(690.0, 350.0, RADIUS), Vec3::new(-0.5, 2.0, 0.0), RADIUS, 1.0);
    world
}

#[test]
fn test_same_seed_reproduces_run() {
    let mut first = scatter_table_world(7);
    let mut second = scatter_table_world(7);

    let mut first_events: Vec<PhysicsEvent> = Vec::new();
    let mut second_events: Vec<PhysicsEvent> = Vec::new();
    for _ in 0..2000 {
        first.step(&mut first_events);
        second.step(&mut second_events);
    }

    assert_eq!(first.snapshots(), second.snapshots());
    assert_eq!(first_events, second_events);
    assert_eq!(first.physics_iterations(), 2000);
}

#[test]
fn test_wall_clock_driving_matches_stepping() {
    let mut stepped = scatter_table_world(11);
    let mut clocked = scatter_table_world(11);

    for _ in 0..300 {
        stepped.step(&mut NullSink);
    }

    // Uneven frame times covering the same 300 ms
    clocked.update(0, &mut NullSink);
    let mut now = 0;
    for frame in [16_667, 16_666, 33_333, 8_000, 25_334] {
        for _ in 0..2 {
            now += frame;
            clocked.update(now, &mut NullSink);
        }
    }
    assert_eq!(now, 200_000);
    clocked.update(300_000, &mut NullSink);

    assert_eq!(clocked.physics_iterations(), 300);
    assert_eq!(stepped.snapshots(), clocked.snapshots());
}
