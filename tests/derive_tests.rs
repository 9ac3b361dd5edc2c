//! Integration tests for the `Positioned` derive macro.
//!
//! These build layouts straight from derived particle types and check that
//! the generated `position()` reads the right field.

use boids_grid::prelude::*;

// ============================================================================
// Structs
// ============================================================================

#[derive(Positioned, Clone)]
struct Boid {
    position: Vec3,
    velocity: Vec3,
}

#[derive(Positioned, Clone)]
struct Marker {
    label: u32,
    #[position]
    at: [f32; 3],
    // a field called `position` loses to the marked one
    position: f32,
}

#[derive(Positioned, Clone)]
struct Tagged(u32, #[position] Vec3);

#[test]
fn test_struct_position_by_name() {
    let boid = Boid {
        position: Vec3::new(1.0, 2.0, 3.0),
        velocity: Vec3::ONE,
    };
    assert_eq!(boid.position(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(boid.velocity, Vec3::ONE);
}

#[test]
fn test_struct_position_by_attribute() {
    let marker = Marker {
        label: 4,
        at: [0.5, -1.0, 2.0],
        position: 99.0,
    };
    assert_eq!(Positioned::position(&marker), Vec3::new(0.5, -1.0, 2.0));
    assert_eq!(marker.label, 4);
    assert_eq!(marker.position, 99.0);
}

#[test]
fn test_tuple_struct_position() {
    let tagged = Tagged(7, Vec3::new(-3.0, 0.0, 1.0));
    assert_eq!(tagged.position(), Vec3::new(-3.0, 0.0, 1.0));
    assert_eq!(tagged.0, 7);
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Positioned, Clone)]
enum Agent {
    Boid { position: Vec3, velocity: Vec3 },
    Predator {
        hunger: f32,
        #[position]
        at: Vec3,
    },
    Beacon(#[position] [f32; 3]),
    Relay(u8, #[position] Vec3, f32),
}

#[test]
fn test_enum_positions() {
    let agents = [
        Agent::Boid {
            position: Vec3::X,
            velocity: Vec3::ZERO,
        },
        Agent::Predator {
            hunger: 0.5,
            at: Vec3::Y,
        },
        Agent::Beacon([0.0, 0.0, 1.0]),
        Agent::Relay(3, Vec3::splat(2.0), 9.0),
    ];
    let positions: Vec<Vec3> = agents.iter().map(|a| a.position()).collect();
    assert_eq!(positions, vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::splat(2.0)]);

    if let Agent::Predator { hunger, .. } = &agents[1] {
        assert_eq!(*hunger, 0.5);
    }
    if let Agent::Boid { velocity, .. } = &agents[0] {
        assert_eq!(*velocity, Vec3::ZERO);
    }
    if let Agent::Relay(channel, _, range) = &agents[3] {
        assert_eq!((*channel, *range), (3, 9.0));
    }
}

// ============================================================================
// Building from derived types
// ============================================================================

#[test]
fn test_build_from_derived_structs() {
    let flock: Vec<Boid> = (0..64)
        .map(|i| Boid {
            position: Vec3::new((i % 4) as f32, ((i / 4) % 4) as f32, (i / 16) as f32),
            velocity: Vec3::ZERO,
        })
        .collect();
    let points: Vec<Vec3> = flock.iter().map(|b| b.position).collect();

    let config = SpatialConfig::for_particles(1.0, flock.len()).unwrap();
    let from_structs = SpatialHash::build(config, &flock).unwrap();
    let from_points = SpatialHash::build(config, &points).unwrap();

    assert_eq!(from_structs.offsets(), from_points.offsets());
    assert_eq!(from_structs.indices(), from_points.indices());

    let mut buffer = QueryBuffer::new();
    let near = from_structs
        .query_within(Vec3::new(1.0, 1.0, 1.0), 1.0, &flock, &mut buffer)
        .unwrap();
    // the grid point itself plus its six axis neighbours
    assert_eq!(near.len(), 7);
}

#[test]
fn test_build_from_arrays_and_enums() {
    let arrays = [[0.0f32, 0.0, 0.0], [5.0, 5.0, 5.0]];
    let hash = SpatialHash::build(SpatialConfig::new(1.0, 8).unwrap(), &arrays).unwrap();
    assert_eq!(hash.len(), 2);

    let agents = vec![
        Agent::Beacon([0.0, 0.0, 0.0]),
        Agent::Predator {
            hunger: 1.0,
            at: Vec3::splat(0.25),
        },
    ];
    let hash = SpatialHash::build(SpatialConfig::new(1.0, 8).unwrap(), &agents).unwrap();
    assert_eq!(hash.bucket(hash.bucket_of(Vec3::ZERO)).len(), 2);
}
