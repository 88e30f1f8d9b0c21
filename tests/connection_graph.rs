//! Property tests for the proximity line graph and the point generators
//! feeding it.

use plexus::connections::{ConnectionGraph, ConnectionOptions, ConnectionUpdate};
use plexus::field::{generate_sphere_shell, generate_uniform};
use plexus::spawn::PointSampler;
use plexus::Vec3;
use proptest::prelude::*;

fn options(min_distance: f32, limit: bool, max_connections: u32) -> ConnectionOptions {
    ConnectionOptions {
        min_distance,
        limit_connections: limit,
        max_connections,
        ..Default::default()
    }
}

fn point(positions: &[f32], i: usize) -> Vec3 {
    Vec3::from_slice(&positions[i * 3..i * 3 + 3])
}

fn dist_sq(positions: &[f32], a: usize, b: usize) -> f32 {
    let dx = positions[a * 3] - positions[b * 3];
    let dy = positions[a * 3 + 1] - positions[b * 3 + 1];
    let dz = positions[a * 3 + 2] - positions[b * 3 + 2];
    dx * dx + dy * dy + dz * dz
}

/// Replays the scan and returns the pairs that must be connected.
fn expected_pairs(positions: &[f32], opts: &ConnectionOptions) -> Vec<(u32, u32)> {
    let count = positions.len() / 3;
    let mut degrees = vec![0u32; count];
    let mut pairs = Vec::new();
    for i in 0..count {
        for j in (i + 1)..count {
            if opts.limit_connections && degrees[j] >= opts.max_connections {
                continue;
            }
            let d = dist_sq(positions, i, j);
            if d < opts.min_distance * opts.min_distance {
                degrees[i] += 1;
                degrees[j] += 1;
                pairs.push((i as u32, j as u32));
            }
        }
    }
    pairs
}

fn cloud() -> impl Strategy<Value = Vec<f32>> {
    (0usize..40).prop_flat_map(|count| prop::collection::vec(-60.0f32..60.0, count * 3))
}

proptest! {
    #[test]
    fn edges_follow_scan_order(
        positions in cloud(),
        min_distance in 1.0f32..80.0,
        limit in any::<bool>(),
        max_connections in 0u32..6,
    ) {
        let opts = options(min_distance, limit, max_connections);
        let mut graph = ConnectionGraph::new(positions.len() / 3, opts);
        graph.update_geometry(&positions);

        let pairs: Vec<_> = graph.edges().iter().map(|e| (e.a, e.b)).collect();
        prop_assert_eq!(pairs, expected_pairs(&positions, &opts));
        prop_assert_eq!(graph.draw_range(), 0..graph.segment_count() * 2);
    }

    #[test]
    fn alpha_in_unit_range_and_shrinks_with_distance(
        positions in cloud(),
        min_distance in 1.0f32..80.0,
    ) {
        let mut graph = ConnectionGraph::new(positions.len() / 3, options(min_distance, false, 0));
        graph.update_geometry(&positions);

        let mut by_distance: Vec<(f32, f32)> = graph
            .edges()
            .iter()
            .map(|e| {
                let d = dist_sq(&positions, e.a as usize, e.b as usize);
                (d, e.alpha)
            })
            .collect();
        for &(_, alpha) in &by_distance {
            prop_assert!((0.0..=1.0).contains(&alpha));
        }
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in by_distance.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn rebuild_is_idempotent(positions in cloud(), min_distance in 1.0f32..80.0) {
        let mut graph = ConnectionGraph::new(positions.len() / 3, options(min_distance, true, 3));
        graph.update_geometry(&positions);
        let first = graph.edges().to_vec();
        let first_positions = graph.buffers().active_positions().to_vec();
        let first_colors = graph.buffers().active_colors().to_vec();

        graph.update_geometry(&positions);
        prop_assert_eq!(graph.edges(), first.as_slice());
        prop_assert_eq!(graph.buffers().active_positions(), first_positions.as_slice());
        prop_assert_eq!(graph.buffers().active_colors(), first_colors.as_slice());
    }

    #[test]
    fn sphere_shell_stays_near_radius(seed in any::<u64>(), radius in 1.0f32..200.0, count in 0usize..200) {
        let mut sampler = PointSampler::with_seed(seed);
        let positions = generate_sphere_shell(&mut sampler, radius, count);
        prop_assert_eq!(positions.len(), count * 3);

        // Offset is at most radius/10 per axis
        let slack = radius / 10.0 * 3f32.sqrt() + radius * 1e-4;
        for i in 0..count {
            let length = point(&positions, i).length();
            prop_assert!(length <= radius + slack);
            prop_assert!(length >= radius - slack);
        }
    }

    #[test]
    fn uniform_points_inside_box(seed in any::<u64>(), count in 0usize..100, z_offset in -100.0f32..100.0) {
        let range = Vec3::new(600.0, 300.0, 50.0);
        let mut sampler = PointSampler::with_seed(seed);
        let positions = generate_uniform(&mut sampler, count, range, z_offset);
        for i in 0..count {
            let p = point(&positions, i) - Vec3::new(0.0, 0.0, z_offset);
            prop_assert!(p.abs().cmple(range / 2.0 + 1e-3).all());
        }
    }
}

#[test]
fn test_triangle_with_unlimited_degree() {
    let mut graph = ConnectionGraph::new(3, options(10.0, false, 0));
    graph.update_geometry(&[0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0, 0.0]);

    let pairs: Vec<_> = graph.edges().iter().map(|e| (e.a, e.b)).collect();
    assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(graph.degrees(), &[2, 2, 2]);
    assert_eq!(graph.draw_range(), 0..6);
}

#[test]
fn test_far_apart_particles_have_no_lines() {
    let mut graph = ConnectionGraph::new(2, options(40.0, true, 4));
    graph.update_geometry(&[0.0, 0.0, 0.0, 100.0, 0.0, 0.0]);
    assert_eq!(graph.segment_count(), 0);
    assert!(graph.buffers().active_positions().is_empty());
}

#[test]
fn test_raising_distance_connects_more() {
    let positions = [0.0, 0.0, 0.0, 30.0, 0.0, 0.0, 60.0, 0.0, 0.0];
    let mut graph = ConnectionGraph::new(3, options(40.0, false, 0));
    graph.update_geometry(&positions);
    assert_eq!(graph.segment_count(), 2);

    graph.update_options(ConnectionUpdate::min_distance(70.0));
    graph.update_geometry(&positions);
    assert_eq!(graph.segment_count(), 3);
}

#[test]
fn test_max_connections_update_applies_on_rebuild() {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0, 0.0];
    let mut graph = ConnectionGraph::new(4, options(10.0, true, 4));
    graph.update_geometry(&positions);
    assert_eq!(graph.segment_count(), 6);

    graph.update_options(ConnectionUpdate::max_connections(1));
    assert_eq!(graph.segment_count(), 6);
    graph.update_geometry(&positions);
    // (0,1), (0,2), (0,3): each j reaches the cap after one edge
    assert_eq!(graph.segment_count(), 3);
}

#[test]
fn test_segment_vertices_match_endpoints() {
    let positions = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut graph = ConnectionGraph::new(2, options(40.0, true, 4));
    graph.update_geometry(&positions);
    assert_eq!(graph.buffers().active_positions(), &positions);
}
