//! Proximity line graph between the particles of one field.
//!
//! Every pair of particles closer than [`ConnectionOptions::min_distance`]
//! becomes a line segment whose vertex colors fade with distance. Segments
//! are packed into pre-sized buffers; only the active draw range changes
//! from one rebuild to the next.
//!
//! # Degree limiting
//!
//! With [`ConnectionOptions::limit_connections`] enabled, the scan visits
//! pairs `(i, j)` with `i < j` in ascending order and skips a pair as soon as
//! particle `j` already holds `max_connections` edges. Particle `i` is never
//! checked, so low indices can exceed the cap:
//!
//! ```
//! use plexus::connections::{ConnectionGraph, ConnectionOptions};
//!
//! let mut graph = ConnectionGraph::new(3, ConnectionOptions {
//!     min_distance: 5.0,
//!     limit_connections: true,
//!     max_connections: 1,
//!     ..Default::default()
//! });
//! graph.update_geometry(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
//!
//! let pairs: Vec<_> = graph.edges().iter().map(|e| (e.a, e.b)).collect();
//! assert_eq!(pairs, vec![(0, 1), (0, 2)]);
//! ```

use std::ops::Range;

use glam::Vec3;

use crate::math::distance_squared;

/// Options for building a connection graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionOptions {
    /// Pairs closer than this are connected.
    pub min_distance: f32,
    /// Whether `max_connections` is enforced.
    pub limit_connections: bool,
    /// Edge cap checked against the higher-indexed particle of each pair.
    pub max_connections: u32,
    /// Line color at zero distance (RGB, 0.0-1.0).
    pub color: Vec3,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            min_distance: 40.0,
            limit_connections: true,
            max_connections: 4,
            color: Vec3::ONE,
        }
    }
}

/// Partial update for [`ConnectionOptions`]; `None` fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectionUpdate {
    pub min_distance: Option<f32>,
    pub limit_connections: Option<bool>,
    pub max_connections: Option<u32>,
    pub color: Option<Vec3>,
}

impl ConnectionUpdate {
    pub fn min_distance(value: f32) -> Self {
        Self {
            min_distance: Some(value),
            ..Default::default()
        }
    }

    pub fn max_connections(value: u32) -> Self {
        Self {
            max_connections: Some(value),
            ..Default::default()
        }
    }
}

/// One connected pair, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
    /// `1.0` when touching, approaching `0.0` at `min_distance`.
    pub alpha: f32,
}

/// Fixed-capacity vertex storage with an explicit active length.
///
/// Capacity only grows; rebuilding the graph rewrites the front of the
/// arrays and moves the cursor.
#[derive(Debug, Clone, Default)]
pub struct LineBuffers {
    positions: Vec<f32>,
    colors: Vec<f32>,
    vertex_count: usize,
}

impl LineBuffers {
    /// Allocate room for `vertices` line vertices.
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: vec![0.0; vertices * 3],
            colors: vec![0.0; vertices * 3],
            vertex_count: 0,
        }
    }

    /// Number of vertices the buffers can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len() / 3
    }

    /// Grow to hold at least `vertices` vertices. Never shrinks.
    pub fn reserve(&mut self, vertices: usize) {
        if vertices > self.capacity() {
            self.positions.resize(vertices * 3, 0.0);
            self.colors.resize(vertices * 3, 0.0);
        }
    }

    /// Vertices populated by the last rebuild.
    #[inline]
    pub fn draw_range(&self) -> Range<usize> {
        0..self.vertex_count
    }

    /// Full position storage, including the inactive tail.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Full color storage, including the inactive tail.
    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Positions inside the draw range.
    #[inline]
    pub fn active_positions(&self) -> &[f32] {
        &self.positions[..self.vertex_count * 3]
    }

    /// Colors inside the draw range.
    #[inline]
    pub fn active_colors(&self) -> &[f32] {
        &self.colors[..self.vertex_count * 3]
    }

    #[inline]
    fn write_vertex(&mut self, slot: usize, position: &[f32], color: Vec3) {
        self.positions[slot * 3..slot * 3 + 3].copy_from_slice(position);
        self.colors[slot * 3..slot * 3 + 3].copy_from_slice(&color.to_array());
    }

    fn release(&mut self) {
        self.positions = Vec::new();
        self.colors = Vec::new();
        self.vertex_count = 0;
    }
}

/// Line-segment graph linking nearby particles of a field.
#[derive(Debug, Clone)]
pub struct ConnectionGraph {
    options: ConnectionOptions,
    buffers: LineBuffers,
    degrees: Vec<u32>,
    edges: Vec<Edge>,
    opacity: f32,
    dirty: bool,
}

impl ConnectionGraph {
    /// Create an empty graph with buffers reserved for `particle_count²`
    /// vertices.
    ///
    /// Line opacity starts at zero; the choreography fades it in.
    pub fn new(particle_count: usize, options: ConnectionOptions) -> Self {
        Self {
            options,
            buffers: LineBuffers::with_capacity(particle_count * particle_count),
            degrees: Vec::with_capacity(particle_count),
            edges: Vec::new(),
            opacity: 0.0,
            dirty: false,
        }
    }

    /// Current options.
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Merge new option values. Takes effect on the next
    /// [`update_geometry`](Self::update_geometry).
    pub fn update_options(&mut self, update: ConnectionUpdate) {
        if let Some(min_distance) = update.min_distance {
            self.options.min_distance = min_distance;
        }
        if let Some(limit) = update.limit_connections {
            self.options.limit_connections = limit;
        }
        if let Some(max) = update.max_connections {
            self.options.max_connections = max;
        }
        if let Some(color) = update.color {
            self.options.color = color;
        }
    }

    /// Rebuild the graph from a packed `x, y, z` position buffer.
    ///
    /// O(n²) in the particle count. The backing arrays grow to `n²`
    /// vertices when needed and are otherwise reused.
    pub fn update_geometry(&mut self, positions: &[f32]) {
        let count = positions.len() / 3;
        self.buffers.reserve(count * count);

        self.degrees.clear();
        self.degrees.resize(count, 0);
        self.edges.clear();

        let ConnectionOptions {
            min_distance,
            limit_connections,
            max_connections,
            color,
        } = self.options;
        let min_distance_sq = min_distance * min_distance;

        let mut vertex = 0;
        for i in 0..count {
            for j in (i + 1)..count {
                if limit_connections && self.degrees[j] >= max_connections {
                    continue;
                }

                let dist_sq = distance_squared(positions, i, j);
                if dist_sq < min_distance_sq {
                    self.degrees[i] += 1;
                    self.degrees[j] += 1;

                    // Longer segments fade out
                    let alpha = 1.0 - dist_sq / min_distance_sq;
                    let tint = color * alpha;
                    self.buffers.write_vertex(vertex, &positions[i * 3..i * 3 + 3], tint);
                    self.buffers.write_vertex(vertex + 1, &positions[j * 3..j * 3 + 3], tint);
                    vertex += 2;

                    self.edges.push(Edge {
                        a: i as u32,
                        b: j as u32,
                        alpha,
                    });
                }
            }
        }

        self.buffers.vertex_count = vertex;
        self.dirty = true;
        log::trace!("connection graph rebuilt: {} particles, {} segments", count, self.edges.len());
    }

    /// Edges produced by the last rebuild, in scan order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of line segments in the draw range.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.edges.len()
    }

    /// Degree of each particle after the last rebuild.
    pub fn degrees(&self) -> &[u32] {
        &self.degrees
    }

    /// Vertex range to submit for drawing (`segment_count * 2` vertices).
    #[inline]
    pub fn draw_range(&self) -> Range<usize> {
        self.buffers.draw_range()
    }

    /// Packed render buffers.
    pub fn buffers(&self) -> &LineBuffers {
        &self.buffers
    }

    /// Line material opacity.
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the line material opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Whether buffers changed since the last [`mark_clean`](Self::mark_clean).
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Free the reserved buffers.
    pub fn release(&mut self) {
        self.buffers.release();
        self.degrees = Vec::new();
        self.edges = Vec::new();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(count: usize, min_distance: f32) -> ConnectionGraph {
        ConnectionGraph::new(
            count,
            ConnectionOptions {
                min_distance,
                limit_connections: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_two_particles_single_edge() {
        let mut g = graph(2, 20.0);
        g.update_geometry(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);

        assert_eq!(g.segment_count(), 1);
        assert_eq!(g.draw_range(), 0..2);
        let edge = g.edges()[0];
        assert_eq!((edge.a, edge.b), (0, 1));
        assert!((edge.alpha - 0.75).abs() < 1e-6);

        let buffers = g.buffers();
        assert_eq!(buffers.active_positions(), &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(buffers.active_colors(), &[0.75; 6]);
    }

    #[test]
    fn test_pair_at_threshold_not_connected() {
        let mut g = graph(2, 10.0);
        g.update_geometry(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(g.segment_count(), 0);
        assert_eq!(g.draw_range(), 0..0);
    }

    #[test]
    fn test_asymmetric_cap() {
        let mut g = ConnectionGraph::new(
            3,
            ConnectionOptions {
                min_distance: 5.0,
                limit_connections: true,
                max_connections: 1,
                ..Default::default()
            },
        );
        g.update_geometry(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);

        let pairs: Vec<_> = g.edges().iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2)]);
        // Particle 0 was never checked against the cap
        assert_eq!(g.degrees(), &[2, 1, 1]);
    }

    #[test]
    fn test_zero_cap_with_limit_yields_nothing() {
        let mut g = ConnectionGraph::new(
            3,
            ConnectionOptions {
                min_distance: 5.0,
                limit_connections: true,
                max_connections: 0,
                ..Default::default()
            },
        );
        g.update_geometry(&[0.0; 9]);
        assert_eq!(g.segment_count(), 0);
    }

    #[test]
    fn test_color_scaled_by_alpha() {
        let mut g = ConnectionGraph::new(
            2,
            ConnectionOptions {
                min_distance: 20.0,
                limit_connections: false,
                color: Vec3::new(1.0, 0.5, 0.0),
                ..Default::default()
            },
        );
        g.update_geometry(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(g.buffers().active_colors(), &[0.75, 0.375, 0.0, 0.75, 0.375, 0.0]);
    }

    #[test]
    fn test_empty_positions() {
        let mut g = graph(0, 10.0);
        g.update_geometry(&[]);
        assert_eq!(g.segment_count(), 0);
        assert_eq!(g.draw_range(), 0..0);
        assert!(g.is_dirty());
    }

    #[test]
    fn test_capacity_grows_not_shrinks() {
        let mut g = graph(2, 1.0);
        assert_eq!(g.buffers().capacity(), 4);
        g.update_geometry(&[0.0; 12]);
        assert_eq!(g.buffers().capacity(), 16);
        g.update_geometry(&[0.0; 3]);
        assert_eq!(g.buffers().capacity(), 16);
    }

    #[test]
    fn test_draw_range_shrinks_without_realloc() {
        let mut g = graph(3, 5.0);
        g.update_geometry(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(g.draw_range(), 0..6);
        g.update_geometry(&[0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 200.0, 0.0, 0.0]);
        assert_eq!(g.draw_range(), 0..0);
        assert_eq!(g.buffers().capacity(), 9);
    }

    #[test]
    fn test_update_options_deferred() {
        let mut g = graph(2, 20.0);
        let positions = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0];
        g.update_geometry(&positions);
        g.update_options(ConnectionUpdate::min_distance(5.0));
        assert_eq!(g.segment_count(), 1);
        g.update_geometry(&positions);
        assert_eq!(g.segment_count(), 0);
    }

    #[test]
    fn test_opacity_clamped() {
        let mut g = graph(1, 1.0);
        assert_eq!(g.opacity(), 0.0);
        g.set_opacity(1.5);
        assert_eq!(g.opacity(), 1.0);
    }
}
