//! Particle fields: packed point positions and their generators.
//!
//! A field owns a contiguous `x, y, z` buffer with one entry per particle.
//! The particle index is its identity for the current generation only;
//! regenerating the field keeps indices numerically valid but moves every
//! point.

use glam::Vec3;

use crate::spawn::PointSampler;

/// Fill `count` particles with independent uniform coordinates inside a box
/// of full size `range`, centered on the origin and shifted by `z_offset`
/// along Z.
pub fn generate_uniform(
    sampler: &mut PointSampler,
    count: usize,
    range: Vec3,
    z_offset: f32,
) -> Vec<f32> {
    let center = Vec3::new(0.0, 0.0, z_offset);
    let mut positions = Vec::with_capacity(count * 3);
    for _ in 0..count {
        positions.extend_from_slice(&sampler.random_in_box(range, center).to_array());
    }
    positions
}

/// Place `count` particles on a sphere shell of the given radius.
///
/// Each point is drawn with uniform solid-angle density and then nudged by a
/// random offset of up to `radius / 10` per axis so the shell does not look
/// perfectly smooth.
pub fn generate_sphere_shell(sampler: &mut PointSampler, radius: f32, count: usize) -> Vec<f32> {
    let offset = radius / 10.0;
    let mut positions = Vec::with_capacity(count * 3);
    for _ in 0..count {
        let point = sampler.random_on_sphere(radius) + sampler.random_offset(offset);
        positions.extend_from_slice(&point.to_array());
    }
    positions
}

/// Placement used when a field regenerates itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLayout {
    /// Full box size along each axis.
    pub range: Vec3,
    /// Offset of the box center along Z.
    pub z_offset: f32,
}

impl FieldLayout {
    /// Cube of side `range` centered on the origin.
    pub fn cube(range: f32) -> Self {
        Self {
            range: Vec3::splat(range),
            z_offset: 0.0,
        }
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::cube(800.0)
    }
}

/// Point sprite appearance for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    /// Base sprite size in pixels.
    pub size: f32,
    /// RGB color (0.0-1.0).
    pub color: Vec3,
    /// View depth where fog starts.
    pub fog_near: f32,
    /// View depth where fog fully hides the point.
    pub fog_far: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            size: 4.0,
            color: Vec3::ONE,
            fog_near: 300.0,
            fog_far: 600.0,
        }
    }
}

/// A population of point particles.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<f32>,
    layout: FieldLayout,
    style: PointStyle,
    sampler: PointSampler,
    dirty: bool,
}

impl ParticleField {
    /// Create a field of `count` particles placed uniformly inside `layout`.
    pub fn new(count: usize, layout: FieldLayout, style: PointStyle, mut sampler: PointSampler) -> Self {
        let positions = generate_uniform(&mut sampler, count, layout.range, layout.z_offset);
        Self {
            positions,
            layout,
            style,
            sampler,
            dirty: true,
        }
    }

    /// Number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Whether the field holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Packed `x, y, z` positions.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Mutable access to the packed positions. Marks the field dirty.
    pub fn positions_mut(&mut self) -> &mut [f32] {
        self.dirty = true;
        &mut self.positions
    }

    /// Position of particle `index`, or `None` when out of range.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    /// Overwrite the position of particle `index`. Out-of-range indices are
    /// ignored.
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if let Some(slot) = self.positions.get_mut(index * 3..index * 3 + 3) {
            slot.copy_from_slice(&position.to_array());
            self.dirty = true;
        }
    }

    /// Replace the backing buffer and flag it for re-upload.
    ///
    /// Callers pass `3 * count` floats; a trailing partial triple is dropped
    /// so the length invariant always holds.
    pub fn update_geometry(&mut self, mut positions: Vec<f32>) {
        let remainder = positions.len() % 3;
        if remainder != 0 {
            log::warn!(
                "position buffer of {} floats is not a multiple of 3, dropping {} trailing values",
                positions.len(),
                remainder
            );
            positions.truncate(positions.len() - remainder);
        }
        self.positions = positions;
        self.dirty = true;
    }

    /// Resize to `count` particles by regenerating the whole field inside
    /// its layout.
    pub fn update_count(&mut self, count: usize) {
        let positions = self.generate_uniform(count);
        self.update_geometry(positions);
    }

    /// Generate a fresh uniform buffer from this field's layout and sampler
    /// without applying it.
    pub fn generate_uniform(&mut self, count: usize) -> Vec<f32> {
        generate_uniform(&mut self.sampler, count, self.layout.range, self.layout.z_offset)
    }

    /// Generate a sphere shell from this field's sampler without applying it.
    pub fn generate_sphere_shell(&mut self, radius: f32, count: usize) -> Vec<f32> {
        generate_sphere_shell(&mut self.sampler, radius, count)
    }

    /// Placement used by [`update_count`](Self::update_count).
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Change the placement used by later regenerations.
    pub fn set_layout(&mut self, layout: FieldLayout) {
        self.layout = layout;
    }

    /// Point sprite appearance.
    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    /// Mutable point sprite appearance.
    pub fn style_mut(&mut self) -> &mut PointStyle {
        &mut self.style
    }

    /// Whether positions changed since the last [`mark_clean`](Self::mark_clean).
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge that the renderer consumed the current positions.
    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Drop the position buffer and its allocation.
    pub fn release(&mut self) {
        self.positions = Vec::new();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(count: usize) -> ParticleField {
        ParticleField::new(
            count,
            FieldLayout::cube(100.0),
            PointStyle::default(),
            PointSampler::with_seed(11),
        )
    }

    #[test]
    fn test_generate_uniform_len_and_bounds() {
        let mut sampler = PointSampler::with_seed(5);
        let positions = generate_uniform(&mut sampler, 50, Vec3::new(10.0, 20.0, 30.0), 5.0);
        assert_eq!(positions.len(), 150);
        for p in positions.chunks_exact(3) {
            assert!(p[0].abs() <= 5.0);
            assert!(p[1].abs() <= 10.0);
            assert!(p[2] >= -10.0 && p[2] <= 20.0);
        }
    }

    #[test]
    fn test_generate_zero_count() {
        let mut sampler = PointSampler::with_seed(5);
        assert!(generate_uniform(&mut sampler, 0, Vec3::ONE, 0.0).is_empty());
        assert!(generate_sphere_shell(&mut sampler, 10.0, 0).is_empty());
    }

    #[test]
    fn test_sphere_shell_perturbation_bounds() {
        let mut sampler = PointSampler::with_seed(6);
        let radius = 85.0;
        let max_offset = radius / 10.0 * 3.0_f32.sqrt();
        let positions = generate_sphere_shell(&mut sampler, radius, 400);
        assert_eq!(positions.len(), 1200);
        for p in positions.chunks_exact(3) {
            let r = Vec3::from_slice(p).length();
            assert!(r >= radius - max_offset - 1e-3 && r <= radius + max_offset + 1e-3);
        }
    }

    #[test]
    fn test_new_field_is_dirty_with_count() {
        let f = field(25);
        assert_eq!(f.count(), 25);
        assert_eq!(f.positions().len(), 75);
        assert!(f.is_dirty());
    }

    #[test]
    fn test_update_geometry_replaces_and_marks_dirty() {
        let mut f = field(4);
        f.mark_clean();
        f.update_geometry(vec![1.0, 2.0, 3.0]);
        assert_eq!(f.count(), 1);
        assert_eq!(f.position(0), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(f.is_dirty());
    }

    #[test]
    fn test_update_geometry_drops_partial_triple() {
        let mut f = field(0);
        f.update_geometry(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(f.positions().len(), 3);
    }

    #[test]
    fn test_update_count_regenerates() {
        let mut f = field(10);
        f.update_count(30);
        assert_eq!(f.count(), 30);
        f.update_count(0);
        assert!(f.is_empty());
    }

    #[test]
    fn test_set_position_out_of_range_ignored() {
        let mut f = field(2);
        f.mark_clean();
        f.set_position(5, Vec3::ONE);
        assert!(!f.is_dirty());
        f.set_position(1, Vec3::ONE);
        assert_eq!(f.position(1), Some(Vec3::ONE));
        assert!(f.is_dirty());
    }
}
