//! Seeded random sampling for particle placement.
//!
//! [`PointSampler`] wraps a small fast RNG and exposes the handful of
//! distributions the particle fields need.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random point generator used when (re)generating particle fields.
///
/// ```
/// use plexus::spawn::PointSampler;
///
/// let mut sampler = PointSampler::with_seed(7);
/// let p = sampler.random_on_sphere(2.0);
/// assert!((p.length() - 2.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct PointSampler {
    rng: SmallRng,
}

impl PointSampler {
    /// Create a sampler seeded from the wall clock, so every run differs.
    pub fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(seed)
    }

    /// Create a sampler with a fixed seed for reproducible layouts.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derive an independent sampler seeded from this one.
    pub fn fork(&mut self) -> PointSampler {
        Self::with_seed(self.rng.gen())
    }

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random point in an axis-aligned box of the given full extents,
    /// centered on `center`.
    pub fn random_in_box(&mut self, extents: Vec3, center: Vec3) -> Vec3 {
        Vec3::new(
            self.random() * extents.x - extents.x / 2.0,
            self.random() * extents.y - extents.y / 2.0,
            self.random() * extents.z - extents.z / 2.0,
        ) + center
    }

    /// Random point on a sphere surface with uniform solid-angle density.
    ///
    /// Uses `phi = acos(2v - 1)` rather than a uniform polar angle, which
    /// would cluster points around the poles.
    pub fn random_on_sphere(&mut self, radius: f32) -> Vec3 {
        let u = self.random();
        let v = self.random();
        let theta = u * TAU;
        let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }

    /// Random offset with each component in `[-scale, scale)`.
    pub fn random_offset(&mut self, scale: f32) -> Vec3 {
        Vec3::new(
            -1.0 + self.random() * 2.0,
            -1.0 + self.random() * 2.0,
            -1.0 + self.random() * 2.0,
        ) * scale
    }
}

impl Default for PointSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_in_box_bounds() {
        let mut sampler = PointSampler::with_seed(1);
        let extents = Vec3::new(600.0, 300.0, 50.0);
        let center = Vec3::new(0.0, 0.0, 100.0);
        for _ in 0..500 {
            let p = sampler.random_in_box(extents, center);
            assert!(p.x >= -300.0 && p.x < 300.0);
            assert!(p.y >= -150.0 && p.y < 150.0);
            assert!(p.z >= 75.0 && p.z < 125.0);
        }
    }

    #[test]
    fn test_random_on_sphere_radius() {
        let mut sampler = PointSampler::with_seed(2);
        for _ in 0..500 {
            let p = sampler.random_on_sphere(85.0);
            assert!((p.length() - 85.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_random_on_sphere_hemispheres_balanced() {
        // Uniform solid angle: roughly half the points above the equator.
        let mut sampler = PointSampler::with_seed(3);
        let upper = (0..4000)
            .filter(|_| sampler.random_on_sphere(1.0).z > 0.0)
            .count();
        assert!((1800..2200).contains(&upper), "upper = {}", upper);
    }

    #[test]
    fn test_random_offset_bounds() {
        let mut sampler = PointSampler::with_seed(4);
        for _ in 0..500 {
            let o = sampler.random_offset(8.5);
            assert!(o.abs().max_element() <= 8.5);
        }
    }

    #[test]
    fn test_fork_is_reproducible() {
        let mut a = PointSampler::with_seed(8);
        let mut b = PointSampler::with_seed(8);
        assert_eq!(a.fork().random(), b.fork().random());
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = PointSampler::with_seed(99);
        let mut b = PointSampler::with_seed(99);
        assert_eq!(a.random_on_sphere(1.0), b.random_on_sphere(1.0));
    }
}
