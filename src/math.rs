//! Small numeric helpers shared by the field, choreographer and input code.

use glam::Vec2;

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Advance `coord` by `step`, wrapping it back to `-limit` first when it has
/// left the `[-|limit|, |limit|]` band.
///
/// This produces a sawtooth: a particle drifting past one edge reappears at
/// the opposite edge instead of bouncing.
///
/// ```
/// use plexus::math::wrap_coord;
///
/// assert_eq!(wrap_coord(0.0, 1.0, 10.0), 1.0);
/// // Past the bound: reset to -limit, then step.
/// assert_eq!(wrap_coord(10.5, 1.0, 10.0), -9.0);
/// ```
#[inline]
pub fn wrap_coord(coord: f32, step: f32, limit: f32) -> f32 {
    let base = if coord.abs() > limit.abs() { -limit } else { coord };
    base + step
}

/// Convert a window-relative pixel position to normalized device coordinates.
///
/// Origin is the window center, X grows to the right and Y grows upward.
/// A degenerate window size maps everything to the origin.
pub fn screen_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new((x / width) * 2.0 - 1.0, 1.0 - (y / height) * 2.0)
}

/// Squared Euclidean distance between particles `a` and `b` of a packed
/// `x, y, z` position buffer.
#[inline]
pub(crate) fn distance_squared(positions: &[f32], a: usize, b: usize) -> f32 {
    let dx = positions[a * 3] - positions[b * 3];
    let dy = positions[a * 3 + 1] - positions[b * 3 + 1];
    let dz = positions[a * 3 + 2] - positions[b * 3 + 2];
    dx * dx + dy * dy + dz * dz
}
