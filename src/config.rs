//! Tunable scene options.
//!
//! [`SceneOptions`] is the single configuration surface for the particle
//! scene. It serializes to JSON so a tuned setup can be saved and replayed,
//! and [`SceneOptions::clamped`] keeps every interactive value inside the
//! range the tuning panel exposes.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timing and motion constants of the choreographed sequence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingOptions {
    /// Rotation about Y applied during the entrance (radians).
    pub entrance_angle: f32,
    /// Entrance duration in seconds.
    pub entrance_duration: f32,
    /// Per-particle convergence duration in seconds.
    pub converge_duration: f32,
    /// Sphere line fade-in duration in seconds.
    pub sphere_fade_duration: f32,
    /// Falling line fade-in duration in seconds.
    pub fall_fade_duration: f32,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            entrance_angle: 1.5,
            entrance_duration: 2.0,
            converge_duration: 1.5,
            sphere_fade_duration: 1.0,
            fall_fade_duration: 3.0,
        }
    }
}

/// Complete scene configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    /// Radius of the sphere shell.
    pub sphere_radius: f32,
    /// Number of particles in the sphere.
    pub sphere_count: u32,
    /// Connection distance between sphere particles.
    pub sphere_line_distance: f32,
    /// Per-particle connection cap for the sphere graph.
    pub sphere_connections: u32,
    /// Number of falling particles.
    pub fall_count: u32,
    /// Box the falling particles occupy (overwritten from the viewport at
    /// start-up for X and Y).
    pub fall_range: Vec3,
    /// Horizontal drift per frame before convergence completes.
    pub fall_x_step: f32,
    /// Downward drift per frame afterwards.
    pub fall_y_step: f32,
    /// Number of scattered background particles.
    pub loss_count: u32,
    /// Spin of the scattered group per frame before convergence completes.
    pub loss_speed: f32,
    /// Vertical drift of the scattered particles per frame afterwards.
    pub loss_y_step: f32,
    /// Sequence timings.
    pub timing: TimingOptions,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            sphere_radius: 85.0,
            sphere_count: 450,
            sphere_line_distance: 40.0,
            sphere_connections: 4,
            fall_count: 70,
            fall_range: Vec3::new(600.0, 300.0, 50.0),
            fall_x_step: 0.8,
            fall_y_step: 0.4,
            loss_count: 300,
            loss_speed: 0.005,
            loss_y_step: -0.1,
            timing: TimingOptions::default(),
        }
    }
}

fn clamp_f32(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != value {
        log::warn!("{} = {} out of range [{}, {}], using {}", name, value, min, max, clamped);
    }
    clamped
}

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{} = {} out of range [{}, {}], using {}", name, value, min, max, clamped);
    }
    clamped
}

impl SceneOptions {
    /// Return a copy with every tunable clamped to its supported range.
    pub fn clamped(&self) -> Self {
        Self {
            sphere_radius: clamp_f32("sphere_radius", self.sphere_radius, 1.0, 400.0),
            sphere_count: clamp_u32("sphere_count", self.sphere_count, 10, 1000),
            sphere_line_distance: clamp_f32("sphere_line_distance", self.sphere_line_distance, 1.0, 200.0),
            sphere_connections: clamp_u32("sphere_connections", self.sphere_connections, 0, 10),
            fall_count: clamp_u32("fall_count", self.fall_count, 0, 500),
            fall_y_step: clamp_f32("fall_y_step", self.fall_y_step, 0.0, 10.0),
            loss_count: clamp_u32("loss_count", self.loss_count, 0, 500),
            ..self.clone()
        }
    }

    /// Save the options as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let options: SceneOptions = serde_json::from_str(&json)?;
        Ok(options.clamped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_in_range() {
        let options = SceneOptions::default();
        assert_eq!(options.clamped(), options);
    }

    #[test]
    fn test_clamped() {
        let options = SceneOptions {
            sphere_radius: 0.0,
            sphere_count: 5000,
            sphere_line_distance: f32::NAN,
            sphere_connections: 99,
            fall_y_step: -1.0,
            ..Default::default()
        }
        .clamped();

        assert_eq!(options.sphere_radius, 1.0);
        assert_eq!(options.sphere_count, 1000);
        assert_eq!(options.sphere_line_distance, 1.0);
        assert_eq!(options.sphere_connections, 10);
        assert_eq!(options.fall_y_step, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: SceneOptions = serde_json::from_str(r#"{ "sphere_count": 120 }"#).unwrap();
        assert_eq!(options.sphere_count, 120);
        assert_eq!(options.sphere_radius, 85.0);
        assert_eq!(options.timing, TimingOptions::default());
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("plexus-options-{}.json", std::process::id()));
        let options = SceneOptions {
            fall_count: 12,
            ..Default::default()
        };
        options.save(&path).unwrap();
        let loaded = SceneOptions::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneOptions::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
