//! # Plexus - animated particle network backdrop
//!
//! Three particle fields and the lines joining nearby particles, driven by a
//! short scripted sequence:
//!
//! 1. **Entrance**: the sphere field starts scattered and spins in.
//! 2. **Converging**: every sphere particle eases onto a point of a sphere
//!    shell.
//! 3. **Steady**: the sphere's connection lines fade in, the falling field
//!    grows its own lines, and pointer movement tilts the sphere.
//!
//! The crate splits into a renderer-independent core and a wgpu/winit
//! frontend:
//!
//! | Layer | Modules |
//! |-------|---------|
//! | Geometry | [`field`], [`connections`], [`spawn`], [`math`] |
//! | Animation | [`tween`], [`time`], [`choreographer`] |
//! | Rendering seam | [`driver`], [`camera`] |
//! | Frontend | [`gpu`], [`input`], [`window`], [`config`] |
//!
//! ## Quick Start
//!
//! ```ignore
//! fn main() -> Result<(), plexus::error::RunError> {
//!     env_logger::init();
//!     plexus::window::run(plexus::SceneOptions::default(), None)
//! }
//! ```
//!
//! ## Headless
//!
//! [`HeadlessDriver`] records what a renderer would draw, which is enough to
//! step the whole sequence deterministically:
//!
//! ```
//! use plexus::prelude::*;
//!
//! let options = SceneOptions::default();
//! let camera = Camera::new(16.0 / 9.0);
//! let mut scene = Choreographer::with_sampler(&options, &camera, PointSampler::with_seed(1));
//! let mut driver = HeadlessDriver::new();
//! let mut clock = FrameClock::fixed(1.0 / 60.0);
//!
//! scene.init(&mut driver, clock.now());
//! while clock.now() < 6.0 {
//!     let now = clock.tick();
//!     driver.frame(&mut scene, now);
//! }
//! assert_eq!(scene.phase(), Phase::Steady);
//! assert!(scene.interaction_enabled());
//! ```

pub mod camera;
pub mod choreographer;
pub mod config;
pub mod connections;
pub mod driver;
pub mod error;
pub mod field;
pub mod gpu;
pub mod input;
pub mod math;
pub mod spawn;
pub mod time;
pub mod tween;
pub mod window;

pub use camera::Camera;
pub use choreographer::{Choreographer, Phase};
pub use config::{SceneOptions, TimingOptions};
pub use connections::{ConnectionGraph, ConnectionOptions, ConnectionUpdate};
pub use driver::{DrawItem, FrameDriver, HeadlessDriver, ObjectId, Primitive};
pub use field::{FieldLayout, ParticleField, PointStyle};
pub use glam::{Vec2, Vec3};
pub use spawn::PointSampler;
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// ```
/// use plexus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::choreographer::{Choreographer, Phase};
    pub use crate::config::{SceneOptions, TimingOptions};
    pub use crate::connections::{ConnectionGraph, ConnectionOptions, ConnectionUpdate};
    pub use crate::driver::{DrawItem, FrameDriver, HeadlessDriver, ObjectId, Primitive};
    pub use crate::field::{FieldLayout, ParticleField, PointStyle};
    pub use crate::spawn::PointSampler;
    pub use crate::time::FrameClock;
    pub use crate::tween::{Easing, Tween, TweenEvent, TweenGroup};
    pub use crate::{Vec2, Vec3};
}
