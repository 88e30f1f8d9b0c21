//! The choreographed particle scene.
//!
//! Three particle groups share one timeline:
//!
//! - the **sphere**: a field that starts scattered in a box, spins in, then
//!   converges onto a perturbed sphere shell and grows a connection graph;
//! - the **fall** field: a sheet of particles in front of the sphere with
//!   its own graph, drifting sideways and later downwards;
//! - the **loss** field: scattered background points without lines.
//!
//! The sequence runs through [`Phase::Entrance`], [`Phase::Converging`],
//! [`Phase::FadingIn`] and finally [`Phase::Steady`], which loops until the
//! scene is disposed. Every tick advances tweens first, then the per-frame
//! drift, then rebuilds the fall graph from the moved positions.

use std::mem;

use glam::{EulerRot, Mat4, Vec2, Vec3};

use crate::camera::Camera;
use crate::config::SceneOptions;
use crate::connections::{ConnectionGraph, ConnectionOptions, ConnectionUpdate};
use crate::driver::{DrawItem, FrameDriver, ObjectId, Primitive};
use crate::field::{FieldLayout, ParticleField, PointStyle};
use crate::math::{deg_to_rad, wrap_coord};
use crate::spawn::PointSampler;
use crate::tween::{Easing, Tween, TweenEvent, TweenGroup};

pub const SPHERE_POINTS: ObjectId = ObjectId(0);
pub const SPHERE_LINES: ObjectId = ObjectId(1);
pub const FALL_POINTS: ObjectId = ObjectId(2);
pub const FALL_LINES: ObjectId = ObjectId(3);
pub const LOSS_POINTS: ObjectId = ObjectId(4);

/// Every object the scene attaches to its driver.
pub const SCENE_OBJECTS: [ObjectId; 5] = [SPHERE_POINTS, SPHERE_LINES, FALL_POINTS, FALL_LINES, LOSS_POINTS];

/// Initial scatter box of the sphere particles.
const SPHERE_SCATTER_RANGE: f32 = 800.0;
/// Z offset of the fall sheet, in front of the sphere.
const FALL_Z_OFFSET: f32 = 100.0;
const LOSS_RANGE: f32 = 500.0;
/// Pointer rotation in degrees at the edge of the viewport.
const POINTER_ROTATION_DEG: f32 = 20.0;

/// Stage of the choreography. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The sphere group spins in about Y.
    Entrance,
    /// Each sphere particle travels to its shell position.
    Converging,
    /// Line opacities were scheduled this tick.
    FadingIn,
    /// Terminal loop.
    Steady,
}

/// What a scheduled tween drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenTarget {
    SphereRotationY,
    /// Position of one sphere particle.
    Particle(u32),
    SphereLineOpacity,
    FallLineOpacity,
}

/// Drives the sphere, fall and loss groups through the sequence.
#[derive(Debug)]
pub struct Choreographer {
    options: SceneOptions,
    camera: Camera,
    sampler: PointSampler,
    phase: Phase,
    fall_range: Vec3,

    sphere: ParticleField,
    sphere_graph: ConnectionGraph,
    /// Shell positions the sphere converges onto.
    sphere_target: Vec<f32>,
    sphere_rotation: Vec3,
    /// Rotation committed after the entrance and updated by the pointer.
    rotate_vec: Vec3,

    fall: ParticleField,
    fall_graph: ConnectionGraph,

    loss: ParticleField,
    loss_rotation: Vec3,

    tweens: TweenGroup<TweenTarget>,
    events: Vec<TweenEvent<TweenTarget>>,
    /// Converge tweens still running.
    converge_remaining: usize,
    converged: bool,
    interaction_enabled: bool,
    running: bool,
    now: f32,
}

impl Choreographer {
    /// Build the scene with a wall-clock seeded sampler.
    pub fn new(options: &SceneOptions, camera: &Camera) -> Self {
        Self::with_sampler(options, camera, PointSampler::new())
    }

    /// Build the scene drawing all randomness from `sampler`.
    ///
    /// The fall range X and Y are replaced by the visible viewport size at
    /// the camera distance.
    pub fn with_sampler(options: &SceneOptions, camera: &Camera, mut sampler: PointSampler) -> Self {
        let options = options.clamped();
        let (view_width, view_height) = camera.view_size();
        let fall_range = Vec3::new(view_width, view_height, options.fall_range.z);

        let radius = options.sphere_radius;
        let sphere_count = options.sphere_count as usize;
        let mut sphere = ParticleField::new(
            sphere_count,
            FieldLayout::cube(SPHERE_SCATTER_RANGE),
            PointStyle {
                size: 4.0,
                fog_near: camera.distance - radius,
                fog_far: camera.distance + radius / 2.0,
                ..Default::default()
            },
            sampler.fork(),
        );
        let sphere_target = sphere.generate_sphere_shell(radius, sphere_count);
        let sphere_graph = ConnectionGraph::new(
            sphere_count,
            ConnectionOptions {
                min_distance: options.sphere_line_distance,
                limit_connections: true,
                max_connections: options.sphere_connections,
                ..Default::default()
            },
        );

        let background_style = PointStyle {
            size: 2.0,
            fog_near: 1.0,
            fog_far: 1000.0,
            ..Default::default()
        };
        let fall_count = options.fall_count as usize;
        let fall = ParticleField::new(
            fall_count,
            FieldLayout {
                range: fall_range,
                z_offset: FALL_Z_OFFSET,
            },
            background_style,
            sampler.fork(),
        );
        let fall_graph = ConnectionGraph::new(fall_count, ConnectionOptions::default());

        let loss = ParticleField::new(
            options.loss_count as usize,
            FieldLayout::cube(LOSS_RANGE),
            background_style,
            sampler.fork(),
        );

        Self {
            options,
            camera: *camera,
            sampler,
            phase: Phase::Entrance,
            fall_range,
            sphere,
            sphere_graph,
            sphere_target,
            sphere_rotation: Vec3::ZERO,
            rotate_vec: Vec3::ZERO,
            fall,
            fall_graph,
            loss,
            loss_rotation: Vec3::ZERO,
            tweens: TweenGroup::new(),
            events: Vec::new(),
            converge_remaining: 0,
            converged: false,
            interaction_enabled: false,
            running: false,
            now: 0.0,
        }
    }

    /// Attach the scene to `driver`, subscribe to frame ticks and start the
    /// entrance at time `now`.
    pub fn init(&mut self, driver: &mut dyn FrameDriver, now: f32) {
        driver.add(&SCENE_OBJECTS);
        driver.animate();
        self.running = true;
        self.now = now;

        let timing = self.options.timing;
        let y = self.sphere_rotation.y;
        self.tweens.add(
            Tween::scalar(
                TweenTarget::SphereRotationY,
                y,
                y + timing.entrance_angle,
                timing.entrance_duration,
            )
            .easing(Easing::SinusoidalOut),
            now,
        );
        log::info!(
            "scene started: {} sphere, {} fall, {} loss particles",
            self.sphere.count(),
            self.fall.count(),
            self.loss.count()
        );
    }

    /// Advance one frame to time `now` (seconds).
    ///
    /// Order within a tick: tweens, steady drift, fall graph rebuild.
    pub fn update(&mut self, now: f32) {
        if !self.running {
            return;
        }
        self.now = now;

        if self.phase == Phase::FadingIn {
            self.set_phase(Phase::Steady);
        }

        let mut events = mem::take(&mut self.events);
        self.tweens.update(now, &mut events);
        for event in events.drain(..) {
            self.handle_event(event);
        }
        self.events = events;

        self.advance_drift();
        self.fall_graph.update_geometry(self.fall.positions());

        log::trace!(
            "tick {:.3}s: {:?}, {} tweens, {} fall segments",
            now,
            self.phase,
            self.tweens.len(),
            self.fall_graph.segment_count()
        );
    }

    fn set_phase(&mut self, phase: Phase) {
        log::info!("phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn handle_event(&mut self, event: TweenEvent<TweenTarget>) {
        match event {
            TweenEvent::Update { target, value, .. } => match target {
                TweenTarget::SphereRotationY => {
                    if let Some(y) = value.as_scalar() {
                        self.sphere_rotation.y = y;
                    }
                }
                TweenTarget::Particle(index) => {
                    if let Some(position) = value.as_vector() {
                        self.sphere.set_position(index as usize, position);
                    }
                }
                TweenTarget::SphereLineOpacity => {
                    if let Some(opacity) = value.as_scalar() {
                        self.sphere_graph.set_opacity(opacity);
                    }
                }
                TweenTarget::FallLineOpacity => {
                    if let Some(opacity) = value.as_scalar() {
                        self.fall_graph.set_opacity(opacity);
                    }
                }
            },
            TweenEvent::Complete { target, .. } => match target {
                TweenTarget::SphereRotationY => {
                    self.rotate_vec = Vec3::new(0.0, self.options.timing.entrance_angle, 0.0);
                    self.start_convergence();
                }
                TweenTarget::Particle(_) => {
                    self.converge_remaining = self.converge_remaining.saturating_sub(1);
                    if self.converge_remaining == 0 {
                        self.finish_convergence();
                    }
                }
                TweenTarget::SphereLineOpacity => {
                    self.interaction_enabled = true;
                    log::info!("pointer interaction enabled");
                }
                TweenTarget::FallLineOpacity => {
                    log::debug!("fall lines faded in");
                }
            },
        }
    }

    /// Schedule one tween per sphere particle toward its shell position.
    fn start_convergence(&mut self) {
        self.set_phase(Phase::Converging);

        let count = self.sphere.count();
        let duration = self.options.timing.converge_duration;
        self.converge_remaining = count;
        if count == 0 {
            self.finish_convergence();
            return;
        }

        for index in 0..count {
            let from = self.sphere.position(index).unwrap_or(Vec3::ZERO);
            let to = self.target_position(index);
            self.tweens.add(
                Tween::vector(TweenTarget::Particle(index as u32), from, to, duration)
                    .easing(Easing::SinusoidalInOut),
                self.now,
            );
        }
    }

    /// Shell position particle `index` converges to. Indices wrap around a
    /// shorter target; an empty target collapses onto the origin.
    fn target_position(&self, index: usize) -> Vec3 {
        let target_count = self.sphere_target.len() / 3;
        if target_count == 0 {
            return Vec3::ZERO;
        }
        let i = index % target_count;
        Vec3::from_slice(&self.sphere_target[i * 3..i * 3 + 3])
    }

    fn finish_convergence(&mut self) {
        self.converged = true;
        self.sphere.update_geometry(self.sphere_target.clone());
        self.sphere_graph.update_geometry(&self.sphere_target);
        log::debug!("sphere graph built: {} segments", self.sphere_graph.segment_count());

        let timing = self.options.timing;
        self.tweens.add(
            Tween::scalar(
                TweenTarget::SphereLineOpacity,
                self.sphere_graph.opacity(),
                1.0,
                timing.sphere_fade_duration,
            ),
            self.now,
        );
        self.tweens.add(
            Tween::scalar(
                TweenTarget::FallLineOpacity,
                self.fall_graph.opacity(),
                1.0,
                timing.fall_fade_duration,
            ),
            self.now,
        );
        self.set_phase(Phase::FadingIn);
    }

    /// Per-frame drift of the fall and loss groups.
    fn advance_drift(&mut self) {
        let range = self.fall_range;
        if self.converged {
            let step = -self.options.fall_y_step;
            for y in self.fall.positions_mut().iter_mut().skip(1).step_by(3) {
                *y = wrap_coord(*y, step, -range.y / 2.0);
            }
            let step = self.options.loss_y_step;
            for y in self.loss.positions_mut().iter_mut().skip(1).step_by(3) {
                *y = wrap_coord(*y, step, -range.y);
            }
        } else {
            let step = self.options.fall_x_step;
            for x in self.fall.positions_mut().iter_mut().step_by(3) {
                *x = wrap_coord(*x, step, range.x / 2.0);
            }
            self.loss_rotation.y += self.options.loss_speed;
        }
    }

    /// Rotate the sphere toward the pointer. `ndc` is in `[-1, 1]²` with +Y
    /// up. Returns whether the pointer was applied; it is ignored until the
    /// sphere lines have faded in.
    pub fn handle_pointer(&mut self, ndc: Vec2) -> bool {
        if !self.interaction_enabled {
            return false;
        }
        self.rotate_vec = Vec3::new(
            deg_to_rad(-ndc.y * POINTER_ROTATION_DEG),
            deg_to_rad(ndc.x * POINTER_ROTATION_DEG),
            0.0,
        );
        self.sphere_rotation = self.rotate_vec;
        true
    }

    /// Apply changed tuning options.
    ///
    /// Compares against the last applied options and only regenerates what
    /// changed. A sphere shape change is applied to the field and its graph
    /// at once, in any phase. Ignored while the scene is not running.
    pub fn apply_options(&mut self, options: &SceneOptions) {
        if !self.running {
            log::debug!("options ignored: scene not running");
            return;
        }
        let options = options.clamped();
        if options == self.options {
            return;
        }
        let previous = mem::replace(&mut self.options, options);
        let options = &self.options;

        let graph_changed = previous.sphere_line_distance != options.sphere_line_distance
            || previous.sphere_connections != options.sphere_connections;
        let sphere_changed =
            previous.sphere_radius != options.sphere_radius || previous.sphere_count != options.sphere_count;
        let loss_changed = previous.loss_count != options.loss_count;
        let fall_changed = previous.fall_count != options.fall_count;

        if graph_changed {
            self.sphere_graph.update_options(ConnectionUpdate {
                min_distance: Some(options.sphere_line_distance),
                max_connections: Some(options.sphere_connections),
                ..Default::default()
            });
        }

        if sphere_changed {
            self.regenerate_sphere();
        } else if graph_changed {
            self.sphere_graph.update_geometry(&self.sphere_target);
        }

        if loss_changed {
            self.loss.update_count(self.options.loss_count as usize);
        }

        if fall_changed {
            self.fall.update_count(self.options.fall_count as usize);
            self.fall_graph.update_geometry(self.fall.positions());
        }

        log::debug!(
            "options applied (graph: {}, sphere: {}, loss: {}, fall: {})",
            graph_changed,
            sphere_changed,
            loss_changed,
            fall_changed
        );
    }

    fn regenerate_sphere(&mut self) {
        let radius = self.options.sphere_radius;
        let count = self.options.sphere_count as usize;
        self.sphere_target = self.sphere.generate_sphere_shell(radius, count);
        self.sphere.update_geometry(self.sphere_target.clone());
        self.sphere_graph.update_geometry(&self.sphere_target);
    }

    /// Tear the scene down.
    ///
    /// Pending tweens are dropped without reporting, objects are detached
    /// from the driver, ticks stop and every buffer is released. Further
    /// [`update`](Self::update) calls are no-ops.
    pub fn dispose(&mut self, driver: &mut dyn FrameDriver) {
        self.tweens.remove_all();
        self.events.clear();
        driver.cleanup(&SCENE_OBJECTS);
        driver.cancel_animate();

        self.sphere.release();
        self.sphere_graph.release();
        self.sphere_target = Vec::new();
        self.fall.release();
        self.fall_graph.release();
        self.loss.release();

        self.running = false;
        self.interaction_enabled = false;
        log::info!("scene disposed");
    }

    /// Dispose and replay the whole sequence with freshly generated fields.
    pub fn reset(&mut self, driver: &mut dyn FrameDriver, now: f32) {
        self.dispose(driver);
        let options = self.options.clone();
        let camera = self.camera;
        let sampler = self.sampler.fork();
        *self = Self::with_sampler(&options, &camera, sampler);
        self.init(driver, now);
    }

    /// Draw list for the current frame, borrowing the live buffers.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let sphere_transform = euler_matrix(self.sphere_rotation);

        vec![
            DrawItem {
                id: SPHERE_POINTS,
                transform: sphere_transform,
                primitive: Primitive::Points {
                    positions: self.sphere.positions(),
                    style: *self.sphere.style(),
                },
                dirty: self.sphere.is_dirty(),
            },
            DrawItem {
                id: SPHERE_LINES,
                transform: sphere_transform,
                primitive: line_primitive(&self.sphere_graph),
                dirty: self.sphere_graph.is_dirty(),
            },
            DrawItem {
                id: FALL_POINTS,
                transform: Mat4::IDENTITY,
                primitive: Primitive::Points {
                    positions: self.fall.positions(),
                    style: *self.fall.style(),
                },
                dirty: self.fall.is_dirty(),
            },
            DrawItem {
                id: FALL_LINES,
                transform: Mat4::IDENTITY,
                primitive: line_primitive(&self.fall_graph),
                dirty: self.fall_graph.is_dirty(),
            },
            DrawItem {
                id: LOSS_POINTS,
                transform: euler_matrix(self.loss_rotation),
                primitive: Primitive::Points {
                    positions: self.loss.positions(),
                    style: *self.loss.style(),
                },
                dirty: self.loss.is_dirty(),
            },
        ]
    }

    /// Acknowledge that the driver uploaded everything from
    /// [`draw_items`](Self::draw_items).
    pub fn mark_rendered(&mut self) {
        self.sphere.mark_clean();
        self.sphere_graph.mark_clean();
        self.fall.mark_clean();
        self.fall_graph.mark_clean();
        self.loss.mark_clean();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last applied options.
    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    /// Fall box after the viewport override.
    pub fn fall_range(&self) -> Vec3 {
        self.fall_range
    }

    pub fn sphere(&self) -> &ParticleField {
        &self.sphere
    }

    pub fn sphere_graph(&self) -> &ConnectionGraph {
        &self.sphere_graph
    }

    /// Shell positions the sphere converges onto.
    pub fn sphere_target(&self) -> &[f32] {
        &self.sphere_target
    }

    pub fn fall(&self) -> &ParticleField {
        &self.fall
    }

    pub fn fall_graph(&self) -> &ConnectionGraph {
        &self.fall_graph
    }

    pub fn loss(&self) -> &ParticleField {
        &self.loss
    }

    /// Euler rotation (XYZ) of the sphere group.
    pub fn sphere_rotation(&self) -> Vec3 {
        self.sphere_rotation
    }

    /// Persistent rotation vector used by pointer interaction.
    pub fn rotate_vec(&self) -> Vec3 {
        self.rotate_vec
    }

    pub fn loss_rotation(&self) -> Vec3 {
        self.loss_rotation
    }

    /// Whether the pointer rotates the sphere.
    pub fn interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    /// Whether convergence has completed.
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Whether the scene is initialized and not disposed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Live tween count.
    pub fn pending_tweens(&self) -> usize {
        self.tweens.len()
    }
}

fn euler_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

fn line_primitive(graph: &ConnectionGraph) -> Primitive<'_> {
    let buffers = graph.buffers();
    Primitive::Lines {
        positions: buffers.positions(),
        colors: buffers.colors(),
        range: graph.draw_range(),
        opacity: graph.opacity(),
    }
}
