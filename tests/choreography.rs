//! End-to-end runs of the scene through the headless driver.
//!
//! The clock steps by a quarter second so every phase boundary lands on an
//! exact frame: rotation ends at 2.0s, convergence at 3.5s, the sphere fade
//! at 4.5s and the fall fade at 6.5s.

use plexus::choreographer::{Choreographer, Phase, FALL_LINES, SCENE_OBJECTS, SPHERE_LINES};
use plexus::driver::{FrameDriver, HeadlessDriver};
use plexus::math::wrap_coord;
use plexus::prelude::*;

const STEP: f32 = 0.25;

fn options() -> SceneOptions {
    SceneOptions {
        sphere_count: 60,
        fall_count: 30,
        loss_count: 40,
        ..Default::default()
    }
}

struct Run {
    scene: Choreographer,
    driver: HeadlessDriver,
    clock: FrameClock,
}

impl Run {
    fn start(seed: u64) -> Self {
        let mut scene = Choreographer::with_sampler(&options(), &Camera::new(16.0 / 9.0), PointSampler::with_seed(seed));
        let mut driver = HeadlessDriver::new();
        let clock = FrameClock::fixed(STEP);
        scene.init(&mut driver, clock.now());
        Self { scene, driver, clock }
    }

    fn frame(&mut self) {
        let now = self.clock.tick();
        self.driver.frame(&mut self.scene, now);
    }

    /// Frame until the clock reaches `t`; returns the phase seen after each
    /// frame.
    fn run_until(&mut self, t: f32) -> Vec<Phase> {
        let mut phases = Vec::new();
        while self.clock.now() < t {
            self.frame();
            phases.push(self.scene.phase());
        }
        phases
    }

    fn drawn_opacity(&self, id: ObjectId) -> Option<f32> {
        self.driver
            .last_frame()
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.opacity)
    }
}

#[test]
fn test_phases_advance_in_order() {
    let mut run = Run::start(11);
    let mut phases = run.run_until(8.0);
    phases.dedup();
    assert_eq!(
        phases,
        vec![Phase::Entrance, Phase::Converging, Phase::FadingIn, Phase::Steady]
    );
}

#[test]
fn test_phase_boundaries() {
    let mut run = Run::start(11);

    run.run_until(1.75);
    assert_eq!(run.scene.phase(), Phase::Entrance);

    run.frame();
    assert_eq!(run.clock.now(), 2.0);
    assert_eq!(run.scene.phase(), Phase::Converging);
    assert_eq!(run.scene.rotate_vec(), Vec3::new(0.0, 1.5, 0.0));

    run.run_until(3.25);
    assert_eq!(run.scene.phase(), Phase::Converging);
    assert!(!run.scene.is_converged());

    run.frame();
    assert_eq!(run.scene.phase(), Phase::FadingIn);
    assert!(run.scene.is_converged());

    // FadingIn lasts one tick
    run.frame();
    assert_eq!(run.scene.phase(), Phase::Steady);
}

#[test]
fn test_steady_is_terminal() {
    let mut run = Run::start(5);
    let phases = run.run_until(30.0);
    let first_steady = phases
        .iter()
        .position(|phase| *phase == Phase::Steady)
        .expect("scene never reached steady");
    assert!(phases[first_steady..].iter().all(|phase| *phase == Phase::Steady));
    assert_eq!(run.scene.pending_tweens(), 0);
}

#[test]
fn test_sphere_lands_on_shell() {
    let mut run = Run::start(7);
    run.run_until(3.5);
    assert_eq!(run.scene.sphere().positions(), run.scene.sphere_target());
    assert!(run.scene.sphere_graph().segment_count() > 0);
}

#[test]
fn test_line_fades_reach_driver() {
    let mut run = Run::start(3);

    run.run_until(3.5);
    // Drawn before the tick that scheduled the fades
    assert_eq!(run.drawn_opacity(SPHERE_LINES), Some(0.0));

    run.run_until(4.25);
    let sphere = run.scene.sphere_graph().opacity();
    assert!(sphere > 0.0 && sphere < 1.0, "sphere opacity {}", sphere);
    assert!(!run.scene.interaction_enabled());

    run.run_until(4.5);
    assert_eq!(run.scene.sphere_graph().opacity(), 1.0);
    assert!(run.scene.interaction_enabled());
    assert!(run.scene.fall_graph().opacity() < 1.0);

    run.run_until(6.5);
    assert_eq!(run.scene.fall_graph().opacity(), 1.0);
    run.frame();
    assert_eq!(run.drawn_opacity(FALL_LINES), Some(1.0));
}

#[test]
fn test_pointer_ignored_until_lines_visible() {
    let mut run = Run::start(9);
    run.run_until(4.25);
    assert!(!run.scene.handle_pointer(Vec2::new(0.5, 0.5)));
    assert_eq!(run.scene.rotate_vec(), Vec3::new(0.0, 1.5, 0.0));

    run.run_until(4.5);
    assert!(run.scene.handle_pointer(Vec2::ZERO));
    assert_eq!(run.scene.sphere_rotation(), Vec3::ZERO);
}

#[test]
fn test_fall_graph_rebuilt_every_tick() {
    let mut run = Run::start(13);
    run.frame();
    let segments = run.scene.fall_graph().segment_count();

    // Entrance frames: fall points drift and their graph is rebuilt
    run.frame();
    let fall_lines = run
        .driver
        .last_frame()
        .iter()
        .find(|item| item.id == FALL_LINES)
        .copied()
        .expect("fall lines not drawn");
    assert!(fall_lines.uploaded);
    assert_eq!(fall_lines.vertex_count, segments * 2);
}

fn assert_fall_graph_current(scene: &Choreographer) {
    let mut fresh = ConnectionGraph::new(scene.fall().count(), ConnectionOptions::default());
    fresh.update_geometry(scene.fall().positions());
    assert_eq!(scene.fall_graph().edges(), fresh.edges());
}

#[test]
fn test_tick_runs_tweens_then_drift_then_graph() {
    let mut run = Run::start(31);
    run.run_until(3.25);
    assert!(!run.scene.is_converged());
    assert_fall_graph_current(&run.scene);

    let before = run.scene.fall().positions().to_vec();
    let half_height = run.scene.fall_range().y / 2.0;
    let y_step = run.scene.options().fall_y_step;

    // This tick's tween pass completes convergence, so the drift that
    // follows is already the downward one
    run.frame();
    assert!(run.scene.is_converged());
    let after = run.scene.fall().positions();
    for (old, new) in before.chunks_exact(3).zip(after.chunks_exact(3)) {
        assert_eq!(new[0], old[0]);
        assert_eq!(new[1], wrap_coord(old[1], -y_step, -half_height));
        assert_eq!(new[2], old[2]);
    }
    assert_fall_graph_current(&run.scene);

    run.frame();
    assert_fall_graph_current(&run.scene);
}

#[test]
fn test_dispose_stops_everything() {
    let mut run = Run::start(17);
    run.run_until(2.5);
    let phase = run.scene.phase();

    run.scene.dispose(&mut run.driver);
    assert!(run.driver.attached().is_empty());
    assert_eq!(run.driver.pending_disposal(), &SCENE_OBJECTS);
    assert!(!run.driver.is_animating());
    assert_eq!(run.scene.pending_tweens(), 0);
    assert!(!run.scene.is_running());

    run.run_until(5.0);
    assert_eq!(run.scene.phase(), phase);
    assert!(!run.scene.is_converged());
    assert!(run.driver.pending_disposal().is_empty());
    assert_eq!(run.driver.disposed(), &SCENE_OBJECTS);
    assert!(run.driver.last_frame().is_empty());

    // Manual ticks are ignored too
    run.scene.update(10.0);
    assert_eq!(run.scene.phase(), phase);
}

#[test]
fn test_reset_replays_sequence() {
    let mut run = Run::start(19);
    run.run_until(5.0);
    assert_eq!(run.scene.phase(), Phase::Steady);

    let now = run.clock.now();
    run.scene.reset(&mut run.driver, now);
    assert_eq!(run.scene.phase(), Phase::Entrance);
    assert!(!run.scene.interaction_enabled());
    assert_eq!(run.driver.attached(), &SCENE_OBJECTS);
    assert!(run.driver.pending_disposal().is_empty());
    assert!(run.driver.is_animating());

    let mut phases = run.run_until(now + 4.0);
    phases.dedup();
    assert_eq!(
        phases,
        vec![Phase::Entrance, Phase::Converging, Phase::FadingIn, Phase::Steady]
    );
}

#[test]
fn test_same_seed_same_scene() {
    let mut a = Run::start(23);
    let mut b = Run::start(23);
    a.run_until(4.0);
    b.run_until(4.0);
    assert_eq!(a.scene.sphere().positions(), b.scene.sphere().positions());
    assert_eq!(a.scene.fall().positions(), b.scene.fall().positions());
    assert_eq!(a.scene.sphere_graph().edges(), b.scene.sphere_graph().edges());
}

#[test]
fn test_options_applied_mid_run() {
    let mut run = Run::start(29);
    run.run_until(5.0);

    let mut changed = run.scene.options().clone();
    changed.sphere_connections = 0;
    run.scene.apply_options(&changed);
    run.frame();
    assert_eq!(run.scene.sphere_graph().segment_count(), 0);
    assert_eq!(run.drawn_opacity(SPHERE_LINES), Some(1.0));
}
