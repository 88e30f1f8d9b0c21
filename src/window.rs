//! Windowed runtime.
//!
//! Opens a winit window, renders the scene through [`GpuState`] and ticks
//! the choreography once per redraw, right after drawing.
//!
//! Controls:
//! - move the pointer to rotate the sphere (once its lines have faded in)
//! - double click to toggle fullscreen
//! - `R` replays the sequence
//! - `L` reloads the options file, `S` saves the current options to it
//! - `Esc` quits

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::choreographer::Choreographer;
use crate::config::SceneOptions;
use crate::driver::FrameDriver;
use crate::error::RunError;
use crate::gpu::GpuState;
use crate::input::{Pointer, PointerAction};
use crate::time::FrameClock;

struct App {
    options: SceneOptions,
    config_path: Option<PathBuf>,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: Option<Choreographer>,
    pointer: Pointer,
    clock: FrameClock,
    error: Option<RunError>,
}

impl App {
    fn new(options: SceneOptions, config_path: Option<PathBuf>) -> Self {
        Self {
            options,
            config_path,
            window: None,
            gpu_state: None,
            scene: None,
            pointer: Pointer::default(),
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn toggle_fullscreen(&self) {
        if let Some(window) = &self.window {
            let fullscreen = match window.fullscreen() {
                Some(_) => None,
                None => Some(Fullscreen::Borderless(None)),
            };
            window.set_fullscreen(fullscreen);
        }
    }

    fn reload_options(&mut self) {
        let Some(path) = &self.config_path else {
            log::warn!("no options file given");
            return;
        };
        match SceneOptions::load(path) {
            Ok(options) => {
                log::info!("reloaded options from {}", path.display());
                if let Some(scene) = &mut self.scene {
                    scene.apply_options(&options);
                }
                self.options = options;
            }
            Err(e) => log::warn!("could not reload {}: {}", path.display(), e),
        }
    }

    fn save_options(&self) {
        let Some(path) = &self.config_path else {
            log::warn!("no options file given");
            return;
        };
        let options = self.scene.as_ref().map_or(&self.options, |scene| scene.options());
        match options.save(path) {
            Ok(()) => log::info!("saved options to {}", path.display()),
            Err(e) => log::warn!("could not save {}: {}", path.display(), e),
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let (Some(gpu_state), Some(scene)) = (&mut self.gpu_state, &mut self.scene) {
            scene.dispose(gpu_state);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Plexus")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let mut gpu_state = match pollster::block_on(GpuState::new(window.clone())) {
            Ok(gpu_state) => gpu_state,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let size = window.inner_size();
        self.pointer.set_window_size(size.width, size.height);

        let mut scene = Choreographer::new(&self.options, &gpu_state.camera);
        scene.init(&mut gpu_state, self.clock.now());

        window.request_redraw();
        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.scene = Some(scene);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match self.pointer.handle_event(&event) {
            Some(PointerAction::Moved(ndc)) => {
                if let Some(scene) = &mut self.scene {
                    scene.handle_pointer(ndc);
                }
            }
            Some(PointerAction::DoubleClick) => self.toggle_fullscreen(),
            None => {}
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => self.shutdown(event_loop),
                    PhysicalKey::Code(KeyCode::KeyR) => {
                        if let (Some(gpu_state), Some(scene)) = (&mut self.gpu_state, &mut self.scene) {
                            scene.reset(gpu_state, self.clock.now());
                        }
                    }
                    PhysicalKey::Code(KeyCode::KeyL) => self.reload_options(),
                    PhysicalKey::Code(KeyCode::KeyS) => self.save_options(),
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                let now = self.clock.tick();
                if let (Some(gpu_state), Some(scene)) = (&mut self.gpu_state, &mut self.scene) {
                    gpu_state.render(&scene.draw_items());
                    scene.mark_rendered();
                    if gpu_state.is_animating() {
                        scene.update(now);
                    }
                    if gpu_state.is_out_of_memory() {
                        event_loop.exit();
                        return;
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the scene until it is closed.
///
/// `config_path` is the file `L` reloads from and `S` saves to.
pub fn run(options: SceneOptions, config_path: Option<PathBuf>) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(options, config_path);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
