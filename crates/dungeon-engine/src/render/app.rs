//! Windowed application runner.
//!
//! Provides [`run_windowed`], which takes ownership of a [`SceneMachine`] and
//! drives it inside a winit event loop. Window events are folded into an
//! [`InputState`]; each `RedrawRequested` runs one machine update, draws the
//! active scene into a [`Frame`] and presents it.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, WindowAttributes, WindowId};

use super::renderer::FrameRenderer;
use crate::config::WindowConfig;
use crate::frame::Frame;
use crate::input::{InputState, Key, MouseButton};
use crate::machine::{Flow, SceneMachine};

/// Pixel-delta scroll events are divided by this to approximate lines.
const PIXELS_PER_LINE: f64 = 20.0;

/// Weight of the newest frame in the smoothed FPS value.
const FPS_SMOOTHING: f64 = 0.1;

/// Run the scene machine in a window until it terminates or the window is
/// closed.
///
/// # Errors
///
/// Returns an error if the event loop cannot be created or the window or
/// renderer fail to initialize.
pub fn run_windowed(machine: SceneMachine, window: &WindowConfig) -> Result<(), anyhow::Error> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        state: AppState::Pending { machine },
        window: window.clone(),
        input: InputState::new(),
        frame: Frame::new(window.width as f32, window.height as f32),
        last_frame: Instant::now(),
        fps: 0.0,
        init_failed: false,
    };

    event_loop.run_app(&mut app)?;

    // The loop can also end without the machine asking for it.
    match &mut app.state {
        AppState::Pending { machine } | AppState::Running { machine, .. } => {
            machine.terminate();
        }
        AppState::Transitioning => {}
    }

    if app.init_failed {
        return Err(anyhow::anyhow!(
            "failed to initialize windowed renderer (see logs for details)"
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

/// Winit 0.30 requires that window creation happens inside
/// `ApplicationHandler::resumed`, so the app waits in `Pending` until then.
enum AppState {
    Pending {
        machine: SceneMachine,
    },
    Running {
        machine: SceneMachine,
        renderer: FrameRenderer,
    },
    /// Temporary placeholder used during state transitions.
    Transitioning,
}

struct App {
    state: AppState,
    window: WindowConfig,
    input: InputState,
    frame: Frame,
    last_frame: Instant,
    fps: f64,
    init_failed: bool,
}

impl App {
    fn create_renderer(&self, event_loop: &ActiveEventLoop) -> Result<FrameRenderer, anyhow::Error> {
        let mut attrs = WindowAttributes::default()
            .with_title(self.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.window.width, self.window.height));
        if self.window.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attrs)?);
        let renderer = pollster::block_on(FrameRenderer::new(window.clone()))?;
        window.request_redraw();
        Ok(renderer)
    }

    /// Convert a physical cursor position to logical viewport pixels.
    fn to_viewport(&self, renderer: &FrameRenderer, x: f64, y: f64) -> (f64, f64) {
        let size = renderer.window().inner_size();
        let sx = f64::from(self.window.width) / f64::from(size.width.max(1));
        let sy = f64::from(self.window.height) / f64::from(size.height.max(1));
        (x * sx, y * sy)
    }

    fn tick_timing(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        if delta > 0.0 {
            let instant = 1.0 / delta;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps + (instant - self.fps) * FPS_SMOOTHING
            };
        }
        self.input.set_timing(self.fps, delta);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let state = std::mem::replace(&mut self.state, AppState::Transitioning);
        match state {
            AppState::Pending { machine } => match self.create_renderer(event_loop) {
                Ok(renderer) => {
                    tracing::info!(
                        width = self.window.width,
                        height = self.window.height,
                        fullscreen = self.window.fullscreen,
                        "window created"
                    );
                    self.last_frame = Instant::now();
                    self.state = AppState::Running { machine, renderer };
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to initialize renderer -- exiting");
                    self.init_failed = true;
                    self.state = AppState::Pending { machine };
                    event_loop.exit();
                }
            },
            running @ AppState::Running { .. } => self.state = running,
            AppState::Transitioning => {
                tracing::warn!("resumed called during state transition");
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (mut machine, mut renderer) =
            match std::mem::replace(&mut self.state, AppState::Transitioning) {
                AppState::Running { machine, renderer } => (machine, renderer),
                other => {
                    // Not yet initialized; ignore window events.
                    self.state = other;
                    return;
                }
            };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(frames = machine.frame_count(), "window close requested");
                self.input.request_quit();
                machine.update(&self.input);
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(
                    width = new_size.width,
                    height = new_size.height,
                    "window resized"
                );
                renderer.resize(new_size);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        self.input.key_event(key, pressed);
                    }
                }
                if pressed {
                    if let Some(text) = event.text.as_deref() {
                        self.input.text_typed(text);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_button(button) {
                    self.input
                        .button_event(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = self.to_viewport(&renderer, position.x, position.y);
                self.input.cursor_moved(x, y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                    MouseScrollDelta::PixelDelta(p) => p.y / PIXELS_PER_LINE,
                };
                self.input.scroll(dy);
            }
            WindowEvent::RedrawRequested => {
                self.tick_timing();
                let flow = machine.update(&self.input);
                self.input.end_frame();
                if flow == Flow::Terminate {
                    event_loop.exit();
                } else {
                    self.frame
                        .clear(self.window.width as f32, self.window.height as f32);
                    machine.draw(&mut self.frame);
                    match renderer.render(&self.frame) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            let size = renderer.window().inner_size();
                            renderer.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            tracing::error!("GPU out of memory -- exiting");
                            machine.terminate();
                            event_loop.exit();
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "surface error during render");
                        }
                    }
                    renderer.window().request_redraw();
                }
            }
            _ => {}
        }

        self.state = AppState::Running { machine, renderer };
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Escape => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyC => Key::C,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        _ => return None,
    };
    Some(key)
}

fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}
