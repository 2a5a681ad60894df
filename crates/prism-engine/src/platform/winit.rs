use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::error::OsError;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::coords::PixelSize;
use crate::error::StartupError;
use crate::input::{InputEvent, InputState, Key, KeyState};

use super::{Platform, PlatformEvent};

/// Pumps allowed for the OS to deliver `resumed` and let us create the window.
const STARTUP_PUMPS: usize = 50;
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "prism sandbox".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            resizable: true,
        }
    }
}

/// [`Platform`] backed by a winit window.
///
/// winit normally owns the thread through `run_app`. This adapter instead pumps
/// the event loop with a zero timeout once per tick, so the frame loop keeps
/// control and OS events are drained without ever blocking.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    handler: Collector,
    window: Arc<Window>,
    started: Instant,
}

/// Receives winit callbacks during a pump and turns them into queued events.
struct Collector {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    creation_error: Option<OsError>,
    queue: VecDeque<PlatformEvent>,
    input: InputState,
}

impl WinitPlatform {
    /// Creates the event loop and the window.
    ///
    /// Desktop backends deliver `resumed` within the first pumps; the window is
    /// created there. Failing to get a window is a startup error.
    pub fn new(config: WindowConfig) -> Result<Self, StartupError> {
        let mut event_loop = EventLoop::new()?;
        let mut handler = Collector {
            config,
            window: None,
            creation_error: None,
            queue: VecDeque::new(),
            input: InputState::default(),
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(STARTUP_PUMP_TIMEOUT), &mut handler);

            if let Some(err) = handler.creation_error.take() {
                return Err(StartupError::Window(err.to_string()));
            }
            if let PumpStatus::Exit(code) = status {
                return Err(StartupError::Window(format!(
                    "event loop exited during startup (code {code})"
                )));
            }
            if let Some(window) = handler.window.clone() {
                log::debug!("window created: {:?}", window.inner_size());
                return Ok(Self {
                    event_loop,
                    handler,
                    window,
                    started: Instant::now(),
                });
            }
        }

        Err(StartupError::Window(
            "windowing system never resumed the application".to_string(),
        ))
    }

    /// The window, shared with the GPU surface.
    pub fn window(&self) -> Arc<Window> {
        Arc::clone(&self.window)
    }
}

impl Platform for WinitPlatform {
    fn pump_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);

        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            self.handler.queue.push_back(PlatformEvent::Quit);
        }
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.handler.queue.pop_front()
    }

    fn is_held(&self, key: Key) -> bool {
        self.handler.input.key_down(key)
    }

    fn mouse_position(&self) -> (i32, i32) {
        self.handler.input.pointer_pixels()
    }

    fn window_size(&self) -> PixelSize {
        PixelSize::from(self.window.inner_size())
    }

    fn ticks(&self) -> Duration {
        self.started.elapsed()
    }

    fn wait(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn pre_present(&self) {
        self.window.pre_present_notify();
    }
}

impl ApplicationHandler for Collector {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => self.creation_error = Some(err),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.queue.push_back(PlatformEvent::Quit),

            WindowEvent::Resized(size) => {
                self.queue.push_back(PlatformEvent::Resized(PixelSize::from(size)));
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = PixelSize::from(window.inner_size());
                    self.queue.push_back(PlatformEvent::Resized(size));
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let key = map_key(event.physical_key);
                let state = match event.state {
                    ElementState::Pressed => KeyState::Pressed,
                    ElementState::Released => KeyState::Released,
                };

                let fresh = self.input.apply_event(InputEvent::Key {
                    key,
                    state,
                    repeat: event.repeat,
                });

                if state == KeyState::Pressed {
                    self.queue.push_back(PlatformEvent::KeyDown {
                        key,
                        repeat: event.repeat || !fresh,
                    });
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.apply_event(InputEvent::PointerMoved {
                    x: position.x,
                    y: position.y,
                });
            }

            WindowEvent::CursorLeft { .. } => {
                self.input.apply_event(InputEvent::PointerLeft);
            }

            WindowEvent::Focused(focused) => {
                self.input.apply_event(InputEvent::Focused(focused));
            }

            _ => {}
        }
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Space => Key::Space,

            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,

            KeyCode::ShiftLeft => Key::ShiftLeft,
            KeyCode::ShiftRight => Key::ShiftRight,
            KeyCode::ControlLeft => Key::ControlLeft,
            KeyCode::ControlRight => Key::ControlRight,
            KeyCode::AltLeft => Key::AltLeft,
            KeyCode::AltRight => Key::AltRight,

            KeyCode::KeyA => Key::A,
            KeyCode::KeyB => Key::B,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyE => Key::E,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyI => Key::I,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyL => Key::L,
            KeyCode::KeyM => Key::M,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyQ => Key::Q,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyT => Key::T,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyX => Key::X,
            KeyCode::KeyY => Key::Y,
            KeyCode::KeyZ => Key::Z,

            KeyCode::Digit0 => Key::Digit0,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::Digit5 => Key::Digit5,
            KeyCode::Digit6 => Key::Digit6,
            KeyCode::Digit7 => Key::Digit7,
            KeyCode::Digit8 => Key::Digit8,
            KeyCode::Digit9 => Key::Digit9,

            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            KeyCode::F3 => Key::F3,
            KeyCode::F4 => Key::F4,
            KeyCode::F5 => Key::F5,
            KeyCode::F6 => Key::F6,
            KeyCode::F7 => Key::F7,
            KeyCode::F8 => Key::F8,
            KeyCode::F9 => Key::F9,
            KeyCode::F10 => Key::F10,
            KeyCode::F11 => Key::F11,
            KeyCode::F12 => Key::F12,

            other => Key::Unknown(other as u32),
        },

        // NativeKeyCode has no stable numeric form in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
