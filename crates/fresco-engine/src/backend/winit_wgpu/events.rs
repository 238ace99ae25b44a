use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::backend::NativeEvent;
use crate::input::{Key, KeyAction, Modifiers};

/// winit application handler driven by `pump_app_events`.
///
/// Creates requested windows once the event loop is live and buffers
/// translated window events until the back-end drains them.
#[derive(Default)]
pub(crate) struct PumpHandler {
    resumed: bool,
    requests: Vec<(u64, WindowAttributes)>,
    created: Vec<(u64, Result<Window, String>)>,
    events: Vec<(WindowId, NativeEvent)>,
    modifiers: Modifiers,
}

impl PumpHandler {
    /// Queues a window for creation on the next pump.
    pub(crate) fn request_window(&mut self, id: u64, attrs: WindowAttributes) {
        self.requests.push((id, attrs));
    }

    /// Forgets request `id`, including a window created too late to be
    /// picked up; dropping it closes the window again.
    pub(crate) fn cancel_request(&mut self, id: u64) {
        self.requests.retain(|(rid, _)| *rid != id);
        self.created.retain(|(rid, _)| *rid != id);
    }

    /// Returns the creation result for request `id`, once available.
    pub(crate) fn take_created(&mut self, id: u64) -> Option<Result<Window, String>> {
        let pos = self.created.iter().position(|(rid, _)| *rid == id)?;
        Some(self.created.swap_remove(pos).1)
    }

    pub(crate) fn drain_events(&mut self) -> Vec<(WindowId, NativeEvent)> {
        std::mem::take(&mut self.events)
    }

    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if !self.resumed {
            return;
        }
        for (id, attrs) in self.requests.drain(..) {
            let result = event_loop.create_window(attrs).map_err(|e| e.to_string());
            self.created.push((id, result));
        }
    }

    fn translate(&mut self, event: &WindowEvent) -> Option<NativeEvent> {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = map_modifiers(m.state());
                None
            }
            WindowEvent::Focused(focused) => Some(NativeEvent::Focused(*focused)),
            WindowEvent::CloseRequested => Some(NativeEvent::CloseRequested),
            WindowEvent::Resized(size) => Some(NativeEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                let action = match (event.state, event.repeat) {
                    (ElementState::Pressed, false) => KeyAction::Press,
                    (ElementState::Pressed, true) => KeyAction::Repeat,
                    (ElementState::Released, _) => KeyAction::Release,
                };
                let (key, scancode) = map_key(event.physical_key);
                Some(NativeEvent::Key {
                    key,
                    scancode,
                    action,
                    mods: self.modifiers,
                })
            }
            _ => None,
        }
    }
}

impl ApplicationHandler for PumpHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.resumed = true;
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if let Some(ev) = self.translate(&event) {
            self.events.push((window_id, ev));
        }
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_key(pk: PhysicalKey) -> (Key, u32) {
    let PhysicalKey::Code(code) = pk else {
        // NativeKeyCode has no stable numeric form in winit 0.30.
        return (Key::Unknown(0), 0);
    };

    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

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
    };

    (key, code as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_drops_late_results() {
        let mut handler = PumpHandler::default();
        handler.request_window(7, Window::default_attributes());
        handler.created.push((7, Err("created after the caller gave up".to_string())));
        handler.created.push((8, Err("other".to_string())));

        handler.cancel_request(7);
        assert!(handler.requests.is_empty());
        assert!(handler.take_created(7).is_none());
        assert!(handler.take_created(8).is_some());
    }

    #[test]
    fn physical_keys_map_to_engine_keys() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)).0, Key::Escape);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)).0, Key::Q);
        assert!(matches!(map_key(PhysicalKey::Code(KeyCode::NumLock)).0, Key::Unknown(_)));
    }

    #[test]
    fn modifier_state_maps_each_flag() {
        let m = map_modifiers(ModifiersState::CONTROL | ModifiersState::SUPER);
        assert_eq!(
            m,
            Modifiers {
                ctrl: true,
                meta: true,
                ..Modifiers::NONE
            }
        );
    }
}
