//! Subscriptions represent inputs that an app wants to receive.
//!
//! They are declared by the subscriptions() function and recomputed
//! from state after every update, so an input source disappears as
//! soon as the state stops asking for it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use std::time::Duration;

/// Represents a keyboard key with optional modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Create a key binding with no modifiers
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::empty(),
        }
    }

    /// Create a key binding with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Check if this key binding matches the given key event
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.code == event.code && self.modifiers == event.modifiers
    }
}

impl From<KeyCode> for KeyBinding {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

pub enum Subscription<Msg> {
    /// Subscribe to a specific keyboard key
    Keyboard {
        key: KeyBinding,
        msg: Msg,
        description: String,
    },

    /// Subscribe to periodic timer events
    Timer { interval: Duration, msg: Msg },

    /// Subscribe to events on the event bus
    Subscribe {
        topic: String,
        handler: Box<dyn Fn(Value) -> Option<Msg> + Send>,
    },
}

impl<Msg> Subscription<Msg> {
    /// Helper to create a keyboard subscription (accepts KeyCode or KeyBinding)
    pub fn keyboard(key: impl Into<KeyBinding>, description: impl Into<String>, msg: Msg) -> Self {
        Subscription::Keyboard {
            key: key.into(),
            msg,
            description: description.into(),
        }
    }

    /// Helper to create a timer subscription
    pub fn timer(interval: Duration, msg: Msg) -> Self {
        Subscription::Timer { interval, msg }
    }

    /// Helper to create an event bus subscription
    pub fn subscribe<F>(topic: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Option<Msg> + Send + 'static,
    {
        Subscription::Subscribe {
            topic: topic.into(),
            handler: Box::new(handler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key_event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut event = KeyEvent::new(code, modifiers);
        event.kind = KeyEventKind::Press;
        event
    }

    #[test]
    fn test_plain_binding_matches() {
        let binding = KeyBinding::new(KeyCode::Char('r'));
        assert!(binding.matches(&key_event(KeyCode::Char('r'), KeyModifiers::empty())));
        assert!(!binding.matches(&key_event(KeyCode::Char('r'), KeyModifiers::CONTROL)));
        assert!(!binding.matches(&key_event(KeyCode::Char('q'), KeyModifiers::empty())));
    }

    #[test]
    fn test_ctrl_binding_matches() {
        let binding = KeyBinding::ctrl(KeyCode::Char('e'));
        assert!(binding.matches(&key_event(KeyCode::Char('e'), KeyModifiers::CONTROL)));
        assert!(!binding.matches(&key_event(KeyCode::Char('e'), KeyModifiers::empty())));
    }
}
