//! Keyboard input vocabulary.
//!
//! Platform-agnostic: back-ends translate their native key events into these
//! types before they reach a window.

mod types;

pub use types::{Key, KeyAction, Modifiers};
