//! Input handling for the interactive table.

pub mod keyboard;

pub use keyboard::{handle_key_event, KeyAction};
