/// User interface module
///
/// - `canvas.rs` - image viewer with wheel zoom and drag pan
/// - `views.rs` - setup and sorting screens
/// - `dialogs.rs` - native pickers and confirmation boxes
use iced::keyboard::{self, key::Named, Modifiers};

use crate::state::input::{Key, KeyPress};

pub mod canvas;
pub mod dialogs;
pub mod views;

/// Translate an iced key event into the toolkit-independent form.
pub fn to_key_press(key: &keyboard::Key, modifiers: Modifiers) -> KeyPress {
    let key = match key {
        keyboard::Key::Named(Named::ArrowLeft) => Key::ArrowLeft,
        keyboard::Key::Named(Named::ArrowRight) => Key::ArrowRight,
        keyboard::Key::Named(Named::Space) => Key::Space,
        keyboard::Key::Character(c) => {
            let mut chars = c.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Key::Character(ch),
                _ => Key::Other,
            }
        }
        _ => Key::Other,
    };

    KeyPress {
        key,
        ctrl: modifiers.command(),
    }
}
