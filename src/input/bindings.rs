//! Keyboard and pointer input decoding
//!
//! Maps raw window-message values to editor commands and canvas points.
//! Nothing here touches the OS, so the mapping is tested on every target.

use crate::domain::core::Point;

const VK_ESCAPE: u32 = 0x1b;
const VK_UP: u32 = 0x26;
const VK_DOWN: u32 = 0x28;
const VK_DELETE: u32 = 0x2e;
const VK_F2: u32 = 0x71;

/// Modifier keys held with a key press
///
/// Only Ctrl changes the mapping; Shift and Alt are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
}

/// Editor action triggered from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    AddActor,
    ToggleNewInteractionMode,
    /// Flip the selected interaction between solid and dashed
    ToggleSelectedStyle,
    /// Flip the style used for newly drawn interactions
    ToggleNewStyle,
    EditLabel,
    MoveUp,
    MoveDown,
    Delete,
    ToggleTheme,
    Export,
    /// Drop the draft or clear the selection
    Cancel,
}

impl EditorCommand {
    /// Converts a Windows virtual key code to a command
    pub fn from_vk_code(vk_code: u32, modifiers: Modifiers) -> Option<Self> {
        if modifiers.ctrl {
            return match vk_code {
                0x45 => Some(EditorCommand::Export), // Ctrl+E
                _ => None,
            };
        }

        match vk_code {
            0x41 => Some(EditorCommand::AddActor),                 // A
            0x4e => Some(EditorCommand::ToggleNewInteractionMode), // N
            0x53 => Some(EditorCommand::ToggleSelectedStyle),      // S
            0x44 => Some(EditorCommand::ToggleNewStyle),           // D
            0x45 | VK_F2 => Some(EditorCommand::EditLabel),        // E
            0x54 => Some(EditorCommand::ToggleTheme),              // T
            VK_UP => Some(EditorCommand::MoveUp),
            VK_DOWN => Some(EditorCommand::MoveDown),
            VK_DELETE => Some(EditorCommand::Delete),
            VK_ESCAPE => Some(EditorCommand::Cancel),
            _ => None,
        }
    }
}

/// Client-area point packed into a mouse message's `lParam`
///
/// Coordinates are signed 16-bit values; they go negative when the pointer
/// is captured and dragged past the left or top edge.
pub fn point_from_lparam(lparam: isize) -> Point {
    let x = (lparam & 0xffff) as u16 as i16;
    let y = ((lparam >> 16) & 0xffff) as u16 as i16;
    Point::new(x as i32, y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_keys_map_to_commands() {
        let none = Modifiers::default();
        assert_eq!(EditorCommand::from_vk_code(0x41, none), Some(EditorCommand::AddActor));
        assert_eq!(
            EditorCommand::from_vk_code(0x4e, none),
            Some(EditorCommand::ToggleNewInteractionMode)
        );
        assert_eq!(EditorCommand::from_vk_code(0x45, none), Some(EditorCommand::EditLabel));
        assert_eq!(EditorCommand::from_vk_code(VK_F2, none), Some(EditorCommand::EditLabel));
        assert_eq!(EditorCommand::from_vk_code(VK_DELETE, none), Some(EditorCommand::Delete));
        assert_eq!(EditorCommand::from_vk_code(0x5a, none), None);
    }

    #[test]
    fn ctrl_e_exports() {
        let ctrl = Modifiers { ctrl: true };
        assert_eq!(EditorCommand::from_vk_code(0x45, ctrl), Some(EditorCommand::Export));
        assert_eq!(EditorCommand::from_vk_code(0x41, ctrl), None);
    }

    #[test]
    fn lparam_decoding_handles_negative_coordinates() {
        assert_eq!(point_from_lparam((200 << 16) | 100), Point::new(100, 200));
        let packed = ((-5i16 as u16 as isize) << 16) | (-12i16 as u16 as isize);
        assert_eq!(point_from_lparam(packed), Point::new(-12, -5));
    }
}
