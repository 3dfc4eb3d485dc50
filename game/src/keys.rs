use winit::event::VirtualKeyCode;

use crate::grid::Direction;
use crate::host::{GameMode, HostInput};

pub fn map_key_to_input(key: VirtualKeyCode) -> Option<HostInput> {
    match key {
        VirtualKeyCode::Up => Some(HostInput::Steer(Direction::Up)),
        VirtualKeyCode::Down => Some(HostInput::Steer(Direction::Down)),
        VirtualKeyCode::Left => Some(HostInput::Steer(Direction::Left)),
        VirtualKeyCode::Right => Some(HostInput::Steer(Direction::Right)),
        VirtualKeyCode::Space => Some(HostInput::Action),
        VirtualKeyCode::P | VirtualKeyCode::Escape => Some(HostInput::PauseToggle),
        VirtualKeyCode::R => Some(HostInput::Restart),
        VirtualKeyCode::Return | VirtualKeyCode::NumpadEnter => Some(HostInput::Start),
        VirtualKeyCode::Key1 | VirtualKeyCode::Numpad1 => {
            Some(HostInput::SwitchMode(GameMode::MazeChase))
        }
        VirtualKeyCode::Key2 | VirtualKeyCode::Numpad2 => {
            Some(HostInput::SwitchMode(GameMode::Snake))
        }
        VirtualKeyCode::Key3 | VirtualKeyCode::Numpad3 => {
            Some(HostInput::SwitchMode(GameMode::BlockStack))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_steer_and_escape_pauses() {
        assert_eq!(
            map_key_to_input(VirtualKeyCode::Left),
            Some(HostInput::Steer(Direction::Left))
        );
        assert_eq!(map_key_to_input(VirtualKeyCode::Escape), Some(HostInput::PauseToggle));
        assert_eq!(map_key_to_input(VirtualKeyCode::P), Some(HostInput::PauseToggle));
    }

    #[test]
    fn digits_switch_modes() {
        assert_eq!(
            map_key_to_input(VirtualKeyCode::Key3),
            Some(HostInput::SwitchMode(GameMode::BlockStack))
        );
        assert_eq!(map_key_to_input(VirtualKeyCode::Q), None);
    }
}
