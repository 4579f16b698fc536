/// Logical Game Boy buttons, independent of any keyboard mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Right,
    Down,
    Left,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
    ];

    pub fn from_name(name: &str) -> Option<Button> {
        let button = match name.to_ascii_lowercase().as_str() {
            "a" => Button::A,
            "b" => Button::B,
            "select" => Button::Select,
            "start" => Button::Start,
            "up" => Button::Up,
            "right" => Button::Right,
            "down" => Button::Down,
            "left" => Button::Left,
            _ => return None,
        };
        Some(button)
    }
}

/// A key-down or key-up transition for one button.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub button: Button,
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn down(button: Button) -> Self {
        Self {
            button,
            pressed: true,
        }
    }

    pub const fn up(button: Button) -> Self {
        Self {
            button,
            pressed: false,
        }
    }
}
