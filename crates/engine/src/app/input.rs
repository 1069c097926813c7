use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

pub(crate) const ACTION_COUNT: usize = 8;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::Up,
        InputAction::Down,
        InputAction::Left,
        InputAction::Right,
        InputAction::A,
        InputAction::B,
        InputAction::Start,
        InputAction::Select,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            InputAction::Up => 0,
            InputAction::Down => 1,
            InputAction::Left => 2,
            InputAction::Right => 3,
            InputAction::A => 4,
            InputAction::B => 5,
            InputAction::Start => 6,
            InputAction::Select => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEdge {
    pub action: InputAction,
    pub edge: KeyEdge,
}

impl ActionEdge {
    pub const fn down(action: InputAction) -> Self {
        Self {
            action,
            edge: KeyEdge::Down,
        }
    }

    pub const fn up(action: InputAction) -> Self {
        Self {
            action,
            edge: KeyEdge::Up,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.action == action && self.edge == KeyEdge::Down
    }
}

/// Held state per action, sampled once per tick for continuous movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    #[cfg(test)]
    pub(crate) fn with_down(mut self, action: InputAction) -> Self {
        self.set(action, true);
        self
    }
}

/// Fixed physical key table. Several keys may feed the same action.
pub fn action_for_key(key: KeyCode) -> Option<InputAction> {
    match key {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(InputAction::Up),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(InputAction::Down),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(InputAction::Left),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(InputAction::Right),
        KeyCode::KeyZ | KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => {
            Some(InputAction::A)
        }
        KeyCode::KeyX | KeyCode::Escape | KeyCode::Backspace => Some(InputAction::B),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(InputAction::Start),
        KeyCode::ControlLeft | KeyCode::ControlRight => Some(InputAction::Select),
        _ => None,
    }
}
