use crate::app::{ActionEdge, InputAction, KeyEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseItem {
    Resume,
    Collection,
    Save,
    Exit,
}

impl PauseItem {
    pub const ALL: [PauseItem; 4] = [
        PauseItem::Resume,
        PauseItem::Collection,
        PauseItem::Save,
        PauseItem::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PauseItem::Resume => "RESUME",
            PauseItem::Collection => "COLLECTION",
            PauseItem::Save => "SAVE",
            PauseItem::Exit => "EXIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseAction {
    Closed,
    Selected(PauseItem),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseMenu {
    open: bool,
    cursor: usize,
}

impl PauseMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn open(&mut self) {
        self.open = true;
        self.cursor = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.cursor = 0;
    }

    /// Input while the menu holds focus. Every selection closes the menu.
    pub fn handle_edge(&mut self, edge: ActionEdge) -> Option<PauseAction> {
        if !self.open || edge.edge != KeyEdge::Down {
            return None;
        }
        match edge.action {
            InputAction::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            InputAction::Down => {
                self.cursor = (self.cursor + 1).min(PauseItem::ALL.len() - 1);
                None
            }
            InputAction::A => {
                let item = PauseItem::ALL[self.cursor];
                self.close();
                Some(PauseAction::Selected(item))
            }
            InputAction::B | InputAction::Start => {
                self.close();
                Some(PauseAction::Closed)
            }
            _ => None,
        }
    }
}
