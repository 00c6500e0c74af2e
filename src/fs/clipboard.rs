use crate::fs::entry::Entry;

/// The kind of staged transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Copy,
    Move,
}

impl TransferAction {
    pub fn verb(&self) -> &'static str {
        match self {
            TransferAction::Copy => "copy",
            TransferAction::Move => "move",
        }
    }
}

/// Process-wide staged transfer: entry snapshots plus the action to apply.
///
/// Survives navigation; consumed by a successful paste or an explicit cancel.
#[derive(Debug, Clone)]
pub struct ClipboardState {
    pub items: Vec<Entry>,
    pub action: Option<TransferAction>,
}

impl Default for ClipboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardState {
    /// Create a new empty clipboard.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            action: None,
        }
    }

    /// Stage `items` for `action`, replacing any previous content.
    pub fn stage(&mut self, items: Vec<Entry>, action: TransferAction) {
        self.items = items;
        self.action = Some(action);
    }

    /// Clear the clipboard.
    pub fn clear(&mut self) {
        self.items.clear();
        self.action = None;
    }

    /// Whether there is nothing to paste.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() || self.action.is_none()
    }

    /// Number of items in the clipboard.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
