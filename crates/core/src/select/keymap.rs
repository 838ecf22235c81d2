//! Key bindings of a selection round

use std::collections::HashMap;

/// A key event, independent of the terminal toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    /// Printable character
    Char(char),
    /// Character pressed with Ctrl
    Ctrl(char),
    /// Anything the selector has no use for
    Other,
}

/// Effect of a key on the running round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    /// End the round with the pointed candidate
    Confirm,
    /// End the round, going up one level
    Back,
    /// End the round and the whole traversal
    Cancel,
    /// Copy the pointed entry's path to the clipboard
    CopyPath,
    /// Download the pointed entry
    Download,
    /// Re-list the pointed container
    Refresh,
    /// Append to the query
    Insert(char),
    /// Remove the last query character
    DeleteBack,
}

/// Key → action table
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<Key, Action>,
}

impl Default for Keymap {
    fn default() -> Self {
        let bindings = HashMap::from([
            (Key::Up, Action::MoveUp),
            (Key::Down, Action::MoveDown),
            (Key::Enter, Action::Confirm),
            (Key::Right, Action::Confirm),
            (Key::Left, Action::Back),
            (Key::Ctrl('c'), Action::Cancel),
            (Key::Ctrl('p'), Action::CopyPath),
            (Key::Ctrl('d'), Action::Download),
            (Key::Ctrl('r'), Action::Refresh),
            (Key::Backspace, Action::DeleteBack),
        ]);
        Self { bindings }
    }
}

impl Keymap {
    /// Action for a key; unbound printable characters edit the query
    pub fn action(&self, key: Key) -> Option<Action> {
        match (self.bindings.get(&key), key) {
            (Some(&action), _) => Some(action),
            (None, Key::Char(c)) if !c.is_control() => Some(Action::Insert(c)),
            _ => None,
        }
    }
}
