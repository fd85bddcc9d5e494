use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layout_engine::LayoutKind;
use crate::model::client::ClientId;

/// One virtual workspace: an ordered client sequence plus its layout and
/// focus state.
///
/// The order of `order` is the stacking/tiling order, head first. `current`
/// and `previous` always refer to members of `order` (or are `None`), and are
/// equal only when both are `None`. The short window inside a removal where
/// that does not hold is resolved by the refocus the reducer performs before
/// the operation completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Desktop {
    pub name: String,
    pub mode: LayoutKind,
    pub master_fraction: f32,
    /// Pixel adjustment applied on top of the fractional master size.
    pub master_adjust: i32,
    /// Pixel adjustment absorbed by the first stack window.
    pub stack_adjust: i32,
    pub master_count: usize,
    pub show_panel: bool,
    order: Vec<ClientId>,
    pub current: Option<ClientId>,
    pub previous: Option<ClientId>,
}

impl Desktop {
    pub fn new(
        name: String,
        mode: LayoutKind,
        master_fraction: f32,
        master_count: usize,
        show_panel: bool,
    ) -> Self {
        Self {
            name,
            mode,
            master_fraction,
            master_adjust: 0,
            stack_adjust: 0,
            master_count,
            show_panel,
            order: Vec::new(),
            current: None,
            previous: None,
        }
    }

    pub fn order(&self) -> &[ClientId] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn head(&self) -> Option<ClientId> {
        self.order.first().copied()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.order.contains(&id)
    }

    fn position(&self, id: ClientId) -> Option<usize> {
        self.order.iter().position(|&x| x == id)
    }

    /// Literal successor in the sequence, `None` for the last element.
    pub fn successor(&self, id: ClientId) -> Option<ClientId> {
        let pos = self.position(id)?;
        self.order.get(pos + 1).copied()
    }

    /// Successor treating the sequence as circular.
    pub fn circular_successor(&self, id: ClientId) -> Option<ClientId> {
        self.successor(id).or_else(|| self.head())
    }

    /// Predecessor of `id`: `None` when the sequence has fewer than two
    /// elements, the last element when `id` is the head.
    pub fn predecessor(&self, id: ClientId) -> Option<ClientId> {
        if self.order.len() < 2 {
            return None;
        }
        match self.position(id)? {
            0 => self.order.last().copied(),
            pos => Some(self.order[pos - 1]),
        }
    }

    /// Add a window to the sequence. An empty sequence gains its sole
    /// element; otherwise the window becomes the head, or the last element
    /// when `at_end` is set.
    pub fn attach(&mut self, id: ClientId, at_end: bool) {
        debug_assert!(!self.contains(id), "client attached twice");
        if at_end || self.order.is_empty() {
            self.order.push(id);
        } else {
            self.order.insert(0, id);
        }
    }

    /// Unlink a window from the sequence. Returns false when the window is
    /// not a member.
    ///
    /// When the removed window was `previous`, a replacement is computed as
    /// the predecessor of `current`, falling back to the head. A removed
    /// `current` is cleared; the caller is expected to refocus.
    pub fn detach(&mut self, id: ClientId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.order.remove(pos);
        if self.previous == Some(id) {
            self.previous = self
                .current
                .and_then(|c| self.predecessor(c))
                .or_else(|| self.head());
        }
        if self.current == Some(id) {
            self.current = None;
        }
        true
    }

    /// Swap the current window with its circular successor. All other
    /// relative orderings are preserved; `current`/`previous` identities are
    /// untouched. Returns whether the sequence changed.
    pub fn move_down(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        if self.order.len() < 2 {
            return false;
        }
        let pos = self.position(current).expect("current not in sequence");
        if pos == self.order.len() - 1 {
            self.order.rotate_right(1);
        } else {
            self.order.swap(pos, pos + 1);
        }
        true
    }

    /// Swap the current window with its circular predecessor.
    pub fn move_up(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        if self.order.len() < 2 {
            return false;
        }
        let pos = self.position(current).expect("current not in sequence");
        if pos == 0 {
            self.order.rotate_left(1);
        } else {
            self.order.swap(pos, pos - 1);
        }
        true
    }

    /// Swap the current window into the master slot: a current head swaps
    /// with its successor, anything else moves up until it is the head.
    /// Returns the window that should be focused afterwards (the new head).
    pub fn swap_master(&mut self) -> Option<ClientId> {
        let current = self.current?;
        if self.order.len() < 2 {
            return None;
        }
        if self.head() == Some(current) {
            self.move_down();
        } else {
            while self.head() != Some(current) {
                if !self.move_up() {
                    break;
                }
            }
        }
        trace!(desktop = %self.name, "swapped master");
        self.head()
    }
}
