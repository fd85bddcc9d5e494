//! Focus transitions and stacking order.
//!
//! The focus state machine lives in each desktop's `current`/`previous`
//! references; this module implements the transition rule and derives the
//! observable outcome (border colors, restack order, input focus target)
//! that the reducer turns into directives.

use slotmap::SlotMap;

use crate::model::client::{Client, ClientId, WindowHandle};
use crate::model::desktop::Desktop;

/// Border color classes understood by the server collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderColor {
    Focused,
    Unfocused,
}

/// What the collaborator must be told after a focus change.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FocusUpdate {
    pub border_colors: Vec<(WindowHandle, BorderColor)>,
    /// Bottom-to-top restacking order for every window on the desktop.
    pub restack: Vec<WindowHandle>,
    pub input_focus: Option<WindowHandle>,
    pub active_window: Option<WindowHandle>,
}

/// Update a desktop's focus references to `target` and derive the resulting
/// directives.
///
/// Reference handling follows the rules of the classic list walker:
///
/// * no windows, or no target: both references are cleared and focus reverts
///   to the root (no window);
/// * target == previous while current is not the target's literal successor:
///   two consecutive refocuses (or the current window was just removed) —
///   current becomes the target, previous its predecessor;
/// * target != current: previous takes the old current;
/// * otherwise references are unchanged.
///
/// The urgency flag of the newly focused window is always cleared.
pub fn apply_focus(
    clients: &mut SlotMap<ClientId, Client>,
    desktop: &mut Desktop,
    target: Option<ClientId>,
) -> FocusUpdate {
    let target = target.filter(|&id| desktop.contains(id));
    let Some(target) = target else {
        desktop.current = None;
        desktop.previous = None;
        return FocusUpdate::default();
    };
    if desktop.is_empty() {
        desktop.current = None;
        desktop.previous = None;
        return FocusUpdate::default();
    }

    if desktop.previous == Some(target) && desktop.current != desktop.successor(target) {
        desktop.current = Some(target);
        desktop.previous = desktop.predecessor(target);
    } else if desktop.current != Some(target) {
        desktop.previous = desktop.current;
        desktop.current = Some(target);
    }
    clients[target].urgent = false;

    let mut update = FocusUpdate {
        input_focus: Some(clients[target].handle),
        active_window: Some(clients[target].handle),
        ..Default::default()
    };
    for &id in desktop.order() {
        let color = if id == target {
            BorderColor::Focused
        } else {
            BorderColor::Unfocused
        };
        update.border_colors.push((clients[id].handle, color));
    }
    update.restack = stacking_order(clients, desktop, target);
    update
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Layer {
    Tiled,
    Fullscreen,
    FloatingOrTransient,
}

fn layer(client: &Client) -> Layer {
    if client.fullscreen {
        Layer::Fullscreen
    } else if client.floating || client.transient {
        Layer::FloatingOrTransient
    } else {
        Layer::Tiled
    }
}

/// Bottom-to-top stacking for a desktop: tiled windows, then fullscreen,
/// then floating/transient, with the current window topmost within its own
/// layer.
fn stacking_order(
    clients: &SlotMap<ClientId, Client>,
    desktop: &Desktop,
    current: ClientId,
) -> Vec<WindowHandle> {
    let mut order = Vec::with_capacity(desktop.len());
    for want in [Layer::Tiled, Layer::Fullscreen, Layer::FloatingOrTransient] {
        for &id in desktop.order() {
            if id != current && layer(&clients[id]) == want {
                order.push(clients[id].handle);
            }
        }
        if layer(&clients[current]) == want {
            order.push(clients[current].handle);
        }
    }
    order
}
