//! Interactive move/resize.
//!
//! A drag is a state machine driven by discrete pointer events, not a
//! blocking sub-loop: `start_drag` captures the anchor, every motion event
//! re-applies the constraint solver interactively, and the button release
//! transitions back to idle. While a drag is active the reactor only reduces
//! pointer events, window create requests and configure requests; everything
//! else is deferred so unrelated windows never observe reordered events.

use tracing::{debug, trace, warn};

use crate::actor::reactor::Reactor;
use crate::model::client::ClientId;
use crate::sys::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragKind {
    Move,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DragState {
    Idle,
    Dragging {
        kind: DragKind,
        client: ClientId,
        start_pointer: Point,
        start_geometry: Rect,
    },
}

impl DragState {
    pub(crate) fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}

impl Reactor {
    pub(crate) fn start_drag(&mut self, kind: DragKind, pointer: Option<Point>) {
        let Some(pointer) = pointer else {
            warn!(?kind, "drag command without a pointer position, ignoring");
            return;
        };
        let index = self.workspace.current_desktop;
        let Some(current) = self.workspace.active_desktop().current else {
            return;
        };
        self.float_for_manual_placement(index, current);
        let start_geometry = self.workspace.client(current).geometry;
        self.drag = DragState::Dragging {
            kind,
            client: current,
            start_pointer: pointer,
            start_geometry,
        };
        debug!(?kind, ?pointer, "drag started");
    }

    pub(crate) fn drag_motion(&mut self, pointer: Point) {
        let DragState::Dragging {
            kind,
            client,
            start_pointer,
            start_geometry,
        } = self.drag
        else {
            return;
        };
        if self.workspace.get_client(client).is_none() {
            self.drag = DragState::Idle;
            return;
        }
        let dx = pointer.x - start_pointer.x;
        let dy = pointer.y - start_pointer.y;
        let geometry = self.workspace.client(client).geometry;
        let proposal = match kind {
            DragKind::Move => Rect::new(
                start_geometry.x + dx,
                start_geometry.y + dy,
                geometry.w,
                geometry.h,
            ),
            DragKind::Resize => Rect::new(
                geometry.x,
                geometry.y,
                start_geometry.w + dx,
                start_geometry.h + dy,
            ),
        };
        let index = self.workspace.current_desktop;
        self.resize_client(index, client, proposal, true);
    }

    pub(crate) fn end_drag(&mut self) {
        if self.drag.is_dragging() {
            trace!("drag ended");
            self.drag = DragState::Idle;
        }
    }

    /// Manual placement (a drag or a keyboard move/resize) pulls a tiled
    /// window out of the layout first: it becomes floating, the remaining
    /// windows re-tile, and focus directives refresh the stacking.
    pub(crate) fn float_for_manual_placement(&mut self, index: usize, id: ClientId) {
        let client = self.workspace.client_mut(id);
        if client.floating || client.transient {
            return;
        }
        client.floating = true;
        self.retile(index);
        self.focus(index, Some(id));
    }
}
