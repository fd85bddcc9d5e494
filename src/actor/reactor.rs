//! The reactor turns windowing-server events into placement decisions.
//!
//! It owns the entire model state and reduces exactly one event at a time:
//! each call to [`Reactor::handle_event`] mutates the workspace, then returns
//! the batch of directives the server collaborator must apply. Nothing else
//! observes intermediate state, so every mutation is atomic as far as the
//! outside world can tell.

pub mod command;
pub(crate) mod drag;
pub mod replay;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::config::{Config, Modifiers};
use crate::layout_engine::{self, LayoutKind, constraints};
use crate::model::client::{ClientId, SizeHints, WindowHandle, WindowInfo};
use crate::model::focus::BorderColor;
use crate::model::workspace::Workspace;
use crate::sys::geometry::{Point, Rect};
use self::command::WmCommand;
use self::drag::DragState;
use self::replay::Record;

bitflags! {
    /// Which fields of a configure request the client actually set.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ConfigureMask: u8 {
        const X            = 1 << 0;
        const Y            = 1 << 1;
        const WIDTH        = 1 << 2;
        const HEIGHT       = 1 << 3;
        const BORDER_WIDTH = 1 << 4;
    }
}

/// A property change reported by the server collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Urgency(bool),
    SizeHints(SizeHints),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StateAction {
    Add,
    Remove,
    Toggle,
}

/// Client-to-manager messages (the _NET_WM_STATE / _NET_ACTIVE_WINDOW family).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessageKind {
    Fullscreen(StateAction),
    DemandsAttention(StateAction),
    Activate,
    Close,
    CurrentDesktop(usize),
}

/// The abstract event set consumed from the windowing server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Screen geometry. Always the first event sent on startup; sent again
    /// whenever the resolution changes.
    ScreenParametersChanged(Rect),

    /// A window asked to be displayed (map request).
    WindowCreateRequest {
        handle: WindowHandle,
        info: WindowInfo,
    },

    WindowDestroyed(WindowHandle),

    /// A window was unmapped. `client_initiated` marks the synthetic unmap a
    /// client sends to request withdrawal; real unmaps remove the client.
    WindowUnmapped {
        handle: WindowHandle,
        client_initiated: bool,
    },

    ConfigureRequest {
        handle: WindowHandle,
        geometry: Rect,
        border_width: i32,
        mask: ConfigureMask,
    },

    /// A pointer button went down. `handle` is the window under the pointer,
    /// or `None` for the root.
    PointerButton {
        handle: Option<WindowHandle>,
        button: u8,
        modifiers: Modifiers,
        position: Point,
    },

    /// Pointer movement. Only meaningful during an interactive drag; ignored
    /// otherwise.
    PointerMotion(Point),

    PointerButtonReleased,

    /// The pointer entered a window. Drives focus-follows-mouse.
    PointerEnter(WindowHandle),

    KeyPress {
        keysym: String,
        modifiers: Modifiers,
    },

    /// Some client grabbed input focus behind our back; we take it back.
    FocusStolen(WindowHandle),

    PropertyChanged {
        handle: WindowHandle,
        property: Property,
    },

    ClientStateMessage {
        handle: WindowHandle,
        kind: ClientMessageKind,
    },

    /// A user command injected directly, bypassing the key bindings.
    Command(WmCommand),
}

/// Directives emitted to the server collaborator. The reducer is the only
/// producer; a batch is complete by the time it is handed out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    PlaceWindow {
        handle: WindowHandle,
        geometry: Rect,
        border_width: i32,
    },
    SetBorderColor {
        handle: WindowHandle,
        color: BorderColor,
    },
    /// Restack bottom to top.
    Restack(Vec<WindowHandle>),
    SetInputFocus(Option<WindowHandle>),
    MapWindow(WindowHandle),
    UnmapWindow(WindowHandle),
    SendCloseProtocol(WindowHandle),
    PublishActiveWindow(Option<WindowHandle>),
    PublishClientList(Vec<WindowHandle>),
    PublishCurrentDesktop(usize),
    PublishDesktopCount(usize),
    PublishDesktopNames(Vec<String>),
    PublishWindowDesktop {
        handle: WindowHandle,
        desktop: usize,
    },
}

const DEFAULT_SCREEN: Rect = Rect {
    x: 0,
    y: 0,
    w: 1920,
    h: 1080,
};

pub struct Reactor {
    pub(crate) config: Config,
    pub(crate) workspace: Workspace,
    screen: Rect,
    pub(crate) drag: DragState,
    /// Events held back while a drag is in progress, replayed in order once
    /// it ends.
    deferred: Vec<Event>,
    directives: Vec<Directive>,
    record: Record,
    pub(crate) exit_code: Option<i32>,
}

impl Reactor {
    pub fn new(config: Config) -> Self {
        Self::with_record(config, Record::disabled())
    }

    pub fn with_record(config: Config, record: Record) -> Self {
        let workspace = Workspace::new(&config);
        Reactor {
            config,
            workspace,
            screen: DEFAULT_SCREEN,
            drag: DragState::Idle,
            deferred: Vec::new(),
            directives: Vec::new(),
            record,
            exit_code: None,
        }
    }

    /// Publish the static desktop layout and switch to the configured
    /// default desktop. Call once before feeding events.
    pub fn startup(&mut self) -> Vec<Directive> {
        let names: Vec<String> = self.workspace.desktops.iter().map(|d| d.name.clone()).collect();
        self.emit(Directive::PublishDesktopCount(names.len()));
        self.emit(Directive::PublishDesktopNames(names));
        self.emit(Directive::PublishCurrentDesktop(self.workspace.current_desktop));
        let default = self.config.settings.default_desktop;
        if default < self.workspace.desktops.len() {
            self.change_desktop(default);
        }
        std::mem::take(&mut self.directives)
    }

    /// Set once a quit command has been processed; the driver loop exits
    /// with this code.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Reduce one event to completion and return the resulting directives.
    pub fn handle_event(&mut self, event: Event) -> Vec<Directive> {
        self.record.on_event(&event);
        self.log_event(&event);

        if self.drag.is_dragging() {
            match &event {
                Event::PointerMotion(_)
                | Event::PointerButtonReleased
                | Event::WindowCreateRequest { .. }
                | Event::ConfigureRequest { .. } => {}
                Event::PointerButton { .. } => {
                    // Extra button presses during a drag are swallowed, like
                    // a pointer grab would.
                    return Vec::new();
                }
                _ => {
                    trace!("deferring event until the drag ends");
                    self.deferred.push(event);
                    return Vec::new();
                }
            }
        }

        self.reduce(event);
        while !self.drag.is_dragging() && !self.deferred.is_empty() {
            let next = self.deferred.remove(0);
            debug!(?next, "replaying deferred event");
            self.reduce(next);
        }
        std::mem::take(&mut self.directives)
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::PointerMotion(..) => trace!(?event, "event"),
            _ => debug!(?event, "event"),
        }
    }

    fn reduce(&mut self, event: Event) {
        match event {
            Event::ScreenParametersChanged(screen) => {
                self.screen = screen;
                self.retile(self.workspace.current_desktop);
            }
            Event::WindowCreateRequest { handle, info } => self.on_create_request(handle, info),
            Event::WindowDestroyed(handle) => {
                if let Some((index, id)) = self.workspace.find_window(handle) {
                    self.remove_client(index, id);
                }
            }
            Event::WindowUnmapped {
                handle,
                client_initiated,
            } => {
                // Client-initiated unmaps are the withdrawal handshake; the
                // destroy that usually follows does the cleanup.
                if !client_initiated {
                    if let Some((index, id)) = self.workspace.find_window(handle) {
                        self.remove_client(index, id);
                    }
                }
            }
            Event::ConfigureRequest {
                handle,
                geometry,
                border_width,
                mask,
            } => self.on_configure_request(handle, geometry, border_width, mask),
            Event::PointerButton {
                handle,
                button,
                modifiers,
                position,
            } => self.on_pointer_button(handle, button, modifiers, position),
            Event::PointerMotion(position) => self.drag_motion(position),
            Event::PointerButtonReleased => self.end_drag(),
            Event::PointerEnter(handle) => self.on_pointer_enter(handle),
            Event::KeyPress { keysym, modifiers } => {
                if let Some(command) = self.config.command_for_key(modifiers, &keysym).copied() {
                    self.run_command(command, None);
                }
            }
            Event::FocusStolen(handle) => {
                let index = self.workspace.current_desktop;
                if let Some(current) = self.workspace.active_desktop().current {
                    if self.workspace.client(current).handle != handle {
                        self.focus(index, Some(current));
                    }
                }
            }
            Event::PropertyChanged { handle, property } => {
                self.on_property_changed(handle, property)
            }
            Event::ClientStateMessage { handle, kind } => self.on_client_message(handle, kind),
            Event::Command(command) => self.run_command(command, None),
        }
    }

    pub(crate) fn emit(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// The rectangle tiling may use on a desktop: the screen minus the panel
    /// strip when the panel is visible there.
    pub(crate) fn tiling_area(&self, index: usize) -> Rect {
        let desktop = self.workspace.desktop(index);
        let mut area = self.screen;
        let panel = self.config.settings.panel_height;
        if desktop.show_panel && panel > 0 {
            area.h -= panel;
            if self.config.settings.panel_at_top {
                area.y += panel;
            }
        }
        area
    }

    /// Re-tile a desktop, emitting placements for every window whose
    /// admissible rectangle differs from its current geometry.
    pub(crate) fn retile(&mut self, index: usize) {
        let area = self.tiling_area(index);
        let gap = self.config.settings.gap;
        let proposals = layout_engine::arrange(
            area,
            self.workspace.desktop(index),
            self.workspace.clients(),
            gap,
        );
        for (id, rect) in proposals {
            self.resize_client(index, id, rect, false);
        }
    }

    /// Run a proposed rectangle through the constraint solver and place the
    /// window if anything changed.
    pub(crate) fn resize_client(
        &mut self,
        index: usize,
        id: ClientId,
        proposal: Rect,
        interactive: bool,
    ) {
        let client = self.workspace.client(id);
        let honor = self.config.settings.resize_hints
            || client.floating
            || self.workspace.desktop(index).mode == LayoutKind::Floating;
        let (rect, changed) = constraints::apply_constraints(
            client,
            proposal,
            self.screen,
            interactive,
            honor,
            self.config.settings.min_window_size,
        );
        if changed {
            self.place_client(id, rect);
        }
    }

    /// Unconditionally assign a geometry and tell the collaborator.
    pub(crate) fn place_client(&mut self, id: ClientId, rect: Rect) {
        let client = self.workspace.client_mut(id);
        client.saved_geometry = client.geometry;
        client.geometry = rect;
        let handle = client.handle;
        let border_width = client.border_width;
        self.emit(Directive::PlaceWindow {
            handle,
            geometry: rect,
            border_width,
        });
    }

    /// Move focus on a desktop. References always update; directives are
    /// only emitted for the active desktop, so hidden desktops never steal
    /// input focus.
    pub(crate) fn focus(&mut self, index: usize, target: Option<ClientId>) {
        let update = self.workspace.focus(index, target);
        if index != self.workspace.current_desktop {
            return;
        }
        for (handle, color) in update.border_colors {
            self.emit(Directive::SetBorderColor { handle, color });
        }
        if !update.restack.is_empty() {
            self.emit(Directive::Restack(update.restack));
        }
        self.emit(Directive::SetInputFocus(update.input_focus));
        self.emit(Directive::PublishActiveWindow(update.active_window));
    }

    fn publish_client_list(&mut self) {
        let handles = self.workspace.all_handles();
        self.emit(Directive::PublishClientList(handles));
    }

    fn on_create_request(&mut self, handle: WindowHandle, info: WindowInfo) {
        if self.workspace.find_window(handle).is_some() {
            return;
        }
        if info.kind.is_unmanaged() {
            // Docks and desktop windows are shown but never managed.
            self.emit(Directive::MapWindow(handle));
            return;
        }

        let mut target = self.workspace.current_desktop;
        let mut follow = false;
        let mut rule_floating = false;
        let mut at_end = false;
        if let Some(rule) = self.config.matching_rule(&info.class, &info.instance, &info.title) {
            if let Some(desktop) = rule.desktop {
                if desktop < self.workspace.desktops.len() {
                    target = desktop;
                }
            }
            follow = rule.follow;
            rule_floating = rule.floating;
            at_end = rule.attach_at_end;
        }

        let border_width = self.config.settings.border_width;
        let id = self.workspace.create_client(target, handle, &info, border_width, at_end);

        let floating_mode = self.workspace.desktop(target).mode == LayoutKind::Floating;
        let center = {
            let client = self.workspace.client_mut(id);
            if client.fixed_size || rule_floating || floating_mode {
                client.floating = true;
            }
            client.floating && !client.transient
        };
        if center {
            // Explicitly floating windows open centered; size is theirs.
            let g = self.workspace.client(id).geometry;
            let centered = Rect::new(
                (self.screen.w - g.w) / 2,
                (self.screen.h - g.h) / 2,
                g.w,
                g.h,
            );
            self.place_client(id, centered);
        }
        if info.kind.forces_floating() || info.above {
            self.workspace.client_mut(id).floating = true;
        }
        if info.fullscreen {
            self.set_fullscreen(target, id, true);
        }

        if target == self.workspace.current_desktop {
            if !self.workspace.client(id).is_fft() {
                self.retile(target);
            }
            self.emit(Directive::MapWindow(handle));
        } else if follow {
            self.change_desktop(target);
        }
        self.publish_client_list();
        self.emit(Directive::PublishWindowDesktop {
            handle,
            desktop: target,
        });
        self.focus(target, Some(id));
    }

    /// Drop a client and fulfill the refocus/retile obligations of removal.
    fn remove_client(&mut self, index: usize, id: ClientId) {
        let was_current = self.workspace.desktop(index).current == Some(id);
        let Some(client) = self.workspace.remove_client(id) else {
            return;
        };
        let remaining = self.workspace.desktop(index).len();
        if was_current || remaining <= 1 {
            let target = self.workspace.desktop(index).previous;
            self.focus(index, target);
        }
        if !(client.floating || client.transient) || remaining <= 1 {
            self.retile(index);
        }
        self.publish_client_list();
    }

    fn on_configure_request(
        &mut self,
        handle: WindowHandle,
        geometry: Rect,
        border_width: i32,
        mask: ConfigureMask,
    ) {
        let Some((index, id)) = self.workspace.find_window(handle) else {
            // Not ours; pass the request through untouched.
            self.emit(Directive::PlaceWindow {
                handle,
                geometry,
                border_width,
            });
            return;
        };

        if mask.contains(ConfigureMask::BORDER_WIDTH) {
            self.workspace.client_mut(id).border_width = border_width;
            return;
        }

        let floating = self.workspace.client(id).floating
            || self.workspace.desktop(index).mode == LayoutKind::Floating;
        if floating {
            let old = self.workspace.client(id).geometry;
            let mut g = old;
            if mask.contains(ConfigureMask::X) {
                g.x = geometry.x;
            }
            if mask.contains(ConfigureMask::Y) {
                g.y = geometry.y;
            }
            if mask.contains(ConfigureMask::WIDTH) {
                g.w = geometry.w;
            }
            if mask.contains(ConfigureMask::HEIGHT) {
                g.h = geometry.h;
            }
            // Floating windows that end up off-screen are centered back.
            if g.right() > self.screen.w && self.workspace.client(id).floating {
                g.x = self.screen.w / 2 - g.w / 2;
            }
            if g.bottom() > self.screen.h && self.workspace.client(id).floating {
                g.y = self.screen.h / 2 - g.h / 2;
            }
            {
                let client = self.workspace.client_mut(id);
                client.saved_geometry = old;
                client.geometry = g;
            }
            let bw = self.workspace.client(id).border_width;
            self.emit(Directive::PlaceWindow {
                handle,
                geometry: g,
                border_width: bw,
            });
        } else {
            // Tiled windows only get their imposed geometry confirmed.
            let client = self.workspace.client(id);
            let (geometry, border_width) = (client.geometry, client.border_width);
            self.emit(Directive::PlaceWindow {
                handle,
                geometry,
                border_width,
            });
        }
    }

    fn on_pointer_button(
        &mut self,
        handle: Option<WindowHandle>,
        button: u8,
        modifiers: Modifiers,
        position: Point,
    ) {
        let clicked = handle.and_then(|h| self.workspace.find_window(h));
        if let Some((index, id)) = clicked {
            self.focus(index, Some(id));
        }
        if clicked.is_some() {
            if let Some(command) = self.config.command_for_button(modifiers, button).copied() {
                self.run_command(command, Some(position));
            }
        }
    }

    fn on_pointer_enter(&mut self, handle: WindowHandle) {
        if !self.config.settings.focus_follows_mouse {
            return;
        }
        let Some((index, id)) = self.workspace.find_window(handle) else {
            return;
        };
        if index != self.workspace.current_desktop {
            return;
        }
        if self.workspace.desktop(index).current == Some(id) {
            return;
        }
        self.focus(index, Some(id));
    }

    fn on_property_changed(&mut self, handle: WindowHandle, property: Property) {
        let Some((index, id)) = self.workspace.find_window(handle) else {
            return;
        };
        match property {
            Property::Urgency(urgent) => {
                let is_active_current = index == self.workspace.current_desktop
                    && self.workspace.desktop(index).current == Some(id);
                self.workspace.client_mut(id).urgent = urgent && !is_active_current;
            }
            Property::SizeHints(hints) => {
                self.workspace.client_mut(id).set_hints(hints);
            }
        }
    }

    fn on_client_message(&mut self, handle: WindowHandle, kind: ClientMessageKind) {
        if let ClientMessageKind::Close = kind {
            // Honored even for unmanaged windows.
            self.emit(Directive::SendCloseProtocol(handle));
            return;
        }
        if let ClientMessageKind::CurrentDesktop(index) = kind {
            self.change_desktop(index);
            return;
        }
        let Some((index, id)) = self.workspace.find_window(handle) else {
            return;
        };
        match kind {
            ClientMessageKind::Fullscreen(action) => {
                let fullscreen = self.workspace.client(id).fullscreen;
                let make = match action {
                    StateAction::Add => true,
                    StateAction::Remove => false,
                    StateAction::Toggle => !fullscreen,
                };
                self.set_fullscreen(index, id, make);
                let client = self.workspace.client(id);
                if !(client.floating || client.transient)
                    || self.workspace.desktop(index).len() <= 1
                {
                    self.retile(index);
                }
            }
            ClientMessageKind::DemandsAttention(action) => {
                let is_active_current = index == self.workspace.current_desktop
                    && self.workspace.desktop(index).current == Some(id);
                let client = self.workspace.client_mut(id);
                let set = match action {
                    StateAction::Add => true,
                    StateAction::Remove => false,
                    StateAction::Toggle => !client.urgent,
                };
                client.urgent = set && !is_active_current;
            }
            ClientMessageKind::Activate => self.focus(index, Some(id)),
            ClientMessageKind::Close | ClientMessageKind::CurrentDesktop(_) => unreachable!(),
        }
    }

    /// Fullscreen covers the whole screen borderless; leaving it restores
    /// the border, the saved geometry, and the tiled state.
    pub(crate) fn set_fullscreen(&mut self, index: usize, id: ClientId, fullscreen: bool) {
        if fullscreen {
            {
                let client = self.workspace.client_mut(id);
                client.fullscreen = true;
                client.saved_border_width = client.border_width;
                client.border_width = 0;
                client.floating = true;
            }
            self.place_client(id, self.screen);
        } else {
            let restore = {
                let client = self.workspace.client_mut(id);
                client.fullscreen = false;
                client.border_width = client.saved_border_width;
                client.floating = false;
                client.saved_geometry
            };
            self.place_client(id, restore);
            self.retile(index);
        }
    }

    /// Switch the active desktop. Windows of the incoming desktop are mapped
    /// before the outgoing ones are unmapped (current first in, current last
    /// out) so the transition never flashes an empty screen.
    pub(crate) fn change_desktop(&mut self, index: usize) {
        if index == self.workspace.current_desktop || index >= self.workspace.desktops.len() {
            return;
        }
        self.workspace.previous_desktop = self.workspace.current_desktop;
        self.workspace.current_desktop = index;
        let old = self.workspace.previous_desktop;

        let new_current = self.workspace.desktop(index).current;
        if let Some(id) = new_current {
            let handle = self.workspace.client(id).handle;
            self.emit(Directive::MapWindow(handle));
        }
        let to_map: Vec<WindowHandle> = self
            .workspace
            .desktop(index)
            .order()
            .iter()
            .filter(|&&id| Some(id) != new_current)
            .map(|&id| self.workspace.client(id).handle)
            .collect();
        for handle in to_map {
            self.emit(Directive::MapWindow(handle));
        }

        let old_current = self.workspace.desktop(old).current;
        let to_unmap: Vec<WindowHandle> = self
            .workspace
            .desktop(old)
            .order()
            .iter()
            .filter(|&&id| Some(id) != old_current)
            .map(|&id| self.workspace.client(id).handle)
            .collect();
        for handle in to_unmap {
            self.emit(Directive::UnmapWindow(handle));
        }
        if let Some(id) = old_current {
            let handle = self.workspace.client(id).handle;
            self.emit(Directive::UnmapWindow(handle));
        }

        if !self.workspace.desktop(index).is_empty() {
            self.retile(index);
            self.focus(index, new_current);
        } else {
            self.focus(index, None);
        }
        self.emit(Directive::PublishCurrentDesktop(index));
    }

    /// Send the current window to another desktop (always appended there).
    pub(crate) fn client_to_desktop(&mut self, index: usize) {
        let current_desktop = self.workspace.current_desktop;
        if index == current_desktop || index >= self.workspace.desktops.len() {
            return;
        }
        let Some(id) = self.workspace.active_desktop().current else {
            return;
        };
        let handle = self.workspace.client(id).handle;

        self.workspace.transfer(current_desktop, index, id, true);
        self.emit(Directive::UnmapWindow(handle));

        let source_previous = self.workspace.desktop(current_desktop).previous;
        self.focus(current_desktop, source_previous);

        let client = self.workspace.client(id);
        if !(client.floating || client.transient)
            || self.workspace.desktop(current_desktop).len() <= 1
        {
            self.retile(current_desktop);
        }
        self.emit(Directive::PublishWindowDesktop {
            handle,
            desktop: index,
        });
        // Make it current on the destination; no directives are emitted for
        // the hidden desktop.
        self.focus(index, Some(id));

        if self.config.settings.follow_window {
            self.change_desktop(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::AppRule;
    use crate::model::client::WindowKind;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        w: 1000,
        h: 1000,
    };

    fn test_config() -> Config {
        let mut config = Config::default_config();
        config.settings.border_width = 0;
        config.settings.gap = 0;
        config.settings.panel_height = 0;
        config.settings.min_window_size = 10;
        for desktop in &mut config.desktops {
            desktop.master_fraction = 0.5;
        }
        config
    }

    fn reactor_with(config: Config) -> Reactor {
        let mut reactor = Reactor::new(config);
        reactor.startup();
        reactor.handle_event(Event::ScreenParametersChanged(SCREEN));
        reactor
    }

    fn reactor() -> Reactor {
        reactor_with(test_config())
    }

    fn window_info(geometry: Rect) -> WindowInfo {
        WindowInfo {
            geometry,
            class: "term".into(),
            instance: "term".into(),
            title: "term".into(),
            kind: WindowKind::Normal,
            transient: false,
            fullscreen: false,
            above: false,
            hints: SizeHints::default(),
        }
    }

    fn create(reactor: &mut Reactor, handle: u64) -> Vec<Directive> {
        reactor.handle_event(Event::WindowCreateRequest {
            handle: WindowHandle::new(handle),
            info: window_info(Rect::new(10, 10, 300, 200)),
        })
    }

    fn placements(directives: &[Directive]) -> Vec<(u64, Rect)> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::PlaceWindow {
                    handle, geometry, ..
                } => Some((handle.0, *geometry)),
                _ => None,
            })
            .collect()
    }

    fn placement_of(directives: &[Directive], handle: u64) -> Option<Rect> {
        placements(directives)
            .into_iter()
            .rev()
            .find(|(h, _)| *h == handle)
            .map(|(_, r)| r)
    }

    fn input_focus(directives: &[Directive]) -> Option<Option<u64>> {
        directives
            .iter()
            .rev()
            .find_map(|d| match d {
                Directive::SetInputFocus(target) => Some(target.map(|h| h.0)),
                _ => None,
            })
    }

    #[test]
    fn startup_publishes_the_desktop_layout() {
        let mut reactor = Reactor::new(test_config());
        let directives = reactor.startup();
        assert!(directives.contains(&Directive::PublishDesktopCount(4)));
        assert!(directives.contains(&Directive::PublishCurrentDesktop(0)));
        assert!(
            directives
                .iter()
                .any(|d| matches!(d, Directive::PublishDesktopNames(_)))
        );
    }

    #[test]
    fn three_windows_tile_into_master_and_stack() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        let directives = create(&mut reactor, 3);

        // The newest window attaches at the head and takes the master slot.
        assert_eq!(
            placement_of(&directives, 3),
            Some(Rect::new(0, 0, 500, 1000))
        );
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(500, 0, 500, 500))
        );
        assert_eq!(
            placement_of(&directives, 1),
            Some(Rect::new(500, 500, 500, 500))
        );
        assert_eq!(input_focus(&directives), Some(Some(3)));
    }

    #[test]
    fn destroying_the_master_promotes_the_next_window() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        create(&mut reactor, 3);

        let directives = reactor.handle_event(Event::WindowDestroyed(WindowHandle::new(3)));
        // Window 2 moves into the master slot and takes focus.
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(0, 0, 500, 1000))
        );
        assert_eq!(
            placement_of(&directives, 1),
            Some(Rect::new(500, 0, 500, 1000))
        );
        assert_eq!(input_focus(&directives), Some(Some(2)));
    }

    #[test]
    fn removing_the_last_window_clears_focus() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        let directives = reactor.handle_event(Event::WindowDestroyed(WindowHandle::new(1)));
        assert_eq!(input_focus(&directives), Some(None));
        assert!(directives.contains(&Directive::PublishActiveWindow(None)));
        assert!(directives.contains(&Directive::PublishClientList(vec![])));
    }

    #[test]
    fn unknown_handles_are_ignored() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        for event in [
            Event::WindowDestroyed(WindowHandle::new(99)),
            Event::PointerEnter(WindowHandle::new(99)),
            Event::PropertyChanged {
                handle: WindowHandle::new(99),
                property: Property::Urgency(true),
            },
            Event::ClientStateMessage {
                handle: WindowHandle::new(99),
                kind: ClientMessageKind::Activate,
            },
        ] {
            assert_eq!(reactor.handle_event(event), vec![]);
        }
    }

    #[test]
    fn client_initiated_unmap_keeps_the_client() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::WindowUnmapped {
            handle: WindowHandle::new(1),
            client_initiated: true,
        });
        assert!(reactor.workspace.find_window(WindowHandle::new(1)).is_some());

        reactor.handle_event(Event::WindowUnmapped {
            handle: WindowHandle::new(1),
            client_initiated: false,
        });
        assert!(reactor.workspace.find_window(WindowHandle::new(1)).is_none());
    }

    #[test]
    fn float_toggle_keeps_the_sequence_position() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        create(&mut reactor, 3);

        // Window 3 (current, master) floats: the others re-tile, 3 keeps its
        // last geometry as its live floating geometry.
        let directives = reactor.handle_event(Event::Command(WmCommand::ToggleFloat));
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(0, 0, 500, 1000))
        );
        assert_eq!(placement_of(&directives, 3), None);
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(3)).unwrap();
        assert_eq!(
            reactor.workspace.client(id).geometry,
            Rect::new(0, 0, 500, 1000)
        );

        // Toggling back re-enters at the head: window 3 is master again. Its
        // geometry already matches the master slot, so only the stack windows
        // get new placements.
        let directives = reactor.handle_event(Event::Command(WmCommand::ToggleFloat));
        assert_eq!(placement_of(&directives, 3), None);
        assert_eq!(
            reactor.workspace.client(id).geometry,
            Rect::new(0, 0, 500, 1000)
        );
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(500, 0, 500, 500))
        );
        assert_eq!(
            placement_of(&directives, 1),
            Some(Rect::new(500, 500, 500, 500))
        );
    }

    #[test]
    fn fullscreen_covers_the_screen_and_restores() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);

        let directives = reactor.handle_event(Event::ClientStateMessage {
            handle: WindowHandle::new(2),
            kind: ClientMessageKind::Fullscreen(StateAction::Add),
        });
        assert!(directives.iter().any(|d| matches!(
            d,
            Directive::PlaceWindow {
                handle: WindowHandle(2),
                geometry,
                border_width: 0,
            } if *geometry == SCREEN
        )));

        let before = {
            let (_, id) = reactor.workspace.find_window(WindowHandle::new(2)).unwrap();
            assert!(reactor.workspace.client(id).fullscreen);
            reactor.workspace.client(id).saved_geometry
        };
        let directives = reactor.handle_event(Event::ClientStateMessage {
            handle: WindowHandle::new(2),
            kind: ClientMessageKind::Fullscreen(StateAction::Toggle),
        });
        assert_eq!(placement_of(&directives, 2), Some(before));
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(2)).unwrap();
        assert!(!reactor.workspace.client(id).fullscreen);
        assert!(!reactor.workspace.client(id).floating);
    }

    #[test]
    fn desktop_switch_maps_before_unmapping() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::Command(WmCommand::ChangeDesktop(1)));
        create(&mut reactor, 2);

        let directives = reactor.handle_event(Event::Command(WmCommand::ChangeDesktop(0)));
        let map_pos = directives
            .iter()
            .position(|d| *d == Directive::MapWindow(WindowHandle::new(1)))
            .expect("window 1 must be mapped");
        let unmap_pos = directives
            .iter()
            .position(|d| *d == Directive::UnmapWindow(WindowHandle::new(2)))
            .expect("window 2 must be unmapped");
        assert!(map_pos < unmap_pos, "map new before unmapping old");
        assert!(directives.contains(&Directive::PublishCurrentDesktop(0)));
        assert_eq!(input_focus(&directives), Some(Some(1)));
    }

    #[test]
    fn invalid_desktop_switches_are_ignored() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        assert_eq!(
            reactor.handle_event(Event::Command(WmCommand::ChangeDesktop(0))),
            vec![]
        );
        assert_eq!(
            reactor.handle_event(Event::Command(WmCommand::ChangeDesktop(9))),
            vec![]
        );
        assert_eq!(
            reactor.handle_event(Event::Command(WmCommand::ClientToDesktop(9))),
            vec![]
        );
    }

    #[test]
    fn client_to_desktop_transfers_and_refocuses() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);

        let directives = reactor.handle_event(Event::Command(WmCommand::ClientToDesktop(1)));
        assert!(directives.contains(&Directive::UnmapWindow(WindowHandle::new(2))));
        assert!(directives.contains(&Directive::PublishWindowDesktop {
            handle: WindowHandle::new(2),
            desktop: 1,
        }));
        // The remaining window takes focus and the whole screen.
        assert_eq!(input_focus(&directives), Some(Some(1)));
        assert_eq!(placement_of(&directives, 1), Some(SCREEN));

        let (desktop, id) = reactor.workspace.find_window(WindowHandle::new(2)).unwrap();
        assert_eq!(desktop, 1);
        assert_eq!(reactor.workspace.desktop(1).current, Some(id));
    }

    #[test]
    fn app_rules_pick_desktop_and_floating() {
        let mut config = test_config();
        config.rules.push(AppRule {
            class: Some("gimp".into()),
            desktop: Some(1),
            floating: true,
            attach_at_end: true,
            ..Default::default()
        });
        let mut reactor = reactor_with(config);

        let mut info = window_info(Rect::new(0, 0, 400, 300));
        info.class = "gimp".into();
        let directives = reactor.handle_event(Event::WindowCreateRequest {
            handle: WindowHandle::new(7),
            info,
        });

        let (desktop, id) = reactor.workspace.find_window(WindowHandle::new(7)).unwrap();
        assert_eq!(desktop, 1);
        assert!(reactor.workspace.client(id).floating);
        // Centered on open, but not mapped: its desktop is not active.
        assert_eq!(
            placement_of(&directives, 7),
            Some(Rect::new(300, 350, 400, 300))
        );
        assert!(!directives.contains(&Directive::MapWindow(WindowHandle::new(7))));
        assert_eq!(reactor.workspace.current_desktop, 0);
    }

    #[test]
    fn docks_are_mapped_but_never_managed() {
        let mut reactor = reactor();
        let mut info = window_info(Rect::new(0, 0, 1000, 24));
        info.kind = WindowKind::Dock;
        let directives = reactor.handle_event(Event::WindowCreateRequest {
            handle: WindowHandle::new(5),
            info,
        });
        assert_eq!(directives, vec![Directive::MapWindow(WindowHandle::new(5))]);
        assert!(reactor.workspace.find_window(WindowHandle::new(5)).is_none());
    }

    #[test]
    fn configure_request_honors_floating_windows_only() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        reactor.handle_event(Event::Command(WmCommand::ToggleFloat));

        // Window 2 floats: its request is honored.
        let directives = reactor.handle_event(Event::ConfigureRequest {
            handle: WindowHandle::new(2),
            geometry: Rect::new(40, 50, 320, 240),
            border_width: 0,
            mask: ConfigureMask::X | ConfigureMask::Y | ConfigureMask::WIDTH | ConfigureMask::HEIGHT,
        });
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(40, 50, 320, 240))
        );

        // Window 1 is tiled: it only gets its imposed geometry confirmed.
        let imposed = {
            let (_, id) = reactor.workspace.find_window(WindowHandle::new(1)).unwrap();
            reactor.workspace.client(id).geometry
        };
        let directives = reactor.handle_event(Event::ConfigureRequest {
            handle: WindowHandle::new(1),
            geometry: Rect::new(1, 2, 30, 40),
            border_width: 0,
            mask: ConfigureMask::X | ConfigureMask::Y | ConfigureMask::WIDTH | ConfigureMask::HEIGHT,
        });
        assert_eq!(placement_of(&directives, 1), Some(imposed));
    }

    #[test]
    fn unmanaged_configure_requests_pass_through() {
        let mut reactor = reactor();
        let directives = reactor.handle_event(Event::ConfigureRequest {
            handle: WindowHandle::new(42),
            geometry: Rect::new(1, 2, 3, 4),
            border_width: 5,
            mask: ConfigureMask::all(),
        });
        assert_eq!(
            directives,
            vec![Directive::PlaceWindow {
                handle: WindowHandle::new(42),
                geometry: Rect::new(1, 2, 3, 4),
                border_width: 5,
            }]
        );
    }

    #[test]
    fn key_bindings_dispatch_commands() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        // Default binding: mod4+j is focus_next. Current is window 2 (head);
        // its circular successor is window 1.
        let directives = reactor.handle_event(Event::KeyPress {
            keysym: "j".into(),
            modifiers: Modifiers::SUPER,
        });
        assert_eq!(input_focus(&directives), Some(Some(1)));

        let directives = reactor.handle_event(Event::KeyPress {
            keysym: "j".into(),
            modifiers: Modifiers::SUPER,
        });
        assert_eq!(input_focus(&directives), Some(Some(2)));
    }

    #[test]
    fn urgency_is_set_and_cleared_by_focus() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);

        reactor.handle_event(Event::PropertyChanged {
            handle: WindowHandle::new(1),
            property: Property::Urgency(true),
        });
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(1)).unwrap();
        assert!(reactor.workspace.client(id).urgent);

        let directives = reactor.handle_event(Event::Command(WmCommand::FocusUrgent));
        assert_eq!(input_focus(&directives), Some(Some(1)));
        assert!(!reactor.workspace.client(id).urgent);
    }

    #[test]
    fn urgency_never_sticks_to_the_focused_window() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::PropertyChanged {
            handle: WindowHandle::new(1),
            property: Property::Urgency(true),
        });
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(1)).unwrap();
        assert!(!reactor.workspace.client(id).urgent);
    }

    #[test]
    fn focus_stolen_is_taken_back() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        let directives = reactor.handle_event(Event::FocusStolen(WindowHandle::new(1)));
        assert_eq!(input_focus(&directives), Some(Some(2)));

        // A report about the current window itself changes nothing.
        let directives = reactor.handle_event(Event::FocusStolen(WindowHandle::new(2)));
        assert_eq!(directives, vec![]);
    }

    #[test]
    fn focus_follows_mouse_when_enabled() {
        let mut config = test_config();
        config.settings.focus_follows_mouse = true;
        let mut reactor = reactor_with(config);
        create(&mut reactor, 1);
        create(&mut reactor, 2);

        let directives = reactor.handle_event(Event::PointerEnter(WindowHandle::new(1)));
        assert_eq!(input_focus(&directives), Some(Some(1)));
        // Entering the already-current window is a no-op.
        let directives = reactor.handle_event(Event::PointerEnter(WindowHandle::new(1)));
        assert_eq!(directives, vec![]);
    }

    #[test]
    fn drag_floats_moves_and_defers_other_events() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);

        // mod4+button1 starts a move on the clicked window.
        reactor.handle_event(Event::PointerButton {
            handle: Some(WindowHandle::new(2)),
            button: 1,
            modifiers: Modifiers::SUPER,
            position: Point::new(100, 100),
        });
        assert!(reactor.drag.is_dragging());
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(2)).unwrap();
        assert!(reactor.workspace.client(id).floating);
        let start = reactor.workspace.client(id).geometry;

        let directives = reactor.handle_event(Event::PointerMotion(Point::new(130, 150)));
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(start.x + 30, start.y + 50, start.w, start.h))
        );

        // A destroy arriving mid-drag is deferred...
        let directives = reactor.handle_event(Event::WindowDestroyed(WindowHandle::new(1)));
        assert_eq!(directives, vec![]);
        assert!(reactor.workspace.find_window(WindowHandle::new(1)).is_some());

        // ...and replayed in order once the button is released.
        let directives = reactor.handle_event(Event::PointerButtonReleased);
        assert!(!reactor.drag.is_dragging());
        assert!(reactor.workspace.find_window(WindowHandle::new(1)).is_none());
        assert!(directives.contains(&Directive::PublishClientList(vec![WindowHandle::new(2)])));
    }

    #[test]
    fn resize_drag_grows_from_the_anchor() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::PointerButton {
            handle: Some(WindowHandle::new(1)),
            button: 3,
            modifiers: Modifiers::SUPER,
            position: Point::new(500, 500),
        });
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(1)).unwrap();
        let start = reactor.workspace.client(id).geometry;

        let directives = reactor.handle_event(Event::PointerMotion(Point::new(440, 420)));
        assert_eq!(
            placement_of(&directives, 1),
            Some(Rect::new(start.x, start.y, start.w - 60, start.h - 80))
        );
    }

    #[test]
    fn move_resize_command_floats_the_window_first() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        let directives = reactor.handle_event(Event::Command(WmCommand::MoveResize {
            dx: 10,
            dy: 20,
            dw: -30,
            dh: 0,
        }));
        let (_, id) = reactor.workspace.find_window(WindowHandle::new(2)).unwrap();
        assert!(reactor.workspace.client(id).floating);
        // Master slot was (0,0,500,1000) before the command.
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(10, 20, 470, 1000))
        );
        // The other window re-tiled to cover the whole screen.
        assert_eq!(placement_of(&directives, 1), Some(SCREEN));
    }

    #[test]
    fn master_count_and_size_adjustments_retile() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        create(&mut reactor, 3);

        let directives =
            reactor.handle_event(Event::Command(WmCommand::AdjustMasterCount(1)));
        // Two masters split the left column, one stack window remains.
        assert_eq!(
            placement_of(&directives, 3),
            Some(Rect::new(0, 0, 500, 500))
        );
        assert_eq!(
            placement_of(&directives, 2),
            Some(Rect::new(0, 500, 500, 500))
        );
        assert_eq!(
            placement_of(&directives, 1),
            Some(Rect::new(500, 0, 500, 1000))
        );

        let directives = reactor.handle_event(Event::Command(WmCommand::ResizeMaster(100)));
        assert_eq!(placement_of(&directives, 1), Some(Rect::new(600, 0, 400, 1000)));

        // An adjustment that would crush the stack side is rejected.
        let directives = reactor.handle_event(Event::Command(WmCommand::ResizeMaster(900)));
        assert_eq!(directives, vec![]);
    }

    #[test]
    fn switch_mode_retiles_with_the_new_layout() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        create(&mut reactor, 2);
        create(&mut reactor, 3);
        create(&mut reactor, 4);

        let directives = reactor.handle_event(Event::Command(WmCommand::SwitchMode(
            LayoutKind::Monocle,
        )));
        let placed = placements(&directives);
        assert_eq!(placed.len(), 4);
        assert!(placed.iter().all(|(_, r)| *r == SCREEN));

        let directives = reactor.handle_event(Event::Command(WmCommand::SwitchMode(
            LayoutKind::Grid,
        )));
        assert_eq!(placements(&directives).len(), 4);
    }

    #[test]
    fn panel_toggle_changes_the_tiling_area() {
        let mut config = test_config();
        config.settings.panel_height = 20;
        let mut reactor = reactor_with(config);
        create(&mut reactor, 1);

        let (_, id) = reactor.workspace.find_window(WindowHandle::new(1)).unwrap();
        assert_eq!(
            reactor.workspace.client(id).geometry,
            Rect::new(0, 20, 1000, 980)
        );

        let directives = reactor.handle_event(Event::Command(WmCommand::TogglePanel));
        assert_eq!(placement_of(&directives, 1), Some(SCREEN));
    }

    #[test]
    fn quit_closes_every_window_and_sets_the_exit_code() {
        let mut reactor = reactor();
        create(&mut reactor, 1);
        reactor.handle_event(Event::Command(WmCommand::ChangeDesktop(1)));
        create(&mut reactor, 2);

        let directives = reactor.handle_event(Event::Command(WmCommand::Quit(3)));
        assert!(directives.contains(&Directive::SendCloseProtocol(WindowHandle::new(1))));
        assert!(directives.contains(&Directive::SendCloseProtocol(WindowHandle::new(2))));
        assert_eq!(reactor.exit_code(), Some(3));
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = Event::WindowCreateRequest {
            handle: WindowHandle::new(9),
            info: window_info(Rect::new(1, 2, 3, 4)),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);

        let directive = Directive::Restack(vec![WindowHandle::new(1), WindowHandle::new(2)]);
        let json = serde_json::to_string(&directive).unwrap();
        let back: Directive = serde_json::from_str(&json).unwrap();
        assert_eq!(directive, back);
    }
}
