//! User commands and their execution.
//!
//! Commands are what key and button bindings resolve to; they can also be
//! injected directly through the event stream (and end up in recordings that
//! way). Execution lives here to keep the reactor's event dispatch readable.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::actor::reactor::drag::DragKind;
use crate::actor::reactor::{Directive, Reactor};
use crate::layout_engine::LayoutKind;
use crate::sys::geometry::Point;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WmCommand {
    ChangeDesktop(usize),
    LastDesktop,
    /// Step to the next (+1) or previous (-1) desktop, wrapping around.
    RotateDesktop(i32),
    /// Like `RotateDesktop`, but skip over empty desktops.
    RotateFilledDesktop(i32),
    ClientToDesktop(usize),
    FocusNext,
    FocusPrev,
    FocusUrgent,
    KillClient,
    MoveDown,
    MoveUp,
    SwapMaster,
    AdjustMasterCount(i32),
    /// Grow or shrink the master area by a pixel amount. Rejected when the
    /// result would squeeze either side below the minimum window size.
    ResizeMaster(i32),
    ResizeStack(i32),
    SwitchMode(LayoutKind),
    ToggleFloat,
    TogglePanel,
    MoveResize {
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
    },
    StartMove,
    StartResize,
    Quit(i32),
}

impl Reactor {
    pub(crate) fn run_command(&mut self, command: WmCommand, pointer: Option<Point>) {
        trace!(?command, "command");
        match command {
            WmCommand::ChangeDesktop(index) => self.change_desktop(index),
            WmCommand::LastDesktop => self.change_desktop(self.workspace.previous_desktop),
            WmCommand::RotateDesktop(dir) => {
                let len = self.workspace.desktops.len() as i32;
                let current = self.workspace.current_desktop as i32;
                self.change_desktop((current + dir).rem_euclid(len) as usize);
            }
            WmCommand::RotateFilledDesktop(dir) => self.rotate_filled(dir),
            WmCommand::ClientToDesktop(index) => self.client_to_desktop(index),
            WmCommand::FocusNext => {
                let desktop = self.workspace.active_desktop();
                if let Some(current) = desktop.current {
                    if desktop.len() > 1 {
                        let next = desktop.circular_successor(current);
                        self.focus(self.workspace.current_desktop, next);
                    }
                }
            }
            WmCommand::FocusPrev => {
                let desktop = self.workspace.active_desktop();
                if let Some(current) = desktop.current {
                    if desktop.len() > 1 {
                        let prev = desktop.predecessor(current);
                        self.focus(self.workspace.current_desktop, prev);
                    }
                }
            }
            WmCommand::FocusUrgent => {
                if let Some((desktop, id)) = self.workspace.find_urgent() {
                    if desktop != self.workspace.current_desktop {
                        self.change_desktop(desktop);
                    }
                    self.focus(desktop, Some(id));
                }
            }
            WmCommand::KillClient => {
                let desktop = self.workspace.active_desktop();
                if let Some(current) = desktop.current {
                    let handle = self.workspace.client(current).handle;
                    self.emit(Directive::SendCloseProtocol(handle));
                }
            }
            WmCommand::MoveDown => self.move_in_stack(true),
            WmCommand::MoveUp => self.move_in_stack(false),
            WmCommand::SwapMaster => {
                let index = self.workspace.current_desktop;
                let desktop = self.workspace.active_desktop_mut();
                let Some(current) = desktop.current else {
                    return;
                };
                if let Some(new_head) = desktop.swap_master() {
                    if !self.workspace.client(current).is_fft() {
                        self.retile(index);
                    }
                    self.focus(index, Some(new_head));
                }
            }
            WmCommand::AdjustMasterCount(delta) => {
                let index = self.workspace.current_desktop;
                let desktop = self.workspace.active_desktop_mut();
                let count = desktop.master_count as i32 + delta;
                if count >= 1 {
                    desktop.master_count = count as usize;
                    self.retile(index);
                }
            }
            WmCommand::ResizeMaster(delta) => self.resize_master(delta),
            WmCommand::ResizeStack(delta) => {
                let index = self.workspace.current_desktop;
                self.workspace.active_desktop_mut().stack_adjust += delta;
                self.retile(index);
            }
            WmCommand::SwitchMode(mode) => {
                let index = self.workspace.current_desktop;
                let desktop = self.workspace.active_desktop_mut();
                if desktop.mode != mode {
                    desktop.mode = mode;
                }
                if !desktop.is_empty() {
                    let current = desktop.current;
                    self.retile(index);
                    self.focus(index, current);
                }
            }
            WmCommand::ToggleFloat => self.toggle_float(),
            WmCommand::TogglePanel => {
                let index = self.workspace.current_desktop;
                let desktop = self.workspace.active_desktop_mut();
                desktop.show_panel = !desktop.show_panel;
                self.retile(index);
            }
            WmCommand::MoveResize { dx, dy, dw, dh } => self.move_resize(dx, dy, dw, dh),
            WmCommand::StartMove => self.start_drag(DragKind::Move, pointer),
            WmCommand::StartResize => self.start_drag(DragKind::Resize, pointer),
            WmCommand::Quit(code) => {
                debug!(code, "quit requested");
                for handle in self.workspace.all_handles() {
                    self.emit(Directive::SendCloseProtocol(handle));
                }
                self.exit_code = Some(code);
            }
        }
    }

    fn rotate_filled(&mut self, dir: i32) {
        if dir == 0 {
            return;
        }
        let len = self.workspace.desktops.len() as i32;
        let current = self.workspace.current_desktop as i32;
        let mut step = dir;
        while step.abs() < len {
            let candidate = (current + step).rem_euclid(len) as usize;
            if !self.workspace.desktop(candidate).is_empty() {
                break;
            }
            step += dir;
        }
        self.change_desktop((current + step).rem_euclid(len) as usize);
    }

    fn move_in_stack(&mut self, down: bool) {
        let index = self.workspace.current_desktop;
        let desktop = self.workspace.active_desktop_mut();
        let Some(current) = desktop.current else {
            return;
        };
        let moved = if down {
            desktop.move_down()
        } else {
            desktop.move_up()
        };
        if moved && !self.workspace.client(current).is_fft() {
            self.retile(index);
        }
    }

    fn resize_master(&mut self, delta: i32) {
        let index = self.workspace.current_desktop;
        let area = self.tiling_area(index);
        let min = self.config.settings.min_window_size;
        let gap = self.config.settings.gap;
        let desktop = self.workspace.active_desktop_mut();
        let extent = if desktop.mode == LayoutKind::HorizontalStack {
            area.h
        } else {
            area.w
        };
        desktop.master_adjust += delta;
        let master = (extent as f32 * desktop.master_fraction) as i32 + desktop.master_adjust;
        if master >= min && extent - master >= min + gap {
            self.retile(index);
        } else {
            // Would leave one side unusably small; take the adjustment back.
            self.workspace.active_desktop_mut().master_adjust -= delta;
        }
    }

    fn toggle_float(&mut self) {
        let index = self.workspace.current_desktop;
        let Some(current) = self.workspace.active_desktop().current else {
            return;
        };
        {
            let client = self.workspace.client_mut(current);
            if client.fullscreen || client.fixed_size {
                return;
            }
            client.floating = !client.floating;
        }
        self.retile(index);
    }

    fn move_resize(&mut self, dx: i32, dy: i32, dw: i32, dh: i32) {
        let index = self.workspace.current_desktop;
        let Some(current) = self.workspace.active_desktop().current else {
            return;
        };
        self.float_for_manual_placement(index, current);
        let g = self.workspace.client(current).geometry;
        let target = crate::sys::geometry::Rect::new(g.x + dx, g.y + dy, g.w + dw, g.h + dh);
        self.place_client(current, target);
    }
}
