//! Decides on-screen geometry for a desktop's windows.
//!
//! `arrange` is the single entry point: given a desktop, the client arena and
//! the available rectangle, it returns a rectangle proposal for every window
//! that participates in tiling. It is deterministic and idempotent; calling
//! it twice with the same inputs yields identical output, which is what lets
//! re-tiling double as self-correction after a missed placement.

pub mod constraints;
pub(crate) mod systems;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use strum_macros::{Display, EnumString};

use crate::model::client::{Client, ClientId};
use crate::model::desktop::Desktop;
use crate::sys::geometry::Rect;
use self::systems::{StackParams, Tile};

/// A desktop's tiling mode.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutKind {
    /// Master column on the left, stack column on the right.
    #[default]
    VerticalStack,
    /// Master row on top, stack row below ("bottom stack").
    HorizontalStack,
    Grid,
    /// Every window fullscreen within the tiling area; focus decides which
    /// one shows.
    Monocle,
    /// No tiling; windows keep their explicitly assigned geometry.
    Floating,
}

/// Propose a rectangle for every tiling-eligible window on the desktop.
///
/// Floating, transient and fullscreen windows are left alone. A single
/// eligible window bypasses the per-mode logic and covers the whole area;
/// the floating mode computes nothing at all.
pub fn arrange(
    area: Rect,
    desktop: &Desktop,
    clients: &SlotMap<ClientId, Client>,
    gap: i32,
) -> Vec<(ClientId, Rect)> {
    if desktop.mode == LayoutKind::Floating || desktop.is_empty() {
        return Vec::new();
    }

    let tiles: Vec<Tile> = desktop
        .order()
        .iter()
        .filter(|&&id| !clients[id].is_fft())
        .map(|&id| Tile {
            id,
            border_width: clients[id].border_width,
        })
        .collect();

    match tiles.len() {
        0 => Vec::new(),
        1 => {
            let t = tiles[0];
            vec![(
                t.id,
                Rect::new(
                    area.x,
                    area.y,
                    area.w - 2 * t.border_width,
                    area.h - 2 * t.border_width,
                ),
            )]
        }
        _ => {
            let params = StackParams {
                master_fraction: desktop.master_fraction,
                master_adjust: desktop.master_adjust,
                stack_adjust: desktop.stack_adjust,
                master_count: desktop.master_count,
                gap,
            };
            match desktop.mode {
                LayoutKind::VerticalStack => systems::stack(area, &tiles, &params, false),
                LayoutKind::HorizontalStack => systems::stack(area, &tiles, &params, true),
                LayoutKind::Grid => systems::grid(area, &tiles, gap),
                LayoutKind::Monocle => systems::monocle(area, &tiles),
                LayoutKind::Floating => unreachable!("handled above"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::client::{SizeHints, WindowHandle, WindowInfo, WindowKind};

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        w: 1200,
        h: 800,
    };

    fn setup(n: u64, mode: LayoutKind) -> (SlotMap<ClientId, Client>, Desktop, Vec<ClientId>) {
        let mut clients: SlotMap<ClientId, Client> = SlotMap::with_key();
        let mut desktop = Desktop::new("t".into(), mode, 0.5, 1, true);
        let ids: Vec<ClientId> = (1..=n)
            .map(|i| {
                clients.insert(Client::new(
                    WindowHandle::new(i),
                    &WindowInfo {
                        geometry: Rect::new(0, 0, 100, 100),
                        class: String::new(),
                        instance: String::new(),
                        title: String::new(),
                        kind: WindowKind::Normal,
                        transient: false,
                        fullscreen: false,
                        above: false,
                        hints: SizeHints::default(),
                    },
                    0,
                ))
            })
            .collect();
        for &id in &ids {
            desktop.attach(id, true);
        }
        (clients, desktop, ids)
    }

    #[test]
    fn floating_mode_computes_nothing() {
        let (clients, desktop, _) = setup(3, LayoutKind::Floating);
        assert!(arrange(AREA, &desktop, &clients, 0).is_empty());
    }

    #[test]
    fn floating_windows_are_excluded() {
        let (mut clients, desktop, ids) = setup(3, LayoutKind::VerticalStack);
        clients[ids[1]].floating = true;
        let placed: Vec<ClientId> = arrange(AREA, &desktop, &clients, 0)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(placed, vec![ids[0], ids[2]]);
    }

    #[test]
    fn transient_and_fullscreen_are_excluded() {
        let (mut clients, desktop, ids) = setup(3, LayoutKind::Grid);
        clients[ids[0]].transient = true;
        clients[ids[2]].fullscreen = true;
        let placed: Vec<ClientId> = arrange(AREA, &desktop, &clients, 0)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(placed, vec![ids[1]]);
    }

    #[test]
    fn lone_window_fills_the_area_in_any_mode() {
        for mode in [
            LayoutKind::VerticalStack,
            LayoutKind::HorizontalStack,
            LayoutKind::Grid,
            LayoutKind::Monocle,
        ] {
            let (clients, desktop, _) = setup(1, mode);
            let rects = arrange(AREA, &desktop, &clients, 10);
            assert_eq!(rects.len(), 1);
            assert_eq!(rects[0].1, AREA, "mode {mode}");
        }
    }

    #[test]
    fn arrange_is_idempotent() {
        for mode in [
            LayoutKind::VerticalStack,
            LayoutKind::HorizontalStack,
            LayoutKind::Grid,
            LayoutKind::Monocle,
        ] {
            let (clients, desktop, _) = setup(5, mode);
            let a = arrange(AREA, &desktop, &clients, 6);
            let b = arrange(AREA, &desktop, &clients, 6);
            assert_eq!(a, b, "mode {mode}");
        }
    }

    #[test]
    fn mode_names_round_trip() {
        use std::str::FromStr;
        assert_eq!(LayoutKind::VerticalStack.to_string(), "vertical_stack");
        assert_eq!(
            LayoutKind::from_str("horizontal_stack").unwrap(),
            LayoutKind::HorizontalStack
        );
        assert!(LayoutKind::from_str("spiral").is_err());
    }
}
