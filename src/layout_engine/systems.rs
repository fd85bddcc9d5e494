//! The tiling arrangement algorithms.
//!
//! Each function is pure: the same area, window list and parameters always
//! produce the same rectangles. Rectangles are proposals; the reducer runs
//! them through the constraint solver before anything is placed.

use crate::model::client::ClientId;
use crate::sys::geometry::Rect;

/// A tiling-eligible window as the algorithms see it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tile {
    pub id: ClientId,
    pub border_width: i32,
}

/// Per-desktop knobs consumed by the stack layouts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StackParams {
    pub master_fraction: f32,
    pub master_adjust: i32,
    pub stack_adjust: i32,
    pub master_count: usize,
    pub gap: i32,
}

/// Master/stack split. `horizontal` lays the stack below the masters
/// (bottom-stack); otherwise the stack is a column to the right.
///
/// Masters share the master region equally, integer remainders landing on
/// the later ones. Stack windows share the remaining region equally, except
/// the first absorbs the division remainder plus the stack adjustment, so
/// remainder pixels never open a gap at the trailing edge. The master count
/// is clamped so at least one window stays on the stack side.
pub(crate) fn stack(
    area: Rect,
    tiles: &[Tile],
    params: &StackParams,
    horizontal: bool,
) -> Vec<(ClientId, Rect)> {
    debug_assert!(tiles.len() >= 2, "single windows bypass the stack layout");
    let b = horizontal;
    let gap = params.gap;

    // z: per-window extent along the stack axis; ma: master region size on
    // the perpendicular axis.
    let mut z = if b { area.w } else { area.h };
    let ma = ((if b { area.h } else { area.w }) as f32 * params.master_fraction) as i32
        + params.master_adjust;

    let n = (tiles.len() - 1) as i32;
    let mut nm = params.master_count.max(1) as i32;
    let mut p = 0;
    if n - nm <= 0 {
        nm = n;
    } else {
        let stack_count = n - (nm - 1);
        p = (z - params.stack_adjust) % stack_count + params.stack_adjust;
        z = (z - params.stack_adjust) / stack_count;
    }

    let mut out = Vec::with_capacity(tiles.len());
    let mut iter = tiles.iter();

    let master_extent = if b { area.w } else { area.h };
    let mut consumed = 0;
    for i in 0..nm {
        let t = iter.next().expect("master loop ran past the window list");
        let span = (master_extent - consumed) / (nm - i);
        let rect = if b {
            Rect::new(
                area.x + gap + consumed,
                area.y + gap,
                span - 2 * (t.border_width + gap),
                ma - 2 * (t.border_width + gap),
            )
        } else {
            Rect::new(
                area.x + gap,
                area.y + gap + consumed,
                ma - 2 * (t.border_width + gap),
                span - 2 * (t.border_width + gap),
            )
        };
        consumed += (if b { rect.w } else { rect.h }) + 2 * t.border_width + gap;
        out.push((t.id, rect));
    }

    let t = iter.next().expect("stack side is never empty");
    let ch = z - 2 * t.border_width - gap;
    let cw = (if b { area.h } else { area.w }) - 2 * t.border_width - ma - gap;
    let mut sx;
    let mut sy;
    if b {
        sx = area.x + gap;
        sy = area.y + ma;
        out.push((t.id, Rect::new(sx, sy, ch - gap + p, cw)));
        sx += z + p - gap;
    } else {
        sx = area.x + ma;
        sy = area.y + gap;
        out.push((t.id, Rect::new(sx, sy, cw, ch - gap + p)));
        sy += z + p - gap;
    }

    for t in iter {
        let ch = z - 2 * t.border_width - gap;
        let cw = (if b { area.h } else { area.w }) - 2 * t.border_width - ma - gap;
        if b {
            out.push((t.id, Rect::new(sx, sy, ch, cw)));
            sx += z;
        } else {
            out.push((t.id, Rect::new(sx, sy, cw, ch)));
            sy += z;
        }
    }
    out
}

/// Fair grid. Column count is the smallest c with c² >= n, except five
/// windows use two columns (three reads too sparse). Windows fill columns
/// top to bottom, trailing columns absorbing the extra rows.
pub(crate) fn grid(area: Rect, tiles: &[Tile], gap: i32) -> Vec<(ClientId, Rect)> {
    let n = tiles.len() as i32;
    if n == 0 {
        return Vec::new();
    }
    let mut cols = 0;
    while cols <= n / 2 {
        if cols * cols >= n {
            break;
        }
        cols += 1;
    }
    if n == 5 {
        cols = 2;
    }

    let mut rows = n / cols;
    let ch = area.h - gap;
    let cw = (area.w - gap) / cols;
    let mut rn = 0;
    let mut cn = 0;
    let mut out = Vec::with_capacity(tiles.len());
    for (i, t) in tiles.iter().enumerate() {
        if (i as i32) / rows + 1 > cols - n % cols {
            rows = n / cols + 1;
        }
        out.push((
            t.id,
            Rect::new(
                area.x + cn * cw + gap,
                area.y + rn * ch / rows + gap,
                cw - 2 * t.border_width - gap,
                ch / rows - 2 * t.border_width - gap,
            ),
        ));
        rn += 1;
        if rn >= rows {
            rn = 0;
            cn += 1;
        }
    }
    out
}

/// Every window covers the whole area; only the topmost is visible, which
/// the focus restack establishes.
pub(crate) fn monocle(area: Rect, tiles: &[Tile]) -> Vec<(ClientId, Rect)> {
    tiles
        .iter()
        .map(|t| {
            (
                t.id,
                Rect::new(
                    area.x,
                    area.y,
                    area.w - 2 * t.border_width,
                    area.h - 2 * t.border_width,
                ),
            )
        })
        .collect()
}
