//! Size-hint constraint solving.
//!
//! Maps a requested rectangle plus a window's declared constraints to an
//! admissible rectangle. The hint arithmetic follows ICCCM 4.1.2.3: remove
//! the base size, clamp to the aspect bounds, snap down to the increment
//! grid, re-add the base size, then clamp to the declared minimum/maximum.

use crate::model::client::Client;
use crate::sys::geometry::Rect;

/// Compute the admissible rectangle for `proposed`.
///
/// In interactive mode (a live drag) the window may hang partially
/// off-screen and is only pulled back once it would leave entirely; in
/// non-interactive mode the origin is clamped to stay on-screen. Hint
/// arithmetic runs when `honor_hints` is set — callers pass the global
/// resize-hints setting OR'd with the window's floating state.
///
/// The second return value reports whether the result differs from the
/// window's current geometry; callers use it to skip no-op placements.
pub fn apply_constraints(
    client: &Client,
    proposed: Rect,
    screen: Rect,
    interactive: bool,
    honor_hints: bool,
    min_window_size: i32,
) -> (Rect, bool) {
    let hints = &client.hints;
    let bw = client.border_width;
    let mut x = proposed.x;
    let mut y = proposed.y;
    let mut w = proposed.w.max(1);
    let mut h = proposed.h.max(1);

    if interactive {
        if x > screen.w {
            x = screen.w - client.outer_w();
        }
        if y > screen.h {
            y = screen.h - client.outer_h();
        }
        if x + w + 2 * bw < 0 {
            x = 0;
        }
        if y + h + 2 * bw < 0 {
            y = 0;
        }
    } else {
        if x >= screen.w {
            x = screen.w - client.outer_w();
        }
        if y >= screen.h {
            y = screen.h - client.outer_h();
        }
    }
    if h < min_window_size {
        h = min_window_size;
    }
    if w < min_window_size {
        w = min_window_size;
    }

    if honor_hints {
        // ICCCM: when the base size is the minimum size, it must be removed
        // only for the increment calculation, not the aspect one.
        let base_is_min = hints.base_w == hints.min_w && hints.base_h == hints.min_h;
        if !base_is_min {
            w -= hints.base_w;
            h -= hints.base_h;
        }
        if hints.min_aspect > 0.0 && hints.max_aspect > 0.0 {
            if hints.max_aspect < w as f32 / h as f32 {
                w = (h as f32 * hints.max_aspect + 0.5) as i32;
            } else if hints.min_aspect < h as f32 / w as f32 {
                h = (w as f32 * hints.min_aspect + 0.5) as i32;
            }
        }
        if base_is_min {
            w -= hints.base_w;
            h -= hints.base_h;
        }
        if hints.inc_w > 0 {
            w -= w % hints.inc_w;
        }
        if hints.inc_h > 0 {
            h -= h % hints.inc_h;
        }
        w = (w + hints.base_w).max(hints.min_w);
        h = (h + hints.base_h).max(hints.min_h);
        if hints.max_w > 0 {
            w = w.min(hints.max_w);
        }
        if hints.max_h > 0 {
            h = h.min(hints.max_h);
        }
    }

    let result = Rect::new(x, y, w, h);
    (result, result != client.geometry)
}
