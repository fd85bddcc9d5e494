use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::sys::geometry::Rect;

new_key_type! {
    /// Arena slot for a managed client. Stable for the client's lifetime;
    /// never reused while the record is alive.
    pub struct ClientId;
}

/// Opaque window identity assigned by the windowing server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Window type as declared by the application.
///
/// Docks and desktop windows are never managed; dialogs, splashes, utilities
/// and menus are managed but always float.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Normal,
    Dock,
    Desktop,
    Dialog,
    Splash,
    Utility,
    Menu,
}

impl WindowKind {
    pub fn is_unmanaged(self) -> bool {
        matches!(self, WindowKind::Dock | WindowKind::Desktop)
    }

    pub fn forces_floating(self) -> bool {
        matches!(
            self,
            WindowKind::Dialog | WindowKind::Splash | WindowKind::Utility | WindowKind::Menu
        )
    }
}

/// Size constraints declared by the client (ICCCM WM_NORMAL_HINTS).
///
/// A zero field means "not declared". Aspect ratios follow the usual
/// convention: `min_aspect` is the height/width floor and `max_aspect` the
/// width/height ceiling; both must be declared for either to apply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeHints {
    #[serde(default)]
    pub base_w: i32,
    #[serde(default)]
    pub base_h: i32,
    #[serde(default)]
    pub inc_w: i32,
    #[serde(default)]
    pub inc_h: i32,
    #[serde(default)]
    pub min_w: i32,
    #[serde(default)]
    pub min_h: i32,
    #[serde(default)]
    pub max_w: i32,
    #[serde(default)]
    pub max_h: i32,
    #[serde(default)]
    pub min_aspect: f32,
    #[serde(default)]
    pub max_aspect: f32,
}

impl SizeHints {
    /// True when the hints pin the window to a single size.
    pub fn is_fixed(&self) -> bool {
        self.max_w != 0
            && self.min_w != 0
            && self.max_h != 0
            && self.min_h != 0
            && self.max_w == self.min_w
            && self.max_h == self.min_h
    }
}

/// Everything the server collaborator reports about a window at map time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub geometry: Rect,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub transient: bool,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub above: bool,
    #[serde(default)]
    pub hints: SizeHints,
}

/// One managed on-screen surface.
///
/// `transient` is separate from `floating`: floating windows can be reset to
/// their tiling slot, while transients always float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub handle: WindowHandle,
    pub geometry: Rect,
    /// Geometry before the last float/fullscreen transition, restored when
    /// the window re-enters tiling.
    pub saved_geometry: Rect,
    pub border_width: i32,
    pub saved_border_width: i32,
    pub urgent: bool,
    pub fullscreen: bool,
    pub floating: bool,
    pub transient: bool,
    pub fixed_size: bool,
    pub hints: SizeHints,
}

impl Client {
    pub fn new(handle: WindowHandle, info: &WindowInfo, border_width: i32) -> Self {
        let mut client = Client {
            handle,
            geometry: info.geometry,
            saved_geometry: info.geometry,
            border_width,
            saved_border_width: border_width,
            urgent: false,
            fullscreen: false,
            floating: false,
            transient: info.transient,
            fixed_size: false,
            hints: SizeHints::default(),
        };
        client.set_hints(info.hints);
        client
    }

    /// Fullscreen, floating, or transient: excluded from tiling.
    pub fn is_fft(&self) -> bool {
        self.fullscreen || self.floating || self.transient
    }

    /// Width including both borders.
    pub fn outer_w(&self) -> i32 {
        self.geometry.w + 2 * self.border_width
    }

    /// Height including both borders.
    pub fn outer_h(&self) -> i32 {
        self.geometry.h + 2 * self.border_width
    }

    /// Replace the size hints. `fixed_size` latches: once a window has
    /// declared a fixed size it stays treated as fixed.
    pub fn set_hints(&mut self, hints: SizeHints) {
        self.hints = hints;
        if hints.is_fixed() {
            self.fixed_size = true;
        }
    }
}
