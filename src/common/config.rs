use std::path::{Path, PathBuf};
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::reactor::command::WmCommand;
use crate::common::collections::HashMap;
use crate::layout_engine::LayoutKind;

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap().join(".drift.toml")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not parse key binding \"{0}\"")]
    BadKeyBinding(String),
    #[error("could not parse button binding \"{0}\"")]
    BadButtonBinding(String),
}

bitflags! {
    /// Modifier mask attached to key and button events.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT     = 1 << 2;
        const SUPER   = 1 << 3;
    }
}

impl Modifiers {
    fn from_mod_name(name: &str) -> Option<Modifiers> {
        match name {
            "shift" => Some(Modifiers::SHIFT),
            "ctrl" | "control" => Some(Modifiers::CONTROL),
            "alt" | "mod1" => Some(Modifiers::ALT),
            "super" | "mod4" => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

/// A parsed key binding: modifier set plus keysym name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybind {
    pub modifiers: Modifiers,
    pub key: String,
}

impl FromStr for Keybind {
    type Err = ConfigError;

    /// Parse `"mod4+shift+j"` style strings. The last segment is the keysym,
    /// everything before it a modifier name. Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key = None;
        let lowered = s.to_ascii_lowercase();
        let mut parts = lowered.split('+').map(str::trim).peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                if part.is_empty() {
                    return Err(ConfigError::BadKeyBinding(s.to_string()));
                }
                key = Some(part.to_string());
            } else {
                modifiers |= Modifiers::from_mod_name(part)
                    .ok_or_else(|| ConfigError::BadKeyBinding(s.to_string()))?;
            }
        }
        Ok(Keybind {
            modifiers,
            key: key.ok_or_else(|| ConfigError::BadKeyBinding(s.to_string()))?,
        })
    }
}

/// A parsed pointer-button binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonBind {
    pub modifiers: Modifiers,
    pub button: u8,
}

impl FromStr for ButtonBind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keybind =
            Keybind::from_str(s).map_err(|_| ConfigError::BadButtonBinding(s.to_string()))?;
        let button = keybind
            .key
            .parse::<u8>()
            .map_err(|_| ConfigError::BadButtonBinding(s.to_string()))?;
        Ok(ButtonBind {
            modifiers: keybind.modifiers,
            button,
        })
    }
}

/// Per-application placement rule, matched by substring against the window's
/// class, instance and title. Unset fields match anything.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct AppRule {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub title: Option<String>,
    /// Target desktop index. None keeps the window on the active desktop.
    pub desktop: Option<usize>,
    /// Switch to the target desktop when the window opens.
    #[serde(default)]
    pub follow: bool,
    #[serde(default)]
    pub floating: bool,
    /// Attach as the last window of the sequence instead of the new head.
    #[serde(default)]
    pub attach_at_end: bool,
}

impl AppRule {
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let contains = |pattern: &Option<String>, haystack: &str| {
            pattern.as_ref().is_none_or(|p| haystack.contains(p.as_str()))
        };
        contains(&self.class, class)
            && contains(&self.instance, instance)
            && contains(&self.title, title)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DesktopSettings {
    pub name: String,
    #[serde(default)]
    pub mode: LayoutKind,
    #[serde(default = "default_master_fraction")]
    pub master_fraction: f32,
    #[serde(default = "default_master_count")]
    pub master_count: usize,
    #[serde(default = "yes")]
    pub show_panel: bool,
}

impl DesktopSettings {
    pub fn validate(&self, index: usize) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.master_fraction > 0.0 && self.master_fraction < 1.0) {
            issues.push(format!(
                "desktop {index}: master_fraction must be in (0, 1), got {}",
                self.master_fraction
            ));
        }

        if self.master_count == 0 {
            issues.push(format!("desktop {index}: master_count must be at least 1"));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !(self.master_fraction > 0.0 && self.master_fraction < 1.0) {
            self.master_fraction = default_master_fraction();
            fixes += 1;
        }

        if self.master_count == 0 {
            self.master_count = default_master_count();
            fixes += 1;
        }

        fixes
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_border_width")]
    pub border_width: i32,
    #[serde(default = "default_focused_color")]
    pub focused_color: String,
    #[serde(default = "default_unfocused_color")]
    pub unfocused_color: String,
    /// Pixels kept free around tiled windows.
    #[serde(default = "default_gap")]
    pub gap: i32,
    /// Hard floor for window extents; the constraint solver never produces
    /// anything smaller.
    #[serde(default = "default_min_window_size")]
    pub min_window_size: i32,
    /// Honor size hints for tiled windows too, not only floating ones.
    #[serde(default)]
    pub resize_hints: bool,
    #[serde(default)]
    pub default_desktop: usize,
    #[serde(default)]
    pub focus_follows_mouse: bool,
    /// Switch desktops when a rule places a new window elsewhere.
    #[serde(default)]
    pub follow_window: bool,
    #[serde(default = "default_panel_height")]
    pub panel_height: i32,
    #[serde(default = "yes")]
    pub panel_at_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            border_width: default_border_width(),
            focused_color: default_focused_color(),
            unfocused_color: default_unfocused_color(),
            gap: default_gap(),
            min_window_size: default_min_window_size(),
            resize_hints: false,
            default_desktop: 0,
            focus_follows_mouse: false,
            follow_window: false,
            panel_height: default_panel_height(),
            panel_at_top: true,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.border_width < 0 {
            issues.push(format!(
                "border_width must be non-negative, got {}",
                self.border_width
            ));
        }

        if self.gap < 0 {
            issues.push(format!("gap must be non-negative, got {}", self.gap));
        }

        if self.min_window_size < 1 {
            issues.push(format!(
                "min_window_size must be positive, got {}",
                self.min_window_size
            ));
        }

        if self.panel_height < 0 {
            issues.push(format!(
                "panel_height must be non-negative, got {}",
                self.panel_height
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.border_width < 0 {
            self.border_width = default_border_width();
            fixes += 1;
        }

        if self.gap < 0 {
            self.gap = default_gap();
            fixes += 1;
        }

        if self.min_window_size < 1 {
            self.min_window_size = default_min_window_size();
            fixes += 1;
        }

        if self.panel_height < 0 {
            self.panel_height = default_panel_height();
            fixes += 1;
        }

        fixes
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ButtonSettings {
    #[serde(rename = "move")]
    move_binding: Option<String>,
    #[serde(rename = "resize")]
    resize_binding: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default = "default_desktops")]
    desktops: Vec<DesktopSettings>,
    #[serde(default)]
    keys: HashMap<String, WmCommand>,
    #[serde(default)]
    buttons: ButtonSettings,
    #[serde(default)]
    rules: Vec<AppRule>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub desktops: Vec<DesktopSettings>,
    pub keys: Vec<(Keybind, WmCommand)>,
    pub buttons: Vec<(ButtonBind, WmCommand)>,
    pub rules: Vec<AppRule>,
}

impl Config {
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default_config() -> Config {
        Self::parse(include_str!("../../drift.default.toml")).unwrap()
    }

    fn parse(buf: &str) -> Result<Config, ConfigError> {
        let c: ConfigFile = toml::from_str(buf)?;
        let mut keys = Vec::new();
        for (key, cmd) in c.keys {
            keys.push((Keybind::from_str(&key)?, cmd));
        }
        let mut buttons = Vec::new();
        if let Some(binding) = &c.buttons.move_binding {
            buttons.push((ButtonBind::from_str(binding)?, WmCommand::StartMove));
        }
        if let Some(binding) = &c.buttons.resize_binding {
            buttons.push((ButtonBind::from_str(binding)?, WmCommand::StartResize));
        }
        Ok(Config {
            settings: c.settings,
            desktops: c.desktops,
            keys,
            buttons,
            rules: c.rules,
        })
    }

    /// Look up the command bound to a key press.
    pub fn command_for_key(&self, modifiers: Modifiers, key: &str) -> Option<&WmCommand> {
        let key = key.to_ascii_lowercase();
        self.keys
            .iter()
            .find(|(bind, _)| bind.modifiers == modifiers && bind.key == key)
            .map(|(_, cmd)| cmd)
    }

    /// Look up the command bound to a pointer button press.
    pub fn command_for_button(&self, modifiers: Modifiers, button: u8) -> Option<&WmCommand> {
        self.buttons
            .iter()
            .find(|(bind, _)| bind.modifiers == modifiers && bind.button == button)
            .map(|(_, cmd)| cmd)
    }

    /// First rule matching the window's class/instance/title, if any.
    pub fn matching_rule(&self, class: &str, instance: &str, title: &str) -> Option<&AppRule> {
        self.rules.iter().find(|r| r.matches(class, instance, title))
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.settings.validate());

        if self.desktops.is_empty() {
            issues.push("at least one desktop must be configured".to_string());
        }
        for (index, desktop) in self.desktops.iter().enumerate() {
            issues.extend(desktop.validate(index));
        }

        if !self.desktops.is_empty() && self.settings.default_desktop >= self.desktops.len() {
            issues.push(format!(
                "default_desktop {} is out of range (only {} desktops configured)",
                self.settings.default_desktop,
                self.desktops.len()
            ));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.class.is_none() && rule.instance.is_none() && rule.title.is_none() {
                issues.push(format!(
                    "rule {index} has no class, instance or title pattern"
                ));
            }
            if let Some(desktop) = rule.desktop {
                if desktop >= self.desktops.len() {
                    issues.push(format!(
                        "rule {index} references desktop {desktop} but only {} are configured",
                        self.desktops.len()
                    ));
                }
            }
        }

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        fixes += self.settings.auto_fix_values();

        if self.desktops.is_empty() {
            self.desktops = default_desktops();
            fixes += 1;
        }
        for desktop in &mut self.desktops {
            fixes += desktop.auto_fix_values();
        }

        if self.settings.default_desktop >= self.desktops.len() {
            self.settings.default_desktop = 0;
            fixes += 1;
        }

        for rule in &mut self.rules {
            if let Some(desktop) = rule.desktop {
                if desktop >= self.desktops.len() {
                    rule.desktop = None;
                    fixes += 1;
                }
            }
        }

        fixes
    }
}

fn yes() -> bool {
    true
}

fn default_border_width() -> i32 {
    2
}

fn default_focused_color() -> String {
    "#ff950e".to_string()
}

fn default_unfocused_color() -> String {
    "#444444".to_string()
}

fn default_gap() -> i32 {
    8
}

fn default_min_window_size() -> i32 {
    50
}

fn default_panel_height() -> i32 {
    24
}

fn default_master_fraction() -> f32 {
    0.52
}

fn default_master_count() -> usize {
    1
}

fn default_desktops() -> Vec<DesktopSettings> {
    ["term", "web", "code", "misc"]
        .iter()
        .map(|name| DesktopSettings {
            name: name.to_string(),
            mode: LayoutKind::VerticalStack,
            master_fraction: default_master_fraction(),
            master_count: default_master_count(),
            show_panel: true,
        })
        .collect()
}
