//! Configuration and color scheme management for bbsterm.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.bbsterm/config.toml`
//! - Built-in 16-color palettes (default, solarized-dark, dracula, nord,
//!   tokyo-night)
//! - CSS generation for the markup class vocabulary
//!
//! # Configuration File
//!
//! ```toml
//! # Color scheme: default, solarized-dark, dracula, nord, tokyo-night
//! color_scheme = "dracula"
//!
//! [typing]
//! simulate_speed = true
//! speed_ms = 15
//!
//! [log]
//! level = "info"
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::term::markup;
use crate::core::term::style::COLOR_COUNT;
use crate::core::typing::TypingConfig;
use crate::error::ConfigError;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Color scheme name
    pub color_scheme: String,
    /// Typing simulation settings
    pub typing: TypingConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_scheme: "default".to_string(),
            typing: TypingConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "bbsterm=debug"
    pub level: String,
    /// Log file; defaults to `~/.bbsterm/bbsterm.log`
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when the file is missing or invalid.
    pub fn load() -> Self {
        let Some(path) = Self::get_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoHome)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `~/.bbsterm`, created on first use
    pub fn data_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(".bbsterm");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Log file path
    pub fn log_path(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            Self::data_dir()
                .map(|dir| dir.join("bbsterm.log"))
                .unwrap_or_else(|| PathBuf::from("bbsterm.log"))
        })
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    /// CSS hex notation
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color scheme: default colors plus the 16-color palette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,
    pub foreground: Color,
    pub background: Color,
    /// Indexed by color tag: 0-7 standard, 8-15 bright
    pub palette: [Color; COLOR_COUNT as usize],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Classic VGA colors
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            foreground: Color::new(192, 192, 192),
            background: Color::new(0, 0, 0),
            palette: [
                Color::new(0, 0, 0),
                Color::new(170, 0, 0),
                Color::new(0, 170, 0),
                Color::new(170, 85, 0),
                Color::new(0, 0, 170),
                Color::new(170, 0, 170),
                Color::new(0, 170, 170),
                Color::new(170, 170, 170),
                Color::new(85, 85, 85),
                Color::new(255, 85, 85),
                Color::new(85, 255, 85),
                Color::new(255, 255, 85),
                Color::new(85, 85, 255),
                Color::new(255, 85, 255),
                Color::new(85, 255, 255),
                Color::new(255, 255, 255),
            ],
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            foreground: Color::new(131, 148, 150),
            background: Color::new(0, 43, 54),
            palette: [
                Color::new(7, 54, 66),
                Color::new(220, 50, 47),
                Color::new(133, 153, 0),
                Color::new(181, 137, 0),
                Color::new(38, 139, 210),
                Color::new(211, 54, 130),
                Color::new(42, 161, 152),
                Color::new(238, 232, 213),
                Color::new(0, 43, 54),
                Color::new(203, 75, 22),
                Color::new(88, 110, 117),
                Color::new(101, 123, 131),
                Color::new(131, 148, 150),
                Color::new(108, 113, 196),
                Color::new(147, 161, 161),
                Color::new(253, 246, 227),
            ],
        }
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            foreground: Color::new(248, 248, 242),
            background: Color::new(40, 42, 54),
            palette: [
                Color::new(33, 34, 44),
                Color::new(255, 85, 85),
                Color::new(80, 250, 123),
                Color::new(241, 250, 140),
                Color::new(189, 147, 249),
                Color::new(255, 121, 198),
                Color::new(139, 233, 253),
                Color::new(248, 248, 242),
                Color::new(98, 114, 164),
                Color::new(255, 110, 110),
                Color::new(105, 255, 148),
                Color::new(255, 255, 165),
                Color::new(214, 172, 255),
                Color::new(255, 146, 223),
                Color::new(164, 255, 255),
                Color::new(255, 255, 255),
            ],
        }
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            foreground: Color::new(216, 222, 233),
            background: Color::new(46, 52, 64),
            palette: [
                Color::new(59, 66, 82),
                Color::new(191, 97, 106),
                Color::new(163, 190, 140),
                Color::new(235, 203, 139),
                Color::new(129, 161, 193),
                Color::new(180, 142, 173),
                Color::new(136, 192, 208),
                Color::new(229, 233, 240),
                Color::new(76, 86, 106),
                Color::new(191, 97, 106),
                Color::new(163, 190, 140),
                Color::new(235, 203, 139),
                Color::new(129, 161, 193),
                Color::new(180, 142, 173),
                Color::new(143, 188, 187),
                Color::new(236, 239, 244),
            ],
        }
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),
            foreground: Color::new(169, 177, 214),
            background: Color::new(26, 27, 38),
            palette: [
                Color::new(21, 22, 30),
                Color::new(247, 118, 142),
                Color::new(158, 206, 106),
                Color::new(224, 175, 104),
                Color::new(122, 162, 247),
                Color::new(187, 154, 247),
                Color::new(125, 207, 255),
                Color::new(169, 177, 214),
                Color::new(65, 72, 104),
                Color::new(247, 118, 142),
                Color::new(158, 206, 106),
                Color::new(224, 175, 104),
                Color::new(122, 162, 247),
                Color::new(187, 154, 247),
                Color::new(125, 207, 255),
                Color::new(192, 202, 245),
            ],
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" | "solarized" => Self::solarized_dark(),
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "dracula", "nord", "tokyo-night"]
    }

    /// Palette entry for a color tag
    pub fn color(&self, index: u8) -> Color {
        self.palette
            .get(index as usize)
            .copied()
            .unwrap_or(self.foreground)
    }

    /// CSS for the markup class vocabulary, scoped under `.{root}`
    pub fn stylesheet(&self, root: &str) -> String {
        let mut css = String::new();
        let _ = writeln!(
            css,
            ".{} {{ color: {}; background-color: {}; white-space: pre-wrap; }}",
            root,
            self.foreground.hex(),
            self.background.hex()
        );
        let _ = writeln!(css, ".{} .bold {{ font-weight: bold; }}", root);
        let _ = writeln!(css, ".{} .italic {{ font-style: italic; }}", root);
        let _ = writeln!(css, ".{} .underline {{ text-decoration: underline; }}", root);
        let _ = writeln!(css, ".{} .strikethrough {{ text-decoration: line-through; }}", root);
        let _ = writeln!(
            css,
            ".{} .underline.strikethrough {{ text-decoration: underline line-through; }}",
            root
        );
        let _ = writeln!(
            css,
            ".{} .blink {{ animation: {}-blink 1s steps(1) infinite; }}",
            root, root
        );
        let _ = writeln!(css, "@keyframes {}-blink {{ 50% {{ opacity: 0; }} }}", root);

        for index in 0..COLOR_COUNT {
            let hex = self.color(index).hex();
            let _ = writeln!(css, ".{} .{} {{ color: {}; }}", root, markup::fg_class(index), hex);
            let _ = writeln!(
                css,
                ".{} .{} {{ background-color: {}; }}",
                root,
                markup::bg_class(index),
                hex
            );
        }
        css
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            color_scheme = "nord"
            [typing]
            speed_ms = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.color_scheme, "nord");
        assert_eq!(config.typing.speed_ms, 40);
        assert!(config.typing.simulate_speed);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("bbsterm-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.typing.simulate_speed = false;
        config.color_scheme = "dracula".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(!loaded.typing.simulate_speed);
        assert_eq!(loaded.get_color_scheme().name, "dracula");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let path = std::env::temp_dir().join(format!("bbsterm-bad-{}.toml", std::process::id()));
        fs::write(&path, "typing = 3").unwrap();
        let result = Config::load_from(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_scheme_lookup() {
        for name in ColorScheme::list() {
            assert_eq!(ColorScheme::by_name(name).name, name);
        }
        assert_eq!(ColorScheme::by_name("nope").name, "default");
        assert_eq!(ColorScheme::default_scheme().color(9), Color::new(255, 85, 85));
        assert_eq!(ColorScheme::default_scheme().color(200), Color::new(192, 192, 192));
    }

    #[test]
    fn test_stylesheet_covers_vocabulary() {
        let css = ColorScheme::default_scheme().stylesheet("term");
        assert!(css.contains(".term { color: #c0c0c0; background-color: #000000;"));
        assert!(css.contains(".term .bold { font-weight: bold; }"));
        assert!(css.contains(".term .ansi-1 { color: #aa0000; }"));
        assert!(css.contains(".term .ansi-bg-15 { background-color: #ffffff; }"));
        assert!(css.contains(".term .blink"));
    }
}
