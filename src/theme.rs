//! Theme colors, optionally loaded from a kitty.conf style color file

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::view::Tier;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,    // Active borders, key hints
    pub safe: Color,      // Usage below 30%
    pub warning: Color,   // Usage 30-70%
    pub critical: Color,  // Usage 70% and above
    pub text: Color,
    pub text_dim: Color,
    pub inactive: Color,  // Inactive borders, separators
    pub header: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback
        Self {
            accent: Color::Rgb(250, 179, 135),
            safe: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(238, 212, 159),
            critical: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Load theme from the given color file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_colors(&Self::parse_kitty_conf(&content)),
            Err(e) => {
                tracing::warn!("Could not read theme {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Map kitty color slots onto the theme; missing slots keep defaults
    fn from_colors(colors: &HashMap<String, Color>) -> Self {
        let base = Self::default();
        let pick = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k).copied())
                .unwrap_or(fallback)
        };

        Self {
            accent: pick(&["color4", "color12"], base.accent),
            safe: pick(&["color2", "color10"], base.safe),
            warning: pick(&["color3", "color11"], base.warning),
            critical: pick(&["color1", "color9"], base.critical),
            text: pick(&["foreground"], base.text),
            text_dim: pick(&["color8"], base.text_dim),
            inactive: pick(&["inactive_border_color", "color8"], base.inactive),
            header: pick(&["color5", "color1"], base.header),
        }
    }

    pub fn tier_color(&self, tier: Tier) -> Color {
        match tier {
            Tier::Safe => self.safe,
            Tier::Warning => self.warning,
            Tier::Critical => self.critical,
        }
    }

    /// Parse kitty.conf format: `key value` or `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(char::is_whitespace) {
                if let Some(color) = Self::parse_hex_color(value) {
                    colors.insert(key.trim().to_string(), color);
                }
            }
        }

        colors
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
