//! Theme colors, with optional overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;
use crate::console::LineKind;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Active tab, borders of focused panels
    pub danger: Color,      // Error lines and error fields
    pub success: Color,     // Result lines
    pub warning: Color,     // Status messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, info lines
    pub inactive: Color,    // Inactive borders and tabs
    pub header: Color,      // Table headers
    pub input: Color,       // Echoed input lines
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
            input: Color::Rgb(137, 220, 235),
        }
    }
}

impl Theme {
    pub fn from_config(config: Option<&ThemeConfig>) -> Self {
        let mut theme = Self::default();
        let Some(config) = config else {
            return theme;
        };

        let overrides = [
            (&config.accent, &mut theme.accent),
            (&config.danger, &mut theme.danger),
            (&config.success, &mut theme.success),
            (&config.text, &mut theme.text),
            (&config.text_dim, &mut theme.text_dim),
        ];

        for (value, slot) in overrides {
            if let Some(raw) = value {
                match Self::parse_hex_color(raw) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color: {}", raw),
                }
            }
        }

        theme
    }

    pub fn line_color(&self, kind: LineKind) -> Color {
        match kind {
            LineKind::Input => self.input,
            LineKind::Result => self.success,
            LineKind::Error => self.danger,
            LineKind::Info => self.text_dim,
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#FFC107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(Theme::parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("#12345"), None);
        assert_eq!(Theme::parse_hex_color("#zzzzzz"), None);
        // Multi-byte text with a matching byte length
        assert_eq!(Theme::parse_hex_color("#€€"), None);
        assert_eq!(Theme::parse_hex_color("€"), None);
    }

    #[test]
    fn test_non_ascii_override_keeps_default() {
        let config = ThemeConfig {
            accent: Some("#€€".to_string()),
            ..Default::default()
        };
        let theme = Theme::from_config(Some(&config));
        assert_eq!(theme.accent, Theme::default().accent);
    }

    #[test]
    fn test_overrides() {
        let config = ThemeConfig {
            accent: Some("#000000".to_string()),
            danger: Some("not-a-color".to_string()),
            ..Default::default()
        };
        let theme = Theme::from_config(Some(&config));
        assert_eq!(theme.accent, Color::Rgb(0, 0, 0));
        assert_eq!(theme.danger, Theme::default().danger);
        assert_eq!(theme.line_color(LineKind::Error), theme.danger);
    }
}
