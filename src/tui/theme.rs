//! Theme and runtime configuration.

use ratatui::style::{Color, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => ThemeVariant::Light,
            _ => ThemeVariant::Dark,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent_primary: Color,   // Focus, selection, primary highlight
    pub accent_secondary: Color, // Links, secondary actions
    pub accent_error: Color,     // Errors, failures
    pub accent_warning: Color,   // Warnings, pending
    pub accent_success: Color,   // Success, completion

    pub text_primary: Color,   // Main content
    pub text_secondary: Color, // Less important content
    pub text_tertiary: Color,  // Labels, hints

    pub border_primary: Color,
    pub bg_base: Color,
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self {
                accent_primary: Color::Rgb(180, 190, 254),
                accent_secondary: Color::Rgb(137, 180, 250),
                accent_error: Color::Rgb(243, 139, 168),
                accent_warning: Color::Rgb(249, 226, 175),
                accent_success: Color::Rgb(166, 227, 161),
                text_primary: Color::Rgb(205, 214, 244),
                text_secondary: Color::Rgb(186, 194, 222),
                text_tertiary: Color::Rgb(166, 173, 200),
                border_primary: Color::Rgb(127, 132, 156),
                bg_base: Color::Rgb(30, 30, 46),
            },
            ThemeVariant::Light => Self {
                accent_primary: Color::Rgb(114, 135, 253),
                accent_secondary: Color::Rgb(30, 102, 245),
                accent_error: Color::Rgb(210, 15, 57),
                accent_warning: Color::Rgb(223, 142, 29),
                accent_success: Color::Rgb(64, 160, 43),
                text_primary: Color::Rgb(76, 79, 105),
                text_secondary: Color::Rgb(92, 95, 119),
                text_tertiary: Color::Rgb(108, 111, 133),
                border_primary: Color::Rgb(140, 143, 161),
                bg_base: Color::Rgb(239, 241, 245),
            },
        }
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.accent_error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.accent_warning)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.accent_success)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::Dark)
    }
}

/// Hot-reloadable runtime configuration, held behind an ArcSwap global
/// so settings changes apply without restarting the event loop.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub theme: Theme,
}

impl RuntimeConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            theme: Theme::new(ThemeVariant::from_name(&config.ui.theme)),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_name_defaults_to_dark() {
        assert_eq!(ThemeVariant::from_name("light"), ThemeVariant::Light);
        assert_eq!(ThemeVariant::from_name("dark"), ThemeVariant::Dark);
        assert_eq!(ThemeVariant::from_name("mystery"), ThemeVariant::Dark);
    }
}
