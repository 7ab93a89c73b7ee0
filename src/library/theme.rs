//! UI color themes.

use serde::{Deserialize, Serialize};

/// Id of the built-in theme that can never be deleted.
pub const DEFAULT_THEME_ID: &str = "default";

/// HSL color set applied to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    /// Primary color.
    pub primary: String,
    /// Secondary color.
    pub secondary: String,
    /// Accent color.
    pub accent: String,
    /// Page background.
    pub background: String,
    /// Text color.
    pub foreground: String,
}

/// Named color theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Theme ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Color set.
    pub colors: ThemeColors,
}

impl Theme {
    /// CSS custom properties the UI sets for this theme.
    pub fn css_variables(&self) -> [(&'static str, &str); 5] {
        [
            ("--primary", self.colors.primary.as_str()),
            ("--secondary", self.colors.secondary.as_str()),
            ("--accent", self.colors.accent.as_str()),
            ("--background", self.colors.background.as_str()),
            ("--foreground", self.colors.foreground.as_str()),
        ]
    }
}

fn theme(id: &str, name: &str, primary: &str, secondary: &str, accent: &str) -> Theme {
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        colors: ThemeColors {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: accent.to_string(),
            background: "0 0% 100%".to_string(),
            foreground: "222.2 84% 4.9%".to_string(),
        },
    }
}

/// Themes available before any customization.
pub fn builtin_themes() -> Vec<Theme> {
    vec![
        theme(
            DEFAULT_THEME_ID,
            "Default Purple",
            "262.1 83.3% 57.8%",
            "210 40% 96%",
            "210 40% 96%",
        ),
        theme("ocean", "Ocean Blue", "199 89% 48%", "197 37% 24%", "189 81% 94%"),
        theme("forest", "Forest Green", "142 76% 36%", "138 76% 97%", "142 71% 45%"),
        theme("sunset", "Sunset Orange", "25 95% 53%", "24 95% 97%", "20 94.6% 48.2%"),
    ]
}
