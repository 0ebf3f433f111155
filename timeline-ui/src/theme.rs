//! Theme installation.
//!
//! The host pushes theme colours as a flat JSON object of CSS variable
//! names to colour strings, plus (separately) a full stylesheet. The
//! engine only interprets the variables it needs — the effect palette —
//! and re-exposes the rest for the embedding view.

use std::collections::HashMap;

/// Installed theme state.
#[derive(Clone, Debug, Default)]
pub struct Theme {
    /// CSS variable name -> colour string.
    pub variables: HashMap<String, String>,
    /// Raw stylesheet installed via `setTheme`.
    pub stylesheet: String,
}

impl Theme {
    /// Parse a `setThemeColors` payload. Non-string values are skipped;
    /// a malformed payload yields an empty variable set (the engine
    /// keeps running on defaults).
    pub fn set_colors_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<HashMap<String, serde_json::Value>>(json) {
            Ok(raw) => {
                self.variables = raw
                    .into_iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                    .collect();
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring malformed theme colours");
                false
            }
        }
    }

    /// Effect palette colours: variables named `effect-color-<n>`,
    /// ordered by `<n>`. Empty when the theme does not define any.
    pub fn effect_colors(&self) -> Vec<String> {
        let mut entries: Vec<(u32, &String)> = self
            .variables
            .iter()
            .filter_map(|(name, color)| {
                name.strip_prefix("effect-color-")
                    .and_then(|n| n.parse::<u32>().ok())
                    .map(|n| (n, color))
            })
            .collect();
        entries.sort_by_key(|(n, _)| *n);
        entries.into_iter().map(|(_, c)| c.clone()).collect()
    }

    /// Render the variables as a `:root` CSS block for the view.
    pub fn css_variables(&self) -> String {
        let mut names: Vec<&String> = self.variables.keys().collect();
        names.sort();
        let body: String = names
            .iter()
            .map(|name| format!("  --{}: {};\n", name, self.variables[*name]))
            .collect();
        format!(":root {{\n{body}}}")
    }
}
