//! Keyframe icon templates and effect palette colouring.
//!
//! Effect keyframes are drawn with a per-effect colour so overlapping
//! animation tracks stay readable. The three interpolation glyphs are
//! SVG templates whose `fill` is rewritten to the effect's palette
//! colour, then emitted as percent-encoded `data:` URLs the view can
//! use directly.

use cutline_project::Interpolation;
use std::collections::HashMap;

/// Placeholder colour inside the raw templates, replaced per effect.
const TEMPLATE_FILL: &str = "#ffffff";

const BEZIER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 12 12"><circle cx="6" cy="6" r="5" fill="#ffffff"/></svg>"##;
const LINEAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 12 12"><path d="M6 1 11 6 6 11 1 6Z" fill="#ffffff"/></svg>"##;
const CONSTANT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 12 12"><rect x="1.5" y="1.5" width="9" height="9" fill="#ffffff"/></svg>"##;

/// Default palette cycled through by effect id, matching the track
/// badge colours of the editor theme.
const DEFAULT_PALETTE: [&str; 6] = [
    "#4e7fff", "#2fbf71", "#f2a33c", "#e2574c", "#9b5fe0", "#2bb3c0",
];

/// Stable colour assignment for effects: first come, first coloured,
/// cycling through the palette. Selection-independent so an effect keeps
/// its colour for the lifetime of the project view.
#[derive(Clone, Debug, Default)]
pub struct EffectPalette {
    assigned: HashMap<String, String>,
    colors: Vec<String>,
}

impl EffectPalette {
    pub fn new() -> Self {
        Self {
            assigned: HashMap::new(),
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Replace the palette (theme change). Existing assignments are kept
    /// by index so colours only shift if the palette shrank.
    pub fn set_colors(&mut self, colors: Vec<String>) {
        if !colors.is_empty() {
            self.colors = colors;
        }
    }

    /// Colour for an effect id, assigning one on first use.
    pub fn color_for(&mut self, effect_id: &str) -> String {
        if let Some(color) = self.assigned.get(effect_id) {
            return color.clone();
        }
        let color = self.colors[self.assigned.len() % self.colors.len()].clone();
        self.assigned.insert(effect_id.to_string(), color.clone());
        color
    }
}

/// Interpolation glyph templates plus a cache of colourised data-URLs.
///
/// Templates are installed once at startup and replaced on theme
/// changes; until (re)installation completes, `data_url` returns `None`
/// and callers fall back to the uncoloured default icon.
#[derive(Clone, Debug, Default)]
pub struct IconSet {
    templates: HashMap<Interpolation, String>,
    cache: HashMap<(Interpolation, String), String>,
}

impl IconSet {
    /// Icon set with the built-in glyph templates.
    pub fn with_defaults() -> Self {
        let mut set = Self::default();
        set.install_defaults();
        set
    }

    /// (Re)install the built-in templates, dropping the colour cache.
    pub fn install_defaults(&mut self) {
        self.templates = HashMap::from([
            (Interpolation::Bezier, BEZIER_SVG.to_string()),
            (Interpolation::Linear, LINEAR_SVG.to_string()),
            (Interpolation::Constant, CONSTANT_SVG.to_string()),
        ]);
        self.cache.clear();
    }

    /// Drop every template (theme reload in progress).
    pub fn clear(&mut self) {
        self.templates.clear();
        self.cache.clear();
    }

    /// Whether templates are available for colourising.
    pub fn is_ready(&self) -> bool {
        !self.templates.is_empty()
    }

    /// Colourised data-URL for an interpolation glyph, or `None` when
    /// the templates are not installed yet.
    pub fn data_url(&mut self, interpolation: Interpolation, color: &str) -> Option<String> {
        let key = (interpolation, color.to_string());
        if let Some(url) = self.cache.get(&key) {
            return Some(url.clone());
        }
        let template = self.templates.get(&interpolation)?;
        let svg = template.replace(TEMPLATE_FILL, color);
        let url = format!("data:image/svg+xml;charset=utf-8,{}", urlencoding::encode(&svg));
        self.cache.insert(key, url.clone());
        Some(url)
    }
}
