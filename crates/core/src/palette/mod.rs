//! Color palettes and the gradient memoization cache.
//!
//! Building a gradient is the only per-frame rendering cost that involves an
//! allocation, so gradients are constructed once per (palette, width, height)
//! key and handed out as shared handles until the surface is resized.

use std::collections::HashMap;
use std::sync::Arc;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Geometry of a gradient fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    /// Runs from the top-left corner to the bottom-right corner.
    Linear,
    /// Radiates from the surface center out to max(width, height) / 2.
    Radial,
}

/// A named, built-in color palette.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub name: &'static str,
    pub colors: &'static [Color],
    pub kind: GradientKind,
}

pub const PALETTES: &[Palette] = &[
    Palette {
        name: "Neon",
        colors: &[
            Color::rgb(0x7C, 0x4D, 0xFF),
            Color::rgb(0x00, 0xE5, 0xFF),
            Color::rgb(0x76, 0xFF, 0x03),
        ],
        kind: GradientKind::Linear,
    },
    Palette {
        name: "Sunset",
        colors: &[
            Color::rgb(0xFF, 0x6E, 0x40),
            Color::rgb(0xFF, 0x40, 0x81),
            Color::rgb(0x7C, 0x4D, 0xFF),
        ],
        kind: GradientKind::Linear,
    },
    Palette {
        name: "Aurora",
        colors: &[
            Color::rgb(0x00, 0xF5, 0xFF),
            Color::rgb(0x7B, 0x42, 0xFF),
            Color::rgb(0xFF, 0x00, 0x6E),
        ],
        kind: GradientKind::Radial,
    },
    Palette {
        name: "Fire",
        colors: &[
            Color::rgb(0xFF, 0x17, 0x44),
            Color::rgb(0xFF, 0x6D, 0x00),
            Color::rgb(0xFF, 0xEA, 0x00),
        ],
        kind: GradientKind::Linear,
    },
    Palette {
        name: "Ocean",
        colors: &[
            Color::rgb(0x00, 0x91, 0xEA),
            Color::rgb(0x00, 0xB8, 0xD4),
            Color::rgb(0x00, 0xE6, 0x76),
        ],
        kind: GradientKind::Linear,
    },
];

/// Returns the palette a name resolves to, or `None` if it is unknown.
pub fn lookup(name: &str) -> Option<&'static Palette> {
    PALETTES.iter().find(|palette| palette.name == name)
}

fn default_palette() -> &'static Palette {
    &PALETTES[0]
}

/// First color of the named palette, used by stroke-based modes that do not
/// need a full gradient. Unknown names fall back to the default palette.
pub fn solid_color(name: &str) -> Color {
    match lookup(name) {
        Some(found) => found.colors[0],
        None => {
            tracing::warn!(palette = name, "unknown palette, substituting default");
            default_palette().colors[0]
        }
    }
}

/// A drawable gradient: evenly spaced color stops over a fixed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<(f32, Color)>,
    pub width: u32,
    pub height: u32,
}

impl Gradient {
    fn build(palette: &Palette, width: u32, height: u32) -> Self {
        let last = palette.colors.len().saturating_sub(1).max(1);
        let stops = palette
            .colors
            .iter()
            .enumerate()
            .map(|(i, color)| (i as f32 / last as f32, *color))
            .collect();
        Self {
            kind: palette.kind,
            stops,
            width,
            height,
        }
    }
}

/// Memoizes palette-to-gradient conversion keyed by (palette, width, height).
///
/// The whole cache is discarded when the surface's backing dimensions change;
/// entries are never evicted individually.
#[derive(Debug, Default)]
pub struct GradientCache {
    entries: HashMap<(String, u32, u32), Arc<Gradient>>,
}

impl GradientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached gradient for the key, constructing it on first use.
    /// Repeated calls with an identical key return the identical handle.
    /// Unknown palette names resolve to the default palette with a warning.
    pub fn gradient(&mut self, palette: &str, width: u32, height: u32) -> Arc<Gradient> {
        let resolved = match lookup(palette) {
            Some(found) => found,
            None => {
                tracing::warn!(palette, "unknown palette, substituting default");
                default_palette()
            }
        };

        self.entries
            .entry((resolved.name.to_string(), width, height))
            .or_insert_with(|| Arc::new(Gradient::build(resolved, width, height)))
            .clone()
    }

    /// Discards every entry. Must be called when the surface's backing-store
    /// dimensions change, otherwise stale wrong-sized gradients get reused.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookups_share_one_handle() {
        let mut cache = GradientCache::new();
        let first = cache.gradient("Fire", 640, 480);
        let second = cache.gradient("Fire", 640, 480);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_entries() {
        let mut cache = GradientCache::new();
        let small = cache.gradient("Fire", 640, 480);
        let large = cache.gradient("Fire", 1280, 960);
        assert!(!Arc::ptr_eq(&small, &large));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_drops_cached_handles() {
        let mut cache = GradientCache::new();
        let before = cache.gradient("Ocean", 640, 480);
        cache.clear();
        assert!(cache.is_empty());
        let after = cache.gradient("Ocean", 640, 480);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn unknown_palette_resolves_to_default_colors() {
        let mut cache = GradientCache::new();
        let unknown = cache.gradient("Nope", 640, 480);
        let neon = cache.gradient("Neon", 640, 480);
        assert!(Arc::ptr_eq(&unknown, &neon));
        assert_eq!(unknown.stops[0].1, Color::rgb(0x7C, 0x4D, 0xFF));
    }

    #[test]
    fn stops_are_evenly_spaced() {
        let mut cache = GradientCache::new();
        let gradient = cache.gradient("Aurora", 100, 100);
        assert_eq!(gradient.kind, GradientKind::Radial);
        let offsets: Vec<f32> = gradient.stops.iter().map(|(offset, _)| *offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn solid_color_falls_back_to_default() {
        assert_eq!(solid_color("Ocean"), Color::rgb(0x00, 0x91, 0xEA));
        assert_eq!(solid_color("Nope"), Color::rgb(0x7C, 0x4D, 0xFF));
    }
}
