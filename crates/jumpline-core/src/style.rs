//! Highlight styles.
//!
//! Styles are immutable values. A preference change builds a new [`StyleSheet`] and swaps it into
//! the [`StyleRegistry`]; painters created afterwards pick up the new colors while regions that
//! are already on screen keep the painter they were created with.

use crate::config::{ColorConfig, StyleEntry};
use crate::error::ConfigError;
use crate::highlight::{Painter, PainterCategory};
use arc_swap::ArcSwap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl FromStr for Rgba {
    type Err = ConfigError;

    /// Parse `#rrggbb` or `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Color and weight of a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightStyle {
    /// Fill (or frame) color.
    pub color: Rgba,
    /// Whether highlighted text is drawn bold.
    pub bold: bool,
}

impl HighlightStyle {
    /// A non-bold style.
    pub const fn new(color: Rgba) -> Self {
        Self { color, bold: false }
    }

    fn from_entry(entry: &StyleEntry) -> Result<Self, ConfigError> {
        Ok(Self {
            color: entry.color.parse()?,
            bold: entry.bold,
        })
    }
}

/// The active set of highlight styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    /// Native text selection.
    pub selection: HighlightStyle,
    /// Selected result in a document.
    pub result: HighlightStyle,
    /// Frame highlights (outlined regions).
    pub frame: HighlightStyle,
    /// Everything else (search matches, bracket matches).
    pub generic: HighlightStyle,
    /// Selected item in the results list.
    pub list_result: HighlightStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            selection: HighlightStyle::new(Rgba::rgb(0xb4, 0xd5, 0xfe)),
            result: HighlightStyle::new(Rgba::rgb(0xff, 0xff, 0x80)),
            frame: HighlightStyle::new(Rgba::rgb(0xff, 0x00, 0x00)),
            generic: HighlightStyle::new(Rgba::rgb(0xe0, 0xe0, 0xe0)),
            list_result: HighlightStyle {
                color: Rgba::rgb(0xff, 0xff, 0x80),
                bold: true,
            },
        }
    }
}

impl StyleSheet {
    /// Build a style sheet from color preferences.
    pub fn from_config(colors: &ColorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            selection: HighlightStyle::from_entry(&colors.selection)?,
            result: HighlightStyle::from_entry(&colors.result)?,
            frame: HighlightStyle::from_entry(&colors.frame)?,
            generic: HighlightStyle::from_entry(&colors.generic)?,
            list_result: HighlightStyle::from_entry(&colors.list_result)?,
        })
    }

    /// Style for document highlights of the given category.
    pub fn for_category(&self, category: PainterCategory) -> HighlightStyle {
        match category {
            PainterCategory::Selection => self.selection,
            PainterCategory::Result => self.result,
            PainterCategory::Frame => self.frame,
            PainterCategory::Generic => self.generic,
        }
    }
}

/// Shared, atomically replaceable reference to the active [`StyleSheet`].
pub struct StyleRegistry {
    current: ArcSwap<StyleSheet>,
}

impl fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("current", &self.current.load())
            .finish()
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new(StyleSheet::default())
    }
}

impl StyleRegistry {
    /// Create a registry holding `sheet`.
    pub fn new(sheet: StyleSheet) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(sheet)),
        }
    }

    /// The active style sheet.
    pub fn load(&self) -> Arc<StyleSheet> {
        self.current.load_full()
    }

    /// Replace the active style sheet.
    pub fn replace(&self, sheet: StyleSheet) {
        self.current.store(Arc::new(sheet));
    }

    /// Rebuild the active style sheet from color preferences.
    ///
    /// On error the previous sheet stays active.
    pub fn apply_colors(&self, colors: &ColorConfig) -> Result<(), ConfigError> {
        let sheet = StyleSheet::from_config(colors)?;
        log::debug!("highlight colors updated");
        self.replace(sheet);
        Ok(())
    }

    /// A painter for document highlights of `category`, using the active styles.
    pub fn painter(&self, category: PainterCategory) -> Painter {
        Painter::new(category, self.current.load().for_category(category))
    }

    /// A painter for the selected item in the results list.
    pub fn list_painter(&self) -> Painter {
        Painter::new(PainterCategory::Result, self.current.load().list_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_colors() {
        assert_eq!("#ff8000".parse::<Rgba>().unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(
            "#00000080".parse::<Rgba>().unwrap(),
            Rgba::rgba(0, 0, 0, 128)
        );
        assert_eq!(Rgba::rgb(1, 2, 3).to_string(), "#010203");
        assert_eq!(Rgba::rgba(1, 2, 3, 4).to_string(), "#01020304");

        for bad in ["ff8000", "#ff80", "#gg0000", "#ff80000"] {
            assert!(matches!(
                bad.parse::<Rgba>(),
                Err(ConfigError::InvalidColor(_))
            ));
        }
    }

    #[test]
    fn test_registry_swaps_without_touching_existing_painters() {
        let registry = StyleRegistry::default();
        let before = registry.painter(PainterCategory::Result);

        let mut colors = ColorConfig::default();
        colors.result.color = "#123456".to_string();
        registry.apply_colors(&colors).unwrap();

        let after = registry.painter(PainterCategory::Result);
        assert_eq!(after.style.color, Rgba::rgb(0x12, 0x34, 0x56));
        assert_eq!(before.style, StyleSheet::default().result);
    }

    #[test]
    fn test_invalid_colors_keep_previous_sheet() {
        let registry = StyleRegistry::default();
        let mut colors = ColorConfig::default();
        colors.frame.color = "red".to_string();

        assert!(registry.apply_colors(&colors).is_err());
        assert_eq!(*registry.load(), StyleSheet::default());
    }
}
