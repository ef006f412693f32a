//! # Font Management
//!
//! The registry maps a family name and a [`FontStyle`] to font data and hands
//! text formatters a [`GlyphMetrics`] provider for measuring. The standard
//! PDF families (Helvetica, Times, Courier) are always available and need no
//! embedding. Custom TrueType/OpenType fonts are registered from bytes and
//! measured with ttf-parser.

pub mod metrics;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use metrics::StandardFontMetrics;

use crate::error::{PlumeError, Result};

/// Glyph advance lookup used for line breaking.
pub trait GlyphMetrics {
    /// Advance width of `ch` in points at `font_size`.
    fn char_width(&self, ch: char, font_size: f64) -> f64;

    /// Width of a whole string in points.
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Parse a style name such as `"bold-italic"`. Unknown names fall back to
    /// [`FontStyle::Normal`].
    pub fn parse(name: &str) -> FontStyle {
        match name.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "BOLD" => FontStyle::Bold,
            "ITALIC" => FontStyle::Italic,
            "BOLD_ITALIC" => FontStyle::BoldItalic,
            _ => FontStyle::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "bold-italic",
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub style: FontStyle,
}

impl FontKey {
    pub fn new(family: &str, style: FontStyle) -> Self {
        Self {
            family: family.to_string(),
            style,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType/OpenType font that is embedded in the output.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

impl FontData {
    pub fn metrics(&self) -> &dyn GlyphMetrics {
        match self {
            FontData::Standard(font) => font.metrics(),
            FontData::Custom { metrics, .. } => metrics,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    pub fn from_font_data(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| PlumeError::Font(format!("failed to parse font data: {}", e)))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();

        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code| {
                    let Some(ch) = char::from_u32(code) else {
                        return;
                    };
                    if let Some(glyph_id) = face.glyph_index(ch) {
                        let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                        advance_widths.insert(ch, advance);
                        glyph_ids.insert(ch, glyph_id.0);
                    }
                });
            }
        }

        let default_advance = match advance_widths.get(&' ') {
            Some(&space) if space > 0 => space,
            _ => units_per_em / 2,
        };

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

impl GlyphMetrics for CustomFontMetrics {
    fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF base font name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &StandardFontMetrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => {
                &StandardFontMetrics::HELVETICA_BOLD
            }
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => {
                &StandardFontMetrics::TIMES
            }
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &StandardFontMetrics::COURIER,
        }
    }
}

static FALLBACK: FontData = FontData::Standard(StandardFont::Helvetica);

/// Maps font family + style to font data.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let standard = [
            ("Helvetica", FontStyle::Normal, StandardFont::Helvetica),
            ("Helvetica", FontStyle::Bold, StandardFont::HelveticaBold),
            ("Helvetica", FontStyle::Italic, StandardFont::HelveticaOblique),
            ("Helvetica", FontStyle::BoldItalic, StandardFont::HelveticaBoldOblique),
            ("Times", FontStyle::Normal, StandardFont::TimesRoman),
            ("Times", FontStyle::Bold, StandardFont::TimesBold),
            ("Times", FontStyle::Italic, StandardFont::TimesItalic),
            ("Times", FontStyle::BoldItalic, StandardFont::TimesBoldItalic),
            ("Courier", FontStyle::Normal, StandardFont::Courier),
            ("Courier", FontStyle::Bold, StandardFont::CourierBold),
            ("Courier", FontStyle::Italic, StandardFont::CourierOblique),
            ("Courier", FontStyle::BoldItalic, StandardFont::CourierBoldOblique),
        ];

        let fonts = standard
            .into_iter()
            .map(|(family, style, font)| (FontKey::new(family, style), FontData::Standard(font)))
            .collect();

        Self { fonts }
    }

    /// Register a custom font. Fails when the data is not a parsable font.
    pub fn register(&mut self, family: &str, style: FontStyle, data: Vec<u8>) -> Result<()> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        tracing::debug!(family, style = style.as_str(), glyphs = metrics.glyph_ids.len(), "registered font");
        self.fonts
            .insert(FontKey::new(family, style), FontData::Custom { data, metrics });
        Ok(())
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.fonts.keys().any(|key| key.family == family)
    }

    /// Look up a font. Missing styles fall back to the family's normal
    /// style, unknown families to Helvetica.
    pub fn resolve(&self, family: &str, style: FontStyle) -> &FontData {
        self.resolve_key(family, style).1
    }

    /// Like [`resolve`](Self::resolve), also returning the key that matched.
    pub fn resolve_key(&self, family: &str, style: FontStyle) -> (FontKey, &FontData) {
        let candidates = [
            FontKey::new(family, style),
            FontKey::new(family, FontStyle::Normal),
            FontKey::new("Helvetica", style),
            FontKey::new("Helvetica", FontStyle::Normal),
        ];
        for key in candidates {
            if let Some(font) = self.fonts.get(&key) {
                return (key, font);
            }
        }
        (FontKey::new("Helvetica", FontStyle::Normal), &FALLBACK)
    }

    pub fn metrics(&self, family: &str, style: FontStyle) -> &dyn GlyphMetrics {
        self.resolve(family, style).metrics()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &FontData)> {
        self.fonts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_parsing() {
        assert_eq!(FontStyle::parse("bold"), FontStyle::Bold);
        assert_eq!(FontStyle::parse("Bold-Italic"), FontStyle::BoldItalic);
        assert_eq!(FontStyle::parse("italic"), FontStyle::Italic);
        assert_eq!(FontStyle::parse("heavy"), FontStyle::Normal);
        assert_eq!(FontStyle::BoldItalic.as_str(), "bold-italic");
    }

    #[test]
    fn helvetica_space() {
        let registry = FontRegistry::new();
        let w = registry
            .metrics("Helvetica", FontStyle::Normal)
            .char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn bold_is_wider() {
        let registry = FontRegistry::new();
        let regular = registry.metrics("Helvetica", FontStyle::Normal).measure("Bold", 12.0);
        let bold = registry.metrics("Helvetica", FontStyle::Bold).measure("Bold", 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn unknown_family_falls_back_to_helvetica() {
        let registry = FontRegistry::new();
        let (key, font) = registry.resolve_key("Nope", FontStyle::Bold);
        assert_eq!(key, FontKey::new("Helvetica", FontStyle::Bold));
        assert!(matches!(font, FontData::Standard(StandardFont::HelveticaBold)));
    }

    #[test]
    fn invalid_font_data_is_rejected() {
        let mut registry = FontRegistry::new();
        let result = registry.register("Broken", FontStyle::Normal, vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(PlumeError::Font(_))));
        assert!(!registry.has_family("Broken"));
    }
}
