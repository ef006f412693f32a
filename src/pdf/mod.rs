//! # PDF Surface
//!
//! A [`DrawingSurface`] that writes PDF 1.7. Drawing calls append operators
//! to per-page content streams as they arrive; [`PdfSurface::render`] then
//! assembles fonts, images, pages and the cross-reference table.
//!
//! Element geometry is already in PDF user space (origin bottom-left, Y up),
//! so coordinates are written as they come.
//!
//! ## Fonts
//!
//! Standard PDF fonts (Helvetica, Times, Courier) use simple Type1 references
//! with WinAnsi encoding. Custom TrueType fonts are embedded whole as
//! CIDFontType2 with Identity-H encoding, and text in them is written as
//! glyph ids.

mod fonts;

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::rc::Rc;

use indexmap::IndexMap;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::color::Color;
use crate::document::Metadata;
use crate::draw::{DrawingSurface, FillMode, LineStyle, TextRun};
use crate::error::{PlumeError, Result};
use crate::font::{FontData, FontKey, FontRegistry};
use crate::geometry::{Point, Rect};
use crate::image_loader::{ImagePixels, LoadedImage};

struct PdfPage {
    width: f64,
    height: f64,
    content: String,
    line_style: LineStyle,
    /// Indexes into `PdfSurface::images` drawn on this page.
    images: Vec<usize>,
}

/// Tracks allocated PDF objects during rendering.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 is the free-list head, 1 the catalog, 2 the page tree.
        Self {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict: &str, data: &[u8]) -> usize {
        let mut object = Vec::with_capacity(data.len() + dict.len() + 32);
        let _ = write!(object, "<< {} /Length {} >>\nstream\n", dict, data.len());
        object.extend_from_slice(data);
        object.extend_from_slice(b"\nendstream");
        self.push(object)
    }
}

pub struct PdfSurface {
    fonts: Rc<FontRegistry>,
    metadata: Metadata,
    pages: Vec<PdfPage>,
    /// Fonts used so far, in resource order (`/F0`, `/F1`, ...), with the
    /// characters written in each.
    used_fonts: IndexMap<FontKey, HashSet<char>>,
    images: Vec<LoadedImage>,
}

impl std::fmt::Debug for PdfSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSurface")
            .field("pages", &self.pages.len())
            .field("fonts", &self.used_fonts.len())
            .field("images", &self.images.len())
            .finish()
    }
}

impl PdfSurface {
    pub fn new(fonts: Rc<FontRegistry>, metadata: Metadata) -> Self {
        Self {
            fonts,
            metadata,
            pages: Vec::new(),
            used_fonts: IndexMap::new(),
            images: Vec::new(),
        }
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PdfPage> {
        let len = self.pages.len();
        self.pages
            .get_mut(page)
            .ok_or(PlumeError::OutOfBounds { index: page, len })
    }

    fn write_path(stream: &mut String, points: &[Point]) {
        for (i, point) in points.iter().enumerate() {
            let op = if i == 0 { "m" } else { "l" };
            let _ = writeln!(stream, "{:.2} {:.2} {}", point.x(), point.y(), op);
        }
        stream.push_str("h\n");
    }

    /// Encode `text` for a standard font: WinAnsi bytes inside a literal
    /// string, octal escapes outside printable ASCII.
    fn winansi_literal(text: &str) -> String {
        let mut literal = String::with_capacity(text.len() + 2);
        literal.push('(');
        for ch in text.chars() {
            match unicode_to_winansi(ch).unwrap_or(b'?') {
                b'\\' => literal.push_str("\\\\"),
                b'(' => literal.push_str("\\("),
                b')' => literal.push_str("\\)"),
                b @ 0x20..=0x7E => literal.push(b as char),
                b => {
                    let _ = write!(literal, "\\{:03o}", b);
                }
            }
        }
        literal.push(')');
        literal
    }

    fn build_info(&self) -> String {
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", name, escape_pdf_string(value));
            }
        }
        let creator = self.metadata.creator.as_deref().unwrap_or("Plume");
        let _ = write!(
            info,
            "/Creator ({}) /Producer (Plume {}) >>",
            escape_pdf_string(creator),
            env!("CARGO_PKG_VERSION")
        );
        info
    }

    fn write_image(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixels::Jpeg { data, grayscale } => {
                let color_space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px, image.height_px, color_space
                );
                builder.push_stream(&dict, data)
            }
            ImagePixels::Decoded { rgb, alpha } => {
                let smask = alpha.as_ref().map(|alpha| {
                    let dict = format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                        image.width_px, image.height_px
                    );
                    builder.push_stream(&dict, &compress_to_vec_zlib(alpha, 6))
                });
                let smask_ref = smask
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, &compress_to_vec_zlib(rgb, 6))
            }
        }
    }

    fn write_fonts(&self, builder: &mut PdfBuilder) -> Result<Vec<usize>> {
        let mut ids = Vec::with_capacity(self.used_fonts.len());
        for (key, chars) in &self.used_fonts {
            let id = match self.fonts.resolve(&key.family, key.style) {
                FontData::Standard(font) => builder.push(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        font.pdf_name()
                    )
                    .into_bytes(),
                ),
                FontData::Custom { data, .. } => {
                    fonts::write_custom_font(builder, key, data, chars)?
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, object) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(object);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_id,
            xref_offset
        );
        output
    }
}

impl DrawingSurface for PdfSurface {
    fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        self.pages.push(PdfPage {
            width,
            height,
            content: String::new(),
            line_style: LineStyle::default(),
            images: Vec::new(),
        });
        Ok(self.pages.len() - 1)
    }

    fn set_line_style(&mut self, page: usize, style: &LineStyle) -> Result<()> {
        self.page_mut(page)?.line_style = style.clone();
        Ok(())
    }

    fn draw_polygon(
        &mut self,
        page: usize,
        points: &[Point],
        mode: FillMode,
        color: Color,
    ) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let page = self.page_mut(page)?;
        let stream = &mut page.content;
        stream.push_str("q\n");
        match mode {
            FillMode::Fill => {
                let _ = writeln!(stream, "{:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
                Self::write_path(stream, points);
                stream.push_str("f\n");
            }
            FillMode::Stroke => {
                let style = &page.line_style;
                let dash = style
                    .dash
                    .iter()
                    .map(|d| format!("{:.2}", d))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(
                    stream,
                    "{:.3} {:.3} {:.3} RG\n{:.2} w\n[{}] 0 d",
                    color.r, color.g, color.b, style.width, dash
                );
                Self::write_path(stream, points);
                stream.push_str("S\n");
            }
        }
        stream.push_str("Q\n");
        Ok(())
    }

    fn draw_text(&mut self, page: usize, run: &TextRun) -> Result<()> {
        self.page_mut(page)?;

        let (key, font) = self.fonts.resolve_key(&run.font_family, run.font_style);
        let encoded = match font {
            FontData::Standard(_) => Self::winansi_literal(&run.text),
            FontData::Custom { metrics, .. } => {
                let mut hex = String::from("<");
                for ch in run.text.chars() {
                    let gid = metrics.glyph_ids.get(&ch).copied().unwrap_or(0);
                    let _ = write!(hex, "{:04X}", gid);
                }
                hex.push('>');
                hex
            }
        };
        let entry = self.used_fonts.entry(key);
        let index = entry.index();
        entry.or_default().extend(run.text.chars());

        let stream = &mut self.page_mut(page)?.content;
        let _ = write!(
            stream,
            "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n{} Tj\nET\n",
            run.color.r, run.color.g, run.color.b, index, run.font_size, run.x, run.y, encoded
        );
        Ok(())
    }

    fn draw_image(&mut self, page: usize, image: &LoadedImage, rect: Rect) -> Result<()> {
        self.page_mut(page)?;
        let index = self.images.len();
        self.images.push(image.clone());

        let page = self.page_mut(page)?;
        page.images.push(index);
        let _ = write!(
            page.content,
            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
            rect.width, rect.height, rect.x, rect.y, index
        );
        Ok(())
    }

    fn render(&mut self) -> Result<Vec<u8>> {
        let mut builder = PdfBuilder::new();

        let font_ids = self.write_fonts(&mut builder)?;
        let font_resources = font_ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");
        let image_ids: Vec<usize> = self
            .images
            .iter()
            .map(|image| Self::write_image(&mut builder, image))
            .collect();

        let mut page_ids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let compressed = compress_to_vec_zlib(page.content.as_bytes(), 6);
            let content_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let mut resources = format!("/Font << {} >>", font_resources);
            if !page.images.is_empty() {
                let xobjects = page
                    .images
                    .iter()
                    .map(|&i| format!("/Im{} {} 0 R", i, image_ids[i]))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(resources, " /XObject << {} >>", xobjects);
            }
            let page_id = builder.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {} 0 R /Resources << {} >> >>",
                    page.width, page.height, content_id, resources
                )
                .into_bytes(),
            );
            page_ids.push(page_id);
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] =
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes();

        let info_id = builder.push(self.build_info().into_bytes());
        let output = Self::serialize(&builder, info_id);
        tracing::debug!(
            pages = self.pages.len(),
            fonts = font_ids.len(),
            images = image_ids.len(),
            bytes = output.len(),
            "rendered pdf"
        );
        Ok(output)
    }
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// holds typographic punctuation and a few accented letters.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontStyle;

    fn surface() -> PdfSurface {
        PdfSurface::new(Rc::new(FontRegistry::new()), Metadata::default())
    }

    fn run(text: &str, style: FontStyle) -> TextRun {
        TextRun {
            text: text.to_string(),
            x: 10.0,
            y: 20.0,
            font_family: "Helvetica".to_string(),
            font_style: style,
            font_size: 12.0,
            color: Color::BLACK,
        }
    }

    #[test]
    fn empty_document_is_valid_pdf() {
        let mut surface = surface();
        surface.add_page(595.28, 841.89).unwrap();
        let bytes = surface.render().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595.28 841.89]"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn metadata_goes_into_info() {
        let mut surface = PdfSurface::new(
            Rc::new(FontRegistry::new()),
            Metadata {
                title: Some("Quarterly (draft)".to_string()),
                author: Some("Plume".to_string()),
                ..Default::default()
            },
        );
        surface.add_page(100.0, 100.0).unwrap();
        let text = String::from_utf8_lossy(&surface.render().unwrap()).into_owned();
        assert!(text.contains("/Title (Quarterly \\(draft\\))"));
        assert!(text.contains("/Author (Plume)"));
    }

    #[test]
    fn styles_register_separate_fonts() {
        let mut surface = surface();
        surface.add_page(100.0, 100.0).unwrap();
        surface.draw_text(0, &run("Hi", FontStyle::Normal)).unwrap();
        surface.draw_text(0, &run("Hi", FontStyle::Bold)).unwrap();
        surface.draw_text(0, &run("again", FontStyle::Normal)).unwrap();
        assert_eq!(surface.used_fonts.len(), 2);
        assert!(surface.pages[0].content.contains("/F1 12.0 Tf"));

        let text = String::from_utf8_lossy(&surface.render().unwrap()).into_owned();
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
        assert!(!text.contains("CIDFontType2"));
    }

    #[test]
    fn winansi_escaping() {
        assert_eq!(PdfSurface::winansi_literal("a(b)\\"), "(a\\(b\\)\\\\)");
        assert_eq!(PdfSurface::winansi_literal("\u{20AC}\u{E9}"), "(\\200\\351)");
        assert_eq!(PdfSurface::winansi_literal("\u{4E2D}"), "(?)");
    }

    #[test]
    fn stroke_uses_the_current_line_style() {
        let mut surface = surface();
        surface.add_page(100.0, 100.0).unwrap();
        surface
            .set_line_style(
                0,
                &LineStyle {
                    width: 2.0,
                    dash: vec![6.0, 4.0],
                },
            )
            .unwrap();
        let square = [
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        surface
            .draw_polygon(0, &square, FillMode::Stroke, Color::BLACK)
            .unwrap();
        let content = &surface.pages[0].content;
        assert!(content.contains("2.00 w\n[6.00 4.00] 0 d"));
        assert!(content.contains("0.00 10.00 m\n10.00 10.00 l"));
        assert!(content.contains("S\nQ\n"));
    }

    #[test]
    fn unknown_page_is_out_of_bounds() {
        let mut surface = surface();
        assert!(matches!(
            surface.draw_text(3, &run("x", FontStyle::Normal)),
            Err(PlumeError::OutOfBounds { index: 3, len: 0 })
        ));
    }

    #[test]
    fn images_become_xobjects() {
        let mut surface = surface();
        surface.add_page(100.0, 100.0).unwrap();
        let image = LoadedImage {
            pixel_data: ImagePixels::Decoded {
                rgb: vec![255; 2 * 2 * 3],
                alpha: Some(vec![128; 4]),
            },
            width_px: 2,
            height_px: 2,
        };
        let rect = Rect {
            x: 5.0,
            y: 5.0,
            width: 20.0,
            height: 20.0,
        };
        surface.draw_image(0, &image, rect).unwrap();

        let text = String::from_utf8_lossy(&surface.render().unwrap()).into_owned();
        assert!(text.contains("/Subtype /Image"));
        assert!(text.contains("/SMask"));
        assert!(text.contains("/XObject << /Im0"));
    }
}
