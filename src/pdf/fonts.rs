//! Embedding custom TrueType fonts as CIDFontType2.
//!
//! Five objects per font: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap
//! and the Type0 root referenced from page resources. The whole font file is
//! embedded, so CIDs are the font's own glyph ids (`/CIDToGIDMap /Identity`).

use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use super::PdfBuilder;
use crate::error::{PlumeError, Result};
use crate::font::FontKey;

/// Write the font objects and return the id of the Type0 dictionary.
pub(super) fn write_custom_font(
    builder: &mut PdfBuilder,
    key: &FontKey,
    ttf_data: &[u8],
    used_chars: &HashSet<char>,
) -> Result<usize> {
    let face = ttf_parser::Face::parse(ttf_data, 0).map_err(|e| {
        PlumeError::Font(format!("failed to parse font \"{}\": {}", key.family, e))
    })?;

    let char_to_gid: HashMap<char, u16> = used_chars
        .iter()
        .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid.0)))
        .collect();

    let units_per_em = face.units_per_em();
    let scale = 1000.0 / units_per_em as f64;
    let font_name = sanitize_font_name(key);

    let compressed = compress_to_vec_zlib(ttf_data, 6);
    let fontfile_id = builder.push_stream(
        &format!("/Length1 {} /Filter /FlateDecode", ttf_data.len()),
        &compressed,
    );

    let bbox = face.global_bounding_box();
    let ascender = face.ascender();
    let cap_height = face.capital_height().unwrap_or(ascender);
    let descriptor_id = builder.push(
        format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            if key.style.is_italic() { -12 } else { 0 },
            (ascender as f64 * scale) as i32,
            (face.descender() as f64 * scale) as i32,
            (cap_height as f64 * scale) as i32,
            if key.style.is_bold() { 120 } else { 80 },
            fontfile_id,
        )
        .into_bytes(),
    );

    let default_width = face
        .glyph_hor_advance(ttf_parser::GlyphId(0))
        .map(|advance| (advance as f64 * scale) as u32)
        .unwrap_or(1000);
    let cidfont_id = builder.push(
        format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            font_name,
            descriptor_id,
            default_width,
            build_w_array(&char_to_gid, &face, scale),
        )
        .into_bytes(),
    );

    let cmap = build_tounicode_cmap(&char_to_gid, &font_name);
    let tounicode_id = builder.push_stream(
        "/Filter /FlateDecode",
        &compress_to_vec_zlib(cmap.as_bytes(), 6),
    );

    Ok(builder.push(
        format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            font_name, cidfont_id, tounicode_id
        )
        .into_bytes(),
    ))
}

/// Per-glyph widths as `[gid [width] gid [width] ...]`.
fn build_w_array(char_to_gid: &HashMap<char, u16>, face: &ttf_parser::Face, scale: f64) -> String {
    let mut gids: Vec<u16> = char_to_gid.values().copied().collect();
    gids.sort_unstable();
    gids.dedup();

    let mut result = String::from("[");
    for gid in gids {
        let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
        let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
    }
    result.push_str(" ]");
    result
}

/// ToUnicode CMap so text can be extracted and copied.
fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
    let mut mappings: Vec<(u16, u32)> = char_to_gid
        .iter()
        .map(|(&ch, &gid)| (gid, ch as u32))
        .collect();
    mappings.sort_unstable();

    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    // at most 100 entries per bfchar block
    for chunk in mappings.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(gid, unicode) in chunk {
            if unicode > 0xFFFF {
                let v = unicode - 0x10000;
                let _ = writeln!(
                    cmap,
                    "<{:04X}> <{:04X}{:04X}>",
                    gid,
                    0xD800 + (v >> 10),
                    0xDC00 + (v & 0x3FF)
                );
            } else {
                let _ = writeln!(cmap, "<{:04X}> <{:04X}>", gid, unicode);
            }
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

/// A PDF name for the font: the family without spaces or punctuation plus
/// style suffixes.
fn sanitize_font_name(key: &FontKey) -> String {
    let mut name: String = key
        .family
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        name = "CustomFont".to_string();
    }
    if key.style.is_bold() {
        name.push_str("-Bold");
    }
    if key.style.is_italic() {
        name.push_str("-Italic");
    }
    name
}
