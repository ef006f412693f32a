//! Text measurement and placement.
//!
//! Text is broken greedily at UAX#14 break opportunities, measured with the
//! glyph advances of the element's font. A formatted text element's boundary
//! follows the right edge of each line, so it is a jagged polygon rather than
//! a rectangle.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use super::position::block_origin;
use super::Formatter;
use crate::document::Document;
use crate::element::{Display, ElementId, ElementKind, ElementTree, TextLine};
use crate::error::Result;
use crate::font::GlyphMetrics;
use crate::geometry::{Boundary, Point};

/// Break `text` into lines no wider than `max_width` where possible. A
/// single word wider than the limit gets a line of its own.
pub fn break_lines(
    text: &str,
    metrics: &dyn GlyphMetrics,
    font_size: f64,
    max_width: f64,
) -> Vec<TextLine> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut start = 0;
    let mut last_break: Option<usize> = None;

    let push = |lines: &mut Vec<TextLine>, segment: &str| {
        let trimmed = segment.trim_end();
        lines.push(TextLine {
            text: trimmed.to_string(),
            width: metrics.measure(trimmed, font_size),
        });
    };

    for (position, opportunity) in linebreaks(text) {
        let width = metrics.measure(text[start..position].trim_end(), font_size);
        if width > max_width {
            if let Some(at) = last_break.filter(|&at| at > start) {
                push(&mut lines, &text[start..at]);
                start = at;
            }
        }

        match opportunity {
            BreakOpportunity::Mandatory => {
                push(&mut lines, &text[start..position]);
                start = position;
                last_break = None;
            }
            BreakOpportunity::Allowed => last_break = Some(position),
        }
    }

    lines
}

/// Boundary of stacked lines hanging from `origin`: down the right edge of
/// every line, then back along the bottom to the left edge.
pub(crate) fn trace_lines(origin: Point, widths: &[f64], line_height: f64) -> Result<Boundary> {
    if widths.is_empty() {
        return Boundary::rectangle(origin, 0.0, 0.0);
    }

    let mut boundary = Boundary::new();
    boundary.set_next(origin)?;
    let mut top = origin.y();
    for width in widths {
        let right = origin.x() + width;
        boundary
            .set_next_xy(right, top)?
            .set_next_xy(right, top - line_height)?;
        top -= line_height;
    }
    boundary.set_next_xy(origin.x(), top)?;
    boundary.close()?;
    Ok(boundary)
}

/// Breaks the text into lines and sets the element height to the line count
/// times the line height.
#[derive(Debug, Default)]
pub struct TextDimensionFormatter;

impl Formatter for TextDimensionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, document: &Document) -> Result<()> {
        let element = &tree[id];
        if element.kind() != ElementKind::Text || element.display() == Display::None {
            return Ok(());
        }

        let registry = document.font_registry()?;
        let metrics = registry.metrics(element.font_family(), element.font_style());
        let font_size = element.font_size();
        let line_height = element.line_height();
        let max_width = element.width().unwrap_or(f64::INFINITY);
        let content = element.text().map(|block| block.content.clone()).unwrap_or_default();

        let lines = break_lines(&content, metrics, font_size, max_width);
        let height = lines.len() as f64 * line_height;
        tracing::trace!(element = id.index(), lines = lines.len(), height, "measured text");

        if let Some(block) = tree[id].text_mut() {
            block.lines = lines;
            block.line_height = line_height;
        }
        tree[id].set_height(height)?;
        Ok(())
    }
}

/// Places measured text and traces its jagged boundary.
#[derive(Debug, Default)]
pub struct TextPositionFormatter;

impl Formatter for TextPositionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, _document: &Document) -> Result<()> {
        let origin = block_origin(tree, id)?;
        let element = &tree[id];
        let (widths, line_height) = match element.text() {
            Some(block) if element.display() == Display::Block => {
                (block.line_sizes(), block.line_height)
            }
            _ => (Vec::new(), 0.0),
        };
        *tree[id].boundary_mut() = trace_lines(origin, &widths, line_height)?;
        Ok(())
    }
}
