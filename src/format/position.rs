//! Block positioning.
//!
//! Elements stack vertically inside their parent's padding box: an element
//! starts below its previous visible sibling (plus that sibling's bottom
//! margin) and its own top margin, or at the parent's content top when it is
//! the first. Both horizontal margins set to `auto` center the element.

use super::Formatter;
use crate::document::Document;
use crate::element::{Display, ElementId, ElementTree};
use crate::error::{PlumeError, Result};
use crate::geometry::{Boundary, Point};

/// Top-left corner of the element's border box.
pub(crate) fn block_origin(tree: &ElementTree, id: ElementId) -> Result<Point> {
    let element = &tree[id];
    let parent = tree.parent(id).ok_or_else(|| {
        PlumeError::Usage(format!(
            "{} element has no parent to be positioned in",
            element.kind().name()
        ))
    })?;
    let container = &tree[parent];
    let corner = container.start_drawing_point().ok_or_else(|| {
        PlumeError::State(format!(
            "{} element must be positioned before its children",
            container.kind().name()
        ))
    })?;

    let siblings = tree.children(parent);
    let previous = siblings
        .iter()
        .position(|&sibling| sibling == id)
        .and_then(|index| {
            siblings[..index].iter().rev().find(|&&sibling| {
                tree[sibling].display() == Display::Block
                    && tree[sibling].end_drawing_point().is_some()
            })
        });

    let flow_top = match previous.and_then(|&sibling| {
        tree[sibling]
            .end_drawing_point()
            .map(|end| end.y() - tree[sibling].margin_bottom().resolve())
    }) {
        Some(bottom) => bottom,
        None => corner.y() - container.padding_top(),
    };
    let top = flow_top - element.margin_top().resolve();

    let left = corner.x() + container.padding_left();
    let x = if element.margin_left().is_auto() && element.margin_right().is_auto() {
        let free = container.width_without_paddings() - element.width().unwrap_or(0.0);
        left + (free / 2.0).max(0.0)
    } else {
        left + element.margin_left().resolve()
    };

    Ok(Point::new(x, top))
}

/// Places the element as a rectangle of its current size.
#[derive(Debug, Default)]
pub struct StandardPositionFormatter;

impl Formatter for StandardPositionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, _document: &Document) -> Result<()> {
        let origin = block_origin(tree, id)?;
        let width = tree[id].width().unwrap_or(0.0);
        let height = tree[id].height().unwrap_or(0.0);
        *tree[id].boundary_mut() = Boundary::rectangle(origin, width, height)?;
        Ok(())
    }
}
