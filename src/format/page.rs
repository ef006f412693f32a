//! Pages and pagination.
//!
//! A page spans the whole sheet: its boundary runs from `(0, height)` to
//! `(width, 0)` and its padding is the printable margin. Pagination walks the
//! pages of a collection in order and pushes content that runs past a page's
//! bottom padding onto continuation pages, splitting the element that
//! crosses the edge where it allows it.

use super::Formatter;
use crate::document::Document;
use crate::element::{Display, ElementId, ElementKind, ElementTree};
use crate::error::Result;
use crate::geometry::{Boundary, Point};

const EPSILON: f64 = 1e-6;

/// Sizes the page, builds its boundary and lays out the header and footer.
#[derive(Debug, Default)]
pub struct PageFormatter;

impl Formatter for PageFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, document: &Document) -> Result<()> {
        let (default_width, default_height) = document.config().page_size.dimensions();
        let width = tree[id].width().unwrap_or(default_width);
        let height = tree[id].height().unwrap_or(default_height);
        tree[id].set_width(width)?.set_height(height)?;
        *tree[id].boundary_mut() = Boundary::rectangle(Point::new(0.0, height), width, height)?;

        if let Some(header) = tree.placeholder(id, "header") {
            tree.format(header, document)?;
            // Laid out like a first child, so lift it out of the top padding.
            let lift = tree[id].padding_top();
            tree.translate(header, 0.0, -lift);
        }

        if let Some(footer) = tree.placeholder(id, "footer") {
            tree.format(footer, document)?;
            if let Some(end) = tree.end_drawing_point(footer) {
                let target = tree[footer].margin_bottom().resolve();
                tree.translate(footer, 0.0, end.y() - target);
            }
        }
        Ok(())
    }
}

/// Moves overflowing content of each page onto continuation pages.
#[derive(Debug, Default)]
pub struct PaginationFormatter;

impl Formatter for PaginationFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, _document: &Document) -> Result<()> {
        if tree[id].kind() != ElementKind::PageCollection {
            return Ok(());
        }

        let mut index = 0;
        while index < tree.children(id).len() {
            let page = tree.children(id)[index];
            if let Some(next) = paginate(tree, page)? {
                tracing::debug!(
                    page = index,
                    moved = tree.children(next).len(),
                    "content continues on a new page"
                );
            }
            index += 1;
        }
        Ok(())
    }
}

/// Push the overflow of `page` onto a new page inserted right after it.
fn paginate(tree: &mut ElementTree, page: ElementId) -> Result<Option<ElementId>> {
    let Some(top_left) = tree.start_drawing_point(page) else {
        return Ok(None);
    };
    let bottom = tree
        .end_drawing_point(page)
        .map_or(0.0, |end| end.y())
        + tree[page].padding_bottom();

    let children = tree.children(page).to_vec();
    let Some(position) = children.iter().position(|&child| overflows(tree, child, bottom)) else {
        return Ok(None);
    };
    let crossing = children[position];

    let available = tree
        .start_drawing_point(crossing)
        .map_or(0.0, |start| start.y() - bottom);
    let first_moved = if available > EPSILON && tree.split(crossing, available)?.is_some() {
        position + 1
    } else if position == 0 {
        // Nothing is gained by moving the first element of a page.
        tracing::warn!(page = page.index(), "element does not fit on an empty page");
        1
    } else {
        position
    };

    let moving: Vec<ElementId> = tree.children(page)[first_moved.min(tree.children(page).len())..]
        .to_vec();
    if moving.is_empty() {
        return Ok(None);
    }

    let next = tree.clone_shell(page);
    tree.insert_after(page, next)?;

    let content_top = top_left.y() - tree[page].padding_top();
    let first = moving[0];
    let first_top = tree
        .start_drawing_point(first)
        .map_or(content_top, |start| start.y());
    let shift = first_top + tree[first].margin_top().resolve() - content_top;

    for child in moving {
        tree.append_child(next, child)?;
        tree.translate(child, 0.0, shift);
    }
    Ok(Some(next))
}

fn overflows(tree: &ElementTree, child: ElementId, bottom: f64) -> bool {
    tree[child].display() == Display::Block
        && tree
            .end_drawing_point(child)
            .is_some_and(|end| end.y() < bottom - EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentConfig, PageSize};
    use crate::draw::RecordingSurface;

    fn document(width: f64, height: f64) -> Document {
        Document::with_config(
            Box::new(RecordingSurface::new()),
            DocumentConfig {
                page_size: PageSize::Custom { width, height },
                ..Default::default()
            },
        )
    }

    fn block(tree: &mut ElementTree, parent: ElementId, height: f64) -> ElementId {
        let id = tree.create(ElementKind::Container);
        tree[id].set_height(height).unwrap();
        tree.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn page_uses_default_size() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        PageFormatter.format(&mut tree, page, &document).unwrap();

        assert_eq!(tree[page].width(), Some(200.0));
        assert_eq!(tree.start_drawing_point(page), Some(Point::new(0.0, 300.0)));
        assert_eq!(tree.end_drawing_point(page), Some(Point::new(200.0, 0.0)));
    }

    #[test]
    fn header_and_footer_hug_the_edges() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        tree[page].set_padding(&[20.into()]).unwrap();
        let header = tree.create(ElementKind::Container);
        let footer = tree.create(ElementKind::Container);
        tree[header].set_height(10.0).unwrap();
        tree[footer].set_height(10.0).unwrap();
        tree.set_placeholder(page, "header", header).unwrap();
        tree.set_placeholder(page, "footer", footer).unwrap();

        PageFormatter.format(&mut tree, page, &document).unwrap();

        assert_eq!(tree.start_drawing_point(header), Some(Point::new(20.0, 300.0)));
        assert_eq!(tree.end_drawing_point(footer), Some(Point::new(180.0, 0.0)));
    }

    #[test]
    fn overflow_moves_to_continuation_page() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let collection = tree.create(ElementKind::PageCollection);
        let page = tree.create(ElementKind::Page);
        tree.append_child(collection, page).unwrap();
        tree[page].set_padding(&[10.into()]).unwrap();

        let first = block(&mut tree, page, 200.0);
        let second = block(&mut tree, page, 200.0);
        tree[second].set_splittable(false).unwrap();

        tree.format(collection, &document).unwrap();

        let pages = tree.children(collection).to_vec();
        assert_eq!(pages.len(), 2);
        assert_eq!(tree.children(pages[0]), &[first]);
        assert_eq!(tree.children(pages[1]), &[second]);
        assert_eq!(tree.start_drawing_point(second), Some(Point::new(10.0, 290.0)));
    }

    #[test]
    fn crossing_content_is_split() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let collection = tree.create(ElementKind::PageCollection);
        let page = tree.create(ElementKind::Page);
        tree.append_child(collection, page).unwrap();

        block(&mut tree, page, 100.0);
        let tall = block(&mut tree, page, 600.0);

        tree.format(collection, &document).unwrap();

        let pages = tree.children(collection).to_vec();
        assert_eq!(pages.len(), 3);
        assert_eq!(tree[tall].height(), Some(200.0));

        let continued = tree.children(pages[1])[0];
        assert_eq!(tree[continued].height(), Some(300.0));
        assert_eq!(tree.start_drawing_point(continued), Some(Point::new(0.0, 300.0)));

        let last = tree.children(pages[2])[0];
        assert_eq!(tree[last].height(), Some(100.0));
        assert_eq!(tree.end_drawing_point(last), Some(Point::new(200.0, 200.0)));
    }

    #[test]
    fn oversized_first_element_stays() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let collection = tree.create(ElementKind::PageCollection);
        let page = tree.create(ElementKind::Page);
        tree.append_child(collection, page).unwrap();

        let huge = block(&mut tree, page, 400.0);
        tree[huge].set_splittable(false).unwrap();
        let after = block(&mut tree, page, 50.0);

        tree.format(collection, &document).unwrap();

        let pages = tree.children(collection).to_vec();
        assert_eq!(pages.len(), 2);
        assert_eq!(tree.children(pages[0]), &[huge]);
        assert_eq!(tree.children(pages[1]), &[after]);
    }

    #[test]
    fn continuation_pages_copy_placeholders() {
        let document = document(200.0, 300.0);
        let mut tree = ElementTree::new();
        let collection = tree.create(ElementKind::PageCollection);
        let page = tree.create(ElementKind::Page);
        tree.append_child(collection, page).unwrap();
        let header = tree.create(ElementKind::Container);
        tree[header].set_height(10.0).unwrap();
        tree.set_placeholder(page, "header", header).unwrap();

        let a = block(&mut tree, page, 250.0);
        tree[a].set_splittable(false).unwrap();
        let b = block(&mut tree, page, 250.0);
        tree[b].set_splittable(false).unwrap();

        tree.format(collection, &document).unwrap();

        let pages = tree.children(collection).to_vec();
        assert_eq!(pages.len(), 2);
        let copied = tree.placeholder(pages[1], "header").unwrap();
        assert_ne!(copied, header);
        assert_eq!(tree.start_drawing_point(copied), tree.start_drawing_point(header));
    }
}
