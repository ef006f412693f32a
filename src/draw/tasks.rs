//! Turning a formatted tree into drawing tasks.
//!
//! Pages are numbered in tree order. Page creation runs at
//! [`priority::PAGE`], before anything else, so page `n` of the collection
//! is surface page `n` by the time content is drawn on it.

use super::{priority, DrawingTask, DrawingTaskQueue, TextRun};
use crate::color::Color;
use crate::document::Document;
use crate::element::{Display, ElementId, ElementKind, ElementTree};
use crate::enhancement::DrawTarget;
use crate::error::{PlumeError, Result};
use crate::geometry::Rect;

/// Share of the font size above the baseline.
const ASCENT: f64 = 0.8;

impl ElementTree {
    /// Queue the drawing tasks of every page under `root`.
    pub fn collect_drawing_tasks(
        &self,
        root: ElementId,
        document: &Document,
        queue: &mut DrawingTaskQueue,
    ) -> Result<()> {
        for (page, id) in self.children(root).iter().enumerate() {
            self.collect_element_tasks(*id, page, document, queue)?;
        }
        Ok(())
    }

    fn collect_element_tasks(
        &self,
        id: ElementId,
        page: usize,
        document: &Document,
        queue: &mut DrawingTaskQueue,
    ) -> Result<()> {
        let element = &self[id];
        if element.display() == Display::None {
            return Ok(());
        }

        match element.kind() {
            ElementKind::Page => {
                let (default_width, default_height) = document.config().page_size.dimensions();
                let width = element.width().unwrap_or(default_width);
                let height = element.height().unwrap_or(default_height);
                queue.push(DrawingTask::new(priority::PAGE, move |surface| {
                    surface.add_page(width, height).map(|_| ())
                }));
            }
            ElementKind::Text => self.queue_text(id, page, queue)?,
            ElementKind::Image => self.queue_image(id, page, document, queue)?,
            ElementKind::PageCollection | ElementKind::Container => {}
        }

        let target = DrawTarget {
            page,
            kind: element.kind(),
            boundary: element.boundary().clone(),
        };
        for enhancement in document.enhancements(element.enhancements())? {
            queue.extend(enhancement.drawing_tasks(&target)?);
        }

        let nested: Vec<ElementId> = element
            .placeholder_ids()
            .chain(element.children().iter().copied())
            .collect();
        for child in nested {
            self.collect_element_tasks(child, page, document, queue)?;
        }
        Ok(())
    }

    fn queue_text(&self, id: ElementId, page: usize, queue: &mut DrawingTaskQueue) -> Result<()> {
        let element = &self[id];
        let (block, start) = match (element.text(), element.start_drawing_point()) {
            (Some(block), Some(start)) => (block, start),
            _ => return Ok(()),
        };

        let font_size = element.font_size();
        let line_height = block.line_height;
        let color = element.color().unwrap_or(Color::BLACK);
        for (i, line) in block.lines.iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            let top = start.y() - line_height * i as f64;
            let run = TextRun {
                text: line.text.clone(),
                x: start.x(),
                y: top - (line_height - font_size) / 2.0 - font_size * ASCENT,
                font_family: element.font_family().to_string(),
                font_style: element.font_style(),
                font_size,
                color,
            };
            queue.push(DrawingTask::foreground(move |surface| {
                surface.draw_text(page, &run)
            }));
        }
        Ok(())
    }

    fn queue_image(
        &self,
        id: ElementId,
        page: usize,
        document: &Document,
        queue: &mut DrawingTaskQueue,
    ) -> Result<()> {
        let element = &self[id];
        let src = element
            .src()
            .ok_or_else(|| PlumeError::Image("image element has no src".to_string()))?;
        let (start, end) = match (element.start_drawing_point(), element.end_drawing_point()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Ok(()),
        };

        let image = document.image(src)?;
        let rect = Rect::from_corners(start, end);
        queue.push(DrawingTask::foreground(move |surface| {
            surface.draw_image(page, &image, rect)
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::attributes::{AttributeBag, Value};
    use crate::document::{Document, DocumentConfig, PageSize};
    use crate::draw::{FillMode, RecordingSurface, SurfaceCall};
    use crate::element::{ElementKind, ElementTree};
    use crate::enhancement::EnhancementFactory;
    use crate::font::FontRegistry;

    fn document() -> (Document, Rc<std::cell::RefCell<Vec<SurfaceCall>>>) {
        let surface = RecordingSurface::new();
        let calls = surface.calls();
        let mut document = Document::with_config(
            Box::new(surface),
            DocumentConfig {
                page_size: PageSize::Custom {
                    width: 200.0,
                    height: 100.0,
                },
                ..Default::default()
            },
        );
        document
            .set_font_registry(Rc::new(FontRegistry::new()))
            .set_enhancement_factory(Rc::new(EnhancementFactory::with_defaults()));
        (document, calls)
    }

    #[test]
    fn text_is_drawn_line_by_line_on_its_page() {
        let (mut document, calls) = document();
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        let text = tree.create(ElementKind::Text);
        tree[text].set_text("Hello").unwrap();
        tree[text].set_attribute("line-height", 20.0).unwrap();
        tree[text].set_attribute("font-size", 10.0).unwrap();
        tree.append_child(page, text).unwrap();

        document.draw_pages(&mut tree, &[page]).unwrap();

        let calls = calls.borrow();
        assert!(matches!(calls[0], SurfaceCall::AddPage { .. }));
        match &calls[1] {
            SurfaceCall::Text { page, run } => {
                assert_eq!(*page, 0);
                assert_eq!(run.text, "Hello");
                assert_eq!(run.x, 0.0);
                // top 100, 5pt half-leading, 8pt ascent
                assert!((run.y - 87.0).abs() < 1e-9);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn hidden_elements_draw_nothing() {
        let (mut document, calls) = document();
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        let hidden = tree.create(ElementKind::Container);
        tree[hidden].set_attribute("display", "none").unwrap();
        tree[hidden].merge_enhancement_attributes(
            "background",
            &[("color", Value::from("red"))].into_iter().collect::<AttributeBag>(),
        );
        let text = tree.create(ElementKind::Text);
        tree[text].set_text("invisible").unwrap();
        tree.append_child(page, hidden).unwrap();
        tree.append_child(hidden, text).unwrap();

        document.draw_pages(&mut tree, &[page]).unwrap();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn backgrounds_go_under_borders() {
        let (mut document, calls) = document();
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        let boxed = tree.create(ElementKind::Container);
        tree[boxed].set_height(30.0).unwrap();
        tree[boxed].merge_enhancement_attributes("border", &AttributeBag::new());
        tree[boxed].merge_enhancement_attributes(
            "background",
            &[("color", Value::from("#eeeeee"))].into_iter().collect::<AttributeBag>(),
        );
        tree.append_child(page, boxed).unwrap();

        document.draw_pages(&mut tree, &[page]).unwrap();

        let modes: Vec<FillMode> = calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Polygon { mode, .. } => Some(*mode),
                _ => None,
            })
            .collect();
        assert_eq!(modes, vec![FillMode::Fill, FillMode::Stroke]);
    }
}
