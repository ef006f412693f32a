//! Splitting elements that do not fit into the space left on a page.
//!
//! A split keeps the first `height` points of an element where it is and
//! hands the remainder to a successor element, inserted right after the
//! original in the same parent. Plain boxes are cut geometrically. Text is cut
//! between whole lines and containers redistribute their children.

use super::{ElementId, ElementKind, ElementTree, TextBlock, TextLine};
use crate::error::Result;
use crate::format::text::trace_lines;
use crate::geometry::{Boundary, Point};

const EPSILON: f64 = 1e-6;

impl ElementTree {
    /// Split `id` so that its first part is `height` points tall.
    ///
    /// Returns the successor holding the remainder, or `None` when the
    /// element is not splittable, already fits, or cannot be cut at that
    /// height.
    pub fn split(&mut self, id: ElementId, height: f64) -> Result<Option<ElementId>> {
        let element = &self[id];
        if !element.is_splittable() || height <= 0.0 {
            return Ok(None);
        }
        let Some(current) = element.height() else {
            return Ok(None);
        };
        if current <= height + EPSILON {
            return Ok(None);
        }

        let successor = match element.kind() {
            ElementKind::Text => self.split_text(id, height)?,
            ElementKind::Container => Some(self.split_container(id, height, current)?),
            _ => Some(self.split_box(id, height, current)?),
        };

        if let Some(successor) = successor {
            tracing::trace!(
                element = id.index(),
                successor = successor.index(),
                height,
                "split element"
            );
        }
        Ok(successor)
    }

    /// Geometric split: the bottom edge of the original moves up to the cut
    /// line and the successor covers the rest.
    fn split_box(&mut self, id: ElementId, height: f64, current: f64) -> Result<ElementId> {
        let copy = self[id].clone();
        let successor = self.insert(copy);
        let boundary = self[id].boundary().clone();

        match (boundary.first_point(), boundary.diagonal_point()) {
            (Some(top_left), Some(bottom_right)) if boundary.len() >= 4 => {
                let cut = top_left.y() - height;
                self[id]
                    .boundary_mut()
                    .point_translate(2, 0.0, boundary[2].y() - cut)?
                    .point_translate(3, 0.0, boundary[3].y() - cut)?;
                *self[successor].boundary_mut() = Boundary::rectangle(
                    Point::new(top_left.x(), cut),
                    bottom_right.x() - top_left.x(),
                    cut - bottom_right.y(),
                )?;
            }
            _ => self[successor].boundary_mut().reset(),
        }

        self[id].set_height(height)?;
        self[successor].set_height(current - height)?;

        if self.parent(id).is_some() {
            self.insert_after(id, successor)?;
        }
        Ok(successor)
    }

    /// Text splits between lines. Zero kept lines or all of them means no
    /// split.
    fn split_text(&mut self, id: ElementId, height: f64) -> Result<Option<ElementId>> {
        let line_height = match self[id].text() {
            Some(block) if block.line_height > 0.0 => block.line_height,
            _ => self[id].line_height(),
        };
        let total = self[id].text().map_or(0, |block| block.lines.len());
        let keep = ((height + EPSILON) / line_height).floor() as usize;
        if keep == 0 || keep >= total {
            return Ok(None);
        }

        let rest = match self[id].text.as_mut() {
            Some(block) => {
                let rest = block.lines.split_off(keep);
                block.content = join_lines(&block.lines);
                block.line_height = line_height;
                rest
            }
            None => return Ok(None),
        };
        let tail = TextBlock {
            content: join_lines(&rest),
            lines: rest,
            line_height,
        };

        let copy = self[id].clone();
        let successor = self.insert(copy);
        let kept_widths = self[id].text().map(TextBlock::line_sizes).unwrap_or_default();
        let tail_widths = tail.line_sizes();
        self[successor].text = Some(tail);

        let kept_height = keep as f64 * line_height;
        self[id].set_height(kept_height)?;
        self[successor].set_height((total - keep) as f64 * line_height)?;

        if let Some(origin) = self[id].start_drawing_point() {
            *self[id].boundary_mut() = trace_lines(origin, &kept_widths, line_height)?;
            *self[successor].boundary_mut() =
                trace_lines(origin.translate(0.0, kept_height), &tail_widths, line_height)?;
        } else {
            self[successor].boundary_mut().reset();
        }

        if self.parent(id).is_some() {
            self.insert_after(id, successor)?;
        }
        Ok(Some(successor))
    }

    /// Children entirely above the cut stay, children below it move to the
    /// successor, and a child crossing it is split in turn. A crossing child
    /// that refuses to split moves as a whole.
    fn split_container(&mut self, id: ElementId, height: f64, current: f64) -> Result<ElementId> {
        let Some(top) = self[id].start_drawing_point() else {
            return self.split_box(id, height, current);
        };
        let cut = top.y() - height;

        let mut moving = Vec::new();
        for child in self.children(id).to_vec() {
            let (Some(start), Some(end)) = (
                self[child].start_drawing_point(),
                self[child].end_drawing_point(),
            ) else {
                continue;
            };

            if end.y() >= cut - EPSILON {
                continue;
            }
            if start.y() <= cut + EPSILON {
                moving.push(child);
                continue;
            }
            match self.split(child, start.y() - cut)? {
                Some(rest) => moving.push(rest),
                None => moving.push(child),
            }
        }

        let successor = self.split_box(id, height, current)?;

        if let Some(&first) = moving.first() {
            let content_top = cut - self[id].padding_top() - self[first].margin_top().resolve();
            let first_top = self[first]
                .start_drawing_point()
                .map_or(content_top, |point| point.y());
            let shift = (first_top - content_top).max(0.0);

            for &child in &moving {
                self.append_child(successor, child)?;
                if shift > 0.0 {
                    self.translate(child, 0.0, shift);
                }
            }

            if shift > 0.0 {
                let grown = current - height + shift;
                self[successor].set_height(grown)?;
                if self[successor].boundary().len() >= 4 {
                    self[successor]
                        .boundary_mut()
                        .point_translate(2, 0.0, shift)?
                        .point_translate(3, 0.0, shift)?;
                }
            }
        }

        Ok(successor)
    }
}

fn join_lines(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn boxed(tree: &mut ElementTree, kind: ElementKind, top_left: Point, w: f64, h: f64) -> ElementId {
        let id = tree.create(kind);
        tree[id].set_width(w).unwrap().set_height(h).unwrap();
        *tree[id].boundary_mut() = Boundary::rectangle(top_left, w, h).unwrap();
        id
    }

    #[test]
    fn plain_split_cuts_boundary() {
        let mut tree = ElementTree::new();
        let parent = tree.create(ElementKind::Container);
        let id = tree.create(ElementKind::Container);
        tree.append_child(parent, id).unwrap();
        tree[id].set_width(100.0).unwrap().set_height(80.0).unwrap();
        tree[id]
            .boundary_mut()
            .set_next_xy(20.0, 50.0)
            .unwrap()
            .set_next_xy(70.0, 50.0)
            .unwrap()
            .set_next_xy(70.0, -30.0)
            .unwrap()
            .set_next_xy(20.0, -30.0)
            .unwrap();
        tree[id].boundary_mut().close().unwrap();

        let successor = tree.split(id, 50.0).unwrap().unwrap();

        assert_eq!(tree[id].height(), Some(50.0));
        assert_eq!(tree[id].width(), Some(100.0));
        assert_eq!(tree.start_drawing_point(id), Some(Point::new(20.0, 50.0)));
        assert_eq!(tree.end_drawing_point(id), Some(Point::new(70.0, 0.0)));

        assert_eq!(tree[successor].height(), Some(30.0));
        assert_eq!(tree[successor].width(), Some(100.0));
        assert_eq!(tree.start_drawing_point(successor), Some(Point::new(20.0, 0.0)));
        assert_eq!(tree.end_drawing_point(successor), Some(Point::new(70.0, -30.0)));

        assert_eq!(tree.children(parent), &[id, successor]);
    }

    #[test]
    fn no_split_when_it_fits_or_is_locked() {
        let mut tree = ElementTree::new();
        let id = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 100.0), 50.0, 40.0);
        assert_eq!(tree.split(id, 40.0).unwrap(), None);
        assert_eq!(tree.split(id, 0.0).unwrap(), None);

        tree[id].set_splittable(false).unwrap();
        assert_eq!(tree.split(id, 10.0).unwrap(), None);

        let image = boxed(&mut tree, ElementKind::Image, Point::new(0.0, 100.0), 50.0, 40.0);
        assert_eq!(tree.split(image, 10.0).unwrap(), None);
    }

    fn text_with_lines(tree: &mut ElementTree, lines: usize) -> ElementId {
        let id = tree.create(ElementKind::Text);
        let block = tree[id].text_mut().unwrap();
        block.line_height = 10.0;
        block.lines = (0..lines)
            .map(|i| TextLine {
                text: format!("line{}", i),
                width: 40.0,
            })
            .collect();
        tree[id].set_height(lines as f64 * 10.0).unwrap();
        let widths = vec![40.0; lines];
        *tree[id].boundary_mut() = trace_lines(Point::new(0.0, 100.0), &widths, 10.0).unwrap();
        id
    }

    #[test]
    fn text_splits_between_lines() {
        let mut tree = ElementTree::new();
        let parent = tree.create(ElementKind::Container);
        let id = text_with_lines(&mut tree, 5);
        tree.append_child(parent, id).unwrap();

        let successor = tree.split(id, 25.0).unwrap().unwrap();

        assert_eq!(tree[id].text().unwrap().lines.len(), 2);
        assert_eq!(tree[successor].text().unwrap().lines.len(), 3);
        assert_eq!(tree[successor].text().unwrap().lines[0].text, "line2");
        assert_eq!(tree[id].height(), Some(20.0));
        assert_eq!(tree[successor].height(), Some(30.0));
        assert_eq!(tree.end_drawing_point(id), Some(Point::new(40.0, 80.0)));
        assert_eq!(tree.start_drawing_point(successor), Some(Point::new(0.0, 80.0)));
        assert_eq!(tree.children(parent), &[id, successor]);
    }

    #[test]
    fn text_needs_at_least_one_line_on_each_side() {
        let mut tree = ElementTree::new();
        let id = text_with_lines(&mut tree, 3);
        assert_eq!(tree.split(id, 5.0).unwrap(), None);

        let single = text_with_lines(&mut tree, 1);
        tree[single].set_height(30.0).unwrap();
        assert_eq!(tree.split(single, 15.0).unwrap(), None);
    }

    #[test]
    fn container_moves_children_below_the_cut() {
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        let container = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 300.0), 200.0, 300.0);
        tree.append_child(page, container).unwrap();

        let first = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 300.0), 200.0, 100.0);
        let second = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 200.0), 200.0, 100.0);
        let third = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 100.0), 200.0, 100.0);
        for child in [first, second, third] {
            tree.append_child(container, child).unwrap();
        }

        let successor = tree.split(container, 150.0).unwrap().unwrap();

        assert_eq!(tree.children(page), &[container, successor]);
        assert_eq!(tree.children(container).len(), 2);
        assert_eq!(tree.children(container)[0], first);
        assert_eq!(tree.children(container)[1], second);
        let moved = tree.children(successor).to_vec();
        assert_eq!(moved.len(), 2);
        assert_eq!(moved[1], third);
        assert_eq!(tree[second].height(), Some(50.0));
        assert_eq!(tree[moved[0]].height(), Some(50.0));
        assert_eq!(tree.start_drawing_point(moved[0]), Some(Point::new(0.0, 150.0)));
    }

    #[test]
    fn unsplittable_child_moves_whole() {
        let mut tree = ElementTree::new();
        let page = tree.create(ElementKind::Page);
        let container = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 200.0), 200.0, 200.0);
        tree.append_child(page, container).unwrap();

        let top = boxed(&mut tree, ElementKind::Container, Point::new(0.0, 200.0), 200.0, 100.0);
        let image = boxed(&mut tree, ElementKind::Image, Point::new(0.0, 100.0), 200.0, 100.0);
        tree.append_child(container, top).unwrap();
        tree.append_child(container, image).unwrap();

        let successor = tree.split(container, 150.0).unwrap().unwrap();

        assert_eq!(tree.children(container), &[top]);
        assert_eq!(tree.children(successor), &[image]);
        // the image started 50pt above the cut, so it is pushed down by that much
        assert_eq!(tree.start_drawing_point(image), Some(Point::new(0.0, 50.0)));
        assert_eq!(tree[successor].height(), Some(100.0));
    }
}
