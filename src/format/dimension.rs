//! Width and height resolution.

use super::Formatter;
use crate::document::Document;
use crate::element::{Display, ElementId, ElementKind, ElementTree};
use crate::error::{PlumeError, Result};
use crate::geometry::Boundary;

/// Gives an element without an explicit width the inner width of its parent
/// minus its own horizontal margins.
#[derive(Debug, Default)]
pub struct StandardDimensionFormatter;

impl Formatter for StandardDimensionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, _document: &Document) -> Result<()> {
        if tree[id].width().is_some() {
            return Ok(());
        }
        let Some(parent) = tree.parent(id) else {
            return Ok(());
        };

        let element = &tree[id];
        let available = tree[parent].width_without_paddings()
            - element.margin_left().resolve()
            - element.margin_right().resolve();
        tree[id].set_width(available.max(0.0))?;
        Ok(())
    }
}

/// Sizes a container around its formatted children. An explicit height is
/// kept as it is.
#[derive(Debug, Default)]
pub struct ContainerDimensionFormatter;

impl Formatter for ContainerDimensionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, _document: &Document) -> Result<()> {
        let element = &tree[id];
        if element.display() == Display::None || element.height().is_some() {
            return Ok(());
        }
        let Some(top_left) = element.start_drawing_point() else {
            return Ok(());
        };

        let lowest = tree
            .children(id)
            .iter()
            .filter(|&&child| tree[child].display() == Display::Block)
            .filter_map(|&child| {
                tree[child]
                    .end_drawing_point()
                    .map(|end| end.y() - tree[child].margin_bottom().resolve())
            })
            .reduce(f64::min);

        let height = match lowest {
            Some(bottom) => top_left.y() - bottom + element.padding_bottom(),
            None => element.padding_top() + element.padding_bottom(),
        };
        let width = element.width().unwrap_or(0.0);

        tree[id].set_height(height.max(0.0))?;
        *tree[id].boundary_mut() = Boundary::rectangle(top_left, width, height.max(0.0))?;
        Ok(())
    }
}

/// Derives missing image dimensions from the intrinsic aspect ratio.
///
/// With neither dimension given the image keeps its pixel size, unless that
/// overflows the parent, in which case it is scaled down to the parent's
/// width (or its height, when the parent is wider than tall).
#[derive(Debug, Default)]
pub struct ImageDimensionFormatter;

impl Formatter for ImageDimensionFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, document: &Document) -> Result<()> {
        let element = &tree[id];
        if element.kind() != ElementKind::Image || element.display() == Display::None {
            return Ok(());
        }

        let given = |value: Option<f64>| value.filter(|v| *v > 0.0);
        let mut width = given(element.width());
        let mut height = given(element.height());
        if width.is_some() && height.is_some() {
            return Ok(());
        }

        let src = element
            .src()
            .ok_or_else(|| PlumeError::Image("image element has no src".to_string()))?;
        let image = document.image(src)?;
        let (pixel_width, pixel_height) = (image.width_px as f64, image.height_px as f64);
        if pixel_width <= 0.0 || pixel_height <= 0.0 {
            return Err(PlumeError::Image(format!("image \"{}\" has no pixels", src)));
        }
        let ratio = pixel_width / pixel_height;

        if width.is_none() && height.is_none() {
            let (parent_width, parent_height) = match tree.parent(id) {
                Some(parent) => (
                    tree[parent].width().unwrap_or(f64::INFINITY),
                    tree[parent].height().unwrap_or(f64::INFINITY),
                ),
                None => (f64::INFINITY, f64::INFINITY),
            };

            if pixel_width > parent_width || pixel_height > parent_height {
                if parent_width > parent_height {
                    height = Some(parent_height);
                } else {
                    width = Some(parent_width);
                }
            } else {
                width = Some(pixel_width);
                height = Some(pixel_height);
            }
        }

        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (None, Some(h)) => (ratio * h, h),
            (Some(w), None) => (w, w / ratio),
            (None, None) => (pixel_width, pixel_height),
        };

        tree[id].set_width(width)?.set_height(height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::RecordingSurface;
    use crate::geometry::Point;
    use crate::image_loader::{ImagePixels, LoadedImage};

    fn document() -> Document {
        Document::new(Box::new(RecordingSurface::new()))
    }

    fn picture(width_px: u32, height_px: u32) -> LoadedImage {
        LoadedImage {
            pixel_data: ImagePixels::Decoded {
                rgb: vec![0; (width_px * height_px * 3) as usize],
                alpha: None,
            },
            width_px,
            height_px,
        }
    }

    fn image_in(tree: &mut ElementTree, parent_size: (f64, f64)) -> ElementId {
        let parent = tree.create(ElementKind::Container);
        tree[parent]
            .set_width(parent_size.0)
            .unwrap()
            .set_height(parent_size.1)
            .unwrap();
        let image = tree.create(ElementKind::Image);
        tree[image].set_attribute("src", "pic").unwrap();
        tree.append_child(parent, image).unwrap();
        image
    }

    #[test]
    fn width_fills_parent() {
        let mut tree = ElementTree::new();
        let parent = tree.create(ElementKind::Container);
        tree[parent]
            .set_width(300.0)
            .unwrap()
            .set_padding(&[10.into()])
            .unwrap();
        let child = tree.create(ElementKind::Container);
        tree[child].set_margin(&[0.into(), 20.into()]).unwrap();
        tree.append_child(parent, child).unwrap();

        StandardDimensionFormatter
            .format(&mut tree, child, &document())
            .unwrap();
        assert_eq!(tree[child].width(), Some(240.0));
    }

    #[test]
    fn container_wraps_children() {
        let mut tree = ElementTree::new();
        let container = tree.create(ElementKind::Container);
        tree[container]
            .set_width(100.0)
            .unwrap()
            .set_padding(&[5.into()])
            .unwrap();
        *tree[container].boundary_mut() =
            Boundary::rectangle(Point::new(0.0, 400.0), 100.0, 0.0).unwrap();

        let child = tree.create(ElementKind::Container);
        tree.append_child(container, child).unwrap();
        tree[child].set_attribute("margin-bottom", 3).unwrap();
        *tree[child].boundary_mut() =
            Boundary::rectangle(Point::new(5.0, 395.0), 90.0, 50.0).unwrap();

        ContainerDimensionFormatter
            .format(&mut tree, container, &document())
            .unwrap();
        // 5 top padding + 50 child + 3 margin + 5 bottom padding
        assert_eq!(tree[container].height(), Some(63.0));
        assert_eq!(tree.end_drawing_point(container), Some(Point::new(100.0, 337.0)));
    }

    #[test]
    fn empty_container_is_its_padding() {
        let mut tree = ElementTree::new();
        let container = tree.create(ElementKind::Container);
        tree[container].set_padding(&[4.into(), 0.into()]).unwrap();
        *tree[container].boundary_mut() =
            Boundary::rectangle(Point::new(0.0, 400.0), 100.0, 0.0).unwrap();

        ContainerDimensionFormatter
            .format(&mut tree, container, &document())
            .unwrap();
        assert_eq!(tree[container].height(), Some(8.0));
    }

    #[test]
    fn image_scaled_to_parent() {
        let document = document();
        document.register_image("pic", picture(200, 100));

        let mut tree = ElementTree::new();
        let image = image_in(&mut tree, (100.0, 100.0));
        ImageDimensionFormatter.format(&mut tree, image, &document).unwrap();

        assert_eq!(tree[image].width(), Some(100.0));
        assert_eq!(tree[image].height(), Some(50.0));
    }

    #[test]
    fn wide_parent_caps_height() {
        let document = document();
        document.register_image("pic", picture(100, 200));

        let mut tree = ElementTree::new();
        let image = image_in(&mut tree, (300.0, 100.0));
        ImageDimensionFormatter.format(&mut tree, image, &document).unwrap();

        assert_eq!(tree[image].height(), Some(100.0));
        assert_eq!(tree[image].width(), Some(50.0));
    }

    #[test]
    fn small_images_keep_pixel_size() {
        let document = document();
        document.register_image("pic", picture(40, 20));

        let mut tree = ElementTree::new();
        let image = image_in(&mut tree, (100.0, 100.0));
        ImageDimensionFormatter.format(&mut tree, image, &document).unwrap();

        assert_eq!(tree[image].width(), Some(40.0));
        assert_eq!(tree[image].height(), Some(20.0));
    }

    #[test]
    fn one_given_dimension_keeps_ratio() {
        let document = document();
        document.register_image("pic", picture(200, 100));

        let mut tree = ElementTree::new();
        let image = image_in(&mut tree, (100.0, 100.0));
        tree[image].set_height(30.0).unwrap();
        ImageDimensionFormatter.format(&mut tree, image, &document).unwrap();

        assert_eq!(tree[image].width(), Some(60.0));
        assert_eq!(tree[image].height(), Some(30.0));
    }
}
