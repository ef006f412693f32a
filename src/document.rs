//! # Document
//!
//! A [`Document`] owns the drawing surface and everything formatting needs
//! besides the element tree itself: page defaults, the font registry, the
//! enhancement factory, the formatter registry and an image cache. Drawing a
//! tree is a one-shot operation: format the page collection, collect every
//! element's drawing tasks into one queue, drain it against the surface.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeBag, EnhancementBag};
use crate::draw::{DrawingSurface, DrawingTaskQueue};
use crate::element::{ElementId, ElementKind, ElementTree};
use crate::enhancement::{Enhancement, EnhancementFactory};
use crate::error::{PlumeError, Result};
use crate::font::FontRegistry;
use crate::format::{Formatter, FormatterRegistry};
use crate::image_loader::{load_image, LoadedImage};

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Document metadata embedded in the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Document-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentConfig {
    /// Size of pages that do not set their own width and height.
    pub page_size: PageSize,
    pub metadata: Metadata,
}

pub struct Document {
    surface: Box<dyn DrawingSurface>,
    config: DocumentConfig,
    font_registry: Option<Rc<FontRegistry>>,
    enhancement_factory: Option<Rc<EnhancementFactory>>,
    formatters: FormatterRegistry,
    images: RefCell<HashMap<String, Rc<LoadedImage>>>,
    processed: bool,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.config)
            .field("formatters", &self.formatters)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn new(surface: Box<dyn DrawingSurface>) -> Self {
        Self::with_config(surface, DocumentConfig::default())
    }

    pub fn with_config(surface: Box<dyn DrawingSurface>, config: DocumentConfig) -> Self {
        Self {
            surface,
            config,
            font_registry: None,
            enhancement_factory: None,
            formatters: FormatterRegistry::default(),
            images: RefCell::new(HashMap::new()),
            processed: false,
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn set_font_registry(&mut self, registry: Rc<FontRegistry>) -> &mut Self {
        self.font_registry = Some(registry);
        self
    }

    /// The font registry. Text cannot be measured without one.
    pub fn font_registry(&self) -> Result<&FontRegistry> {
        self.font_registry
            .as_deref()
            .ok_or_else(|| PlumeError::Configuration("no font registry has been set".to_string()))
    }

    pub fn set_enhancement_factory(&mut self, factory: Rc<EnhancementFactory>) -> &mut Self {
        self.enhancement_factory = Some(factory);
        self
    }

    pub fn enhancement_factory(&self) -> Option<&EnhancementFactory> {
        self.enhancement_factory.as_deref()
    }

    /// Register extra formatters before drawing.
    pub fn formatters_mut(&mut self) -> &mut FormatterRegistry {
        &mut self.formatters
    }

    pub fn formatter(&self, name: &str) -> Result<Rc<dyn Formatter>> {
        self.formatters.get(name)
    }

    /// Make a decoded image available under `key`, so elements can use the
    /// key as their `src`.
    pub fn register_image(&self, key: &str, image: LoadedImage) {
        self.images
            .borrow_mut()
            .insert(key.to_string(), Rc::new(image));
    }

    /// Load the image behind `src`, once per document.
    pub fn image(&self, src: &str) -> Result<Rc<LoadedImage>> {
        if let Some(image) = self.images.borrow().get(src) {
            return Ok(Rc::clone(image));
        }
        let image = Rc::new(load_image(src)?);
        tracing::debug!(width = image.width_px, height = image.height_px, "loaded image");
        self.images
            .borrow_mut()
            .insert(src.to_string(), Rc::clone(&image));
        Ok(image)
    }

    /// Turn an element's enhancement bag into enhancement objects. Entries
    /// name their definition through a `name` parameter, or through their
    /// key when it is missing. Without a factory nothing is enhanced.
    pub fn enhancements(&self, bag: &EnhancementBag) -> Result<Vec<Box<dyn Enhancement>>> {
        let factory = match self.enhancement_factory() {
            Some(factory) => factory,
            None => return Ok(Vec::new()),
        };

        bag.iter()
            .map(|(key, parameters)| {
                let name = parameters
                    .get("name")
                    .and_then(|value| value.as_str())
                    .unwrap_or(key.as_str())
                    .to_string();
                let parameters: AttributeBag = parameters
                    .iter()
                    .filter(|(parameter, _)| parameter.as_str() != "name")
                    .map(|(parameter, value)| (parameter.as_str(), value.clone()))
                    .collect();
                factory.create(&name, &parameters)
            })
            .collect()
    }

    /// Format `root`, a page collection, and draw it onto the surface. A
    /// document draws once; later calls fail even when the first one did.
    pub fn draw(&mut self, tree: &mut ElementTree, root: ElementId) -> Result<()> {
        if self.processed {
            return Err(PlumeError::AlreadyDrawn);
        }
        self.processed = true;

        if tree[root].kind() != ElementKind::PageCollection {
            return Err(PlumeError::Type(format!(
                "document root must be a page-collection, got {}",
                tree[root].kind().name()
            )));
        }
        if let Some(other) = tree
            .children(root)
            .iter()
            .map(|child| tree[*child].kind())
            .find(|kind| *kind != ElementKind::Page)
        {
            return Err(PlumeError::Type(format!(
                "page-collection may only hold pages, got {}",
                other.name()
            )));
        }

        tree.format(root, self)?;

        let mut queue = DrawingTaskQueue::new();
        tree.collect_drawing_tasks(root, self, &mut queue)?;
        tracing::debug!(
            pages = tree.children(root).len(),
            tasks = queue.len(),
            "formatted document"
        );
        queue.drain(self.surface.as_mut())?;
        Ok(())
    }

    /// Wrap `pages` in a new page collection and draw it. The tree is left
    /// untouched when the document was already drawn or `pages` holds an
    /// element that is not a page.
    pub fn draw_pages(&mut self, tree: &mut ElementTree, pages: &[ElementId]) -> Result<ElementId> {
        if self.processed {
            return Err(PlumeError::AlreadyDrawn);
        }
        if let Some(other) = pages
            .iter()
            .map(|page| tree[*page].kind())
            .find(|kind| *kind != ElementKind::Page)
        {
            return Err(PlumeError::Type(format!(
                "only pages can be drawn, got {}",
                other.name()
            )));
        }

        let root = tree.create(ElementKind::PageCollection);
        for page in pages {
            tree.append_child(root, *page)?;
        }
        self.draw(tree, root)?;
        Ok(root)
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Finished output bytes from the surface.
    pub fn render(&mut self) -> Result<Vec<u8>> {
        self.surface.render()
    }
}
