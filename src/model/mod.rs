//! # Document Model
//!
//! The serializable input side of the engine. A [`DocumentSource`] is what
//! callers send: document config, custom fonts, element prototypes and the
//! page trees. [`build_tree`] turns it into an [`ElementTree`] through an
//! [`ElementFactory`], which stamps out elements from named prototypes.
//!
//! ```json
//! {
//!   "config": { "pageSize": "A4", "metadata": { "title": "Report" } },
//!   "prototypes": {
//!     "h1": { "type": "text", "attributes": { "font-size": 24, "font-style": "bold" } }
//!   },
//!   "pages": [
//!     { "type": "page", "attributes": { "padding": "40" }, "children": [
//!       { "type": "h1", "text": "Quarterly report" }
//!     ] }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeBag, EnhancementBag};
use crate::document::DocumentConfig;
use crate::element::{Element, ElementId, ElementKind, ElementTree};
use crate::error::{PlumeError, Result};
use crate::font::{FontRegistry, FontStyle};
use crate::image_loader::source_bytes;

/// Everything needed to render one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSource {
    pub config: DocumentConfig,
    pub fonts: Vec<FontSource>,
    /// Extra element tags on top of the built-in ones.
    pub prototypes: IndexMap<String, Prototype>,
    pub pages: Vec<NodeSource>,
}

/// A custom font. `src` is a data URI, a file path or raw base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSource {
    pub family: String,
    #[serde(default)]
    pub style: FontStyle,
    pub src: String,
}

/// Defaults shared by every element created under one tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prototype {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub attributes: AttributeBag,
    #[serde(default)]
    pub enhancements: EnhancementBag,
    /// Replaces the kind's default formatter chain.
    #[serde(default)]
    pub formatters: Option<Vec<String>>,
}

impl Prototype {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: AttributeBag::new(),
            enhancements: EnhancementBag::new(),
            formatters: None,
        }
    }
}

/// One element of the input tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSource {
    /// A built-in kind name or a prototype tag.
    #[serde(rename = "type")]
    pub tag: String,
    pub text: Option<String>,
    pub attributes: AttributeBag,
    pub enhancements: EnhancementBag,
    pub formatters: Option<Vec<String>>,
    pub placeholders: IndexMap<String, NodeSource>,
    pub children: Vec<NodeSource>,
}

/// Creates elements by tag name.
#[derive(Debug, Clone)]
pub struct ElementFactory {
    prototypes: IndexMap<String, Prototype>,
}

/// Tags available without a prototype declaration.
const BUILT_IN_TAGS: [&str; 8] = [
    "page-collection",
    "page",
    "container",
    "text",
    "image",
    "div",
    "p",
    "img",
];

impl Default for ElementFactory {
    fn default() -> Self {
        let prototypes = BUILT_IN_TAGS
            .iter()
            .filter_map(|tag| {
                ElementKind::from_name(tag).map(|kind| (tag.to_string(), Prototype::new(kind)))
            })
            .collect();
        Self { prototypes }
    }
}

impl ElementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `prototype` under `tag`, replacing any earlier one.
    pub fn add_prototype(&mut self, tag: &str, prototype: Prototype) {
        self.prototypes.insert(tag.to_string(), prototype);
    }

    pub fn has_prototype(&self, tag: &str) -> bool {
        self.prototypes.contains_key(tag)
    }

    /// A fresh element for `tag`, carrying its prototype's attributes,
    /// enhancements and formatters.
    pub fn create(&self, tag: &str) -> Result<Element> {
        let prototype = self
            .prototypes
            .get(tag)
            .ok_or_else(|| PlumeError::InvalidArgument(format!("unknown element tag \"{}\"", tag)))?;

        let mut element = Element::new(prototype.kind);
        for (name, value) in prototype.attributes.iter() {
            element.set_attribute(name, value.clone())?;
        }
        for (name, parameters) in prototype.enhancements.iter() {
            element.merge_enhancement_attributes(name, parameters);
        }
        if let Some(formatters) = &prototype.formatters {
            element.set_formatter_names(formatters.clone());
        }
        Ok(element)
    }

    fn build_node(&self, tree: &mut ElementTree, node: &NodeSource) -> Result<ElementId> {
        let mut element = self.create(&node.tag)?;
        for (name, value) in node.attributes.iter() {
            element.set_attribute(name, value.clone())?;
        }
        for (name, parameters) in node.enhancements.iter() {
            element.merge_enhancement_attributes(name, parameters);
        }
        if let Some(formatters) = &node.formatters {
            element.set_formatter_names(formatters.clone());
        }
        if let Some(text) = &node.text {
            element.set_text(text.as_str())?;
        }

        let id = tree.insert(element);
        for (name, child) in &node.placeholders {
            let child = self.build_node(tree, child)?;
            tree.set_placeholder(id, name, child)?;
        }
        for child in &node.children {
            let child = self.build_node(tree, child)?;
            tree.append_child(id, child)?;
        }
        Ok(id)
    }
}

/// Build the element tree of `source`. Returns the tree and its
/// page-collection root.
pub fn build_tree(source: &DocumentSource) -> Result<(ElementTree, ElementId)> {
    let mut factory = ElementFactory::new();
    for (tag, prototype) in &source.prototypes {
        factory.add_prototype(tag, prototype.clone());
    }

    let mut tree = ElementTree::new();
    let root = tree.create(ElementKind::PageCollection);
    for page in &source.pages {
        let id = factory.build_node(&mut tree, page)?;
        tree.append_child(root, id)?;
    }
    tracing::debug!(pages = source.pages.len(), elements = tree.len(), "built element tree");
    Ok((tree, root))
}

/// Registry with the standard fonts plus every font in `source`.
pub fn font_registry(source: &DocumentSource) -> Result<FontRegistry> {
    let mut registry = FontRegistry::new();
    for font in &source.fonts {
        let data = source_bytes(&font.src).map_err(|e| {
            PlumeError::Font(format!("cannot load font \"{}\": {}", font.family, e))
        })?;
        registry.register(&font.family, font.style, data)?;
    }
    Ok(registry)
}
