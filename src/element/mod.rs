//! # Element Tree
//!
//! Document elements live in an arena ([`ElementTree`]) and refer to each
//! other by [`ElementId`]. A parent owns its ordered child list; a child only
//! records its parent's id, which is what ancestor lookups walk. Named
//! placeholders (a page's header and footer) are owned sub-elements outside
//! the child list.
//!
//! Elements carry loosely typed attributes validated against a per-kind
//! declaration table (see [`declarations`]), a [`Boundary`] resolved during
//! formatting, the enhancements to draw them with and the names of the
//! formatters that lay them out.

pub mod declarations;
pub mod split;

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeBag, Dimension, EnhancementBag, Value};
use crate::color::Color;
use crate::document::Document;
use crate::error::{PlumeError, Result};
use crate::font::FontStyle;
use crate::geometry::{Boundary, Point};

pub use declarations::{AttributeTable, Setter};

static NULL: Value = Value::Null;

/// Handle of an element inside an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    PageCollection,
    Page,
    Container,
    Text,
    Image,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::PageCollection => "page-collection",
            ElementKind::Page => "page",
            ElementKind::Container => "container",
            ElementKind::Text => "text",
            ElementKind::Image => "image",
        }
    }

    /// Kind for a tag name, accepting the `div`, `p` and `img` aliases.
    pub fn from_name(name: &str) -> Option<ElementKind> {
        match name {
            "page-collection" => Some(ElementKind::PageCollection),
            "page" => Some(ElementKind::Page),
            "container" | "div" => Some(ElementKind::Container),
            "text" | "p" => Some(ElementKind::Text),
            "image" | "img" => Some(ElementKind::Image),
            _ => None,
        }
    }

    /// Formatter chain a fresh element of this kind starts with.
    pub fn default_formatters(&self) -> &'static [&'static str] {
        match self {
            ElementKind::PageCollection => &["children", "pagination"],
            ElementKind::Page => &["page", "children"],
            ElementKind::Container => &[
                "standard-dimension",
                "standard-position",
                "children",
                "container-dimension",
            ],
            ElementKind::Text => &["standard-dimension", "text-dimension", "text-position"],
            ElementKind::Image => &["image-dimension", "standard-position"],
        }
    }

    pub fn reserved_placeholders(&self) -> &'static [&'static str] {
        match self {
            ElementKind::Page => &["header", "footer"],
            _ => &[],
        }
    }

    pub fn splittable_by_default(&self) -> bool {
        matches!(self, ElementKind::Container | ElementKind::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    None,
}

/// One wrapped line of a text element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f64,
}

/// Content of a text element and, once formatted, its broken lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub lines: Vec<TextLine>,
    pub line_height: f64,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn line_sizes(&self) -> Vec<f64> {
        self.lines.iter().map(|line| line.width).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    table: Rc<AttributeTable>,
    attributes: AttributeBag,
    snapshot: Option<AttributeBag>,
    enhancements: EnhancementBag,
    formatters: Vec<String>,
    boundary: Boundary,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    placeholders: IndexMap<String, Option<ElementId>>,
    text: Option<TextBlock>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        let table = declarations::table_for(kind);
        let attributes = table
            .iter()
            .map(|(name, declaration)| (name.clone(), declaration.default.clone()))
            .collect();

        Self {
            kind,
            table: Rc::new(table),
            attributes,
            snapshot: None,
            enhancements: EnhancementBag::new(),
            formatters: kind
                .default_formatters()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            boundary: Boundary::new(),
            parent: None,
            children: Vec::new(),
            placeholders: kind
                .reserved_placeholders()
                .iter()
                .map(|name| (name.to_string(), None))
                .collect(),
            text: (kind == ElementKind::Text).then(TextBlock::default),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    // ── Attributes ─────────────────────────────────────────────

    /// Declare an extra attribute on this element only.
    pub fn declare_attribute(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        let default = default.into();
        Rc::make_mut(&mut self.table).declare(name, default.clone(), None);
        self.attributes.add(name, default);
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn attribute(&self, name: &str) -> Result<&Value> {
        if !self.table.contains(name) {
            return Err(self.undeclared(name));
        }
        Ok(self.attributes.get(name).unwrap_or(&NULL))
    }

    /// Set a declared attribute, running its setter when it has one.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        let setter = match self.table.get(name) {
            Some(declaration) => declaration.setter,
            None => return Err(self.undeclared(name)),
        };
        match setter {
            Some(setter) => setter(self, name, value)?,
            None => self.set_attribute_directly(name, value),
        }
        Ok(self)
    }

    pub(crate) fn set_attribute_directly(&mut self, name: &str, value: Value) {
        self.attributes.add(name, value);
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    fn undeclared(&self, name: &str) -> PlumeError {
        PlumeError::InvalidArgument(format!(
            "attribute \"{}\" is not declared for {} elements",
            name,
            self.kind.name()
        ))
    }

    /// Map an accessor-style call (`getMarginTop`, `setColor`) onto the
    /// attribute store. Getters return the value, setters return `None`.
    pub fn dispatch(&mut self, method: &str, args: &[Value]) -> Result<Option<Value>> {
        let undefined = || PlumeError::Usage(format!("call to undefined method \"{}\"", method));

        let (is_getter, rest) = if let Some(rest) = method.strip_prefix("get") {
            (true, rest)
        } else if let Some(rest) = method.strip_prefix("set") {
            (false, rest)
        } else {
            return Err(undefined());
        };

        let name = camel_to_kebab(rest);
        if name.is_empty() || !self.table.contains(&name) {
            return Err(undefined());
        }

        if is_getter {
            if !args.is_empty() {
                return Err(PlumeError::Usage(format!("\"{}\" takes no arguments", method)));
            }
            return self.attribute(&name).map(|value| Some(value.clone()));
        }

        let value = match args {
            [] => {
                return Err(PlumeError::Usage(format!(
                    "\"{}\" needs at least one argument",
                    method
                )))
            }
            [single] => single.clone(),
            many => Value::List(many.to_vec()),
        };
        self.set_attribute(&name, value)?;
        Ok(None)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(Value::as_f64)
    }

    fn dimension(&self, name: &str) -> Dimension {
        self.attributes
            .get(name)
            .and_then(|value| Dimension::from_value(value).ok())
            .unwrap_or(Dimension::Pt(0.0))
    }

    /// Explicit or computed width; `None` while unresolved. Always zero for
    /// elements that are not displayed.
    pub fn width(&self) -> Option<f64> {
        match self.display() {
            Display::None => Some(0.0),
            Display::Block => self.number("width"),
        }
    }

    pub fn height(&self) -> Option<f64> {
        match self.display() {
            Display::None => Some(0.0),
            Display::Block => self.number("height"),
        }
    }

    pub fn set_width(&mut self, width: f64) -> Result<&mut Self> {
        self.set_attribute("width", width)
    }

    pub fn set_height(&mut self, height: f64) -> Result<&mut Self> {
        self.set_attribute("height", height)
    }

    pub fn margin_top(&self) -> Dimension {
        self.dimension("margin-top")
    }

    pub fn margin_right(&self) -> Dimension {
        self.dimension("margin-right")
    }

    pub fn margin_bottom(&self) -> Dimension {
        self.dimension("margin-bottom")
    }

    pub fn margin_left(&self) -> Dimension {
        self.dimension("margin-left")
    }

    pub fn padding_top(&self) -> f64 {
        self.dimension("padding-top").resolve()
    }

    pub fn padding_right(&self) -> f64 {
        self.dimension("padding-right").resolve()
    }

    pub fn padding_bottom(&self) -> f64 {
        self.dimension("padding-bottom").resolve()
    }

    pub fn padding_left(&self) -> f64 {
        self.dimension("padding-left").resolve()
    }

    /// Set margins from 1 to 4 shorthand values.
    pub fn set_margin(&mut self, values: &[Value]) -> Result<&mut Self> {
        self.set_attribute("margin", Value::List(values.to_vec()))
    }

    pub fn set_padding(&mut self, values: &[Value]) -> Result<&mut Self> {
        self.set_attribute("padding", Value::List(values.to_vec()))
    }

    pub fn width_without_paddings(&self) -> f64 {
        self.width().unwrap_or(0.0) - self.padding_left() - self.padding_right()
    }

    pub fn height_without_paddings(&self) -> f64 {
        self.height().unwrap_or(0.0) - self.padding_top() - self.padding_bottom()
    }

    pub fn display(&self) -> Display {
        match self.attributes.get("display").and_then(Value::as_str) {
            Some("none") => Display::None,
            _ => Display::Block,
        }
    }

    pub fn is_splittable(&self) -> bool {
        self.attributes
            .get("splittable")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_splittable(&mut self, splittable: bool) -> Result<&mut Self> {
        self.set_attribute("splittable", splittable)
    }

    pub fn font_family(&self) -> &str {
        self.attributes
            .get("font-family")
            .and_then(Value::as_str)
            .unwrap_or("Helvetica")
    }

    pub fn font_size(&self) -> f64 {
        self.number("font-size").unwrap_or(12.0)
    }

    pub fn font_style(&self) -> FontStyle {
        FontStyle::parse(
            self.attributes
                .get("font-style")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        )
    }

    /// Line height in points, defaulting to 1.2 times the font size.
    pub fn line_height(&self) -> f64 {
        self.number("line-height")
            .unwrap_or_else(|| self.font_size() * 1.2)
    }

    pub fn color(&self) -> Option<Color> {
        self.attributes
            .get("color")
            .and_then(|value| Color::from_value(value).ok().flatten())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").and_then(Value::as_str)
    }

    /// Record a deep copy of the current attribute values.
    pub fn make_attributes_snapshot(&mut self) {
        self.snapshot = Some(self.attributes.clone());
    }

    pub fn attributes_snapshot(&self) -> Option<&AttributeBag> {
        self.snapshot.as_ref()
    }

    // ── Enhancements & formatters ──────────────────────────────

    pub fn merge_enhancement_attributes(&mut self, name: &str, parameters: &AttributeBag) {
        self.enhancements.merge_parameters(name, parameters);
    }

    pub fn enhancements(&self) -> &EnhancementBag {
        &self.enhancements
    }

    pub fn formatter_names(&self) -> &[String] {
        &self.formatters
    }

    pub fn set_formatter_names(&mut self, names: Vec<String>) {
        self.formatters = names;
    }

    // ── Geometry ───────────────────────────────────────────────

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn boundary_mut(&mut self) -> &mut Boundary {
        &mut self.boundary
    }

    /// Top-left corner.
    pub fn start_drawing_point(&self) -> Option<Point> {
        self.boundary.first_point()
    }

    /// Bottom-right corner.
    pub fn end_drawing_point(&self) -> Option<Point> {
        self.boundary.diagonal_point()
    }

    // ── Relations ──────────────────────────────────────────────

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Whether a sub-element is currently set under `name`.
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholder(name).is_some()
    }

    pub fn placeholder(&self, name: &str) -> Option<ElementId> {
        self.placeholders.get(name).copied().flatten()
    }

    /// Ids of every set placeholder, in reservation order.
    pub fn placeholder_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.placeholders.values().filter_map(|slot| *slot)
    }

    // ── Text ───────────────────────────────────────────────────

    pub fn text(&self) -> Option<&TextBlock> {
        self.text.as_ref()
    }

    pub fn text_mut(&mut self) -> Option<&mut TextBlock> {
        self.text.as_mut()
    }

    pub fn set_text(&mut self, content: impl Into<String>) -> Result<&mut Self> {
        match self.text.as_mut() {
            Some(block) => {
                *block = TextBlock::new(content);
                Ok(self)
            }
            None => Err(PlumeError::Type(format!(
                "{} elements do not carry text",
                self.kind.name()
            ))),
        }
    }
}

fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Arena owning every element of one document.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    elements: Vec<Element>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: ElementKind) -> ElementId {
        self.insert(Element::new(kind))
    }

    /// Move a detached element into the arena.
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        element.parent = None;
        element.children.clear();
        for slot in element.placeholders.values_mut() {
            *slot = None;
        }
        let id = ElementId(self.elements.len());
        self.elements.push(element);
        id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self[id].parent
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self[id].children
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.check_attachable(parent, child)?;
        self.detach(child);
        self[child].parent = Some(parent);
        self[parent].children.push(child);
        Ok(())
    }

    /// Insert `new` right after `sibling` in the sibling's parent.
    pub fn insert_after(&mut self, sibling: ElementId, new: ElementId) -> Result<()> {
        let parent = self.parent(sibling).ok_or_else(|| {
            PlumeError::Usage("cannot insert after an element without a parent".to_string())
        })?;
        self.check_attachable(parent, new)?;
        self.detach(new);
        let position = self[parent]
            .children
            .iter()
            .position(|&c| c == sibling)
            .map(|p| p + 1)
            .unwrap_or(self[parent].children.len());
        self[new].parent = Some(parent);
        self[parent].children.insert(position, new);
        Ok(())
    }

    /// Remove `id` from its parent's child list or placeholder slot.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self[id].parent.take() {
            let owner = &mut self[parent];
            owner.children.retain(|&c| c != id);
            for slot in owner.placeholders.values_mut() {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
    }

    fn check_attachable(&self, parent: ElementId, child: ElementId) -> Result<()> {
        if parent == child || self.is_ancestor(child, parent) {
            return Err(PlumeError::InvalidArgument(
                "an element cannot become its own descendant".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `ancestor` is on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self[id].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self[parent].parent;
        }
        false
    }

    /// Nearest ancestor of the given kind.
    pub fn ancestor_by_type(&self, id: ElementId, kind: ElementKind) -> Option<ElementId> {
        let mut current = self[id].parent;
        while let Some(parent) = current {
            if self[parent].kind == kind {
                return Some(parent);
            }
            current = self[parent].parent;
        }
        None
    }

    /// Put `child` into the placeholder slot `name` of `id`.
    pub fn set_placeholder(&mut self, id: ElementId, name: &str, child: ElementId) -> Result<()> {
        if !self[id].placeholders.contains_key(name) {
            return Err(PlumeError::InvalidArgument(format!(
                "placeholder \"{}\" is not reserved by {} elements",
                name,
                self[id].kind.name()
            )));
        }
        self.check_attachable(id, child)?;
        if let Some(previous) = self[id].placeholder(name) {
            self[previous].parent = None;
        }
        self.detach(child);
        self[child].parent = Some(id);
        self[id].placeholders.insert(name.to_string(), Some(child));
        Ok(())
    }

    pub fn placeholder(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self[id].placeholder(name)
    }

    pub fn start_drawing_point(&self, id: ElementId) -> Option<Point> {
        self[id].start_drawing_point()
    }

    pub fn end_drawing_point(&self, id: ElementId) -> Option<Point> {
        self[id].end_drawing_point()
    }

    /// Translate an element together with its children and placeholders.
    pub fn translate(&mut self, id: ElementId, dx: f64, dy: f64) {
        self[id].boundary.translate(dx, dy);
        let nested: Vec<ElementId> = self[id]
            .children
            .iter()
            .copied()
            .chain(self[id].placeholder_ids())
            .collect();
        for child in nested {
            self.translate(child, dx, dy);
        }
    }

    /// Run the element's formatters in order.
    pub fn format(&mut self, id: ElementId, document: &Document) -> Result<()> {
        let names = self[id].formatters.clone();
        for name in &names {
            let formatter = document.formatter(name)?;
            formatter.format(self, id, document)?;
        }
        Ok(())
    }

    /// Deep-copy `id` and everything below it. The copy has no parent.
    pub fn clone_subtree(&mut self, id: ElementId) -> ElementId {
        let source = self[id].clone();
        let children = source.children.clone();
        let placeholders: Vec<(String, ElementId)> = source
            .placeholders
            .iter()
            .filter_map(|(name, slot)| slot.map(|child| (name.clone(), child)))
            .collect();

        let copy = self.insert(source);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self[child_copy].parent = Some(copy);
            self[copy].children.push(child_copy);
        }
        for (name, child) in placeholders {
            let child_copy = self.clone_subtree(child);
            self[child_copy].parent = Some(copy);
            self[copy].placeholders.insert(name, Some(child_copy));
        }
        copy
    }

    /// Copy of a page-like element with its placeholders but no children.
    pub(crate) fn clone_shell(&mut self, id: ElementId) -> ElementId {
        let children = std::mem::take(&mut self[id].children);
        let copy = self.clone_subtree(id);
        self[id].children = children;
        copy
    }
}

impl Index<ElementId> for ElementTree {
    type Output = Element;

    fn index(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }
}

impl IndexMut<ElementId> for ElementTree {
    fn index_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }
}
