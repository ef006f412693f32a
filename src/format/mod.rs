//! # Formatting
//!
//! Layout runs as a chain of named formatters per element. Each formatter
//! resolves part of an element's geometry (its size, its position, its
//! children) and may recurse into the tree. Elements hold formatter *names*;
//! the [`FormatterRegistry`] turns a name into an instance, constructing each
//! one at most once per document.

pub mod dimension;
pub mod page;
pub mod position;
pub mod text;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::document::Document;
use crate::element::{ElementId, ElementTree};
use crate::error::{PlumeError, Result};

pub use dimension::{ContainerDimensionFormatter, ImageDimensionFormatter, StandardDimensionFormatter};
pub use page::{PageFormatter, PaginationFormatter};
pub use position::StandardPositionFormatter;
pub use text::{TextDimensionFormatter, TextPositionFormatter};

pub trait Formatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, document: &Document) -> Result<()>;
}

type Constructor = Box<dyn Fn() -> Result<Rc<dyn Formatter>>>;

/// Lazily constructed formatter instances keyed by name.
///
/// A name that failed to resolve keeps failing with the same message without
/// retrying the construction.
pub struct FormatterRegistry {
    constructors: HashMap<String, Constructor>,
    cache: RefCell<HashMap<String, std::result::Result<Rc<dyn Formatter>, String>>>,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("FormatterRegistry")
            .field("formatters", &names)
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FormatterRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Registry with every built-in formatter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_formatter::<ChildrenFormatter>("children");
        registry.register_formatter::<StandardDimensionFormatter>("standard-dimension");
        registry.register_formatter::<StandardPositionFormatter>("standard-position");
        registry.register_formatter::<ContainerDimensionFormatter>("container-dimension");
        registry.register_formatter::<TextDimensionFormatter>("text-dimension");
        registry.register_formatter::<TextPositionFormatter>("text-position");
        registry.register_formatter::<ImageDimensionFormatter>("image-dimension");
        registry.register_formatter::<PageFormatter>("page");
        registry.register_formatter::<PaginationFormatter>("pagination");
        registry
    }

    /// Register a constructor under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn() -> Result<Rc<dyn Formatter>> + 'static,
    {
        self.cache.get_mut().remove(name);
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    pub fn register_formatter<T>(&mut self, name: &str)
    where
        T: Formatter + Default + 'static,
    {
        self.register(name, || Ok(Rc::new(T::default()) as Rc<dyn Formatter>));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.borrow().contains_key(name)
    }

    /// Resolve `name` to its shared instance.
    pub fn get(&self, name: &str) -> Result<Rc<dyn Formatter>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone().map_err(PlumeError::Configuration);
        }

        let resolved = match self.constructors.get(name) {
            None => Err(format!("no formatter registered under \"{}\"", name)),
            Some(constructor) => constructor().map_err(|e| {
                format!("formatter \"{}\" could not be constructed: {}", name, e)
            }),
        };
        if let Err(message) = &resolved {
            tracing::warn!(formatter = name, "{}", message);
        }

        self.cache
            .borrow_mut()
            .insert(name.to_string(), resolved.clone());
        resolved.map_err(PlumeError::Configuration)
    }
}

/// Formats every child in order.
#[derive(Debug, Default)]
pub struct ChildrenFormatter;

impl Formatter for ChildrenFormatter {
    fn format(&self, tree: &mut ElementTree, id: ElementId, document: &Document) -> Result<()> {
        for child in tree.children(id).to_vec() {
            tree.format(child, document)?;
        }
        Ok(())
    }
}
