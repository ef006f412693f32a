//! # Plume
//!
//! A declarative document layout engine.
//!
//! A document is a tree of elements (pages, containers, text, images), each
//! carrying loosely typed style attributes. Plume formats the tree in place,
//! resolving every element's boundary polygon on the page, splits content
//! that overflows a page onto continuation pages, and turns the result into
//! prioritized drawing tasks that run against a drawing surface.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]      Element prototypes, tree construction
//!       ↓
//!   [element]    Arena tree, attributes, splitting
//!       ↓
//!   [format]     Formatter chains: size, position, text, pagination
//!       ↓
//!   [draw]       Priority queue of drawing tasks
//!       ↓
//!   [pdf]        Drawing surface that writes PDF bytes
//! ```
//!
//! [`document::Document`] ties the stages together.

pub mod attributes;
pub mod color;
pub mod document;
pub mod draw;
pub mod element;
pub mod enhancement;
pub mod error;
pub mod font;
pub mod format;
pub mod geometry;
pub mod image_loader;
pub mod model;
pub mod pdf;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::rc::Rc;

use document::Document;
use enhancement::EnhancementFactory;
use error::Result;
use model::DocumentSource;
use pdf::PdfSurface;

pub use error::PlumeError;

/// Render a document source to PDF bytes.
///
/// This is the primary entry point: it builds the element tree, draws it
/// onto a [`PdfSurface`] with the default enhancements and returns the file.
pub fn render(source: &DocumentSource) -> Result<Vec<u8>> {
    let fonts = Rc::new(model::font_registry(source)?);
    let (mut tree, root) = model::build_tree(source)?;

    let surface = PdfSurface::new(Rc::clone(&fonts), source.config.metadata.clone());
    let mut document = Document::with_config(Box::new(surface), source.config.clone());
    document
        .set_font_registry(fonts)
        .set_enhancement_factory(Rc::new(EnhancementFactory::with_defaults()));

    document.draw(&mut tree, root)?;
    document.render()
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let source: DocumentSource = serde_json::from_str(json)?;
    render(&source)
}
