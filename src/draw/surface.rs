//! The drawing surface abstraction.
//!
//! Layout never touches an output format directly. Drawing tasks call the
//! handful of primitives below, addressing pages by the index `add_page`
//! returned. [`crate::pdf::PdfSurface`] turns them into a PDF;
//! [`RecordingSurface`] just remembers them.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::color::Color;
use crate::error::{PlumeError, Result};
use crate::font::FontStyle;
use crate::geometry::{Point, Rect};
use crate::image_loader::LoadedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMode {
    Fill,
    Stroke,
}

/// Stroke settings for subsequent outlines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub width: f64,
    /// Dash lengths, alternating on and off. Empty means solid.
    pub dash: Vec<f64>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            dash: Vec::new(),
        }
    }
}

/// One line of text. `x`/`y` is the start of the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    pub font_size: f64,
    pub color: Color,
}

pub trait DrawingSurface {
    /// Start a new page and return its index.
    fn add_page(&mut self, width: f64, height: f64) -> Result<usize>;

    fn set_line_style(&mut self, page: usize, style: &LineStyle) -> Result<()>;

    fn draw_polygon(&mut self, page: usize, points: &[Point], mode: FillMode, color: Color)
        -> Result<()>;

    fn draw_text(&mut self, page: usize, run: &TextRun) -> Result<()>;

    fn draw_image(&mut self, page: usize, image: &LoadedImage, rect: Rect) -> Result<()>;

    /// Produce the finished output.
    fn render(&mut self) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum SurfaceCall {
    AddPage {
        width: f64,
        height: f64,
    },
    LineStyle {
        page: usize,
        style: LineStyle,
    },
    Polygon {
        page: usize,
        points: Vec<Point>,
        mode: FillMode,
        color: Color,
    },
    Text {
        page: usize,
        run: TextRun,
    },
    Image {
        page: usize,
        rect: Rect,
        width_px: u32,
        height_px: u32,
    },
}

/// Surface that records every call. `render` returns the log as JSON.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pages: usize,
    calls: Rc<RefCell<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call log, usable after the surface has been
    /// handed to a document.
    pub fn calls(&self) -> Rc<RefCell<Vec<SurfaceCall>>> {
        Rc::clone(&self.calls)
    }

    fn record(&mut self, page: usize, call: SurfaceCall) -> Result<()> {
        if page >= self.pages {
            return Err(PlumeError::OutOfBounds {
                index: page,
                len: self.pages,
            });
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl DrawingSurface for RecordingSurface {
    fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::AddPage { width, height });
        self.pages += 1;
        Ok(self.pages - 1)
    }

    fn set_line_style(&mut self, page: usize, style: &LineStyle) -> Result<()> {
        self.record(
            page,
            SurfaceCall::LineStyle {
                page,
                style: style.clone(),
            },
        )
    }

    fn draw_polygon(
        &mut self,
        page: usize,
        points: &[Point],
        mode: FillMode,
        color: Color,
    ) -> Result<()> {
        self.record(
            page,
            SurfaceCall::Polygon {
                page,
                points: points.to_vec(),
                mode,
                color,
            },
        )
    }

    fn draw_text(&mut self, page: usize, run: &TextRun) -> Result<()> {
        self.record(
            page,
            SurfaceCall::Text {
                page,
                run: run.clone(),
            },
        )
    }

    fn draw_image(&mut self, page: usize, image: &LoadedImage, rect: Rect) -> Result<()> {
        self.record(
            page,
            SurfaceCall::Image {
                page,
                rect,
                width_px: image.width_px,
                height_px: image.height_px,
            },
        )
    }

    fn render(&mut self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&*self.calls.borrow()).map_err(|e| PlumeError::Io(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_needs_a_page() {
        let mut surface = RecordingSurface::new();
        let result = surface.draw_polygon(0, &[], FillMode::Fill, Color::BLACK);
        assert!(matches!(result, Err(PlumeError::OutOfBounds { index: 0, len: 0 })));

        assert_eq!(surface.add_page(10.0, 10.0).unwrap(), 0);
        assert_eq!(surface.add_page(10.0, 10.0).unwrap(), 1);
        surface
            .draw_polygon(1, &[Point::new(0.0, 0.0)], FillMode::Stroke, Color::BLACK)
            .unwrap();
        assert_eq!(surface.calls().borrow().len(), 3);
    }

    #[test]
    fn render_is_a_json_log() {
        let mut surface = RecordingSurface::new();
        surface.add_page(595.0, 842.0).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&surface.render().unwrap()).unwrap();
        assert_eq!(json[0]["call"], "add-page");
        assert_eq!(json[0]["width"], 595.0);
    }
}
