use super::{DrawTarget, Enhancement, EnhancementDefinition};
use crate::attributes::AttributeBag;
use crate::color::Color;
use crate::draw::{priority, DrawingTask, FillMode, LineStyle};
use crate::error::{PlumeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    Solid,
    Dotted,
    Dashed,
}

impl BorderStyle {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "solid" => Ok(BorderStyle::Solid),
            "dotted" => Ok(BorderStyle::Dotted),
            "dashed" => Ok(BorderStyle::Dashed),
            other => Err(PlumeError::InvalidArgument(format!(
                "unknown border style \"{}\"",
                other
            ))),
        }
    }

    fn dash(&self, width: f64) -> Vec<f64> {
        match self {
            BorderStyle::Solid => Vec::new(),
            BorderStyle::Dotted => vec![width, width * 2.0],
            BorderStyle::Dashed => vec![width * 3.0, width * 2.0],
        }
    }
}

/// Strokes the element outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub color: Color,
    pub width: f64,
    pub style: BorderStyle,
}

impl Border {
    pub fn definition() -> EnhancementDefinition {
        EnhancementDefinition::new(&["color", "width", "style"], &[], |parameters| {
            Ok(Box::new(Border::from_parameters(parameters)?))
        })
    }

    pub fn from_parameters(parameters: &AttributeBag) -> Result<Self> {
        let color = match parameters.get("color") {
            Some(value) => Color::from_value(value)?.unwrap_or(Color::BLACK),
            None => Color::BLACK,
        };
        let width = match parameters.get("width") {
            Some(value) if !value.is_null() => value.as_f64().filter(|w| *w >= 0.0).ok_or_else(|| {
                PlumeError::InvalidArgument(format!("invalid border width \"{}\"", value))
            })?,
            _ => 1.0,
        };
        let style = match parameters.get("style").and_then(|v| v.as_str()) {
            Some(name) => BorderStyle::parse(name)?,
            None => BorderStyle::Solid,
        };
        Ok(Self { color, width, style })
    }
}

impl Enhancement for Border {
    fn name(&self) -> &str {
        "border"
    }

    fn drawing_tasks(&self, target: &DrawTarget) -> Result<Vec<DrawingTask>> {
        if target.boundary.len() < 2 || self.width == 0.0 {
            return Ok(Vec::new());
        }

        let page = target.page;
        let points = target.boundary.points().to_vec();
        let style = LineStyle {
            width: self.width,
            dash: self.style.dash(self.width),
        };
        let color = self.color;

        Ok(vec![DrawingTask::new(priority::FOREGROUND2, move |surface| {
            surface.set_line_style(page, &style)?;
            surface.draw_polygon(page, &points, FillMode::Stroke, color)
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Value;

    #[test]
    fn defaults() {
        let border = Border::from_parameters(&AttributeBag::new()).unwrap();
        assert_eq!(border.color, Color::BLACK);
        assert_eq!(border.width, 1.0);
        assert_eq!(border.style, BorderStyle::Solid);
    }

    #[test]
    fn parameters_are_validated() {
        let bag: AttributeBag = [("style", Value::from("wavy"))].into_iter().collect();
        assert!(Border::from_parameters(&bag).is_err());

        let bag: AttributeBag = [("width", Value::from("thick"))].into_iter().collect();
        assert!(Border::from_parameters(&bag).is_err());

        let bag: AttributeBag = [("style", Value::from("dashed")), ("width", Value::from(2))]
            .into_iter()
            .collect();
        let border = Border::from_parameters(&bag).unwrap();
        assert_eq!(border.style.dash(border.width), vec![6.0, 4.0]);
    }
}
