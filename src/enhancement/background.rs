use super::{DrawTarget, Enhancement, EnhancementDefinition};
use crate::attributes::AttributeBag;
use crate::color::Color;
use crate::draw::{priority, DrawingTask, FillMode};
use crate::error::{PlumeError, Result};

/// Fills the element outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub color: Color,
}

impl Background {
    pub fn definition() -> EnhancementDefinition {
        EnhancementDefinition::new(&["color"], &["color"], |parameters| {
            Ok(Box::new(Background::from_parameters(parameters)?))
        })
    }

    pub fn from_parameters(parameters: &AttributeBag) -> Result<Self> {
        let color = parameters
            .get("color")
            .map(Color::from_value)
            .transpose()?
            .flatten()
            .ok_or_else(|| {
                PlumeError::InvalidArgument("background needs a color".to_string())
            })?;
        Ok(Self { color })
    }
}

impl Enhancement for Background {
    fn name(&self) -> &str {
        "background"
    }

    fn drawing_tasks(&self, target: &DrawTarget) -> Result<Vec<DrawingTask>> {
        if target.boundary.len() < 3 {
            return Ok(Vec::new());
        }

        let page = target.page;
        let points = target.boundary.points().to_vec();
        let color = self.color;

        Ok(vec![DrawingTask::new(priority::BACKGROUND1, move |surface| {
            surface.draw_polygon(page, &points, FillMode::Fill, color)
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Value;
    use crate::draw::{DrawingSurface, RecordingSurface, SurfaceCall};
    use crate::element::ElementKind;
    use crate::geometry::{Boundary, Point};

    #[test]
    fn fills_the_boundary() {
        let bag: AttributeBag = [("color", Value::from("#ff0000"))].into_iter().collect();
        let background = Background::from_parameters(&bag).unwrap();
        let target = DrawTarget {
            page: 0,
            kind: ElementKind::Container,
            boundary: Boundary::rectangle(Point::new(0.0, 10.0), 10.0, 10.0).unwrap(),
        };

        let mut surface = RecordingSurface::new();
        let calls = surface.calls();
        surface.add_page(10.0, 10.0).unwrap();
        for task in background.drawing_tasks(&target).unwrap() {
            assert_eq!(task.priority(), priority::BACKGROUND1);
            task.invoke(&mut surface).unwrap();
        }

        match &calls.borrow()[1] {
            SurfaceCall::Polygon { mode, color, points, .. } => {
                assert_eq!(*mode, FillMode::Fill);
                assert_eq!(*color, Color::rgb(1.0, 0.0, 0.0));
                assert_eq!(points.len(), 5);
            }
            other => panic!("unexpected call {:?}", other),
        };
    }

    #[test]
    fn color_is_required() {
        assert!(Background::from_parameters(&AttributeBag::new()).is_err());
    }
}
