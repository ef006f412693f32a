//! Attribute declarations per element kind.
//!
//! Each kind declares the attributes it understands together with their
//! defaults and, where a value needs validation or fans out into other
//! attributes, a setter. Anything not declared here is rejected by
//! [`Element::set_attribute`].

use std::fmt;

use indexmap::IndexMap;

use super::{Element, ElementKind};
use crate::attributes::{expand_shorthand, shorthand_parts, Dimension, Value};
use crate::color::Color;
use crate::error::{PlumeError, Result};
use crate::font::FontStyle;

/// A typed setter. It receives the attribute name and the raw value and
/// stores whatever it derives through [`Element::set_attribute_directly`].
pub type Setter = fn(&mut Element, &str, Value) -> Result<()>;

#[derive(Clone)]
pub struct AttributeDeclaration {
    pub default: Value,
    pub setter: Option<Setter>,
}

impl fmt::Debug for AttributeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDeclaration")
            .field("default", &self.default)
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}

/// Declared attribute names of one element, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    declarations: IndexMap<String, AttributeDeclaration>,
}

impl AttributeTable {
    pub fn declare(&mut self, name: &str, default: impl Into<Value>, setter: Option<Setter>) {
        self.declarations.insert(
            name.to_string(),
            AttributeDeclaration {
                default: default.into(),
                setter,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDeclaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeDeclaration)> {
        self.declarations.iter()
    }
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Build the attribute table for `kind`.
pub fn table_for(kind: ElementKind) -> AttributeTable {
    let mut table = AttributeTable::default();

    table.declare("width", Value::Null, Some(set_size));
    table.declare("height", Value::Null, Some(set_size));
    for side in SIDES {
        table.declare(&format!("margin-{}", side), Value::Null, Some(set_dimension));
        table.declare(&format!("padding-{}", side), Value::Null, Some(set_dimension));
    }
    table.declare("margin", Value::Null, Some(set_margin));
    table.declare("padding", Value::Null, Some(set_padding));
    table.declare("display", "block", Some(set_display));
    table.declare("splittable", kind.splittable_by_default(), Some(set_flag));

    table.declare("color", Value::Null, Some(set_color));
    table.declare("font-family", "Helvetica", None);
    table.declare("font-size", 12, Some(set_size));
    table.declare("font-style", "normal", Some(set_font_style));
    table.declare("line-height", Value::Null, Some(set_size));

    if kind == ElementKind::Image {
        table.declare("src", Value::Null, None);
    }

    table
}

fn set_size(element: &mut Element, name: &str, value: Value) -> Result<()> {
    let stored = match &value {
        Value::Null => Value::Null,
        other => match other.as_f64() {
            Some(v) if v >= 0.0 && v.is_finite() => Value::Number(v),
            _ => {
                return Err(PlumeError::InvalidArgument(format!(
                    "\"{}\" must be a non-negative number, got \"{}\"",
                    name, other
                )))
            }
        },
    };
    element.set_attribute_directly(name, stored);
    Ok(())
}

fn set_dimension(element: &mut Element, name: &str, value: Value) -> Result<()> {
    let stored = match value {
        Value::Null => Value::Null,
        other => Dimension::from_value(&other)?.into(),
    };
    element.set_attribute_directly(name, stored);
    Ok(())
}

fn set_edges(element: &mut Element, prefix: &str, value: Value) -> Result<()> {
    let expanded = expand_shorthand(&shorthand_parts(&value))?;
    for (side, edge) in SIDES.iter().zip(expanded) {
        element.set_attribute_directly(&format!("{}-{}", prefix, side), edge);
    }
    element.set_attribute_directly(prefix, value);
    Ok(())
}

fn set_margin(element: &mut Element, _name: &str, value: Value) -> Result<()> {
    set_edges(element, "margin", value)
}

fn set_padding(element: &mut Element, _name: &str, value: Value) -> Result<()> {
    set_edges(element, "padding", value)
}

fn set_display(element: &mut Element, _name: &str, value: Value) -> Result<()> {
    match value.as_str() {
        Some("block") | Some("none") => {
            element.set_attribute_directly("display", value);
            Ok(())
        }
        _ => Err(PlumeError::InvalidArgument(format!(
            "display must be \"block\" or \"none\", got \"{}\"",
            value
        ))),
    }
}

fn set_flag(element: &mut Element, name: &str, value: Value) -> Result<()> {
    let flag = value.as_bool().ok_or_else(|| {
        PlumeError::InvalidArgument(format!("\"{}\" must be a boolean, got \"{}\"", name, value))
    })?;
    element.set_attribute_directly(name, Value::Bool(flag));
    Ok(())
}

fn set_color(element: &mut Element, _name: &str, value: Value) -> Result<()> {
    Color::from_value(&value)?;
    element.set_attribute_directly("color", value);
    Ok(())
}

fn set_font_style(element: &mut Element, _name: &str, value: Value) -> Result<()> {
    let style = FontStyle::parse(value.as_str().unwrap_or_default());
    element.set_attribute_directly("font-style", Value::from(style.as_str()));
    Ok(())
}
