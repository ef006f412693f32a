//! # Attribute Bags
//!
//! Style and configuration state for elements lives in ordered string-keyed
//! bags. Values are loosely typed ([`Value`]) so that a bag maps one to one
//! onto the JSON the front-end reads, and typed accessors on the element
//! convert them on the way out.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PlumeError, Result};

/// A loosely typed attribute value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Numeric strings such as `"12"` or `"12pt"`
    /// are accepted because stylesheets routinely produce them.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().trim_end_matches("pt").trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Text(s) => match s.as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Dimension> for Value {
    fn from(d: Dimension) -> Self {
        match d {
            Dimension::Pt(v) => Value::Number(v),
            Dimension::Auto => Value::Text("auto".to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// A margin or padding measure: points, or the `auto` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Dimension {
    Pt(f64),
    #[default]
    Auto,
}

impl Dimension {
    /// Points value, with `auto` resolving to zero.
    pub fn resolve(&self) -> f64 {
        match self {
            Dimension::Pt(v) => *v,
            Dimension::Auto => 0.0,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn from_value(value: &Value) -> Result<Dimension> {
        match value {
            Value::Null => Ok(Dimension::Pt(0.0)),
            Value::Text(s) if s.trim() == "auto" => Ok(Dimension::Auto),
            other => other.as_f64().map(Dimension::Pt).ok_or_else(|| {
                PlumeError::InvalidArgument(format!(
                    "expected a number or \"auto\", got \"{}\"",
                    other
                ))
            }),
        }
    }
}

/// Expand 1–4 shorthand values into `[top, right, bottom, left]`.
///
/// Two values set the vertical then the horizontal edges. With three values
/// the left edge repeats the top one.
pub fn expand_shorthand(values: &[Value]) -> Result<[Value; 4]> {
    let parsed: Vec<Value> = values
        .iter()
        .map(|v| Dimension::from_value(v).map(Value::from))
        .collect::<Result<_>>()?;

    match parsed.as_slice() {
        [all] => Ok([all.clone(), all.clone(), all.clone(), all.clone()]),
        [vertical, horizontal] => Ok([
            vertical.clone(),
            horizontal.clone(),
            vertical.clone(),
            horizontal.clone(),
        ]),
        [top, right, bottom] => Ok([top.clone(), right.clone(), bottom.clone(), top.clone()]),
        [top, right, bottom, left] => {
            Ok([top.clone(), right.clone(), bottom.clone(), left.clone()])
        }
        _ => Err(PlumeError::InvalidArgument(format!(
            "shorthand takes 1 to 4 values, got {}",
            values.len()
        ))),
    }
}

/// Split a shorthand attribute value (`"10 auto"`, a list, or a single
/// number) into its parts.
pub fn shorthand_parts(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Text(s) => s.split_whitespace().map(Value::from).collect(),
        other => vec![other.clone()],
    }
}

/// An insertion-ordered bag of named values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag<T> {
    elements: IndexMap<String, T>,
}

/// Attribute values of one element, or the parameters of one enhancement.
pub type AttributeBag = Bag<Value>;

/// Enhancement name to its parameters.
pub type EnhancementBag = Bag<AttributeBag>;

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self {
            elements: IndexMap::new(),
        }
    }
}

impl<T: Clone> Bag<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: T) -> &mut Self {
        self.elements.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.elements.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.elements.get_mut(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        self.elements.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, T> {
        self.elements.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Merge bags into a new one. Later bags win on conflicting keys.
    pub fn merge<'a, I>(bags: I) -> Self
    where
        I: IntoIterator<Item = &'a Bag<T>>,
        T: 'a,
    {
        let mut merged = Bag::new();
        for bag in bags {
            for (name, value) in bag.iter() {
                merged.add(name.clone(), value.clone());
            }
        }
        merged
    }
}

impl<T: Clone, K: Into<String>> FromIterator<(K, T)> for Bag<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut bag = Bag::new();
        for (name, value) in iter {
            bag.add(name, value);
        }
        bag
    }
}

impl Bag<AttributeBag> {
    /// Merge `parameters` into the entry for `name`, creating it if needed.
    pub fn merge_parameters(&mut self, name: &str, parameters: &AttributeBag) {
        let merged = match self.get(name) {
            Some(existing) => Bag::merge([existing, parameters]),
            None => parameters.clone(),
        };
        self.add(name, merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, Value)]) -> AttributeBag {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn merge_later_wins_and_keeps_order() {
        let a = bag(&[("color", "red".into()), ("width", 10.into())]);
        let b = bag(&[("height", 5.into()), ("color", "blue".into())]);

        let merged = AttributeBag::merge([&a, &b]);
        assert_eq!(merged.get("color"), Some(&Value::from("blue")));
        assert_eq!(merged.get("width"), Some(&Value::from(10)));
        let names: Vec<&str> = merged.names().collect();
        assert_eq!(names, vec!["color", "width", "height"]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        let merged = AttributeBag::merge(std::iter::empty());
        assert!(merged.is_empty());
    }

    #[test]
    fn enhancement_parameters_merge() {
        let mut enhancements = EnhancementBag::new();
        enhancements.merge_parameters("border", &bag(&[("color", "red".into())]));
        enhancements.merge_parameters("border", &bag(&[("style", "dotted".into())]));

        let border = enhancements.get("border").unwrap();
        assert_eq!(border.get("color"), Some(&Value::from("red")));
        assert_eq!(border.get("style"), Some(&Value::from("dotted")));
        assert_eq!(enhancements.len(), 1);
    }

    #[test]
    fn bag_serialization_round_trip() {
        let original = bag(&[
            ("font-size", 12.into()),
            ("display", "none".into()),
            ("splittable", true.into()),
            ("margin", Value::List(vec![5.into(), "auto".into()])),
            ("unset", Value::Null),
        ]);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(
            json,
            r#"{"font-size":12.0,"display":"none","splittable":true,"margin":[5.0,"auto"],"unset":null}"#
        );
        let back: AttributeBag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn shorthand_expansion() {
        let three = expand_shorthand(&[5.into(), 10.into(), 15.into()]).unwrap();
        assert_eq!(three, [5.into(), 10.into(), 15.into(), 5.into()]);

        let two = expand_shorthand(&["auto".into(), 10.into()]).unwrap();
        assert_eq!(two, ["auto".into(), 10.into(), "auto".into(), 10.into()]);

        assert!(expand_shorthand(&[]).is_err());
        assert!(expand_shorthand(&["wide".into()]).is_err());
    }

    #[test]
    fn shorthand_parts_from_string() {
        assert_eq!(
            shorthand_parts(&Value::from("10 20")),
            vec![Value::from("10"), Value::from("20")]
        );
        assert_eq!(shorthand_parts(&Value::from(4)), vec![Value::from(4)]);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::from("12pt").as_f64(), Some(12.0));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::from("false").as_bool(), Some(false));
    }
}
