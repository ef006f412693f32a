//! # Enhancements
//!
//! Enhancements are decorations drawn from an element's boundary, such as a
//! border or a background fill. Elements only store enhancement parameters
//! (an [`EnhancementBag`](crate::attributes::EnhancementBag)); the document
//! turns them into [`Enhancement`] objects through an [`EnhancementFactory`]
//! at drawing time.

mod background;
mod border;

use std::fmt;

use indexmap::IndexMap;

pub use background::Background;
pub use border::{Border, BorderStyle};

use crate::attributes::AttributeBag;
use crate::draw::DrawingTask;
use crate::element::ElementKind;
use crate::error::{PlumeError, Result};
use crate::geometry::Boundary;

/// What an enhancement draws around.
#[derive(Debug, Clone)]
pub struct DrawTarget {
    /// Surface page index.
    pub page: usize,
    pub kind: ElementKind,
    pub boundary: Boundary,
}

pub trait Enhancement: fmt::Debug {
    fn name(&self) -> &str;

    fn drawing_tasks(&self, target: &DrawTarget) -> Result<Vec<DrawingTask>>;
}

pub type Constructor = fn(&AttributeBag) -> Result<Box<dyn Enhancement>>;

/// Parameter names an enhancement understands and how to build it.
#[derive(Clone)]
pub struct EnhancementDefinition {
    parameters: Vec<String>,
    required: Vec<String>,
    constructor: Constructor,
}

impl EnhancementDefinition {
    pub fn new(parameters: &[&str], required: &[&str], constructor: Constructor) -> Self {
        Self {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            required: required.iter().map(|p| p.to_string()).collect(),
            constructor,
        }
    }
}

impl fmt::Debug for EnhancementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementDefinition")
            .field("parameters", &self.parameters)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnhancementFactory {
    definitions: IndexMap<String, EnhancementDefinition>,
}

impl EnhancementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory knowing `border` and `background`.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.add_definition("border", Border::definition());
        factory.add_definition("background", Background::definition());
        factory
    }

    pub fn add_definition(&mut self, name: &str, definition: EnhancementDefinition) {
        self.definitions.insert(name.to_string(), definition);
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    fn definition(&self, name: &str) -> Result<&EnhancementDefinition> {
        self.definitions
            .get(name)
            .ok_or_else(|| PlumeError::DefinitionNotFound(name.to_string()))
    }

    /// Parameter names of the enhancement `name`, in declaration order.
    pub fn parameters(&self, name: &str) -> Result<Vec<&str>> {
        Ok(self
            .definition(name)?
            .parameters
            .iter()
            .map(String::as_str)
            .collect())
    }

    pub fn create(&self, name: &str, parameters: &AttributeBag) -> Result<Box<dyn Enhancement>> {
        let definition = self.definition(name)?;
        let missing: Vec<&str> = definition
            .required
            .iter()
            .filter(|required| parameters.get(required).map_or(true, |v| v.is_null()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(PlumeError::InvalidArgument(format!(
                "enhancement \"{}\" requires {}",
                name,
                missing.join(", ")
            )));
        }
        (definition.constructor)(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Value;

    #[derive(Debug)]
    struct Stub;

    impl Enhancement for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn drawing_tasks(&self, _target: &DrawTarget) -> Result<Vec<DrawingTask>> {
            Ok(Vec::new())
        }
    }

    fn stub_definition() -> EnhancementDefinition {
        EnhancementDefinition::new(&["color", "some-parameter"], &["color"], |_| Ok(Box::new(Stub)))
    }

    #[test]
    fn definitions_are_registered_by_name() {
        let mut factory = EnhancementFactory::new();
        assert!(!factory.has_definition("stub"));
        factory.add_definition("stub", stub_definition());
        assert!(factory.has_definition("stub"));
        assert_eq!(factory.parameters("stub").unwrap(), vec!["color", "some-parameter"]);
    }

    #[test]
    fn required_parameters_must_be_passed() {
        let mut factory = EnhancementFactory::new();
        factory.add_definition("stub", stub_definition());
        assert!(matches!(
            factory.create("stub", &AttributeBag::new()),
            Err(PlumeError::InvalidArgument(_))
        ));

        let parameters: AttributeBag = [
            ("color", Value::from("#bbbbbb")),
            ("some-parameter", Value::from("value")),
        ]
        .into_iter()
        .collect();
        assert_eq!(factory.create("stub", &parameters).unwrap().name(), "stub");
    }

    #[test]
    fn unknown_definition() {
        let factory = EnhancementFactory::new();
        assert!(matches!(
            factory.create("stub", &AttributeBag::new()),
            Err(PlumeError::DefinitionNotFound(_))
        ));
        assert!(factory.parameters("stub").is_err());
    }

    #[test]
    fn cloned_factory_keeps_definitions() {
        let factory = EnhancementFactory::with_defaults();
        let copy = factory.clone();
        assert_eq!(
            factory.parameters("border").unwrap(),
            copy.parameters("border").unwrap()
        );
        assert!(copy.has_definition("background"));
    }
}
