//! Type-directed resolution of definitions.
//!
//! Precedence for every constructor parameter is fixed:
//!
//! ```text
//! override  →  locator entry with the parameter's name  →  default  →  MissingType
//! ```
//!
//! Lookup is by parameter *name*, never by declared type: two parameters of
//! the same type but different names resolve independently.

use tracing::{debug, trace};

use crate::container::Locator;
use crate::container::class::{ClassRegistry, Parameter};
use crate::container::definition::{Definition, DefinitionClassifier, ObjectDescriptor, Overrides};
use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Turns definitions into values.
///
/// Borrows the locator it falls back on and the class registry it builds
/// from; it holds no state of its own and is cheap to create per call.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    locator: &'a dyn Locator,
    classes: &'a ClassRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(locator: &'a dyn Locator, classes: &'a ClassRegistry) -> Self {
        Self { locator, classes }
    }

    /// Resolves one definition.
    ///
    /// Closures are invoked once with the locator. Descriptors and class names
    /// are built through [`resolve_object`](Self::resolve_object), with
    /// `overrides` layered over a descriptor's own args. Literals come back
    /// unchanged.
    pub fn resolve(&self, definition: &Definition, overrides: &Overrides) -> Result<Value> {
        match definition {
            Definition::Closure(factory) => factory(self.locator),
            Definition::Descriptor(descriptor) if overrides.is_empty() => {
                self.resolve_object(descriptor).map(Value::Object)
            }
            Definition::Descriptor(descriptor) => {
                let mut merged = descriptor.clone();
                merged.args.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
                self.resolve_object(&merged).map(Value::Object)
            }
            Definition::ClassName(class) => {
                let descriptor = ObjectDescriptor::with_args(class.as_str(), overrides.clone());
                self.resolve_object(&descriptor).map(Value::Object)
            }
            Definition::Literal(value) => Ok(value.clone()),
        }
    }

    /// Classifies a raw value, then resolves it.
    pub fn resolve_value(&self, value: Value, overrides: &Overrides) -> Result<Value> {
        let definition = DefinitionClassifier::new(self.classes).classify(value);
        self.resolve(&definition, overrides)
    }

    /// Builds an instance of `descriptor.class`.
    ///
    /// A class without constructor parameters is built directly; the locator
    /// is not consulted.
    pub fn resolve_object(&self, descriptor: &ObjectDescriptor) -> Result<Object> {
        let class = self.classes.get(&descriptor.class).ok_or_else(|| Error::UnknownClass {
            class: descriptor.class.clone(),
        })?;

        debug!(class = %descriptor.class, overrides = descriptor.args.len(), "building object");

        if class.parameters().is_empty() {
            return class.construct(Vec::new());
        }
        let args = self.resolve_args(class.parameters(), &descriptor.args)?;
        class.construct(args)
    }

    /// Resolves constructor arguments in declared parameter order.
    ///
    /// The result always has one value per parameter, in the order of
    /// `parameters` regardless of the iteration order of `overrides`.
    pub fn resolve_args(&self, parameters: &[Parameter], overrides: &Overrides) -> Result<Vec<Value>> {
        parameters.iter()
            .map(|parameter| self.resolve_parameter(parameter, overrides))
            .collect()
    }

    fn resolve_parameter(&self, parameter: &Parameter, overrides: &Overrides) -> Result<Value> {
        let name = parameter.name();

        if let Some(value) = overrides.get(name) {
            trace!(parameter = name, "using override");
            return Ok(value.clone());
        }
        if self.locator.has(name) {
            trace!(parameter = name, "using locator entry");
            return self.locator.get(name);
        }
        if let Some(default) = parameter.default() {
            trace!(parameter = name, "using default");
            return Ok(default.clone());
        }

        Err(Error::MissingType {
            parameter: name.to_owned(),
            declared_type: parameter.declared_type().map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::container::class::{Args, Class};

    /// Locator double recording every `has`/`get` call.
    #[derive(Default)]
    struct RecordingLocator {
        entries: HashMap<String, Value>,
        has_calls: Mutex<Vec<String>>,
        get_calls: Mutex<Vec<String>>,
    }

    impl RecordingLocator {
        fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
            self.entries.insert(name.to_owned(), value.into());
            self
        }

        fn has_calls(&self) -> Vec<String> {
            self.has_calls.lock().unwrap().clone()
        }

        fn get_calls(&self) -> Vec<String> {
            self.get_calls.lock().unwrap().clone()
        }
    }

    impl Locator for RecordingLocator {
        fn has(&self, name: &str) -> bool {
            self.has_calls.lock().unwrap().push(name.to_owned());
            self.entries.contains_key(name)
        }

        fn get(&self, name: &str) -> Result<Value> {
            self.get_calls.lock().unwrap().push(name.to_owned());
            self.entries.get(name).cloned().ok_or_else(|| Error::NotFound { id: name.to_owned() })
        }

        fn build(&self, descriptor: &ObjectDescriptor) -> Result<Object> {
            Err(Error::UnknownClass { class: descriptor.class.clone() })
        }
    }

    struct WithoutConstructor;

    struct WithParams { string: String, int: i64 }

    struct WithParamsNoTypeDefault { a: Value, b: Value }

    fn classes() -> ClassRegistry {
        let mut classes = ClassRegistry::new();
        classes.register(Class::new("WithoutConstructor", |_| Ok(Object::new(WithoutConstructor))));
        classes.register(
            Class::new("WithParams", |args: Args| {
                Ok(Object::new(WithParams { string: args.string("string")?, int: args.int("int")? }))
            })
            .param(Parameter::typed("string", "String"))
            .param(Parameter::typed("int", "i64")),
        );
        classes.register(
            Class::new("WithParamsNoTypeDefault", |args: Args| {
                Ok(Object::new(WithParamsNoTypeDefault { a: args.value("a")?, b: args.value("b")? }))
            })
            .param(Parameter::new("a").with_default("first"))
            .param(Parameter::new("b").with_default(2)),
        );
        classes.register(
            Class::new("WithParamsNoType", |_| Ok(Object::new(())))
                .param(Parameter::new("first"))
                .param(Parameter::new("second")),
        );
        classes
    }

    fn params(classes: &ClassRegistry, class: &str) -> Vec<Parameter> {
        classes.get(class).unwrap().parameters().to_vec()
    }

    #[test]
    fn closure_is_invoked_once_with_the_locator() {
        let locator = RecordingLocator::default().with("greeting", "test string");
        let classes = classes();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let definition = Definition::Closure(Arc::new(move |locator: &dyn Locator| {
            counter.fetch_add(1, Ordering::SeqCst);
            locator.get("greeting")
        }));

        let result = Resolver::new(&locator, &classes)
            .resolve(&definition, &Overrides::new())
            .unwrap();

        assert_eq!(result, Value::from("test string"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn descriptor_without_constructor_skips_the_locator() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let definition = Definition::Descriptor(ObjectDescriptor::new("WithoutConstructor"));

        let result = Resolver::new(&locator, &classes)
            .resolve(&definition, &Overrides::new())
            .unwrap();

        assert!(result.as_object().unwrap().is::<WithoutConstructor>());
        assert!(locator.has_calls().is_empty());
        assert!(locator.get_calls().is_empty());
    }

    #[test]
    fn class_name_is_built_as_an_object() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let definition = Definition::ClassName("WithoutConstructor".to_owned());

        let result = Resolver::new(&locator, &classes)
            .resolve(&definition, &Overrides::new())
            .unwrap();

        assert_eq!(result.as_object().unwrap().class(), "WithoutConstructor");
        assert!(locator.has_calls().is_empty());
    }

    #[test]
    fn literals_pass_through_untouched() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let resolver = Resolver::new(&locator, &classes);

        for literal in [Value::from("test string"), Value::from(3), Value::from(vec!["test"])] {
            let resolved = resolver.resolve_value(literal.clone(), &Overrides::new()).unwrap();
            assert_eq!(resolved, literal);
        }
        assert!(locator.has_calls().is_empty());
        assert!(locator.get_calls().is_empty());
    }

    #[test]
    fn object_with_defaults_only_needs_no_locator_entries() {
        let locator = RecordingLocator::default();
        let classes = classes();

        let object = Resolver::new(&locator, &classes)
            .resolve_object(&ObjectDescriptor::new("WithParamsNoTypeDefault"))
            .unwrap();

        let built = object.downcast::<WithParamsNoTypeDefault>().unwrap();
        assert_eq!(built.a, Value::from("first"));
        assert_eq!(built.b, Value::from(2));
        assert!(locator.get_calls().is_empty());
    }

    #[test]
    fn object_with_args_uses_overrides_and_never_queries_the_locator() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let descriptor = ObjectDescriptor::new("WithParams")
            .arg("string", "hello world")
            .arg("int", 11);

        let object = Resolver::new(&locator, &classes).resolve_object(&descriptor).unwrap();

        let built = object.downcast::<WithParams>().unwrap();
        assert_eq!(built.string, "hello world");
        assert_eq!(built.int, 11);
        assert!(locator.has_calls().is_empty());
        assert!(locator.get_calls().is_empty());
    }

    #[test]
    fn resolve_overrides_layer_over_descriptor_args() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let definition = Definition::Descriptor(
            ObjectDescriptor::new("WithParams").arg("string", "from descriptor").arg("int", 1),
        );
        let overrides = Overrides::from([("int".to_owned(), Value::from(2))]);

        let value = Resolver::new(&locator, &classes).resolve(&definition, &overrides).unwrap();

        let built = value.as_object().unwrap().downcast::<WithParams>().unwrap();
        assert_eq!(built.string, "from descriptor");
        assert_eq!(built.int, 2);
    }

    #[test]
    fn unknown_class_is_reported() {
        let locator = RecordingLocator::default();
        let classes = classes();

        let err = Resolver::new(&locator, &classes)
            .resolve_object(&ObjectDescriptor::new("Nope"))
            .unwrap_err();

        assert!(matches!(err, Error::UnknownClass { class } if class == "Nope"));
    }

    #[test]
    fn args_fall_back_to_the_locator_by_name() {
        let locator = RecordingLocator::default().with("string", "test");
        let classes = classes();
        let parameters = params(&classes, "WithParams");
        let overrides = Overrides::from([("int".to_owned(), Value::from(11))]);

        let args = Resolver::new(&locator, &classes).resolve_args(&parameters, &overrides).unwrap();

        assert_eq!(args, vec![Value::from("test"), Value::from(11)]);
        assert_eq!(locator.has_calls(), vec!["string"]);
        assert_eq!(locator.get_calls(), vec!["string"]);
    }

    #[test]
    fn missing_locator_entry_without_default_fails() {
        let locator = RecordingLocator::default().with("string", "test");
        let classes = classes();
        let parameters = params(&classes, "WithParams");

        let err = Resolver::new(&locator, &classes)
            .resolve_args(&parameters, &Overrides::new())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingType { parameter, declared_type }
                if parameter == "int" && declared_type.as_deref() == Some("i64")
        ));
        assert_eq!(locator.has_calls(), vec!["string", "int"]);
        assert_eq!(locator.get_calls(), vec!["string"]);
    }

    #[test]
    fn defaults_are_used_without_a_get() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let parameters = params(&classes, "WithParamsNoTypeDefault");

        let args = Resolver::new(&locator, &classes)
            .resolve_args(&parameters, &Overrides::new())
            .unwrap();

        assert_eq!(args, vec![Value::from("first"), Value::from(2)]);
        assert!(locator.get_calls().is_empty());
    }

    #[test]
    fn locator_entry_wins_over_default() {
        let locator = RecordingLocator::default().with("b", "from locator");
        let classes = classes();
        let parameters = params(&classes, "WithParamsNoTypeDefault");

        let args = Resolver::new(&locator, &classes)
            .resolve_args(&parameters, &Overrides::new())
            .unwrap();

        assert_eq!(args, vec![Value::from("first"), Value::from("from locator")]);
        assert_eq!(locator.get_calls(), vec!["b"]);
    }

    #[test]
    fn untyped_parameters_without_sources_fail() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let parameters = params(&classes, "WithParamsNoType");

        let err = Resolver::new(&locator, &classes)
            .resolve_args(&parameters, &Overrides::new())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingType { parameter, declared_type: None } if parameter == "first"
        ));
    }

    #[test]
    fn argument_order_follows_parameters_not_overrides() {
        let locator = RecordingLocator::default();
        let classes = classes();
        let parameters = params(&classes, "WithParams");
        let mut overrides = Overrides::new();
        overrides.insert("int".to_owned(), Value::from(5));
        overrides.insert("string".to_owned(), Value::from("s"));
        overrides.insert("unused".to_owned(), Value::Null);

        let args = Resolver::new(&locator, &classes).resolve_args(&parameters, &overrides).unwrap();

        assert_eq!(args.len(), parameters.len());
        assert_eq!(args, vec![Value::from("s"), Value::from(5)]);
    }

    #[test]
    fn same_type_parameters_resolve_independently_by_name() {
        let locator = RecordingLocator::default()
            .with("primary", "db-1")
            .with("replica", "db-2");
        let classes = classes();
        let parameters = vec![
            Parameter::typed("primary", "Database"),
            Parameter::typed("replica", "Database"),
        ];

        let args = Resolver::new(&locator, &classes)
            .resolve_args(&parameters, &Overrides::new())
            .unwrap();

        assert_eq!(args, vec![Value::from("db-1"), Value::from("db-2")]);
    }
}
