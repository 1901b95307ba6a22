//! Inflectors: post-resolution hooks keyed by type.
//!
//! Every object leaving the container is offered to each registered
//! [`Inflector`], in registration order. An inflector applies when the
//! object *is a* instance of its type, supertypes included, and then
//! assigns its properties, invokes its methods and runs its callback.
//! The object's identity never changes.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::argument::{Argument, resolve_arguments};
use crate::container::Container;
use crate::definition::MethodCall;
use crate::error::Result;
use crate::value::{Instance, Value};

/// Callback run against every matching object.
pub type InflectorCallback = Arc<dyn Fn(&Instance) -> Result<()> + Send + Sync>;

struct InflectorState {
    type_name: String,
    properties: Vec<(String, Argument)>,
    methods: Vec<MethodCall>,
    callback: Option<InflectorCallback>,
}

/// A hook applied to every resolved object of a given type.
///
/// Properties and methods are ordered maps: setting the same name twice
/// replaces the earlier entry in place.
///
/// ```rust
/// use wirebox_container::prelude::*;
///
/// let container = Container::new();
/// container
///     .inflector("Logger")
///     .invoke_method("set_level", vec![Argument::raw("debug")])
///     .set_property("channel", Argument::raw("app"));
/// ```
#[derive(Clone)]
pub struct Inflector {
    inner: Arc<RwLock<InflectorState>>,
}

impl Inflector {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(InflectorState {
                type_name: type_name.into(),
                properties: Vec::new(),
                methods: Vec::new(),
                callback: None,
            })),
        }
    }

    pub fn type_name(&self) -> String {
        self.inner.read().type_name.clone()
    }

    /// Queues `method` with `arguments`, replacing an earlier call to the
    /// same method.
    pub fn invoke_method(self, method: impl Into<String>, arguments: Vec<Argument>) -> Self {
        let method = method.into();
        {
            let mut state = self.inner.write();
            match state.methods.iter_mut().find(|call| call.method == method) {
                Some(call) => call.arguments = arguments,
                None => state.methods.push(MethodCall { method, arguments }),
            }
        }
        self
    }

    pub fn invoke_methods(mut self, calls: impl IntoIterator<Item = MethodCall>) -> Self {
        for call in calls {
            self = self.invoke_method(call.method, call.arguments);
        }
        self
    }

    /// Assigns `property` from `value`, replacing an earlier assignment.
    pub fn set_property(self, property: impl Into<String>, value: impl Into<Argument>) -> Self {
        let property = property.into();
        let value = value.into();
        {
            let mut state = self.inner.write();
            match state.properties.iter_mut().find(|(name, _)| *name == property) {
                Some((_, existing)) => *existing = value,
                None => state.properties.push((property, value)),
            }
        }
        self
    }

    pub fn set_properties(
        mut self,
        properties: impl IntoIterator<Item = (String, Argument)>,
    ) -> Self {
        for (name, value) in properties {
            self = self.set_property(name, value);
        }
        self
    }

    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.write().callback = Some(Arc::new(callback));
        self
    }

    /// Applies this inflector to `instance` if its type matches.
    pub fn inflect(&self, instance: &Instance, container: &Container) -> Result<()> {
        let (type_name, properties, methods, callback) = {
            let state = self.inner.read();
            (
                state.type_name.clone(),
                state.properties.clone(),
                state.methods.clone(),
                state.callback.clone(),
            )
        };

        let reflector = container.reflector();
        if !reflector.is_a(instance, &type_name) {
            return Ok(());
        }
        trace!(class = %instance.class(), inflector = %type_name, "Inflecting");

        for (property, argument) in &properties {
            let value = argument.resolve(container)?;
            reflector.set_property(instance, property, value)?;
        }

        for call in &methods {
            let args = resolve_arguments(&call.arguments, container)?;
            reflector.invoke_method(instance, &call.method, args)?;
        }

        if let Some(callback) = callback {
            callback(instance)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Inflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("Inflector")
            .field("type_name", &state.type_name)
            .field(
                "properties",
                &state.properties.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field(
                "methods",
                &state.methods.iter().map(|call| &call.method).collect::<Vec<_>>(),
            )
            .field("callback", &state.callback.is_some())
            .finish()
    }
}

/// Ordered collection of [`Inflector`]s.
#[derive(Debug, Default)]
pub struct InflectorAggregate {
    inflectors: RwLock<Vec<Inflector>>,
}

impl InflectorAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inflector for `type_name`.
    pub fn add(&self, type_name: &str, callback: Option<InflectorCallback>) -> Inflector {
        let inflector = Inflector::new(type_name);
        if let Some(callback) = callback {
            inflector.inner.write().callback = Some(callback);
        }
        debug!(type_name = %type_name, "Registered inflector");
        self.inflectors.write().push(inflector.clone());
        inflector
    }

    /// Runs every matching inflector over `value` and returns it.
    ///
    /// Non-object values pass through untouched.
    pub fn inflect(&self, value: Value, container: &Container) -> Result<Value> {
        let Value::Object(instance) = &value else {
            return Ok(value);
        };

        let inflectors = self.inflectors.read().clone();
        for inflector in &inflectors {
            inflector.inflect(instance, container)?;
        }
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inflectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflectors.read().is_empty()
    }
}
