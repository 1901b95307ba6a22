//! Auto-wiring fallback: builds any known class by reflecting its
//! constructor.
//!
//! Delegate a [`ReflectionContainer`] to a [`Container`] and every class
//! the [`Reflector`] can describe becomes resolvable without a definition.
//! Constructor parameters are looked up through the parent container, so
//! class-typed parameters pick up registered services first and fall back
//! to auto-wiring themselves.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Clock;
//!
//! let catalog = Arc::new(TypeCatalog::new());
//! catalog.register(
//!     ClassDescriptor::new("Clock").constructor(Signature::new("Clock::new"), |_| Ok(Clock)),
//! );
//!
//! let container = Container::builder().reflector(catalog.clone()).build().unwrap();
//! container.delegate(Arc::new(ReflectionContainer::new(catalog)));
//!
//! assert!(container.has("Clock"));
//! assert!(container.get("Clock").unwrap().downcast_ref::<Clock>().is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::argument::reflect_arguments;
use crate::container::{Container, WeakContainer};
use crate::error::{ContainerError, Lookup, Result};
use crate::reflection::Reflector;
use crate::registry::Resolver;
use crate::value::{Callable, Value};

/// A lookup source that constructs classes on demand.
pub struct ReflectionContainer {
    reflector: Arc<dyn Reflector>,
    cache_resolutions: bool,
    cache: RwLock<HashMap<String, Value>>,
    parent: OnceCell<WeakContainer>,
}

impl ReflectionContainer {
    pub fn new(reflector: Arc<dyn Reflector>) -> Self {
        Self {
            reflector,
            cache_resolutions: false,
            cache: RwLock::new(HashMap::new()),
            parent: OnceCell::new(),
        }
    }

    /// Reuse the first instance built for each class.
    pub fn cache_resolutions(mut self, cache: bool) -> Self {
        self.cache_resolutions = cache;
        self
    }

    /// The container this one was delegated to.
    ///
    /// # Errors
    /// [`ContainerError::Misuse`] when never delegated, or when the parent
    /// has since been dropped.
    pub fn container(&self) -> Result<Container> {
        self.parent
            .get()
            .and_then(WeakContainer::upgrade)
            .ok_or_else(|| {
                ContainerError::misuse(
                    "No container was attached to this reflection container, \
                     delegate it to a Container first",
                )
            })
    }

    /// Invokes `callable`, reflecting its arguments.
    ///
    /// Values in `supplied` are used for parameters of the same name;
    /// everything else is resolved through the parent container, or
    /// through this container when none is attached.
    pub fn call(&self, callable: &Callable, supplied: &HashMap<String, Value>) -> Result<Value> {
        trace!(function = %callable.name(), "Calling with reflected arguments");
        let args = match self.container() {
            Ok(parent) => reflect_arguments(callable.signature(), supplied, &parent)?,
            Err(_) => reflect_arguments(callable.signature(), supplied, self)?,
        };
        Ok(callable.call(args)?.into_value())
    }

    /// Builds `class`, honoring named overrides for its constructor.
    pub fn get_with(&self, class: &str, supplied: &HashMap<String, Value>) -> Result<Value> {
        self.build(class, supplied, false)
    }

    fn build(
        &self,
        class: &str,
        supplied: &HashMap<String, Value>,
        force_new: bool,
    ) -> Result<Value> {
        let cacheable = self.cache_resolutions && supplied.is_empty() && !force_new;
        if cacheable {
            if let Some(cached) = self.cache.read().get(class) {
                trace!(class = %class, "Returning cached auto-wired instance");
                return Ok(cached.clone());
            }
        }

        if !self.reflector.class_exists(class) {
            return Err(ContainerError::not_found(class, Lookup::Service));
        }

        let signature = self.reflector.constructor_signature(class)?;
        let args = match self.container() {
            Ok(parent) => reflect_arguments(&signature, supplied, &parent)?,
            Err(_) => reflect_arguments(&signature, supplied, self)?,
        };
        let value = Value::Object(self.reflector.construct(class, args)?);
        debug!(class = %class, "Auto-wired instance");

        if cacheable {
            self.cache.write().insert(class.to_string(), value.clone());
        }
        Ok(value)
    }
}

impl Resolver for ReflectionContainer {
    fn has(&self, id: &str) -> bool {
        self.reflector.class_exists(id)
    }

    fn get(&self, id: &str) -> Result<Value> {
        self.build(id, &HashMap::new(), false)
    }

    fn get_new(&self, id: &str) -> Result<Value> {
        self.build(id, &HashMap::new(), true)
    }

    fn attach(&self, parent: &Container) {
        if self.parent.set(parent.downgrade()).is_err() {
            debug!("Reflection container already attached, keeping the first parent");
        }
    }
}

impl fmt::Debug for ReflectionContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionContainer")
            .field("cache_resolutions", &self.cache_resolutions)
            .field("cached", &self.cache.read().len())
            .field("attached", &self.parent.get().is_some())
            .finish()
    }
}
