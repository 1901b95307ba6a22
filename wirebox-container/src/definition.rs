//! Definitions: how to build one service.
//!
//! A [`Definition`] couples an alias with a [`Concrete`] recipe, bound
//! arguments, queued method calls, tags and a shared flag. Shared
//! definitions memoize their first non-forced resolution.
//!
//! # Examples
//! ```rust
//! use wirebox_container::prelude::*;
//!
//! let container = Container::new();
//! container
//!     .add("greeting", "hello")
//!     .add_tag("strings")
//!     .set_shared(true);
//!
//! let greeting = container.get("greeting").unwrap();
//! assert_eq!(greeting.as_str(), Some("hello"));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, trace};

use crate::argument::{Argument, resolve_arguments, reflect_arguments};
use crate::container::Container;
use crate::error::Result;
use crate::reflection::Reflector;
use crate::value::{Callable, Value};

/// The thing a definition turns into a value.
///
/// Decided once, when the definition is registered; see
/// [`Concrete::classify`].
#[derive(Debug, Clone)]
pub enum Concrete {
    /// Returned as is; objects still receive queued method calls.
    Literal(Value),
    /// Returned untouched, bypassing every further step.
    Raw(Value),
    /// A class-name reference: the name is constructed if it names a
    /// known class at resolution time, returned as a string otherwise.
    ClassRef(String),
    /// Invoked with bound or reflected arguments.
    Callable(Callable),
    /// A class constructed with the bound arguments.
    TypeName(String),
}

impl Concrete {
    /// Classifies a bare value: callables become [`Concrete::Callable`],
    /// strings naming a known class become [`Concrete::TypeName`],
    /// everything else is a [`Concrete::Literal`].
    pub fn classify(value: Value, reflector: &dyn Reflector) -> Self {
        match value {
            Value::Callable(callable) => Concrete::Callable(callable),
            Value::Str(name) if reflector.class_exists(&name) => Concrete::TypeName(name),
            other => Concrete::Literal(other),
        }
    }
}

/// A method call queued on a definition or inflector.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone)]
struct DefinitionState {
    alias: String,
    concrete: Concrete,
    shared: bool,
    tags: BTreeSet<String>,
    arguments: Vec<Argument>,
    method_calls: Vec<MethodCall>,
    resolved: Option<Value>,
}

struct DefinitionInner {
    state: RwLock<DefinitionState>,
    /// Serializes shared resolution across threads; same-thread
    /// re-entry is allowed.
    resolving: ReentrantMutex<()>,
}

/// A buildable recipe, shared between the aggregate and its builder.
///
/// Builder methods consume and return the handle, so chains can be kept:
///
/// ```rust
/// use wirebox_container::argument::Argument;
/// use wirebox_container::definition::{Concrete, Definition};
/// use wirebox_container::value::Value;
///
/// let definition = Definition::new("mailer", Concrete::Literal(Value::from("smtp")))
///     .add_argument(Argument::raw("localhost"))
///     .add_tag("transport")
///     .set_shared(true);
///
/// assert!(definition.is_shared());
/// assert!(definition.has_tag("transport"));
/// ```
#[derive(Clone)]
pub struct Definition {
    inner: Arc<DefinitionInner>,
}

impl Definition {
    pub fn new(alias: impl Into<String>, concrete: Concrete) -> Self {
        Self {
            inner: Arc::new(DefinitionInner {
                state: RwLock::new(DefinitionState {
                    alias: alias.into(),
                    concrete,
                    shared: false,
                    tags: BTreeSet::new(),
                    arguments: Vec::new(),
                    method_calls: Vec::new(),
                    resolved: None,
                }),
                resolving: ReentrantMutex::new(()),
            }),
        }
    }

    // ── Builder ──

    pub fn set_alias(self, alias: impl Into<String>) -> Self {
        self.inner.state.write().alias = alias.into();
        self
    }

    pub fn set_shared(self, shared: bool) -> Self {
        self.inner.state.write().shared = shared;
        self
    }

    /// Replaces the concrete and forgets any memoized value.
    pub fn set_concrete(self, concrete: Concrete) -> Self {
        {
            let mut state = self.inner.state.write();
            state.concrete = concrete;
            state.resolved = None;
        }
        self
    }

    pub fn add_tag(self, tag: impl Into<String>) -> Self {
        self.inner.state.write().tags.insert(tag.into());
        self
    }

    pub fn add_argument(self, argument: impl Into<Argument>) -> Self {
        self.inner.state.write().arguments.push(argument.into());
        self
    }

    pub fn add_arguments(self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.inner.state.write().arguments.extend(arguments);
        self
    }

    /// Queues `method` to be invoked on the built object.
    pub fn add_method_call(self, method: impl Into<String>, arguments: Vec<Argument>) -> Self {
        self.inner.state.write().method_calls.push(MethodCall {
            method: method.into(),
            arguments,
        });
        self
    }

    pub fn add_method_calls(self, calls: impl IntoIterator<Item = MethodCall>) -> Self {
        self.inner.state.write().method_calls.extend(calls);
        self
    }

    // ── Accessors ──

    pub fn alias(&self) -> String {
        self.inner.state.read().alias.clone()
    }

    pub(crate) fn has_alias(&self, alias: &str) -> bool {
        self.inner.state.read().alias == alias
    }

    pub fn concrete(&self) -> Concrete {
        self.inner.state.read().concrete.clone()
    }

    pub fn is_shared(&self) -> bool {
        self.inner.state.read().shared
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.inner.state.read().tags.contains(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.inner.state.read().tags.iter().cloned().collect()
    }

    pub fn arguments(&self) -> Vec<Argument> {
        self.inner.state.read().arguments.clone()
    }

    pub fn method_calls(&self) -> Vec<MethodCall> {
        self.inner.state.read().method_calls.clone()
    }

    /// True when both handles point at the same definition.
    pub fn ptr_eq(&self, other: &Definition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Resolution ──

    /// Resolves the definition, reusing the memoized value when shared.
    pub fn resolve(&self, container: &Container) -> Result<Value> {
        self.resolve_with(container, false)
    }

    /// Builds a fresh value, neither reading nor writing the shared cache.
    pub fn resolve_new(&self, container: &Container) -> Result<Value> {
        self.resolve_with(container, true)
    }

    pub(crate) fn resolve_with(&self, container: &Container, force_new: bool) -> Result<Value> {
        let shared = self.is_shared();
        let _guard = (shared && !force_new).then(|| self.inner.resolving.lock());

        let recipe = {
            let state = self.inner.state.read();
            if shared && !force_new {
                if let Some(resolved) = &state.resolved {
                    trace!(alias = %state.alias, "Returning shared instance");
                    return Ok(resolved.clone());
                }
            }
            state.clone()
        };

        trace!(alias = %recipe.alias, shared, force_new, "Resolving definition");
        let value = build(&recipe, container)?;

        if shared && !force_new {
            debug!(alias = %recipe.alias, "Memoized shared definition");
            self.inner.state.write().resolved = Some(value.clone());
        }
        Ok(value)
    }
}

/// Builds a value from a snapshot of the definition.
///
/// Runs without holding the state lock so arguments may re-enter the
/// container, including this definition's builder methods.
fn build(recipe: &DefinitionState, container: &Container) -> Result<Value> {
    let value = match &recipe.concrete {
        Concrete::Raw(value) => return Ok(value.clone()),
        Concrete::Literal(value) => value.clone(),
        Concrete::ClassRef(name) | Concrete::TypeName(name) => {
            construct_named(name, &recipe.arguments, container)?
        }
        Concrete::Callable(callable) => match invoke(callable, &recipe.arguments, container)? {
            Argument::Raw(value) | Argument::Typed { value, .. } => return Ok(value),
            Argument::ClassRef(name) | Argument::ClassRefWithDefault { name, .. } => {
                construct_named(&name, &recipe.arguments, container)?
            }
            Argument::Plain(Value::Str(name)) if container.reflector().class_exists(&name) => {
                construct_named(&name, &recipe.arguments, container)?
            }
            Argument::Plain(value) => value,
        },
    };

    if let Value::Object(instance) = &value {
        for call in &recipe.method_calls {
            let args = resolve_arguments(&call.arguments, container)?;
            trace!(alias = %recipe.alias, method = %call.method, "Invoking queued method");
            container
                .reflector()
                .invoke_method(instance, &call.method, args)?;
        }
    }
    Ok(value)
}

fn invoke(callable: &Callable, arguments: &[Argument], container: &Container) -> Result<Argument> {
    let args = if arguments.is_empty() {
        reflect_arguments(callable.signature(), &Default::default(), container)?
    } else {
        resolve_arguments(arguments, container)?
    };
    callable.call(args)
}

fn construct_named(name: &str, arguments: &[Argument], container: &Container) -> Result<Value> {
    let reflector = container.reflector();
    if !reflector.class_exists(name) {
        return Ok(Value::Str(name.to_string()));
    }
    let args = resolve_arguments(arguments, container)?;
    Ok(Value::Object(reflector.construct(name, args)?))
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Definition")
            .field("alias", &state.alias)
            .field("concrete", &state.concrete)
            .field("shared", &state.shared)
            .field("tags", &state.tags)
            .field("arguments", &state.arguments.len())
            .field("method_calls", &state.method_calls.len())
            .field("resolved", &state.resolved.is_some())
            .finish()
    }
}
