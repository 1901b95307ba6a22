//! # The Container: composition root of Wirebox
//!
//! Owns the definition registry, the service providers, the inflectors and
//! the delegate chain, and decides in which order they are consulted.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container ──get(id)──┐
//!                                                      │
//!      1. definition alias ─────────────────────────┐  │
//!      2. definition tag (every match, in order) ───┤  │
//!      3. service provider: register, then retry ───┤  ├──> inflectors ──> value
//!      4. delegates, in registration order ─────────┘  │
//!      5. NotFound                                     │
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! let catalog = TypeCatalog::new();
//! catalog.register(ClassDescriptor::new("Database").constructor(
//!     Signature::new("Database::new").param(Parameter::new("dsn").builtin("string")),
//!     |args| Ok(Database { dsn: args[0].as_str().unwrap_or_default().to_string() }),
//! ));
//!
//! let container = Container::builder()
//!     .reflector(Arc::new(catalog))
//!     .build()
//!     .expect("Failed to build container");
//!
//! container.add("dsn", "sqlite::memory:");
//! container
//!     .share("db", "Database")
//!     .add_argument(Argument::class_ref("dsn"));
//!
//! let a = container.get("db").unwrap();
//! let b = container.get("db").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.downcast_ref::<Database>().unwrap().dsn, "sqlite::memory:");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace};
use wirebox_support::rendering::suggest_similar;

use crate::argument::reflect_arguments;
use crate::config::ContainerConfig;
use crate::definition::{Concrete, Definition};
use crate::error::{ContainerError, Lookup, NotFoundError, Result};
use crate::inflector::{Inflector, InflectorAggregate};
use crate::provider::{ProviderSource, ServiceProvider, ServiceProviderAggregate};
use crate::reflection::{Reflector, TypeCatalog};
use crate::reflection_container::ReflectionContainer;
use crate::registry::{DefinitionAggregate, Resolver};
use crate::value::{Callable, Value};

const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
///
/// Everything the builder does can also be done on a live container; the
/// builder exists so configuration, delegates and providers are wired in a
/// fixed order: delegates first, the auto-wiring delegate last, providers
/// after all delegates.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .config(config)
///     .reflector(Arc::new(catalog))
///     .delegate(Arc::new(legacy))
///     .service_provider(Arc::new(MailProvider))
///     .build()?;
/// ```
pub struct ContainerBuilder {
    config: ContainerConfig,
    reflector: Option<Arc<dyn Reflector>>,
    delegates: Vec<Arc<dyn Resolver>>,
    providers: Vec<ProviderSource>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            reflector: None,
            delegates: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register definitions added through `add` as shared.
    pub fn default_shared(mut self, shared: bool) -> Self {
        self.config.default_shared = shared;
        self
    }

    /// Append a [`ReflectionContainer`] after every other delegate.
    pub fn autowire(mut self, autowire: bool) -> Self {
        self.config.autowire = autowire;
        self
    }

    /// The reflection capability; an empty [`TypeCatalog`] by default.
    pub fn reflector(mut self, reflector: Arc<dyn Reflector>) -> Self {
        self.reflector = Some(reflector);
        self
    }

    pub fn delegate(mut self, delegate: Arc<dyn Resolver>) -> Self {
        self.delegates.push(delegate);
        self
    }

    pub fn service_provider(mut self, provider: impl Into<ProviderSource>) -> Self {
        self.providers.push(provider.into());
        self
    }

    /// Builds the container.
    ///
    /// # Errors
    /// Whatever adding a service provider fails with: a boot hook error, or
    /// an identifier that does not resolve to a provider.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(
            delegates = self.delegates.len(),
            providers = self.providers.len(),
            autowire = self.config.autowire,
            "Building container"
        );

        let reflector: Arc<dyn Reflector> = match self.reflector {
            Some(reflector) => reflector,
            None => Arc::new(TypeCatalog::new()),
        };
        let container = Container::from_parts(self.config, reflector);

        for delegate in self.delegates {
            container.delegate(delegate);
        }

        let config = container.config();
        if config.autowire {
            let autowiring = ReflectionContainer::new(container.reflector().clone())
                .cache_resolutions(config.cache_reflections);
            container.delegate(Arc::new(autowiring));
        }

        for provider in self.providers {
            container.add_service_provider(provider)?;
        }

        info!("Container built successfully");
        Ok(container)
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

struct ContainerInner {
    config: ContainerConfig,
    reflector: Arc<dyn Reflector>,
    definitions: DefinitionAggregate,
    providers: ServiceProviderAggregate,
    inflectors: InflectorAggregate,
    delegates: RwLock<Vec<Arc<dyn Resolver>>>,
}

/// Thread-safe dependency injection container.
///
/// A cheap handle: clones share the same registries, so providers and
/// delegates can hold on to the container they were given.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a [`Container`].
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    /// The container, unless every strong handle has been dropped.
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// An empty container with the default configuration and an empty
    /// type catalogue.
    pub fn new() -> Self {
        Self::from_parts(ContainerConfig::default(), Arc::new(TypeCatalog::new()))
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_parts(config: ContainerConfig, reflector: Arc<dyn Reflector>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                config,
                reflector,
                definitions: DefinitionAggregate::new(),
                providers: ServiceProviderAggregate::new(),
                inflectors: InflectorAggregate::new(),
                delegates: RwLock::new(Vec::new()),
            }),
        }
    }

    // ── Registration ──

    /// Registers `concrete` under `id`.
    ///
    /// Callables and strings naming a known class are recognised here,
    /// once; see [`Concrete::classify`]. Shared when the container is
    /// configured with `default_shared`.
    pub fn add(&self, id: &str, concrete: impl Into<Value>) -> Definition {
        let concrete = Concrete::classify(concrete.into(), self.inner.reflector.as_ref());
        self.inner
            .definitions
            .add(id, concrete, self.inner.config.default_shared)
    }

    /// Registers `concrete` under `id` as shared.
    pub fn add_shared(&self, id: &str, concrete: impl Into<Value>) -> Definition {
        let concrete = Concrete::classify(concrete.into(), self.inner.reflector.as_ref());
        self.inner.definitions.add(id, concrete, true)
    }

    /// Alias for [`add_shared`](Container::add_shared).
    pub fn share(&self, id: &str, concrete: impl Into<Value>) -> Definition {
        self.add_shared(id, concrete)
    }

    /// Registers `id` with itself as the concrete, typically a class name.
    pub fn add_class(&self, id: &str) -> Definition {
        self.add(id, id)
    }

    /// Registers an explicit concrete, skipping classification.
    pub fn add_concrete(&self, id: &str, concrete: Concrete) -> Definition {
        self.inner
            .definitions
            .add(id, concrete, self.inner.config.default_shared)
    }

    /// Registers a prepared definition under `id`, keeping its shared flag.
    pub fn add_definition(&self, id: &str, definition: Definition) -> Definition {
        let shared = definition.is_shared();
        self.inner.definitions.add_definition(id, definition, shared)
    }

    /// The definition registered under `id`, for further configuration.
    ///
    /// Lets the owning provider register first.
    ///
    /// # Errors
    /// [`ContainerError::NotFound`] when no definition carries `id` as its
    /// alias, including ids only known as tags.
    pub fn extend(&self, id: &str) -> Result<Definition> {
        if self.inner.providers.provides(id) {
            self.inner.providers.register(id, self)?;
        }
        self.inner.definitions.get_definition(id)
    }

    /// Registers an inflector for objects that are a `type_name`.
    pub fn inflector(&self, type_name: &str) -> Inflector {
        self.inner.inflectors.add(type_name, None)
    }

    /// Registers an inflector running `callback` on every matching object.
    pub fn inflector_with<F>(&self, type_name: &str, callback: F) -> Inflector
    where
        F: Fn(&crate::value::Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.inflectors.add(type_name, Some(Arc::new(callback)))
    }

    /// Indexes a service provider, booting it once.
    ///
    /// # Errors
    /// [`ContainerError::Misuse`] when an identifier does not resolve to an
    /// `Arc<dyn ServiceProvider>`; otherwise whatever resolving the
    /// identifier or booting the provider fails with.
    pub fn add_service_provider(&self, provider: impl Into<ProviderSource>) -> Result<&Self> {
        let provider = match provider.into() {
            ProviderSource::Instance(provider) => provider,
            ProviderSource::Id(id) => self.provider_from_id(&id)?,
        };
        self.inner.providers.add(provider, self)?;
        Ok(self)
    }

    /// Appends a fallback lookup source, consulted after definitions and
    /// providers.
    pub fn delegate(&self, delegate: Arc<dyn Resolver>) -> &Self {
        delegate.attach(self);
        let mut delegates = self.inner.delegates.write();
        delegates.push(delegate);
        debug!(position = delegates.len(), "Registered delegate");
        self
    }

    // ── Resolution ──

    /// Resolves `id`.
    ///
    /// # Errors
    /// [`ContainerError::NotFound`] when nothing can produce `id`,
    /// [`ContainerError::Misuse`] when a provider claims `id` but does not
    /// register it; resolution errors propagate unmodified.
    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, id: &str) -> Result<Value> {
        self.resolve(id, false)
    }

    /// Resolves `id`, bypassing shared caches without overwriting them.
    #[instrument(level = "trace", skip(self))]
    pub fn get_new(&self, id: &str) -> Result<Value> {
        self.resolve(id, true)
    }

    /// True if a definition, tag, provider or delegate knows `id`.
    ///
    /// Never triggers provider registration.
    pub fn has(&self, id: &str) -> bool {
        let inner = &self.inner;
        inner.definitions.has(id)
            || inner.definitions.has_tag(id)
            || inner.providers.provides(id)
            || self.delegates().iter().any(|delegate| delegate.has(id))
    }

    /// Invokes `callable`, reflecting its arguments against this container.
    ///
    /// Values in `supplied` are used for parameters of the same name.
    pub fn call(&self, callable: &Callable, supplied: &HashMap<String, Value>) -> Result<Value> {
        trace!(function = %callable.name(), "Calling with reflected arguments");
        let args = reflect_arguments(callable.signature(), supplied, self)?;
        Ok(callable.call(args)?.into_value())
    }

    fn resolve(&self, id: &str, force_new: bool) -> Result<Value> {
        let inner = &self.inner;

        if inner.definitions.has(id) {
            let value = inner.definitions.resolve(id, self, force_new)?;
            return inner.inflectors.inflect(value, self);
        }

        if inner.definitions.has_tag(id) {
            trace!(tag = %id, "Resolving tag");
            let values = inner
                .definitions
                .resolve_tagged(id, self, force_new)?
                .into_iter()
                .map(|value| inner.inflectors.inflect(value, self))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::Array(values));
        }

        if inner.providers.provides(id) {
            inner.providers.register(id, self)?;
            if !inner.definitions.has(id) && !inner.definitions.has_tag(id) {
                return Err(ContainerError::misuse(format!(
                    "Service provider lied about providing ({id}) service"
                )));
            }
            return self.resolve(id, force_new);
        }

        for delegate in self.delegates() {
            if delegate.has(id) {
                trace!(id = %id, "Resolving through delegate");
                let value = if force_new {
                    delegate.get_new(id)?
                } else {
                    delegate.get(id)?
                };
                return inner.inflectors.inflect(value, self);
            }
        }

        Err(self.not_found(id))
    }

    fn not_found(&self, id: &str) -> ContainerError {
        let aliases: BTreeSet<String> = self.inner.definitions.aliases().into_iter().collect();
        let suggestions = suggest_similar(id, aliases.iter().map(String::as_str), MAX_SUGGESTIONS);
        ContainerError::NotFound(
            NotFoundError::new(id, Lookup::Service).with_suggestions(suggestions),
        )
    }

    fn provider_from_id(&self, id: &str) -> Result<Arc<dyn ServiceProvider>> {
        let value = self.get(id)?;
        value
            .as_instance()
            .and_then(|instance| instance.downcast_ref::<Arc<dyn ServiceProvider>>())
            .cloned()
            .ok_or_else(|| {
                ContainerError::misuse(format!(
                    "({id}) resolved to a {} rather than a service provider",
                    value.kind_name()
                ))
            })
    }

    /// Snapshot, so no lock is held while a delegate re-enters.
    fn delegates(&self) -> Vec<Arc<dyn Resolver>> {
        self.inner.delegates.read().clone()
    }

    // ── Accessors ──

    pub fn reflector(&self) -> &Arc<dyn Reflector> {
        &self.inner.reflector
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// True when both handles point at the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Resolver for Container {
    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }

    fn get(&self, id: &str) -> Result<Value> {
        Container::get(self, id)
    }

    fn get_new(&self, id: &str) -> Result<Value> {
        Container::get_new(self, id)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.inner.definitions.len())
            .field("providers", &self.inner.providers.len())
            .field("inflectors", &self.inner.inflectors.len())
            .field("delegates", &self.inner.delegates.read().len())
            .finish()
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContainer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, WeakContainer};
    pub use crate::argument::Argument;
    pub use crate::config::ContainerConfig;
    pub use crate::definition::{Concrete, Definition};
    pub use crate::error::{ContainerError, Result};
    pub use crate::inflector::Inflector;
    pub use crate::provider::{ProviderSource, ServiceProvider};
    pub use crate::reflection::{
        ClassDescriptor, Parameter, Reflector, Signature, TypeCatalog, TypeHint,
    };
    pub use crate::reflection_container::ReflectionContainer;
    pub use crate::registry::Resolver;
    pub use crate::value::{Callable, Instance, LiteralKind, Value};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Argument;
    use crate::reflection::{ClassDescriptor, Parameter, Signature};
    use crate::value::Instance;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Session {
        user: Mutex<Option<String>>,
    }

    fn catalog() -> Arc<TypeCatalog> {
        let catalog = Arc::new(TypeCatalog::new());
        catalog
            .register(ClassDescriptor::new("Authenticatable"))
            .register(
                ClassDescriptor::new("Session")
                    .implements("Authenticatable")
                    .constructor(Signature::new("Session::new"), |_| {
                        Ok(Session {
                            user: Mutex::new(None),
                        })
                    })
                    .method::<Session, _>(
                        "login",
                        Signature::new("Session::login").param(Parameter::new("user")),
                        |session, args| {
                            *session.user.lock() = args[0].as_str().map(str::to_string);
                            Ok(Value::Null)
                        },
                    ),
            );
        catalog
    }

    fn container() -> Container {
        Container::builder().reflector(catalog()).build().unwrap()
    }

    /// Fixed map of values standing in for a foreign container.
    struct StaticResolver(HashMap<String, Value>);

    impl StaticResolver {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(id, value)| (id.to_string(), Value::from(*value)))
                    .collect(),
            )
        }
    }

    impl Resolver for StaticResolver {
        fn has(&self, id: &str) -> bool {
            self.0.contains_key(id)
        }

        fn get(&self, id: &str) -> Result<Value> {
            self.0
                .get(id)
                .cloned()
                .ok_or_else(|| ContainerError::not_found(id, Lookup::Service))
        }
    }

    #[derive(Default)]
    struct SessionProvider {
        registrations: AtomicU32,
    }

    impl ServiceProvider for SessionProvider {
        fn services(&self) -> Vec<String> {
            vec!["session".into(), "session.driver".into()]
        }

        fn register(&self, container: &Container) -> Result<()> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            container.share("session", "Session");
            container.add("session.driver", "file");
            Ok(())
        }
    }

    struct LyingProvider;

    impl ServiceProvider for LyingProvider {
        fn services(&self) -> Vec<String> {
            vec!["phantom".into()]
        }

        fn register(&self, container: &Container) -> Result<()> {
            container.add("something.else", 1);
            Ok(())
        }
    }

    #[test]
    fn shared_identity_and_forced_new() {
        let container = container();
        container.share("session", "Session");

        let a = container.get("session").unwrap();
        let b = container.get("session").unwrap();
        assert!(a.as_instance().unwrap().ptr_eq(b.as_instance().unwrap()));

        let fresh = container.get_new("session").unwrap();
        assert_ne!(a, fresh);
        assert_eq!(container.get("session").unwrap(), a);
    }

    #[test]
    fn default_shared_config() {
        let container = Container::builder()
            .reflector(catalog())
            .default_shared(true)
            .build()
            .unwrap();
        container.add("session", "Session");
        assert_eq!(container.get("session").unwrap(), container.get("session").unwrap());
    }

    #[test]
    fn add_class_uses_alias_as_concrete() {
        let container = container();
        container.add_class("Session");
        assert!(container.get("Session").unwrap().downcast_ref::<Session>().is_some());
    }

    #[test]
    fn tag_resolves_to_array_in_order() {
        let container = container();
        container.add("a", "first").add_tag("t");
        container.add("b", "second").add_tag("t");

        assert!(container.has("t"));
        assert_eq!(
            container.get("t").unwrap(),
            Value::Array(vec![Value::from("first"), Value::from("second")])
        );
    }

    #[test]
    fn alias_wins_over_tag() {
        let container = container();
        container.add("t", "alias");
        container.add("x", "tagged").add_tag("t");
        assert_eq!(container.get("t").unwrap(), Value::from("alias"));
    }

    #[test]
    fn provider_registers_once_across_services() {
        let container = container();
        let provider = Arc::new(SessionProvider::default());
        container.add_service_provider(provider.clone()).unwrap();

        assert!(container.has("session"));
        assert_eq!(provider.registrations.load(Ordering::SeqCst), 0);

        container.get("session").unwrap();
        container.get("session.driver").unwrap();
        container.get("session").unwrap();
        assert_eq!(provider.registrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn has_does_not_register() {
        let container = container();
        let provider = Arc::new(SessionProvider::default());
        container.add_service_provider(provider.clone()).unwrap();
        assert!(container.has("session.driver"));
        assert_eq!(provider.registrations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn lying_provider_is_misuse() {
        let container = container();
        container.add_service_provider(Arc::new(LyingProvider)).unwrap();

        let err = container.get("phantom").unwrap_err();
        assert!(err.is_misuse());
        assert!(format!("{err}").contains("lied about providing (phantom)"));
        assert!(container.has("something.else"));
    }

    #[test]
    fn provider_from_identifier() {
        let container = container();
        let provider: Arc<dyn ServiceProvider> = Arc::new(SessionProvider::default());
        container.add_concrete(
            "providers.session",
            Concrete::Literal(Value::from(Instance::new("SessionProvider", provider))),
        );

        container.add_service_provider("providers.session").unwrap();
        assert_eq!(container.get("session.driver").unwrap(), Value::from("file"));
    }

    #[test]
    fn identifier_that_is_not_a_provider_is_misuse() {
        let container = container();
        container.add("providers.bogus", 42);
        let err = container.add_service_provider("providers.bogus").unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn extend_registers_provider_first() {
        let container = container();
        container
            .add_service_provider(Arc::new(SessionProvider::default()))
            .unwrap();

        let definition = container.extend("session").unwrap();
        assert!(definition.is_shared());
        definition.add_method_call("login", vec![Argument::raw("ada")]);

        let session = container.get("session").unwrap();
        assert_eq!(
            session.downcast_ref::<Session>().unwrap().user.lock().as_deref(),
            Some("ada")
        );
    }

    #[test]
    fn extend_registers_provider_even_when_alias_exists() {
        let container = container();
        let provider = Arc::new(SessionProvider::default());
        container.add_service_provider(provider.clone()).unwrap();
        container.add("session.driver", "redis");

        let definition = container.extend("session.driver").unwrap();
        assert_eq!(provider.registrations.load(Ordering::SeqCst), 1);
        assert!(matches!(
            definition.concrete(),
            Concrete::Literal(value) if value == Value::from("redis")
        ));
        assert!(container.has("session"));
    }

    #[test]
    fn extend_tag_only_fails() {
        let container = container();
        container.add("a", 1).add_tag("numbers");
        assert!(container.extend("numbers").unwrap_err().is_not_found());
    }

    #[test]
    fn delegates_in_order() {
        let container = container();
        container
            .delegate(Arc::new(StaticResolver::new(&[("shared", "d1")])))
            .delegate(Arc::new(StaticResolver::new(&[("shared", "d2"), ("only", "d2")])));

        assert_eq!(container.get("shared").unwrap(), Value::from("d1"));
        assert_eq!(container.get("only").unwrap(), Value::from("d2"));
        assert!(container.has("only"));
    }

    #[test]
    fn inflectors_apply_to_get() {
        let container = container();
        container.add("session", "Session");
        container
            .inflector("Authenticatable")
            .invoke_method("login", vec![Argument::raw("grace")]);

        let session = container.get("session").unwrap();
        assert_eq!(
            session.downcast_ref::<Session>().unwrap().user.lock().as_deref(),
            Some("grace")
        );
    }

    #[test]
    fn inflector_with_callback() {
        let container = container();
        container.add("session", "Session");
        let seen = Arc::new(AtomicU32::new(0));
        container.inflector_with("Session", {
            let seen = seen.clone();
            move |_: &Instance| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        container.get("session").unwrap();
        container.get("session").unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn autowire_builds_unregistered_classes() {
        let container = Container::builder()
            .reflector(catalog())
            .autowire(true)
            .build()
            .unwrap();

        assert!(container.has("Session"));
        assert!(container.get("Session").unwrap().downcast_ref::<Session>().is_some());
    }

    #[test]
    fn not_found_carries_suggestions() {
        let container = container();
        container.add("database.primary", "sqlite");
        container.add("cache", "memory");

        match container.get("database").unwrap_err() {
            ContainerError::NotFound(err) => {
                assert_eq!(err.id, "database");
                assert_eq!(err.suggestions, vec!["database.primary".to_string()]);
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn call_with_reflected_arguments() {
        let container = container();
        container.add("greeting", "hello");
        let callable = Callable::new(
            Signature::new("greet")
                .param(Parameter::new("greeting").builtin("greeting"))
                .param(Parameter::new("name")),
            |args| {
                Ok(Value::from(format!(
                    "{} {}",
                    args[0].as_str().unwrap_or_default(),
                    args[1].as_str().unwrap_or_default()
                )))
            },
        );

        let supplied = HashMap::from([("name".to_string(), Value::from("world"))]);
        assert_eq!(
            container.call(&callable, &supplied).unwrap(),
            Value::from("hello world")
        );
    }

    #[test]
    fn weak_handle_upgrades_while_alive() {
        let container = container();
        let weak = container.downgrade();
        assert!(weak.upgrade().unwrap().ptr_eq(&container));
        drop(container);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn debug_display() {
        let container = container();
        container.add("a", 1);
        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("definitions: 1"));
    }
}
