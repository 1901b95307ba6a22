//! Service providers: deferred registration units.
//!
//! A provider declares which service names it can populate and populates
//! them only when one of those names is first requested. Registration
//! happens at most once per provider signature, however many of its
//! services are requested and however often.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn services(&self) -> Vec<String> {
//!         vec!["mailer".into(), "mailer.transport".into()]
//!     }
//!
//!     fn register(&self, container: &Container) -> Result<()> {
//!         container.add("mailer.transport", "smtp");
//!         container.share("mailer", "mailer.transport");
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::new();
//! container.add_service_provider(Arc::new(MailProvider)).unwrap();
//! assert!(container.has("mailer"));
//! assert_eq!(container.get("mailer").unwrap().as_str(), Some("mailer.transport"));
//! ```

use std::any::type_name;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, info, trace};
use wirebox_support::rendering::{render_list, shorten_type_name};

use crate::container::Container;
use crate::error::{ContainerError, Result};

/// A unit that registers related services on demand.
///
/// Similar in spirit to a Laravel or League `ServiceProvider`: the
/// container indexes [`services`](ServiceProvider::services) up front and
/// calls [`register`](ServiceProvider::register) only when one of them is
/// first needed.
pub trait ServiceProvider: Send + Sync {
    /// Service names this provider claims to populate.
    fn services(&self) -> Vec<String>;

    /// True if this provider can populate `id`.
    ///
    /// Consulted for names missing from the declared
    /// [`services`](ServiceProvider::services), so overriding it lets a
    /// provider claim names it cannot list up front.
    fn provides(&self, id: &str) -> bool {
        self.services().iter().any(|service| service == id)
    }

    /// Populates the container. Called at most once per signature.
    fn register(&self, container: &Container) -> Result<()>;

    /// One-time hook run when the provider is added.
    fn boot(&self, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Deduplication key. Override to let several instances of the same
    /// provider type register independently.
    fn signature(&self) -> String {
        type_name::<Self>().to_string()
    }
}

/// Either a provider instance or an identifier resolving to one.
///
/// An identifier must resolve to an object holding an
/// `Arc<dyn ServiceProvider>`.
#[derive(Clone)]
pub enum ProviderSource {
    Instance(Arc<dyn ServiceProvider>),
    Id(String),
}

impl<P: ServiceProvider + 'static> From<Arc<P>> for ProviderSource {
    fn from(provider: Arc<P>) -> Self {
        ProviderSource::Instance(provider)
    }
}

impl From<Arc<dyn ServiceProvider>> for ProviderSource {
    fn from(provider: Arc<dyn ServiceProvider>) -> Self {
        ProviderSource::Instance(provider)
    }
}

impl From<&str> for ProviderSource {
    fn from(id: &str) -> Self {
        ProviderSource::Id(id.to_string())
    }
}

impl From<String> for ProviderSource {
    fn from(id: String) -> Self {
        ProviderSource::Id(id)
    }
}

impl fmt::Debug for ProviderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSource::Instance(provider) => {
                write!(f, "Instance({})", shorten_type_name(&provider.signature()))
            }
            ProviderSource::Id(id) => write!(f, "Id({id})"),
        }
    }
}

/// Per-signature registration guard. The flag is set while the owning
/// thread runs the hook.
type RegistrationGuard = Arc<ReentrantMutex<Cell<bool>>>;

/// Indexes providers and registers them lazily.
#[derive(Default)]
pub struct ServiceProviderAggregate {
    providers: RwLock<Vec<Arc<dyn ServiceProvider>>>,
    index: RwLock<HashMap<String, Vec<Arc<dyn ServiceProvider>>>>,
    registered: DashSet<String>,
    in_flight: DashMap<String, RegistrationGuard>,
}

fn same_provider(a: &Arc<dyn ServiceProvider>, b: &Arc<dyn ServiceProvider>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl ServiceProviderAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boots `provider` and indexes its services.
    ///
    /// Adding a provider instance that is already indexed is a no-op: it
    /// is not booted again.
    pub fn add(&self, provider: Arc<dyn ServiceProvider>, container: &Container) -> Result<()> {
        if self.contains(&provider) {
            trace!(provider = %provider.signature(), "Provider already indexed");
            return Ok(());
        }

        provider.boot(container)?;

        let services = provider.services();
        {
            let mut index = self.index.write();
            for service in &services {
                let owners = index.entry(service.clone()).or_default();
                if !owners.iter().any(|owner| same_provider(owner, &provider)) {
                    owners.push(provider.clone());
                }
            }
        }

        debug!(
            provider = %shorten_type_name(&provider.signature()),
            services = %render_list(&services),
            "Indexed service provider"
        );
        self.providers.write().push(provider);
        Ok(())
    }

    /// True if any provider claims `service`.
    pub fn provides(&self, service: &str) -> bool {
        !self.owners(service).is_empty()
    }

    /// Registers the providers owning `service`, each at most once.
    ///
    /// A signature is recorded only after its hook succeeds, so a failed
    /// hook runs again on the next request. Other threads asking for the
    /// same provider wait for the running hook; the thread running it
    /// skips the provider when it re-enters.
    ///
    /// # Errors
    /// [`ContainerError::Misuse`] when no provider claims `service`;
    /// otherwise whatever the registration hook returns.
    pub fn register(&self, service: &str, container: &Container) -> Result<()> {
        let owners = self.owners(service);
        if owners.is_empty() {
            return Err(ContainerError::misuse(format!(
                "({service}) is not provided by a service provider"
            )));
        }

        for provider in owners {
            let signature = provider.signature();
            if self.registered.contains(&signature) {
                trace!(provider = %signature, "Provider already registered");
                continue;
            }

            // Clone the guard out so the map shard is not held while waiting.
            let guard = self
                .in_flight
                .entry(signature.clone())
                .or_default()
                .value()
                .clone();
            let running = guard.lock();
            if self.registered.contains(&signature) {
                trace!(provider = %signature, "Provider registered by another thread");
                continue;
            }
            if running.get() {
                trace!(provider = %signature, "Provider is registering on this thread");
                continue;
            }

            info!(
                provider = %shorten_type_name(&signature),
                service = %service,
                "Registering service provider"
            );
            running.set(true);
            let outcome = provider.register(container);
            running.set(false);
            outcome?;

            self.registered.insert(signature);
        }
        Ok(())
    }

    /// True once the provider with `signature` has been registered.
    pub fn is_registered(&self, signature: &str) -> bool {
        self.registered.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    fn owners(&self, service: &str) -> Vec<Arc<dyn ServiceProvider>> {
        if let Some(owners) = self.index.read().get(service) {
            return owners.clone();
        }
        self.providers
            .read()
            .iter()
            .filter(|provider| provider.provides(service))
            .cloned()
            .collect()
    }

    fn contains(&self, provider: &Arc<dyn ServiceProvider>) -> bool {
        self.providers
            .read()
            .iter()
            .any(|existing| same_provider(existing, provider))
    }
}

impl fmt::Debug for ServiceProviderAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProviderAggregate")
            .field("providers", &self.providers.read().len())
            .field("services", &self.index.read().len())
            .field("registered", &self.registered.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        registrations: AtomicU32,
        boots: AtomicU32,
        signature: Option<String>,
    }

    impl ServiceProvider for CountingProvider {
        fn services(&self) -> Vec<String> {
            vec!["x".into(), "y".into()]
        }

        fn register(&self, container: &Container) -> Result<()> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            container.add("x", "from provider");
            container.add("y", "also from provider");
            Ok(())
        }

        fn boot(&self, _container: &Container) -> Result<()> {
            self.boots.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn signature(&self) -> String {
            self.signature
                .clone()
                .unwrap_or_else(|| type_name::<Self>().to_string())
        }
    }

    #[test]
    fn provides_indexed_services() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        aggregate
            .add(Arc::new(CountingProvider::default()), &container)
            .unwrap();

        assert!(aggregate.provides("x"));
        assert!(aggregate.provides("y"));
        assert!(!aggregate.provides("z"));
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn registers_at_most_once() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let provider = Arc::new(CountingProvider::default());
        aggregate.add(provider.clone(), &container).unwrap();

        aggregate.register("x", &container).unwrap();
        aggregate.register("y", &container).unwrap();
        aggregate.register("x", &container).unwrap();

        assert_eq!(provider.registrations.load(Ordering::SeqCst), 1);
        assert!(aggregate.is_registered(&provider.signature()));
    }

    #[test]
    fn register_unknown_service_fails() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let err = aggregate.register("nope", &container).unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn same_instance_is_booted_once() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let provider = Arc::new(CountingProvider::default());

        aggregate.add(provider.clone(), &container).unwrap();
        aggregate.add(provider.clone(), &container).unwrap();

        assert_eq!(provider.boots.load(Ordering::SeqCst), 1);
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn same_type_shares_a_signature() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let first = Arc::new(CountingProvider::default());
        let second = Arc::new(CountingProvider::default());

        aggregate.add(first.clone(), &container).unwrap();
        aggregate.add(second.clone(), &container).unwrap();
        aggregate.register("x", &container).unwrap();

        let total = first.registrations.load(Ordering::SeqCst)
            + second.registrations.load(Ordering::SeqCst);
        assert_eq!(total, 1);
    }

    #[test]
    fn distinct_signatures_register_independently() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let first = Arc::new(CountingProvider {
            signature: Some("first".into()),
            ..Default::default()
        });
        let second = Arc::new(CountingProvider {
            signature: Some("second".into()),
            ..Default::default()
        });

        aggregate.add(first.clone(), &container).unwrap();
        aggregate.add(second.clone(), &container).unwrap();
        aggregate.register("x", &container).unwrap();

        assert_eq!(first.registrations.load(Ordering::SeqCst), 1);
        assert_eq!(second.registrations.load(Ordering::SeqCst), 1);
    }

    struct FlakyProvider {
        attempts: AtomicU32,
    }

    impl ServiceProvider for FlakyProvider {
        fn services(&self) -> Vec<String> {
            vec!["svc".into()]
        }

        fn register(&self, container: &Container) -> Result<()> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ContainerError::misuse("transient failure"));
            }
            container.add("svc", "ready");
            Ok(())
        }
    }

    #[test]
    fn failed_registration_is_retried() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        let provider = Arc::new(FlakyProvider {
            attempts: AtomicU32::new(0),
        });
        aggregate.add(provider.clone(), &container).unwrap();

        let err = aggregate.register("svc", &container).unwrap_err();
        assert!(err.to_string().contains("transient failure"));
        assert!(!aggregate.is_registered(&provider.signature()));

        aggregate.register("svc", &container).unwrap();
        aggregate.register("svc", &container).unwrap();
        assert_eq!(provider.attempts.load(Ordering::SeqCst), 2);
        assert!(aggregate.is_registered(&provider.signature()));
    }

    struct PrefixProvider;

    impl ServiceProvider for PrefixProvider {
        fn services(&self) -> Vec<String> {
            vec!["cache".into()]
        }

        fn provides(&self, id: &str) -> bool {
            id == "cache" || id.starts_with("cache.")
        }

        fn register(&self, container: &Container) -> Result<()> {
            container.add("cache", "array");
            container.add("cache.store", "array");
            Ok(())
        }
    }

    #[test]
    fn provides_override_claims_undeclared_names() {
        let container = Container::new();
        let aggregate = ServiceProviderAggregate::new();
        aggregate.add(Arc::new(PrefixProvider), &container).unwrap();

        assert!(aggregate.provides("cache"));
        assert!(aggregate.provides("cache.store"));
        assert!(!aggregate.provides("session"));
        aggregate.register("cache.store", &container).unwrap();
        assert!(aggregate.is_registered(&PrefixProvider.signature()));
    }

    #[test]
    fn default_signature_is_type_name() {
        struct Plain;
        impl ServiceProvider for Plain {
            fn services(&self) -> Vec<String> {
                vec![]
            }
            fn register(&self, _container: &Container) -> Result<()> {
                Ok(())
            }
        }
        assert!(Plain.signature().contains("Plain"));
    }

    #[test]
    fn source_debug() {
        let source = ProviderSource::from(Arc::new(CountingProvider::default()));
        assert_eq!(format!("{source:?}"), "Instance(CountingProvider)");
        assert_eq!(format!("{:?}", ProviderSource::from("providers.mail")), "Id(providers.mail)");
    }
}
