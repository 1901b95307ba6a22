//! Definition registry: the ordered set of recipes a container owns.
//!
//! Insertion order is iteration order: it decides which definition wins
//! when an alias is registered twice and the order of tagged results.

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::container::Container;
use crate::definition::{Concrete, Definition};
use crate::error::{ContainerError, Lookup, Result};
use crate::value::Value;

/// A lookup source: anything that can say whether it knows an id and
/// produce a value for it.
///
/// The container implements this, and so does every delegate it falls
/// back to. Argument resolution only ever sees a `&dyn Resolver`.
pub trait Resolver: Send + Sync {
    fn has(&self, id: &str) -> bool;

    fn get(&self, id: &str) -> Result<Value>;

    /// Like [`get`](Resolver::get) but bypassing shared caches, where the
    /// source has any.
    fn get_new(&self, id: &str) -> Result<Value> {
        self.get(id)
    }

    /// Called once when this resolver is delegated to `parent`.
    fn attach(&self, _parent: &Container) {}
}

/// Ordered collection of [`Definition`]s.
///
/// Duplicate aliases are accepted; lookups return the first match.
#[derive(Debug, Default)]
pub struct DefinitionAggregate {
    definitions: RwLock<Vec<Definition>>,
}

impl DefinitionAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `concrete` into a new definition and appends it.
    pub fn add(&self, alias: &str, concrete: Concrete, shared: bool) -> Definition {
        self.add_definition(alias, Definition::new(alias, concrete), shared)
    }

    /// Appends an existing definition under `alias`.
    pub fn add_definition(&self, alias: &str, definition: Definition, shared: bool) -> Definition {
        let definition = definition.set_alias(alias).set_shared(shared);
        debug!(alias = %alias, shared, "Registered definition");
        self.definitions.write().push(definition.clone());
        definition
    }

    pub fn has(&self, alias: &str) -> bool {
        self.definitions.read().iter().any(|d| d.has_alias(alias))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.definitions.read().iter().any(|d| d.has_tag(tag))
    }

    /// First definition registered under `alias`.
    pub fn get_definition(&self, alias: &str) -> Result<Definition> {
        self.find(alias)
            .ok_or_else(|| ContainerError::not_found(alias, Lookup::Definition))
    }

    /// Resolves the first definition registered under `alias`.
    pub fn resolve(&self, alias: &str, container: &Container, force_new: bool) -> Result<Value> {
        let definition = self
            .find(alias)
            .ok_or_else(|| ContainerError::not_found(alias, Lookup::Service))?;
        trace!(alias = %alias, "Found definition");
        definition.resolve_with(container, force_new)
    }

    /// Resolves every definition carrying `tag`, in registration order.
    pub fn resolve_tagged(
        &self,
        tag: &str,
        container: &Container,
        force_new: bool,
    ) -> Result<Vec<Value>> {
        let tagged: Vec<Definition> = self
            .definitions
            .read()
            .iter()
            .filter(|d| d.has_tag(tag))
            .cloned()
            .collect();

        trace!(tag = %tag, count = tagged.len(), "Resolving tagged definitions");
        tagged
            .iter()
            .map(|definition| definition.resolve_with(container, force_new))
            .collect()
    }

    /// Aliases in registration order, duplicates included.
    pub fn aliases(&self) -> Vec<String> {
        self.definitions.read().iter().map(Definition::alias).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Clones the handle out so no lock is held while it resolves.
    fn find(&self, alias: &str) -> Option<Definition> {
        self.definitions
            .read()
            .iter()
            .find(|d| d.has_alias(alias))
            .cloned()
    }
}
