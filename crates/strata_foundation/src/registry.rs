//! Name interning for component and relation ids.
//!
//! Components and relations are registered by name and assigned small dense
//! ids. Registration is idempotent: re-registering a name returns the id it
//! was first given, provided the kind matches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ident::ComponentId;

/// Whether an id names a plain component or a relation usable in pairs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum IdKind {
    Component,
    Relation,
}

/// Allocates and resolves component and relation ids.
///
/// Not thread-safe; worlds own their registry and serialize access.
#[derive(Clone, Debug, Default)]
pub struct ComponentRegistry {
    /// Name for each id, indexed by `ComponentId`.
    names: Vec<Arc<str>>,
    /// Kind for each id, indexed by `ComponentId`.
    kinds: Vec<IdKind>,
    /// Map from name to id.
    by_name: HashMap<Arc<str>, ComponentId>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component name, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered as a relation.
    pub fn register_component(&mut self, name: &str) -> Result<ComponentId> {
        self.register(name, IdKind::Component)
    }

    /// Registers a relation name, returning its id.
    ///
    /// Relations may appear as the first slot of a pair ident.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered as a plain
    /// component.
    pub fn register_relation(&mut self, name: &str) -> Result<ComponentId> {
        self.register(name, IdKind::Relation)
    }

    fn register(&mut self, name: &str, kind: IdKind) -> Result<ComponentId> {
        if let Some(&id) = self.by_name.get(name) {
            if self.kinds[id.index() as usize] != kind {
                return Err(Error::internal(format!(
                    "id {name:?} already registered with a different kind"
                )));
            }
            return Ok(id);
        }

        let index = u32::try_from(self.names.len()).expect("too many registered ids");
        let id = ComponentId::new(index);
        let arc: Arc<str> = name.into();
        self.names.push(arc.clone());
        self.kinds.push(kind);
        self.by_name.insert(arc, id);
        Ok(id)
    }

    /// Resolves a name to its id, if registered.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Resolves an id to its name, if registered.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&str> {
        self.names.get(id.index() as usize).map(AsRef::as_ref)
    }

    /// Returns true if the id is registered.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        (id.index() as usize) < self.names.len()
    }

    /// Returns true if the id is registered as a relation.
    #[must_use]
    pub fn is_relation(&self, id: ComponentId) -> bool {
        self.kinds.get(id.index() as usize) == Some(&IdKind::Relation)
    }

    /// Returns the number of registered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates registered ids in allocation order as `(id, name, relation)`.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &str, bool)> {
        self.names.iter().enumerate().map(|(i, name)| {
            #[allow(clippy::cast_possible_truncation)]
            let id = ComponentId::new(i as u32);
            (id, name.as_ref(), self.kinds[i] == IdKind::Relation)
        })
    }
}
