//! In-memory entity store keyed by kind, kept in insertion order.

use crate::access::Access;
use crate::error::ServiceError;
use crate::model::{Planner, Resource, Source};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct ObjectStore {
    items: RwLock<HashMap<String, Vec<Resource>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the entities every install starts with: planner `atomic`, source `basic`.
    pub fn seeded() -> Result<Self, ServiceError> {
        let store = Self::new();
        store.upsert(Resource::Planner(Planner {
            id: "atomic".into(),
            name: "atomic".into(),
            module: "planners.atomic".into(),
            description: "Runs each ability in the adversary's atomic ordering, one at a time.".into(),
            params: Default::default(),
            stopping_conditions: Vec::new(),
            allow_repeatable_abilities: false,
            access: Access::App,
        }))?;
        store.upsert(Resource::Source(Source {
            id: "basic".into(),
            name: "basic".into(),
            facts: Vec::new(),
            access: Access::App,
        }))?;
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<Resource>>>, ServiceError> {
        self.items.read().map_err(|e| ServiceError::Internal(format!("store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<Resource>>>, ServiceError> {
        self.items.write().map_err(|e| ServiceError::Internal(format!("store lock poisoned: {}", e)))
    }

    pub fn get(&self, kind: &str, id: &str) -> Result<Option<Resource>, ServiceError> {
        Ok(self
            .read()?
            .get(kind)
            .and_then(|items| items.iter().find(|r| r.id() == id))
            .cloned())
    }

    /// Every entity of `kind`; unknown kinds are empty.
    pub fn all(&self, kind: &str) -> Result<Vec<Resource>, ServiceError> {
        Ok(self.read()?.get(kind).cloned().unwrap_or_default())
    }

    /// Replace the entity with the same id in place, or append it.
    pub fn upsert(&self, resource: Resource) -> Result<Resource, ServiceError> {
        if resource.id().is_empty() {
            return Err(ServiceError::Internal(format!("{} stored without an id", resource.index())));
        }
        let mut items = self.write()?;
        let list = items.entry(resource.index().to_string()).or_default();
        match list.iter_mut().find(|r| r.id() == resource.id()) {
            Some(slot) => *slot = resource.clone(),
            None => list.push(resource.clone()),
        }
        Ok(resource)
    }

    /// Apply `f` to the stored entity under the write lock; NotFound when absent.
    pub fn update<F>(&self, kind: &str, id: &str, f: F) -> Result<Resource, ServiceError>
    where
        F: FnOnce(&mut Resource) -> Result<(), ServiceError>,
    {
        let mut items = self.write()?;
        let slot = items
            .get_mut(kind)
            .and_then(|list| list.iter_mut().find(|r| r.id() == id))
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}'", kind, id)))?;
        let mut next = slot.clone();
        f(&mut next)?;
        *slot = next.clone();
        Ok(next)
    }

    /// Remove the entity only when `accept` agrees; the check and removal share one write lock.
    pub fn remove_if<P>(&self, kind: &str, id: &str, accept: P) -> Result<Option<Resource>, ServiceError>
    where
        P: FnOnce(&Resource) -> bool,
    {
        let mut items = self.write()?;
        let Some(list) = items.get_mut(kind) else {
            return Ok(None);
        };
        match list.iter().position(|r| r.id() == id) {
            Some(i) if accept(&list[i]) => Ok(Some(list.remove(i))),
            _ => Ok(None),
        }
    }
}
