//! Resource cache contract
//!
//! **Implements**: Game Engine Architecture Chapter 7.2 (Resource Manager)
//!
//! The scene core never loads files. It looks resources up by key and asks the
//! returned [`ResourceHandle`] whether the payload is ready. Loader threads
//! hold clones of the same handle and flip it to constructed when done, so the
//! readiness state sits behind a mutex and is only read through the handle's
//! accessors.
//!
//! ```text
//! loader thread ── set_resource() ──▶ ResourceHandle ◀── is_constructed() ── frame thread
//! ```
//!
//! A handle that is not yet constructed is treated as absent for the frame.

use crate::foundation::collections::{ResourceId, SlotMap};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Broad resource category, used for lookups and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A [`Model`](crate::assets::Model)
    Model,
    /// A [`ShaderProgram`](crate::assets::ShaderProgram)
    Shader,
    /// A [`Material`](crate::assets::Material)
    Material,
    /// A texture or cubemap
    Texture,
}

/// Loading state of a handle
#[derive(Clone)]
enum LoadState {
    Loading,
    Constructed(Arc<dyn Any + Send + Sync>),
    Failed(String),
}

impl std::fmt::Debug for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Constructed(_) => write!(f, "Constructed"),
            Self::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

#[derive(Debug)]
struct HandleInner {
    name: String,
    kind: ResourceKind,
    state: Mutex<LoadState>,
}

/// Shared, thread-safe reference to a cached resource
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
}

impl ResourceHandle {
    /// Create a handle that is still loading
    pub fn loading(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                name: name.into(),
                kind,
                state: Mutex::new(LoadState::Loading),
            }),
        }
    }

    /// Create a handle that is already constructed
    pub fn constructed<T: Any + Send + Sync>(name: impl Into<String>, kind: ResourceKind, resource: T) -> Self {
        let handle = Self::loading(name, kind);
        handle.set_resource(resource);
        handle
    }

    fn state(&self) -> MutexGuard<'_, LoadState> {
        // State is swapped whole, so a poisoned lock still holds a valid value
        self.inner.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Resource category
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Whether the payload is ready for use
    pub fn is_constructed(&self) -> bool {
        matches!(*self.state(), LoadState::Constructed(_))
    }

    /// Whether the handle is still waiting on its loader
    pub fn is_loading(&self) -> bool {
        matches!(*self.state(), LoadState::Loading)
    }

    /// Failure reason, if loading failed
    pub fn failure(&self) -> Option<String> {
        match &*self.state() {
            LoadState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Typed access to the payload
    ///
    /// `None` while loading, after a failure, or when `T` is not the stored type.
    pub fn resource_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let payload = match &*self.state() {
            LoadState::Constructed(payload) => Arc::clone(payload),
            _ => return None,
        };
        payload.downcast::<T>().ok()
    }

    /// Publish the payload; called by the loader
    pub fn set_resource<T: Any + Send + Sync>(&self, resource: T) {
        *self.state() = LoadState::Constructed(Arc::new(resource));
        log::debug!("Resource '{}' constructed", self.inner.name);
    }

    /// Mark loading as failed
    pub fn set_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Resource '{}' failed to load: {}", self.inner.name, reason);
        *self.state() = LoadState::Failed(reason);
    }

    /// Drop the payload and return to the loading state, e.g. for a reload
    pub fn invalidate(&self) {
        *self.state() = LoadState::Loading;
        log::debug!("Resource '{}' invalidated", self.inner.name);
    }

    /// Whether two handles refer to the same cache entry
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Keyed store of resource handles
#[derive(Debug, Default)]
pub struct ResourceCache {
    handles: SlotMap<ResourceId, ResourceHandle>,
    by_name: HashMap<String, ResourceId>,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle; a later handle with the same name shadows the earlier one for name lookups
    pub fn insert(&mut self, handle: ResourceHandle) -> ResourceId {
        let name = handle.name().to_string();
        let id = self.handles.insert(handle);
        if self.by_name.insert(name.clone(), id).is_some() {
            log::warn!("Resource name '{}' registered twice, name lookups now return the newer entry", name);
        }
        id
    }

    /// Register an already constructed resource
    pub fn insert_constructed<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        kind: ResourceKind,
        resource: T,
    ) -> ResourceId {
        self.insert(ResourceHandle::constructed(name, kind, resource))
    }

    /// Handle by key
    pub fn handle(&self, id: ResourceId) -> Option<ResourceHandle> {
        self.handles.get(id).cloned()
    }

    /// Key by name
    pub fn id_of(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).copied().filter(|id| self.handles.contains_key(*id))
    }

    /// Handle by name
    pub fn handle_by_name(&self, name: &str) -> Option<ResourceHandle> {
        self.id_of(name).and_then(|id| self.handle(id))
    }

    /// Constructed payload by key
    pub fn get<T: Any + Send + Sync>(&self, id: ResourceId) -> Option<Arc<T>> {
        self.handles.get(id)?.resource_as::<T>()
    }

    /// Remove an entry
    pub fn remove(&mut self, id: ResourceId) -> Option<ResourceHandle> {
        let handle = self.handles.remove(id)?;
        if self.by_name.get(handle.name()) == Some(&id) {
            self.by_name.remove(handle.name());
        }
        Some(handle)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
