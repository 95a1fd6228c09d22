//! Arena key types
//!
//! Scene data lives in `slotmap` arenas. Keys are generation-checked, so a
//! key that outlives its slot resolves to `None` instead of aliasing a newer
//! entry.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Key of a node in a [`TransformGraph`](crate::scene::TransformGraph)
    pub struct NodeId;

    /// Key of a [`SceneObject`](crate::scene::SceneObject)
    pub struct ObjectId;

    /// Key of a [`RenderLayer`](crate::scene::RenderLayer)
    pub struct LayerId;

    /// Key of an entry in the [`ResourceCache`](crate::assets::ResourceCache)
    pub struct ResourceId;
}

/// Ordered list of weak arena references
///
/// Insertion order is kept and duplicates are ignored. Entries are not
/// removed when their target dies; callers prune with [`KeyList::retain_live`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KeyList<K: slotmap::Key> {
    keys: Vec<K>,
}

impl<K: slotmap::Key> Default for KeyList<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K: slotmap::Key> KeyList<K> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key, returning false if it was already present
    pub fn insert(&mut self, key: K) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Remove a key, returning true if it was present
    pub fn remove(&mut self, key: K) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| *k != key);
        before != self.keys.len()
    }

    /// Whether the key is present
    pub fn contains(&self, key: K) -> bool {
        self.keys.contains(&key)
    }

    /// Keys in insertion order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }

    /// Number of keys (live or not)
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop keys for which `is_live` returns false, returning how many were dropped
    pub fn retain_live(&mut self, mut is_live: impl FnMut(K) -> bool) -> usize {
        let before = self.keys.len();
        self.keys.retain(|k| is_live(*k));
        before - self.keys.len()
    }
}
