//! Render layers
//!
//! A render layer is a named bucket with an order. Cameras subscribe to layers
//! and scene objects are tagged with them; the draw generator walks layers in
//! ascending order. Both sides hold plain [`LayerId`] keys, so deleting a
//! layer here leaves stale keys behind that resolve to `None` and get pruned
//! lazily.

use crate::error::SceneError;
use crate::foundation::collections::{LayerId, SlotMap};
use serde::{Deserialize, Serialize};

/// Built-in layer names, in draw order
pub const DEFAULT_LAYERS: [(&str, i32); 4] = [("skybox", 0), ("world", 1), ("effects", 2), ("ui", 3)];

/// A named draw bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderLayer {
    /// Unique name
    pub name: String,
    /// Lower orders are drawn first
    pub order: i32,
    #[serde(skip)]
    sequence: u64,
}

impl RenderLayer {
    fn sort_key(&self) -> (i32, u64) {
        (self.order, self.sequence)
    }
}

/// Registry of every render layer in a scenario
#[derive(Debug, Clone, Default)]
pub struct RenderLayerRegistry {
    layers: SlotMap<LayerId, RenderLayer>,
    ordered: Vec<LayerId>,
    next_sequence: u64,
}

impl RenderLayerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in skybox, world, effects and ui layers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, order) in DEFAULT_LAYERS {
            // Names are distinct, insertion cannot fail
            let _ = registry.add_layer(name, order);
        }
        registry
    }

    /// Register a layer
    pub fn add_layer(&mut self, name: impl Into<String>, order: i32) -> Result<LayerId, SceneError> {
        let name = name.into();
        if self.layer(&name).is_some() {
            return Err(SceneError::DuplicateLayer(name));
        }
        log::debug!("Adding render layer '{}' (order {})", name, order);
        let id = self.layers.insert(RenderLayer {
            name,
            order,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        self.ordered.push(id);
        self.resort();
        Ok(id)
    }

    /// Remove a layer
    ///
    /// Cameras and objects keep their stale key until they next prune.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<RenderLayer> {
        let layer = self.layers.remove(id)?;
        self.ordered.retain(|l| *l != id);
        log::debug!("Removed render layer '{}'", layer.name);
        Some(layer)
    }

    /// Remove a layer by name
    pub fn remove_layer_named(&mut self, name: &str) -> Result<RenderLayer, SceneError> {
        let id = self.layer(name).ok_or_else(|| SceneError::LayerNotFound(name.to_string()))?;
        self.remove_layer(id).ok_or_else(|| SceneError::LayerNotFound(name.to_string()))
    }

    /// Change a layer's order
    pub fn set_order(&mut self, id: LayerId, order: i32) -> bool {
        let Some(layer) = self.layers.get_mut(id) else {
            return false;
        };
        layer.order = order;
        self.resort();
        true
    }

    /// Look a layer up by name
    pub fn layer(&self, name: &str) -> Option<LayerId> {
        self.ordered.iter().copied().find(|id| self.layers[*id].name == name)
    }

    /// Resolve a key
    pub fn get(&self, id: LayerId) -> Option<&RenderLayer> {
        self.layers.get(id)
    }

    /// Whether a key still refers to a live layer
    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(id)
    }

    /// Layer keys in draw order
    pub fn layers(&self) -> &[LayerId] {
        &self.ordered
    }

    /// Position of a layer in draw order
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.ordered.iter().position(|l| *l == id)
    }

    /// Resolve names to keys, skipping unknown names
    pub fn resolve_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<LayerId> {
        names
            .into_iter()
            .filter_map(|name| {
                let id = self.layer(name);
                if id.is_none() {
                    log::warn!("Unknown render layer '{}' ignored", name);
                }
                id
            })
            .collect()
    }

    /// Sort keys into draw order, dropping stale ones
    pub fn sorted(&self, ids: impl IntoIterator<Item = LayerId>) -> Vec<LayerId> {
        let mut live: Vec<LayerId> = ids.into_iter().filter(|id| self.contains(*id)).collect();
        live.sort_by_key(|id| self.layers[*id].sort_key());
        live.dedup();
        live
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn resort(&mut self) {
        let layers = &self.layers;
        self.ordered.sort_by_key(|id| layers[*id].sort_key());
    }
}
