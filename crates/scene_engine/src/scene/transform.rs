//! Transform hierarchy
//!
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs.
//!
//! Nodes live in a [`TransformGraph`] arena and refer to each other by
//! [`NodeId`]. Every frame one top-down pass seeded at each root recomputes
//! world matrices; nodes whose world matrix changed are reported to a
//! [`TransformObserver`].
//!
//! ```text
//! root (world = local)
//!  ├── child (world = f(parent.world, local, inheritance))
//!  │    └── grandchild
//!  └── child
//! ```

use crate::error::SceneError;
use crate::foundation::collections::{NodeId, SecondaryMap, SlotMap};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Matrix3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How much of the parent's world transform a node inherits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InheritanceMode {
    /// Full parent transform: `world = parent · local`
    #[default]
    All,
    /// Only the parent's world position
    TranslationOnly,
    /// Position follows the parent, orientation and scale stay local
    PreserveOrientation,
}

/// Local translation, rotation, scale and inheritance of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformState {
    /// Local translation
    pub translation: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale factors
    pub scale: Vec3,
    /// Inheritance mode
    pub inheritance: InheritanceMode,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            inheritance: InheritanceMode::All,
        }
    }
}

impl TransformState {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Builder: set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: set inheritance mode
    pub fn with_inheritance(mut self, inheritance: InheritanceMode) -> Self {
        self.inheritance = inheritance;
        self
    }

    /// `T · R · S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into translation, rotation and positive scale
    ///
    /// The inheritance mode is left at its default.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let translation = utils::translation_of(matrix);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let safe = |s: f32| if s > f32::EPSILON { s } else { 1.0 };
        let rotation_matrix = Matrix3::new(
            matrix.m11 / safe(scale_x), matrix.m12 / safe(scale_y), matrix.m13 / safe(scale_z),
            matrix.m21 / safe(scale_x), matrix.m22 / safe(scale_y), matrix.m23 / safe(scale_z),
            matrix.m31 / safe(scale_x), matrix.m32 / safe(scale_y), matrix.m33 / safe(scale_z),
        );

        Self {
            translation,
            rotation: Quat::from_matrix(&rotation_matrix),
            scale,
            inheritance: InheritanceMode::All,
        }
    }

    /// Blend two states: linear for translation and scale, spherical for rotation
    ///
    /// The inheritance mode of `a` is kept.
    pub fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        let rotation = a
            .rotation
            .try_slerp(&b.rotation, t, 1e-6)
            .unwrap_or(if t < 0.5 { a.rotation } else { b.rotation });
        Self {
            translation: a.translation.lerp(&b.translation, t),
            rotation,
            scale: a.scale.lerp(&b.scale, t),
            inheritance: a.inheritance,
        }
    }
}

/// Receives world-matrix changes during propagation
pub trait TransformObserver {
    /// Called once for every node whose world matrix changed in this pass
    fn world_matrix_changed(&mut self, node: NodeId, world: &Mat4);
}

impl<F: FnMut(NodeId, &Mat4)> TransformObserver for F {
    fn world_matrix_changed(&mut self, node: NodeId, world: &Mat4) {
        self(node, world);
    }
}

/// Observer that ignores every change
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransformObserver for NoopObserver {
    fn world_matrix_changed(&mut self, _node: NodeId, _world: &Mat4) {}
}

/// A node of the transform hierarchy
#[derive(Debug, Clone)]
pub struct TransformNode {
    state: TransformState,
    local_matrix: Mat4,
    world_matrix: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TransformNode {
    fn new(state: TransformState) -> Self {
        let local_matrix = state.to_matrix();
        Self {
            state,
            local_matrix,
            world_matrix: local_matrix,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Local state
    pub fn state(&self) -> &TransformState {
        &self.state
    }

    /// Local translation
    pub fn translation(&self) -> Vec3 {
        self.state.translation
    }

    /// Local rotation
    pub fn rotation(&self) -> Quat {
        self.state.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.state.scale
    }

    /// Inheritance mode
    pub fn inheritance(&self) -> InheritanceMode {
        self.state.inheritance
    }

    /// Replace the whole local state
    pub fn set_state(&mut self, state: TransformState) {
        self.state = state;
        self.compute_local_matrix();
    }

    /// Set local translation
    pub fn set_translation(&mut self, translation: Vec3) {
        self.state.translation = translation;
        self.compute_local_matrix();
    }

    /// Set local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.state.rotation = rotation;
        self.compute_local_matrix();
    }

    /// Set local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.state.scale = scale;
        self.compute_local_matrix();
    }

    /// Set inheritance mode
    pub fn set_inheritance(&mut self, inheritance: InheritanceMode) {
        self.state.inheritance = inheritance;
    }

    /// Recompute `local = T · R · S`
    pub fn compute_local_matrix(&mut self) {
        self.local_matrix = self.state.to_matrix();
    }

    /// Cached local matrix
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// World matrix from the most recent propagation
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// World-space position from the most recent propagation
    pub fn world_position(&self) -> Vec3 {
        utils::translation_of(&self.world_matrix)
    }

    /// Parent key, possibly stale
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child keys in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World matrix for this node under the given parent world
    fn world_under(&self, parent_world: Option<&Mat4>) -> Mat4 {
        let Some(parent_world) = parent_world else {
            return self.local_matrix;
        };
        match self.state.inheritance {
            InheritanceMode::All => parent_world * self.local_matrix,
            InheritanceMode::TranslationOnly => parent_world.translation_only() * self.local_matrix,
            InheritanceMode::PreserveOrientation => {
                let anchored = (parent_world * Mat4::new_translation(&self.state.translation)).translation_only();
                anchored
                    * self.state.rotation.to_homogeneous()
                    * Mat4::new_nonuniform_scaling(&self.state.scale)
            }
        }
    }

    /// Recompute local then world; returns whether the world matrix changed
    fn update_world(&mut self, parent_world: Option<&Mat4>) -> bool {
        self.compute_local_matrix();
        let world = self.world_under(parent_world);
        let changed = world != self.world_matrix;
        self.world_matrix = world;
        changed
    }
}

/// Arena of transform nodes
#[derive(Debug, Clone, Default)]
pub struct TransformGraph {
    nodes: SlotMap<NodeId, TransformNode>,
    roots: Vec<NodeId>,
}

impl TransformGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node
    pub fn insert(&mut self, state: TransformState) -> NodeId {
        let id = self.nodes.insert(TransformNode::new(state));
        self.roots.push(id);
        id
    }

    /// Insert a node under an existing parent
    pub fn insert_child(&mut self, parent: NodeId, state: TransformState) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = self.nodes.insert(TransformNode::new(state));
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Remove a node and its whole subtree, returning every removed key
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if !self.nodes.contains_key(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.detach(id);

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed.push(current);
            }
        }
        log::trace!("Removed {} transform node(s)", removed.len());
        Ok(removed)
    }

    /// Node by key
    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(id)
    }

    /// Mutable node by key
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(id)
    }

    /// Whether the key is live
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Re-parent a node, or make it a root with `None`
    ///
    /// Fails with [`SceneError::InvalidHierarchy`] if the link would make a
    /// node its own ancestor. The local state is kept, so the world transform
    /// generally changes.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
            if self.is_ancestor(child, parent) {
                return Err(SceneError::InvalidHierarchy(format!(
                    "{child:?} cannot be parented under its own descendant {parent:?}"
                )));
            }
        }

        self.detach(child);
        match parent {
            Some(parent) => {
                self.nodes[child].parent = Some(parent);
                self.nodes[parent].children.push(child);
            }
            None => self.roots.push(child),
        }
        Ok(())
    }

    /// Append `child` to `parent`'s children
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.set_parent(child, Some(parent))
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(id).and_then(|n| n.parent.take());
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Recompute every world matrix top-down from the roots
    ///
    /// Nodes whose parent key is stale are treated as roots. No node is
    /// visited twice. Returns the number of nodes visited.
    pub fn compute_world_matrices(&mut self, observer: &mut dyn TransformObserver) -> usize {
        let mut seeds = self.roots.clone();
        for (id, node) in &self.nodes {
            if let Some(parent) = node.parent {
                if !self.nodes.contains_key(parent) {
                    log::warn!("Transform node {:?} has a dangling parent, treating it as a root", id);
                    seeds.push(id);
                }
            }
        }
        self.propagate(seeds.into_iter().map(|id| (id, None)).collect(), observer)
    }

    /// Recompute one node and its subtree against the parent's current world matrix
    pub fn compute_world_matrix(
        &mut self,
        id: NodeId,
        observer: &mut dyn TransformObserver,
    ) -> Result<usize, SceneError> {
        let node = self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))?;
        let parent_world = node.parent.and_then(|p| self.nodes.get(p)).map(|p| p.world_matrix);
        Ok(self.propagate(vec![(id, parent_world)], observer))
    }

    fn propagate(&mut self, seeds: Vec<(NodeId, Option<Mat4>)>, observer: &mut dyn TransformObserver) -> usize {
        let mut visited: SecondaryMap<NodeId, ()> = SecondaryMap::new();
        let mut stack: Vec<(NodeId, Option<Mat4>)> = seeds.into_iter().rev().collect();

        while let Some((id, parent_world)) = stack.pop() {
            if visited.insert(id, ()).is_some() {
                log::warn!("Transform node {:?} reached twice in one pass, skipping", id);
                continue;
            }
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if node.update_world(parent_world.as_ref()) {
                observer.world_matrix_changed(id, &node.world_matrix);
            }
            let world = node.world_matrix;
            stack.extend(node.children.iter().rev().map(|child| (*child, Some(world))));
        }

        visited.len()
    }

    /// Set a node's local state so that its world matrix becomes `world`
    ///
    /// Uses the parent's current world matrix and the node's inheritance mode.
    /// The node's own world matrix is updated immediately; descendants catch
    /// up on the next propagation.
    pub fn set_world_matrix(&mut self, id: NodeId, world: &Mat4) -> Result<(), SceneError> {
        let node = self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))?;
        let inheritance = node.inheritance();
        let parent_world = node.parent.and_then(|p| self.nodes.get(p)).map(|p| p.world_matrix);

        let state = match parent_world {
            None => TransformState::from_matrix(world),
            Some(parent) => match inheritance {
                InheritanceMode::All => {
                    let inverse = parent.try_inverse().ok_or_else(|| {
                        SceneError::InvalidHierarchy(format!("parent of {id:?} has a singular world matrix"))
                    })?;
                    TransformState::from_matrix(&(inverse * world))
                }
                InheritanceMode::TranslationOnly => {
                    let offset = Mat4::new_translation(&-utils::translation_of(&parent));
                    TransformState::from_matrix(&(offset * world))
                }
                InheritanceMode::PreserveOrientation => {
                    let inverse = parent.try_inverse().ok_or_else(|| {
                        SceneError::InvalidHierarchy(format!("parent of {id:?} has a singular world matrix"))
                    })?;
                    let mut state = TransformState::from_matrix(world);
                    state.translation = crate::scene::bounds::transform_point(&inverse, &state.translation);
                    state
                }
            },
        }
        .with_inheritance(inheritance);

        let node = &mut self.nodes[id];
        node.set_state(state);
        node.world_matrix = node.world_under(parent_world.as_ref());
        Ok(())
    }
}
