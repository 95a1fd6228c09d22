//! Scene graph
//!
//! Following Game Engine Architecture Chapter 11.2.7.4 - Scene Graphs.
//!
//! Scene objects form a hierarchy that mirrors the [`TransformGraph`]: every
//! object owns exactly one transform node, and re-parenting an object
//! re-parents its node. Components hang off the object as optional fields:
//!
//! - [`Renderable`]: model and shader resource keys
//! - [`Camera`]: view follows the node's world matrix
//! - [`Skybox`]: drawn once per layer, never culled
//!
//! Layer membership is a weak list of [`LayerId`]s; ids of deleted layers are
//! ignored on lookup and dropped by [`SceneGraph::prune_layers`].

use crate::assets::Model;
use crate::error::SceneError;
use crate::foundation::collections::{KeyList, LayerId, NodeId, ObjectId, ResourceId, SecondaryMap, SlotMap};
use crate::foundation::math::Mat4;
use crate::render::camera::Camera;
use crate::scene::bounds::AABB;
use crate::scene::frame_context::FrameContext;
use crate::scene::render_layer::RenderLayerRegistry;
use crate::scene::transform::{TransformGraph, TransformNode, TransformState};
use serde::{Deserialize, Serialize};

/// Shader looked up by name for skyboxes unless overridden
pub const SKYBOX_SHADER: &str = "cubemap";

/// Drawable component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    /// [`Model`] resource
    pub model: ResourceId,
    /// [`ShaderProgram`](crate::assets::ShaderProgram) resource
    pub shader: ResourceId,
}

impl Renderable {
    /// Pair a model with a shader
    pub fn new(model: ResourceId, shader: ResourceId) -> Self {
        Self { model, shader }
    }
}

/// Skybox component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skybox {
    /// Cube model resource
    pub model: ResourceId,
    /// Name of the cubemap shader in the resource cache
    pub shader_name: String,
}

impl Skybox {
    /// Skybox drawn with the default cubemap shader
    pub fn new(model: ResourceId) -> Self {
        Self { model, shader_name: SKYBOX_SHADER.to_string() }
    }

    /// Use a different shader, looked up by name each frame
    pub fn with_shader(mut self, shader_name: impl Into<String>) -> Self {
        self.shader_name = shader_name.into();
        self
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneObject {
    name: String,
    node: NodeId,
    enabled: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    layers: KeyList<LayerId>,
    renderable: Option<Renderable>,
    camera: Option<Camera>,
    skybox: Option<Skybox>,
    world_bounds: Option<AABB>,
}

impl SceneObject {
    fn new(name: String, node: NodeId, parent: Option<ObjectId>) -> Self {
        Self {
            name,
            node,
            enabled: true,
            parent,
            children: Vec::new(),
            layers: KeyList::new(),
            renderable: None,
            camera: None,
            skybox: None,
            world_bounds: None,
        }
    }

    /// Object name, not required to be unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform node owned by this object
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether the object (and so its subtree) takes part in drawing
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Parent object
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child objects in insertion order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Layer memberships, possibly including deleted layers
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.iter()
    }

    /// Whether the object is tagged with a layer
    pub fn has_layer(&self, layer: LayerId) -> bool {
        self.layers.contains(layer)
    }

    /// Drawable component
    pub fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }

    /// Camera component
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Skybox component
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    /// World-space bounds from the last transform update
    pub fn world_bounds(&self) -> Option<&AABB> {
        self.world_bounds.as_ref()
    }
}

/// Hierarchy of scene objects and their transforms
#[derive(Debug, Default)]
pub struct SceneGraph {
    transforms: TransformGraph,
    objects: SlotMap<ObjectId, SceneObject>,
    node_owner: SecondaryMap<NodeId, ObjectId>,
    top_level: Vec<ObjectId>,
    default_skybox: Option<ObjectId>,
}

impl SceneGraph {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level object
    pub fn add_object(&mut self, name: impl Into<String>, state: TransformState) -> ObjectId {
        let node = self.transforms.insert(state);
        let id = self.objects.insert(SceneObject::new(name.into(), node, None));
        self.node_owner.insert(node, id);
        self.top_level.push(id);
        id
    }

    /// Add an object under `parent`
    pub fn add_child_object(
        &mut self,
        parent: ObjectId,
        name: impl Into<String>,
        state: TransformState,
    ) -> Result<ObjectId, SceneError> {
        let parent_node = self.objects.get(parent).ok_or(SceneError::ObjectNotFound(parent))?.node;
        let node = self.transforms.insert_child(parent_node, state)?;
        let id = self.objects.insert(SceneObject::new(name.into(), node, Some(parent)));
        self.node_owner.insert(node, id);
        self.objects[parent].children.push(id);
        Ok(id)
    }

    /// Move an object under a new parent, or to the top level with `None`
    ///
    /// Linking an object under its own descendant fails with
    /// [`SceneError::InvalidHierarchy`] and leaves the scene unchanged.
    pub fn set_parent(&mut self, object: ObjectId, parent: Option<ObjectId>) -> Result<(), SceneError> {
        let node = self.objects.get(object).ok_or(SceneError::ObjectNotFound(object))?.node;
        let parent_node = match parent {
            Some(p) => Some(self.objects.get(p).ok_or(SceneError::ObjectNotFound(p))?.node),
            None => None,
        };
        self.transforms.set_parent(node, parent_node)?;

        let previous = self.objects[object].parent.take();
        match previous.and_then(|p| self.objects.get_mut(p)) {
            Some(old_parent) => old_parent.children.retain(|c| *c != object),
            None => self.top_level.retain(|c| *c != object),
        }
        match parent {
            Some(p) => {
                self.objects[object].parent = Some(p);
                self.objects[p].children.push(object);
            }
            None => self.top_level.push(object),
        }
        Ok(())
    }

    /// Remove an object with its whole subtree, returning every removed key
    pub fn remove_object(&mut self, object: ObjectId) -> Result<Vec<ObjectId>, SceneError> {
        let (node, parent) = {
            let obj = self.objects.get(object).ok_or(SceneError::ObjectNotFound(object))?;
            (obj.node, obj.parent)
        };
        match parent.and_then(|p| self.objects.get_mut(p)) {
            Some(parent) => parent.children.retain(|c| *c != object),
            None => self.top_level.retain(|c| *c != object),
        }

        for node in self.transforms.remove(node)? {
            self.node_owner.remove(node);
        }

        let mut removed = Vec::new();
        let mut stack = vec![object];
        while let Some(current) = stack.pop() {
            if let Some(obj) = self.objects.remove(current) {
                stack.extend(obj.children);
                removed.push(current);
            }
        }
        if self.default_skybox.is_some_and(|s| removed.contains(&s)) {
            self.default_skybox = None;
        }
        log::debug!("Removed {} scene object(s)", removed.len());
        Ok(removed)
    }

    /// Object by key
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// First object with the given name
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().find(|(_, o)| o.name == name).map(|(id, _)| id)
    }

    /// Whether the key is live
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Whether the object and every ancestor are enabled
    ///
    /// Matches what `visit_enabled` reaches. Stale keys are not enabled.
    pub fn is_effectively_enabled(&self, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.objects.get(id) {
                Some(object) if object.enabled => current = object.parent,
                _ => return false,
            }
        }
        true
    }

    /// Top-level objects in insertion order
    pub fn top_level(&self) -> &[ObjectId] {
        &self.top_level
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Transform arena
    pub fn transforms(&self) -> &TransformGraph {
        &self.transforms
    }

    /// Transform node of an object
    pub fn transform(&self, id: ObjectId) -> Option<&TransformNode> {
        self.transforms.get(self.objects.get(id)?.node)
    }

    /// Mutable transform node of an object
    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut TransformNode> {
        let node = self.objects.get(id)?.node;
        self.transforms.get_mut(node)
    }

    /// Current world matrix of an object
    pub fn world_matrix(&self, id: ObjectId) -> Option<&Mat4> {
        self.transform(id).map(TransformNode::world_matrix)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        self.objects.get_mut(id).ok_or(SceneError::ObjectNotFound(id))
    }

    /// Enable or disable an object and, implicitly, its subtree
    pub fn set_enabled(&mut self, id: ObjectId, enabled: bool) -> Result<(), SceneError> {
        self.object_mut(id)?.enabled = enabled;
        Ok(())
    }

    /// Tag an object with a layer
    pub fn add_layer(&mut self, id: ObjectId, layer: LayerId) -> Result<bool, SceneError> {
        Ok(self.object_mut(id)?.layers.insert(layer))
    }

    /// Remove a layer tag
    pub fn remove_layer(&mut self, id: ObjectId, layer: LayerId) -> Result<bool, SceneError> {
        Ok(self.object_mut(id)?.layers.remove(layer))
    }

    /// Attach or clear the drawable component
    pub fn set_renderable(&mut self, id: ObjectId, renderable: Option<Renderable>) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        object.renderable = renderable;
        object.world_bounds = None;
        Ok(())
    }

    /// Attach or clear the camera component
    ///
    /// An attached camera takes its view from the node on the next update.
    pub fn set_camera(&mut self, id: ObjectId, camera: Option<Camera>) -> Result<(), SceneError> {
        let node = self.object_mut(id)?.node;
        let world = self.transforms.get(node).map(|n| *n.world_matrix());
        let object = self.object_mut(id)?;
        object.camera = camera;
        if let (Some(camera), Some(world)) = (object.camera.as_mut(), world) {
            camera.set_from_world_matrix(&world);
        }
        Ok(())
    }

    /// Camera component of an object
    pub fn camera(&self, id: ObjectId) -> Option<&Camera> {
        self.objects.get(id)?.camera.as_ref()
    }

    /// Mutable camera component
    ///
    /// View changes made here are overwritten by the node on the next update
    /// unless written back with [`SceneGraph::sync_camera_to_node`].
    pub fn camera_mut(&mut self, id: ObjectId) -> Option<&mut Camera> {
        self.objects.get_mut(id)?.camera.as_mut()
    }

    /// Every camera-bearing object
    pub fn cameras(&self) -> impl Iterator<Item = (ObjectId, &Camera)> + '_ {
        self.objects.iter().filter_map(|(id, o)| o.camera.as_ref().map(|c| (id, c)))
    }

    /// Attach or clear the skybox component
    pub fn set_skybox(&mut self, id: ObjectId, skybox: Option<Skybox>) -> Result<(), SceneError> {
        self.object_mut(id)?.skybox = skybox;
        Ok(())
    }

    /// Skybox drawn for cameras without their own
    pub fn default_skybox(&self) -> Option<ObjectId> {
        self.default_skybox.filter(|id| self.objects.contains_key(*id))
    }

    /// Set or clear the scene-wide skybox
    pub fn set_default_skybox(&mut self, id: Option<ObjectId>) -> Result<(), SceneError> {
        if let Some(id) = id {
            if !self.objects.get(id).is_some_and(|o| o.skybox.is_some()) {
                return Err(SceneError::ObjectNotFound(id));
            }
        }
        self.default_skybox = id;
        Ok(())
    }

    /// Write a camera's view back into its node so propagation keeps it
    pub fn sync_camera_to_node(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let object = self.objects.get(id).ok_or(SceneError::ObjectNotFound(id))?;
        let Some(camera) = object.camera.as_ref() else {
            return Ok(());
        };
        let world = *camera.inv_view_matrix();
        self.transforms.set_world_matrix(object.node, &world)
    }

    /// Drop layer ids that no longer exist, on objects and cameras alike
    pub fn prune_layers(&mut self, registry: &RenderLayerRegistry) -> usize {
        let mut dropped = 0;
        for (_, object) in &mut self.objects {
            dropped += object.layers.retain_live(|id| registry.contains(id));
            if let Some(camera) = object.camera.as_mut() {
                dropped += camera.prune_render_layers(registry);
            }
        }
        if dropped > 0 {
            log::debug!("Pruned {} stale layer reference(s)", dropped);
        }
        dropped
    }

    /// Visit enabled objects depth-first in traversal order
    ///
    /// A disabled object hides its whole subtree.
    pub fn visit_enabled(&self, mut visit: impl FnMut(ObjectId, &SceneObject)) {
        let mut stack: Vec<ObjectId> = self.top_level.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            if !object.enabled {
                continue;
            }
            visit(id, object);
            stack.extend(object.children.iter().rev());
        }
    }

    /// Propagate world matrices and refresh what depends on them
    ///
    /// Cameras take their view from their node when the node's world matrix
    /// changed. World bounds are rebuilt for changed objects and for objects
    /// whose model became ready since the last update. Returns the number of
    /// nodes visited.
    pub fn update_transforms(&mut self, ctx: &FrameContext<'_>) -> usize {
        let Self { transforms, objects, node_owner, .. } = self;

        let mut changed: SecondaryMap<ObjectId, ()> = SecondaryMap::new();
        let mut observer = |node: NodeId, world: &Mat4| {
            let Some(&id) = node_owner.get(node) else {
                return;
            };
            if let Some(object) = objects.get_mut(id) {
                if let Some(camera) = object.camera.as_mut() {
                    camera.set_from_world_matrix(world);
                }
                changed.insert(id, ());
            }
        };
        let visited = transforms.compute_world_matrices(&mut observer);

        for (id, object) in objects.iter_mut() {
            let Some(renderable) = object.renderable else {
                object.world_bounds = None;
                continue;
            };
            if object.world_bounds.is_some() && !changed.contains_key(id) {
                continue;
            }
            let Some(world) = transforms.get(object.node).map(TransformNode::world_matrix) else {
                continue;
            };
            object.world_bounds = ctx
                .resources
                .get::<Model>(renderable.model)
                .and_then(|model| model.bounds())
                .map(|bounds| bounds.transformed(world));
        }

        log::trace!(
            "Frame {}: propagated {} node(s), {} changed",
            ctx.time.frame_index,
            visited,
            changed.len()
        );
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Material, Mesh, ResourceCache, ResourceHandle, ResourceKind};
    use crate::foundation::math::{utils, Vec3};
    use crate::foundation::time::FrameTime;
    use approx::assert_relative_eq;

    fn unit_cube() -> Model {
        Model::new("cube").with_chunk(
            Mesh::new("cube", AABB::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))),
            Material::new("plain", 1),
        )
    }

    fn update(scene: &mut SceneGraph, resources: &ResourceCache) -> usize {
        let layers = RenderLayerRegistry::with_defaults();
        let ctx = FrameContext::new(resources, &layers, FrameTime::default());
        scene.update_transforms(&ctx)
    }

    #[test]
    fn test_hierarchy_mirrors_transforms() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_object("parent", TransformState::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let child = scene
            .add_child_object(parent, "child", TransformState::from_translation(Vec3::new(0.0, 2.0, 0.0)))
            .expect("parent exists");

        update(&mut scene, &ResourceCache::new());

        let world = scene.world_matrix(child).expect("live");
        assert_relative_eq!(utils::translation_of(world), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(scene.object(parent).expect("live").children(), &[child]);
        assert_eq!(scene.top_level(), &[parent]);
    }

    #[test]
    fn test_cycle_rejected_and_scene_unchanged() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", TransformState::identity());
        let b = scene.add_child_object(a, "b", TransformState::identity()).expect("live");

        let result = scene.set_parent(a, Some(b));
        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(scene.object(a).expect("live").parent(), None);
        assert_eq!(scene.top_level(), &[a]);
    }

    #[test]
    fn test_reparent_moves_between_lists() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", TransformState::identity());
        let b = scene.add_object("b", TransformState::identity());

        scene.set_parent(b, Some(a)).expect("valid");
        assert_eq!(scene.top_level(), &[a]);
        assert_eq!(scene.object(a).expect("live").children(), &[b]);

        scene.set_parent(b, None).expect("valid");
        assert_eq!(scene.top_level(), &[a, b]);
        assert!(scene.object(a).expect("live").children().is_empty());
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.add_object("root", TransformState::identity());
        let child = scene.add_child_object(root, "child", TransformState::identity()).expect("live");
        let keep = scene.add_object("keep", TransformState::identity());

        let removed = scene.remove_object(root).expect("live");
        assert_eq!(removed.len(), 2);
        assert!(!scene.contains(child));
        assert_eq!(scene.top_level(), &[keep]);
        assert_eq!(scene.transforms().len(), 1);
    }

    #[test]
    fn test_camera_follows_node() {
        let mut scene = SceneGraph::new();
        let rig = scene.add_object("rig", TransformState::identity());
        let cam = scene.add_child_object(rig, "camera", TransformState::identity()).expect("live");
        scene.set_camera(cam, Some(Camera::new())).expect("live");

        scene
            .transform_mut(rig)
            .expect("live")
            .set_translation(Vec3::new(0.0, 0.0, 5.0));
        update(&mut scene, &ResourceCache::new());

        let camera = scene.camera(cam).expect("camera");
        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(camera.view_direction(), -Vec3::z(), epsilon = 1e-5);
    }

    #[test]
    fn test_synced_camera_survives_propagation() {
        let mut scene = SceneGraph::new();
        let cam = scene.add_object("camera", TransformState::identity());
        scene.set_camera(cam, Some(Camera::new())).expect("live");

        let camera = scene.camera_mut(cam).expect("camera");
        camera.set_look_at(&Vec3::new(3.0, 4.0, 5.0), &Vec3::zeros(), &Vec3::y());
        let view = *camera.view_matrix();
        scene.sync_camera_to_node(cam).expect("live");
        update(&mut scene, &ResourceCache::new());

        assert_relative_eq!(*scene.camera(cam).expect("camera").view_matrix(), view, epsilon = 1e-4);
    }

    #[test]
    fn test_bounds_wait_for_model() {
        let mut resources = ResourceCache::new();
        let model = ResourceHandle::loading("cube", ResourceKind::Model);
        let model_id = resources.insert(model.clone());
        let shader_id = resources.insert(ResourceHandle::loading("lit", ResourceKind::Shader));

        let mut scene = SceneGraph::new();
        let obj = scene.add_object("box", TransformState::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        scene.set_renderable(obj, Some(Renderable::new(model_id, shader_id))).expect("live");

        update(&mut scene, &resources);
        assert!(scene.object(obj).expect("live").world_bounds().is_none());

        model.set_resource(unit_cube());
        update(&mut scene, &resources);
        let bounds = scene.object(obj).expect("live").world_bounds().copied().expect("bounds");
        assert_relative_eq!(bounds.center(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_visit_skips_disabled_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.add_object("a", TransformState::identity());
        let a1 = scene.add_child_object(a, "a1", TransformState::identity()).expect("live");
        let b = scene.add_object("b", TransformState::identity());
        let b1 = scene.add_child_object(b, "b1", TransformState::identity()).expect("live");
        scene.set_enabled(b, false).expect("live");

        let mut seen = Vec::new();
        scene.visit_enabled(|id, _| seen.push(id));
        assert_eq!(seen, vec![a, a1]);

        scene.set_enabled(b, true).expect("live");
        seen.clear();
        scene.visit_enabled(|id, _| seen.push(id));
        assert_eq!(seen, vec![a, a1, b, b1]);
    }

    #[test]
    fn test_effectively_enabled_follows_ancestors() {
        let mut scene = SceneGraph::new();
        let rig = scene.add_object("rig", TransformState::identity());
        let arm = scene.add_child_object(rig, "arm", TransformState::identity()).expect("live");
        let hand = scene.add_child_object(arm, "hand", TransformState::identity()).expect("live");
        assert!(scene.is_effectively_enabled(hand));

        scene.set_enabled(rig, false).expect("live");
        assert!(!scene.is_effectively_enabled(hand));
        assert!(!scene.is_effectively_enabled(arm));

        scene.set_enabled(rig, true).expect("live");
        scene.set_enabled(hand, false).expect("live");
        assert!(scene.is_effectively_enabled(arm));
        assert!(!scene.is_effectively_enabled(hand));

        scene.remove_object(rig).expect("live");
        assert!(!scene.is_effectively_enabled(arm));
    }

    #[test]
    fn test_prune_layers() {
        let mut registry = RenderLayerRegistry::with_defaults();
        let world = registry.layer("world").expect("default");
        let ui = registry.layer("ui").expect("default");

        let mut scene = SceneGraph::new();
        let obj = scene.add_object("obj", TransformState::identity());
        scene.add_layer(obj, world).expect("live");
        scene.add_layer(obj, ui).expect("live");

        registry.remove_layer(ui);
        assert_eq!(scene.prune_layers(&registry), 1);
        assert_eq!(scene.object(obj).expect("live").layers().collect::<Vec<_>>(), vec![world]);
    }

    #[test]
    fn test_default_skybox_requires_component() {
        let mut scene = SceneGraph::new();
        let obj = scene.add_object("sky", TransformState::identity());
        assert!(scene.set_default_skybox(Some(obj)).is_err());

        scene.set_skybox(obj, Some(Skybox::new(ResourceId::default()))).expect("live");
        scene.set_default_skybox(Some(obj)).expect("has skybox");
        assert_eq!(scene.default_skybox(), Some(obj));

        scene.remove_object(obj).expect("live");
        assert_eq!(scene.default_skybox(), None);
    }
}
