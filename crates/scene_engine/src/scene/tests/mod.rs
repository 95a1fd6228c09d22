//! Frame pipeline tests
//!
//! Scene graph, cameras, resource readiness and draw generation exercised
//! together through a shared fixture.

mod skybox;

use crate::assets::{Material, Mesh, Model, ResourceCache, ResourceKind, ShaderProgram};
use crate::foundation::collections::{LayerId, ObjectId, ResourceId};
use crate::foundation::math::Vec3;
use crate::foundation::time::FrameTime;
use crate::render::camera::Camera;
use crate::render::draw_command::DrawCommand;
use crate::render::draw_generator::DrawCommandGenerator;
use crate::scene::bounds::AABB;
use crate::scene::frame_context::FrameContext;
use crate::scene::render_layer::RenderLayerRegistry;
use crate::scene::scene_graph::{Renderable, SceneGraph, Skybox, SKYBOX_SHADER};
use crate::scene::transform::TransformState;

/// Scene with `skybox(0)`, `world(1)` and `ui(2)` layers and a camera at
/// (0, 0, 10) looking at the origin
pub(super) struct Fixture {
    pub resources: ResourceCache,
    pub layers: RenderLayerRegistry,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub generator: DrawCommandGenerator,
    pub cube: ResourceId,
    pub lit: ResourceId,
    pub skybox: LayerId,
    pub world: LayerId,
    pub ui: LayerId,
}

pub(super) fn cube_model(name: &str) -> Model {
    Model::new(name).with_chunk(
        Mesh::new(name, AABB::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))),
        Material::new(name, 1),
    )
}

impl Fixture {
    pub fn new() -> Self {
        let mut resources = ResourceCache::new();
        let cube = resources.insert_constructed("cube", ResourceKind::Model, cube_model("cube"));
        let lit = resources.insert_constructed("lit", ResourceKind::Shader, ShaderProgram::new("lit", 1));
        resources.insert_constructed(SKYBOX_SHADER, ResourceKind::Shader, ShaderProgram::new(SKYBOX_SHADER, 0));

        let mut layers = RenderLayerRegistry::new();
        let skybox = layers.add_layer("skybox", 0).expect("unique");
        let world = layers.add_layer("world", 1).expect("unique");
        let ui = layers.add_layer("ui", 2).expect("unique");

        let mut camera = Camera::new().looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), Vec3::y());
        camera.resize_frame(800, 600).expect("valid size");
        for layer in [skybox, world, ui] {
            camera.add_render_layer(layer);
        }

        Self {
            resources,
            layers,
            scene: SceneGraph::new(),
            camera,
            generator: DrawCommandGenerator::new(),
            cube,
            lit,
            skybox,
            world,
            ui,
        }
    }

    /// Top-level cube drawn with the lit shader, tagged with `layer`
    pub fn add_cube(&mut self, name: &str, position: Vec3, layer: LayerId) -> ObjectId {
        let id = self.scene.add_object(name, TransformState::from_translation(position));
        self.scene
            .set_renderable(id, Some(Renderable::new(self.cube, self.lit)))
            .expect("live");
        self.scene.add_layer(id, layer).expect("live");
        id
    }

    /// Skybox object far behind the camera, tagged with `layer`
    pub fn add_skybox(&mut self, layer: LayerId) -> ObjectId {
        let model = self
            .resources
            .insert_constructed("sky", ResourceKind::Model, cube_model("sky"));
        let id = self
            .scene
            .add_object("sky", TransformState::from_translation(Vec3::new(0.0, 0.0, 500.0)));
        self.scene.set_skybox(id, Some(Skybox::new(model))).expect("live");
        self.scene.add_layer(id, layer).expect("live");
        id
    }

    /// Propagate transforms, then generate for the fixture camera
    pub fn run(&mut self) -> Vec<DrawCommand> {
        let ctx = FrameContext::new(&self.resources, &self.layers, FrameTime::default());
        self.scene.update_transforms(&ctx);
        self.generator.generate(&self.camera, &self.scene, &ctx)
    }
}
