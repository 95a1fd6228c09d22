//! Draw command generation
//!
//! Following Game Engine Architecture Chapter 11.3 - Render Queues.
//!
//! For one camera, walk the active render layers in registry order. Inside a
//! layer, visit enabled scene objects depth-first and emit one command per
//! visible mesh chunk, then at most one command for the skybox. Objects whose
//! model or shader is not ready yet are skipped for the frame without error.

use crate::assets::{Model, ResourceCache, ShaderProgram, TransparencyMode};
use crate::error::{CameraError, SceneError};
use crate::foundation::collections::{LayerId, ObjectId, ResourceId};
use crate::foundation::math::Mat4;
use crate::render::camera::{Camera, CameraOptions};
use crate::render::draw_command::{ChunkRef, DrawCommand, DrawKind, SortKey};
use crate::render::uniforms::{UniformValue, WORLD_MATRIX_UNIFORM};
use crate::scene::bounds::AABB;
use crate::scene::frame_context::FrameContext;
use crate::scene::scene_graph::{SceneGraph, SceneObject};
use std::sync::Arc;

/// Counters from the most recent generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Layers walked
    pub layers: usize,
    /// Chunks rejected by the frustum
    pub culled: usize,
    /// Objects skipped because a resource was not ready
    pub not_ready: usize,
    /// Commands emitted
    pub commands: usize,
}

/// Builds per-camera draw lists
#[derive(Debug, Default)]
pub struct DrawCommandGenerator {
    last_stats: GenerationStats,
}

impl DrawCommandGenerator {
    /// Create a generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters from the last call to [`DrawCommandGenerator::generate`]
    pub fn last_stats(&self) -> GenerationStats {
        self.last_stats
    }

    /// Generate for the camera component of a scene object
    ///
    /// A disabled camera object yields an empty list.
    pub fn generate_for(
        &mut self,
        camera_object: ObjectId,
        scene: &SceneGraph,
        ctx: &FrameContext<'_>,
    ) -> Result<Vec<DrawCommand>, SceneError> {
        let object = scene.object(camera_object).ok_or(SceneError::ObjectNotFound(camera_object))?;
        let camera = object.camera().ok_or(CameraError::NoCamera(camera_object))?;
        if !object.is_enabled() {
            self.last_stats = GenerationStats::default();
            return Ok(Vec::new());
        }
        Ok(self.generate(camera, scene, ctx))
    }

    /// Ordered draw list for `camera`
    ///
    /// World matrices and the camera's frustum must already be current for
    /// the frame.
    pub fn generate(&mut self, camera: &Camera, scene: &SceneGraph, ctx: &FrameContext<'_>) -> Vec<DrawCommand> {
        let mut stats = GenerationStats::default();
        let mut commands = Vec::new();

        let culling = camera.has_option(CameraOptions::FRUSTUM_CULLING);
        let skybox = skybox_object(camera, scene);
        let layers = camera.active_render_layers(ctx.layers);

        for layer in layers {
            stats.layers += 1;
            let position = ctx.layers.position(layer).unwrap_or(0);

            scene.visit_enabled(|id, object| {
                if object.skybox().is_some() || !object.has_layer(layer) {
                    return;
                }
                let Some(renderable) = object.renderable() else {
                    return;
                };
                let Some(world) = scene.world_matrix(id) else {
                    return;
                };
                let (Some(model), Some(shader)) = (
                    ready_model(ctx.resources, renderable.model),
                    ready_shader(ctx.resources, renderable.shader),
                ) else {
                    stats.not_ready += 1;
                    return;
                };

                for (index, chunk) in model.chunks.iter().enumerate() {
                    let bounds = chunk.mesh.bounds.transformed(world);
                    if culling && !camera.can_see(&bounds) {
                        stats.culled += 1;
                        continue;
                    }
                    let depth = camera.depth(&bounds.center());
                    let sort_key = SortKey::new(
                        camera.viewport().depth,
                        position,
                        chunk.material.transparency,
                        shader.sort_id,
                        chunk.material.sort_id,
                        depth / camera.projection().far(),
                    );
                    commands.push(DrawCommand {
                        object: id,
                        chunk: ChunkRef {
                            model: renderable.model,
                            index,
                            mesh: Arc::clone(&chunk.mesh),
                            material: Arc::clone(&chunk.material),
                        },
                        shader: Arc::clone(&shader),
                        layer,
                        uniforms: vec![(WORLD_MATRIX_UNIFORM.to_string(), UniformValue::Mat4(*world))],
                        world_bounds: bounds,
                        depth,
                        kind: DrawKind::Mesh,
                        sort_key,
                    });
                }
            });

            if let Some((id, object)) = skybox {
                if let Some(command) = skybox_command(camera, scene, ctx, id, object, layer, position) {
                    commands.push(command);
                }
            }
        }

        stats.commands = commands.len();
        log::trace!(
            "Generated {} draw command(s) over {} layer(s), {} culled, {} not ready",
            stats.commands,
            stats.layers,
            stats.culled,
            stats.not_ready
        );
        self.last_stats = stats;
        commands
    }
}

fn ready_model(resources: &ResourceCache, id: ResourceId) -> Option<Arc<Model>> {
    let handle = resources.handle(id)?;
    if !handle.is_constructed() {
        return None;
    }
    handle.resource_as::<Model>()
}

fn ready_shader(resources: &ResourceCache, id: ResourceId) -> Option<Arc<ShaderProgram>> {
    let handle = resources.handle(id)?;
    if !handle.is_constructed() {
        return None;
    }
    handle.resource_as::<ShaderProgram>().filter(|shader| shader.is_linked())
}

/// The camera's own skybox when it has one set, else the scene default
///
/// A camera skybox that is gone or lost its component draws nothing.
fn skybox_object<'a>(camera: &Camera, scene: &'a SceneGraph) -> Option<(ObjectId, &'a SceneObject)> {
    let Some(id) = camera.skybox() else {
        let id = scene.default_skybox()?;
        return scene.object(id).map(|object| (id, object));
    };
    match scene.object(id) {
        Some(object) if object.skybox().is_some() => Some((id, object)),
        _ => {
            log::debug!("Camera skybox {:?} is gone, drawing no skybox", id);
            None
        }
    }
}

fn skybox_command(
    camera: &Camera,
    scene: &SceneGraph,
    ctx: &FrameContext<'_>,
    id: ObjectId,
    object: &SceneObject,
    layer: LayerId,
    position: usize,
) -> Option<DrawCommand> {
    let skybox = object.skybox()?;
    if !object.is_enabled() || !object.has_layer(layer) {
        return None;
    }
    let model = ready_model(ctx.resources, skybox.model)?;
    let chunk = model.chunks.first()?;
    let shader = ctx
        .resources
        .id_of(&skybox.shader_name)
        .and_then(|shader_id| ready_shader(ctx.resources, shader_id))?;

    // Centered on the eye so the box never moves relative to the camera
    let mut world = scene.world_matrix(id).copied().unwrap_or_else(Mat4::identity);
    world.fixed_view_mut::<3, 1>(0, 3).copy_from(&camera.eye());

    Some(DrawCommand {
        object: id,
        chunk: ChunkRef {
            model: skybox.model,
            index: 0,
            mesh: Arc::clone(&chunk.mesh),
            material: Arc::clone(&chunk.material),
        },
        shader: Arc::clone(&shader),
        layer,
        uniforms: vec![(WORLD_MATRIX_UNIFORM.to_string(), UniformValue::Mat4(world))],
        world_bounds: AABB::transformed(&chunk.mesh.bounds, &world),
        depth: camera.projection().far(),
        kind: DrawKind::Skybox,
        sort_key: SortKey::new(
            camera.viewport().depth,
            position,
            TransparencyMode::Opaque,
            shader.sort_id,
            chunk.material.sort_id,
            1.0,
        ),
    })
}
