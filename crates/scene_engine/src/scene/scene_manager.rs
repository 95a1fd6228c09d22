//! Scene Manager - per-frame orchestration
//!
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs and
//! Chapter 16.2 - Runtime Object Model Architectures.
//!
//! The Scene Manager owns the scene, the render layer registry and the
//! resource cache, and runs one frame in a fixed order:
//!
//! 1. Tick the frame clock
//! 2. Step camera controllers from polled input and write moved cameras back
//!    into their nodes
//! 3. Drop stale layer references
//! 4. Propagate world matrices (cameras and bounds follow their nodes)
//! 5. For every enabled camera, in viewport depth order, bind the camera
//!    uniforms and generate its draw list

use crate::assets::ResourceCache;
use crate::config::ConfigError;
use crate::core::config::EngineConfig;
use crate::error::{CameraError, SceneError};
use crate::foundation::collections::{ObjectId, SecondaryMap};
use crate::foundation::math::Vec3;
use crate::foundation::time::{FrameClock, FrameTime};
use crate::input::InputManager;
use crate::render::camera::{Camera, CameraOptions};
use crate::render::camera_controller::CameraController;
use crate::render::draw_command::{sort_draw_commands, DrawCommand};
use crate::render::draw_generator::{DrawCommandGenerator, GenerationStats};
use crate::render::uniforms::CameraUniformBuffer;
use crate::scene::frame_context::FrameContext;
use crate::scene::render_layer::RenderLayerRegistry;
use crate::scene::scene_graph::SceneGraph;
use crate::scene::transform::TransformState;

/// Everything one camera contributes to a frame
#[derive(Debug, Clone)]
pub struct CameraPass {
    /// Camera object
    pub camera: ObjectId,
    /// Camera block for the pass
    pub uniforms: CameraUniformBuffer,
    /// Draw list in submission order
    pub commands: Vec<DrawCommand>,
    /// Generation counters
    pub stats: GenerationStats,
}

/// Result of [`SceneManager::update_frame`]
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Frame timestamp
    pub time: FrameTime,
    /// Camera passes in viewport depth order
    pub passes: Vec<CameraPass>,
}

impl FrameOutput {
    /// Total draw commands over every pass
    pub fn total_commands(&self) -> usize {
        self.passes.iter().map(|p| p.commands.len()).sum()
    }

    /// Pass of a given camera
    pub fn pass(&self, camera: ObjectId) -> Option<&CameraPass> {
        self.passes.iter().find(|p| p.camera == camera)
    }
}

/// Scene Manager - coordinates scene, cameras and draw generation
#[derive(Debug)]
pub struct SceneManager {
    config: EngineConfig,
    scene: SceneGraph,
    layers: RenderLayerRegistry,
    resources: ResourceCache,
    clock: FrameClock,
    generator: DrawCommandGenerator,
    controllers: SecondaryMap<ObjectId, CameraController>,
    render_target: (u32, u32),
}

impl SceneManager {
    /// Create a scene manager with default configuration
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), RenderLayerRegistry::with_defaults())
    }

    /// Create a scene manager from a validated configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut layers = RenderLayerRegistry::new();
        for layer in &config.render_layers {
            layers
                .add_layer(layer.name.clone(), layer.order)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(Self::build(config.clone(), layers))
    }

    fn build(config: EngineConfig, layers: RenderLayerRegistry) -> Self {
        let clock = config.fixed_time_step.map_or_else(FrameClock::new, FrameClock::fixed);
        Self {
            render_target: config.render_target,
            config,
            scene: SceneGraph::new(),
            layers,
            resources: ResourceCache::new(),
            clock,
            generator: DrawCommandGenerator::new(),
            controllers: SecondaryMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Render layer registry
    pub fn layers(&self) -> &RenderLayerRegistry {
        &self.layers
    }

    /// Mutable render layer registry
    pub fn layers_mut(&mut self) -> &mut RenderLayerRegistry {
        &mut self.layers
    }

    /// Resource cache
    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Mutable resource cache
    pub fn resources_mut(&mut self) -> &mut ResourceCache {
        &mut self.resources
    }

    /// Replace the frame clock
    pub fn set_clock(&mut self, clock: FrameClock) {
        self.clock = clock;
    }

    /// Render target size in pixels
    pub fn render_target(&self) -> (u32, u32) {
        self.render_target
    }

    /// Camera built from the configured defaults, not yet placed in the scene
    pub fn default_camera(&self) -> Result<Camera, CameraError> {
        let defaults = &self.config.camera;
        let mut options = defaults.options;
        options.set(CameraOptions::FRUSTUM_CULLING, self.config.culling.frustum_culling);

        let mut camera = Camera::with_projection(defaults.projection)?.with_options(options);
        camera.set_viewport(defaults.viewport)?;
        let (width, height) = self.render_target;
        camera.resize_frame(width, height)?;
        for id in self.layers.resolve_names(defaults.render_layers.iter().map(String::as_str)) {
            camera.add_render_layer(id);
        }
        Ok(camera)
    }

    /// Add a top-level camera object looking from `eye` at `target`
    ///
    /// The camera gets a controller orbiting `target` with the configured profile.
    pub fn add_camera_object(
        &mut self,
        name: impl Into<String>,
        eye: Vec3,
        target: Vec3,
    ) -> Result<ObjectId, SceneError> {
        let camera = self.default_camera()?;
        let id = self.scene.add_object(name, TransformState::identity());
        self.scene.set_camera(id, Some(camera))?;
        if let Some(camera) = self.scene.camera_mut(id) {
            camera.set_look_at(&eye, &target, &Vec3::y());
        }
        self.scene.sync_camera_to_node(id)?;
        self.controllers
            .insert(id, CameraController::new(self.config.controller.clone(), target));
        log::debug!("Added camera object {:?} at {:?}", id, eye);
        Ok(id)
    }

    /// Attach a controller to a camera object, replacing any previous one
    pub fn attach_controller(&mut self, camera: ObjectId, controller: CameraController) -> Result<(), SceneError> {
        if self.scene.camera(camera).is_none() {
            return Err(CameraError::NoCamera(camera).into());
        }
        self.controllers.insert(camera, controller);
        Ok(())
    }

    /// Detach a camera's controller
    pub fn detach_controller(&mut self, camera: ObjectId) -> Option<CameraController> {
        self.controllers.remove(camera)
    }

    /// Controller of a camera object
    pub fn controller(&self, camera: ObjectId) -> Option<&CameraController> {
        self.controllers.get(camera)
    }

    /// React to a render target resize
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidViewport(format!("render target {width}x{height} has no area")));
        }
        self.render_target = (width, height);
        let ids: Vec<ObjectId> = self.scene.cameras().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(camera) = self.scene.camera_mut(id) {
                camera.resize_frame(width, height)?;
            }
        }
        log::debug!("Render target resized to {}x{}", width, height);
        Ok(())
    }

    /// Run one frame and collect every camera's pass
    pub fn update_frame(&mut self, input: &InputManager) -> FrameOutput {
        let time = self.clock.tick();

        self.controllers.retain(|id, _| self.scene.camera(id).is_some());
        for (id, controller) in &mut self.controllers {
            let Some(camera) = self.scene.camera_mut(id) else {
                continue;
            };
            if controller.step(camera, input, time.delta) {
                if let Err(e) = self.scene.sync_camera_to_node(id) {
                    log::warn!("Could not write camera {:?} back to its node: {}", id, e);
                }
            }
        }

        self.scene.prune_layers(&self.layers);

        let ctx = FrameContext::new(&self.resources, &self.layers, time);
        self.scene.update_transforms(&ctx);

        let mut cameras: Vec<(ObjectId, i32)> = self
            .scene
            .cameras()
            .filter(|(id, _)| self.scene.is_effectively_enabled(*id))
            .map(|(id, camera)| (id, camera.viewport().depth))
            .collect();
        cameras.sort_by_key(|(_, depth)| *depth);

        let mut passes = Vec::with_capacity(cameras.len());
        for (id, _) in cameras {
            let Some(camera) = self.scene.camera(id) else {
                continue;
            };
            let mut uniforms = CameraUniformBuffer::default();
            camera.bind_uniforms(&mut uniforms);
            let mut commands = self.generator.generate(camera, &self.scene, &ctx);
            if self.config.culling.sort_commands {
                sort_draw_commands(&mut commands);
            }
            passes.push(CameraPass {
                camera: id,
                uniforms,
                commands,
                stats: self.generator.last_stats(),
            });
        }

        log::trace!("Frame {} produced {} camera pass(es)", time.frame_index, passes.len());
        FrameOutput { time, passes }
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RenderLayerConfig;
    use crate::input::KeyCode;
    use crate::render::viewport::Viewport;
    use approx::assert_relative_eq;

    fn manager() -> SceneManager {
        let config = EngineConfig::default().with_fixed_time_step(0.5).with_render_target(800, 600);
        SceneManager::from_config(&config).expect("valid config")
    }

    #[test]
    fn test_from_config_builds_layers() {
        let config = EngineConfig::default()
            .with_render_layers(vec![RenderLayerConfig::new("ui", 5), RenderLayerConfig::new("world", 1)]);
        let manager = SceneManager::from_config(&config).expect("valid");
        let names: Vec<_> = manager
            .layers()
            .layers()
            .iter()
            .filter_map(|id| manager.layers().get(*id))
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["world", "ui"]);

        let invalid = EngineConfig::default().with_render_target(0, 0);
        assert!(SceneManager::from_config(&invalid).is_err());
    }

    #[test]
    fn test_camera_object_keeps_its_look_at() {
        let mut manager = manager();
        let cam = manager
            .add_camera_object("main", Vec3::new(0.0, 0.0, 10.0), Vec3::zeros())
            .expect("camera");

        let output = manager.update_frame(&InputManager::new());
        let camera = manager.scene().camera(cam).expect("camera");

        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-4);
        assert_eq!(output.passes.len(), 1);
        assert_relative_eq!(output.passes[0].uniforms.viewport_width, 800.0);
        assert_relative_eq!(output.time.elapsed, 0.5);
    }

    #[test]
    fn test_controller_motion_survives_propagation() {
        let mut manager = manager();
        let cam = manager
            .add_camera_object("main", Vec3::new(0.0, 0.0, 10.0), Vec3::zeros())
            .expect("camera");

        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::Up, true);
        manager.update_frame(&input);

        // translate_speed 5 * dt 0.5
        let camera = manager.scene().camera(cam).expect("camera");
        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 7.5), epsilon = 1e-4);
        let controller = manager.controller(cam).expect("controller");
        assert_relative_eq!(controller.target(), Vec3::new(0.0, 0.0, -2.5), epsilon = 1e-4);

        input.handle_key_input(KeyCode::Up, false);
        input.end_frame();
        manager.update_frame(&input);
        let camera = manager.scene().camera(cam).expect("camera");
        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 7.5), epsilon = 1e-4);
    }

    #[test]
    fn test_passes_follow_viewport_depth_and_enabled() {
        let mut manager = manager();
        let back = manager
            .add_camera_object("back", Vec3::new(0.0, 0.0, 5.0), Vec3::zeros())
            .expect("camera");
        let front = manager
            .add_camera_object("front", Vec3::new(0.0, 5.0, 5.0), Vec3::zeros())
            .expect("camera");
        let hidden = manager
            .add_camera_object("hidden", Vec3::new(5.0, 0.0, 0.0), Vec3::zeros())
            .expect("camera");

        let overlay = Viewport::new(0.75, 0.0, 0.25, 0.25).expect("valid").with_depth(1);
        manager
            .scene_mut()
            .camera_mut(back)
            .expect("camera")
            .set_viewport(overlay)
            .expect("valid");
        manager.scene_mut().set_enabled(hidden, false).expect("live");

        let output = manager.update_frame(&InputManager::new());
        let order: Vec<_> = output.passes.iter().map(|p| p.camera).collect();
        assert_eq!(order, vec![front, back]);
        assert!(output.pass(hidden).is_none());
    }

    #[test]
    fn test_camera_under_disabled_parent_is_skipped() {
        let mut manager = manager();
        let cam = manager
            .add_camera_object("main", Vec3::new(0.0, 0.0, 10.0), Vec3::zeros())
            .expect("camera");
        let rig = manager.scene_mut().add_object("rig", TransformState::identity());
        manager.scene_mut().set_parent(cam, Some(rig)).expect("no cycle");

        assert!(manager.update_frame(&InputManager::new()).pass(cam).is_some());

        manager.scene_mut().set_enabled(rig, false).expect("live");
        let output = manager.update_frame(&InputManager::new());
        assert!(output.passes.is_empty());

        manager.scene_mut().set_enabled(rig, true).expect("live");
        assert!(manager.update_frame(&InputManager::new()).pass(cam).is_some());
    }

    #[test]
    fn test_resize_updates_cameras() {
        let mut manager = manager();
        let cam = manager
            .add_camera_object("main", Vec3::new(0.0, 0.0, 5.0), Vec3::zeros())
            .expect("camera");

        manager.resize(1000, 500).expect("valid");
        let camera = manager.scene().camera(cam).expect("camera");
        assert_relative_eq!(camera.projection().aspect_ratio(), 2.0, epsilon = 1e-6);
        assert!(manager.resize(0, 500).is_err());
    }

    #[test]
    fn test_controllers_dropped_with_their_camera() {
        let mut manager = manager();
        let cam = manager
            .add_camera_object("main", Vec3::new(0.0, 0.0, 5.0), Vec3::zeros())
            .expect("camera");
        manager.scene_mut().remove_object(cam).expect("live");

        let output = manager.update_frame(&InputManager::new());
        assert!(output.passes.is_empty());
        assert!(manager.controller(cam).is_none());
    }
}
