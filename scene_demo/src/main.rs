//! Scene demo application
//!
//! Builds a small scene of crates around a skybox, then drives the main
//! camera's controller with a scripted input sequence and logs what each
//! frame would submit. Pass a `.toml`, `.ron` or `.json` engine config path
//! as the first argument to override the defaults.

use scene_engine::foundation::logging::parse_level;
use scene_engine::prelude::*;
use scene_engine::scene::SKYBOX_SHADER;

/// One scripted frame of input
enum Step {
    Idle,
    Key(KeyCode, bool),
    Drag(MouseButton, f64, f64),
    Scroll(f64),
}

const SCRIPT: &[Step] = &[
    Step::Idle,
    Step::Key(KeyCode::Up, true),
    Step::Key(KeyCode::Up, false),
    Step::Drag(MouseButton::Left, 120.0, 0.0),
    Step::Drag(MouseButton::Right, 0.0, 40.0),
    Step::Scroll(2.0),
    Step::Drag(MouseButton::Middle, 0.0, -30.0),
    Step::Idle,
];

fn cube(name: &str, half: f32, sort_id: u16) -> Model {
    let bounds = AABB::from_center_extents(Vec3::zeros(), Vec3::new(half, half, half));
    Model::new(name).with_chunk(Mesh::new(name, bounds), Material::new(name, sort_id))
}

struct DemoScene {
    manager: SceneManager,
    camera: ObjectId,
    spinner: ObjectId,
}

impl DemoScene {
    fn build(config: &EngineConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut manager = SceneManager::from_config(config)?;

        let resources = manager.resources_mut();
        let crate_model = resources.insert_constructed("crate", ResourceKind::Model, cube("crate", 0.5, 1));
        let glass_model = resources.insert_constructed(
            "glass",
            ResourceKind::Model,
            Model::new("glass").with_chunk(
                Mesh::new("glass", AABB::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.1))),
                Material::new("glass", 2).with_transparency(TransparencyMode::Blended),
            ),
        );
        let sky_model = resources.insert_constructed("sky", ResourceKind::Model, cube("sky", 1.0, 0));
        let lit = resources.insert_constructed("lit", ResourceKind::Shader, ShaderProgram::new("lit", 1));
        resources.insert_constructed(SKYBOX_SHADER, ResourceKind::Shader, ShaderProgram::new(SKYBOX_SHADER, 0));

        // A streamed model that never finishes loading in this demo
        let streamed = resources.insert(ResourceHandle::loading("statue", ResourceKind::Model));

        let world = manager.layers().layer("world");
        let skybox_layer = manager.layers().layer("skybox");
        let scene = manager.scene_mut();

        let sky = scene.add_object("sky", TransformState::identity());
        scene.set_skybox(sky, Some(Skybox::new(sky_model)))?;
        if let Some(layer) = skybox_layer {
            scene.add_layer(sky, layer)?;
        }
        scene.set_default_skybox(Some(sky))?;

        let spinner = scene.add_object("spinner", TransformState::identity());
        for (index, x) in [-3.0_f32, 0.0, 3.0].into_iter().enumerate() {
            let id = scene.add_child_object(
                spinner,
                format!("crate.{index}"),
                TransformState::from_translation(Vec3::new(x, 0.0, 0.0)),
            )?;
            scene.set_renderable(id, Some(Renderable::new(crate_model, lit)))?;
            if let Some(layer) = world {
                scene.add_layer(id, layer)?;
            }
        }

        let window = scene.add_object("window", TransformState::from_translation(Vec3::new(0.0, 0.0, 2.0)));
        scene.set_renderable(window, Some(Renderable::new(glass_model, lit)))?;
        let statue = scene.add_object("statue", TransformState::from_translation(Vec3::new(0.0, 0.0, -4.0)));
        scene.set_renderable(statue, Some(Renderable::new(streamed, lit)))?;
        if let Some(layer) = world {
            scene.add_layer(window, layer)?;
            scene.add_layer(statue, layer)?;
        }

        let camera = manager.add_camera_object("main", Vec3::new(0.0, 2.0, 10.0), Vec3::zeros())?;
        log::info!("Scene built with {} objects", manager.scene().len());

        Ok(Self { manager, camera, spinner })
    }

    fn feed(&self, input: &mut InputManager, step: &Step) {
        let (width, height) = self.manager.render_target();
        let center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        match *step {
            Step::Idle => {}
            Step::Key(key, pressed) => input.handle_key_input(key, pressed),
            Step::Drag(button, dx, dy) => {
                input.handle_mouse_move(center.0, center.1);
                input.handle_mouse_button(button, true);
                input.handle_mouse_move(center.0 + dx, center.1 + dy);
            }
            Step::Scroll(delta) => input.handle_scroll(delta),
        }
    }

    fn release(input: &mut InputManager, step: &Step) {
        if let Step::Drag(button, ..) = *step {
            input.handle_mouse_button(button, false);
        }
        input.end_frame();
    }

    fn run(&mut self) {
        let mut input = InputManager::new();
        for (frame, step) in SCRIPT.iter().enumerate() {
            self.feed(&mut input, step);

            if let Some(spinner) = self.manager.scene_mut().transform_mut(self.spinner) {
                let angle = frame as f32 * 0.25;
                spinner.set_rotation(Quat::from_axis_angle(&Vec3::y_axis(), angle));
            }

            let output = self.manager.update_frame(&input);
            Self::release(&mut input, step);

            let Some(pass) = output.pass(self.camera) else {
                log::warn!("Frame {frame}: main camera produced no pass");
                continue;
            };
            let eye = self.manager.scene().camera(self.camera).map_or_else(Vec3::zeros, Camera::eye);
            log::info!(
                "Frame {frame} at t={:.3}s: eye ({:.2}, {:.2}, {:.2}), {} command(s), {} culled, {} not ready",
                output.time.elapsed,
                eye.x,
                eye.y,
                eye.z,
                pass.commands.len(),
                pass.stats.culled,
                pass.stats.not_ready
            );
            for command in &pass.commands {
                let layer = self
                    .manager
                    .layers()
                    .get(command.layer)
                    .map_or("?", |layer| layer.name.as_str());
                log::debug!(
                    "  {:<8} {:<10} {:?} depth {:>7.2} key {:#018x}",
                    layer,
                    command.chunk.mesh.name,
                    command.kind,
                    command.depth,
                    command.sort_key.0
                );
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default().with_fixed_time_step(1.0 / 60.0),
    };

    env_logger::Builder::from_default_env()
        .filter_level(parse_level(&config.log_level))
        .init();

    log::info!("Starting scene demo");
    let mut demo = DemoScene::build(&config)?;
    demo.run();
    log::info!("Scene demo finished");
    Ok(())
}
