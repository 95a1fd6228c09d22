//! Skybox emission rules

use super::*;
use crate::foundation::math::utils::translation_of;
use crate::render::draw_command::DrawKind;

fn skybox_commands(commands: &[DrawCommand]) -> Vec<&DrawCommand> {
    commands.iter().filter(|c| c.kind == DrawKind::Skybox).collect()
}

#[test]
fn test_skybox_ignores_frustum() {
    let mut fx = Fixture::new();
    let sky = fx.add_skybox(fx.skybox);
    fx.scene.set_default_skybox(Some(sky)).expect("has skybox");

    let commands = fx.run();

    // The object sits behind the camera, well past the far plane
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].object, sky);
    assert_eq!(commands[0].kind, DrawKind::Skybox);
    assert_eq!(commands[0].layer, fx.skybox);
    assert_eq!(fx.generator.last_stats().culled, 0);
}

#[test]
fn test_skybox_follows_the_eye() {
    let mut fx = Fixture::new();
    let sky = fx.add_skybox(fx.skybox);
    fx.scene.set_default_skybox(Some(sky)).expect("has skybox");

    let first = fx.run();
    let world = first[0].world_matrix().expect("world matrix");
    assert_eq!(translation_of(world), fx.camera.eye());

    fx.camera.set_look_at(&Vec3::new(3.0, 1.0, 4.0), &Vec3::zeros(), &Vec3::y());
    let second = fx.run();
    let world = second[0].world_matrix().expect("world matrix");
    approx::assert_relative_eq!(translation_of(world), Vec3::new(3.0, 1.0, 4.0), epsilon = 1e-5);
    assert_eq!(second[0].shader.name, SKYBOX_SHADER);
}

#[test]
fn test_one_skybox_after_layer_objects() {
    let mut fx = Fixture::new();
    let sky = fx.add_skybox(fx.world);
    fx.scene.set_default_skybox(Some(sky)).expect("has skybox");
    let a = fx.add_cube("a", Vec3::new(-1.0, 0.0, 0.0), fx.world);
    let b = fx.add_cube("b", Vec3::new(1.0, 0.0, 0.0), fx.world);
    let hud = fx.add_cube("hud", Vec3::zeros(), fx.ui);

    let commands = fx.run();
    let drawn: Vec<_> = commands.iter().map(|c| (c.object, c.kind)).collect();

    assert_eq!(
        drawn,
        vec![(a, DrawKind::Mesh), (b, DrawKind::Mesh), (sky, DrawKind::Skybox), (hud, DrawKind::Mesh)]
    );
    assert_eq!(skybox_commands(&commands).len(), 1);
}

#[test]
fn test_camera_skybox_overrides_scene_default() {
    let mut fx = Fixture::new();
    let scene_sky = fx.add_skybox(fx.skybox);
    let camera_sky = fx.add_skybox(fx.skybox);
    fx.scene.set_default_skybox(Some(scene_sky)).expect("has skybox");

    fx.camera.set_skybox(Some(camera_sky));
    let commands = fx.run();
    let skies = skybox_commands(&commands);
    assert_eq!(skies.len(), 1);
    assert_eq!(skies[0].object, camera_sky);

    // A removed camera skybox hides the scene default too
    fx.scene.remove_object(camera_sky).expect("live");
    assert!(skybox_commands(&fx.run()).is_empty());

    // Clearing the camera's choice brings the scene default back
    fx.camera.set_skybox(None);
    let commands = fx.run();
    let skies = skybox_commands(&commands);
    assert_eq!(skies.len(), 1);
    assert_eq!(skies[0].object, scene_sky);
}

#[test]
fn test_skybox_needs_enabled_and_layer() {
    let mut fx = Fixture::new();
    let sky = fx.add_skybox(fx.skybox);
    fx.scene.set_default_skybox(Some(sky)).expect("has skybox");

    fx.scene.set_enabled(sky, false).expect("live");
    assert!(skybox_commands(&fx.run()).is_empty());

    fx.scene.set_enabled(sky, true).expect("live");
    fx.scene.remove_layer(sky, fx.skybox).expect("live");
    assert!(skybox_commands(&fx.run()).is_empty());

    fx.scene.add_layer(sky, fx.skybox).expect("live");
    fx.camera.remove_render_layer(fx.skybox);
    assert!(skybox_commands(&fx.run()).is_empty());
}

#[test]
fn test_skybox_waits_for_its_shader() {
    let mut fx = Fixture::new();
    let model = fx
        .resources
        .insert_constructed("sky", ResourceKind::Model, cube_model("sky"));
    let sky = fx.scene.add_object("sky", TransformState::identity());
    fx.scene
        .set_skybox(sky, Some(Skybox::new(model).with_shader("stars")))
        .expect("live");
    fx.scene.add_layer(sky, fx.skybox).expect("live");
    fx.scene.set_default_skybox(Some(sky)).expect("has skybox");

    assert!(fx.run().is_empty());

    fx.resources
        .insert_constructed("stars", ResourceKind::Shader, ShaderProgram::new("stars", 0));
    let commands = fx.run();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].shader.name, "stars");
}

#[test]
fn test_skybox_objects_never_draw_as_meshes() {
    let mut fx = Fixture::new();
    // Tagged but not selected as any skybox
    fx.add_skybox(fx.world);
    fx.add_cube("crate", Vec3::zeros(), fx.world);

    let commands = fx.run();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, DrawKind::Mesh);
}
