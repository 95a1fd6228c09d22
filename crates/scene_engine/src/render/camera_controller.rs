//! Interactive camera controller
//!
//! Maps polled input onto the camera motions:
//!
//! | Input | Motion |
//! |---|---|
//! | arrow keys, page up/down | translate |
//! | left button drag | rotate about the target |
//! | right button drag | pan |
//! | middle button drag | tilt |
//! | scroll wheel | zoom |
//!
//! The controller owns the orbit target. Mouse motion is converted to
//! viewport-relative units before scaling.

use crate::foundation::math::{Vec2, Vec3, DEGENERATE_EPSILON};
use crate::input::{InputManager, KeyCode, MouseButton};
use crate::render::camera::Camera;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Smallest zoom step; `-1` would collapse the eye onto the target
const MIN_ZOOM_DELTA: f32 = -0.9;

bitflags! {
    /// Camera motions a controller is allowed to perform
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MovementTypes: u32 {
        /// Scroll to zoom
        const ZOOM = 1 << 0;
        /// Right drag to pan
        const PAN = 1 << 1;
        /// Middle drag to tilt
        const TILT = 1 << 2;
        /// Keys to translate
        const TRANSLATE = 1 << 3;
        /// Left drag to orbit
        const ROTATE = 1 << 4;
    }
}

impl Default for MovementTypes {
    fn default() -> Self {
        Self::all()
    }
}

/// Tunable controller response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerProfile {
    /// Enabled motions
    pub movement_types: MovementTypes,
    /// Zoom fraction per scroll notch
    pub zoom_scaling: f32,
    /// Per-axis translation factors
    pub translate_scaling: Vec3,
    /// Translation speed in world units per second
    pub translate_speed: f32,
    /// Per-axis orbit factors
    pub rotate_scaling: Vec2,
    /// Orbit speed, in half turns per viewport of drag
    pub rotate_speed: f32,
    /// Per-axis pan factors
    pub pan_scaling: Vec2,
    /// Per-axis tilt factors
    pub tilt_scaling: Vec2,
}

impl Default for ControllerProfile {
    fn default() -> Self {
        Self {
            movement_types: MovementTypes::default(),
            zoom_scaling: -0.25,
            translate_scaling: Vec3::new(1.0, 1.0, 1.0),
            translate_speed: 5.0,
            rotate_scaling: Vec2::new(1.0, -1.0),
            rotate_speed: 1.0,
            pan_scaling: Vec2::new(-1.0, 1.0),
            tilt_scaling: Vec2::new(-1.0, 1.0),
        }
    }
}

impl ControllerProfile {
    /// Builder: restrict the enabled motions
    pub fn with_movement_types(mut self, movement_types: MovementTypes) -> Self {
        self.movement_types = movement_types;
        self
    }
}

/// Drives a camera from polled input
#[derive(Debug, Clone, Default)]
pub struct CameraController {
    profile: ControllerProfile,
    target: Vec3,
}

impl CameraController {
    /// Create a controller orbiting `target`
    pub fn new(profile: ControllerProfile, target: Vec3) -> Self {
        Self { profile, target }
    }

    /// Response profile
    pub fn profile(&self) -> &ControllerProfile {
        &self.profile
    }

    /// Replace the response profile
    pub fn set_profile(&mut self, profile: ControllerProfile) {
        self.profile = profile;
    }

    /// Orbit target
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the orbit target without touching the camera
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Place the camera and target together
    pub fn look_at(&mut self, camera: &mut Camera, eye: Vec3, target: Vec3) {
        self.target = target;
        let up = camera.up_vec();
        camera.set_look_at(&eye, &target, &up);
    }

    /// Apply one frame of input; returns whether the camera moved
    pub fn step(&mut self, camera: &mut Camera, input: &InputManager, delta_time: f32) -> bool {
        if (camera.eye() - self.target).magnitude_squared() <= DEGENERATE_EPSILON {
            log::warn!("Camera eye sits on the controller target {:?}", self.target);
        }

        let before = *camera.view_matrix();
        let profile = &self.profile;
        let movement = profile.movement_types;

        let (width, height) = camera.render_target_size();
        let drag = input.mouse_delta().component_div(&Vec2::new(width.max(1) as f32, height.max(1) as f32));
        let dragging = drag != Vec2::zeros();

        if movement.contains(MovementTypes::TRANSLATE) {
            let keys = Vec3::new(
                input.axis(KeyCode::Right, KeyCode::Left),
                input.axis(KeyCode::PageUp, KeyCode::PageDown),
                input.axis(KeyCode::Up, KeyCode::Down),
            );
            if keys != Vec3::zeros() {
                let speed = profile.translate_speed * delta_time;
                camera.translate(&mut self.target, keys.component_mul(&profile.translate_scaling), speed);
            }
        }

        if dragging && movement.contains(MovementTypes::TILT) && input.is_button_down(MouseButton::Middle) {
            camera.tilt(&self.target, drag.component_mul(&profile.tilt_scaling));
        }

        if dragging && movement.contains(MovementTypes::PAN) && input.is_button_down(MouseButton::Right) {
            camera.pan(&mut self.target, drag.component_mul(&profile.pan_scaling));
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 && movement.contains(MovementTypes::ZOOM) {
            camera.zoom(&self.target, (scroll * profile.zoom_scaling).max(MIN_ZOOM_DELTA));
        }

        if dragging && movement.contains(MovementTypes::ROTATE) && input.is_button_down(MouseButton::Left) {
            camera.rotate_about_point(&self.target, drag.component_mul(&profile.rotate_scaling), profile.rotate_speed);
        }

        let moved = *camera.view_matrix() != before;
        if moved {
            log::trace!("Camera moved to {:?}, target {:?}", camera.eye(), self.target);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn setup() -> (Camera, CameraController) {
        let mut camera = Camera::new();
        camera.resize_frame(800, 600).expect("valid size");
        let mut controller = CameraController::new(ControllerProfile::default(), Vec3::zeros());
        controller.look_at(&mut camera, Vec3::new(0.0, 0.0, 10.0), Vec3::zeros());
        (camera, controller)
    }

    #[test]
    fn test_default_profile_values() {
        let profile = ControllerProfile::default();
        assert_relative_eq!(profile.zoom_scaling, -0.25);
        assert_eq!(profile.rotate_scaling, Vec2::new(1.0, -1.0));
        assert_eq!(profile.pan_scaling, Vec2::new(-1.0, 1.0));
        assert_eq!(profile.tilt_scaling, Vec2::new(-1.0, 1.0));
        assert_eq!(profile.translate_scaling, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(profile.movement_types, MovementTypes::all());
    }

    #[test]
    fn test_idle_input_does_nothing() {
        let (mut camera, mut controller) = setup();
        assert!(!controller.step(&mut camera, &InputManager::new(), 1.0 / 60.0));
    }

    #[test]
    fn test_scroll_zooms_in() {
        let (mut camera, mut controller) = setup();
        let mut input = InputManager::new();
        input.handle_scroll(1.0);

        assert!(controller.step(&mut camera, &input, 1.0 / 60.0));
        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 7.5), epsilon = EPSILON);
    }

    #[test]
    fn test_up_arrow_moves_forward() {
        let (mut camera, mut controller) = setup();
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::Up, true);

        controller.step(&mut camera, &input, 0.5);

        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 7.5), epsilon = EPSILON);
        assert_relative_eq!(controller.target(), Vec3::new(0.0, 0.0, -2.5), epsilon = EPSILON);
    }

    #[test]
    fn test_left_drag_orbits_target() {
        let (mut camera, mut controller) = setup();
        let mut input = InputManager::new();
        input.handle_mouse_button(MouseButton::Left, true);
        input.handle_mouse_move(0.0, 0.0);
        input.handle_mouse_move(400.0, 0.0);

        assert!(controller.step(&mut camera, &input, 1.0 / 60.0));

        assert_relative_eq!(camera.eye(), Vec3::new(-10.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(controller.target(), Vec3::zeros(), epsilon = EPSILON);
    }

    #[test]
    fn test_disabled_motion_is_ignored() {
        let (mut camera, mut controller) = setup();
        controller.set_profile(ControllerProfile::default().with_movement_types(MovementTypes::ROTATE));
        let mut input = InputManager::new();
        input.handle_scroll(2.0);
        input.handle_key_input(KeyCode::Left, true);

        assert!(!controller.step(&mut camera, &input, 1.0));
    }

    #[test]
    fn test_right_drag_pans_target() {
        let (mut camera, mut controller) = setup();
        let mut input = InputManager::new();
        input.handle_mouse_button(MouseButton::Right, true);
        input.handle_mouse_move(0.0, 0.0);
        input.handle_mouse_move(80.0, 0.0);

        controller.step(&mut camera, &input, 1.0 / 60.0);

        assert!(controller.target().x > 0.0);
        assert_relative_eq!(camera.eye(), Vec3::new(0.0, 0.0, 10.0), epsilon = EPSILON);
    }
}
