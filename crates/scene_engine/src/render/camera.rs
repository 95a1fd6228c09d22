//! # 3D Camera
//!
//! A camera owns a view matrix, one [`Projection`], a [`Viewport`] and the
//! [`Frustum`] derived from them. Every mutation refreshes the derived state
//! before returning, so the frustum always matches the current view and
//! projection.
//!
//! ## Coordinate System
//! Right-handed, Y-up. The camera looks down its local -Z axis; rows of the
//! view matrix are the camera's right, up and backward axes in world space.
//! Clip space follows OpenGL conventions (`z` in `[-1, 1]`).
//!
//! ## Motions
//! The orbit-style motions ([`Camera::zoom`], [`Camera::pan`],
//! [`Camera::tilt`], [`Camera::translate`], [`Camera::rotate_about_point`])
//! all work relative to a target point held by the caller, usually the
//! [`CameraController`](crate::render::CameraController).

use crate::error::CameraError;
use crate::foundation::collections::{KeyList, LayerId, ObjectId};
use crate::foundation::math::{constants, utils, Mat4, Mat4Ext, Vec2, Vec3, Vec4, DEGENERATE_EPSILON};
use crate::render::projection::Projection;
use crate::render::uniforms::CameraUniformBuffer;
use crate::render::viewport::Viewport;
use crate::scene::bounds::{BoundingSphere, Ray, AABB};
use crate::scene::frustum::Frustum;
use crate::scene::render_layer::{RenderLayerRegistry, DEFAULT_LAYERS};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-camera rendering switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CameraOptions: u32 {
        /// Skip draws whose bounds fall outside the frustum
        const FRUSTUM_CULLING = 1 << 0;
        /// Reserved for renderers with occlusion queries
        const OCCLUSION_CULLING = 1 << 1;
        /// Draw every registered layer instead of the subscribed ones
        const SHOW_ALL_RENDER_LAYERS = 1 << 2;
        /// Run the post-processing chain after this camera
        const ENABLE_POST_PROCESSING = 1 << 3;
        /// Render a depth-only pass first
        const USE_Z_BUFFER_PASS = 1 << 4;
    }
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self::FRUSTUM_CULLING
    }
}

/// Scene camera
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    inv_view_matrix: Mat4,
    projection: Projection,
    projection_matrix: Mat4,
    inv_projection_matrix: Mat4,
    viewport: Viewport,
    render_target: (u32, u32),
    frustum: Frustum,
    options: CameraOptions,
    render_layers: KeyList<LayerId>,
    skybox: Option<ObjectId>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Create a camera at the origin looking down -Z with the default projection
    pub fn new() -> Self {
        let projection = Projection::default();
        let mut camera = Self {
            view_matrix: Mat4::identity(),
            inv_view_matrix: Mat4::identity(),
            projection,
            projection_matrix: projection.matrix(),
            inv_projection_matrix: Mat4::identity(),
            viewport: Viewport::full(),
            render_target: (1, 1),
            frustum: Frustum::default(),
            options: CameraOptions::default(),
            render_layers: KeyList::new(),
            skybox: None,
        };
        camera.refresh_projection();
        camera
    }

    /// Create a camera with the given projection
    pub fn with_projection(projection: Projection) -> Result<Self, CameraError> {
        let mut camera = Self::new();
        camera.set_projection(projection)?;
        Ok(camera)
    }

    /// Builder form of [`Camera::set_look_at`]
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.set_look_at(&eye, &target, &up);
        self
    }

    /// Builder form of [`Camera::set_options`]
    pub fn with_options(mut self, options: CameraOptions) -> Self {
        self.options = options;
        self
    }

    // --- View -------------------------------------------------------------

    /// Point the camera from `eye` at `target`
    ///
    /// If `up` is parallel to the view direction the world axis least aligned
    /// with it is used instead. If `eye` equals `target` the view is left
    /// unchanged. Both cases log a warning.
    pub fn set_look_at(&mut self, eye: &Vec3, target: &Vec3, up: &Vec3) {
        let direction = eye - target;
        if direction.magnitude_squared() <= DEGENERATE_EPSILON {
            log::warn!("Camera eye coincides with target at {:?}, view unchanged", eye);
            return;
        }

        let view = Mat4::try_look_at_rh(eye, target, up).or_else(|| {
            let fallback = utils::least_aligned_axis(&direction);
            log::warn!(
                "Camera up {:?} is parallel to the view direction, substituting {:?}",
                up, fallback
            );
            Mat4::try_look_at_rh(eye, target, &fallback)
        });

        match view {
            Some(view) => self.set_view(view),
            None => log::warn!("Could not build a view matrix for eye {:?}, view unchanged", eye),
        }
    }

    /// Derive the view from the world matrix of the node carrying the camera
    ///
    /// Scale and shear are discarded; the camera looks down the node's -Z axis.
    pub fn set_from_world_matrix(&mut self, world: &Mat4) {
        let eye = utils::translation_of(world);
        let backward = Vec3::new(world.m13, world.m23, world.m33);
        let up = Vec3::new(world.m12, world.m22, world.m32);
        match utils::try_normalize(&backward) {
            Some(backward) => self.set_look_at(&eye, &(eye - backward), &up),
            None => log::warn!("Camera node has a degenerate world matrix, view unchanged"),
        }
    }

    fn set_view(&mut self, view: Mat4) {
        self.view_matrix = view;
        self.inv_view_matrix = view.try_inverse().unwrap_or_else(|| {
            log::warn!("Camera view matrix is singular");
            Mat4::identity()
        });
        self.update_frustum();
    }

    /// World to view matrix
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// View to world matrix, the camera's own world transform
    pub fn inv_view_matrix(&self) -> &Mat4 {
        &self.inv_view_matrix
    }

    /// Eye position in world space
    pub fn eye(&self) -> Vec3 {
        utils::translation_of(&self.inv_view_matrix)
    }

    /// Camera right axis in world space
    pub fn right_vec(&self) -> Vec3 {
        Vec3::new(self.view_matrix.m11, self.view_matrix.m12, self.view_matrix.m13)
    }

    /// Camera up axis in world space
    pub fn up_vec(&self) -> Vec3 {
        Vec3::new(self.view_matrix.m21, self.view_matrix.m22, self.view_matrix.m23)
    }

    /// Camera backward axis (+Z of view space) in world space
    ///
    /// This points from the target towards the eye.
    pub fn forward_vec(&self) -> Vec3 {
        Vec3::new(self.view_matrix.m31, self.view_matrix.m32, self.view_matrix.m33)
    }

    /// Direction the camera looks in
    pub fn view_direction(&self) -> Vec3 {
        -self.forward_vec()
    }

    // --- Projection and viewport ---------------------------------------------

    /// Current projection
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Replace the projection
    pub fn set_projection(&mut self, projection: Projection) -> Result<(), CameraError> {
        projection.validate()?;
        self.projection = projection;
        self.refresh_projection();
        Ok(())
    }

    /// View to clip matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Clip to view matrix
    pub fn inv_projection_matrix(&self) -> &Mat4 {
        &self.inv_projection_matrix
    }

    /// World to clip matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Current viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replace the viewport
    ///
    /// A perspective aspect ratio follows the new viewport's pixel size.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), CameraError> {
        viewport.validate()?;
        self.viewport = viewport;
        let (width, height) = self.render_target;
        self.resize_frame(width, height)
    }

    /// Pixel size of the render target the viewport maps onto
    pub fn render_target_size(&self) -> (u32, u32) {
        self.render_target
    }

    /// React to a render-target resize
    ///
    /// Perspective projections take the aspect ratio of the viewport's pixel
    /// rectangle; orthographic projections are unchanged.
    pub fn resize_frame(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidProjection(format!(
                "render target {width}x{height} has no area"
            )));
        }
        let (vw, vh) = self.viewport.resize_frame_buffer(width, height);
        let projection = self.projection.resized(vw, vh)?;
        self.render_target = (width, height);
        if projection != self.projection {
            log::trace!("Camera aspect ratio now {:.3}", projection.aspect_ratio());
            self.projection = projection;
            self.refresh_projection();
        }
        Ok(())
    }

    fn refresh_projection(&mut self) {
        self.projection_matrix = self.projection.matrix();
        self.inv_projection_matrix = self.projection_matrix.try_inverse().unwrap_or_else(|| {
            log::warn!("Projection matrix is singular");
            Mat4::identity()
        });
        self.update_frustum();
    }

    // --- Culling -------------------------------------------------------------

    /// Re-extract the frustum from the current view and projection
    pub fn update_frustum(&mut self) {
        self.frustum.initialize(&self.view_matrix, &self.projection_matrix);
    }

    /// World-space frustum
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Whether a world-space box is at least partially inside the frustum
    pub fn can_see(&self, aabb: &AABB) -> bool {
        self.frustum.intersects_aabb(aabb)
    }

    /// Whether a world-space sphere is at least partially inside the frustum
    pub fn can_see_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.frustum.intersects_sphere(sphere)
    }

    /// Eight frustum corners in world space, near plane first
    pub fn world_frustum_points(&self) -> [Vec3; 8] {
        let inv_vp = self.inv_view_matrix * self.inv_projection_matrix;
        let mut points = [Vec3::zeros(); 8];
        let mut i = 0;
        for z in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for x in [-1.0, 1.0] {
                    let p = inv_vp * Vec4::new(x, y, z, 1.0);
                    points[i] = p.xyz() / p.w;
                    i += 1;
                }
            }
        }
        points
    }

    /// Distance of a world position in front of the camera along the view direction
    pub fn depth(&self, position: &Vec3) -> f32 {
        (position - self.eye()).dot(&self.view_direction())
    }

    // --- Motions -------------------------------------------------------------

    /// Move the eye towards (`delta < 0`) or away from (`delta > 0`) the target
    pub fn zoom(&mut self, target: &Vec3, delta: f32) {
        let eye = target + (self.eye() - target) * (delta + 1.0);
        let up = self.up_vec();
        self.set_look_at(&eye, target, &up);
    }

    /// Slide the target across the view plane, keeping the eye fixed
    ///
    /// `move_delta` is in viewport-sized units.
    pub fn pan(&mut self, target: &mut Vec3, move_delta: Vec2) {
        let eye = self.eye();
        let up = self.up_vec();
        let length = match self.projection {
            Projection::Perspective { fov_y, .. } => {
                2.0 * (*target - eye).magnitude() * (utils::deg_to_rad(fov_y) * 0.5).tan()
            }
            Projection::Orthographic { bottom, top, .. } => (top - bottom).abs(),
        };
        let Some(dir_y) = utils::try_normalize(&up.cross(&(*target - eye))) else {
            return;
        };
        let aspect = self.projection.aspect_ratio();
        *target += dir_y * move_delta.x * length * aspect + up * move_delta.y * length;
        self.set_look_at(&eye, target, &up);
    }

    /// Roll the up vector towards the right axis
    pub fn tilt(&mut self, target: &Vec3, move_delta: Vec2) {
        let up = self.up_vec() + self.right_vec() * move_delta.x;
        let Some(up) = utils::try_normalize(&up) else {
            return;
        };
        let eye = self.eye();
        self.set_look_at(&eye, target, &up);
    }

    /// Move eye and target together along the camera axes
    ///
    /// `x` moves right, `y` moves up and `z` moves along the view direction.
    pub fn translate(&mut self, target: &mut Vec3, move_delta: Vec3, speed: f32) {
        let dir_x = self.up_vec();
        let Some(dir_y) = utils::try_normalize(&dir_x.cross(&self.forward_vec())) else {
            return;
        };
        let Some(dir_z) = utils::try_normalize(&dir_x.cross(&dir_y)) else {
            return;
        };
        let delta = (dir_y * move_delta.x + dir_x * move_delta.y + dir_z * move_delta.z) * speed;
        let eye = self.eye() + delta;
        *target += delta;
        self.set_look_at(&eye, target, &dir_x);
    }

    /// Orbit the eye around the target
    ///
    /// Horizontal motion yaws about the up axis, vertical motion pitches about
    /// the camera's horizontal axis. Both axes come from the pose before the
    /// motion. A full unit of motion is half a turn at `speed == 1`.
    pub fn rotate_about_point(&mut self, target: &Vec3, mouse_delta: Vec2, speed: f32) {
        let up = self.up_vec();
        let eye = self.eye();
        let Some(dir_y) = utils::try_normalize(&up.cross(&(target - eye))) else {
            return;
        };
        let yaw = -mouse_delta.x * constants::PI * speed;
        let pitch = mouse_delta.y * constants::PI * speed;

        let eye = utils::rotate_about_point(&eye, target, &up, yaw);
        let eye = utils::rotate_about_point(&eye, target, &dir_y, pitch);
        let rotated_up = utils::rotate_about_point(&(target + up), target, &dir_y, pitch) - target;
        let up = utils::try_normalize(&rotated_up).unwrap_or(up);

        self.set_look_at(&eye, target, &up);
    }

    // --- Widget mapping ------------------------------------------------------

    /// Widget pixel (origin top-left) plus depth-buffer value in [0, 1] to world space
    pub fn widget_to_world_space(&self, widget_point: Vec2, depth: f32) -> Option<Vec3> {
        let (w, h) = self.render_target;
        let clip = self.viewport.widget_to_clip(widget_point, w, h);
        let p = self.inv_view_matrix * self.inv_projection_matrix * Vec4::new(clip.x, clip.y, depth * 2.0 - 1.0, 1.0);
        if p.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(p.xyz() / p.w)
    }

    /// World position to widget pixel (origin top-left) plus depth-buffer value
    ///
    /// Returns `None` for points behind a perspective camera.
    pub fn world_to_widget_space(&self, world: &Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * world.push(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let (w, h) = self.render_target;
        let widget = self.viewport.clip_to_widget(ndc.xy(), w, h);
        Some(Vec3::new(widget.x, widget.y, (ndc.z + 1.0) * 0.5))
    }

    /// World-space direction of the pick ray through a widget pixel
    pub fn widget_to_ray_direction(&self, widget_point: Vec2) -> Vec3 {
        let (w, h) = self.render_target;
        let clip = self.viewport.widget_to_clip(widget_point, w, h);
        let coords = self.inv_projection_matrix * Vec4::new(clip.x, clip.y, -1.0, 1.0);
        let ray_eye = Vec4::new(coords.x, coords.y, -1.0, 0.0);
        let direction = (self.inv_view_matrix * ray_eye).xyz();
        utils::try_normalize(&direction).unwrap_or_else(|| self.view_direction())
    }

    /// Pick ray through a widget pixel
    ///
    /// Perspective rays start at the eye; orthographic rays start on the near plane.
    pub fn widget_to_ray(&self, widget_point: Vec2) -> Ray {
        if self.projection.is_perspective() {
            return Ray::new(self.eye(), self.widget_to_ray_direction(widget_point));
        }
        let origin = self.widget_to_world_space(widget_point, 0.0).unwrap_or_else(|| self.eye());
        Ray::new(origin, self.view_direction())
    }

    // --- Uniforms ------------------------------------------------------------

    /// Write this camera's state into the shared camera block
    pub fn bind_uniforms(&self, buffer: &mut CameraUniformBuffer) {
        let (w, h) = self.render_target;
        let rect = self.viewport.gl_viewport(w, h);
        buffer.view_matrix = self.view_matrix;
        buffer.projection_matrix = self.projection_matrix;
        buffer.inv_view_matrix = self.inv_view_matrix;
        buffer.inv_projection_matrix = self.inv_projection_matrix;
        buffer.view_projection_matrix = self.view_projection_matrix();
        buffer.eye_position = self.eye();
        buffer.z_near = self.projection.near();
        buffer.z_far = self.projection.far();
        buffer.viewport_width = rect.width as f32;
        buffer.viewport_height = rect.height as f32;
        buffer.screen_percentage = self.viewport.screen_percentage();
    }

    // --- Options and layers --------------------------------------------------

    /// Option flags
    pub fn options(&self) -> CameraOptions {
        self.options
    }

    /// Replace the option flags
    pub fn set_options(&mut self, options: CameraOptions) {
        self.options = options;
    }

    /// Toggle one option
    pub fn set_option(&mut self, option: CameraOptions, enabled: bool) {
        self.options.set(option, enabled);
    }

    /// Whether an option is on
    pub fn has_option(&self, option: CameraOptions) -> bool {
        self.options.contains(option)
    }

    /// Subscribe to a layer
    pub fn add_render_layer(&mut self, layer: LayerId) -> bool {
        self.render_layers.insert(layer)
    }

    /// Unsubscribe from a layer
    pub fn remove_render_layer(&mut self, layer: LayerId) -> bool {
        self.render_layers.remove(layer)
    }

    /// Whether the camera subscribes to a layer
    pub fn has_render_layer(&self, layer: LayerId) -> bool {
        self.render_layers.contains(layer)
    }

    /// Subscribed layers in subscription order, possibly including stale keys
    pub fn render_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.render_layers.iter()
    }

    /// Subscribe to every built-in layer present in the registry
    pub fn subscribe_default_layers(&mut self, registry: &RenderLayerRegistry) {
        for (name, _) in DEFAULT_LAYERS {
            if let Some(id) = registry.layer(name) {
                self.render_layers.insert(id);
            }
        }
    }

    /// Forget subscriptions to deleted layers, returning how many were dropped
    pub fn prune_render_layers(&mut self, registry: &RenderLayerRegistry) -> usize {
        let dropped = self.render_layers.retain_live(|id| registry.contains(id));
        if dropped > 0 {
            log::debug!("Camera dropped {} stale render layer subscription(s)", dropped);
        }
        dropped
    }

    /// Layers this camera draws, in registry order
    pub fn active_render_layers(&self, registry: &RenderLayerRegistry) -> Vec<LayerId> {
        if self.has_option(CameraOptions::SHOW_ALL_RENDER_LAYERS) {
            registry.layers().to_vec()
        } else {
            registry.sorted(self.render_layers.iter())
        }
    }

    /// Camera-specific skybox object
    pub fn skybox(&self) -> Option<ObjectId> {
        self.skybox
    }

    /// Set or clear the camera-specific skybox
    pub fn set_skybox(&mut self, skybox: Option<ObjectId>) {
        self.skybox = skybox;
    }

    // --- Persistence ---------------------------------------------------------

    /// Snapshot of the persistent settings
    pub fn settings(&self, registry: &RenderLayerRegistry) -> CameraSettings {
        let eye = self.eye();
        CameraSettings {
            eye,
            target: eye + self.view_direction(),
            up: self.up_vec(),
            projection: self.projection,
            viewport: self.viewport,
            options: self.options,
            render_layers: self
                .render_layers
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|layer| layer.name.clone())
                .collect(),
        }
    }

    /// Rebuild a camera from saved settings
    ///
    /// Layer names missing from the registry are dropped with a warning.
    pub fn from_settings(settings: &CameraSettings, registry: &RenderLayerRegistry) -> Result<Self, CameraError> {
        let mut camera = Self::with_projection(settings.projection)?;
        settings.viewport.validate()?;
        camera.viewport = settings.viewport;
        camera.set_options(settings.options);
        camera.set_look_at(&settings.eye, &settings.target, &settings.up);
        for id in registry.resolve_names(settings.render_layers.iter().map(String::as_str)) {
            camera.add_render_layer(id);
        }
        Ok(camera)
    }
}

/// Persistent camera state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Eye position
    pub eye: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Up hint
    pub up: Vec3,
    /// Projection
    pub projection: Projection,
    /// Viewport
    pub viewport: Viewport,
    /// Option flags
    pub options: CameraOptions,
    /// Subscribed layers by name
    pub render_layers: Vec<String>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: Vec3::zeros(),
            target: -Vec3::z(),
            up: Vec3::y(),
            projection: Projection::default(),
            viewport: Viewport::full(),
            options: CameraOptions::default(),
            render_layers: DEFAULT_LAYERS.iter().map(|(name, _)| (*name).to_string()).collect(),
        }
    }
}

impl crate::config::Config for CameraSettings {}
