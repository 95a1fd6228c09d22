//! Per-frame context
//!
//! Everything a frame pass reads that the scene graph does not own itself.

use crate::assets::ResourceCache;
use crate::foundation::time::FrameTime;
use crate::scene::render_layer::RenderLayerRegistry;

/// Shared, read-only state for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Resource lookups
    pub resources: &'a ResourceCache,
    /// Render layers in draw order
    pub layers: &'a RenderLayerRegistry,
    /// Frame timestamp
    pub time: FrameTime,
}

impl<'a> FrameContext<'a> {
    /// Bundle the frame inputs
    pub fn new(resources: &'a ResourceCache, layers: &'a RenderLayerRegistry, time: FrameTime) -> Self {
        Self { resources, layers, time }
    }
}
