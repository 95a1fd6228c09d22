//! Engine error types

use crate::foundation::collections::{NodeId, ObjectId};

/// Errors raised while configuring cameras, projections and viewports
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Projection parameters would produce a singular or inverted matrix
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// Viewport rectangle outside the normalized range
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// The scene object carries no camera component
    #[error("Object {0:?} has no camera")]
    NoCamera(ObjectId),
}

/// Errors raised by scene graph and transform hierarchy mutations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The requested parent link would create a cycle or self-parenting
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Transform node key is stale or was never issued
    #[error("Transform node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Scene object key is stale or was never issued
    #[error("Scene object not found: {0:?}")]
    ObjectNotFound(ObjectId),

    /// A render layer with this name already exists
    #[error("Render layer '{0}' already exists")]
    DuplicateLayer(String),

    /// No render layer with this name
    #[error("Render layer '{0}' not found")]
    LayerNotFound(String),

    /// Camera configuration error
    #[error(transparent)]
    Camera(#[from] CameraError),
}
