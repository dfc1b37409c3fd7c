//! Client-side state for A2UI surfaces.
//!
//! [`ModelProcessor`] consumes the server-to-client message stream
//! (`beginRendering`, `surfaceUpdate`, `dataModelUpdate`, `deleteSurface`)
//! and keeps, per surface, a component registry, a JSON data model and a
//! materialized component tree for a renderer to walk.

pub mod config;
pub mod data_model;
pub mod error;
pub mod path;
pub mod protocol;

mod processor;
mod surface;
mod tree;

pub use crate::config::ProcessorConfig;
pub use crate::error::{ProcessorError, Result};
pub use crate::processor::{DataContext, ModelProcessor};
pub use crate::protocol::{
    BeginRendering, ComponentInstance, DataEntry, DataModelUpdate, DeleteSurface,
    ServerToClientMessage, SurfaceUpdate, decode_messages,
};
pub use crate::surface::Surface;
pub use crate::tree::{ComponentNode, ResolvedValue, TreeBuilder};
pub use serde_json;
