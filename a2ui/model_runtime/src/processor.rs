use indexmap::IndexMap;
use log::{trace, warn};
use serde_json::Value;

use crate::config::ProcessorConfig;
use crate::data_model;
use crate::error::Result;
use crate::path;
use crate::protocol::{
    BeginRendering, DataModelUpdate, DeleteSurface, ServerToClientMessage, SurfaceUpdate, decode_messages,
};
use crate::surface::Surface;
use crate::tree::ComponentNode;

/// Anything relative data paths can be resolved against.
pub trait DataContext {
    fn data_context_path(&self) -> Option<&str>;
}

impl DataContext for ComponentNode {
    fn data_context_path(&self) -> Option<&str> {
        Some(&self.data_context_path)
    }
}

impl DataContext for &str {
    fn data_context_path(&self) -> Option<&str> {
        Some(*self)
    }
}

impl DataContext for String {
    fn data_context_path(&self) -> Option<&str> {
        Some(self)
    }
}

/// Owns every surface and applies server messages to them in order.
#[derive(Debug, Clone, Default)]
pub struct ModelProcessor {
    config: ProcessorConfig,
    surfaces: IndexMap<String, Surface>,
}

impl ModelProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        Self {
            config,
            surfaces: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &IndexMap<String, Surface> {
        &self.surfaces
    }

    pub fn surface(&self, surface_id: &str) -> Option<&Surface> {
        self.surfaces.get(surface_id)
    }

    pub fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }

    /// Applies `messages` strictly in order.
    ///
    /// Stops at the first failed tree rebuild. The failing surface is left
    /// without a tree and messages after it are not applied.
    pub fn process_messages(&mut self, messages: &[ServerToClientMessage]) -> Result<()> {
        for message in messages {
            self.process_message(message)?;
        }
        Ok(())
    }

    /// Decodes a JSON array of messages (or one bare message) and applies it.
    pub fn process_json(&mut self, payload: &[u8]) -> Result<()> {
        let messages = decode_messages(payload)?;
        self.process_messages(&messages)
    }

    pub fn process_message(&mut self, message: &ServerToClientMessage) -> Result<()> {
        match message {
            ServerToClientMessage::BeginRendering(msg) => self.handle_begin_rendering(msg),
            ServerToClientMessage::SurfaceUpdate(msg) => self.handle_surface_update(msg),
            ServerToClientMessage::DataModelUpdate(msg) => self.handle_data_model_update(msg),
            ServerToClientMessage::DeleteSurface(msg) => {
                self.handle_delete_surface(msg);
                Ok(())
            }
        }
    }

    /// Reads `path` relative to `context`. `.` or `""` read the context path
    /// itself. Never creates a surface.
    pub fn get_data(
        &self,
        context: Option<&dyn DataContext>,
        path: &str,
        surface_id: Option<&str>,
    ) -> Option<&Value> {
        let surface = self.surfaces.get(self.surface_key(surface_id))?;
        let context_path = context.and_then(|context| context.data_context_path());
        let final_path = final_data_path(path, context_path);
        data_model::get_path(&surface.data_model, &final_path)
    }

    /// Writes `value` at `path` relative to `context`, with the same map
    /// merge rule as `dataModelUpdate`. A value in `[{key, value*}, ...]`
    /// form is written as the map it describes. The tree is not rebuilt.
    pub fn set_data(
        &mut self,
        context: Option<&dyn DataContext>,
        path: &str,
        value: Value,
        surface_id: Option<&str>,
    ) {
        let Some(context) = context else {
            warn!("no component node set; ignoring write to {path}");
            return;
        };

        let final_path = final_data_path(path, context.data_context_path());
        let surface_id = self.surface_key(surface_id).to_string();
        let surface = self.surfaces.entry(surface_id).or_default();
        data_model::set_path(&mut surface.data_model, &final_path, data_model::from_key_value_list(value));
    }

    pub fn resolve_path(&self, path: &str, data_context_path: Option<&str>) -> String {
        path::resolve_path(path, data_context_path)
    }

    fn handle_begin_rendering(&mut self, msg: &BeginRendering) -> Result<()> {
        let surface_id = self.surface_key(msg.surface_id.as_deref()).to_string();
        let surface = self.surfaces.entry(surface_id.clone()).or_default();

        surface.root_component_id = Some(msg.root.clone());
        if let Some(styles) = &msg.styles {
            surface.styles = styles.clone();
        }

        trace!("beginRendering on {surface_id} with root {}", msg.root);
        surface.rebuild_component_tree(&self.config.iteration_variable)
    }

    fn handle_surface_update(&mut self, msg: &SurfaceUpdate) -> Result<()> {
        let surface_id = self.surface_key(msg.surface_id.as_deref()).to_string();
        let surface = self.surfaces.entry(surface_id.clone()).or_default();

        surface.upsert_components(&msg.components);

        if !surface.has_root() {
            return Ok(());
        }

        trace!("surfaceUpdate on {surface_id}; rebuilding tree");
        surface.rebuild_component_tree(&self.config.iteration_variable)
    }

    fn handle_data_model_update(&mut self, msg: &DataModelUpdate) -> Result<()> {
        let surface_id = self.surface_key(msg.surface_id.as_deref()).to_string();
        let surface = self.surfaces.entry(surface_id.clone()).or_default();

        let base_path = msg.path.as_deref().unwrap_or(path::ROOT_PATH);
        data_model::apply_contents(&mut surface.data_model, base_path, &msg.contents);

        if !surface.has_root() || surface.components.is_empty() {
            return Ok(());
        }

        trace!("dataModelUpdate on {surface_id} at {base_path}; rebuilding tree");
        surface.rebuild_component_tree(&self.config.iteration_variable)
    }

    fn handle_delete_surface(&mut self, msg: &DeleteSurface) {
        let surface_id = self.surface_key(msg.surface_id.as_deref()).to_string();
        if self.surfaces.shift_remove(&surface_id).is_none() {
            trace!("deleteSurface for unknown surface {surface_id}");
        }
    }

    fn surface_key<'a>(&'a self, surface_id: Option<&'a str>) -> &'a str {
        surface_id.unwrap_or(&self.config.default_surface_id)
    }
}

fn final_data_path(path: &str, context_path: Option<&str>) -> String {
    if path == "." || path.is_empty() {
        return context_path.unwrap_or(path::ROOT_PATH).to_string();
    }
    path::resolve_path(&path::normalize(path), context_path)
}
