use indexmap::IndexMap;
use log::trace;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data_model;
use crate::error::Result;
use crate::protocol::ComponentInstance;
use crate::tree::{ComponentNode, TreeBuilder};

/// One independently rendered UI region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    pub root_component_id: Option<String>,
    pub component_tree: Option<ComponentNode>,
    pub data_model: Value,
    pub components: IndexMap<String, ComponentInstance>,
    pub styles: Map<String, Value>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            root_component_id: None,
            component_tree: None,
            data_model: data_model::empty_data_model(),
            components: IndexMap::new(),
            styles: Map::new(),
        }
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces definitions by id.
    pub fn upsert_components(&mut self, components: &[ComponentInstance]) {
        for component in components {
            self.components.insert(component.id.clone(), component.clone());
        }
    }

    pub fn has_root(&self) -> bool {
        self.root_component_id.is_some()
    }

    /// Replaces the component tree with a fresh build. On error the tree is
    /// left empty.
    pub fn rebuild_component_tree(&mut self, iteration_variable: &str) -> Result<()> {
        self.component_tree = None;

        let Some(root_id) = self.root_component_id.as_deref() else {
            return Ok(());
        };

        trace!("building component tree from root {root_id}");
        let tree = TreeBuilder::new(&self.components, &self.data_model, iteration_variable).build(root_id)?;
        self.component_tree = tree;
        Ok(())
    }
}
