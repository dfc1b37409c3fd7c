//! Component tree materialization.
//!
//! The tree is rebuilt from scratch from the component registry and the
//! data model. `path` bindings are recorded, not read: a renderer resolves
//! them against each node's `dataContextPath` when it paints.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data_model;
use crate::error::{ProcessorError, Result};
use crate::path;
use crate::protocol::ComponentInstance;

/// A materialized component. Template instances carry composite ids such as
/// `item-template:0` or `activity-text:1:0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub data_context_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub properties: IndexMap<String, ResolvedValue>,
}

impl ComponentNode {
    pub fn property(&self, name: &str) -> Option<&ResolvedValue> {
        self.properties.get(name)
    }

    /// Child nodes held by a property, whether it is a single `child` or a
    /// `children` list.
    pub fn child_nodes(&self, property: &str) -> Vec<&ComponentNode> {
        match self.property(property) {
            Some(ResolvedValue::Node(node)) => vec![&**node],
            Some(ResolvedValue::List(items)) => items.iter().filter_map(ResolvedValue::as_node).collect(),
            _ => Vec::new(),
        }
    }

    /// Plain JSON form, handy for snapshots and comparisons.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Node(Box<ComponentNode>),
    List(Vec<ResolvedValue>),
    Map(IndexMap<String, ResolvedValue>),
    Literal(Value),
}

impl ResolvedValue {
    pub fn as_node(&self) -> Option<&ComponentNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ResolvedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ResolvedValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// The recorded binding of a `{"path": ...}` value.
    pub fn bound_path(&self) -> Option<&str> {
        self.as_map()?.get("path")?.as_literal()?.as_str()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Where the node being built sits: its id suffix from enclosing template
/// instances and the data context its relative bindings resolve against.
#[derive(Clone, Copy)]
struct Scope<'s> {
    id_suffix: &'s str,
    data_context_path: &'s str,
}

pub struct TreeBuilder<'a> {
    components: &'a IndexMap<String, ComponentInstance>,
    data_model: &'a Value,
    iteration_variable: &'a str,
    in_progress: HashSet<(String, String)>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        components: &'a IndexMap<String, ComponentInstance>,
        data_model: &'a Value,
        iteration_variable: &'a str,
    ) -> Self {
        Self {
            components,
            data_model,
            iteration_variable,
            in_progress: HashSet::new(),
        }
    }

    /// Builds the tree under `root_id`. `Ok(None)` when the root component
    /// has not been registered yet.
    pub fn build(mut self, root_id: &str) -> Result<Option<ComponentNode>> {
        let scope = Scope {
            id_suffix: "",
            data_context_path: path::ROOT_PATH,
        };
        self.build_node(root_id, scope)
    }

    fn build_node(&mut self, component_id: &str, scope: Scope<'_>) -> Result<Option<ComponentNode>> {
        let components = self.components;
        let Some(instance) = components.get(component_id) else {
            debug!("component {component_id} is not registered; skipping");
            return Ok(None);
        };

        let Some((component_type, raw_properties)) = instance.definition() else {
            debug!("component {component_id} has no definition; skipping");
            return Ok(None);
        };

        let node_id = format!("{component_id}{}", scope.id_suffix);

        // Same component at the same data context on the active path can
        // only expand forever.
        let marker = (component_id.to_string(), scope.data_context_path.to_string());
        if !self.in_progress.insert(marker.clone()) {
            return Err(ProcessorError::circular(node_id));
        }

        let resolved = match raw_properties {
            Value::Object(props) => self.resolve_object(props, scope),
            _ => Ok(IndexMap::new()),
        };

        self.in_progress.remove(&marker);

        Ok(Some(ComponentNode {
            id: node_id,
            component_type: component_type.to_string(),
            data_context_path: scope.data_context_path.to_string(),
            weight: instance.weight,
            properties: resolved?,
        }))
    }

    fn resolve_value(&mut self, value: &Value, scope: Scope<'_>) -> Result<ResolvedValue> {
        match value {
            Value::String(candidate) if self.components.contains_key(candidate) => {
                match self.build_node(candidate, scope)? {
                    Some(node) => Ok(ResolvedValue::Node(Box::new(node))),
                    None => Ok(ResolvedValue::Literal(value.clone())),
                }
            }
            Value::Object(map) if is_component_array_reference(map) => {
                self.resolve_children(map, scope).map(ResolvedValue::List)
            }
            Value::Object(map) => self.resolve_object(map, scope).map(ResolvedValue::Map),
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve_value(item, scope)?);
                }
                Ok(ResolvedValue::List(resolved))
            }
            _ => Ok(ResolvedValue::Literal(value.clone())),
        }
    }

    fn resolve_object(
        &mut self,
        map: &Map<String, Value>,
        scope: Scope<'_>,
    ) -> Result<IndexMap<String, ResolvedValue>> {
        let in_data_context = !path::is_root(scope.data_context_path);
        let mut resolved = IndexMap::with_capacity(map.len());

        for (key, entry) in map {
            let value = match entry {
                Value::String(binding) if key == "path" && in_data_context => ResolvedValue::Literal(
                    Value::String(path::trim_contextual_path(binding, self.iteration_variable)),
                ),
                _ => self.resolve_value(entry, scope)?,
            };
            resolved.insert(key.clone(), value);
        }

        Ok(resolved)
    }

    fn resolve_children(
        &mut self,
        reference: &Map<String, Value>,
        scope: Scope<'_>,
    ) -> Result<Vec<ResolvedValue>> {
        if let Some(Value::Array(ids)) = reference.get("explicitList") {
            let mut children = Vec::with_capacity(ids.len());
            for id in ids.iter().filter_map(Value::as_str) {
                if let Some(node) = self.build_node(id, scope)? {
                    children.push(ResolvedValue::Node(Box::new(node)));
                }
            }
            return Ok(children);
        }

        let Some(template) = reference.get("template").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let component_id = template.get("componentId").and_then(Value::as_str);
        let binding = template.get("dataBinding").and_then(Value::as_str);
        match (component_id, binding) {
            (Some(component_id), Some(binding)) => self.expand_template(component_id, binding, scope),
            _ => {
                debug!("template reference without componentId or dataBinding: {template:?}");
                Ok(Vec::new())
            }
        }
    }

    fn expand_template(
        &mut self,
        component_id: &str,
        binding: &str,
        scope: Scope<'_>,
    ) -> Result<Vec<ResolvedValue>> {
        let binding_path = path::resolve_path(&path::normalize(binding), Some(scope.data_context_path));

        let keys: Vec<String> = match data_model::get_path(self.data_model, &binding_path) {
            Some(Value::Array(items)) => (0..items.len()).map(|index| index.to_string()).collect(),
            Some(Value::Object(entries)) => entries.keys().cloned().collect(),
            _ => {
                trace!("no list or map at {binding_path} for template {component_id}");
                return Ok(Vec::new());
            }
        };

        let mut children = Vec::with_capacity(keys.len());
        for key in keys {
            let id_suffix = format!("{}:{key}", scope.id_suffix);
            let data_context_path = path::join(&binding_path, &key);
            let child_scope = Scope {
                id_suffix: &id_suffix,
                data_context_path: &data_context_path,
            };

            if let Some(node) = self.build_node(component_id, child_scope)? {
                children.push(ResolvedValue::Node(Box::new(node)));
            }
        }

        Ok(children)
    }
}

fn is_component_array_reference(map: &Map<String, Value>) -> bool {
    map.contains_key("explicitList") || map.contains_key("template")
}
