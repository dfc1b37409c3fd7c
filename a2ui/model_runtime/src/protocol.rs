use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One server-to-client update. Applied in order by
/// [`ModelProcessor::process_messages`](crate::ModelProcessor::process_messages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerToClientMessage {
    BeginRendering(BeginRendering),
    SurfaceUpdate(SurfaceUpdate),
    DataModelUpdate(DataModelUpdate),
    DeleteSurface(DeleteSurface),
}

impl ServerToClientMessage {
    pub fn surface_id(&self) -> Option<&str> {
        match self {
            Self::BeginRendering(msg) => msg.surface_id.as_deref(),
            Self::SurfaceUpdate(msg) => msg.surface_id.as_deref(),
            Self::DataModelUpdate(msg) => msg.surface_id.as_deref(),
            Self::DeleteSurface(msg) => msg.surface_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginRendering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub contents: Vec<DataEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSurface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
}

/// Raw component definition as sent by the server.
///
/// `component` holds exactly one entry: the type tag mapped to its property
/// bag, e.g. `{"Text": {"text": {"path": "/title"}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Map<String, Value>>,
}

impl ComponentInstance {
    pub fn new(id: impl Into<String>, component_type: &str, properties: Value) -> Self {
        let mut component = Map::new();
        component.insert(component_type.to_string(), properties);
        Self {
            id: id.into(),
            weight: None,
            component: Some(component),
        }
    }

    /// Type tag and raw properties.
    pub fn definition(&self) -> Option<(&str, &Value)> {
        self.component
            .as_ref()
            .and_then(|component| component.iter().next())
            .map(|(component_type, properties)| (component_type.as_str(), properties))
    }

    pub fn component_type(&self) -> Option<&str> {
        self.definition().map(|(component_type, _)| component_type)
    }
}

/// A `{key, value*}` entry of a `dataModelUpdate`.
///
/// At most one of the value fields is expected. `valueString` may carry
/// stringified JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_number: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_map: Option<Vec<DataEntry>>,
}

impl DataEntry {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_string: Some(value.into()),
            ..Self::empty(key)
        }
    }

    pub fn number(key: impl Into<String>, value: impl Into<Number>) -> Self {
        Self {
            value_number: Some(value.into()),
            ..Self::empty(key)
        }
    }

    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self {
            value_boolean: Some(value),
            ..Self::empty(key)
        }
    }

    pub fn map(key: impl Into<String>, entries: Vec<DataEntry>) -> Self {
        Self {
            value_map: Some(entries),
            ..Self::empty(key)
        }
    }

    fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_string: None,
            value_number: None,
            value_boolean: None,
            value_map: None,
        }
    }
}

/// Decodes either a JSON array of messages or one bare message.
pub fn decode_messages(payload: &[u8]) -> Result<Vec<ServerToClientMessage>, serde_json::Error> {
    match serde_json::from_slice::<Value>(payload)? {
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}
