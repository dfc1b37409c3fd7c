pub const DEFAULT_SURFACE_ID: &str = "@default";
pub const DEFAULT_ITERATION_VARIABLE: &str = "item";

const SURFACE_ID_ENV: &str = "A2UI_DEFAULT_SURFACE_ID";
const ITERATION_VARIABLE_ENV: &str = "A2UI_ITERATION_VARIABLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Surface used when a message or query omits `surfaceId`.
    pub default_surface_id: String,
    /// Name template authors use for the current iteration entry, e.g. the
    /// `item` in `./item/name`. Stripped from `path` bindings inside a data
    /// context.
    pub iteration_variable: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            default_surface_id: DEFAULT_SURFACE_ID.to_string(),
            iteration_variable: DEFAULT_ITERATION_VARIABLE.to_string(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_env() -> Self {
        Self {
            default_surface_id: parse_env_string(SURFACE_ID_ENV)
                .unwrap_or_else(|| DEFAULT_SURFACE_ID.to_string()),
            iteration_variable: parse_env_string(ITERATION_VARIABLE_ENV)
                .unwrap_or_else(|| DEFAULT_ITERATION_VARIABLE.to_string()),
        }
    }

    pub fn with_default_surface_id(mut self, surface_id: impl Into<String>) -> Self {
        self.default_surface_id = surface_id.into();
        self
    }

    pub fn with_iteration_variable(mut self, name: impl Into<String>) -> Self {
        self.iteration_variable = name.into();
        self
    }
}

fn parse_env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_conventions() {
        let config = ProcessorConfig::default();
        assert_eq!(config.default_surface_id, "@default");
        assert_eq!(config.iteration_variable, "item");
    }

    #[test]
    fn builders_override_fields() {
        let config = ProcessorConfig::default()
            .with_default_surface_id("main")
            .with_iteration_variable("row");
        assert_eq!(config.default_surface_id, "main");
        assert_eq!(config.iteration_variable, "row");
    }

    #[test]
    fn missing_env_value_is_ignored() {
        assert_eq!(parse_env_string("A2UI_TEST_UNSET_VARIABLE_FOR_CONFIG"), None);
    }
}
