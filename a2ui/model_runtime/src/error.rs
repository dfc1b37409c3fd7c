//! Error types for the model processor

use thiserror::Error;

/// Result type alias using ProcessorError
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Errors surfaced to callers of the processor.
///
/// Everything else (missing data, missing components, malformed JSON in a
/// `valueString`) degrades to an empty or fallback result instead.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// A component reaches itself through its own subtree
    #[error("Circular dependency for component \"{component_id}\".")]
    CircularDependency { component_id: String },

    /// Message payload could not be decoded
    #[error("Message decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProcessorError {
    pub fn circular(component_id: impl Into<String>) -> Self {
        Self::CircularDependency {
            component_id: component_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_dependency_message_names_component() {
        let err = ProcessorError::circular("a");
        assert_eq!(err.to_string(), "Circular dependency for component \"a\".");
    }
}
