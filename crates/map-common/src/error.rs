//! Error types for the map client.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map composition operations.
#[derive(Debug, Error)]
pub enum MapError {
    // === Configuration Errors ===
    #[error("Invalid source for layer '{layer}': {source_id}")]
    UnknownSource { layer: String, source_id: String },

    #[error("Undefined matrix set for layer '{layer}': {matrix_set}")]
    UnknownMatrixSet { layer: String, matrix_set: String },

    #[error("Unknown layer type for layer '{layer}': {layer_type}")]
    UnknownLayerType { layer: String, layer_type: String },

    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // === Retrieval Errors ===
    #[error("Failed to load data accessor: {0}")]
    Retrieval(String),

    // === Validation Errors ===
    #[error("List item with value = {0} is disabled")]
    DisabledValue(String),

    #[error("List item value = {0} is not valid")]
    InvalidValue(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    // === Data Errors ===
    #[error("Failed to decode tile: {0}")]
    Decode(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl MapError {
    /// True for errors in the configuration taxonomy. These are fatal to
    /// constructing the one affected layer only.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MapError::UnknownSource { .. }
                | MapError::UnknownMatrixSet { .. }
                | MapError::UnknownLayerType { .. }
                | MapError::UnknownProjection(_)
                | MapError::Configuration(_)
        )
    }

    /// True for recoverable selection errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MapError::DisabledValue(_) | MapError::InvalidValue(_) | MapError::InvalidField { .. }
        )
    }

    /// True for remote retrieval failures that are reported to the user.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, MapError::Retrieval(_))
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for MapError {
    fn from(err: serde_yaml::Error) -> Self {
        MapError::Parse(format!("YAML error: {}", err))
    }
}
