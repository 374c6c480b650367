//! Structured error types for datagrid.
//!
//! The grid engine itself never fails: lookups return `Option` and bad
//! configuration is clamped. Errors only surface where external data is
//! decoded (options, rows, filter arguments) or handed across the JS boundary.

/// All errors that can occur while decoding grid input or talking to a host.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// JSON decoding/encoding error from serde_json.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Options were structurally valid JSON but unusable.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// I/O error (CLI input files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
