use thiserror::Error;

/// Errors from the durable key-value client storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored value for key '{key}' has an unexpected shape: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
