use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("failed to access local store {path}: {source}")]
    StorageIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("local store entry {key} is not valid JSON: {source}")]
    StorageFormat {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
