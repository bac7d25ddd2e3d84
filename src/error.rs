use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Date or time text in none of the accepted shapes.
    #[error("unsupported {field} format: {text:?}")]
    UnsupportedFormat { field: &'static str, text: String },

    /// Live retrieval failed. Also raised by `CachedSource` when no fallback exists.
    #[error("source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("payload from '{source_name}' does not match the expected records: {source}")]
    Payload {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn unsupported(field: &'static str, text: &str) -> Self {
        Self::UnsupportedFormat {
            field,
            text: text.to_string(),
        }
    }

    pub(crate) fn unavailable(source_name: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}
