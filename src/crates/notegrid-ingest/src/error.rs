use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Reasons a source file could not be turned into a score
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized file type: {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("invalid MIDI data: {0}")]
    Midi(#[from] midly::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("invalid value '{value}' for {element}")]
    InvalidValue { element: String, value: String },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl IngestError {
    pub fn invalid_value(element: impl Into<String>, value: impl Into<String>) -> Self {
        IngestError::InvalidValue {
            element: element.into(),
            value: value.into(),
        }
    }
}
