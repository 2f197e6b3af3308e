//! Error types for cfgtree-format

use crate::format::Format;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse {format} content: {message}")]
    Parse { format: Format, message: String },

    #[error("failed to serialize {format} content: {message}")]
    Serialize { format: Format, message: String },

    #[error("{format} cannot represent {what}")]
    Unrepresentable { format: Format, what: String },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] cfgtree_core::Error),
}

impl Error {
    pub fn parse(format: Format, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    pub fn serialize(format: Format, message: impl Into<String>) -> Self {
        Self::Serialize {
            format,
            message: message.into(),
        }
    }

    pub fn unrepresentable(format: Format, what: impl Into<String>) -> Self {
        Self::Unrepresentable {
            format,
            what: what.into(),
        }
    }
}
