use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no project folder is open and no save destination was chosen")]
    StorageUnavailable,
    #[error("malformed architecture document: {0}")]
    MalformedInput(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("connection {source_name} -> {target_name} references unknown node '{missing}'")]
    UnresolvedReference {
        source_name: String,
        target_name: String,
        missing: String,
    },
    #[error("node '{0}' is defined more than once")]
    DuplicateNode(String),
    #[error("invalid save destination: {0}")]
    InvalidDestination(String),
    #[error("settings error: {0}")]
    Settings(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Error::MalformedInput(_) => "MALFORMED_INPUT",
            Error::Io { .. } => "IO_FAILURE",
            Error::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            Error::DuplicateNode(_) => "DUPLICATE_NODE",
            Error::InvalidDestination(_) => "INVALID_DESTINATION",
            Error::Settings(_) => "SETTINGS",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
