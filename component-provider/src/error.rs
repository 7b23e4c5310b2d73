//! Error types for the component provider.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for component provider operations.
pub type Result<T> = std::result::Result<T, ComponentError>;

/// Errors that can occur while resolving, scanning or watching components.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Provider settings are missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// No settings section exists for the requested provider.
    #[error("no settings for component provider: {0}")]
    UnknownProvider(String),

    /// A provider with the same id is already registered.
    #[error("component provider already registered: {0}")]
    DuplicateProvider(String),

    /// Settings document could not be parsed.
    #[error("invalid settings document: {0}")]
    Settings(#[from] toml::de::Error),

    /// The provider directory could not be watched.
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Component document is not well-formed.
    #[error("malformed component document: {0}")]
    Malformed(String),

    /// XML reader error.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::events::attributes::AttrError> for ComponentError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}
