//! Error taxonomy shared by every port.

use thiserror::Error;

/// Boxed source error carried from an adapter
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// A persisted record could not be read or written
    #[error("{store} store error: {source}")]
    Store {
        store: &'static str,
        #[source]
        source: BoxError,
    },

    /// An external service call failed or returned an unusable response
    #[error("{service} request failed: {source}")]
    External {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// The stats lookup returned no channel for this id
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
}

impl TrackerError {
    pub fn store(store: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Store { store, source: source.into() }
    }

    pub fn external(service: &'static str, source: impl Into<BoxError>) -> Self {
        Self::External { service, source: source.into() }
    }
}
