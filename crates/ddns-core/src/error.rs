//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by errors that hide their detail at the top level
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Address resolution failed
    ///
    /// The message is deliberately generic. The underlying transport, socket
    /// or resolver failure is available through [`std::error::Error::source`].
    #[error("Address error: Fail to get addresses.")]
    Address {
        /// Original cause
        #[source]
        source: BoxError,
    },

    /// Cache file I/O errors, propagated as-is
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (cache and config files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No zone visible to the credential is a suffix of the domain
    #[error("DNS error: Fail to find the zone for {domain}.")]
    ZoneNotFound {
        /// Domain that was being reconciled
        domain: String,
    },

    /// Provider answered with `success: false`
    #[error("DNS error: {message}")]
    Provider {
        /// First error message reported by the provider
        message: String,
    },

    /// Provider answered with a body that does not have the expected shape
    #[error("DNS error: malformed provider response: {0}")]
    MalformedResponse(String),

    /// HTTP transport errors talking to the provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any failure as a generic address error
    pub fn address(source: impl Into<BoxError>) -> Self {
        Self::Address {
            source: source.into(),
        }
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            domain: domain.into(),
        }
    }

    /// Create a provider-reported error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must abort the whole run
    ///
    /// Address resolution and cache I/O failures are fatal. Everything the
    /// reconciler can return only affects the domain being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Address { .. } | Self::Io(_) | Self::Json(_) | Self::Config(_)
        )
    }
}
