//! Protocol-visible error taxonomy.
//!
//! Internal plumbing keeps using `anyhow::Result` the way the rest of this
//! crate does; anything that crosses the MCP wire — a `tools/call` failure,
//! a JSON-RPC error reply — needs a stable, named kind instead. `PhotonError`
//! is that taxonomy (spec §7). Each variant carries the code the protocol
//! layer turns into a JSON-RPC `error.code`/`error.message` pair or an
//! `isError=true` content block.

use std::path::PathBuf;

use thiserror::Error;

/// A protocol-visible error kind, named per spec §7.
#[derive(Debug, Error)]
pub enum PhotonError {
    #[error("no tool, prompt, or resource named '{0}' in the current catalog")]
    NotFound(String),

    #[error("invalid arguments: {property}: {message}")]
    InvalidArguments { property: String, message: String },

    #[error("photon is not configured; missing: {missing:?}")]
    NotConfigured { missing: Vec<String> },

    #[error("invocation was cancelled")]
    Cancelled,

    #[error("failed to load photon at {path}: {message}")]
    LoadError { path: PathBuf, message: String },

    #[error("content hash mismatch for '{name}': manifest declared {declared}, computed {computed}")]
    IntegrityError {
        name: String,
        declared: String,
        computed: String,
    },

    #[error("marketplace source '{0}' is unreachable")]
    UpstreamUnavailable(String),

    #[error("client did not advertise the elicitation capability")]
    ElicitationNotSupported,

    #[error("internal error [{id}]: {message}")]
    Internal { id: String, message: String },
}

impl PhotonError {
    /// Stable string code surfaced to clients and logged for correlation.
    pub fn code(&self) -> &'static str {
        match self {
            PhotonError::NotFound(_) => "NotFound",
            PhotonError::InvalidArguments { .. } => "InvalidArguments",
            PhotonError::NotConfigured { .. } => "NotConfigured",
            PhotonError::Cancelled => "Cancelled",
            PhotonError::LoadError { .. } => "LoadError",
            PhotonError::IntegrityError { .. } => "IntegrityError",
            PhotonError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            PhotonError::ElicitationNotSupported => "ElicitationNotSupported",
            PhotonError::Internal { .. } => "Internal",
        }
    }

    /// JSON-RPC error code analogue used by the protocol core.
    pub fn json_rpc_code(&self) -> i64 {
        match self {
            PhotonError::NotFound(_) => -32601,
            PhotonError::InvalidArguments { .. } => -32602,
            _ => -32000,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PhotonError::Internal {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }
}

pub type PhotonResult<T> = Result<T, PhotonError>;
