//! Application-wide error types.
//!
//! [`AppError`] covers startup and process-level failures.  Domain modules
//! own narrower enums ([`GraphError`], [`AdapterError`]) that convert into it
//! at the startup boundary; per-request failures are mapped separately by the
//! HTTP layer and never terminate the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("classifier error: {0}")]
    Classifier(#[from] AdapterError),

    #[error("server error: {0}")]
    Server(String),
}

/// Failures raised by the co-occurrence graph store and its loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Adjacency was requested for an identifier that is not a node.
    #[error("node not found: {0}")]
    NotFound(String),

    /// The same identifier was declared twice with different roles.
    #[error("node '{id}' declared with conflicting roles")]
    DuplicateNode { id: String },

    /// An edge names an endpoint missing from the node set.
    #[error("edge {from} -- {to} references an unknown node")]
    DanglingEdge { from: String, to: String },

    /// The artifact could not be read or parsed.
    #[error("artifact: {0}")]
    Artifact(String),
}

/// Failures raised by a [`Classifier`](crate::classifier::Classifier).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// Feature vector shape does not match what the model was trained on.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// A numeric feature, or a score derived from the features, was NaN or
    /// infinite.
    #[error("non-finite value for '{0}'")]
    NonFinite(String),

    /// The model artifact could not be read, parsed or validated.
    #[error("artifact: {0}")]
    Artifact(String),
}
