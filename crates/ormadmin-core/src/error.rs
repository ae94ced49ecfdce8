//! Core error types.

use thiserror::Error;

/// Why a path segment could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No field with that name exists on the model.
    UnknownField,
    /// The field exists but is not a foreign key, so the path cannot continue through it.
    NotARelation,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::UnknownField => write!(f, "no such field"),
            UnresolvedReason::NotARelation => write!(f, "not a foreign key"),
        }
    }
}

/// Failure reported by the query-executor collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
}

impl StorageError {
    /// Create a storage error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The underlying message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Admin engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A field path does not resolve against the schema.
    #[error("cannot resolve `{path}`: segment `{segment}` on `{model}` ({reason})")]
    UnresolvedPath {
        /// The full path as requested.
        path: String,
        /// First segment that could not be matched.
        segment: String,
        /// Model the segment was looked up on.
        model: String,
        /// Why the lookup failed.
        reason: UnresolvedReason,
    },

    /// One join prefix would resolve to two different models.
    #[error("ambiguous join at `{prefix}`: already joined to `{existing}`, requested `{requested}`")]
    AmbiguousJoin {
        /// The prefix being joined.
        prefix: String,
        /// Model already bound to the prefix.
        existing: String,
        /// Model the new path wants at the same prefix.
        requested: String,
    },

    /// A path was planned against a plan rooted at a different model.
    #[error("path `{path}` starts at `{found}`, plan is rooted at `{expected}`")]
    RootMismatch {
        /// The offending path.
        path: String,
        /// Root of the plan.
        expected: String,
        /// Root of the path.
        found: String,
    },

    /// Query executor failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Model is not part of the schema.
    #[error("unknown model `{0}`")]
    UnknownModel(String),

    /// Schema definition is inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A raw value could not be parsed into the field's type.
    #[error("invalid value `{value}` for `{field}`: expected {expected}")]
    InvalidValue {
        /// Field or path the value was meant for.
        field: String,
        /// The raw value.
        value: String,
        /// Expected type description.
        expected: String,
    },

    /// Model has no admin registered.
    #[error("model `{0}` is not registered")]
    NotRegistered(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a path resolution failure.
    pub fn is_unresolved_path(&self) -> bool {
        matches!(self, Error::UnresolvedPath { .. })
    }
}

/// Result alias for the core crate.
pub type Result<T> = std::result::Result<T, Error>;
