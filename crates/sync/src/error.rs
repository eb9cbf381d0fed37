//! Error taxonomy shared by every engine component.

use crate::single_flight::Operation;
use mcpbridge_snapshot::Source;
use std::fmt::Display;

/// Errors surfaced by the engine and its backends.
///
/// `Parse` and `Validation` are raised locally before any backend call.
/// `DuplicateName`, `NotFound` and `NoBackup` come back from the backend
/// verbatim. `Backend` wraps any IO or persistence failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid JSON config: {0}")]
    Parse(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("'{name}' already exists in {scope}")]
    DuplicateName { scope: String, name: String },
    #[error("'{name}' not found in {scope}")]
    NotFound { scope: String, name: String },
    #[error("No backup found for {0}")]
    NoBackup(Source),
    #[error("{operation} already in progress for {target}")]
    InFlight { operation: Operation, target: Source },
    #[error("{0}")]
    Backend(String),
}

impl Error {
    pub fn duplicate(scope: impl Display, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            scope: scope.to_string(),
            name: name.into(),
        }
    }

    pub fn not_found(scope: impl Display, name: impl Into<String>) -> Self {
        Self::NotFound {
            scope: scope.to_string(),
            name: name.into(),
        }
    }

    /// Flattens an `anyhow` chain into a backend error, keeping every context layer.
    pub fn backend(err: anyhow::Error) -> Self {
        Self::Backend(format!("{err:#}"))
    }

    /// True for failures the caller can fix by changing its input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_)
                | Self::Validation(_)
                | Self::DuplicateName { .. }
                | Self::NotFound { .. }
                | Self::NoBackup(_)
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::backend(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
