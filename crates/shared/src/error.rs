use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a children lookup against the term store did not produce terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("term store unreachable: {0}")]
    Transport(String),
    #[error("term store answered {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("malformed term store payload: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Human-readable diagnostic suitable for a status line.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("term id must not be empty")]
pub struct InvalidTermId;
