//! Transport error types

use thiserror::Error;

/// A failed assistant turn, with a coarse classification for logging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Status, message).with_status(status)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Remote, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Rejected, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }
}

/// Where a turn failed. The controller treats every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection failures, dropped bodies
    Network,
    /// Non-success HTTP status
    Status,
    /// Error-shaped response from the assistant
    Remote,
    /// Body could not be decoded
    Decode,
    /// Returned state refused by the validation hook
    Rejected,
    /// No answer within the configured turn timeout
    Timeout,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Status => "status",
            Self::Remote => "remote",
            Self::Decode => "decode",
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
        }
    }
}
