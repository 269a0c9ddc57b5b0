//! Error types for the relay
//!
//! Defines session-level errors, name registration errors and
//! sink send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Session-level errors
///
/// Every variant is fatal to the one session that hit it and to nothing else.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client connection (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The session's own writer task is gone (fatal)
    #[error("Channel send error")]
    ChannelSend,
}

/// Name registration errors
///
/// Both are recoverable: the session re-prompts and stays in the naming phase.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// The proposed name was the empty string
    #[error("Name must not be empty")]
    Empty,

    /// Another registered client already holds the name
    #[error("Name already taken: {0}")]
    Taken(String),
}

/// Message send errors
///
/// Occurs when a line cannot be queued for a client.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client has too many undelivered lines; this one was dropped
    #[error("Queue full")]
    QueueFull,
}

impl From<SendError> for AppError {
    fn from(_: SendError) -> Self {
        AppError::ChannelSend
    }
}
