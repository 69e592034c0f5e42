//! Errors raised while moving events between connections and rooms.
//!
//! None of these are fatal to the process: decode failures drop one frame,
//! queue failures drop one client.

use thiserror::Error;

use crate::server::room::types::ClientId;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Inbound frame is not a valid client action.
    #[error("invalid client action: {0}")]
    Decode(#[from] serde_json::Error),

    /// Outbound event could not be serialized.
    #[error("failed to encode server event: {0}")]
    Encode(#[source] serde_json::Error),

    /// Client is not draining its outbound queue fast enough.
    #[error("outbound queue of client {0} is full")]
    QueueFull(ClientId),

    /// Client's connection is already gone.
    #[error("outbound queue of client {0} is closed")]
    QueueClosed(ClientId),
}
