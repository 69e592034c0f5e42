// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds the address of the room registry, shared between the WebSocket
//! handlers and the actor system.

use actix::Addr;
use crate::server::registry::RoomRegistry;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the room registry actor (resolves room ids to rooms).
    pub registry: Addr<RoomRegistry>,
}

impl AppState {
    /// Create a new AppState with the given registry address.
    pub fn new(registry: Addr<RoomRegistry>) -> Self {
        AppState { registry }
    }
}
