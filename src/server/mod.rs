// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the main backend server components, including:
//! - Application state management
//! - HTTP/WebSocket routing
//! - Room registry (room id -> room actor)
//! - Rooms: matching protocol, message relay and per-connection sessions

pub mod state;
pub mod router;
pub mod registry;
pub mod room;
pub mod error;
pub mod ws_error;
