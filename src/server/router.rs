//! HTTP and WebSocket routing configuration.
//!
//! A single endpoint upgrades chat connections; each connection is handled by
//! its own session actor.

use actix_web::web;
use crate::server::room::session::ws_chat;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ws")
            .to(ws_chat)
    );
}
