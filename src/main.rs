//! Main entry point for the chat relay server.
//!
//! Initializes logging and the actor system, starts the room registry, and
//! launches the HTTP server with the chat WebSocket endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use server::registry::RoomRegistry;

pub mod config;
mod server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (default to info level).
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Start the RoomRegistry actor (creates and tracks rooms).
    let registry = RoomRegistry::new().start();

    // Shared application state for HTTP/WebSocket handlers.
    let state = web::Data::new(server::state::AppState::new(registry));

    let (host, port) = config::server::bind_address();
    info!("[Server] Listening on {}:{}", host, port);

    // Start the HTTP server with the WebSocket endpoint.
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
