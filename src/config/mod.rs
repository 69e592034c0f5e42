/// Main configuration module.
/// 
/// Re-exports submodules for relay and HTTP server configuration.
pub mod relay;
pub mod server;
