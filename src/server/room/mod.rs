/// Room module: client registry, pairwise matching and message relay.

pub mod server;
pub mod session;
pub mod messages;
pub mod outbound;
pub mod types;
