//! HTTP server configuration.
//!
//! Defaults can be overridden with `STRANGER_CHAT_HOST` and `STRANGER_CHAT_PORT`.

use log::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_PORT: u16 = 8080;

pub const HOST_ENV: &str = "STRANGER_CHAT_HOST";

pub const PORT_ENV: &str = "STRANGER_CHAT_PORT";

/// Resolve the bind address from the environment, falling back to the defaults.
pub fn bind_address() -> (String, u16) {
    let host = std::env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match std::env::var(PORT_ENV) {
        Ok(raw) => parse_port(&raw).unwrap_or_else(|| {
            warn!("[Config] Ignoring invalid {}={:?}, using {}", PORT_ENV, raw, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    };
    (host, port)
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|port| *port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_accepts_valid_numbers() {
        assert_eq!(parse_port("9000"), Some(9000));
        assert_eq!(parse_port(" 8081\n"), Some(8081));
    }

    #[test]
    fn test_parse_port_rejects_garbage_and_zero() {
        assert_eq!(parse_port("http"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("0"), None);
    }
}
