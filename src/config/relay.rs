//! Relay configuration constants.
//!
//! Limits and timings applied to every chat connection and its outbound queue.

use std::time::Duration;

/// Time without any frame from the peer before the connection is considered dead.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// How often a ping is sent to the peer. Must be less than `CLIENT_TIMEOUT`.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(CLIENT_TIMEOUT.as_secs() * 9 / 10);

/// Maximum size (in bytes) of a frame accepted from the peer.
pub const MAX_FRAME_SIZE: usize = 512;

/// Number of events buffered per client before it is dropped as a slow consumer.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Header carrying the room identifier on the upgrade request.
pub const ROOM_ID_HEADER: &str = "room-id";

/// Query parameter used when the header is absent.
pub const ROOM_ID_QUERY_PARAM: &str = "room_id";
