use uuid::Uuid;

/// Identity of one connected client, generated when its connection is accepted.
pub type ClientId = Uuid;

/// Where a client stands in the matching protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    /// Just registered, not yet looking for a partner.
    Idle,
    /// Looking for a partner.
    Searching,
    /// Accepted a proposed match, waiting for the other side.
    Accepted,
    /// Bound to a partner; messages are relayed.
    Matched,
}

/// Read-only view of a client's matching state inside its room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub state: ClientState,
    pub partner: Option<ClientId>,
}
