//! Room actor.
//!
//! Owns the membership of one matching pool and runs the pairing protocol:
//! search, propose, accept or decline, bind. Every register, unregister and
//! client action goes through the actor's mailbox, so state transitions never
//! interleave.
//!
//! Candidates are picked in join order. SEARCH offers the earliest-joined
//! member other than the sender; ACCEPT_MATCH and DECLINE_MATCH only consider
//! members without a partner. A client with a partner may only send messages.

use actix::prelude::*;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc::error::TrySendError;

use super::messages::{ActionType, ClientAction, MessageOrigin, ServerEvent};
use super::outbound::OutboundSender;
use super::types::{ClientId, ClientSnapshot, ClientState};
use crate::server::error::RelayError;

/// A client registered in the room.
#[derive(Debug)]
struct Member {
    id: ClientId,
    state: ClientState,
    partner: Option<ClientId>,
    outbound: OutboundSender,
}

/// Main room actor.
pub struct Room {
    /// External identifier this room was created for.
    id: String,
    /// Members in join order.
    members: Vec<Member>,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: String) -> Self {
        Self {
            id,
            members: Vec::new(),
        }
    }

    fn position(&self, client_id: ClientId) -> Option<usize> {
        self.members.iter().position(|m| m.id == client_id)
    }

    fn member(&self, client_id: ClientId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == client_id)
    }

    fn member_mut(&mut self, client_id: ClientId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == client_id)
    }

    fn set_state(&mut self, client_id: ClientId, state: ClientState) {
        if let Some(member) = self.member_mut(client_id) {
            member.state = state;
        }
    }

    /// First member other than `sender`, in join order.
    fn first_other(&self, sender: ClientId) -> Option<ClientId> {
        self.members.iter().find(|m| m.id != sender).map(|m| m.id)
    }

    /// First unbound member other than `sender`, in join order.
    fn first_candidate(&self, sender: ClientId) -> Option<ClientId> {
        self.members
            .iter()
            .find(|m| m.id != sender && m.partner.is_none())
            .map(|m| m.id)
    }

    /// Current state and partner of a member, if it is still in the room.
    pub fn snapshot(&self, client_id: ClientId) -> Option<ClientSnapshot> {
        self.member(client_id).map(|m| ClientSnapshot {
            state: m.state,
            partner: m.partner,
        })
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Add a client to the room.
    pub fn register(&mut self, client_id: ClientId, outbound: OutboundSender) {
        if self.position(client_id).is_some() {
            warn!("[Room {}] Client {} registered twice, ignoring", self.id, client_id);
            return;
        }
        self.members.push(Member {
            id: client_id,
            state: ClientState::Idle,
            partner: None,
            outbound,
        });
        debug!("[Room {}] Client {} joined ({} members)", self.id, client_id, self.members.len());
    }

    /// Remove a client, releasing its partner. Unknown ids are ignored.
    pub fn unregister(&mut self, client_id: ClientId) {
        if self.drop_member(client_id) {
            debug!("[Room {}] Client {} left ({} members)", self.id, client_id, self.members.len());
        }
    }

    /// Remove a member and notify its partner. The member's outbound queue
    /// closes when its sender is dropped here.
    fn drop_member(&mut self, client_id: ClientId) -> bool {
        let Some(pos) = self.position(client_id) else {
            return false;
        };
        let member = self.members.remove(pos);
        if let Some(partner_id) = member.partner {
            self.release_partner(partner_id);
        }
        true
    }

    /// Unbind a member whose partner is gone and tell it so.
    fn release_partner(&mut self, client_id: ClientId) {
        if let Some(member) = self.member_mut(client_id) {
            member.partner = None;
            member.state = ClientState::Searching;
        }
        self.deliver(client_id, ServerEvent::partner_disconnected());
    }

    fn try_deliver(&self, target: ClientId, event: ServerEvent) -> Result<(), RelayError> {
        let Some(member) = self.member(target) else {
            return Err(RelayError::QueueClosed(target));
        };
        member.outbound.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::QueueFull(target),
            TrySendError::Closed(_) => RelayError::QueueClosed(target),
        })
    }

    /// Queue an event for a member without waiting. A member that cannot take
    /// it is dropped from the room as if it had disconnected.
    fn deliver(&mut self, target: ClientId, event: ServerEvent) {
        if let Err(e) = self.try_deliver(target, event) {
            if self.drop_member(target) {
                warn!("[Room {}] Dropping client: {}", self.id, e);
            }
        }
    }

    /// Apply one client action.
    pub fn relay(&mut self, sender: ClientId, action: ClientAction) {
        let Some(member) = self.member(sender) else {
            debug!("[Room {}] Ignoring {:?} from departed client {}", self.id, action.kind, sender);
            return;
        };
        if member.partner.is_some() && action.kind != ActionType::SendMessage {
            debug!("[Room {}] Ignoring {:?} from matched client {}", self.id, action.kind, sender);
            return;
        }
        match action.kind {
            ActionType::Search => self.search(sender),
            ActionType::AcceptMatch => self.accept_match(sender),
            ActionType::DeclineMatch => self.decline_match(sender),
            ActionType::SendMessage => self.send_message(sender, &action),
        }
    }

    fn search(&mut self, sender: ClientId) {
        self.set_state(sender, ClientState::Searching);
        match self.first_other(sender) {
            Some(candidate) => {
                self.deliver(candidate, ServerEvent::MatchFound {});
                self.deliver(sender, ServerEvent::MatchFound {});
            }
            None => self.deliver(sender, ServerEvent::NoMatch {}),
        }
    }

    fn accept_match(&mut self, sender: ClientId) {
        let Some(candidate) = self.first_candidate(sender) else {
            debug!("[Room {}] Client {} accepted but nobody is waiting", self.id, sender);
            return;
        };
        let candidate_accepted = self
            .member(candidate)
            .is_some_and(|m| m.state == ClientState::Accepted);

        if candidate_accepted {
            for (id, partner) in [(sender, candidate), (candidate, sender)] {
                if let Some(member) = self.member_mut(id) {
                    member.partner = Some(partner);
                    member.state = ClientState::Matched;
                }
            }
            info!("[Room {}] Clients {} and {} matched", self.id, candidate, sender);
            self.deliver(candidate, ServerEvent::JoinedMatch {});
            // A candidate dropped on delivery has already released the sender.
            if self.member(candidate).is_some() {
                self.deliver(sender, ServerEvent::JoinedMatch {});
            }
            return;
        }

        self.deliver(candidate, ServerEvent::PartnerAccepted {});
        self.deliver(sender, ServerEvent::AcceptedMatch {});
        self.set_state(sender, ClientState::Accepted);
    }

    fn decline_match(&mut self, sender: ClientId) {
        let Some(candidate) = self.first_candidate(sender) else {
            debug!("[Room {}] Client {} declined but nobody is waiting", self.id, sender);
            return;
        };
        self.deliver(candidate, ServerEvent::PartnerDeclined {});
        self.deliver(sender, ServerEvent::DeclinedMatch {});
        self.set_state(sender, ClientState::Searching);
        self.set_state(candidate, ClientState::Searching);
    }

    fn send_message(&mut self, sender: ClientId, action: &ClientAction) {
        let Some(partner) = self.member(sender).and_then(|m| m.partner) else {
            self.deliver(sender, ServerEvent::partner_disconnected());
            return;
        };
        let time = Utc::now().timestamp();
        let message = action.message();
        self.deliver(
            partner,
            ServerEvent::message_received(message.clone(), MessageOrigin::Partner, time),
        );
        self.deliver(sender, ServerEvent::message_received(message, MessageOrigin::User, time));
    }
}

/// Message: a client joins the room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Register {
    pub client_id: ClientId,
    pub outbound: OutboundSender,
}

/// Message: a client's connection is gone.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unregister {
    pub client_id: ClientId,
}

/// Message: an action decoded from a client's connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Relay {
    pub sender: ClientId,
    pub action: ClientAction,
}

/// Message: query a client's matching state.
#[derive(Message)]
#[rtype(result = "Option<ClientSnapshot>")]
pub struct Snapshot {
    pub client_id: ClientId,
}

/// Message: number of clients currently in the room.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct MemberCount;

impl Actor for Room {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("[Room {}] Started", self.id);
    }
}

impl Handler<Register> for Room {
    type Result = ();

    fn handle(&mut self, msg: Register, _ctx: &mut Self::Context) -> Self::Result {
        self.register(msg.client_id, msg.outbound);
    }
}

impl Handler<Unregister> for Room {
    type Result = ();

    fn handle(&mut self, msg: Unregister, _ctx: &mut Self::Context) -> Self::Result {
        self.unregister(msg.client_id);
    }
}

impl Handler<Relay> for Room {
    type Result = ();

    fn handle(&mut self, msg: Relay, _ctx: &mut Self::Context) -> Self::Result {
        self.relay(msg.sender, msg.action);
    }
}

impl Handler<Snapshot> for Room {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, msg: Snapshot, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshot(msg.client_id))
    }
}

impl Handler<MemberCount> for Room {
    type Result = MessageResult<MemberCount>;

    fn handle(&mut self, _msg: MemberCount, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.member_count())
    }
}
