/// WebSocket session handler for a chat room.
///
/// This actor is the only owner of one client's connection. It decodes inbound
/// frames into actions for its room, writes the events the room queues for it,
/// and keeps the connection alive with periodic pings.
use actix::prelude::*;
use actix_web::{error, http::StatusCode, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

use super::messages::{ActionType, ClientAction};
use super::outbound::{batches, outbound_queue, OutboundBatch};
use super::server::{Register, Relay, Room, Unregister};
use super::types::ClientId;
use crate::config::relay::{
    CLIENT_TIMEOUT, HEARTBEAT_INTERVAL, MAX_FRAME_SIZE, ROOM_ID_HEADER, ROOM_ID_QUERY_PARAM,
};
use crate::server::registry::ResolveRoom;
use crate::server::ws_error::http_error_response;

/// Represents one client's WebSocket session in a room.
pub struct ChatSession {
    pub client_id: ClientId,
    pub room_id: String,
    pub room_addr: Addr<Room>,
    /// Last time anything was heard from the peer.
    last_seen: Instant,
    /// Fires `CLIENT_TIMEOUT` after the last inbound frame.
    idle_timer: Option<SpawnHandle>,
}

/// Whether a peer last heard from at `last_seen` has exceeded `CLIENT_TIMEOUT`.
pub fn is_timed_out(last_seen: Instant, now: Instant) -> bool {
    now.saturating_duration_since(last_seen) >= CLIENT_TIMEOUT
}

impl ChatSession {
    pub fn new(room_id: String, room_addr: Addr<Room>) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            room_id,
            room_addr,
            last_seen: Instant::now(),
            idle_timer: None,
        }
    }

    /// Ping the peer every `HEARTBEAT_INTERVAL`.
    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |_act, ctx| {
            ctx.ping(b"");
        });
    }

    /// Record inbound activity and re-arm the idle timer, so a silent peer is
    /// dropped `CLIENT_TIMEOUT` after its last frame.
    fn touch(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.last_seen = Instant::now();
        if let Some(handle) = self.idle_timer.take() {
            ctx.cancel_future(handle);
        }
        self.idle_timer = Some(ctx.run_later(CLIENT_TIMEOUT, |act, ctx| {
            act.idle_timer = None;
            if is_timed_out(act.last_seen, Instant::now()) {
                warn!("[Session] Client {} timed out in room {}", act.client_id, act.room_id);
                ctx.stop();
            }
        }));
    }
}

impl Actor for ChatSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when the session starts. Registers the client in its room and
    /// starts looking for a partner right away.
    fn started(&mut self, ctx: &mut Self::Context) {
        let (outbound, receiver) = outbound_queue();
        ctx.add_stream(batches(receiver));

        self.room_addr.do_send(Register {
            client_id: self.client_id,
            outbound,
        });
        self.room_addr.do_send(Relay {
            sender: self.client_id,
            action: ClientAction::new(ActionType::Search),
        });
        self.start_heartbeat(ctx);
        self.touch(ctx);
        info!("[Session] Client {} connected to room {}", self.client_id, self.room_id);
    }

    /// Called when the session stops, whatever the reason. Removes the client
    /// from its room, which releases any partner.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.room_addr.do_send(Unregister {
            client_id: self.client_id,
        });
        info!("[Session] Client {} disconnected from room {}", self.client_id, self.room_id);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSession {
    /// Handles incoming WebSocket messages from the client.
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("[Session] Protocol error from client {}: {}", self.client_id, e);
                ctx.stop();
                return;
            }
        };
        self.touch(ctx);

        match msg {
            ws::Message::Text(text) => match ClientAction::decode(&text) {
                Ok(action) => {
                    debug!("[Session] Client {} sent {:?}", self.client_id, action.kind);
                    self.room_addr.do_send(Relay {
                        sender: self.client_id,
                        action,
                    });
                }
                Err(e) => {
                    // Malformed frames are dropped; the connection stays open.
                    warn!("[Session] Client {} sent an invalid frame: {}", self.client_id, e);
                }
            },
            ws::Message::Ping(msg) => ctx.pong(&msg),
            ws::Message::Pong(_) => (),
            ws::Message::Binary(_) => {
                debug!("[Session] Ignoring binary frame from client {}", self.client_id);
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                warn!("[Session] Unsupported continuation frame from client {}", self.client_id);
                ctx.stop();
            }
            ws::Message::Nop => (),
        }
    }
}

impl StreamHandler<OutboundBatch> for ChatSession {
    /// Writes every event queued by the room as one text frame.
    fn handle(&mut self, batch: OutboundBatch, ctx: &mut Self::Context) {
        let frame = batch.to_frame();
        if !frame.is_empty() {
            ctx.text(frame);
        }
    }

    /// The room closed the queue: it dropped this client.
    fn finished(&mut self, ctx: &mut Self::Context) {
        debug!("[Session] Outbound queue closed for client {}", self.client_id);
        ctx.close(Some(ws::CloseCode::Normal.into()));
        ctx.stop();
    }
}

/// Extract the room identifier from the header value, falling back to the
/// query string. Blank identifiers count as missing.
pub fn room_id_from_parts(header: Option<&str>, query: &str) -> Option<String> {
    if let Some(id) = header.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(id.to_string());
    }
    query.split('&').find_map(|kv| {
        let mut split = kv.splitn(2, '=');
        match (split.next(), split.next()) {
            (Some(key), Some(value)) if key == ROOM_ID_QUERY_PARAM => urlencoding::decode(value)
                .ok()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            _ => None,
        }
    })
}

fn room_id_from_request(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(ROOM_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    room_id_from_parts(header, req.query_string())
}

/// WebSocket endpoint for chat rooms.
///
/// Expects the room identifier in the `room-id` header or the `room_id` query
/// parameter. The room is created on first use.
pub async fn ws_chat(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let Some(room_id) = room_id_from_request(&req) else {
        return Ok(http_error_response(
            "MISSING_ROOM_ID",
            "A room identifier is required (room-id header or room_id query parameter).",
            None,
            StatusCode::BAD_REQUEST,
        ));
    };

    let room_addr = data
        .registry
        .send(ResolveRoom {
            room_id: room_id.clone(),
        })
        .await
        .map_err(error::ErrorInternalServerError)?;

    ws::WsResponseBuilder::new(ChatSession::new(room_id, room_addr), &req, stream)
        .frame_size(MAX_FRAME_SIZE)
        .start()
}
