//! Room registry actor.
//!
//! Process-wide directory from room identifier to running [`Room`]. Rooms are
//! created lazily on first resolution and live as long as the process. The
//! lookup and the insert happen inside one handler, so two connections racing
//! on the same new identifier always end up in the same room.

use actix::prelude::*;
use log::info;
use std::collections::HashMap;

use crate::server::room::server::Room;

pub struct RoomRegistry {
    rooms: HashMap<String, Addr<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Return the room for `room_id`, starting it if it does not exist yet.
    fn resolve(&mut self, room_id: String) -> Addr<Room> {
        self.rooms
            .entry(room_id)
            .or_insert_with_key(|room_id| {
                info!("[Registry] Creating room {:?}", room_id);
                Room::new(room_id.clone()).start()
            })
            .clone()
    }
}

/// Message: look up (or create) the room for an identifier.
#[derive(Message)]
#[rtype(result = "Addr<Room>")]
pub struct ResolveRoom {
    pub room_id: String,
}

/// Message: number of rooms created so far.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct RoomCount;

impl Actor for RoomRegistry {
    type Context = Context<Self>;
}

impl Handler<ResolveRoom> for RoomRegistry {
    type Result = MessageResult<ResolveRoom>;

    fn handle(&mut self, msg: ResolveRoom, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.resolve(msg.room_id))
    }
}

impl Handler<RoomCount> for RoomRegistry {
    type Result = MessageResult<RoomCount>;

    fn handle(&mut self, _msg: RoomCount, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.rooms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;

    async fn resolve(registry: &Addr<RoomRegistry>, id: &str) -> Result<Addr<Room>, MailboxError> {
        registry.send(ResolveRoom { room_id: id.to_string() }).await
    }

    #[actix::test]
    async fn test_racing_resolves_create_one_room() {
        let registry = RoomRegistry::new().start();

        let rooms: Vec<Addr<Room>> = join_all((0..16).map(|_| resolve(&registry, "fresh")))
            .await
            .into_iter()
            .map(|res| res.expect("registry alive"))
            .collect();

        assert!(rooms.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(registry.send(RoomCount).await.unwrap(), 1);
    }

    #[actix::test]
    async fn test_distinct_ids_get_distinct_rooms() {
        let registry = RoomRegistry::new().start();

        let a = resolve(&registry, "a").await.unwrap();
        let b = resolve(&registry, "b").await.unwrap();
        let a_again = resolve(&registry, "a").await.unwrap();

        assert!(a != b);
        assert!(a == a_again);
        assert_eq!(registry.send(RoomCount).await.unwrap(), 2);
    }
}
