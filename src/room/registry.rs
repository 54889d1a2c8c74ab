//! Registry of live rooms keyed by code

use std::convert::Infallible;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use tracing::info;

use crate::util::ids::{ConnectionId, PlayerNumber};

use super::code::RoomCode;
use super::session::{Session, SessionError};

pub type RoomHandle = Arc<Mutex<Session>>;

/// All live rooms. Never hold a room lock while touching the map.
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Insert an empty Waiting room under a fresh code
    pub fn create_room(&self) -> RoomCode {
        match self.insert_new(|_| Ok::<_, Infallible>(())) {
            Ok((code, ())) => code,
            Err(never) => match never {},
        }
    }

    /// Create a room with the host already seated as player one, so nobody
    /// can see the room before its host is in it.
    pub fn create_hosted_room(
        &self,
        host: ConnectionId,
    ) -> Result<(RoomCode, PlayerNumber), SessionError> {
        self.insert_new(|session| session.join(host, Some(PlayerNumber::One)))
    }

    fn insert_new<T, E>(
        &self,
        prepare: impl FnOnce(&mut Session) -> Result<T, E>,
    ) -> Result<(RoomCode, T), E> {
        let mut rng = rand::thread_rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let mut session = Session::new(code.clone(), rng.gen());
                    let value = prepare(&mut session)?;
                    slot.insert(Arc::new(Mutex::new(session)));
                    info!(room = %code, "Room created");
                    return Ok((code, value));
                }
            }
        }
    }

    pub fn find_room(&self, code: &RoomCode) -> Result<RoomHandle, SessionError> {
        self.rooms
            .get(code)
            .map(|room| room.value().clone())
            .ok_or(SessionError::RoomNotFound)
    }

    /// Delete the room if nobody is seated. Safe to call more than once.
    pub fn remove_if_empty(&self, code: &RoomCode) -> bool {
        let removed = self
            .rooms
            .remove_if(code, |_, room| {
                let mut session = room.lock();
                if session.is_empty() {
                    session.close();
                    true
                } else {
                    false
                }
            })
            .is_some();

        if removed {
            info!(room = %code, "Room deleted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
