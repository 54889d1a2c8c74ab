//! Room service - routes client messages to sessions and fans replies out to outboxes

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::catalog::StoreItem;
use crate::util::ids::{ConnectionId, PlayerNumber};
use crate::ws::protocol::{ActionName, ClientMsg, ServerMsg};

use super::code::RoomCode;
use super::registry::RoomRegistry;
use super::session::{ReadyOutcome, Session, SessionError, TieDeclaration};

/// Bounded queue of messages waiting to be written to one socket
pub type Outbox = mpsc::Sender<ServerMsg>;

/// A message addressed to one connection
type Outgoing = (ConnectionId, ServerMsg);

/// Which reply a failed operation should produce
#[derive(Debug, Clone, Copy)]
enum Origin {
    Join,
    Rejoin,
    Purchase,
    Loadout,
    Other,
}

pub struct RoomService {
    registry: RoomRegistry,
    /// Outbox per live connection
    connections: DashMap<ConnectionId, Outbox>,
    /// Room each connection is seated in
    memberships: DashMap<ConnectionId, RoomCode>,
}

impl RoomService {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
            connections: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Register a connection's outbox (called when the WebSocket opens)
    pub fn register(&self, connection: ConnectionId, outbox: Outbox) {
        self.connections.insert(connection, outbox);
        debug!(connection = %connection, "Connection registered");
    }

    /// Drop the connection and vacate its seat. Safe to call more than once.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.connections.remove(&connection);
        let outgoing = self.leave_current_room(connection);
        self.dispatch(outgoing);
        debug!(connection = %connection, "Connection unregistered");
    }

    /// Handle one client message. Replies are queued on outboxes, never awaited.
    pub fn handle(&self, connection: ConnectionId, msg: ClientMsg) {
        let outgoing = match msg {
            ClientMsg::CreateRoom => self.create_room(connection),
            ClientMsg::JoinGameRoom { code } => self.join_room(connection, code),
            ClientMsg::PlayerReady { code } => self.player_ready(connection, &code),
            ClientMsg::RejoinGame { code, player } => self.rejoin(connection, code, player),
            ClientMsg::PlayerAction {
                code,
                action,
                action_data,
            } => self.relay_action(connection, &code, action, action_data),
            ClientMsg::BuyItem { code, item_type } => self.buy_item(connection, &code, item_type),
            ClientMsg::SelectLoadout { code, weapons } => {
                self.select_loadout(connection, &code, &weapons)
            }
            ClientMsg::DeclareTie { code } => self.declare_tie(connection, &code),
            ClientMsg::GameOver { code, winner } => self.game_over(connection, &code, winner),
        };

        self.dispatch(outgoing);
    }

    /// Run an operation under the room lock. The lock is released on return.
    fn with_session<T>(
        &self,
        code: &RoomCode,
        op: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let room = self.registry.find_room(code)?;
        let mut session = room.lock();
        op(&mut session)
    }

    fn create_room(&self, connection: ConnectionId) -> Vec<Outgoing> {
        let mut outgoing = self.leave_current_room(connection);

        match self.registry.create_hosted_room(connection) {
            Ok((code, player_number)) => {
                self.memberships.insert(connection, code.clone());
                outgoing.push((
                    connection,
                    ServerMsg::RoomCreated {
                        message: format!("Room created! Share code: {code}"),
                        code,
                        player_number,
                    },
                ));
            }
            Err(err) => outgoing.extend(Self::error_reply(connection, Origin::Join, err)),
        }
        outgoing
    }

    fn join_room(&self, connection: ConnectionId, code: RoomCode) -> Vec<Outgoing> {
        let mut outgoing = self.leave_other_room(connection, &code);

        let joined = self.with_session(&code, |session| {
            if session.seat_of(connection).is_some() {
                return Ok(None);
            }
            let number = session.join(connection, None)?;
            Ok(Some((number, session.player_count(), session.occupants())))
        });

        match joined {
            Ok(None) => {
                debug!(connection = %connection, room = %code, "Already seated, ignoring join");
            }
            Ok(Some((player_number, seated, occupants))) => {
                self.memberships.insert(connection, code.clone());
                outgoing.push((
                    connection,
                    ServerMsg::RoomJoined {
                        code,
                        player_number,
                        message: "Joined the game!".to_string(),
                    },
                ));
                if seated == 2 {
                    outgoing.extend(broadcast(
                        &occupants,
                        ServerMsg::RoomReady {
                            message: "Both players connected! Ready to battle!".to_string(),
                        },
                    ));
                }
            }
            Err(err) => outgoing.extend(Self::error_reply(connection, Origin::Join, err)),
        }
        outgoing
    }

    fn player_ready(&self, connection: ConnectionId, code: &RoomCode) -> Vec<Outgoing> {
        let ready = self.with_session(code, |session| {
            let outcome = session.set_ready(connection)?;
            Ok((outcome, session.occupants()))
        });

        match ready {
            Ok((ReadyOutcome::Started(start), occupants)) => broadcast(
                &occupants,
                ServerMsg::GameStart {
                    map: start.map,
                    fighters: start.fighters,
                    message: "FIGHT!".to_string(),
                },
            ),
            Ok((ReadyOutcome::Waiting, _)) => Vec::new(),
            Err(err) => Self::error_reply(connection, Origin::Other, err),
        }
    }

    fn rejoin(&self, connection: ConnectionId, code: RoomCode, player: PlayerNumber) -> Vec<Outgoing> {
        let mut outgoing = self.leave_other_room(connection, &code);

        match self.with_session(&code, |session| session.rejoin(connection, player)) {
            Ok(displaced) => {
                if let Some(old) = displaced {
                    self.memberships.remove_if(&old, |_, room| *room == code);
                }
                self.memberships.insert(connection, code);
            }
            Err(err) => outgoing.extend(Self::error_reply(connection, Origin::Rejoin, err)),
        }
        outgoing
    }

    fn relay_action(
        &self,
        connection: ConnectionId,
        code: &RoomCode,
        action: ActionName,
        data: serde_json::Value,
    ) -> Vec<Outgoing> {
        match self.with_session(code, |session| session.relay_target(connection)) {
            Ok(Some(target)) => vec![(target, ServerMsg::OpponentAction { action, data })],
            Ok(None) => Vec::new(),
            Err(err) => Self::error_reply(connection, Origin::Other, err),
        }
    }

    fn buy_item(&self, connection: ConnectionId, code: &RoomCode, item: StoreItem) -> Vec<Outgoing> {
        match self.with_session(code, |session| session.purchase(connection, item)) {
            Ok(purchase) => vec![(
                connection,
                ServerMsg::ItemPurchased {
                    item_type: purchase.item.kind(),
                    item: purchase.item,
                    coins_left: purchase.coins_left,
                },
            )],
            Err(err) => Self::error_reply(connection, Origin::Purchase, err),
        }
    }

    fn select_loadout(&self, connection: ConnectionId, code: &RoomCode, indices: &[usize]) -> Vec<Outgoing> {
        match self.with_session(code, |session| session.select_loadout(connection, indices)) {
            Ok(weapons) => vec![(connection, ServerMsg::LoadoutSelected { weapons })],
            Err(err) => Self::error_reply(connection, Origin::Loadout, err),
        }
    }

    fn declare_tie(&self, connection: ConnectionId, code: &RoomCode) -> Vec<Outgoing> {
        let declared = self.with_session(code, |session| {
            let declaration = session.declare_tie(connection)?;
            Ok((declaration, session.occupants()))
        });

        match declared {
            Ok((TieDeclaration::Triggered, occupants)) => broadcast(
                &occupants,
                ServerMsg::TiebreakerStart {
                    message: "Double knockout! Tiebreaker round!".to_string(),
                },
            ),
            Ok((TieDeclaration::AlreadyPending, _)) => Vec::new(),
            Err(err) => Self::error_reply(connection, Origin::Other, err),
        }
    }

    fn game_over(&self, connection: ConnectionId, code: &RoomCode, winner: PlayerNumber) -> Vec<Outgoing> {
        let settled = self.with_session(code, |session| {
            let reward = session.settle_battle(connection, winner)?;
            Ok((reward, session.occupants()))
        });

        match settled {
            Ok((reward, occupants)) => broadcast(&occupants, ServerMsg::BattleResult { winner, reward }),
            Err(err) => Self::error_reply(connection, Origin::Other, err),
        }
    }

    /// Leave the current room unless it is `code`
    fn leave_other_room(&self, connection: ConnectionId, code: &RoomCode) -> Vec<Outgoing> {
        let elsewhere = self
            .memberships
            .get(&connection)
            .is_some_and(|current| current.value() != code);
        if elsewhere {
            self.leave_current_room(connection)
        } else {
            Vec::new()
        }
    }

    fn leave_current_room(&self, connection: ConnectionId) -> Vec<Outgoing> {
        let Some((_, code)) = self.memberships.remove(&connection) else {
            return Vec::new();
        };

        let departure = self
            .with_session(&code, |session| Ok(session.disconnect(connection)))
            .ok()
            .flatten();

        let outgoing = match departure {
            Some(departure) => broadcast(
                &departure.remaining,
                ServerMsg::PlayerLeft {
                    message: "Other player disconnected".to_string(),
                },
            ),
            None => Vec::new(),
        };

        self.registry.remove_if_empty(&code);
        outgoing
    }

    fn error_reply(connection: ConnectionId, origin: Origin, err: SessionError) -> Vec<Outgoing> {
        let reply = match (origin, &err) {
            (Origin::Join, SessionError::RoomNotFound) => ServerMsg::JoinError {
                message: "Room not found! Check the code.".to_string(),
            },
            (Origin::Rejoin, SessionError::RoomNotFound) => ServerMsg::JoinError {
                message: "Room no longer exists!".to_string(),
            },
            (Origin::Join | Origin::Rejoin, SessionError::RoomFull) => ServerMsg::JoinError {
                message: "Room is full!".to_string(),
            },
            (_, SessionError::InsufficientFunds { .. }) => ServerMsg::BuyError {
                message: err.to_string(),
            },
            (_, SessionError::InvalidLoadout(_)) => ServerMsg::LoadoutError {
                message: err.to_string(),
            },
            _ => {
                debug!(connection = %connection, ?origin, error = %err, "Dropping failed request");
                return Vec::new();
            }
        };
        vec![(connection, reply)]
    }

    /// Queue each message on its outbox. A full or closed outbox drops it.
    fn dispatch(&self, outgoing: Vec<Outgoing>) {
        for (connection, msg) in outgoing {
            let Some(outbox) = self.connections.get(&connection).map(|o| o.value().clone()) else {
                debug!(connection = %connection, "No outbox for connection");
                continue;
            };

            match outbox.try_send(msg) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(connection = %connection, "Outbox full, dropping message");
                }
                Err(TrySendError::Closed(_)) => {
                    info!(connection = %connection, "Outbox closed");
                }
            }
        }
    }
}

impl Default for RoomService {
    fn default() -> Self {
        Self::new()
    }
}

fn broadcast(recipients: &[ConnectionId], msg: ServerMsg) -> Vec<Outgoing> {
    recipients.iter().map(|&c| (c, msg.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::Receiver;

    struct Client {
        id: ConnectionId,
        rx: Receiver<ServerMsg>,
    }

    impl Client {
        fn connect(service: &RoomService) -> Self {
            let (tx, rx) = mpsc::channel(16);
            let id = ConnectionId::new();
            service.register(id, tx);
            Self { id, rx }
        }

        fn next(&mut self) -> Option<ServerMsg> {
            self.rx.try_recv().ok()
        }

        fn drain(&mut self) -> Vec<ServerMsg> {
            std::iter::from_fn(|| self.next()).collect()
        }
    }

    fn create(service: &RoomService, host: &mut Client) -> RoomCode {
        service.handle(host.id, ClientMsg::CreateRoom);
        match host.next() {
            Some(ServerMsg::RoomCreated {
                code, player_number, ..
            }) => {
                assert_eq!(player_number, PlayerNumber::One);
                code
            }
            other => panic!("expected room_created, got {other:?}"),
        }
    }

    fn pair(service: &RoomService) -> (Client, Client, RoomCode) {
        let mut host = Client::connect(service);
        let mut guest = Client::connect(service);
        let code = create(service, &mut host);
        service.handle(guest.id, ClientMsg::JoinGameRoom { code: code.clone() });
        host.drain();
        guest.drain();
        (host, guest, code)
    }

    fn start(service: &RoomService, host: &mut Client, guest: &mut Client, code: &RoomCode) {
        service.handle(host.id, ClientMsg::PlayerReady { code: code.clone() });
        service.handle(guest.id, ClientMsg::PlayerReady { code: code.clone() });
        host.drain();
        guest.drain();
    }

    fn credit(service: &RoomService, code: &RoomCode, number: PlayerNumber, coins: u32) {
        let room = service.registry().find_room(code).unwrap();
        let mut session = room.lock();
        // Route through a won battle so only public operations are used.
        let seated = session.connection_of(number).unwrap();
        for _ in 0..coins / crate::catalog::WIN_REWARD {
            let a = session.connection_of(PlayerNumber::One).unwrap();
            let b = session.connection_of(PlayerNumber::Two).unwrap();
            session.set_ready(a).unwrap();
            session.set_ready(b).unwrap();
            session.settle_battle(seated, number).unwrap();
        }
    }

    #[test]
    fn create_then_join_assigns_seats_and_announces_ready() {
        let service = RoomService::new();
        let mut host = Client::connect(&service);
        let mut guest = Client::connect(&service);
        let code = create(&service, &mut host);
        assert_eq!(code.as_str().len(), 6);

        service.handle(guest.id, ClientMsg::JoinGameRoom { code: code.clone() });

        let guest_msgs = guest.drain();
        assert!(matches!(
            &guest_msgs[0],
            ServerMsg::RoomJoined { player_number: PlayerNumber::Two, .. }
        ));
        assert!(matches!(&guest_msgs[1], ServerMsg::RoomReady { .. }));
        assert!(matches!(host.next(), Some(ServerMsg::RoomReady { .. })));
    }

    #[test]
    fn repeated_join_is_silent() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);

        service.handle(guest.id, ClientMsg::JoinGameRoom { code: code.clone() });

        assert!(guest.next().is_none());
        assert!(host.next().is_none());
        let room = service.registry().find_room(&code).unwrap();
        assert_eq!(room.lock().seat_of(guest.id), Some(PlayerNumber::Two));
    }

    #[test]
    fn concurrent_joins_fill_one_seat() {
        let service = RoomService::new();
        let mut host = Client::connect(&service);
        let code = create(&service, &mut host);

        let mut guests: Vec<Client> = (0..8).map(|_| Client::connect(&service)).collect();
        std::thread::scope(|scope| {
            for guest in &guests {
                let (service, code, id) = (&service, code.clone(), guest.id);
                scope.spawn(move || service.handle(id, ClientMsg::JoinGameRoom { code }));
            }
        });

        let mut joined = 0;
        let mut full = 0;
        for guest in &mut guests {
            match guest.next() {
                Some(ServerMsg::RoomJoined { player_number, .. }) => {
                    assert_eq!(player_number, PlayerNumber::Two);
                    joined += 1;
                }
                Some(ServerMsg::JoinError { message }) => {
                    assert_eq!(message, "Room is full!");
                    full += 1;
                }
                other => panic!("unexpected reply {other:?}"),
            }
        }
        assert_eq!((joined, full), (1, 7));
        assert_eq!(service.registry().find_room(&code).unwrap().lock().player_count(), 2);
    }

    #[test]
    fn join_unknown_room_reports_join_error() {
        let service = RoomService::new();
        let mut client = Client::connect(&service);
        service.handle(
            client.id,
            ClientMsg::JoinGameRoom {
                code: RoomCode::parse("NOPE00").unwrap(),
            },
        );
        assert!(matches!(client.next(), Some(ServerMsg::JoinError { .. })));
    }

    #[test]
    fn third_player_gets_room_full() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);
        let mut late = Client::connect(&service);

        service.handle(late.id, ClientMsg::JoinGameRoom { code: code.clone() });

        assert_eq!(
            late.next(),
            Some(ServerMsg::JoinError {
                message: "Room is full!".to_string()
            })
        );
        assert!(host.next().is_none());
        assert!(guest.next().is_none());
        let room = service.registry().find_room(&code).unwrap();
        assert_eq!(room.lock().player_count(), 2);
    }

    #[test]
    fn both_ready_broadcasts_game_start() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);

        service.handle(host.id, ClientMsg::PlayerReady { code: code.clone() });
        assert!(host.next().is_none());

        service.handle(guest.id, ClientMsg::PlayerReady { code: code.clone() });
        for client in [&mut host, &mut guest] {
            match client.next() {
                Some(ServerMsg::GameStart { map, fighters, .. }) => {
                    assert!(!map.platforms.is_empty());
                    assert_eq!(fighters[1].player_number, PlayerNumber::Two);
                }
                other => panic!("expected game_start, got {other:?}"),
            }
        }
    }

    #[test]
    fn actions_reach_only_the_opponent() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);

        service.handle(
            host.id,
            ClientMsg::PlayerAction {
                code,
                action: ActionName::try_from("jump".to_string()).unwrap(),
                action_data: serde_json::json!({"x": 3}),
            },
        );

        assert!(host.next().is_none());
        match guest.next() {
            Some(ServerMsg::OpponentAction { action, data }) => {
                assert_eq!(action.as_str(), "jump");
                assert_eq!(data["x"], 3);
            }
            other => panic!("expected opponent_action, got {other:?}"),
        }
    }

    #[test]
    fn broke_buyer_gets_buy_error() {
        let service = RoomService::new();
        let (mut host, _guest, code) = pair(&service);

        service.handle(
            host.id,
            ClientMsg::BuyItem {
                code,
                item_type: StoreItem::MysteryBox,
            },
        );
        assert!(matches!(host.next(), Some(ServerMsg::BuyError { .. })));
    }

    #[test]
    fn ability_purchase_reports_remaining_coins() {
        let service = RoomService::new();
        let (mut host, _guest, code) = pair(&service);
        credit(&service, &code, PlayerNumber::One, 300);

        service.handle(
            host.id,
            ClientMsg::BuyItem {
                code,
                item_type: StoreItem::Ability,
            },
        );
        match host.next() {
            Some(ServerMsg::ItemPurchased {
                item_type,
                coins_left,
                ..
            }) => {
                assert_eq!(item_type, crate::room::session::ItemKind::Ability);
                assert_eq!(coins_left, 100);
            }
            other => panic!("expected item_purchased, got {other:?}"),
        }
    }

    #[test]
    fn game_over_settles_once() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);
        start(&service, &mut host, &mut guest, &code);

        let report = ClientMsg::GameOver {
            code: code.clone(),
            winner: PlayerNumber::One,
        };
        service.handle(host.id, report.clone());
        service.handle(guest.id, report);

        let expected = ServerMsg::BattleResult {
            winner: PlayerNumber::One,
            reward: 100,
        };
        assert_eq!(host.drain(), vec![expected.clone()]);
        assert_eq!(guest.drain(), vec![expected]);

        let room = service.registry().find_room(&code).unwrap();
        assert_eq!(room.lock().player(PlayerNumber::One).unwrap().coins(), 100);
    }

    #[test]
    fn tie_is_announced_once() {
        let service = RoomService::new();
        let (mut host, mut guest, code) = pair(&service);
        start(&service, &mut host, &mut guest, &code);

        service.handle(host.id, ClientMsg::DeclareTie { code: code.clone() });
        service.handle(guest.id, ClientMsg::DeclareTie { code });

        assert_eq!(host.drain().len(), 1);
        assert!(matches!(guest.drain().as_slice(), [ServerMsg::TiebreakerStart { .. }]));
    }

    #[test]
    fn invalid_loadout_is_reported() {
        let service = RoomService::new();
        let (mut host, _guest, code) = pair(&service);

        service.handle(
            host.id,
            ClientMsg::SelectLoadout {
                code: code.clone(),
                weapons: vec![0, 5],
            },
        );
        assert!(matches!(host.next(), Some(ServerMsg::LoadoutError { .. })));

        service.handle(host.id, ClientMsg::SelectLoadout { code, weapons: vec![0] });
        assert_eq!(host.next(), Some(ServerMsg::LoadoutSelected { weapons: vec![0] }));
    }

    #[test]
    fn disconnect_notifies_opponent_and_rejoin_keeps_coins() {
        let service = RoomService::new();
        let (host, mut guest, code) = pair(&service);
        credit(&service, &code, PlayerNumber::One, 200);

        service.disconnect(host.id);
        service.disconnect(host.id);
        assert!(matches!(guest.drain().as_slice(), [ServerMsg::PlayerLeft { .. }]));

        let mut returning = Client::connect(&service);
        service.handle(
            returning.id,
            ClientMsg::RejoinGame {
                code: code.clone(),
                player: PlayerNumber::One,
            },
        );
        assert!(returning.next().is_none());

        let room = service.registry().find_room(&code).unwrap();
        let session = room.lock();
        assert_eq!(session.seat_of(returning.id), Some(PlayerNumber::One));
        assert_eq!(session.player(PlayerNumber::One).unwrap().coins(), 200);
    }

    #[test]
    fn last_departure_deletes_room_and_rejoin_fails() {
        let service = RoomService::new();
        let (host, guest, code) = pair(&service);

        service.disconnect(host.id);
        service.disconnect(guest.id);
        assert!(service.registry().is_empty());

        let mut returning = Client::connect(&service);
        service.handle(
            returning.id,
            ClientMsg::RejoinGame {
                code,
                player: PlayerNumber::Two,
            },
        );
        assert_eq!(
            returning.next(),
            Some(ServerMsg::JoinError {
                message: "Room no longer exists!".to_string()
            })
        );
    }

    #[test]
    fn full_outbox_drops_without_blocking() {
        let service = RoomService::new();
        let (tx, mut rx) = mpsc::channel(1);
        let id = ConnectionId::new();
        service.register(id, tx);

        service.handle(id, ClientMsg::CreateRoom);
        service.handle(id, ClientMsg::CreateRoom);

        assert!(matches!(rx.try_recv(), Ok(ServerMsg::RoomCreated { .. })));
        assert!(rx.try_recv().is_err());
        // The second create moved the connection; the first room is gone.
        assert_eq!(service.registry().len(), 1);
    }
}
