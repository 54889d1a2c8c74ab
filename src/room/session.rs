//! Room session state machine: seating, readiness, store, settlement, rejoin

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{
    random_ability, random_map, random_mystery_box_weapon, random_skin, random_tier1_weapon,
    Ability, ArenaMap, Skin, StoreItem, Weapon, WIN_REWARD,
};
use crate::game::BattleStart;
use crate::player::{Player, PlayerError};
use crate::util::ids::{ConnectionId, PlayerNumber};

use super::code::RoomCode;

/// Errors raised by room operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Not enough coins! Need {price}, have {balance}")]
    InsufficientFunds { price: u32, balance: u32 },

    #[error("connection is not seated in this room")]
    NotInRoom,

    #[error("{0}")]
    InvalidLoadout(String),

    #[error("no battle in progress")]
    BattleNotActive,
}

impl From<PlayerError> for SessionError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::InsufficientFunds { price, balance } => {
                SessionError::InsufficientFunds { price, balance }
            }
            PlayerError::InvalidLoadout(reason) => SessionError::InvalidLoadout(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Gathering players or waiting for both to be ready
    Waiting,
    /// A battle is running on the clients
    Playing,
    /// Last battle settled; players may shop and ready up again
    Finished,
}

/// One occupied roster slot
#[derive(Debug, Clone)]
pub struct Seat {
    pub connection: ConnectionId,
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadyOutcome {
    /// Still waiting on the other player
    Waiting,
    /// Both ready; the battle has begun
    Started(BattleStart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Ability,
    Skin,
}

/// What a store purchase produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PurchasedItem {
    Weapon(Weapon),
    Ability(Ability),
    Skin(Skin),
}

impl PurchasedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            PurchasedItem::Weapon(_) => ItemKind::Weapon,
            PurchasedItem::Ability(_) => ItemKind::Ability,
            PurchasedItem::Skin(_) => ItemKind::Skin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub item: PurchasedItem,
    pub coins_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieDeclaration {
    /// First report this battle; the tiebreaker starts now
    Triggered,
    AlreadyPending,
}

/// Returned when a connection leaves its seat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player_number: PlayerNumber,
    /// Connections still seated after the departure
    pub remaining: Vec<ConnectionId>,
}

/// Public view of a room
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub state: RoomState,
    pub players: usize,
    pub created_at: DateTime<Utc>,
}

/// One room: a two-seat roster plus everything needed to run repeated battles
#[derive(Debug)]
pub struct Session {
    code: RoomCode,
    state: RoomState,
    roster: [Option<Seat>; 2],
    /// Players who left, kept per seat until someone rejoins as them
    parked: [Option<Player>; 2],
    current_map: Option<ArenaMap>,
    created_at: DateTime<Utc>,
    rng: ChaCha8Rng,
    tiebreaker_pending: bool,
    closed: bool,
}

impl Session {
    pub fn new(code: RoomCode, seed: u64) -> Self {
        Self {
            code,
            state: RoomState::Waiting,
            roster: [None, None],
            parked: [None, None],
            current_map: None,
            created_at: Utc::now(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            tiebreaker_pending: false,
            closed: false,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn current_map(&self) -> Option<&ArenaMap> {
        self.current_map.as_ref()
    }

    pub fn tiebreaker_pending(&self) -> bool {
        self.tiebreaker_pending
    }

    pub fn player_count(&self) -> usize {
        self.roster.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.player_count() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Called by the registry when it deletes the room
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            state: self.state,
            players: self.player_count(),
            created_at: self.created_at,
        }
    }

    pub fn player(&self, number: PlayerNumber) -> Option<&Player> {
        self.roster[number.index()].as_ref().map(|seat| &seat.player)
    }

    pub fn connection_of(&self, number: PlayerNumber) -> Option<ConnectionId> {
        self.roster[number.index()].as_ref().map(|seat| seat.connection)
    }

    pub fn seat_of(&self, connection: ConnectionId) -> Option<PlayerNumber> {
        PlayerNumber::ALL
            .into_iter()
            .find(|number| self.connection_of(*number) == Some(connection))
    }

    pub fn occupants(&self) -> Vec<ConnectionId> {
        self.roster.iter().flatten().map(|seat| seat.connection).collect()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::RoomNotFound)
        } else {
            Ok(())
        }
    }

    fn seated(&self, connection: ConnectionId) -> Result<PlayerNumber, SessionError> {
        self.ensure_open()?;
        self.seat_of(connection).ok_or(SessionError::NotInRoom)
    }

    fn seat_mut(&mut self, number: PlayerNumber) -> Result<&mut Seat, SessionError> {
        self.roster[number.index()]
            .as_mut()
            .ok_or(SessionError::NotInRoom)
    }

    /// Seat a fresh player at the requested number, or the first free one
    pub fn join(
        &mut self,
        connection: ConnectionId,
        requested: Option<PlayerNumber>,
    ) -> Result<PlayerNumber, SessionError> {
        self.ensure_open()?;

        if let Some(number) = self.seat_of(connection) {
            return Ok(number);
        }

        let number = match requested {
            Some(number) if self.roster[number.index()].is_none() => number,
            Some(_) => return Err(SessionError::RoomFull),
            None => PlayerNumber::ALL
                .into_iter()
                .find(|number| self.roster[number.index()].is_none())
                .ok_or(SessionError::RoomFull)?,
        };

        if self.state == RoomState::Playing {
            self.abandon_battle();
        }

        let starter = random_tier1_weapon(&mut self.rng);
        self.parked[number.index()] = None;
        self.roster[number.index()] = Some(Seat {
            connection,
            player: Player::new(number, starter),
        });

        info!(room = %self.code, connection = %connection, player = %number, "Player joined room");
        Ok(number)
    }

    /// A newcomer replaced a departed fighter. The old battle ends unpaid.
    fn abandon_battle(&mut self) {
        for seat in self.roster.iter_mut().flatten() {
            seat.player.ready = false;
        }
        self.state = RoomState::Waiting;
        self.tiebreaker_pending = false;
        self.current_map = None;

        info!(room = %self.code, "Battle abandoned");
    }

    /// Mark the connection's player ready and start a battle once both are.
    /// Readiness changes nothing while a battle is running.
    pub fn set_ready(&mut self, connection: ConnectionId) -> Result<ReadyOutcome, SessionError> {
        let number = self.seated(connection)?;
        if self.state == RoomState::Playing {
            return Ok(ReadyOutcome::Waiting);
        }

        self.seat_mut(number)?.player.ready = true;

        let all_ready = self
            .roster
            .iter()
            .all(|seat| seat.as_ref().is_some_and(|seat| seat.player.ready));
        if !all_ready {
            return Ok(ReadyOutcome::Waiting);
        }

        let map = random_map(&mut self.rng);
        let mut fighters = Vec::with_capacity(2);
        for seat in self.roster.iter_mut().flatten() {
            seat.player.reset_for_battle();
            fighters.push(seat.player.fighter_loadout());
        }
        let fighters: [_; 2] = fighters
            .try_into()
            .map_err(|_| SessionError::NotInRoom)?;

        self.state = RoomState::Playing;
        self.tiebreaker_pending = false;
        self.current_map = Some(map.clone());

        info!(room = %self.code, map = %map.name, "Battle started");
        Ok(ReadyOutcome::Started(BattleStart { map, fighters }))
    }

    /// Re-attach a connection to a seat. Returns the connection it displaced.
    ///
    /// An occupied seat keeps its player and only swaps the connection. An
    /// empty seat restores the parked player for that number, or a fresh one.
    pub fn rejoin(
        &mut self,
        connection: ConnectionId,
        number: PlayerNumber,
    ) -> Result<Option<ConnectionId>, SessionError> {
        self.ensure_open()?;

        if let Some(current) = self.seat_of(connection) {
            if current != number {
                return Err(SessionError::RoomFull);
            }
            return Ok(None);
        }

        let idx = number.index();
        if let Some(seat) = self.roster[idx].as_mut() {
            let displaced = std::mem::replace(&mut seat.connection, connection);
            info!(room = %self.code, player = %number, displaced = %displaced, "Seat taken over by rejoin");
            return Ok(Some(displaced));
        }

        let player = match self.parked[idx].take() {
            Some(player) => player,
            None => Player::new(number, random_tier1_weapon(&mut self.rng)),
        };
        self.roster[idx] = Some(Seat { connection, player });

        info!(room = %self.code, connection = %connection, player = %number, "Player rejoined room");
        Ok(None)
    }

    /// The other occupant, if any, for relaying an action
    pub fn relay_target(&self, connection: ConnectionId) -> Result<Option<ConnectionId>, SessionError> {
        let number = self.seated(connection)?;
        Ok(self.connection_of(number.opponent()))
    }

    pub fn purchase(&mut self, connection: ConnectionId, item: StoreItem) -> Result<Purchase, SessionError> {
        let number = self.seated(connection)?;
        let idx = number.index();
        let rng = &mut self.rng;
        let seat = self.roster[idx].as_mut().ok_or(SessionError::NotInRoom)?;

        seat.player.debit(item.price())?;

        let item = match item {
            StoreItem::MysteryBox => {
                let weapon = random_mystery_box_weapon(rng);
                seat.player.add_to_inventory(weapon.clone());
                PurchasedItem::Weapon(weapon)
            }
            StoreItem::Ability => {
                let ability = random_ability(rng);
                seat.player.set_ability(ability.clone());
                PurchasedItem::Ability(ability)
            }
            StoreItem::Skin => {
                let skin = random_skin(rng, number);
                seat.player.set_skin(skin.clone());
                PurchasedItem::Skin(skin)
            }
        };

        let coins_left = seat.player.coins();
        debug!(room = %self.code, player = %number, kind = ?item.kind(), coins_left, "Purchase completed");
        Ok(Purchase { item, coins_left })
    }

    pub fn select_loadout(
        &mut self,
        connection: ConnectionId,
        indices: &[usize],
    ) -> Result<Vec<usize>, SessionError> {
        let number = self.seated(connection)?;
        let player = &mut self.seat_mut(number)?.player;
        player.select_loadout(indices)?;
        Ok(player.loadout_indices().to_vec())
    }

    /// Report that both fighters fell on the same tick
    pub fn declare_tie(&mut self, connection: ConnectionId) -> Result<TieDeclaration, SessionError> {
        self.seated(connection)?;
        if self.state != RoomState::Playing {
            return Err(SessionError::BattleNotActive);
        }
        if self.tiebreaker_pending {
            return Ok(TieDeclaration::AlreadyPending);
        }

        self.tiebreaker_pending = true;
        info!(room = %self.code, "Tiebreaker started");
        Ok(TieDeclaration::Triggered)
    }

    /// Close out the running battle and pay the winner.
    ///
    /// Only valid while Playing, so the second of two matching reports is
    /// rejected instead of paying twice.
    pub fn settle_battle(
        &mut self,
        connection: ConnectionId,
        winner: PlayerNumber,
    ) -> Result<u32, SessionError> {
        self.seated(connection)?;
        if self.state != RoomState::Playing {
            return Err(SessionError::BattleNotActive);
        }

        let idx = winner.index();
        if let Some(seat) = self.roster[idx].as_mut() {
            seat.player.credit(WIN_REWARD);
        } else if let Some(parked) = self.parked[idx].as_mut() {
            parked.credit(WIN_REWARD);
        }

        for seat in self.roster.iter_mut().flatten() {
            seat.player.ready = false;
        }
        self.state = RoomState::Finished;
        self.tiebreaker_pending = false;

        info!(room = %self.code, winner = %winner, reward = WIN_REWARD, "Battle settled");
        Ok(WIN_REWARD)
    }

    /// Vacate the connection's seat, parking the player for a later rejoin.
    /// Returns `None` if the connection holds no seat.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<Departure> {
        let number = self.seat_of(connection)?;
        let idx = number.index();
        let mut seat = self.roster[idx].take()?;
        seat.player.ready = false;
        self.parked[idx] = Some(seat.player);

        info!(room = %self.code, connection = %connection, player = %number, "Player left room");
        Some(Departure {
            player_number: number,
            remaining: self.occupants(),
        })
    }
}
