//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::catalog::{ArenaMap, StoreItem};
use crate::game::FighterLoadout;
use crate::room::code::RoomCode;
use crate::room::session::{ItemKind, PurchasedItem};
use crate::util::ids::PlayerNumber;

/// Longest action name relayed between peers
pub const MAX_ACTION_LEN: usize = 32;

/// Name of a relayed gameplay action ("move", "attack", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionName(String);

impl ActionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActionName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err("action name is empty".to_string());
        }
        if value.len() > MAX_ACTION_LEN {
            return Err(format!("action name longer than {MAX_ACTION_LEN} bytes"));
        }
        Ok(Self(value))
    }
}

impl From<ActionName> for String {
    fn from(name: ActionName) -> Self {
        name.0
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Open a new room and take seat 1
    CreateRoom,

    JoinGameRoom {
        code: RoomCode,
    },

    PlayerReady {
        code: RoomCode,
    },

    /// Re-attach after a dropped connection
    RejoinGame {
        code: RoomCode,
        player: PlayerNumber,
    },

    /// Gameplay intent relayed verbatim to the opponent
    PlayerAction {
        code: RoomCode,
        action: ActionName,
        #[serde(default)]
        action_data: serde_json::Value,
    },

    BuyItem {
        code: RoomCode,
        item_type: StoreItem,
    },

    /// Inventory indices to carry into the next battle
    SelectLoadout {
        code: RoomCode,
        weapons: Vec<usize>,
    },

    /// Both fighters dropped to zero on the same tick
    DeclareTie {
        code: RoomCode,
    },

    GameOver {
        code: RoomCode,
        winner: PlayerNumber,
    },
}

impl ClientMsg {
    /// Room the message targets, if any
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            ClientMsg::CreateRoom => None,
            ClientMsg::JoinGameRoom { code }
            | ClientMsg::PlayerReady { code }
            | ClientMsg::RejoinGame { code, .. }
            | ClientMsg::PlayerAction { code, .. }
            | ClientMsg::BuyItem { code, .. }
            | ClientMsg::SelectLoadout { code, .. }
            | ClientMsg::DeclareTie { code }
            | ClientMsg::GameOver { code, .. } => Some(code),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Connected {
        message: String,
    },

    RoomCreated {
        code: RoomCode,
        player_number: PlayerNumber,
        message: String,
    },

    RoomJoined {
        code: RoomCode,
        player_number: PlayerNumber,
        message: String,
    },

    /// Both seats are filled
    RoomReady {
        message: String,
    },

    JoinError {
        message: String,
    },

    /// Battle begins. Both peers simulate from this.
    GameStart {
        map: ArenaMap,
        fighters: [FighterLoadout; 2],
        message: String,
    },

    OpponentAction {
        action: ActionName,
        data: serde_json::Value,
    },

    ItemPurchased {
        item_type: ItemKind,
        item: PurchasedItem,
        coins_left: u32,
    },

    BuyError {
        message: String,
    },

    LoadoutSelected {
        weapons: Vec<usize>,
    },

    LoadoutError {
        message: String,
    },

    TiebreakerStart {
        message: String,
    },

    BattleResult {
        winner: PlayerNumber,
        reward: u32,
    },

    PlayerLeft {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_with_lowercase_code() {
        let msg: ClientMsg =
            serde_json::from_value(json!({"type": "join_game_room", "code": "abc123"})).unwrap();
        match msg {
            ClientMsg::JoinGameRoom { code } => assert_eq!(code.as_str(), "ABC123"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type_and_bad_fields() {
        assert!(serde_json::from_value::<ClientMsg>(json!({"type": "teleport_me"})).is_err());
        assert!(serde_json::from_value::<ClientMsg>(
            json!({"type": "buy_item", "code": "ABC123", "item_type": "hat"})
        )
        .is_err());
        assert!(serde_json::from_value::<ClientMsg>(
            json!({"type": "rejoin_game", "code": "ABC123", "player": 3})
        )
        .is_err());
        assert!(serde_json::from_value::<ClientMsg>(
            json!({"type": "player_ready", "code": "AB"})
        )
        .is_err());
    }

    #[test]
    fn action_names_are_bounded() {
        let empty = json!({"type": "player_action", "code": "ABC123", "action": ""});
        assert!(serde_json::from_value::<ClientMsg>(empty).is_err());

        let long = json!({"type": "player_action", "code": "ABC123", "action": "x".repeat(33)});
        assert!(serde_json::from_value::<ClientMsg>(long).is_err());

        let ok = json!({"type": "player_action", "code": "ABC123", "action": "jump"});
        match serde_json::from_value::<ClientMsg>(ok).unwrap() {
            ClientMsg::PlayerAction {
                action,
                action_data,
                ..
            } => {
                assert_eq!(action.as_str(), "jump");
                assert!(action_data.is_null());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_messages_are_tagged_snake_case() {
        let msg = ServerMsg::BattleResult {
            winner: PlayerNumber::Two,
            reward: 100,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "battle_result", "winner": 2, "reward": 100})
        );

        let msg = ServerMsg::RoomCreated {
            code: RoomCode::parse("QWE987").unwrap(),
            player_number: PlayerNumber::One,
            message: "Room created".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "room_created");
        assert_eq!(value["player_number"], 1);
        assert_eq!(value["code"], "QWE987");
    }

    #[test]
    fn purchase_carries_item_kind() {
        let msg = ServerMsg::ItemPurchased {
            item_type: ItemKind::Skin,
            item: PurchasedItem::Skin(crate::catalog::Skin {
                name: "Teal".to_string(),
                color: "#1abc9c".to_string(),
            }),
            coins_left: 5,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["item_type"], "skin");
        assert_eq!(value["item"]["color"], "#1abc9c");
        assert_eq!(value["coins_left"], 5);
    }
}
