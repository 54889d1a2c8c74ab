//! Read-only game data: weapons, abilities, maps, skins and store prices
//!
//! Every table here is immutable. Random draws take the caller's RNG so a room
//! can replay its own draws from a seed.

pub mod abilities;
pub mod maps;
pub mod skins;
pub mod weapons;

pub use abilities::{random_ability, Ability, AbilityKind};
pub use maps::{random_map, ArenaMap, Hazard, MapId, Platform};
pub use skins::{random_skin, Skin};
pub use weapons::{random_mystery_box_weapon, random_tier1_weapon, Weapon, WeaponKind};

use serde::{Deserialize, Serialize};

/// Coins credited to the winner of a battle
pub const WIN_REWARD: u32 = 100;

/// Items sold in the between-battle store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreItem {
    /// One tier-weighted random weapon
    MysteryBox,
    /// A random ability, replacing the current one
    Ability,
    /// A random cosmetic skin for the buyer's seat
    Skin,
}

impl StoreItem {
    pub fn price(self) -> u32 {
        match self {
            StoreItem::MysteryBox => 100,
            StoreItem::Ability => 200,
            StoreItem::Skin => 10,
        }
    }
}
