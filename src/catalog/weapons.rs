//! Weapon tables and draws

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a weapon delivers damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Hits once per swing within reach
    Melee,
    /// Fires a projectile
    Ranged,
}

/// A weapon value. Weapons have no identity beyond the slot holding them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub damage: u32,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    pub tier: u8,
}

/// Horizontal reach of every melee weapon, beyond the attacker's body
pub const MELEE_RANGE: f32 = 50.0;

/// Horizontal speed of every projectile, per tick
pub const PROJECTILE_SPEED: f32 = 10.0;

impl Weapon {
    pub fn new(name: &str, damage: u32, kind: WeaponKind, tier: u8) -> Self {
        Self {
            name: name.to_string(),
            damage,
            kind,
            tier,
        }
    }

    pub fn is_melee(&self) -> bool {
        self.kind == WeaponKind::Melee
    }

    /// Melee reach in pixels (0 for ranged weapons)
    pub fn range(&self) -> f32 {
        match self.kind {
            WeaponKind::Melee => MELEE_RANGE,
            WeaponKind::Ranged => 0.0,
        }
    }

    /// Projectile speed in pixels per tick (0 for melee weapons)
    pub fn projectile_speed(&self) -> f32 {
        match self.kind {
            WeaponKind::Melee => 0.0,
            WeaponKind::Ranged => PROJECTILE_SPEED,
        }
    }
}

type WeaponRow = (&'static str, u32, WeaponKind);

const TIER_1: &[WeaponRow] = &[
    ("Sword", 5, WeaponKind::Melee),
    ("Banana Sword", 7, WeaponKind::Melee),
    ("Bow", 8, WeaponKind::Ranged),
    ("Fish", 5, WeaponKind::Melee),
    ("Water Gun", 6, WeaponKind::Ranged),
    ("Snowball Launcher", 7, WeaponKind::Ranged),
];

const TIER_2: &[WeaponRow] = &[
    ("Sword", 10, WeaponKind::Melee),
    ("Gun", 12, WeaponKind::Ranged),
    ("Bow", 15, WeaponKind::Ranged),
    ("Frying Pan", 10, WeaponKind::Melee),
    ("Confetti Cannon", 11, WeaponKind::Ranged),
    ("Boomerang", 12, WeaponKind::Ranged),
];

const TIER_3: &[WeaponRow] = &[
    ("Giant Lollipop", 15, WeaponKind::Melee),
    ("Firework Launcher", 17, WeaponKind::Ranged),
];

const TIER_4: &[WeaponRow] = &[
    ("Disco Ball", 20, WeaponKind::Ranged),
    ("Lightsaber", 22, WeaponKind::Melee),
    ("Chainsaw", 23, WeaponKind::Melee),
    ("Bomb Thrower", 24, WeaponKind::Ranged),
];

const TIER_5: &[WeaponRow] = &[
    ("Electric Guitar", 32, WeaponKind::Melee),
    ("Bazooka", 35, WeaponKind::Ranged),
];

/// Mystery box rarity: (tier, weight out of 100)
pub const TIER_WEIGHTS: [(u8, u32); 5] = [(1, 40), (2, 30), (3, 15), (4, 10), (5, 5)];

/// All weapons of one tier. Tiers outside 1..=5 have none.
pub fn weapons_of_tier(tier: u8) -> Vec<Weapon> {
    tier_rows(tier)
        .iter()
        .map(|(name, damage, kind)| Weapon::new(name, *damage, *kind, tier))
        .collect()
}

fn tier_rows(tier: u8) -> &'static [WeaponRow] {
    match tier {
        1 => TIER_1,
        2 => TIER_2,
        3 => TIER_3,
        4 => TIER_4,
        5 => TIER_5,
        _ => &[],
    }
}

fn draw_from_tier<R: Rng + ?Sized>(rng: &mut R, tier: u8) -> Weapon {
    let rows = tier_rows(tier);
    let (name, damage, kind) = rows[rng.gen_range(0..rows.len())];
    Weapon::new(name, damage, kind, tier)
}

/// Starter weapon handed to every newly seated player
pub fn random_tier1_weapon<R: Rng + ?Sized>(rng: &mut R) -> Weapon {
    draw_from_tier(rng, 1)
}

/// Pick a tier by rarity weight, then a weapon uniformly inside it
pub fn random_mystery_box_weapon<R: Rng + ?Sized>(rng: &mut R) -> Weapon {
    let total: u32 = TIER_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    let mut chosen = TIER_WEIGHTS[0].0;
    for (tier, weight) in TIER_WEIGHTS {
        if roll < weight {
            chosen = tier;
            break;
        }
        roll -= weight;
    }
    draw_from_tier(rng, chosen)
}
