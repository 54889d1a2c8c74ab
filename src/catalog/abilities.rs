//! Ability table and draws

use rand::Rng;
use serde::{Deserialize, Serialize};

/// What an active ability does to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Untargetable: projectiles pass through, swings miss
    Invisibility,
    /// Absorbs all incoming damage
    Shield,
    /// Doubles walking speed
    Speed,
    /// Jumps to the safest platform on each activation
    Teleport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub kind: AbilityKind,
    /// How long the effect lasts, in seconds
    pub duration: u32,
    /// Seconds before the ability can be activated again
    pub cooldown: u32,
    pub description: String,
}

impl Ability {
    pub fn for_kind(kind: AbilityKind) -> Self {
        let (name, duration, cooldown, description) = match kind {
            AbilityKind::Invisibility => (
                "Invisibility",
                10,
                10,
                "Become 20% visible - enemies can't hit you!",
            ),
            AbilityKind::Shield => ("Shield", 10, 10, "Blue bubble blocks ALL damage"),
            AbilityKind::Speed => ("Speed", 10, 10, "Move 2x faster!"),
            AbilityKind::Teleport => ("Teleport", 10, 2, "Instantly move to a random safe spot"),
        };

        Self {
            name: name.to_string(),
            kind,
            duration,
            cooldown,
            description: description.to_string(),
        }
    }
}

pub const ALL_ABILITIES: [AbilityKind; 4] = [
    AbilityKind::Invisibility,
    AbilityKind::Shield,
    AbilityKind::Speed,
    AbilityKind::Teleport,
];

pub fn random_ability<R: Rng + ?Sized>(rng: &mut R) -> Ability {
    Ability::for_kind(ALL_ABILITIES[rng.gen_range(0..ALL_ABILITIES.len())])
}
