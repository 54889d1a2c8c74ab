//! Combat system - health, attack gating, melee reach, projectiles

use serde::{Deserialize, Serialize};

use crate::catalog::Weapon;
use crate::util::ids::PlayerNumber;

use super::physics::{Body, Facing, ARENA_WIDTH};

/// Health every fighter starts a battle with
pub const MAX_HEALTH: u32 = 100;
/// Ticks between accepted attack triggers (one second)
pub const ATTACK_COOLDOWN_TICKS: u32 = 60;
/// Length of the swing animation in ticks
pub const ATTACK_SWING_TICKS: u32 = 15;
/// The only swing tick on which a melee hit can land
pub const MELEE_HIT_TICK: u32 = ATTACK_SWING_TICKS - 1;
/// Maximum vertical center-to-center distance for a melee hit
pub const MELEE_VERTICAL_REACH: f32 = 40.0;
/// Projectile hitbox width
pub const PROJECTILE_WIDTH: f32 = 10.0;
/// Projectile hitbox height
pub const PROJECTILE_HEIGHT: f32 = 5.0;

/// Hit points clamped to `0..=MAX_HEALTH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Health(u32);

impl Health {
    pub fn full() -> Self {
        Self(MAX_HEALTH)
    }

    pub fn current(self) -> u32 {
        self.0
    }

    /// Subtract damage, never going below zero. Returns true when this hit
    /// emptied the bar.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.0 > 0;
        self.0 = self.0.saturating_sub(amount);
        was_alive && self.0 == 0
    }

    pub fn is_depleted(self) -> bool {
        self.0 == 0
    }

    pub fn reset(&mut self) {
        self.0 = MAX_HEALTH;
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::full()
    }
}

/// How a fighter currently reacts to incoming hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defense {
    /// Takes full damage
    Exposed,
    /// Hit connects but deals nothing
    Shielded,
    /// Cannot be hit at all
    Untargetable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    Melee,
    Projectile,
}

/// Hit result from combat resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitResult {
    pub attacker: PlayerNumber,
    pub target: PlayerNumber,
    pub source: HitSource,
    /// Damage actually applied (0 when shielded)
    pub damage: u32,
    pub target_health: u32,
    pub target_defeated: bool,
}

/// Active projectile in a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: PlayerNumber,
    pub x: f32,
    pub y: f32,
    /// -1.0 travelling left, 1.0 travelling right
    pub direction: f32,
    pub damage: u32,
    pub speed: f32,
    pub active: bool,
}

impl Projectile {
    /// Spawn just outside the firer's leading edge at mid-height so the shot
    /// can never overlap its own firer.
    pub fn spawn(owner: PlayerNumber, firer: &Body, weapon: &Weapon) -> Self {
        let x = match firer.facing {
            Facing::Right => firer.x + firer.width,
            Facing::Left => firer.x - PROJECTILE_WIDTH,
        };

        Self {
            owner,
            x,
            y: firer.center_y(),
            direction: firer.facing.sign(),
            damage: weapon.damage,
            speed: weapon.projectile_speed(),
            active: true,
        }
    }

    /// Move one tick. Leaving the arena horizontally deactivates the shot.
    pub fn advance(&mut self) {
        self.x += self.direction * self.speed;
        if self.x < 0.0 || self.x > ARENA_WIDTH {
            self.active = false;
        }
    }

    pub fn overlaps(&self, body: &Body) -> bool {
        body.overlaps(self.x, self.y, PROJECTILE_WIDTH, PROJECTILE_HEIGHT)
    }
}

/// Combat rules shared by every fighter
pub struct CombatSystem;

impl CombatSystem {
    /// Attacks are accepted only once the cooldown has run out
    pub fn can_attack(attack_cooldown: u32) -> bool {
        attack_cooldown == 0
    }

    /// Whether a swing in progress lands on the defender this tick.
    ///
    /// Only the single hit tick of the swing counts, so a swing damages at
    /// most once even though the attack state lasts for several ticks.
    pub fn melee_connects(
        attacker: &Body,
        is_attacking: bool,
        attack_timer: u32,
        defender: &Body,
        weapon: &Weapon,
    ) -> bool {
        if !is_attacking || attack_timer != MELEE_HIT_TICK || !weapon.is_melee() {
            return false;
        }

        let in_range = match attacker.facing {
            Facing::Right => {
                defender.x > attacker.x && defender.x < attacker.x + weapon.range() + attacker.width
            }
            Facing::Left => {
                defender.x < attacker.x && defender.x > attacker.x - weapon.range() - defender.width
            }
        };

        let vertical_aligned =
            (attacker.center_y() - defender.center_y()).abs() < MELEE_VERTICAL_REACH;

        in_range && vertical_aligned
    }

    /// Apply damage according to the target's defense. Returns the damage
    /// actually dealt.
    pub fn apply_hit(health: &mut Health, defense: Defense, damage: u32) -> u32 {
        match defense {
            Defense::Exposed => {
                health.apply_damage(damage);
                damage
            }
            Defense::Shielded | Defense::Untargetable => 0,
        }
    }
}
