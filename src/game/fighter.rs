//! A fighter inside a running battle: body, health, loadout, attack and ability timers

use serde::{Deserialize, Serialize};

use crate::catalog::{Ability, AbilityKind, Weapon};
use crate::util::ids::PlayerNumber;
use crate::util::time::secs_to_ticks;

use super::combat::{CombatSystem, Defense, Health, ATTACK_COOLDOWN_TICKS, ATTACK_SWING_TICKS};
use super::physics::{Body, Facing, MoveInput, BOOSTED_WALK_SPEED, WALK_SPEED};

/// Maximum number of weapons a fighter carries into battle
pub const MAX_LOADOUT: usize = 3;

/// Everything a player presses during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterInput {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub attack: bool,
    /// Loadout slot to switch to
    #[serde(default)]
    pub switch_weapon: Option<usize>,
    #[serde(default)]
    pub use_ability: bool,
}

impl FighterInput {
    pub fn movement(&self) -> MoveInput {
        MoveInput {
            left: self.left,
            right: self.right,
            jump: self.jump,
        }
    }
}

/// Runtime state of the fighter's ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    pub ability: Ability,
    /// Ticks left on a sustained effect
    pub active_ticks: u32,
    /// Ticks until the ability can be activated again
    pub cooldown_ticks: u32,
}

impl AbilityState {
    pub fn new(ability: Ability) -> Self {
        Self {
            ability,
            active_ticks: 0,
            cooldown_ticks: 0,
        }
    }

    pub fn kind(&self) -> AbilityKind {
        self.ability.kind
    }

    pub fn is_active(&self) -> bool {
        self.active_ticks > 0
    }

    /// Try to trigger the ability. Returns true when it fired.
    ///
    /// Teleport is instant and only starts its cooldown. Every other ability
    /// runs for its duration, and its cooldown counts from activation.
    pub fn activate(&mut self) -> bool {
        if self.cooldown_ticks > 0 {
            return false;
        }

        match self.ability.kind {
            AbilityKind::Teleport => {
                self.cooldown_ticks = secs_to_ticks(self.ability.cooldown);
            }
            _ => {
                self.active_ticks = secs_to_ticks(self.ability.duration);
                self.cooldown_ticks = secs_to_ticks(self.ability.duration + self.ability.cooldown);
            }
        }
        true
    }

    pub fn tick(&mut self) {
        self.active_ticks = self.active_ticks.saturating_sub(1);
        self.cooldown_ticks = self.cooldown_ticks.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub number: PlayerNumber,
    pub body: Body,
    pub health: Health,
    pub loadout: Vec<Weapon>,
    pub current_weapon: usize,
    pub attack_cooldown: u32,
    pub attack_timer: u32,
    pub is_attacking: bool,
    pub ability: Option<AbilityState>,
}

impl Fighter {
    /// Spawn a fighter at full health. The loadout is cut to `MAX_LOADOUT`.
    pub fn spawn(
        number: PlayerNumber,
        x: f32,
        y: f32,
        facing: Facing,
        mut loadout: Vec<Weapon>,
        ability: Option<Ability>,
    ) -> Self {
        loadout.truncate(MAX_LOADOUT);

        Self {
            number,
            body: Body::fighter(x, y, facing),
            health: Health::full(),
            loadout,
            current_weapon: 0,
            attack_cooldown: 0,
            attack_timer: 0,
            is_attacking: false,
            ability: ability.map(AbilityState::new),
        }
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.loadout.get(self.current_weapon)
    }

    /// Out-of-range slots are ignored
    pub fn switch_weapon(&mut self, slot: usize) {
        if slot < self.loadout.len() {
            self.current_weapon = slot;
        }
    }

    /// Start a swing if the cooldown allows. Returns the weapon swung.
    pub fn try_attack(&mut self) -> Option<Weapon> {
        if !CombatSystem::can_attack(self.attack_cooldown) {
            return None;
        }
        let weapon = self.weapon()?.clone();

        self.is_attacking = true;
        self.attack_timer = ATTACK_SWING_TICKS;
        self.attack_cooldown = ATTACK_COOLDOWN_TICKS;
        Some(weapon)
    }

    /// Returns the kind of ability that fired, if any
    pub fn try_use_ability(&mut self) -> Option<AbilityKind> {
        let state = self.ability.as_mut()?;
        if state.activate() {
            Some(state.kind())
        } else {
            None
        }
    }

    pub fn update_timers(&mut self) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);

        if self.attack_timer > 0 {
            self.attack_timer -= 1;
        } else {
            self.is_attacking = false;
        }

        if let Some(state) = self.ability.as_mut() {
            state.tick();
        }
    }

    fn active_ability(&self) -> Option<AbilityKind> {
        self.ability
            .as_ref()
            .filter(|state| state.is_active())
            .map(AbilityState::kind)
    }

    pub fn walk_speed(&self) -> f32 {
        match self.active_ability() {
            Some(AbilityKind::Speed) => BOOSTED_WALK_SPEED,
            _ => WALK_SPEED,
        }
    }

    pub fn defense(&self) -> Defense {
        match self.active_ability() {
            Some(AbilityKind::Shield) => Defense::Shielded,
            Some(AbilityKind::Invisibility) => Defense::Untargetable,
            _ => Defense::Exposed,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health.is_depleted()
    }
}
