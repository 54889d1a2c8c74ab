//! Per-player economy and equipment, kept across battles within a room

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Ability, Skin, Weapon};
use crate::game::{FighterLoadout, Health, MAX_LOADOUT};
use crate::util::ids::PlayerNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("not enough coins: costs {price}, have {balance}")]
    InsufficientFunds { price: u32, balance: u32 },

    #[error("invalid loadout: {0}")]
    InvalidLoadout(String),
}

/// A seated player's persistent state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub number: PlayerNumber,
    coins: u32,
    /// Owned weapons, newest last. Never shrinks, so loadout indices stay valid.
    inventory: Vec<Weapon>,
    /// Inventory indices carried into battle
    loadout: Vec<usize>,
    ability: Option<Ability>,
    skin: Option<Skin>,
    pub ready: bool,
    health: Health,
}

impl Player {
    /// Fresh player with no coins and a single starter weapon equipped
    pub fn new(number: PlayerNumber, starter: Weapon) -> Self {
        Self {
            number,
            coins: 0,
            inventory: vec![starter],
            loadout: vec![0],
            ability: None,
            skin: None,
            ready: false,
            health: Health::full(),
        }
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn inventory(&self) -> &[Weapon] {
        &self.inventory
    }

    pub fn ability(&self) -> Option<&Ability> {
        self.ability.as_ref()
    }

    pub fn skin(&self) -> Option<&Skin> {
        self.skin.as_ref()
    }

    pub fn health(&self) -> u32 {
        self.health.current()
    }

    pub fn credit(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    pub fn debit(&mut self, amount: u32) -> Result<(), PlayerError> {
        if amount > self.coins {
            return Err(PlayerError::InsufficientFunds {
                price: amount,
                balance: self.coins,
            });
        }
        self.coins -= amount;
        Ok(())
    }

    pub fn add_to_inventory(&mut self, weapon: Weapon) {
        self.inventory.push(weapon);
    }

    /// Replaces any previous ability outright
    pub fn set_ability(&mut self, ability: Ability) {
        self.ability = Some(ability);
    }

    pub fn set_skin(&mut self, skin: Skin) {
        self.skin = Some(skin);
    }

    /// Pick up to three distinct inventory slots to carry into battle
    pub fn select_loadout(&mut self, indices: &[usize]) -> Result<(), PlayerError> {
        if indices.is_empty() || indices.len() > MAX_LOADOUT {
            return Err(PlayerError::InvalidLoadout(format!(
                "choose between 1 and {MAX_LOADOUT} weapons"
            )));
        }

        for (pos, &index) in indices.iter().enumerate() {
            if index >= self.inventory.len() {
                return Err(PlayerError::InvalidLoadout(format!("no weapon in slot {index}")));
            }
            if indices[..pos].contains(&index) {
                return Err(PlayerError::InvalidLoadout(format!("slot {index} chosen twice")));
            }
        }

        self.loadout = indices.to_vec();
        Ok(())
    }

    pub fn loadout_indices(&self) -> &[usize] {
        &self.loadout
    }

    pub fn loadout_weapons(&self) -> Vec<Weapon> {
        self.loadout
            .iter()
            .filter_map(|&index| self.inventory.get(index).cloned())
            .collect()
    }

    /// Snapshot of what this player fights with
    pub fn fighter_loadout(&self) -> FighterLoadout {
        FighterLoadout {
            player_number: self.number,
            weapons: self.loadout_weapons(),
            ability: self.ability.clone(),
        }
    }

    /// Restore health before a battle. The ready flag is left alone.
    pub fn reset_for_battle(&mut self) {
        self.health.reset();
    }

    pub fn apply_damage(&mut self, amount: u32) {
        self.health.apply_damage(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AbilityKind, WeaponKind};
    use crate::game::MAX_HEALTH;

    fn player() -> Player {
        Player::new(PlayerNumber::One, Weapon::new("Sword", 5, WeaponKind::Melee, 1))
    }

    #[test]
    fn fresh_player_has_starter_equipped() {
        let p = player();
        assert_eq!(p.coins(), 0);
        assert_eq!(p.inventory().len(), 1);
        assert_eq!(p.loadout_weapons(), p.inventory().to_vec());
        assert!(!p.ready);
        assert_eq!(p.health(), MAX_HEALTH);
    }

    #[test]
    fn debit_refuses_overdraft() {
        let mut p = player();
        p.credit(50);
        assert_eq!(
            p.debit(200),
            Err(PlayerError::InsufficientFunds {
                price: 200,
                balance: 50
            })
        );
        assert_eq!(p.coins(), 50);
        assert!(p.debit(50).is_ok());
        assert_eq!(p.coins(), 0);
    }

    #[test]
    fn ability_is_replaced_not_stacked() {
        let mut p = player();
        p.set_ability(Ability::for_kind(AbilityKind::Shield));
        p.set_ability(Ability::for_kind(AbilityKind::Speed));
        assert_eq!(p.ability().map(|a| a.kind), Some(AbilityKind::Speed));
    }

    #[test]
    fn loadout_selection_is_validated() {
        let mut p = player();
        p.add_to_inventory(Weapon::new("Bow", 8, WeaponKind::Ranged, 1));
        p.add_to_inventory(Weapon::new("Axe", 7, WeaponKind::Melee, 1));
        p.add_to_inventory(Weapon::new("Spear", 6, WeaponKind::Melee, 1));

        assert!(p.select_loadout(&[0, 1, 2, 3]).is_err());
        assert!(p.select_loadout(&[1, 1]).is_err());
        assert!(p.select_loadout(&[4]).is_err());
        assert!(p.select_loadout(&[]).is_err());
        assert_eq!(p.loadout_indices(), &[0]);

        p.select_loadout(&[3, 1]).unwrap();
        let names: Vec<_> = p.loadout_weapons().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Spear", "Bow"]);
    }

    #[test]
    fn damage_clamps_and_reset_restores() {
        let mut p = player();
        p.ready = true;
        p.apply_damage(250);
        assert_eq!(p.health(), 0);
        p.reset_for_battle();
        assert_eq!(p.health(), MAX_HEALTH);
        assert!(p.ready);
    }
}
