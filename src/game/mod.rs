//! Combat engine: platformer physics, attacks, abilities and the battle tick

pub mod battle;
pub mod combat;
pub mod fighter;
pub mod physics;

pub use battle::{Battle, BattleOutcome, BattleStart, FighterLoadout, TickReport};
pub use combat::{CombatSystem, Health, HitResult, Projectile, MAX_HEALTH};
pub use fighter::{Fighter, FighterInput, MAX_LOADOUT};
pub use physics::{Body, Facing, PhysicsSystem};
