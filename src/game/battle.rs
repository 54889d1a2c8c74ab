//! Deterministic two-fighter battle: one fixed-order step per tick

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Ability, AbilityKind, ArenaMap, Platform, Weapon};
use crate::util::ids::PlayerNumber;

use super::combat::{CombatSystem, Defense, HitResult, HitSource, Projectile};
use super::fighter::{Fighter, FighterInput};
use super::physics::{Facing, PhysicsSystem};

/// Spawn points as (x, y, facing), indexed by player number
const SPAWNS: [(f32, f32, Facing); 2] = [(100.0, 100.0, Facing::Right), (1000.0, 100.0, Facing::Left)];

/// What one player brings into a battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterLoadout {
    pub player_number: PlayerNumber,
    pub weapons: Vec<Weapon>,
    pub ability: Option<Ability>,
}

/// Everything both peers need to start the same battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleStart {
    pub map: ArenaMap,
    pub fighters: [FighterLoadout; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "winner")]
pub enum BattleOutcome {
    Winner(PlayerNumber),
    /// Both fighters emptied on the same tick
    Tie,
}

/// Result of one simulation step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub hits: Vec<HitResult>,
    pub outcome: Option<BattleOutcome>,
}

pub struct Battle {
    pub tick: u64,
    pub fighters: [Fighter; 2],
    pub projectiles: Vec<Projectile>,
    pub platforms: Vec<Platform>,
    pub outcome: Option<BattleOutcome>,
}

impl Battle {
    pub fn new(platforms: Vec<Platform>, loadouts: &[FighterLoadout; 2]) -> Self {
        let fighters = PlayerNumber::ALL.map(|number| {
            let (x, y, facing) = SPAWNS[number.index()];
            let loadout = loadouts
                .iter()
                .find(|l| l.player_number == number)
                .cloned()
                .unwrap_or(FighterLoadout {
                    player_number: number,
                    weapons: Vec::new(),
                    ability: None,
                });
            Fighter::spawn(number, x, y, facing, loadout.weapons, loadout.ability)
        });

        Self {
            tick: 0,
            fighters,
            projectiles: Vec::new(),
            platforms,
            outcome: None,
        }
    }

    pub fn from_start(start: &BattleStart) -> Self {
        Self::new(start.map.platforms.clone(), &start.fighters)
    }

    pub fn fighter(&self, number: PlayerNumber) -> &Fighter {
        &self.fighters[number.index()]
    }

    /// Advance the battle by one tick.
    ///
    /// Order: triggers (P1 then P2), movement, timers, projectiles, melee,
    /// outcome. Melee connections for both fighters are decided before any
    /// melee damage lands.
    pub fn step(&mut self, inputs: [FighterInput; 2]) -> TickReport {
        if self.outcome.is_some() {
            return TickReport {
                tick: self.tick,
                hits: Vec::new(),
                outcome: self.outcome,
            };
        }

        self.tick += 1;

        for number in PlayerNumber::ALL {
            self.apply_triggers(number, &inputs[number.index()]);
        }

        for fighter in self.fighters.iter_mut() {
            let walk_speed = fighter.walk_speed();
            let movement = inputs[fighter.number.index()].movement();
            PhysicsSystem::step(&mut fighter.body, movement, walk_speed, &self.platforms);
        }

        for fighter in self.fighters.iter_mut() {
            fighter.update_timers();
        }

        let mut hits = self.update_projectiles();
        hits.extend(self.resolve_melee());

        self.outcome = self.detect_outcome();
        if let Some(outcome) = self.outcome {
            debug!(tick = self.tick, ?outcome, "Battle decided");
        }

        TickReport {
            tick: self.tick,
            hits,
            outcome: self.outcome,
        }
    }

    fn apply_triggers(&mut self, number: PlayerNumber, input: &FighterInput) {
        let idx = number.index();

        if let Some(slot) = input.switch_weapon {
            self.fighters[idx].switch_weapon(slot);
        }

        if input.use_ability && self.fighters[idx].try_use_ability() == Some(AbilityKind::Teleport) {
            self.teleport(number);
        }

        if input.attack {
            if let Some(weapon) = self.fighters[idx].try_attack() {
                if !weapon.is_melee() {
                    let projectile = Projectile::spawn(number, &self.fighters[idx].body, &weapon);
                    self.projectiles.push(projectile);
                }
            }
        }
    }

    /// Place the fighter on the platform whose center is farthest from the
    /// opponent. The first platform wins ties.
    fn teleport(&mut self, number: PlayerNumber) {
        let opponent_x = self.fighters[number.opponent().index()].body.center_x();

        let mut target: Option<&Platform> = None;
        for platform in &self.platforms {
            let distance = (platform.center_x() - opponent_x).abs();
            if target.map_or(true, |best| distance > (best.center_x() - opponent_x).abs()) {
                target = Some(platform);
            }
        }

        if let Some(platform) = target {
            let body = &mut self.fighters[number.index()].body;
            body.x = platform.center_x() - body.width / 2.0;
            body.y = platform.y - body.height;
            body.vel_y = 0.0;
            body.on_ground = true;
        }
    }

    fn update_projectiles(&mut self) -> Vec<HitResult> {
        let mut hits = Vec::new();
        let fighters = &mut self.fighters;

        self.projectiles.retain_mut(|projectile| {
            projectile.advance();
            if !projectile.active {
                return false;
            }

            for target in fighters.iter_mut() {
                let defense = target.defense();
                if defense == Defense::Untargetable || !projectile.overlaps(&target.body) {
                    continue;
                }

                let damage = CombatSystem::apply_hit(&mut target.health, defense, projectile.damage);
                hits.push(HitResult {
                    attacker: projectile.owner,
                    target: target.number,
                    source: HitSource::Projectile,
                    damage,
                    target_health: target.health.current(),
                    target_defeated: target.is_defeated(),
                });
                return false;
            }

            true
        });

        hits
    }

    fn resolve_melee(&mut self) -> Vec<HitResult> {
        let connects = PlayerNumber::ALL.map(|number| {
            let attacker = &self.fighters[number.index()];
            let defender = &self.fighters[number.opponent().index()];
            match attacker.weapon() {
                Some(weapon) if defender.defense() != Defense::Untargetable => {
                    CombatSystem::melee_connects(
                        &attacker.body,
                        attacker.is_attacking,
                        attacker.attack_timer,
                        &defender.body,
                        weapon,
                    )
                    .then_some(weapon.damage)
                }
                _ => None,
            }
        });

        let mut hits = Vec::new();
        for number in PlayerNumber::ALL {
            let Some(amount) = connects[number.index()] else {
                continue;
            };
            let target = &mut self.fighters[number.opponent().index()];
            let defense = target.defense();
            let damage = CombatSystem::apply_hit(&mut target.health, defense, amount);
            hits.push(HitResult {
                attacker: number,
                target: target.number,
                source: HitSource::Melee,
                damage,
                target_health: target.health.current(),
                target_defeated: target.is_defeated(),
            });
        }

        hits
    }

    fn detect_outcome(&self) -> Option<BattleOutcome> {
        let [one, two] = &self.fighters;
        match (one.is_defeated(), two.is_defeated()) {
            (true, true) => Some(BattleOutcome::Tie),
            (true, false) => Some(BattleOutcome::Winner(PlayerNumber::Two)),
            (false, true) => Some(BattleOutcome::Winner(PlayerNumber::One)),
            (false, false) => None,
        }
    }
}
