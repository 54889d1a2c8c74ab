//! Battle maps: platform layouts plus hazard descriptors
//!
//! Hazards are carried as data for the clients to present. The combat engine
//! only reads the platforms.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned platform rectangle, top-left origin, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Platform {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// Map hazard descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Hazard {
    /// Comets fall from the sky every few seconds
    Comet { damage: u32 },
    /// Lava rises from the floor in steps
    Lava {
        damage_per_tick: u32,
        start_height: u32,
        /// Pixels gained every 20 seconds
        rise_rate: u32,
        max_height: u32,
    },
    /// Icicles with random damage
    Icicle { damage_min: u32, damage_max: u32 },
    /// Players slide after releasing movement
    Slippery,
    /// Hovering ships that beam players upward
    Spaceship { count: u32 },
    /// Gap in the floor; falling in ends the battle for that player
    Crater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapId {
    Normal,
    CometField,
    Volcano,
    Ice,
    AlienInvasion,
}

impl MapId {
    pub const ALL: [MapId; 5] = [
        MapId::Normal,
        MapId::CometField,
        MapId::Volcano,
        MapId::Ice,
        MapId::AlienInvasion,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaMap {
    pub id: MapId,
    pub name: String,
    pub description: String,
    pub hazards: Vec<Hazard>,
    pub platforms: Vec<Platform>,
}

const GROUND: Platform = Platform::new(0.0, 650.0, 1200.0, 50.0);

impl ArenaMap {
    pub fn for_id(id: MapId) -> Self {
        let (name, description, hazards, platforms) = match id {
            MapId::Normal => (
                "Normal",
                "Just platforms, no hazards. Good for beginners!",
                vec![],
                vec![
                    GROUND,
                    Platform::new(200.0, 550.0, 200.0, 20.0),
                    Platform::new(800.0, 550.0, 200.0, 20.0),
                    Platform::new(100.0, 430.0, 150.0, 20.0),
                    Platform::new(500.0, 400.0, 200.0, 20.0),
                    Platform::new(950.0, 430.0, 150.0, 20.0),
                    Platform::new(500.0, 250.0, 200.0, 20.0),
                ],
            ),
            MapId::CometField => (
                "Comet Field",
                "Watch out! Comets fall from the sky!",
                vec![Hazard::Comet { damage: 30 }],
                vec![
                    GROUND,
                    Platform::new(150.0, 520.0, 180.0, 20.0),
                    Platform::new(870.0, 520.0, 180.0, 20.0),
                    Platform::new(450.0, 450.0, 300.0, 20.0),
                    Platform::new(200.0, 320.0, 150.0, 20.0),
                    Platform::new(850.0, 320.0, 150.0, 20.0),
                    Platform::new(500.0, 200.0, 200.0, 20.0),
                ],
            ),
            MapId::Volcano => (
                "Volcano",
                "Lava rises from below! Get to high ground!",
                vec![Hazard::Lava {
                    damage_per_tick: 5,
                    start_height: 50,
                    rise_rate: 100,
                    max_height: 400,
                }],
                vec![
                    GROUND,
                    Platform::new(100.0, 550.0, 200.0, 20.0),
                    Platform::new(900.0, 550.0, 200.0, 20.0),
                    Platform::new(400.0, 480.0, 400.0, 20.0),
                    Platform::new(150.0, 380.0, 180.0, 20.0),
                    Platform::new(870.0, 380.0, 180.0, 20.0),
                    Platform::new(450.0, 280.0, 300.0, 20.0),
                    Platform::new(500.0, 150.0, 200.0, 20.0),
                ],
            ),
            MapId::Ice => (
                "Ice",
                "Slippery platforms! Icicles fall from above!",
                vec![
                    Hazard::Icicle {
                        damage_min: 1,
                        damage_max: 20,
                    },
                    Hazard::Slippery,
                ],
                vec![
                    GROUND,
                    Platform::new(100.0, 530.0, 200.0, 20.0),
                    Platform::new(900.0, 530.0, 200.0, 20.0),
                    Platform::new(350.0, 450.0, 150.0, 20.0),
                    Platform::new(700.0, 450.0, 150.0, 20.0),
                    Platform::new(500.0, 200.0, 200.0, 20.0),
                ],
            ),
            MapId::AlienInvasion => (
                "Alien Invasion",
                "Spaceships beam you up! Don't fall in the crater!",
                vec![Hazard::Spaceship { count: 5 }, Hazard::Crater],
                vec![
                    Platform::new(0.0, 650.0, 450.0, 50.0),
                    Platform::new(750.0, 650.0, 450.0, 50.0),
                    Platform::new(50.0, 520.0, 180.0, 20.0),
                    Platform::new(970.0, 520.0, 180.0, 20.0),
                    Platform::new(250.0, 400.0, 150.0, 20.0),
                    Platform::new(800.0, 400.0, 150.0, 20.0),
                    Platform::new(500.0, 300.0, 200.0, 20.0),
                ],
            ),
        };

        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            hazards,
            platforms,
        }
    }
}

pub fn random_map<R: Rng + ?Sized>(rng: &mut R) -> ArenaMap {
    ArenaMap::for_id(MapId::ALL[rng.gen_range(0..MapId::ALL.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_map_has_platforms_inside_the_screen() {
        for id in MapId::ALL {
            let map = ArenaMap::for_id(id);
            assert!(!map.platforms.is_empty(), "{} has no platforms", map.name);
            for p in &map.platforms {
                assert!(p.x >= 0.0 && p.x + p.width <= 1200.0);
                assert!(p.y >= 0.0 && p.y + p.height <= 700.0);
            }
        }
    }

    #[test]
    fn random_map_is_seed_stable() {
        let a = random_map(&mut ChaCha8Rng::seed_from_u64(11));
        let b = random_map(&mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn hazards_serialize_with_type_tag() {
        let map = ArenaMap::for_id(MapId::Volcano);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["hazards"][0]["type"], "lava");
        assert_eq!(json["hazards"][0]["max_height"], 400);
        assert_eq!(json["id"], "volcano");
    }
}
