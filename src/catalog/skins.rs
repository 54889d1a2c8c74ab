//! Cosmetic skins, one palette per seat

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::ids::PlayerNumber;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub name: String,
    pub color: String,
}

const PLAYER_ONE_SKINS: [(&str, &str); 4] = [
    ("Default Blue", "#3498db"),
    ("Purple", "#9b59b6"),
    ("Teal", "#1abc9c"),
    ("Orange", "#f39c12"),
];

const PLAYER_TWO_SKINS: [(&str, &str); 4] = [
    ("Default Red", "#e74c3c"),
    ("Dark Orange", "#e67e22"),
    ("Dark Red", "#c0392b"),
    ("Dark Purple", "#8e44ad"),
];

fn palette(number: PlayerNumber) -> &'static [(&'static str, &'static str); 4] {
    match number {
        PlayerNumber::One => &PLAYER_ONE_SKINS,
        PlayerNumber::Two => &PLAYER_TWO_SKINS,
    }
}

pub fn random_skin<R: Rng + ?Sized>(rng: &mut R, number: PlayerNumber) -> Skin {
    let skins = palette(number);
    let (name, color) = skins[rng.gen_range(0..skins.len())];
    Skin {
        name: name.to_string(),
        color: color.to_string(),
    }
}
