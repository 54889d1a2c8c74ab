//! Six-character room codes

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CODE_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Room code drawn from A-Z and 0-9. Always stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Accepts any casing; rejects wrong length or characters outside the alphabet
    pub fn parse(input: &str) -> Result<Self, String> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != CODE_LEN {
            return Err(format!("room code must be {CODE_LEN} characters"));
        }
        if !code.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err("room code may only contain letters and digits".to_string());
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_codes_are_six_upper_alphanumerics() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn parse_upper_cases_input() {
        assert_eq!(RoomCode::parse("ab12cd").unwrap().as_str(), "AB12CD");
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("AB-12C").is_err());
    }

    #[test]
    fn deserializes_case_insensitively() {
        let code: RoomCode = serde_json::from_str("\"xyz789\"").unwrap();
        assert_eq!(code.to_string(), "XYZ789");
        assert!(serde_json::from_str::<RoomCode>("\"toolong1\"").is_err());
    }
}
