//! UUIDs are stored as INT128 with the top bit flipped so that signed
//! comparison matches the byte order of the textual form.

use uuid::Uuid;

use crate::common::error::{KuzuError, Result};
use crate::types::int128::Int128;

const SIGN_FLIP: u128 = 1 << 127;

pub struct KuUuid;

impl KuUuid {
    pub fn from_uuid(uuid: Uuid) -> Int128 {
        Int128::from_i128((uuid.as_u128() ^ SIGN_FLIP) as i128)
    }

    pub fn to_uuid(value: Int128) -> Uuid {
        Uuid::from_u128((value.to_i128() as u128) ^ SIGN_FLIP)
    }

    pub fn from_string(s: &str) -> Result<Int128> {
        Uuid::parse_str(s.trim())
            .map(Self::from_uuid)
            .map_err(|_| KuzuError::Conversion(format!("Error occurred during parsing UUID. Given: \"{}\".", s)))
    }

    pub fn to_string(value: Int128) -> String {
        Self::to_uuid(value).hyphenated().to_string()
    }

    pub fn generate_random() -> Int128 {
        Self::from_uuid(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let text = "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11";
        let stored = KuUuid::from_string(text).unwrap();
        assert_eq!(KuUuid::to_string(stored), text);
        assert!(KuUuid::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_storage_order_matches_text_order() {
        let low = KuUuid::from_string("00000000-0000-0000-0000-000000000001").unwrap();
        let high = KuUuid::from_string("ffffffff-0000-0000-0000-000000000000").unwrap();
        assert!(low < high);
    }

    #[test]
    fn test_random_uuids_differ() {
        assert_ne!(KuUuid::generate_random(), KuUuid::generate_random());
    }
}
