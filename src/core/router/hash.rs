//! Deterministic bucketing (§4.4, Glossary: "Deterministic bucketing")

use sha2::{Digest, Sha256};

/// A rational number in `[0, 1)` derived from `userId:promptId:salt`, or a
/// uniform pseudo-random draw when no `userId` is supplied.
pub fn bucket(user_id: Option<&str>, prompt_id: &str, salt: &str) -> f64 {
    match user_id {
        Some(user_id) => {
            let input = format!("{user_id}:{prompt_id}:{salt}");
            let digest = Sha256::digest(input.as_bytes());
            let first_four: [u8; 4] = digest[0..4].try_into().expect("sha256 digest is >= 4 bytes");
            let n = u32::from_be_bytes(first_four);
            n as f64 / (u32::MAX as f64 + 1.0)
        }
        None => rand::random::<f64>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic_for_fixed_inputs() {
        let a = bucket(Some("alice"), "greeting", "weight");
        let b = bucket(Some("alice"), "greeting", "weight");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_across_salts() {
        let a = bucket(Some("alice"), "greeting", "weight");
        let b = bucket(Some("alice"), "greeting", "tag");
        assert_ne!(a, b);
    }

    #[test]
    fn stays_in_unit_interval() {
        for salt in ["weight", "tag", "phase"] {
            let r = bucket(Some("alice"), "greeting", salt);
            assert!((0.0..1.0).contains(&r));
        }
    }
}
