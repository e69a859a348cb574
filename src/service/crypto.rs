use rand::RngCore;
use sha3::{Digest, Sha3_256};

pub fn get_sha3_256_hash(salt: &str, data: &str) -> String {
    let mut hasher = Sha3_256::default();
    hasher.update(salt.as_bytes());
    hasher.update(data.as_bytes());
    format!("{:X}", hasher.finalize())
}

pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    let actual = get_sha3_256_hash(salt, password);
    // compare every byte so timing does not leak the matching prefix
    actual.len() == expected_hash.len()
        && actual
            .bytes()
            .zip(expected_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Hex encoded random string of `bytes` bytes.
pub fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_changes_hash() {
        assert_ne!(
            get_sha3_256_hash("a", "secret"),
            get_sha3_256_hash("b", "secret")
        );
    }

    #[test]
    fn verifies_matching_password() {
        let hash = get_sha3_256_hash("salt", "hunter2");
        assert!(verify_password("salt", "hunter2", &hash));
        assert!(!verify_password("salt", "hunter3", &hash));
    }

    #[test]
    fn tokens_are_hex_of_requested_length() {
        let token = random_token(16);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
