use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

/// Argon2id hash in PHC string form (`$argon2id$v=19$...`), salt included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(password: &str) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(Self(phc.to_string()))
    }

    /// A stored value that does not parse as PHC never verifies.
    pub fn verify(&self, password: &str) -> bool {
        match password_hash::PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password_only() {
        let hash = PasswordHash::new("s3cret").expect("hashes");
        assert!(hash.verify("s3cret"));
        assert!(!hash.verify("S3cret"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = PasswordHash::new("same").expect("hashes");
        let second = PasswordHash::new("same").expect("hashes");
        assert_ne!(first, second);
        assert!(first.verify("same") && second.verify("same"));
    }

    #[test]
    fn stored_form_is_an_argon2_phc_string() {
        let hash = PasswordHash::new("pw").expect("hashes");
        assert!(hash.as_str().starts_with("$argon2id$"));

        let json = serde_json::to_value(&hash).expect("serializes");
        assert_eq!(json, serde_json::Value::String(hash.as_str().to_string()));
    }

    #[test]
    fn unparseable_stored_value_never_verifies() {
        let corrupt: PasswordHash =
            serde_json::from_value(serde_json::json!("not-a-phc-string")).expect("deserializes");
        assert!(!corrupt.verify("not-a-phc-string"));
        assert!(!corrupt.verify(""));
    }
}
