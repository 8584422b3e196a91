//! Password hashing helpers built around PBKDF2-HMAC-SHA256.
//! The work factor is centralized so every credential record carries the
//! same cost, and each record embeds its own salt and parameters so
//! verification needs nothing beyond the candidate password.

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::rngs::OsRng;

/// Cost exponent for new credential records: 2^12 = 4096 iterations.
/// Existing records keep the cost they were written with because
/// verification reads the cost back out of the record itself.
pub const COST_EXPONENT: u32 = 12;

const ROUNDS: u32 = 1 << COST_EXPONENT;
const DIGEST_LEN: usize = 32;

/// Hashes a password with a fresh random salt and returns the PHC string.
/// The record includes algorithm id, cost, and salt, so two calls with the
/// same password never produce the same string.
pub fn hash_password(plaintext: &str) -> Result<String, pbkdf2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds: ROUNDS,
        output_length: DIGEST_LEN,
    };
    let record = Pbkdf2.hash_password_customized(plaintext.as_bytes(), None, None, params, &salt)?;
    Ok(record.to_string())
}

/// Verifies a candidate password against a stored credential record.
/// The comparison is constant-time inside the hash framework. Returns
/// `false` for a mismatch or a malformed record; callers cannot tell
/// which part of the credential failed.
pub fn verify_password(plaintext: &str, stored_record: &str) -> bool {
    let parsed = match PasswordHash::new(stored_record) {
        Ok(record) => record,
        Err(_) => return false,
    };
    Pbkdf2.verify_password(plaintext.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password, COST_EXPONENT};
    use pbkdf2::password_hash::PasswordHash;

    #[test]
    fn hashes_and_verifies_passwords() {
        let record = hash_password("S3cret!").expect("hashing should succeed");
        assert!(verify_password("S3cret!", &record));
        assert!(!verify_password("wrong", &record));
    }

    #[test]
    fn salts_independently_per_call() {
        let first = hash_password("S3cret!").unwrap();
        let second = hash_password("S3cret!").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("S3cret!", &first));
        assert!(verify_password("S3cret!", &second));
    }

    #[test]
    fn records_are_self_describing() {
        let record = hash_password("S3cret!").unwrap();
        // 2^12 iterations serialized into the record itself.
        assert_eq!(1 << COST_EXPONENT, 4096);
        assert!(record.starts_with("$pbkdf2-sha256$i=4096$"));
        let parsed = PasswordHash::new(&record).expect("record should parse");
        assert!(parsed.salt.is_some());
        assert!(parsed.hash.is_some());
    }

    #[test]
    fn malformed_records_verify_false() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-hash-record"));
        assert!(!verify_password("anything", "$pbkdf2-sha256$i=borked$x$y"));
    }
}
