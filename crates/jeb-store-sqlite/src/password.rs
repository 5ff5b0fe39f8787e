//! Hashing of imported user passwords.

use argon2::{Argon2, PasswordHash, PasswordHasher, password_hash::SaltString};
use rand_core::OsRng;

use crate::{Error, Result};

/// Whether `value` already is a PHC hash string such as `$argon2id$v=19$…`.
pub fn is_phc_hash(value: &str) -> bool { PasswordHash::new(value).is_ok() }

/// Hash `value` with argon2 unless it is already a PHC string, in which case
/// it is returned unchanged.
pub fn hash_if_cleartext(value: &str) -> Result<String> {
  if is_phc_hash(value) {
    return Ok(value.to_owned());
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(value.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}
