//! Account rules shared by every storage backend: signup validation,
//! password hashing and credential checks.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::storage::UserStorage;
use crate::types::{NewUser, User};
use crate::{Error, Result};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const SALT_LEN: usize = 16;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Runs in time dependent only on the lengths of the inputs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hash a password as `salt$digest`, both hex encoded.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
    let salt = hex::encode(salt);
    let digest = digest(&salt, password);
    format!("{}${}", salt, digest)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes()),
        None => false,
    }
}

/// Validate signup fields and create the account.
pub async fn signup<S>(storage: &S, name: &str, email: &str, password: &str) -> Result<User>
where
    S: UserStorage + ?Sized,
{
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() || password.trim().is_empty() {
        return Err(Error::Validation("All fields are required.".to_string()));
    }
    if !is_valid_email(email) {
        return Err(Error::Validation("Invalid email address, check again".to_string()));
    }
    if storage.get_user(email).await?.is_some() {
        return Err(Error::Conflict("Email already exists. Try logging in.".to_string()));
    }

    let user = storage
        .insert_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
        })
        .await?;
    debug!(email = %user.email, "User account created");
    Ok(user)
}

/// Check credentials and return the matching user.
pub async fn login<S>(storage: &S, email: &str, password: &str) -> Result<User>
where
    S: UserStorage + ?Sized,
{
    let record = storage
        .get_user(email)
        .await?
        .ok_or_else(|| Error::Unauthorized("User doesn't exist".to_string()))?;

    if verify_password(password, &record.password_hash) {
        Ok(record.user)
    } else {
        Err(Error::Unauthorized("Email and password do not match".to_string()))
    }
}
