//! CSRF nonces for the settings form.
//!
//! Nonces are stateless: a keyed SHA-256 digest of the action name and the
//! current tick. A tick is half of [`NONCE_LIFETIME`], and a nonce verifies
//! during the tick it was issued in and the one after, so every nonce lives
//! between 12 and 24 hours.
//!
//! ```
//! use safelink_core::nonce::{NonceAge, NonceIssuer};
//!
//! let issuer = NonceIssuer::new();
//! let nonce = issuer.create("save_settings");
//!
//! assert_eq!(issuer.verify("save_settings", &nonce), NonceAge::Fresh);
//! assert_eq!(issuer.verify("other_action", &nonce), NonceAge::Invalid);
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// How long an issued nonce can be accepted at most.
pub const NONCE_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Hex characters kept from the digest.
pub const NONCE_LEN: usize = 10;

const TICK_SECS: i64 = (NONCE_LIFETIME.as_secs() / 2) as i64;

/// Result of checking a submitted nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Issued during the current tick.
    Fresh,
    /// Issued during the previous tick.
    Aging,
    /// Wrong action, wrong secret, or expired.
    Invalid,
}

impl NonceAge {
    /// Whether the nonce should be accepted.
    pub fn is_valid(&self) -> bool {
        !matches!(self, NonceAge::Invalid)
    }
}

/// Issues and verifies nonces bound to a process secret.
#[derive(Clone)]
pub struct NonceIssuer {
    secret: [u8; 32],
}

impl NonceIssuer {
    /// Creates an issuer with a random secret.
    pub fn new() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self { secret }
    }

    /// Creates an issuer with a fixed secret.
    pub fn with_secret(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Issues a nonce for `action`.
    pub fn create(&self, action: &str) -> String {
        self.create_at(action, Utc::now())
    }

    /// Issues a nonce for `action` as of `now`.
    pub fn create_at(&self, action: &str, now: DateTime<Utc>) -> String {
        self.digest(tick(now), action)
    }

    /// Checks a submitted nonce for `action`.
    pub fn verify(&self, action: &str, nonce: &str) -> NonceAge {
        self.verify_at(action, nonce, Utc::now())
    }

    /// Checks a submitted nonce for `action` as of `now`.
    pub fn verify_at(&self, action: &str, nonce: &str, now: DateTime<Utc>) -> NonceAge {
        if nonce.is_empty() {
            return NonceAge::Invalid;
        }

        let current = tick(now);
        if constant_time_eq(self.digest(current, action).as_bytes(), nonce.as_bytes()) {
            return NonceAge::Fresh;
        }
        if constant_time_eq(self.digest(current - 1, action).as_bytes(), nonce.as_bytes()) {
            return NonceAge::Aging;
        }

        NonceAge::Invalid
    }

    fn digest(&self, tick: i64, action: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(tick.to_be_bytes());
        hasher.update(b"|");
        hasher.update(action.as_bytes());
        let mut encoded = hex::encode(hasher.finalize());
        encoded.truncate(NONCE_LEN);
        encoded
    }
}

impl Default for NonceIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceIssuer").finish_non_exhaustive()
    }
}

fn tick(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(TICK_SECS) + 1
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
