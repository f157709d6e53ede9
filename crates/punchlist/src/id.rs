//! Hash-based identifier generation for issue records.
//!
//! Creates collision-resistant identifiers using SHA-256 and hex encoding:
//! 24 lowercase hex characters taken from the first 12 bytes of a hash over
//! the record's content, a nanosecond timestamp, and a retry nonce.
//!
//! Identifiers are opaque strings safe to embed in JSON and URLs; their
//! format is not part of the external contract.
//!
//! # Example
//!
//! ```
//! use punchlist::id::IdGenerator;
//!
//! let mut generator = IdGenerator::new();
//! let id = generator
//!     .generate("Leaky faucet", "Kitchen sink drips", "inspector")
//!     .unwrap();
//! assert_eq!(id.len(), 24);
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::debug;

/// Number of hash bytes encoded into an identifier (24 hex characters).
const ID_BYTES: usize = 12;
const MAX_NONCE: u32 = 100;

/// Errors that can occur during identifier generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique identifier after exhausting all nonces
    #[error("unable to generate unique id after {attempts} attempts")]
    CollisionExhausted {
        /// How many nonces were tried.
        attempts: u32,
    },
}

/// Hash-based identifier generator with collision detection.
///
/// The generator tracks every identifier it has produced or been told about
/// via [`IdGenerator::register_id`], and retries with a fresh nonce on
/// collision. For typical stores (< 100,000 issues) the tracking overhead
/// is negligible.
pub struct IdGenerator {
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new generator with an empty collision set
    pub fn new() -> Self {
        Self {
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing identifier to prevent collisions
    pub fn register_id(&mut self, id: String) {
        self.existing_ids.insert(id);
    }

    /// Clear the collision set
    ///
    /// Use this when rebuilding the generator against a fresh snapshot.
    pub fn clear_state(&mut self) {
        self.existing_ids.clear();
    }

    /// Generate a new unique identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no unique identifier can be produced after
    /// trying all nonces; with 96 bits of hash this does not happen in
    /// practice.
    pub fn generate(
        &mut self,
        title: &str,
        text: &str,
        creator: &str,
    ) -> Result<String, IdGenerationError> {
        for nonce in 0..MAX_NONCE {
            let id = hash_id(title, text, creator, nonce);

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, "generated unique id after {} collision retries", nonce);
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash the inputs and hex-encode the first [`ID_BYTES`] bytes.
fn hash_id(title: &str, text: &str, creator: &str, nonce: u32) -> String {
    let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let content = format!("{title}|{text}|{creator}|{timestamp}|{nonce}");

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = hasher.finalize();

    let mut out = String::with_capacity(ID_BYTES * 2);
    for byte in &hash[..ID_BYTES] {
        // Writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Validate identifier format: exactly 24 lowercase hex characters.
pub fn validate_id(id: &str) -> bool {
    id.len() == ID_BYTES * 2
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
