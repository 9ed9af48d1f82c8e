//! Content addressed equalizers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::error::Result;
use crate::parse::{require_filters, text_to_records};
use crate::record::FilterRecord;

/// Length of a hash key in hex characters
pub const EQ_HASH_LEN: usize = 128;

/// Hash of an uploaded equalizer: SHA-512 as lowercase hex.
pub fn eq_hash(content: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Does `key` look like a value returned by [`eq_hash`]?
pub fn check_hash(key: &str) -> bool {
    key.len() == EQ_HASH_LEN && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A parsed equalizer ready to be persisted under its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEq {
    /// Key, see [`eq_hash`]
    pub eq_hash: String,
    /// Display name
    pub name: String,
    /// Filters
    pub peq: Vec<FilterRecord>,
}

/// Parse an uploaded file and key it by the hash of its content.
///
/// Fails like the parser does and when no filter was found.
pub fn store_eq(name: &str, content: &[u8]) -> Result<StoredEq> {
    let text = String::from_utf8_lossy(content);
    let peq = require_filters(text_to_records(&text)?, name)?;
    let stored = StoredEq {
        eq_hash: eq_hash(content),
        name: name.to_string(),
        peq,
    };
    log::info!("stored {} ({} filters) as {}", stored.name, stored.peq.len(), &stored.eq_hash[..16]);
    Ok(stored)
}
