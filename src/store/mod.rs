pub mod sqlite;

use crate::app::Result;

pub use sqlite::SqliteLedger;

/// Ledger key holding the cached posting-service session.
///
/// Metadata keys live under `meta:` and posted GUIDs under `guid:`, so no
/// feed GUID can collide with them.
pub const SESSION_KEY: &str = "meta:session";

const POSTED_PREFIX: &str = "guid:";

/// Marker stored under each posted GUID. Only the key's presence matters.
pub const POSTED_MARKER: &[u8] = b"1";

/// Ledger key recording that `guid` was posted.
pub fn posted_key(guid: &str) -> String {
    format!("{}{}", POSTED_PREFIX, guid)
}

/// Durable key to bytes mapping.
pub trait Ledger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Insert or overwrite `key` in a single statement.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn has(&self, key: &str) -> Result<bool>;

    fn is_posted(&self, guid: &str) -> Result<bool> {
        self.has(&posted_key(guid))
    }

    fn mark_posted(&self, guid: &str) -> Result<()> {
        self.set(&posted_key(guid), POSTED_MARKER)
    }
}
