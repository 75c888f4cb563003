use crate::error::Result;

/// Abstract interface for raw keyed storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `KvRepository` handles the "what" (collections, upserts, doctor).
///
/// Values are opaque strings. Every write replaces the whole value stored
/// under a key.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if nothing was ever written there.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
