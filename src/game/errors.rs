use thiserror::Error;

/// Errors that can arise in the adventure engine and its storage layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, watermark file, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around serde_json errors (watermark file, seed data).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when creating a record whose id is already taken.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Returned when a stored zone-progress blob cannot be decoded.
    /// A well-formed blob is a sequence of (zone id, progress) u16 pairs,
    /// so its length must be a multiple of 4 bytes.
    #[error("malformed progress blob: length {len} is not a multiple of 4")]
    MalformedProgress { len: usize },

    /// Returned by `embark` when the player already has a quest assigned.
    #[error("player {0} is already on a quest")]
    AlreadyQuesting(u64),
}
