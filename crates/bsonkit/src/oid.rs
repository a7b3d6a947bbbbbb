//! 12-byte object identifier.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::BsonError;

const MAX_COUNTER: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// BSON ObjectId.
///
/// Layout: 4-byte big-endian seconds since the epoch, 5 bytes of per-process
/// randomness and a 3-byte big-endian counter. Ordering and equality are plain
/// byte comparison, which also makes ids sort by creation second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BsonObjectId {
    bytes: [u8; 12],
}

impl BsonObjectId {
    /// Generates a fresh id for the current second.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..=MAX_COUNTER)))
            .fetch_add(1, Ordering::Relaxed)
            & MAX_COUNTER;
        Self::from_parts(secs, *process, counter)
    }

    /// Assembles an id from its timestamp, process and counter components.
    ///
    /// Only the low 24 bits of `counter` are used.
    pub fn from_parts(timestamp: u32, process: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self { bytes }
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self { bytes }
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Creation time in seconds since the epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    pub fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.bytes[9], self.bytes[10], self.bytes[11]])
    }

    /// Canonical 24-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn parse_str(s: &str) -> Result<Self, BsonError> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| BsonError::InvalidObjectId(s.to_owned()))?;
        Ok(Self { bytes })
    }
}

impl Default for BsonObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; 12]> for BsonObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { bytes }
    }
}

impl FromStr for BsonObjectId {
    type Err = BsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for BsonObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let id = BsonObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(id.timestamp(), 0x507f1f77);
        assert_eq!(id.counter(), 0x439011);
    }

    #[test]
    fn hex_is_lowercase() {
        let id = BsonObjectId::from_bytes([0xAB; 12]);
        assert_eq!(id.to_hex(), "abababababababababababab");
        assert_eq!("ABABABABABABABABABABABAB".parse::<BsonObjectId>(), Ok(id));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(BsonObjectId::parse_str("507f1f77").is_err());
        assert!(BsonObjectId::parse_str("zz7f1f77bcf86cd799439011").is_err());
    }

    #[test]
    fn from_parts_layout() {
        let id = BsonObjectId::from_parts(0x1234_5678, [1, 2, 3, 4, 5], 0xAB01_0203);
        assert_eq!(
            id.bytes(),
            [0x12, 0x34, 0x56, 0x78, 1, 2, 3, 4, 5, 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn byte_ordering() {
        let a = BsonObjectId::from_bytes([0; 12]);
        let mut hi = [0u8; 12];
        hi[0] = 0x80;
        let b = BsonObjectId::from_bytes(hi);
        assert!(a < b);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = BsonObjectId::new();
        let b = BsonObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.bytes()[4..9], b.bytes()[4..9]);
    }
}
