//! Rule id generation.
//!
//! Ids are ULIDs: a 48-bit millisecond timestamp followed by 80 random bits,
//! written as 26 Crockford base32 characters. They sort by creation time.

use std::time::{SystemTime, UNIX_EPOCH};

const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const RANDOM_BITS: u32 = 80;

/// A fresh ULID for a new user rule.
pub fn new_rule_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    encode_ulid(millis, rand::random::<u128>())
}

fn encode_ulid(millis: u128, random: u128) -> String {
    let timestamp = millis & ((1 << 48) - 1);
    let value = (timestamp << RANDOM_BITS) | (random & ((1 << RANDOM_BITS) - 1));

    (0..26)
        .map(|i| CROCKFORD[((value >> (5 * (25 - i))) & 0x1f) as usize] as char)
        .collect()
}
