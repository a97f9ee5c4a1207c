//! Store key layout.
//!
//! Pool records live under `0x01 | pool_id`. Share records live under
//! `0x02 | len(depositor) | depositor | pool_id`, so all deposits of one owner
//! share a prefix.

use super::StoreError;

pub const POOL_KEY_PREFIX: u8 = 0x01;
pub const SHARE_KEY_PREFIX: u8 = 0x02;

#[must_use]
pub fn pool_key(pool_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + pool_id.len());
    key.push(POOL_KEY_PREFIX);
    key.extend_from_slice(pool_id.as_bytes());
    key
}

/// Prefix shared by every share record of `depositor`.
pub fn depositor_prefix(depositor: &str) -> Result<Vec<u8>, StoreError> {
    let len = u8::try_from(depositor.len())
        .map_err(|_| StoreError::DepositorTooLong(depositor.len()))?;
    let mut key = Vec::with_capacity(2 + depositor.len());
    key.push(SHARE_KEY_PREFIX);
    key.push(len);
    key.extend_from_slice(depositor.as_bytes());
    Ok(key)
}

pub fn share_key(depositor: &str, pool_id: &str) -> Result<Vec<u8>, StoreError> {
    let mut key = depositor_prefix(depositor)?;
    key.extend_from_slice(pool_id.as_bytes());
    Ok(key)
}
