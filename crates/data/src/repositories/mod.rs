//! Repository implementations for record persistence.
//!
//! This module provides typed access to pool and share records stored in a
//! key-value store, along with the key layout they are stored under.

pub mod keys;
mod pool_repository;
mod share_repository;

pub use pool_repository::PoolRepository;
pub use share_repository::ShareRepository;

use thiserror::Error;

/// Errors raised while reading or writing records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored value could not be decoded into its record type.
    #[error("failed to decode record at key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A record could not be encoded.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    /// A depositor address is too long to be length-prefixed.
    #[error("depositor address is {0} bytes, at most 255 are supported")]
    DepositorTooLong(usize),
}

/// Store wrapper handing out repositories.
#[derive(Debug, Clone, Default)]
pub struct Database<S> {
    store: S,
}

impl<S> Database<S> {
    /// Creates a new Database wrapper around a store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the underlying store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read access to pool records.
    #[must_use]
    pub fn pools(&self) -> PoolRepository<&S> {
        PoolRepository::new(&self.store)
    }

    /// Read and write access to pool records.
    #[must_use]
    pub fn pools_mut(&mut self) -> PoolRepository<&mut S> {
        PoolRepository::new(&mut self.store)
    }

    /// Read access to share records.
    #[must_use]
    pub fn shares(&self) -> ShareRepository<&S> {
        ShareRepository::new(&self.store)
    }

    /// Read and write access to share records.
    #[must_use]
    pub fn shares_mut(&mut self) -> ShareRepository<&mut S> {
        ShareRepository::new(&mut self.store)
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(key: &[u8], raw: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(raw).map_err(|source| StoreError::Decode {
        key: String::from_utf8_lossy(key).into_owned(),
        source,
    })
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(value)?)
}
