//! Genesis import and export state.

use crate::error::GenesisError;
use crate::params::Params;
use crate::state::{PoolRecord, ShareRecord};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Complete engine state: params plus every pool and share record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub pool_records: Vec<PoolRecord>,
    #[serde(default)]
    pub share_records: Vec<ShareRecord>,
}

impl GenesisState {
    pub fn new(params: Params, pool_records: Vec<PoolRecord>, share_records: Vec<ShareRecord>) -> Self {
        Self {
            params,
            pool_records,
            share_records,
        }
    }

    /// True when the state equals the zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks params, every record, uniqueness, and that the share records of
    /// each pool add up to its total shares.
    pub fn validate(&self) -> Result<(), GenesisError> {
        self.params.validate()?;

        let mut pool_ids = HashSet::new();
        for record in &self.pool_records {
            record.validate()?;
            if !pool_ids.insert(record.pool_id.as_str()) {
                return Err(GenesisError::DuplicatePool(record.pool_id.clone()));
            }
        }

        let mut share_keys = HashSet::new();
        let mut totals: BTreeMap<&str, U256> = BTreeMap::new();
        for record in &self.share_records {
            record.validate()?;
            if !share_keys.insert((record.depositor.as_str(), record.pool_id.as_str())) {
                return Err(GenesisError::DuplicateShare(
                    record.depositor.clone(),
                    record.pool_id.clone(),
                ));
            }
            let total = totals.entry(record.pool_id.as_str()).or_default();
            *total = total.saturating_add(record.shares_owned);
        }

        for record in &self.pool_records {
            let depositor_total = totals.remove(record.pool_id.as_str()).unwrap_or_default();
            if depositor_total != record.total_shares {
                return Err(GenesisError::ShareMismatch(
                    depositor_total.to_string(),
                    record.pool_id.clone(),
                    record.total_shares.to_string(),
                ));
            }
        }
        // shares left over belong to pools without a record
        if let Some((id, total)) = totals.into_iter().next() {
            return Err(GenesisError::ShareMismatch(
                total.to_string(),
                id.to_string(),
                "0".into(),
            ));
        }

        Ok(())
    }
}
