//! State invariants checked across all records.
//!
//! Each invariant returns its message together with a broken flag. The
//! message is the same whether or not the invariant holds.

use crate::bank::Bank;
use crate::events::EventSink;
use crate::manager::PoolManager;
use crate::params::ParamSource;
use amm_data::{Database, KvRead, KvStore};
use amm_domain::token::Coins;
use primitive_types::U256;
use std::collections::BTreeMap;
use tracing::error;

/// Module name prefixed to every invariant message.
pub const MODULE_NAME: &str = "swap";

/// An invariant over the committed store and the bank.
pub type Invariant = fn(&dyn KvRead, &dyn Bank) -> (String, bool);

/// Every invariant with its route name, in the order [`all_invariants`] runs
/// them.
pub const ROUTES: [(&str, Invariant); 4] = [
    ("pool-records", pool_records_invariant),
    ("share-records", share_records_invariant),
    ("pool-reserves", pool_reserves_invariant),
    ("pool-shares", pool_shares_invariant),
];

fn format_invariant(name: &str, message: &str) -> String {
    format!("{MODULE_NAME}: {name} invariant\n{message}\n")
}

/// Every pool record decodes and validates.
pub fn pool_records_invariant(store: &dyn KvRead, _bank: &dyn Bank) -> (String, bool) {
    let message = format_invariant("validate pool records broken", "pool record invalid");
    let broken = match Database::new(store).pools().find_all() {
        Ok(records) => records.iter().any(|r| r.validate().is_err()),
        Err(_) => true,
    };
    (message, broken)
}

/// Every share record decodes and validates.
pub fn share_records_invariant(store: &dyn KvRead, _bank: &dyn Bank) -> (String, bool) {
    let message = format_invariant("validate share records broken", "share record invalid");
    let broken = match Database::new(store).shares().find_all() {
        Ok(records) => records.iter().any(|r| r.validate().is_err()),
        Err(_) => true,
    };
    (message, broken)
}

/// The reserves of all pools add up to the reserve account balance.
pub fn pool_reserves_invariant(store: &dyn KvRead, bank: &dyn Bank) -> (String, bool) {
    let message = format_invariant(
        "pool reserves broken",
        "pool reserves do not match module account",
    );

    let Ok(records) = Database::new(store).pools().find_all() else {
        return (message, true);
    };
    let total = records
        .iter()
        .try_fold(Coins::empty(), |acc, r| acc.checked_add(&r.reserves()));
    let broken = total.is_none_or(|total| total != bank.pool_balance());
    (message, broken)
}

/// For every pool, the shares of its depositors add up to its total shares,
/// and no shares exist for a missing pool.
pub fn pool_shares_invariant(store: &dyn KvRead, _bank: &dyn Bank) -> (String, bool) {
    let message = format_invariant(
        "pool shares broken",
        "pool shares do not match depositor shares",
    );

    let db = Database::new(store);
    let (Ok(pools), Ok(shares)) = (db.pools().find_all(), db.shares().find_all()) else {
        return (message, true);
    };

    let mut totals: BTreeMap<&str, U256> = BTreeMap::new();
    for record in &shares {
        let total = totals.entry(record.pool_id.as_str()).or_default();
        match total.checked_add(record.shares_owned) {
            Some(sum) => *total = sum,
            None => return (message, true),
        }
    }

    let mut broken = false;
    for pool in &pools {
        let depositor_total = totals.remove(pool.pool_id.as_str()).unwrap_or_default();
        if depositor_total != pool.total_shares {
            broken = true;
        }
    }
    // shares left over belong to pools without a record
    broken |= !totals.is_empty();
    (message, broken)
}

/// Runs every invariant and returns the first broken one, or the last
/// message when none is broken.
pub fn all_invariants(store: &dyn KvRead, bank: &dyn Bank) -> (String, bool) {
    let mut result = (String::new(), false);
    for (route, invariant) in ROUTES {
        result = invariant(store, bank);
        if result.1 {
            error!(route = route, "Invariant broken");
            return result;
        }
    }
    result
}

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Runs [`all_invariants`] over the committed store and the bank.
    pub fn check_invariants(&self) -> (String, bool) {
        all_invariants(self.store(), self.bank())
    }
}
