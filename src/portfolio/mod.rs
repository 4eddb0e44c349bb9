//! Portfolio engine - average-cost accounting and everything derived from it
//!
//! All computation here is pure over the transaction slice it receives:
//! callers re-read the store and recompute, there is no cross-call state.

pub mod classify;
pub mod cost_basis;
pub mod evolution;
pub mod goals;
pub mod rebalance;
pub mod simulate;

use std::collections::HashMap;

use crate::db::Transaction;

/// Category recorded for each asset, taken from the asset's most recent
/// transaction (later entries win on ties by id).
pub fn asset_categories(transactions: &[Transaction]) -> HashMap<String, String> {
    let mut latest: HashMap<String, (chrono::NaiveDate, i64, String)> = HashMap::new();

    for tx in transactions {
        let id = tx.id.unwrap_or(0);
        match latest.get(&tx.asset) {
            Some((date, seen_id, _)) if (*date, *seen_id) >= (tx.date, id) => {}
            _ => {
                latest.insert(tx.asset.clone(), (tx.date, id, tx.category.clone()));
            }
        }
    }

    latest
        .into_iter()
        .map(|(asset, (_, _, category))| (asset, category))
        .collect()
}
