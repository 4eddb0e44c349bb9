//! Average-cost engine
//!
//! Folds the transaction history in chronological order into one running
//! position per asset, recognizing realized profit on sales against the
//! average cost at disposal time. This is the single source every view
//! (dashboard, evolution chart, rebalancing, goals) derives from.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::db::{Transaction, TransactionKind};

/// Positions whose quantity falls to or below this are treated as closed
/// and dropped from the snapshot (sub-satoshi leftovers from fractional
/// disposals).
fn dust_threshold() -> Decimal {
    Decimal::new(1, 6) // 0.000001
}

/// Running state for a single asset during a fold.
///
/// `cost_basis` is aggregate acquisition cost, not a price. Invariant:
/// `quantity >= 0` - a disposal against a non-positive quantity leaves
/// both fields untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub quantity: Decimal,
    pub cost_basis: Decimal,
}

impl Position {
    fn new() -> Self {
        Self {
            quantity: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
        }
    }

    /// Average acquisition cost per unit. Only defined for an open
    /// position; returns zero otherwise.
    pub fn average_cost(&self) -> Decimal {
        if self.quantity > Decimal::ZERO {
            self.cost_basis / self.quantity
        } else {
            Decimal::ZERO
        }
    }

    fn add_acquisition(&mut self, quantity: Decimal, paid: Decimal) {
        // Cost follows the cash actually paid, not quantity * unit price,
        // so average cost can diverge from market price.
        self.quantity += quantity;
        self.cost_basis += paid;
    }

    fn add_bonus_units(&mut self, quantity: Decimal) {
        self.quantity += quantity;
    }

    /// Remove units at average cost, returning the cost of what left the
    /// position. No-op (returns None) when nothing is held: the disposal
    /// guard that keeps quantity non-negative and every division defined.
    fn apply_disposal(&mut self, quantity: Decimal) -> Option<Decimal> {
        if self.quantity <= Decimal::ZERO {
            return None;
        }

        let avg_cost = self.cost_basis / self.quantity;
        let cost_out = avg_cost * quantity;

        self.quantity -= quantity;
        self.cost_basis -= cost_out;

        Some(cost_out)
    }
}

/// Everything the engine produces in one pass.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    /// Open positions only (dust filtered out).
    pub positions: HashMap<String, Position>,
    /// Currency gain recognized on Sell transactions.
    pub realized_profit: Decimal,
    /// Free units credited via Bonus transactions, summed in raw units.
    pub bonus_units: Decimal,
}

impl PortfolioSnapshot {
    /// Total acquisition cost across all open positions.
    pub fn total_cost(&self) -> Decimal {
        self.positions
            .values()
            .map(|p| p.cost_basis)
            .sum()
    }

    pub fn position(&self, asset: &str) -> Option<&Position> {
        self.positions.get(asset)
    }
}

/// Sort transactions chronologically; insertion order (id) breaks date ties.
pub(crate) fn in_chronological_order(transactions: &[Transaction]) -> Vec<&Transaction> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|tx| (tx.date, tx.id.unwrap_or(i64::MAX)));
    ordered
}

/// Fold an unordered transaction collection into the current snapshot.
///
/// Deterministic for a fixed input set and idempotent: re-running on the
/// same input yields an identical snapshot.
pub fn compute_snapshot(transactions: &[Transaction]) -> PortfolioSnapshot {
    let mut snapshot = PortfolioSnapshot::default();
    let mut positions: HashMap<String, Position> = HashMap::new();

    for tx in in_chronological_order(transactions) {
        let position = positions
            .entry(tx.asset.clone())
            .or_insert_with(Position::new);

        match tx.kind {
            TransactionKind::Buy
            | TransactionKind::Contribution
            | TransactionKind::Reinvestment => {
                position.add_acquisition(tx.quantity, tx.total_value);
            }
            TransactionKind::Bonus => {
                position.add_bonus_units(tx.quantity);
                snapshot.bonus_units += tx.quantity;
            }
            TransactionKind::Sell | TransactionKind::Withdraw | TransactionKind::Redemption => {
                if let Some(cost_out) = position.apply_disposal(tx.quantity) {
                    // Withdrawals and redemptions reduce basis but are
                    // profit-neutral at this layer.
                    if tx.kind == TransactionKind::Sell {
                        snapshot.realized_profit += tx.total_value - cost_out;
                    }
                }
            }
            TransactionKind::Dividend
            | TransactionKind::Jcp
            | TransactionKind::Fee
            | TransactionKind::FxExchange => {}
        }
    }

    positions.retain(|_, p| p.quantity > dust_threshold());
    snapshot.positions = positions;
    snapshot
}

/// Cash income received from dividends and JCP, portfolio-wide. Tracked
/// outside the position fold: these never touch quantity or cost basis.
pub fn passive_income_total(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind.is_cash_income())
        .map(|tx| tx.total_value)
        .sum()
}
