//! Dashboard report
//!
//! The overview numbers: invested cost, realized profit, passive income,
//! current positions with their categories and classes, and the
//! allocation groupings behind the charts.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::db::Transaction;
use crate::portfolio::asset_categories;
use crate::portfolio::classify::{asset_class, AssetClass};
use crate::portfolio::cost_basis::{compute_snapshot, passive_income_total};

/// One open position as shown on the dashboard.
#[derive(Debug, Clone)]
pub struct PositionRow {
    pub asset: String,
    pub category: String,
    pub class: AssetClass,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub cost_basis: Decimal,
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    /// Positions sorted by cost basis, largest first.
    pub positions: Vec<PositionRow>,
    /// Total acquisition cost across open positions.
    pub invested_cost: Decimal,
    /// Profit recognized on sales.
    pub realized_profit: Decimal,
    /// Dividend + JCP cash received.
    pub cash_income: Decimal,
    /// Bonus share credits, in raw units.
    pub bonus_units: Decimal,
}

impl DashboardSummary {
    /// The headline "Renda Passiva (Div + Caixinha)" figure: cash income
    /// plus bonus units. The bonus term is a unit count, not currency -
    /// the display total has always mixed the two and is kept as-is.
    pub fn passive_income_display(&self) -> Decimal {
        self.cash_income + self.bonus_units
    }
}

pub fn build_dashboard(transactions: &[Transaction]) -> DashboardSummary {
    let snapshot = compute_snapshot(transactions);
    let categories = asset_categories(transactions);

    let mut positions: Vec<PositionRow> = snapshot
        .positions
        .iter()
        .map(|(asset, position)| {
            let category = categories
                .get(asset)
                .cloned()
                .unwrap_or_else(|| "Outros".to_string());
            PositionRow {
                asset: asset.clone(),
                class: asset_class(&category),
                category,
                quantity: position.quantity,
                average_cost: position.average_cost(),
                cost_basis: position.cost_basis,
            }
        })
        .collect();
    positions.sort_by(|a, b| b.cost_basis.cmp(&a.cost_basis).then(a.asset.cmp(&b.asset)));

    DashboardSummary {
        invested_cost: snapshot.total_cost(),
        realized_profit: snapshot.realized_profit,
        cash_income: passive_income_total(transactions),
        bonus_units: snapshot.bonus_units,
        positions,
    }
}

/// Cost basis grouped by macro class, for the class allocation chart.
pub fn class_allocation(summary: &DashboardSummary) -> Vec<(AssetClass, Decimal)> {
    let mut grouped: HashMap<AssetClass, Decimal> = HashMap::new();
    for row in &summary.positions {
        *grouped.entry(row.class).or_insert(Decimal::ZERO) += row.cost_basis;
    }

    let mut allocation: Vec<(AssetClass, Decimal)> = grouped.into_iter().collect();
    allocation.sort_by(|a, b| b.1.cmp(&a.1));
    allocation
}

/// Cost basis grouped by category, optionally restricted to one class.
pub fn category_allocation(
    summary: &DashboardSummary,
    class_filter: Option<AssetClass>,
) -> Vec<(String, Decimal)> {
    let mut grouped: HashMap<String, Decimal> = HashMap::new();
    for row in &summary.positions {
        if class_filter.is_some_and(|class| class != row.class) {
            continue;
        }
        *grouped.entry(row.category.clone()).or_insert(Decimal::ZERO) += row.cost_basis;
    }

    let mut allocation: Vec<(String, Decimal)> = grouped.into_iter().collect();
    allocation.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    allocation
}

/// A position valued against a live quote, or at cost when none arrived.
#[derive(Debug, Clone)]
pub struct ValuedPosition {
    pub row: PositionRow,
    /// BRL price used, when a quote resolved.
    pub price: Option<Decimal>,
    pub market_value: Decimal,
    /// True when the quote was missing and the value fell back to cost.
    pub stale: bool,
}

/// Value dashboard rows against resolved BRL prices. A missing quote
/// degrades that row to its cost basis, marked stale.
pub fn value_positions(
    summary: &DashboardSummary,
    prices: &HashMap<String, Decimal>,
) -> Vec<ValuedPosition> {
    summary
        .positions
        .iter()
        .map(|row| match prices.get(&row.asset) {
            Some(price) => ValuedPosition {
                market_value: row.quantity * *price,
                price: Some(*price),
                stale: false,
                row: row.clone(),
            },
            None => ValuedPosition {
                market_value: row.cost_basis,
                price: None,
                stale: true,
                row: row.clone(),
            },
        })
        .collect()
}
