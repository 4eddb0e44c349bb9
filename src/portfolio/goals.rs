//! Goal progress evaluation
//!
//! Thin layer over the engine: each goal kind reduces the same snapshot
//! (or the raw income totals) to a single current value and compares it
//! against the target.

use rust_decimal::Decimal;

use crate::db::{Goal, GoalKind, Transaction};

use super::asset_categories;
use super::classify::rebalance_bucket;
use super::cost_basis::{compute_snapshot, passive_income_total};

#[derive(Debug, Clone)]
pub struct GoalProgress {
    pub goal: Goal,
    pub current_value: Decimal,
    /// Fraction in [0, 1]; capped once the goal is reached.
    pub progress_pct: Decimal,
    pub remaining: Decimal,
}

impl GoalProgress {
    pub fn achieved(&self) -> bool {
        self.progress_pct >= Decimal::ONE
    }
}

pub fn evaluate_goal(goal: &Goal, transactions: &[Transaction]) -> GoalProgress {
    let current_value = match goal.kind {
        GoalKind::TotalWealth => compute_snapshot(transactions).total_cost(),
        GoalKind::CategoryTotal => category_cost_total(
            transactions,
            goal.filter_category.as_deref().unwrap_or_default(),
        ),
        GoalKind::TotalPassiveIncome => passive_income_total(transactions),
    };

    let progress_pct = if goal.target_value > Decimal::ZERO {
        (current_value / goal.target_value).min(Decimal::ONE)
    } else {
        Decimal::ZERO
    };
    let remaining = (goal.target_value - current_value).max(Decimal::ZERO);

    GoalProgress {
        goal: goal.clone(),
        current_value,
        progress_pct,
        remaining,
    }
}

pub fn evaluate_goals(goals: &[Goal], transactions: &[Transaction]) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|goal| evaluate_goal(goal, transactions))
        .collect()
}

/// Cost basis held in assets whose rebalancing bucket matches `filter`,
/// compared case-insensitively.
fn category_cost_total(transactions: &[Transaction], filter: &str) -> Decimal {
    let snapshot = compute_snapshot(transactions);
    let categories = asset_categories(transactions);
    let filter_lower = filter.to_lowercase();

    snapshot
        .positions
        .iter()
        .filter(|(asset, _)| {
            let category = categories.get(*asset).map(String::as_str).unwrap_or("");
            rebalance_bucket(category).to_lowercase() == filter_lower
        })
        .map(|(_, position)| position.cost_basis)
        .sum()
}
