//! Monthly evolution series
//!
//! Replays the position fold one calendar month at a time to produce the
//! contribution/accumulated-cost series behind the evolution chart. Only
//! Buy, Bonus, Sell and Withdraw move the running positions in this view;
//! the other kinds never appear on the chart.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::db::{Transaction, TransactionKind};

use super::cost_basis::in_chronological_order;

/// One month on the evolution chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub month: NaiveDate,
    /// Gross Buy total recorded inside this month.
    pub contribution: Decimal,
    /// Sum of cost basis across all assets as of month end.
    pub accumulated_cost: Decimal,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("day 1 always exists")
}

fn next_month(month: NaiveDate) -> NaiveDate {
    if month.month() == 12 {
        NaiveDate::from_ymd_opt(month.year() + 1, 1, 1).expect("day 1 always exists")
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1).expect("day 1 always exists")
    }
}

fn add_months(month: NaiveDate, count: u32) -> NaiveDate {
    let mut cursor = month;
    for _ in 0..count {
        cursor = next_month(cursor);
    }
    cursor
}

/// Build the monthly series from the first transaction's month through
/// `today`'s month or twelve months past the start, whichever is later.
/// Each transaction is scanned exactly once. Empty input yields an empty
/// series.
pub fn monthly_evolution(transactions: &[Transaction], today: NaiveDate) -> Vec<MonthlyPoint> {
    let ordered = in_chronological_order(transactions);
    let Some(first) = ordered.first() else {
        return Vec::new();
    };

    let start = month_start(first.date);
    let end = month_start(today).max(add_months(start, 12));

    let mut series = Vec::new();
    let mut positions: HashMap<String, (Decimal, Decimal)> = HashMap::new(); // qty, cost
    let mut cursor = 0usize;

    let mut month = start;
    loop {
        let month_end = next_month(month);
        let mut contribution = Decimal::ZERO;

        while cursor < ordered.len() && ordered[cursor].date < month_end {
            let tx = ordered[cursor];
            cursor += 1;

            let (qty, cost) = positions
                .entry(tx.asset.clone())
                .or_insert((Decimal::ZERO, Decimal::ZERO));

            match tx.kind {
                TransactionKind::Buy => {
                    *qty += tx.quantity;
                    *cost += tx.total_value;
                    contribution += tx.total_value;
                }
                TransactionKind::Bonus => {
                    *qty += tx.quantity;
                }
                TransactionKind::Sell | TransactionKind::Withdraw => {
                    if *qty > Decimal::ZERO {
                        let avg = *cost / *qty;
                        let cost_out = avg * tx.quantity;
                        *qty -= tx.quantity;
                        *cost -= cost_out;
                    }
                }
                _ => {}
            }
        }

        let accumulated_cost = positions.values().map(|(_, cost)| *cost).sum();
        series.push(MonthlyPoint {
            month,
            contribution,
            accumulated_cost,
        });

        if month >= end {
            break;
        }
        month = month_end;
    }

    series
}
