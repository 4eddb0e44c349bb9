//! Rebalancing calculator
//!
//! Values the current holdings at user-supplied prices, compares each
//! bucket against its target share of the post-contribution total, and
//! turns the differences into buy/sell suggestions. Stateless: callers
//! re-run after any price or target edit.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::error::PortfolioError;

use super::classify::FIXED_INCOME_LABEL;

/// Deltas smaller than one currency unit are noise, not suggestions.
fn suggestion_threshold() -> Decimal {
    Decimal::ONE
}

/// Tolerance on the target percentages' sum.
fn target_sum_tolerance() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

/// One holding priced for rebalancing.
#[derive(Debug, Clone)]
pub struct PricedHolding {
    pub asset: String,
    /// Resolved rebalancing bucket (see `classify::rebalance_bucket`).
    pub bucket: String,
    pub quantity: Decimal,
    /// Current price as typed or fetched, in BRL or USD.
    pub price: Decimal,
    /// When true, `price` is USD and gets multiplied by the exchange rate.
    pub usd_priced: bool,
}

/// Comparison row for one target bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketComparison {
    pub bucket: String,
    pub current_value: Decimal,
    /// Share of the current (pre-contribution) total, as a percentage.
    pub current_pct: Decimal,
    pub target_pct: Decimal,
    pub target_value: Decimal,
    /// Positive: under target (buy). Negative: over target (sell).
    pub delta: Decimal,
}

/// Full output of one rebalancing run.
#[derive(Debug, Clone)]
pub struct RebalancePlan {
    /// One row per target bucket, in bucket-name order.
    pub comparisons: Vec<BucketComparison>,
    /// Buckets under target, largest shortfall first.
    pub buys: Vec<BucketComparison>,
    /// Buckets over target, largest excess first.
    pub sells: Vec<BucketComparison>,
    /// Value held in buckets absent from the target map. Reported, never
    /// silently dropped.
    pub unallocated_value: Decimal,
    pub total_now: Decimal,
    pub total_after_contribution: Decimal,
}

/// Reject target maps whose percentages do not sum to 100 (within 0.1)
/// before any delta is computed.
pub fn validate_targets(targets: &HashMap<String, Decimal>) -> Result<()> {
    let sum: Decimal = targets.values().copied().sum();
    if (sum - Decimal::from(100)).abs() > target_sum_tolerance() {
        bail!(PortfolioError::Validation(format!(
            "allocation targets must sum to 100%, got {}",
            sum
        )));
    }
    Ok(())
}

pub fn plan_rebalance(
    holdings: &[PricedHolding],
    usd_brl: Decimal,
    contribution: Decimal,
    targets: &HashMap<String, Decimal>,
    emergency_reserve: Decimal,
) -> Result<RebalancePlan> {
    validate_targets(targets)?;

    // Value and group by bucket. BTreeMap keeps the output order stable.
    let mut buckets: BTreeMap<String, Decimal> = BTreeMap::new();
    for holding in holdings {
        let fx_factor = if holding.usd_priced { usd_brl } else { Decimal::ONE };
        let value = holding.quantity * holding.price * fx_factor;
        *buckets.entry(holding.bucket.clone()).or_insert(Decimal::ZERO) += value;
    }

    // The reserve is parked inside fixed income and excluded from the
    // allocation math, floored at zero.
    if let Some(fixed_income) = buckets.get_mut(FIXED_INCOME_LABEL) {
        *fixed_income = (*fixed_income - emergency_reserve).max(Decimal::ZERO);
    }

    let total_now: Decimal = buckets.values().copied().sum();
    let unallocated_value: Decimal = buckets
        .iter()
        .filter(|(bucket, _)| !targets.contains_key(*bucket))
        .map(|(_, value)| *value)
        .sum();
    let total_after_contribution = total_now + contribution;

    let mut ordered_targets: Vec<(&String, &Decimal)> = targets.iter().collect();
    ordered_targets.sort_by(|a, b| a.0.cmp(b.0));

    let mut comparisons = Vec::with_capacity(ordered_targets.len());
    for (bucket, target_pct) in ordered_targets {
        let current_value = buckets.get(bucket).copied().unwrap_or(Decimal::ZERO);
        let current_pct = if total_now > Decimal::ZERO {
            current_value / total_now * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
        let target_value = total_after_contribution * *target_pct / Decimal::from(100);

        comparisons.push(BucketComparison {
            bucket: bucket.clone(),
            current_value,
            current_pct,
            target_pct: *target_pct,
            target_value,
            delta: target_value - current_value,
        });
    }

    let mut buys: Vec<BucketComparison> = comparisons
        .iter()
        .filter(|c| c.delta > suggestion_threshold())
        .cloned()
        .collect();
    buys.sort_by(|a, b| b.delta.cmp(&a.delta));

    let mut sells: Vec<BucketComparison> = comparisons
        .iter()
        .filter(|c| c.delta < -suggestion_threshold())
        .cloned()
        .collect();
    sells.sort_by(|a, b| a.delta.cmp(&b.delta));

    Ok(RebalancePlan {
        comparisons,
        buys,
        sells,
        unallocated_value,
        total_now,
        total_after_contribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(asset: &str, bucket: &str, qty: Decimal, price: Decimal, usd: bool) -> PricedHolding {
        PricedHolding {
            asset: asset.to_string(),
            bucket: bucket.to_string(),
            quantity: qty,
            price,
            usd_priced: usd,
        }
    }

    fn targets(pairs: &[(&str, Decimal)]) -> HashMap<String, Decimal> {
        pairs
            .iter()
            .map(|(name, pct)| (name.to_string(), *pct))
            .collect()
    }

    #[test]
    fn test_targets_must_sum_to_one_hundred() {
        assert!(validate_targets(&targets(&[("A", dec!(60)), ("B", dec!(40))])).is_ok());
        // Within the 0.1 tolerance
        assert!(validate_targets(&targets(&[("A", dec!(60.05)), ("B", dec!(40))])).is_ok());
        assert!(validate_targets(&targets(&[("A", dec!(60)), ("B", dec!(30))])).is_err());
        assert!(validate_targets(&targets(&[("A", dec!(60.2)), ("B", dec!(40))])).is_err());
    }

    #[test]
    fn test_invalid_targets_reject_before_computation() {
        let result = plan_rebalance(
            &[holding("AAA", "Stocks", dec!(1), dec!(10), false)],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Stocks", dec!(80))]),
            Decimal::ZERO,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reserve_comes_off_fixed_income_before_totals() {
        // Renda Fixa 1000, Stocks 0, reserve 200, no contribution:
        // net fixed income 800, total 800, 50/50 targets of 400 each
        let plan = plan_rebalance(
            &[holding("CDB1", "Renda Fixa", dec!(1000), dec!(1), false)],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Renda Fixa", dec!(50)), ("Stocks", dec!(50))]),
            dec!(200),
        )
        .unwrap();

        assert_eq!(plan.total_now, dec!(800));
        assert_eq!(plan.total_after_contribution, dec!(800));

        let fixed = plan
            .comparisons
            .iter()
            .find(|c| c.bucket == "Renda Fixa")
            .unwrap();
        assert_eq!(fixed.current_value, dec!(800));
        assert_eq!(fixed.delta, dec!(-400));

        let stocks = plan.comparisons.iter().find(|c| c.bucket == "Stocks").unwrap();
        assert_eq!(stocks.delta, dec!(400));

        assert_eq!(plan.sells.len(), 1);
        assert_eq!(plan.sells[0].bucket, "Renda Fixa");
        assert_eq!(plan.buys.len(), 1);
        assert_eq!(plan.buys[0].bucket, "Stocks");
    }

    #[test]
    fn test_reserve_floors_at_zero() {
        let plan = plan_rebalance(
            &[holding("CDB1", "Renda Fixa", dec!(100), dec!(1), false)],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Renda Fixa", dec!(100))]),
            dec!(500),
        )
        .unwrap();

        assert_eq!(plan.total_now, Decimal::ZERO);
    }

    #[test]
    fn test_usd_priced_holdings_use_exchange_rate() {
        let plan = plan_rebalance(
            &[
                holding("AAPL", "Stocks", dec!(10), dec!(100), true),
                holding("PETR4", "Ações", dec!(100), dec!(30), false),
            ],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Stocks", dec!(50)), ("Ações", dec!(50))]),
            Decimal::ZERO,
        )
        .unwrap();

        let stocks = plan.comparisons.iter().find(|c| c.bucket == "Stocks").unwrap();
        assert_eq!(stocks.current_value, dec!(5000)); // 10 * 100 * 5
        let acoes = plan.comparisons.iter().find(|c| c.bucket == "Ações").unwrap();
        assert_eq!(acoes.current_value, dec!(3000));
    }

    #[test]
    fn test_contribution_raises_every_target() {
        let plan = plan_rebalance(
            &[holding("AAA", "Stocks", dec!(100), dec!(10), false)],
            dec!(5),
            dec!(1000),
            &targets(&[("Stocks", dec!(50)), ("Renda Fixa", dec!(50))]),
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(plan.total_now, dec!(1000));
        assert_eq!(plan.total_after_contribution, dec!(2000));
        for comparison in &plan.comparisons {
            assert_eq!(comparison.target_value, dec!(1000));
        }
    }

    #[test]
    fn test_untargeted_buckets_are_reported_not_dropped() {
        let plan = plan_rebalance(
            &[
                holding("AAA", "Stocks", dec!(10), dec!(10), false),
                holding("ZZZ", "Outros", dec!(3), dec!(50), false),
            ],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Stocks", dec!(100))]),
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(plan.unallocated_value, dec!(150));
        // The untargeted value still counts toward the total being split
        assert_eq!(plan.total_now, dec!(250));
        let stocks = plan.comparisons.iter().find(|c| c.bucket == "Stocks").unwrap();
        assert_eq!(stocks.target_value, dec!(250));
    }

    #[test]
    fn test_small_deltas_produce_no_suggestions() {
        let plan = plan_rebalance(
            &[
                holding("AAA", "Stocks", dec!(100), dec!(5.004), false),
                holding("CDB1", "Renda Fixa", dec!(500), dec!(1), false),
            ],
            dec!(5),
            Decimal::ZERO,
            &targets(&[("Stocks", dec!(50)), ("Renda Fixa", dec!(50))]),
            Decimal::ZERO,
        )
        .unwrap();

        // Deltas are ±0.2, inside the one-unit threshold
        assert!(plan.buys.is_empty());
        assert!(plan.sells.is_empty());
    }

    #[test]
    fn test_suggestions_are_sorted_by_magnitude() {
        let plan = plan_rebalance(
            &[
                holding("CDB1", "Renda Fixa", dec!(5000), dec!(1), false),
                holding("AAA", "Ações", dec!(100), dec!(10), false),
            ],
            dec!(5),
            Decimal::ZERO,
            &targets(&[
                ("Renda Fixa", dec!(25)),
                ("Ações", dec!(25)),
                ("Stocks", dec!(30)),
                ("ETF", dec!(20)),
            ]),
            Decimal::ZERO,
        )
        .unwrap();

        // total 6000: targets 1500/1500/1800/1200 vs current 5000/1000/0/0
        let buy_buckets: Vec<&str> = plan.buys.iter().map(|c| c.bucket.as_str()).collect();
        assert_eq!(buy_buckets, vec!["Stocks", "ETF", "Ações"]);
        let sell_buckets: Vec<&str> = plan.sells.iter().map(|c| c.bucket.as_str()).collect();
        assert_eq!(sell_buckets, vec!["Renda Fixa"]);
    }
}
