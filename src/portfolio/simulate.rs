//! Sale simulator
//!
//! "What if I sold at this price?" scenarios for one open position, at
//! 25/50/75/100% of the held quantity. Purely hypothetical: nothing here
//! writes to the store or affects realized profit.

use rust_decimal::Decimal;

use super::cost_basis::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleScenario {
    /// Fraction of the position sold, as a percentage (25, 50, 75, 100).
    pub fraction_pct: Decimal,
    pub quantity: Decimal,
    pub gross_proceeds: Decimal,
    pub cost_out: Decimal,
    pub profit: Decimal,
    /// Return over the cost sold, as a percentage. Zero when the cost
    /// sold is zero (all-bonus positions).
    pub roi_pct: Decimal,
}

pub fn simulate_sale(position: &Position, price: Decimal) -> Vec<SaleScenario> {
    let fractions = [
        Decimal::from(25),
        Decimal::from(50),
        Decimal::from(75),
        Decimal::from(100),
    ];
    let average_cost = position.average_cost();

    fractions
        .iter()
        .map(|fraction_pct| {
            let quantity = position.quantity * *fraction_pct / Decimal::from(100);
            let gross_proceeds = quantity * price;
            let cost_out = quantity * average_cost;
            let profit = gross_proceeds - cost_out;
            let roi_pct = if cost_out > Decimal::ZERO {
                profit / cost_out * Decimal::from(100)
            } else {
                Decimal::ZERO
            };

            SaleScenario {
                fraction_pct: *fraction_pct,
                quantity,
                gross_proceeds,
                cost_out,
                profit,
                roi_pct,
            }
        })
        .collect()
}
