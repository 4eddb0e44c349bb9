use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Transaction kinds supported by the system.
///
/// The set is closed: the store rejects anything else both at the SQL
/// layer (CHECK constraint) and when parsing rows back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Buy,
    Sell,
    Withdraw,
    Dividend,
    Jcp, // Juros sobre Capital Próprio
    Fee,
    Bonus,
    FxExchange,
    Contribution,
    Redemption,
    Reinvestment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Dividend => "DIVIDEND",
            TransactionKind::Jcp => "JCP",
            TransactionKind::Fee => "FEE",
            TransactionKind::Bonus => "BONUS",
            TransactionKind::FxExchange => "FX_EXCHANGE",
            TransactionKind::Contribution => "CONTRIBUTION",
            TransactionKind::Redemption => "REDEMPTION",
            TransactionKind::Reinvestment => "REINVESTMENT",
        }
    }

    /// Kinds that add both units and cost to a position.
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            TransactionKind::Buy | TransactionKind::Contribution | TransactionKind::Reinvestment
        )
    }

    /// Kinds that remove units from a position at average cost.
    pub fn is_disposal(&self) -> bool {
        matches!(
            self,
            TransactionKind::Sell | TransactionKind::Withdraw | TransactionKind::Redemption
        )
    }

    /// Kinds that represent cash income (paid out, never held as units).
    pub fn is_cash_income(&self) -> bool {
        matches!(self, TransactionKind::Dividend | TransactionKind::Jcp)
    }

    pub fn all() -> &'static [TransactionKind] {
        &[
            TransactionKind::Buy,
            TransactionKind::Sell,
            TransactionKind::Withdraw,
            TransactionKind::Dividend,
            TransactionKind::Jcp,
            TransactionKind::Fee,
            TransactionKind::Bonus,
            TransactionKind::FxExchange,
            TransactionKind::Contribution,
            TransactionKind::Redemption,
            TransactionKind::Reinvestment,
        ]
    }
}

impl FromStr for TransactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "COMPRA" | "C" => Ok(TransactionKind::Buy),
            "SELL" | "VENDA" | "V" => Ok(TransactionKind::Sell),
            "WITHDRAW" | "SAQUE" => Ok(TransactionKind::Withdraw),
            "DIVIDEND" | "DIVIDENDO" | "RENDIMENTO" => Ok(TransactionKind::Dividend),
            "JCP" => Ok(TransactionKind::Jcp),
            "FEE" | "TAXA" => Ok(TransactionKind::Fee),
            "BONUS" | "BONIFICAÇÃO" | "BONIFICACAO" => Ok(TransactionKind::Bonus),
            "FX_EXCHANGE" | "CAMBIO" | "CÂMBIO" => Ok(TransactionKind::FxExchange),
            "CONTRIBUTION" | "APORTE" => Ok(TransactionKind::Contribution),
            "REDEMPTION" | "RESGATE" => Ok(TransactionKind::Redemption),
            "REINVESTMENT" | "REINVESTIMENTO" => Ok(TransactionKind::Reinvestment),
            _ => Err(()),
        }
    }
}

/// A recorded portfolio movement.
///
/// Immutable once inserted; corrections are delete-and-reinsert.
/// `total_value` is fixed at write time and is the authoritative cash-flow
/// amount for every downstream fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub asset: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub broker: String,
    pub category: String,
    pub currency: String,
    pub fx_rate: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Goal kinds tracked by the goals panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GoalKind {
    TotalWealth,
    CategoryTotal,
    TotalPassiveIncome,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::TotalWealth => "TOTAL_WEALTH",
            GoalKind::CategoryTotal => "CATEGORY_TOTAL",
            GoalKind::TotalPassiveIncome => "PASSIVE_INCOME",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalKind::TotalWealth => "Patrimônio Total",
            GoalKind::CategoryTotal => "Total em Categoria",
            GoalKind::TotalPassiveIncome => "Renda Passiva (Total)",
        }
    }
}

impl FromStr for GoalKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TOTAL_WEALTH" | "WEALTH" | "PATRIMÔNIO TOTAL" | "PATRIMONIO TOTAL" => {
                Ok(GoalKind::TotalWealth)
            }
            "CATEGORY_TOTAL" | "CATEGORY" | "TOTAL EM CATEGORIA" => Ok(GoalKind::CategoryTotal),
            "PASSIVE_INCOME" | "INCOME" | "RENDA PASSIVA (TOTAL)" | "RENDA PASSIVA" => {
                Ok(GoalKind::TotalPassiveIncome)
            }
            _ => Err(()),
        }
    }
}

/// A user-defined savings goal. Created and deleted, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub kind: GoalKind,
    /// Only meaningful for `CategoryTotal`; matched case-insensitively
    /// against the resolved rebalancing bucket of each asset.
    pub filter_category: Option<String>,
    pub target_value: Decimal,
    pub deadline: Option<NaiveDate>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_kind_conversions() {
        for kind in TransactionKind::all() {
            assert_eq!(kind.as_str().parse::<TransactionKind>().ok(), Some(*kind));
        }
        assert_eq!("INVALID".parse::<TransactionKind>().ok(), None);
    }

    #[test]
    fn test_transaction_kind_portuguese_aliases() {
        assert_eq!(
            "Compra".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Buy)
        );
        assert_eq!(
            "VENDA".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Sell)
        );
        assert_eq!(
            "Saque".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Withdraw)
        );
        assert_eq!(
            "Dividendo".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Dividend)
        );
        assert_eq!(
            "Taxa".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Fee)
        );
        assert_eq!(
            "Bonificacao".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Bonus)
        );
        assert_eq!(
            "Bonificação".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Bonus)
        );
        assert_eq!(
            "Cambio".parse::<TransactionKind>().ok(),
            Some(TransactionKind::FxExchange)
        );
        assert_eq!(
            "Aporte".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Contribution)
        );
        assert_eq!(
            "Resgate".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Redemption)
        );
        assert_eq!(
            "Reinvestimento".parse::<TransactionKind>().ok(),
            Some(TransactionKind::Reinvestment)
        );
    }

    #[test]
    fn test_kind_groupings() {
        assert!(TransactionKind::Buy.is_acquisition());
        assert!(TransactionKind::Contribution.is_acquisition());
        assert!(TransactionKind::Reinvestment.is_acquisition());
        assert!(!TransactionKind::Bonus.is_acquisition());

        assert!(TransactionKind::Sell.is_disposal());
        assert!(TransactionKind::Withdraw.is_disposal());
        assert!(TransactionKind::Redemption.is_disposal());
        assert!(!TransactionKind::Fee.is_disposal());

        assert!(TransactionKind::Dividend.is_cash_income());
        assert!(TransactionKind::Jcp.is_cash_income());
        assert!(!TransactionKind::Bonus.is_cash_income());
    }

    #[test]
    fn test_goal_kind_conversions() {
        assert_eq!(
            "TOTAL_WEALTH".parse::<GoalKind>().ok(),
            Some(GoalKind::TotalWealth)
        );
        assert_eq!(
            "Patrimônio Total".parse::<GoalKind>().ok(),
            Some(GoalKind::TotalWealth)
        );
        assert_eq!(
            "CATEGORY_TOTAL".parse::<GoalKind>().ok(),
            Some(GoalKind::CategoryTotal)
        );
        assert_eq!(
            "Renda Passiva (Total)".parse::<GoalKind>().ok(),
            Some(GoalKind::TotalPassiveIncome)
        );
        assert_eq!("INVALID".parse::<GoalKind>().ok(), None);
    }
}
