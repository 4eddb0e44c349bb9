//! Category classification
//!
//! Two exact-match resolution modes coexist and are not interchangeable:
//! the coarse asset class ("Renda Fixa" vs "Renda Variável") feeds the
//! dashboard grouping, while the fine rebalancing bucket keeps variable
//! income categories apart. A third, keyword-based classifier survives as
//! a fallback for free-text input on UI paths only; core computations
//! never call it.

/// Categories that collapse into the fixed income class.
pub const FIXED_INCOME_CATEGORIES: [&str; 5] =
    ["Tesouro Direto", "CDB", "LCI/LCA", "Debêntures", "Caixinha"];

/// Variable income categories, kept verbatim by the rebalancing bucket.
pub const VARIABLE_INCOME_CATEGORIES: [&str; 7] =
    ["Ações", "FIIs", "Stocks", "REITs", "ETF", "Criptomoedas", "BDR"];

pub const FIXED_INCOME_LABEL: &str = "Renda Fixa";
pub const VARIABLE_INCOME_LABEL: &str = "Renda Variável";
pub const OTHER_LABEL: &str = "Outros";

/// Coarse grouping used by the dashboard allocation chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    FixedIncome,
    VariableIncome,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::FixedIncome => FIXED_INCOME_LABEL,
            AssetClass::VariableIncome => VARIABLE_INCOME_LABEL,
        }
    }
}

/// Dashboard reduction: the fixed income set maps to `FixedIncome`,
/// everything else (registered categories and free text alike) to
/// `VariableIncome`.
pub fn asset_class(category: &str) -> AssetClass {
    if FIXED_INCOME_CATEGORIES.contains(&category) {
        AssetClass::FixedIncome
    } else {
        AssetClass::VariableIncome
    }
}

/// Rebalancing reduction: fixed income categories collapse to
/// "Renda Fixa", variable income categories are returned verbatim, and
/// anything unrecognized lands in "Outros".
pub fn rebalance_bucket(category: &str) -> &str {
    if FIXED_INCOME_CATEGORIES.contains(&category) {
        FIXED_INCOME_LABEL
    } else if let Some(found) = VARIABLE_INCOME_CATEGORIES
        .iter()
        .copied()
        .find(|c| *c == category)
    {
        found
    } else {
        OTHER_LABEL
    }
}

/// Heuristic substring classifier carried over for free-text input.
///
/// Fallback only: it disagrees with the exact resolvers on purpose (e.g.
/// FIIs land in fixed income here) and must not feed the dashboard or
/// rebalancing buckets.
pub fn classify_by_keywords(category: &str, asset: &str) -> &'static str {
    let text = format!("{} {}", category, asset).to_lowercase();

    let contains_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if contains_any(&[
        "tesouro", "cdb", "lci", "lca", "debênture", "debenture", "caixinha", "renda fixa",
        "fii", "fundo imobiliario",
    ]) {
        return FIXED_INCOME_LABEL;
    }
    if contains_any(&["cripto", "bitcoin", "ether", "btc", "eth", "binance", "usdt"]) {
        return "Criptomoedas";
    }
    if contains_any(&["stock", "reit", "ações eua", "acoes eua", "apple", "google", "microsoft"]) {
        return "Stocks";
    }
    if contains_any(&["etf", "ivvb11", "sp500", "nasdaq", "wrld11", "voo", "qqq"]) {
        return "ETF";
    }
    OTHER_LABEL
}
