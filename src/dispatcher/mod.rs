// Dispatcher - one handler module per command area

pub mod config;
pub mod goals;
pub mod rebalance;
pub mod transactions;
pub mod views;

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::db;

/// Open (and lazily initialize) the database the command should use.
pub fn open(db_path: Option<PathBuf>) -> Result<(PathBuf, Connection)> {
    let path = match db_path {
        Some(path) => path,
        None => db::default_db_path()?,
    };
    db::init_database(Some(path.clone()))?;
    let conn = db::open_db(Some(path.clone()))?;
    Ok((path, conn))
}

/// Parse a decimal CLI argument with a friendly error.
pub fn parse_decimal(value: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|_| anyhow::anyhow!("Invalid {}: '{}'", what, value))
}

/// Parse a YYYY-MM-DD CLI argument with a friendly error.
pub fn parse_date(value: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", value))
}

/// True when live price lookups should be skipped (flag or env var).
pub fn skip_price_fetch(offline_flag: bool) -> bool {
    offline_flag
        || std::env::var("CARTEIRA_SKIP_PRICE_FETCH")
            .map(|v| v != "0")
            .unwrap_or(false)
}
