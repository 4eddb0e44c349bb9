// Database module - SQLite connection and models

pub mod models;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::PortfolioError;
pub use models::{Goal, GoalKind, Transaction, TransactionKind};

/// Get the default database path (~/.carteira/data.db)
pub fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let carteira_dir = PathBuf::from(home).join(".carteira");

    std::fs::create_dir_all(&carteira_dir).context("Failed to create .carteira directory")?;

    Ok(carteira_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = db_path.unwrap_or(default_db_path()?);
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file and runs the schema SQL to set up all
/// tables and indexes. Safe to call on an existing database.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or(default_db_path()?);

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    Ok(())
}

/// A transaction about to be recorded. The store assigns the id, fixes
/// `total_value`, and normalizes the asset symbol.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub asset: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub broker: String,
    pub category: String,
    pub currency: String,
    pub fx_rate: Decimal,
    pub note: Option<String>,
}

impl NewTransaction {
    pub fn new(date: NaiveDate, asset: &str, kind: TransactionKind) -> Self {
        Self {
            date,
            asset: asset.to_string(),
            kind,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            broker: String::new(),
            category: "Outros".to_string(),
            currency: "BRL".to_string(),
            fx_rate: Decimal::ONE,
            note: None,
        }
    }
}

/// Insert a transaction, returning its assigned id.
///
/// `total_value` is computed here, once: `unit_price * quantity`, or
/// `unit_price * 1` when the quantity is zero (kinds recorded without a
/// meaningful unit count, e.g. dividends entered as a lump sum). It is
/// never recomputed after this point.
pub fn insert_transaction(conn: &Connection, tx: &NewTransaction) -> Result<i64> {
    let asset = tx.asset.trim().to_uppercase();
    if asset.is_empty() {
        bail!(PortfolioError::MalformedRecord("asset is required".to_string()));
    }
    if tx.quantity < Decimal::ZERO {
        bail!(PortfolioError::MalformedRecord(format!(
            "negative quantity {} for {}",
            tx.quantity, asset
        )));
    }
    if tx.unit_price < Decimal::ZERO {
        bail!(PortfolioError::MalformedRecord(format!(
            "negative unit price {} for {}",
            tx.unit_price, asset
        )));
    }

    let effective_qty = if tx.quantity > Decimal::ZERO {
        tx.quantity
    } else {
        Decimal::ONE
    };
    let total_value = tx.unit_price * effective_qty;

    conn.execute(
        "INSERT INTO transactions (
            date, asset, kind, quantity, unit_price, total_value,
            broker, category, currency, fx_rate, note
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            tx.date,
            asset,
            tx.kind.as_str(),
            tx.quantity.to_string(),
            tx.unit_price.to_string(),
            total_value.to_string(),
            tx.broker,
            tx.category,
            tx.currency,
            tx.fx_rate.to_string(),
            tx.note,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!("Recorded {} {} (id {})", tx.kind.as_str(), asset, id);
    Ok(id)
}

/// All transactions, most recent first (ties broken by id descending).
pub fn list_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, asset, kind, quantity, unit_price, total_value,
                broker, category, currency, fx_rate, note, created_at
         FROM transactions
         ORDER BY date DESC, id DESC",
    )?;

    let transactions = stmt
        .query_map([], row_to_transaction)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read transactions")?;

    Ok(transactions)
}

/// Delete a transaction by id. Returns false when the id was absent.
pub fn delete_transaction(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    if affected > 0 {
        info!("Removed transaction id {}", id);
    }
    Ok(affected > 0)
}

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(3)?;
    let kind = kind_str.parse::<TransactionKind>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(PortfolioError::MalformedRecord(format!(
                "unknown transaction kind '{}'",
                kind_str
            ))),
        )
    })?;

    Ok(Transaction {
        id: Some(row.get(0)?),
        date: row.get(1)?,
        asset: row.get(2)?,
        kind,
        quantity: get_decimal_value(row, 4)?,
        unit_price: get_decimal_value(row, 5)?,
        total_value: get_decimal_value(row, 6)?,
        broker: row.get(7)?,
        category: row.get(8)?,
        currency: row.get(9)?,
        fx_rate: get_decimal_value(row, 10)?,
        note: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Helper to read Decimal from SQLite (handles TEXT, INTEGER and REAL)
fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    if let Ok(s) = row.get::<_, String>(idx) {
        return Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    if let Ok(i) = row.get::<_, i64>(idx) {
        return Ok(Decimal::from(i));
    }

    if let Ok(f) = row.get::<_, f64>(idx) {
        return Decimal::try_from(f)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    Err(rusqlite::Error::InvalidColumnType(
        idx,
        "decimal".to_string(),
        rusqlite::types::Type::Null,
    ))
}

// ============ Goals ============

/// A goal about to be created. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub kind: GoalKind,
    pub filter_category: Option<String>,
    pub target_value: Decimal,
    pub deadline: Option<NaiveDate>,
    pub description: String,
}

pub fn insert_goal(conn: &Connection, goal: &NewGoal) -> Result<i64> {
    if goal.target_value <= Decimal::ZERO {
        bail!(PortfolioError::Validation(
            "goal target must be greater than zero".to_string()
        ));
    }

    conn.execute(
        "INSERT INTO goals (kind, filter_category, target_value, deadline, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            goal.kind.as_str(),
            goal.filter_category,
            goal.target_value.to_string(),
            goal.deadline,
            goal.description,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!("Created goal '{}' (id {})", goal.description, id);
    Ok(id)
}

pub fn list_goals(conn: &Connection) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, filter_category, target_value, deadline, description, created_at
         FROM goals
         ORDER BY id ASC",
    )?;

    let goals = stmt
        .query_map([], |row| {
            let kind_str: String = row.get(1)?;
            let kind = kind_str.parse::<GoalKind>().map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(PortfolioError::MalformedRecord(format!(
                        "unknown goal kind '{}'",
                        kind_str
                    ))),
                )
            })?;
            Ok(Goal {
                id: Some(row.get(0)?),
                kind,
                filter_category: row.get(2)?,
                target_value: get_decimal_value(row, 3)?,
                deadline: row.get(4)?,
                description: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read goals")?;

    Ok(goals)
}

/// Delete a goal by id. Returns false when the id was absent.
pub fn delete_goal(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM goals WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Settings ============

const KEY_ALLOCATION_TARGETS: &str = "allocation_targets";
const KEY_EMERGENCY_RESERVE: &str = "emergency_reserve";
const KEY_LAST_BACKUP: &str = "last_backup_timestamp";
const KEY_LAST_REBALANCE: &str = "last_rebalance_date";

/// Read a setting as a JSON value. Values that are not valid JSON are
/// returned as plain strings so old hand-edited entries keep working.
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<serde_json::Value>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
    let raw: Option<String> = stmt
        .query_row(params![key], |row| row.get(0))
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    Ok(raw.map(|s| {
        serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s))
    }))
}

pub fn set_setting(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, serde_json::to_string(value)?],
    )?;
    Ok(())
}

/// Allocation targets used by the default portfolio split, before the
/// user changes anything. Percentages, summing to 100.
pub fn default_allocation_targets() -> HashMap<String, Decimal> {
    let mut targets = HashMap::new();
    targets.insert("Renda Fixa".to_string(), Decimal::from(30));
    targets.insert("Ações".to_string(), Decimal::from(20));
    targets.insert("FIIs".to_string(), Decimal::from(20));
    targets.insert("Stocks".to_string(), Decimal::from(15));
    targets.insert("ETF".to_string(), Decimal::from(10));
    targets.insert("Criptomoedas".to_string(), Decimal::from(5));
    targets
}

pub fn allocation_targets(conn: &Connection) -> Result<HashMap<String, Decimal>> {
    match get_setting(conn, KEY_ALLOCATION_TARGETS)? {
        Some(value) => serde_json::from_value(value)
            .context("allocation_targets setting is not a category->percent map"),
        None => Ok(default_allocation_targets()),
    }
}

pub fn set_allocation_targets(
    conn: &Connection,
    targets: &HashMap<String, Decimal>,
) -> Result<()> {
    set_setting(
        conn,
        KEY_ALLOCATION_TARGETS,
        &serde_json::to_value(targets)?,
    )
}

pub fn emergency_reserve(conn: &Connection) -> Result<Decimal> {
    match get_setting(conn, KEY_EMERGENCY_RESERVE)? {
        Some(value) => serde_json::from_value(value)
            .context("emergency_reserve setting is not a decimal amount"),
        None => Ok(Decimal::ZERO),
    }
}

pub fn set_emergency_reserve(conn: &Connection, amount: Decimal) -> Result<()> {
    set_setting(conn, KEY_EMERGENCY_RESERVE, &serde_json::to_value(amount)?)
}

pub fn last_backup_timestamp(conn: &Connection) -> Result<Option<String>> {
    Ok(get_setting(conn, KEY_LAST_BACKUP)?
        .and_then(|v| v.as_str().map(|s| s.to_string())))
}

pub fn last_rebalance_date(conn: &Connection) -> Result<Option<NaiveDate>> {
    Ok(get_setting(conn, KEY_LAST_REBALANCE)?
        .and_then(|v| v.as_str().and_then(|s| s.parse::<NaiveDate>().ok())))
}

pub fn set_last_rebalance_date(conn: &Connection, date: NaiveDate) -> Result<()> {
    set_setting(
        conn,
        KEY_LAST_REBALANCE,
        &serde_json::Value::String(date.to_string()),
    )
}

// ============ Backup ============

/// Copy the database file to `dest` and record the backup timestamp.
/// Returns the number of bytes copied.
pub fn backup_database(conn: &Connection, db_path: &Path, dest: &Path) -> Result<u64> {
    let bytes = std::fs::copy(db_path, dest)
        .with_context(|| format!("Failed to copy {:?} to {:?}", db_path, dest))?;

    set_setting(
        conn,
        KEY_LAST_BACKUP,
        &serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
    )?;

    info!("Backed up {} bytes to {:?}", bytes, dest);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn setup_db() -> Result<(TempDir, Connection)> {
        let dir = TempDir::new()?;
        let path = dir.path().join("test.db");
        init_database(Some(path.clone()))?;
        let conn = open_db(Some(path))?;
        Ok((dir, conn))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn buy(date_: NaiveDate, asset: &str, qty: Decimal, price: Decimal) -> NewTransaction {
        NewTransaction {
            quantity: qty,
            unit_price: price,
            category: "Stocks".to_string(),
            ..NewTransaction::new(date_, asset, TransactionKind::Buy)
        }
    }

    #[test]
    fn test_insert_normalizes_asset_and_fixes_total() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        insert_transaction(&conn, &buy(date(2025, 1, 10), "petr4", dec!(10), dec!(10)))?;
        let txs = list_transactions(&conn)?;

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].asset, "PETR4");
        assert_eq!(txs[0].total_value, dec!(100));
        Ok(())
    }

    #[test]
    fn test_insert_zero_quantity_uses_price_as_total() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        let mut tx = NewTransaction::new(date(2025, 2, 1), "MXRF11", TransactionKind::Dividend);
        tx.unit_price = dec!(42.50);
        insert_transaction(&conn, &tx)?;

        let txs = list_transactions(&conn)?;
        assert_eq!(txs[0].total_value, dec!(42.50));
        Ok(())
    }

    #[test]
    fn test_insert_rejects_empty_asset_and_negative_values() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        let empty = NewTransaction::new(date(2025, 1, 1), "  ", TransactionKind::Buy);
        assert!(insert_transaction(&conn, &empty).is_err());

        let mut negative = buy(date(2025, 1, 1), "AAA", dec!(1), dec!(1));
        negative.quantity = dec!(-1);
        assert!(insert_transaction(&conn, &negative).is_err());
        Ok(())
    }

    #[test]
    fn test_list_orders_most_recent_first() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        insert_transaction(&conn, &buy(date(2025, 1, 10), "AAA", dec!(1), dec!(1)))?;
        insert_transaction(&conn, &buy(date(2025, 3, 10), "BBB", dec!(1), dec!(1)))?;
        insert_transaction(&conn, &buy(date(2025, 2, 10), "CCC", dec!(1), dec!(1)))?;

        let txs = list_transactions(&conn)?;
        let assets: Vec<&str> = txs.iter().map(|t| t.asset.as_str()).collect();
        assert_eq!(assets, vec!["BBB", "CCC", "AAA"]);
        Ok(())
    }

    #[test]
    fn test_delete_is_noop_when_absent() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        let id = insert_transaction(&conn, &buy(date(2025, 1, 10), "AAA", dec!(1), dec!(1)))?;
        assert!(delete_transaction(&conn, id)?);
        assert!(!delete_transaction(&conn, id)?);
        assert!(!delete_transaction(&conn, 9999)?);
        Ok(())
    }

    #[test]
    fn test_goal_crud() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        let id = insert_goal(
            &conn,
            &NewGoal {
                kind: GoalKind::TotalWealth,
                filter_category: None,
                target_value: dec!(100000),
                deadline: Some(date(2030, 12, 31)),
                description: "Aposentadoria".to_string(),
            },
        )?;

        let goals = list_goals(&conn)?;
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].kind, GoalKind::TotalWealth);
        assert_eq!(goals[0].target_value, dec!(100000));

        assert!(delete_goal(&conn, id)?);
        assert!(list_goals(&conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_goal_rejects_non_positive_target() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        let result = insert_goal(
            &conn,
            &NewGoal {
                kind: GoalKind::TotalWealth,
                filter_category: None,
                target_value: Decimal::ZERO,
                deadline: None,
                description: String::new(),
            },
        );
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_settings_roundtrip() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        // Defaults before anything is stored
        assert_eq!(emergency_reserve(&conn)?, Decimal::ZERO);
        let defaults = allocation_targets(&conn)?;
        let sum: Decimal = defaults.values().copied().sum();
        assert_eq!(sum, dec!(100));

        set_emergency_reserve(&conn, dec!(2500))?;
        assert_eq!(emergency_reserve(&conn)?, dec!(2500));

        let mut targets = HashMap::new();
        targets.insert("Renda Fixa".to_string(), dec!(60));
        targets.insert("Stocks".to_string(), dec!(40));
        set_allocation_targets(&conn, &targets)?;
        assert_eq!(allocation_targets(&conn)?, targets);

        set_last_rebalance_date(&conn, date(2025, 6, 1))?;
        assert_eq!(last_rebalance_date(&conn)?, Some(date(2025, 6, 1)));
        Ok(())
    }

    #[test]
    fn test_setting_raw_string_fallback() -> Result<()> {
        let (_dir, conn) = setup_db()?;

        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('legacy', 'not json at all')",
            [],
        )?;
        let value = get_setting(&conn, "legacy")?.unwrap();
        assert_eq!(value.as_str(), Some("not json at all"));
        Ok(())
    }

    #[test]
    fn test_backup_copies_file_and_records_timestamp() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("test.db");
        init_database(Some(path.clone()))?;
        let conn = open_db(Some(path.clone()))?;

        insert_transaction(&conn, &buy(date(2025, 1, 10), "AAA", dec!(1), dec!(1)))?;

        let dest = dir.path().join("backup.db");
        let bytes = backup_database(&conn, &path, &dest)?;
        assert!(bytes > 0);
        assert!(dest.exists());
        assert!(last_backup_timestamp(&conn)?.is_some());
        Ok(())
    }
}
