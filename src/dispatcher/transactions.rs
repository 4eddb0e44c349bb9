use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use crate::db::{self, NewTransaction, TransactionKind};
use crate::utils::{format_brl, format_qty};

use super::{open, parse_date, parse_decimal};

#[allow(clippy::too_many_arguments)]
pub fn dispatch_add(
    db_path: Option<PathBuf>,
    asset: &str,
    kind: &str,
    quantity: &str,
    price: &str,
    date: Option<&str>,
    broker: &str,
    category: &str,
    currency: &str,
    fx_rate: &str,
    note: Option<&str>,
) -> Result<()> {
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(|_| anyhow::anyhow!("Unknown transaction kind: '{}'", kind))?;
    let date = match date {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let tx = NewTransaction {
        date,
        asset: asset.to_string(),
        kind,
        quantity: parse_decimal(quantity, "quantity")?,
        unit_price: parse_decimal(price, "price")?,
        broker: broker.to_string(),
        category: category.to_string(),
        currency: currency.to_string(),
        fx_rate: parse_decimal(fx_rate, "fx rate")?,
        note: note.map(String::from),
    };

    let (_, conn) = open(db_path)?;
    let id = db::insert_transaction(&conn, &tx)?;

    println!(
        "{} Recorded {} {} (id {})",
        "✓".green().bold(),
        kind.as_str(),
        asset.to_uppercase(),
        id
    );
    Ok(())
}

pub fn dispatch_remove(db_path: Option<PathBuf>, id: i64) -> Result<()> {
    let (_, conn) = open(db_path)?;

    if db::delete_transaction(&conn, id)? {
        println!("{} Removed transaction id {}", "✓".green().bold(), id);
    } else {
        println!("{} No transaction with id {}", "ℹ".blue().bold(), id);
    }
    Ok(())
}

pub fn dispatch_list(
    db_path: Option<PathBuf>,
    from: Option<&str>,
    to: Option<&str>,
    kind: Option<&str>,
) -> Result<()> {
    let from = from.map(parse_date).transpose()?;
    let to = to.map(parse_date).transpose()?;
    let kind_filter = kind
        .map(|raw| {
            raw.parse::<TransactionKind>()
                .map_err(|_| anyhow::anyhow!("Unknown transaction kind: '{}'", raw))
        })
        .transpose()?;

    let (_, conn) = open(db_path)?;
    let transactions = db::list_transactions(&conn)?;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Qty")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Total")]
        total: String,
    }

    let rows: Vec<Row> = transactions
        .iter()
        .filter(|tx| from.is_none_or(|d| tx.date >= d))
        .filter(|tx| to.is_none_or(|d| tx.date <= d))
        .filter(|tx| kind_filter.is_none_or(|k| tx.kind == k))
        .map(|tx| Row {
            id: tx.id.map(|id| id.to_string()).unwrap_or_default(),
            date: tx.date.format("%d/%m/%Y").to_string(),
            asset: tx.asset.clone(),
            kind: tx.kind.as_str().to_string(),
            category: tx.category.clone(),
            quantity: format_qty(tx.quantity),
            price: format_brl(tx.unit_price),
            total: format_brl(tx.total_value),
        })
        .collect();

    if rows.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let count = rows.len();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!("{} transactions", count);
    Ok(())
}
