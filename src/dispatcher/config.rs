use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::db;
use crate::portfolio::rebalance::validate_targets;
use crate::utils::{format_brl, format_pct};

use super::{open, parse_decimal};

pub fn dispatch_init(db_path: Option<PathBuf>) -> Result<()> {
    let (path, _) = open(db_path)?;
    println!("{} Database ready at {:?}", "✓".green().bold(), path);
    Ok(())
}

pub fn dispatch_targets_show(db_path: Option<PathBuf>) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let targets = db::allocation_targets(&conn)?;

    let mut ordered: Vec<(&String, &Decimal)> = targets.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    println!("{}", "Allocation targets".bold());
    for (bucket, pct) in ordered {
        println!("  {:<20} {}", bucket, format_pct(*pct));
    }
    Ok(())
}

pub fn dispatch_targets_set(db_path: Option<PathBuf>, entries: &[String]) -> Result<()> {
    if entries.is_empty() {
        anyhow::bail!("Provide at least one BUCKET=PCT entry");
    }

    let mut targets: HashMap<String, Decimal> = HashMap::new();
    for entry in entries {
        let (bucket, pct) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid target '{}', expected BUCKET=PCT", entry))?;
        targets.insert(bucket.trim().to_string(), parse_decimal(pct, "percentage")?);
    }

    // Reject before persisting - a bad sum would poison every rebalance.
    validate_targets(&targets)?;

    let (_, conn) = open(db_path)?;
    db::set_allocation_targets(&conn, &targets)?;
    println!("{} Targets saved", "✓".green().bold());
    Ok(())
}

pub fn dispatch_reserve_show(db_path: Option<PathBuf>) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let reserve = db::emergency_reserve(&conn)?;
    println!("Emergency reserve: {}", format_brl(reserve));
    Ok(())
}

pub fn dispatch_reserve_set(db_path: Option<PathBuf>, amount: &str) -> Result<()> {
    let amount = parse_decimal(amount, "reserve amount")?;
    if amount < Decimal::ZERO {
        anyhow::bail!("Reserve cannot be negative");
    }

    let (_, conn) = open(db_path)?;
    db::set_emergency_reserve(&conn, amount)?;
    println!("{} Reserve set to {}", "✓".green().bold(), format_brl(amount));
    Ok(())
}

pub fn dispatch_backup(db_path: Option<PathBuf>, dest: &Path) -> Result<()> {
    let (path, conn) = open(db_path)?;
    let bytes = db::backup_database(&conn, &path, dest)?;
    println!(
        "{} Backed up {} bytes to {:?}",
        "✓".green().bold(),
        bytes,
        dest
    );
    Ok(())
}
