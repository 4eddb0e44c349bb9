use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;

use crate::db;
use crate::portfolio::classify::rebalance_bucket;
use crate::portfolio::cost_basis::compute_snapshot;
use crate::portfolio::rebalance::{plan_rebalance, PricedHolding, RebalancePlan};
use crate::portfolio::asset_categories;
use crate::utils::{format_brl, format_pct};

use super::{open, parse_decimal, skip_price_fetch};

pub async fn dispatch_rebalance(
    db_path: Option<PathBuf>,
    contribution: &str,
    usd_rate: Option<&str>,
    price_overrides: &[String],
    offline: bool,
) -> Result<()> {
    let contribution = parse_decimal(contribution, "contribution")?;
    let overrides = parse_price_overrides(price_overrides)?;

    let (_, conn) = open(db_path)?;
    let transactions = db::list_transactions(&conn)?;

    let snapshot = compute_snapshot(&transactions);
    if snapshot.positions.is_empty() {
        println!("Portfolio is empty; nothing to rebalance.");
        return Ok(());
    }

    let categories = asset_categories(&transactions);
    let targets = db::allocation_targets(&conn)?;
    let reserve = db::emergency_reserve(&conn)?;

    // Quotes for whatever the user did not override by hand.
    let missing: Vec<String> = snapshot
        .positions
        .keys()
        .filter(|asset| !overrides.contains_key(*asset))
        .cloned()
        .collect();
    let quotes = if skip_price_fetch(offline) || missing.is_empty() {
        HashMap::new()
    } else {
        crate::pricing::fetch_quotes(&missing).await
    };

    let usd_brl = match usd_rate {
        Some(raw) => parse_decimal(raw, "usd rate")?,
        None => {
            let usd_needed = quotes.values().any(|q| q.currency == "USD");
            if usd_needed && !skip_price_fetch(offline) {
                crate::pricing::fetch_usd_brl().await.unwrap_or_else(|e| {
                    warn!("USD/BRL rate unavailable ({}), using 1", e);
                    Decimal::ONE
                })
            } else {
                Decimal::ONE
            }
        }
    };

    let mut holdings = Vec::new();
    for (asset, position) in &snapshot.positions {
        let category = categories.get(asset).map(String::as_str).unwrap_or("");
        let bucket = rebalance_bucket(category).to_string();

        let (price, usd_priced) = if let Some(price) = overrides.get(asset) {
            (*price, false)
        } else if let Some(quote) = quotes.get(asset) {
            (quote.price, quote.currency == "USD")
        } else {
            // Degraded valuation: no quote, fall back to average cost
            warn!("No price for {}; valuing at average cost", asset);
            (position.average_cost(), false)
        };

        holdings.push(PricedHolding {
            asset: asset.clone(),
            bucket,
            quantity: position.quantity,
            price,
            usd_priced,
        });
    }

    let plan = plan_rebalance(&holdings, usd_brl, contribution, &targets, reserve)?;
    print_plan(&plan);

    db::set_last_rebalance_date(&conn, chrono::Local::now().date_naive())?;
    Ok(())
}

fn parse_price_overrides(entries: &[String]) -> Result<HashMap<String, Decimal>> {
    let mut overrides = HashMap::new();
    for entry in entries {
        let (asset, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid price override '{}', expected ASSET=VALUE", entry))?;
        overrides.insert(
            asset.trim().to_uppercase(),
            parse_decimal(value, "price override")?,
        );
    }
    Ok(overrides)
}

fn print_plan(plan: &RebalancePlan) {
    println!("{}", "Diagnóstico".bold());
    println!("  Patrimônio atual  {}", format_brl(plan.total_now));
    println!(
        "  Após aporte       {}",
        format_brl(plan.total_after_contribution)
    );
    println!();

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Bucket")]
        bucket: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Current %")]
        current_pct: String,
        #[tabled(rename = "Target %")]
        target_pct: String,
        #[tabled(rename = "Difference")]
        delta: String,
    }

    let rows: Vec<Row> = plan
        .comparisons
        .iter()
        .map(|c| Row {
            bucket: c.bucket.clone(),
            current: format_brl(c.current_value),
            current_pct: format_pct(c.current_pct),
            target_pct: format_pct(c.target_pct),
            delta: format_brl(c.delta),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();

    if plan.buys.is_empty() {
        println!("{} Nothing to buy.", "ℹ".blue().bold());
    } else {
        println!("{}", "Comprar".green().bold());
        for suggestion in &plan.buys {
            println!(
                "  {:<20} {}",
                suggestion.bucket,
                format_brl(suggestion.delta)
            );
        }
    }

    if plan.sells.is_empty() {
        println!("{} Nothing to sell.", "ℹ".blue().bold());
    } else {
        println!("{}", "Vender".red().bold());
        for suggestion in &plan.sells {
            println!(
                "  {:<20} {}",
                suggestion.bucket,
                format_brl(suggestion.delta.abs())
            );
        }
    }

    if plan.unallocated_value > Decimal::ZERO {
        println!(
            "{} Unclassified holdings total {}",
            "⚠".yellow().bold(),
            format_brl(plan.unallocated_value)
        );
    }
}
