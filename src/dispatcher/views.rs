use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use crate::db;
use crate::portfolio::evolution::monthly_evolution;
use crate::portfolio::simulate::simulate_sale;
use crate::reports::{build_dashboard, class_allocation, value_positions};
use crate::utils::{format_brl, format_pct, format_qty};

use super::{open, parse_decimal, skip_price_fetch};

pub async fn dispatch_dashboard(db_path: Option<PathBuf>, offline: bool) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let transactions = db::list_transactions(&conn)?;

    if transactions.is_empty() {
        println!("No transactions yet. Record one with `carteira add`.");
        return Ok(());
    }

    let summary = build_dashboard(&transactions);

    println!("{}", "Visão Geral".bold());
    println!(
        "  Total Investido (Custo)        {}",
        format_brl(summary.invested_cost)
    );
    println!(
        "  Renda Passiva (Div + Caixinha) {}",
        format_brl(summary.passive_income_display())
    );
    let profit = format_brl(summary.realized_profit);
    let profit_colored = if summary.realized_profit >= Decimal::ZERO {
        profit.green()
    } else {
        profit.red()
    };
    println!("  Lucro Realizado (Vendas)       {}", profit_colored);
    println!();

    let prices: HashMap<String, Decimal> = if skip_price_fetch(offline) {
        HashMap::new()
    } else {
        let assets: Vec<String> = summary.positions.iter().map(|p| p.asset.clone()).collect();
        crate::pricing::fetch_prices_brl(&assets).await
    };
    let valued = value_positions(&summary, &prices);

    #[derive(Tabled)]
    struct PositionTableRow {
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Class")]
        class: String,
        #[tabled(rename = "Qty")]
        quantity: String,
        #[tabled(rename = "Avg Cost")]
        average_cost: String,
        #[tabled(rename = "Invested")]
        cost_basis: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<PositionTableRow> = valued
        .iter()
        .map(|v| PositionTableRow {
            asset: v.row.asset.clone(),
            category: v.row.category.clone(),
            class: v.row.class.as_str().to_string(),
            quantity: format_qty(v.row.quantity),
            average_cost: format_brl(v.row.average_cost),
            cost_basis: format_brl(v.row.cost_basis),
            value: if v.stale {
                format!("{} *", format_brl(v.market_value))
            } else {
                format_brl(v.market_value)
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    if valued.iter().any(|v| v.stale) {
        println!("  * no quote available; valued at cost");
    }
    println!();

    println!("{}", "Alocação por Classe".bold());
    let total = summary.invested_cost;
    for (class, value) in class_allocation(&summary) {
        let pct = if total > Decimal::ZERO {
            value / total * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
        println!(
            "  {:<16} {:>16}  {}",
            class.as_str(),
            format_brl(value),
            format_pct(pct)
        );
    }

    Ok(())
}

pub fn dispatch_evolution(db_path: Option<PathBuf>) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let transactions = db::list_transactions(&conn)?;

    let today = chrono::Local::now().date_naive();
    let series = monthly_evolution(&transactions, today);

    if series.is_empty() {
        println!("No transactions yet; nothing to chart.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Month")]
        month: String,
        #[tabled(rename = "Contribution")]
        contribution: String,
        #[tabled(rename = "Accumulated Cost")]
        accumulated: String,
    }

    let rows: Vec<Row> = series
        .iter()
        .map(|point| Row {
            month: point.month.format("%m/%Y").to_string(),
            contribution: format_brl(point.contribution),
            accumulated: format_brl(point.accumulated_cost),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

pub fn dispatch_simulate(
    db_path: Option<PathBuf>,
    asset: &str,
    price: Option<&str>,
) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let transactions = db::list_transactions(&conn)?;

    let snapshot = crate::portfolio::cost_basis::compute_snapshot(&transactions);
    let asset = asset.trim().to_uppercase();
    let Some(position) = snapshot.position(&asset) else {
        anyhow::bail!("No open position in {}", asset);
    };

    let average_cost = position.average_cost();
    let sale_price = match price {
        Some(raw) => parse_decimal(raw, "price")?,
        None => average_cost,
    };

    println!(
        "{} {}  qty {}  avg cost {}",
        "Simulating".bold(),
        asset,
        format_qty(position.quantity),
        format_brl(average_cost)
    );

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Scenario")]
        scenario: String,
        #[tabled(rename = "Qty")]
        quantity: String,
        #[tabled(rename = "Proceeds")]
        proceeds: String,
        #[tabled(rename = "Profit")]
        profit: String,
        #[tabled(rename = "ROI")]
        roi: String,
    }

    let rows: Vec<Row> = simulate_sale(position, sale_price)
        .iter()
        .map(|s| Row {
            scenario: format!("Vender {}%", s.fraction_pct),
            quantity: format_qty(s.quantity),
            proceeds: format_brl(s.gross_proceeds),
            profit: format_brl(s.profit),
            roi: format_pct(s.roi_pct),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}
