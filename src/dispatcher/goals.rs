use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use crate::db::{self, GoalKind, NewGoal};
use crate::portfolio::goals::evaluate_goals;
use crate::utils::{format_brl, format_pct};

use super::{open, parse_date, parse_decimal};

pub fn dispatch_goal_add(
    db_path: Option<PathBuf>,
    kind: &str,
    target: &str,
    category: Option<&str>,
    deadline: Option<&str>,
    description: &str,
) -> Result<()> {
    let kind = kind
        .parse::<GoalKind>()
        .map_err(|_| anyhow::anyhow!("Unknown goal kind: '{}' (wealth, category or income)", kind))?;

    if kind == GoalKind::CategoryTotal && category.is_none() {
        anyhow::bail!("Category goals need --category");
    }

    let goal = NewGoal {
        kind,
        filter_category: category.map(String::from),
        target_value: parse_decimal(target, "target")?,
        deadline: deadline.map(parse_date).transpose()?,
        description: description.to_string(),
    };

    let (_, conn) = open(db_path)?;
    let id = db::insert_goal(&conn, &goal)?;
    println!("{} Created goal (id {})", "✓".green().bold(), id);
    Ok(())
}

pub fn dispatch_goal_list(db_path: Option<PathBuf>) -> Result<()> {
    let (_, conn) = open(db_path)?;
    let goals = db::list_goals(&conn)?;

    if goals.is_empty() {
        println!("No goals yet. Create one with `carteira goals add`.");
        return Ok(());
    }

    let transactions = db::list_transactions(&conn)?;
    let progress = evaluate_goals(&goals, &transactions);

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Goal")]
        title: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let rows: Vec<Row> = progress
        .iter()
        .map(|p| {
            let kind = match p.goal.kind {
                GoalKind::CategoryTotal => format!(
                    "{} ({})",
                    p.goal.kind.label(),
                    p.goal.filter_category.as_deref().unwrap_or("?")
                ),
                _ => p.goal.kind.label().to_string(),
            };
            Row {
                id: p.goal.id.map(|id| id.to_string()).unwrap_or_default(),
                title: p.goal.description.clone(),
                kind,
                current: format_brl(p.current_value),
                target: format_brl(p.goal.target_value),
                remaining: format_brl(p.remaining),
                progress: format_pct(p.progress_pct * rust_decimal::Decimal::from(100)),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    for p in &progress {
        if p.achieved() {
            println!(
                "{} Goal '{}' reached!",
                "🎉".bold(),
                p.goal.description
            );
        }
    }
    Ok(())
}

pub fn dispatch_goal_remove(db_path: Option<PathBuf>, id: i64) -> Result<()> {
    let (_, conn) = open(db_path)?;

    if db::delete_goal(&conn, id)? {
        println!("{} Removed goal id {}", "✓".green().bold(), id);
    } else {
        println!("{} No goal with id {}", "ℹ".blue().bold(), id);
    }
    Ok(())
}
