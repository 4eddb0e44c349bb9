use anyhow::Result;
use carteira::cli::{Cli, Commands, GoalsCommands, ReserveCommands, TargetsCommands};
use carteira::dispatcher;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let db = cli.db;
    match cli.command {
        Commands::Init => dispatcher::config::dispatch_init(db),

        Commands::Add {
            asset,
            kind,
            quantity,
            price,
            date,
            broker,
            category,
            currency,
            fx_rate,
            note,
        } => dispatcher::transactions::dispatch_add(
            db,
            &asset,
            &kind,
            &quantity,
            &price,
            date.as_deref(),
            &broker,
            &category,
            &currency,
            &fx_rate,
            note.as_deref(),
        ),

        Commands::Remove { id } => dispatcher::transactions::dispatch_remove(db, id),

        Commands::List { from, to, kind } => dispatcher::transactions::dispatch_list(
            db,
            from.as_deref(),
            to.as_deref(),
            kind.as_deref(),
        ),

        Commands::Dashboard { offline } => {
            dispatcher::views::dispatch_dashboard(db, offline).await
        }

        Commands::Evolution => dispatcher::views::dispatch_evolution(db),

        Commands::Simulate { asset, price } => {
            dispatcher::views::dispatch_simulate(db, &asset, price.as_deref())
        }

        Commands::Rebalance {
            contribution,
            usd_rate,
            prices,
            offline,
        } => {
            dispatcher::rebalance::dispatch_rebalance(
                db,
                &contribution,
                usd_rate.as_deref(),
                &prices,
                offline,
            )
            .await
        }

        Commands::Goals { action } => match action {
            GoalsCommands::Add {
                kind,
                target,
                category,
                deadline,
                description,
            } => dispatcher::goals::dispatch_goal_add(
                db,
                &kind,
                &target,
                category.as_deref(),
                deadline.as_deref(),
                &description,
            ),
            GoalsCommands::List => dispatcher::goals::dispatch_goal_list(db),
            GoalsCommands::Remove { id } => dispatcher::goals::dispatch_goal_remove(db, id),
        },

        Commands::Targets { action } => match action {
            TargetsCommands::Show => dispatcher::config::dispatch_targets_show(db),
            TargetsCommands::Set { entries } => {
                dispatcher::config::dispatch_targets_set(db, &entries)
            }
        },

        Commands::Reserve { action } => match action {
            ReserveCommands::Show => dispatcher::config::dispatch_reserve_show(db),
            ReserveCommands::Set { amount } => {
                dispatcher::config::dispatch_reserve_set(db, &amount)
            }
        },

        Commands::Backup { dest } => dispatcher::config::dispatch_backup(db, &dest),
    }
}
