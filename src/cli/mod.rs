use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carteira")]
#[command(version, about = "Personal investment portfolio tracker")]
#[command(
    long_about = "Track your investment portfolio (fixed income, stocks, FIIs, crypto) with \
average-cost accounting, monthly evolution, rebalancing suggestions and goal tracking."
)]
pub struct Cli {
    /// Path to the database file (defaults to ~/.carteira/data.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database (safe to run again)
    Init,

    /// Record a transaction
    Add {
        /// Asset symbol (e.g. PETR4, BTC, CDB-NUBANK)
        asset: String,

        /// Kind: buy, sell, withdraw, dividend, jcp, fee, bonus,
        /// fx_exchange, contribution, redemption, reinvestment
        /// (Portuguese names also accepted)
        kind: String,

        /// Quantity (fractional allowed; use 0 for lump-sum kinds)
        quantity: String,

        /// Unit price
        price: String,

        /// Trade date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Broker name
        #[arg(long, default_value = "")]
        broker: String,

        /// Asset category (e.g. "Tesouro Direto", "Ações", "Criptomoedas")
        #[arg(long, default_value = "Outros")]
        category: String,

        /// Currency code
        #[arg(long, default_value = "BRL")]
        currency: String,

        /// Exchange rate applied at trade time
        #[arg(long, default_value = "1")]
        fx_rate: String,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Remove a transaction by id
    Remove {
        /// Transaction id (see `list`)
        id: i64,
    },

    /// Show the transaction history, most recent first
    List {
        /// Only entries on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only entries on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Filter by kind
        #[arg(long)]
        kind: Option<String>,
    },

    /// Overview: totals, positions and allocation
    Dashboard {
        /// Skip live price lookup; value everything at cost
        #[arg(long)]
        offline: bool,
    },

    /// Monthly contribution and accumulated-cost series
    Evolution,

    /// Simulate selling a position at a hypothetical price
    Simulate {
        /// Asset symbol
        asset: String,

        /// Sale price (defaults to the position's average cost)
        #[arg(long)]
        price: Option<String>,
    },

    /// Compare current allocation against targets and suggest trades
    Rebalance {
        /// New contribution to distribute
        #[arg(long, default_value = "0")]
        contribution: String,

        /// USD/BRL rate (fetched when omitted)
        #[arg(long)]
        usd_rate: Option<String>,

        /// Price override in ASSET=VALUE form (BRL, repeatable)
        #[arg(long = "price")]
        prices: Vec<String>,

        /// Skip live price lookup; unpriced assets valued at cost
        #[arg(long)]
        offline: bool,
    },

    /// Savings goals
    Goals {
        #[command(subcommand)]
        action: GoalsCommands,
    },

    /// Allocation targets used by `rebalance`
    Targets {
        #[command(subcommand)]
        action: TargetsCommands,
    },

    /// Emergency reserve parked inside fixed income
    Reserve {
        #[command(subcommand)]
        action: ReserveCommands,
    },

    /// Copy the database file to a destination
    Backup {
        /// Destination path
        dest: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum GoalsCommands {
    /// Create a goal
    Add {
        /// Kind: wealth, category or income
        kind: String,

        /// Target value
        target: String,

        /// Category filter (required for category goals)
        #[arg(long)]
        category: Option<String>,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Goal name (e.g. "Aposentadoria", "Carro")
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List goals with current progress
    List,

    /// Delete a goal by id
    Remove {
        /// Goal id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TargetsCommands {
    /// Show the configured targets
    Show,

    /// Replace the targets (BUCKET=PCT, repeatable; must sum to 100)
    Set {
        /// e.g. "Renda Fixa=50" "Stocks=50"
        entries: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ReserveCommands {
    /// Show the configured reserve
    Show,

    /// Set the reserve amount
    Set {
        /// Amount in BRL
        amount: String,
    },
}
