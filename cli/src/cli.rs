use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use filterql::core::constants::ENV_CONFIG;

#[derive(Parser, Debug)]
#[command(name = "filterql")]
#[command(version, about = "Compile and preview table filter predicates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config files, merged in order (later files win)
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG, value_delimiter = ',')]
    pub config: Vec<PathBuf>,
}

/// Inputs are file paths; `-` reads stdin
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile predicates into the backend filter object
    Compile {
        #[arg(long, short = 'p')]
        predicates: String,
    },
    /// Render predicates as a WHERE fragment
    Where {
        #[arg(long, short = 'p')]
        predicates: String,
    },
    /// Build a SELECT statement
    Select(SelectArgs),
    /// Build a COUNT statement
    Count {
        #[arg(long, short = 't')]
        table: String,
        #[arg(long, short = 'p')]
        predicates: Option<String>,
    },
    /// Evaluate predicates against a JSON array of rows
    Preview {
        #[arg(long, short = 'r')]
        rows: String,
        #[arg(long, short = 'p')]
        predicates: String,
    },
    /// Keyword-scan a backend filter object (exit code 2 when rejected)
    Validate {
        #[arg(long, short = 'f')]
        filters: String,
    },
    /// Recover WHERE and ORDER BY from SQL text (`-` reads stdin)
    Extract {
        #[arg(long, short = 's')]
        sql: String,
    },
}

#[derive(Args, Clone, Debug)]
pub struct SelectArgs {
    #[arg(long, short = 't')]
    pub table: String,

    /// Comma-separated column list (default `*`)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, short = 'p')]
    pub predicates: Option<String>,

    #[arg(long)]
    pub order_by: Option<String>,

    #[arg(long)]
    pub limit: Option<u64>,

    /// Ignored unless --limit is set
    #[arg(long)]
    pub offset: Option<u64>,

    /// Print the query descriptor JSON instead of SQL
    #[arg(long)]
    pub descriptor: bool,
}
