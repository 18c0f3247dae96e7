pub mod commands;

use clap::{Parser, Subcommand};
use nl2sql_core::config::{AppConfig, LogFormat};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "nl2sql",
    about = "NL2SQL operator CLI",
    long_about = "Inspect configuration, agent strategies, the data dictionary, and run the SQL and retrieval tools directly.",
    after_help = "Examples:\n  nl2sql doctor --json\n  nl2sql agents --strategy nl2sql_fewshot\n  nl2sql schema --table sales\n  nl2sql execute \"SELECT COUNT(*) FROM sales\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, data dictionary, prompt files, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Build a session configuration and print its agents, tools and transitions")]
    Agents {
        #[arg(long, help = "nl2sql_advisor | nl2sql_fewshot | classic_rag")]
        strategy: Option<String>,
    },
    #[command(about = "List every table described in the data dictionary")]
    Tables,
    #[command(about = "Look up a table or column in the data dictionary")]
    Schema {
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        column: Option<String>,
    },
    #[command(about = "Check SQL syntax without running the statement")]
    Validate { query: String },
    #[command(about = "Run a SELECT statement and print the rows")]
    Execute { query: String },
    #[command(about = "Search the document index, or the keyword collection with --keyword")]
    Search {
        query: String,
        #[arg(long)]
        keyword: bool,
    },
    #[command(about = "Print today's date (YYYY-MM-DD)")]
    Today,
    #[command(about = "Print the current time (HH:MM)")]
    Time,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let loaded = commands::load();
    init_logging(loaded.as_ref().ok());

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&loaded) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(&loaded, json) }
        }
        Command::Agents { strategy } => commands::agents::run(&loaded, strategy.as_deref()),
        Command::Tables => commands::dictionary::tables(&loaded),
        Command::Schema { table, column } => {
            commands::dictionary::schema(&loaded, table.as_deref(), column.as_deref())
        }
        Command::Validate { query } => commands::sql::validate(&loaded, &query),
        Command::Execute { query } => commands::sql::execute(&loaded, &query),
        Command::Search { query, keyword } => commands::search::run(&loaded, &query, keyword),
        Command::Today => commands::clock::today(),
        Command::Time => commands::clock::time(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(config: Option<&AppConfig>) {
    use tracing::Level;

    // A broken config is reported by the command itself.
    let Some(config) = config else {
        tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(Level::WARN).init();
        return;
    };

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_writer(std::io::stderr).with_target(false).with_max_level(log_level);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
