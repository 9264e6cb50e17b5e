//! todo - command-line front end for the multi-tenant todo core.
//!
//! Every command prints one JSON document on stdout. Rejected requests
//! print an `{"error","message"}` envelope on stderr and exit non-zero.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use todo_core::{init_logging, AppConfig, Store};

mod commands;

use commands::{Rejected, TodoCommands};

/// todo - multi-tenant todo list manager
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Bearer token from `todo login`
    #[arg(long, global = true, env = "TODO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Exchange credentials for a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the account behind the current token
    Whoami,

    /// Manage the caller's todos
    #[command(subcommand)]
    Todo(TodoCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(rejected) = err.downcast_ref::<Rejected>() {
                eprintln!("{}", rejected.to_json());
                ExitCode::from(1)
            } else {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        }
    }
}

fn run(cli: Cli) -> Result<serde_json::Value> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }
    log::debug!("event=cli_start module=cli status=ok config={config:?}");

    let store = Store::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    let ctx = commands::Context::new(&store, &config, cli.token.as_deref());

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => ctx.register(&username, &email, &password),
        Commands::Login { email, password } => ctx.login(&email, &password),
        Commands::Whoami => ctx.whoami(),
        Commands::Todo(command) => ctx.todo(command),
    }
}
