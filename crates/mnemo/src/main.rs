// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemo - long-term conversational memory for AI characters.
//!
//! This is the binary entry point. Every subcommand runs against the
//! configured SQLite database; `recall`, `extract`, `remember` and `check`
//! also talk to the Gemini API.

mod check;
mod commands;
mod runtime;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mnemo_core::Scope;

/// Mnemo - long-term conversational memory for AI characters.
#[derive(Parser, Debug)]
#[command(name = "mnemo", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// A (character, user) pair.
#[derive(Args, Debug, Clone)]
struct ScopeArgs {
    /// Character identifier.
    #[arg(long)]
    character: String,
    /// User identifier.
    #[arg(long)]
    user: String,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        Scope::new(self.character.clone(), self.user.clone())
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve the memories most relevant to a query.
    Recall {
        #[command(flatten)]
        scope: ScopeArgs,
        /// The upcoming user message.
        query: String,
        /// Maximum number of memories (defaults to memory.retrieval_limit).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Distill and store memories from a JSON transcript.
    Extract {
        #[command(flatten)]
        scope: ScopeArgs,
        /// File holding `[{"speaker":"user","text":"..."}, ...]`.
        #[arg(long)]
        transcript: PathBuf,
        /// Display name of the character (defaults to the character id).
        #[arg(long)]
        label: Option<String>,
    },
    /// Store a single fact.
    Remember {
        #[command(flatten)]
        scope: ScopeArgs,
        /// The fact to remember.
        content: String,
        /// Importance from 1 to 10 (defaults to memory.default_importance).
        #[arg(long)]
        importance: Option<u8>,
    },
    /// List the memories of a scope, newest first.
    List {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every memory of a scope.
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Delete every memory of a character across all users.
    ForgetCharacter {
        #[arg(long)]
        character: String,
    },
    /// Count a user's memories across all characters.
    Stats {
        #[arg(long)]
        user: String,
    },
    /// Validate configuration, storage and the Gemini adapters.
    Check {
        /// Also embed a probe text to verify the API key and dimensions.
        #[arg(long)]
        live: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mnemo_config::load_and_validate_path(path),
        None => mnemo_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mnemo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Commands::Recall {
            scope,
            query,
            limit,
        } => commands::run_recall(&config, &scope.scope(), &query, limit, cli.json).await,
        Commands::Extract {
            scope,
            transcript,
            label,
        } => {
            let label = label.unwrap_or_else(|| scope.character.clone());
            commands::run_extract(&config, &scope.scope(), &transcript, &label, cli.json).await
        }
        Commands::Remember {
            scope,
            content,
            importance,
        } => commands::run_remember(&config, &scope.scope(), &content, importance, cli.json).await,
        Commands::List { scope, limit } => {
            commands::run_list(&config, &scope.scope(), limit, cli.json).await
        }
        Commands::Clear { scope } => commands::run_clear(&config, &scope.scope(), cli.json).await,
        Commands::ForgetCharacter { character } => {
            commands::run_forget_character(&config, &character, cli.json).await
        }
        Commands::Stats { user } => commands::run_stats(&config, &user, cli.json).await,
        Commands::Check { live } => check::run_check(&config, live).await,
    };

    if let Err(e) = result {
        eprintln!("mnemo: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mnemo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
