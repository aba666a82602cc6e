//! leitbox CLI — the admin-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "leitbox", version, about = "Leitner spaced-repetition vocabulary scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and data directory
    Init,

    /// Generate a staged word assignment via the configured extractor
    Generate {
        /// Words to stage (comma-separated)
        #[arg(long)]
        words: String,

        /// Source language override
        #[arg(long)]
        source: Option<String>,

        /// Target language override
        #[arg(long)]
        target: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply a staged assignment to users
    Assign {
        /// Assignment id from a previous generate
        #[arg(long)]
        assignment: Uuid,

        /// Target user ids (comma-separated)
        #[arg(long)]
        users: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate and assign in one step
    AddWords {
        /// Words to add (comma-separated)
        #[arg(long)]
        words: String,

        /// Target user ids (comma-separated)
        #[arg(long)]
        users: String,

        /// Source language override
        #[arg(long)]
        source: Option<String>,

        /// Target language override
        #[arg(long)]
        target: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List a user's due cards
    Due {
        /// User id
        #[arg(long)]
        user: i64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run a review session for a user
    Review {
        /// User id
        #[arg(long)]
        user: i64,

        /// Answers in queue order (comma-separated: correct/c/y or wrong/w/n)
        #[arg(long)]
        answers: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Cancel a user's active review session
    Cancel {
        /// User id
        #[arg(long)]
        user: i64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show dashboard counters
    Stats {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("leitbox=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Generate {
            words,
            source,
            target,
            config,
        } => commands::generate::execute(words, source, target, config).await,
        Commands::Assign {
            assignment,
            users,
            config,
        } => commands::assign::execute(assignment, users, config).await,
        Commands::AddWords {
            words,
            users,
            source,
            target,
            config,
        } => commands::add_words::execute(words, users, source, target, config).await,
        Commands::Due { user, config } => commands::due::execute(user, config).await,
        Commands::Review {
            user,
            answers,
            config,
        } => commands::review::execute(user, answers, config).await,
        Commands::Cancel { user, config } => commands::cancel::execute(user, config).await,
        Commands::Stats { config } => commands::stats::execute(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
