//! Monitask - build monitoring tasks by talking to an agent

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod chooser;
mod commands;
mod render;

use commands::{chat_command, init_command, status_command, templates_command, tools_command};

/// Monitask - configure what to watch by chatting
#[derive(Parser)]
#[command(name = "monitask")]
#[command(about = "◆ Conversational builder for monitoring tasks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and data directory
    Init,
    /// Chat with the agent to build a task
    Chat {
        /// Message to send
        #[arg(short, long)]
        message: Option<String>,
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show configuration and saved task status
    Status {
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// List the built-in source bundles
    Templates,
    /// List the tools offered to the agent
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if matches!(cli.command, Commands::Chat { verbose: true, .. }) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Chat {
            message,
            session,
            verbose: _,
        } => chat_command(message, session).await,
        Commands::Status { session } => status_command(session).await,
        Commands::Templates => templates_command(),
        Commands::Tools => tools_command(),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
