// src/cli/mod.rs — Command-line interface definitions

pub mod chat;
pub mod serve;
pub mod sessions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "Travel-planning chat with a durable session ledger")]
pub struct Cli {
    /// Path to an alternate config.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the session ledger API server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Interactive travel-planning chat
    Chat {
        /// Resume an existing session by id
        #[arg(long)]
        session: Option<String>,
    },

    /// Inspect or delete sessions on the server
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum SessionsAction {
    /// List sessions, most recently updated first
    List,
    /// Delete a session and all of its messages
    Delete { id: String },
}
