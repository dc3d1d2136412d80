//! CLI argument definitions for the devqueue binary.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

/// devqueue shared device reservation server
#[derive(Parser, Debug)]
#[command(name = "devqueue")]
#[command(about = "devqueue: fair, live-synchronized reservations for shared devices")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments used when no subcommand is given (runs the server)
    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the devqueue server
    Serve(ServeArgs),
    /// Check health of a running devqueue server
    Health(HealthArgs),
    /// Show users and devices of a running devqueue server
    Status(StatusArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3001, env = "DEVQUEUE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "DEVQUEUE_HOST")]
    pub host: String,

    /// HTML file to serve at `/` instead of the built-in client
    #[arg(long, env = "DEVQUEUE_INDEX_FILE")]
    pub index_file: Option<PathBuf>,
}

/// Location of a running server, shared by client-side commands
#[derive(clap::Args, Debug)]
pub struct ServerAddr {
    /// Port of the server
    #[arg(short, long, default_value_t = 3001, env = "DEVQUEUE_PORT")]
    pub port: u16,

    /// Host of the server
    #[arg(long, default_value = "127.0.0.1", env = "DEVQUEUE_HOST")]
    pub host: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

impl ServerAddr {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub server: ServerAddr,
}

/// Arguments for the status command
#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub server: ServerAddr,

    /// Print the raw state as JSON
    #[arg(long)]
    pub json: bool,
}
