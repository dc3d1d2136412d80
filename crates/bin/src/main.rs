use clap::Parser;

mod cli;
mod output;
mod templates;

mod commands {
    pub mod health;
    pub mod serve;
    pub mod status;
}

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Status(args)) => {
            let format = if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            commands::status::run(&args, format).await
        }
        None => commands::serve::run(&cli.serve).await,
    }
}
