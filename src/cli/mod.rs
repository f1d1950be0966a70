use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod chat;

#[derive(Subcommand)]
enum Command {
    /// Send the conversation in a note to the model and stream the reply
    /// back into the file
    Chat {
        /// Path to the note file
        file: std::path::PathBuf,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();

    match args.command {
        Some(Command::Chat { file, model }) => {
            chat::run(&file, model.as_deref()).await?;
        }
        None => {}
    }

    Ok(())
}
