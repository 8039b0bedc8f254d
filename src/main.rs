mod commands;
mod logging;
mod prompt;

use clap::{Parser, Subcommand};
use warden_core::config;

#[derive(Parser)]
#[command(
    name = "groupwarden",
    version,
    about = "Batched, whitelist-aware WhatsApp group membership tooling"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, global = true, default_value = "groupwarden.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove the contacts CSV from the target groups, one approved batch at a time.
    Remove(commands::RemoveArgs),
    /// Write the members two groups have in common as a contacts CSV.
    Compare {
        #[arg(long)]
        group1: String,
        #[arg(long)]
        group2: String,
        /// Contacts CSV to write (defaults to the configured contacts file).
        #[arg(long)]
        output: Option<String>,
    },
    /// List the members of a group.
    Members {
        /// Group JID.
        group: String,
    },
    /// Send a one-shot text message.
    Send {
        /// Recipient JID.
        #[arg(long)]
        to: String,
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Send one message to every recipient of a CSV, with a delay between sends.
    Broadcast(commands::BroadcastArgs),
    /// Manage the whitelist file.
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// Protect phone numbers (local or international form).
    Add {
        #[arg(required = true)]
        phones: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _guard = logging::init(&cfg.log_level, &cfg.files.log);

    match cli.command {
        Commands::Remove(args) => commands::remove(cfg, args).await?,
        Commands::Compare {
            group1,
            group2,
            output,
        } => {
            let output = output.unwrap_or_else(|| cfg.files.contacts.clone());
            commands::compare(&cfg, &group1, &group2, &output).await?;
        }
        Commands::Members { group } => commands::members(&cfg, &group).await?,
        Commands::Send { to, message } => commands::send(&cfg, &to, &message).await?,
        Commands::Broadcast(args) => commands::broadcast(&cfg, args).await?,
        Commands::Whitelist {
            action: WhitelistAction::Add { phones },
        } => commands::whitelist_add(&cfg, &phones)?,
    }

    Ok(())
}
