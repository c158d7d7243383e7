use clap::Subcommand;
use serde_json::json;

use crate::commands::utils::{self, OutputFormat};
use webprompt::{Error, Result, SessionStore};

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List saved sessions
    List {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },

    /// Print the storage state saved under a name
    Show {
        /// Session name
        name: String,
    },

    /// Delete a saved session
    Delete {
        /// Session name
        name: String,
    },

    /// Delete sessions not used for a number of days
    Cleanup {
        /// Age in days
        #[arg(short, long, default_value = "30")]
        days: u32,
    },
}

pub async fn handle_sessions(command: SessionCommands) -> Result<()> {
    let store = SessionStore::new()?;

    match command {
        SessionCommands::List { format } => {
            let sessions = store.list()?;
            match format {
                OutputFormat::Json => {
                    utils::print_output(&serde_json::to_value(&sessions)?, format)?
                }
                OutputFormat::Simple => {
                    if sessions.is_empty() {
                        println!("No saved sessions in {}", store.dir().display());
                    }
                    for session in sessions {
                        println!(
                            "{}  {} cookies, {} origins, last used {}",
                            session.name,
                            session.cookie_count,
                            session.origin_count,
                            session.last_used.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }
        SessionCommands::Show { name } => {
            let state = store
                .load(&name)?
                .ok_or_else(|| Error::config(format!("Session '{}' does not exist", name)))?;
            utils::print_output(&serde_json::to_value(&state)?, OutputFormat::Json)?;
        }
        SessionCommands::Delete { name } => {
            store.delete(&name)?;
            println!("Deleted session '{}'", name);
        }
        SessionCommands::Cleanup { days } => {
            let deleted = store.cleanup(days)?;
            utils::print_output(&json!({ "deleted": deleted }), OutputFormat::Json)?;
        }
    }

    Ok(())
}
