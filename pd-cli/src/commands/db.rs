//! Messaging database management commands.

use clap::Subcommand;
use console::style;
use serde_json::json;

use pd_core::config::AppConfig;
use pd_core::error::PdResult;
use pd_models::Database;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show row counts per table.
    Stats,
    /// Run an integrity check.
    Integrity,
    /// Delete all messaging data.
    Reset {
        /// Skip the safety refusal.
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(config: &AppConfig, action: DbAction, format: OutputFormat) -> PdResult<()> {
    let db_path = config.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let db = Database::init(&db_path, &config.database)?;
            let stats = db.stats()?;
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "path": db_path.display().to_string(),
                    "tables": stats,
                }))?,
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:  {}", db_path.display());
                    println!();

                    let mut table = super::new_table(vec!["Table", "Row Count"]);
                    table.add_row(vec!["users".to_string(), stats.users.to_string()]);
                    table.add_row(vec!["conversations".to_string(), stats.conversations.to_string()]);
                    table.add_row(vec!["messages".to_string(), stats.messages.to_string()]);
                    table.add_row(vec!["notifications".to_string(), stats.notifications.to_string()]);
                    table.add_row(vec!["message_history".to_string(), stats.message_history.to_string()]);
                    println!("{table}");
                }
            }
        }
        DbAction::Integrity => {
            let db = Database::init(&db_path, &config.database)?;
            let result = db.run_integrity_check();
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "path": db_path.display().to_string(),
                    "ok": result.is_ok(),
                    "error": result.as_ref().err().map(ToString::to_string),
                }))?,
                OutputFormat::Text => match &result {
                    Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                    Err(e) => println!("  {} Integrity check failed: {e}", style("FAIL").red().bold()),
                },
            }
            result?;
        }
        DbAction::Reset { yes } => {
            println!(
                "  {} This deletes ALL messaging data in {}.",
                style("WARNING").red().bold(),
                db_path.display()
            );
            if !yes {
                println!("  Re-run with --yes to confirm.");
                return Ok(());
            }
            let db = Database::init(&db_path, &config.database)?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
    }
    Ok(())
}
