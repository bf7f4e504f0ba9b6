//! GitHub organisation commands.

use clap::Subcommand;
use console::style;
use serde_json::json;

use pd_core::config::AppConfig;
use pd_core::error::PdResult;
use pd_github::GithubOrgClient;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum GithubAction {
    /// Show an organisation's payload.
    Org {
        /// Organisation login, e.g. "google".
        org: String,
    },
    /// List an organisation's public repositories.
    Repos {
        org: String,
        /// Only repositories with this license key, e.g. "apache-2.0".
        #[arg(short, long)]
        license: Option<String>,
    },
}

pub async fn run(config: &AppConfig, action: GithubAction, format: OutputFormat) -> PdResult<()> {
    match action {
        GithubAction::Org { org } => {
            let client = GithubOrgClient::from_config(&org, &config.github)?;
            let payload = client.org().await?;
            match format {
                OutputFormat::Json => super::print_json(payload)?,
                OutputFormat::Text => {
                    println!("{}", style(format!("Organisation {org}")).bold().underlined());
                    for key in ["login", "name", "description", "public_repos", "repos_url"] {
                        if let Some(value) = payload.get(key) {
                            println!("  {key:<14} {}", super::cell(value));
                        }
                    }
                }
            }
        }
        GithubAction::Repos { org, license } => {
            let client = GithubOrgClient::from_config(&org, &config.github)?;
            let repos = client.public_repos(license.as_deref()).await?;
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "org": org,
                    "license": license,
                    "repos": repos,
                }))?,
                OutputFormat::Text => {
                    if repos.is_empty() {
                        println!("  No repositories found.");
                    }
                    for name in &repos {
                        println!("{name}");
                    }
                }
            }
        }
    }
    Ok(())
}
