//! Demos against the `users` table of users.db.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use serde_json::json;

use pd_core::config::AppConfig;
use pd_core::error::{PdError, PdResult};
use pd_dbkit::{
    fetch_all_users, fetch_concurrently, fetch_users, get_user_by_id, log_queries, retry_on_failure,
    setup_demo_users, update_user_email, with_db_connection, DemoUser, QueryCache, RetryPolicy, Row,
    SELECT_ALL_USERS,
};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum UsersAction {
    /// Create the users table and seed the demo users.
    Setup,
    /// List every user.
    List,
    /// Show one user.
    Get {
        id: i64,
    },
    /// Change a user's email inside a transaction.
    UpdateEmail {
        id: i64,
        email: String,
    },
    /// List users, retrying on failure.
    FetchRetry {
        /// Attempts before giving up (overrides config).
        #[arg(short, long)]
        retries: Option<u32>,
    },
    /// Run a query twice through the query cache.
    Cached {
        #[arg(default_value = "SELECT * FROM users")]
        query: String,
    },
    /// Fetch all users and older users concurrently.
    Concurrent {
        /// Age threshold (overrides config).
        #[arg(short, long)]
        older_than: Option<i64>,
    },
}

pub async fn run(config: &AppConfig, action: UsersAction, format: OutputFormat) -> PdResult<()> {
    let db_path = PathBuf::from(&config.demo.users_db);

    match action {
        UsersAction::Setup => {
            let inserted = with_db_connection(&db_path, |conn| setup_demo_users(conn))?;
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "path": db_path.display().to_string(),
                    "inserted": inserted,
                }))?,
                OutputFormat::Text => println!(
                    "  {} {} ready, {inserted} user(s) inserted.",
                    style("OK").green().bold(),
                    db_path.display()
                ),
            }
        }
        UsersAction::List => {
            let users = with_db_connection(&db_path, |conn| {
                log_queries(SELECT_ALL_USERS, |query| fetch_users(conn, query))
            })?;
            print_users(&users, format)?;
        }
        UsersAction::Get { id } => {
            let user = with_db_connection(&db_path, |conn| get_user_by_id(conn, id))?
                .ok_or_else(|| PdError::not_found("user", id))?;
            print_users(std::slice::from_ref(&user), format)?;
        }
        UsersAction::UpdateEmail { id, email } => {
            with_db_connection(&db_path, |conn| update_user_email(conn, id, &email))?;
            match format {
                OutputFormat::Json => super::print_json(&json!({"id": id, "email": email}))?,
                OutputFormat::Text => println!(
                    "  {} User {id} now has email {email}.",
                    style("OK").green().bold()
                ),
            }
        }
        UsersAction::FetchRetry { retries } => {
            let mut policy = RetryPolicy::from_config(&config.demo);
            if let Some(retries) = retries {
                policy.retries = retries;
            }
            let users = retry_on_failure(&policy, || {
                with_db_connection(&db_path, |conn| fetch_all_users(conn))
            })?;
            print_users(&users, format)?;
        }
        UsersAction::Cached { query } => {
            let cache = QueryCache::new();
            let second = with_db_connection(&db_path, |conn| {
                cache.fetch(conn, &query)?;
                cache.fetch(conn, &query)
            })?;
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "query": query,
                    "cached_entries": cache.len(),
                    "rows": second,
                }))?,
                OutputFormat::Text => {
                    print_rows(&second);
                    println!(
                        "  {} second run served from cache ({} entr{}).",
                        style("cache").cyan(),
                        cache.len(),
                        if cache.len() == 1 { "y" } else { "ies" }
                    );
                }
            }
        }
        UsersAction::Concurrent { older_than } => {
            let older_than = older_than.unwrap_or(config.demo.older_than);
            let result = fetch_concurrently(&db_path, older_than).await?;
            match format {
                OutputFormat::Json => super::print_json(&result)?,
                OutputFormat::Text => {
                    println!("{}", style("All users").bold().underlined());
                    print_rows(&result.all_users);
                    println!();
                    println!("{}", style(format!("Users older than {older_than}")).bold().underlined());
                    print_rows(&result.older_users);
                }
            }
        }
    }
    Ok(())
}

fn print_users(users: &[DemoUser], format: OutputFormat) -> PdResult<()> {
    match format {
        OutputFormat::Json => super::print_json(users)?,
        OutputFormat::Text => {
            let mut table = super::new_table(vec!["ID", "Name", "Email", "Age"]);
            for user in users {
                table.add_row(vec![
                    user.id.to_string(),
                    user.name.clone(),
                    user.email.clone(),
                    user.age.map_or_else(|| "-".to_string(), |a| a.to_string()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn print_rows(rows: &[Row]) {
    if rows.is_empty() {
        println!("  (no rows)");
        return;
    }
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let header: Vec<String> = (1..=width).map(|i| format!("col{i}")).collect();
    let mut table = super::new_table(header.iter().map(String::as_str).collect());
    for row in rows {
        table.add_row(row.iter().map(super::cell).collect::<Vec<_>>());
    }
    println!("{table}");
}
