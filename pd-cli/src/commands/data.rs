//! `user_data` seeding and streaming.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use serde_json::json;

use pd_core::config::AppConfig;
use pd_core::error::PdResult;
use pd_dbkit::{
    average_age, batch_processing, connect_to_prodev, create_user_data_table,
    insert_user_data_from_csv, lazy_paginate, stream_users, UserData,
};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DataAction {
    /// Create the table and load rows from a CSV file.
    Seed {
        csv: PathBuf,
    },
    /// Stream every row.
    Stream {
        /// Stop after this many rows.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Users older than 25, read in batches.
    Batches {
        #[arg(default_value = "50")]
        size: u32,
    },
    /// Walk the table page by page.
    Paginate {
        #[arg(default_value = "100")]
        page_size: u32,
    },
    /// Average age computed from a stream of ages.
    AverageAge,
}

pub fn run(config: &AppConfig, action: DataAction, format: OutputFormat) -> PdResult<()> {
    let db_path = config.effective_user_data_db();

    match action {
        DataAction::Seed { csv } => {
            let mut conn = connect_to_prodev(&db_path)?;
            create_user_data_table(&conn)?;
            let inserted = insert_user_data_from_csv(&mut conn, &csv)?;
            match format {
                OutputFormat::Json => super::print_json(&json!({
                    "path": db_path.display().to_string(),
                    "inserted": inserted,
                }))?,
                OutputFormat::Text => println!(
                    "  {} {inserted} row(s) loaded from {} into {}.",
                    style("OK").green().bold(),
                    csv.display(),
                    db_path.display()
                ),
            }
        }
        DataAction::Stream { limit } => {
            let conn = connect_to_prodev(&db_path)?;
            let rows: Vec<UserData> = stream_users(&conn)
                .take(limit.unwrap_or(usize::MAX))
                .collect::<PdResult<_>>()?;
            print_user_data(&rows, format)?;
        }
        DataAction::Batches { size } => {
            let conn = connect_to_prodev(&db_path)?;
            let rows = batch_processing(&conn, size)?;
            print_user_data(&rows, format)?;
        }
        DataAction::Paginate { page_size } => {
            let mut pages = Vec::new();
            for page in lazy_paginate(&db_path, page_size) {
                pages.push(page?);
            }
            match format {
                OutputFormat::Json => super::print_json(&pages)?,
                OutputFormat::Text => {
                    for (number, page) in pages.iter().enumerate() {
                        println!("{}", style(format!("Page {}", number + 1)).bold().underlined());
                        print_user_data(page, format)?;
                    }
                    if pages.is_empty() {
                        println!("  (no rows)");
                    }
                }
            }
        }
        DataAction::AverageAge => {
            let conn = connect_to_prodev(&db_path)?;
            let average = average_age(&conn)?;
            match format {
                OutputFormat::Json => super::print_json(&json!({"average_age": average}))?,
                OutputFormat::Text => println!("Average age of users: {average:.2}"),
            }
        }
    }
    Ok(())
}

fn print_user_data(rows: &[UserData], format: OutputFormat) -> PdResult<()> {
    match format {
        OutputFormat::Json => super::print_json(rows)?,
        OutputFormat::Text => {
            let mut table = super::new_table(vec!["User ID", "Name", "Email", "Age"]);
            for row in rows {
                table.add_row(vec![
                    super::truncate(&row.user_id, 13),
                    row.name.clone(),
                    row.email.clone(),
                    row.age.to_string(),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
