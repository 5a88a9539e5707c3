//! `schema`: list tables and columns of an uploaded file or database.

use super::emit_json;
use crate::client::{AnalysisClient, SchemaQuery};
use crate::config::Config;
use anyhow::Result;
use colored::Colorize;

pub async fn run_schema(query: &SchemaQuery, json: bool, config: &Config) -> Result<()> {
    let client = AnalysisClient::from_config(&config.api)?;
    let schema = client.fetch_schema(query).await?;

    if json {
        return emit_json(&schema, config);
    }

    if !schema.tables.is_empty() {
        println!("\n{} {}", "🗄".bright_blue(), "Tables".bright_white().bold());
        for table in &schema.tables {
            println!("   {}", table.bright_cyan());
        }
    }

    println!("\n{} {}", "📋".bright_blue(), "Columns".bright_white().bold());
    if schema.columns.is_empty() {
        println!("   {}", "No columns found".dimmed());
    }
    for column in &schema.columns {
        println!("   {}", column);
    }
    Ok(())
}
