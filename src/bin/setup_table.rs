//! CLI tool to create the profile table and its email index.
//!
//! Usage:
//!   cargo run --bin setup_table
//!
//! For local development with DynamoDB Local:
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8000 cargo run --bin setup_table

use anyhow::{Context, Result};
use clap::Parser;
use dynamo_profiles::{
    cli::{init_tracing, ConfigArgs},
    ext::profiles::ProfileService,
};

/// Create the DynamoDB table used by the profile demo
#[derive(Parser, Debug)]
#[command(name = "setup_table")]
#[command(about = "Create the DynamoDB table used by the profile demo")]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.config.log_level);

    let config = args.config.load().context("Invalid configuration")?;
    if let Some(url) = &config.endpoint_url {
        println!("Using DynamoDB endpoint: {url}");
    }
    let service = ProfileService::connect(&config).await?;

    println!("\n🚀 Setting up DynamoDB table...\n");
    match service.create_table().await {
        Ok(true) => println!(
            "✅ Created table: {} (index: {})",
            config.table_name, config.email_index
        ),
        Ok(false) => println!("⏭️  Table already exists: {}", config.table_name),
        Err(e) => {
            println!("❌ Failed to create table {}: {}", config.table_name, e);
            return Err(e.into());
        }
    }

    Ok(())
}
