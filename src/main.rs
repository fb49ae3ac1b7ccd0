//! Profile store demo
//!
//! Loads seed profiles and walks through every profile operation against the
//! configured table, printing the results.
//!
//! For local development with DynamoDB Local:
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8000 cargo run --bin setup_table
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8000 cargo run

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dynamo_profiles::{
    cli::{init_tracing, ConfigArgs},
    errors::DynamoError,
    ext::profiles::ProfileService,
    schema::{timestamp, PreferenceUpdate, Preferences, ProfileKey, UserProfile},
    util::{backend::DynamoBackendImpl, SortKeyCondition},
};

/// Runs the user profile demo against DynamoDB.
#[derive(Parser, Debug)]
#[command(name = "dynamo-profiles")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,

    /// JSON array of profiles loaded before the demo runs
    #[arg(long, default_value = "seed_data.json")]
    seed_file: PathBuf,
}

const DEMO_USER: &str = "user123";
const DEMO_TIMESTAMP: &str = "1698768000";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.config.log_level);

    let config = args.config.load().context("Invalid configuration")?;
    tracing::info!(
        region = %config.region,
        table = %config.table_name,
        endpoint = ?config.endpoint_url,
        "Starting profile demo"
    );
    let service = ProfileService::connect(&config).await?;

    println!("\nLoading seed data from {}...", args.seed_file.display());
    let loaded = service
        .load_seed_data(&args.seed_file)
        .await
        .context("Failed to load seed data")?;
    println!("✓ Loaded {loaded} profiles into {}", service.table());

    run_demo(&service).await;

    println!("\nDemo complete.");
    Ok(())
}

async fn run_demo<B: DynamoBackendImpl>(service: &ProfileService<B>) {
    let demo_key = ProfileKey::new(DEMO_USER, DEMO_TIMESTAMP);

    println!("\n1. Creating profile for user789...");
    let new_profile = UserProfile::new("user789", "user789@example.com", "Alice", "Johnson")
        .with_preferences(Preferences {
            theme: Some("dark".to_string()),
            notifications: Some(true),
        })
        .with_login_count(0);
    report(service.create(&new_profile).await, |_| {
        format!("Created {}", new_profile.key())
    });

    println!("\n2. Fetching {demo_key} (selected attributes)...");
    report(
        service
            .fetch(
                &demo_key,
                Some(&["userId", "email", "firstName", "lastName", "loginCount"]),
            )
            .await,
        |profile| match profile {
            Some(profile) => profile.to_string(),
            None => format!("No profile found for {demo_key}"),
        },
    );

    println!("\n3. Querying {DEMO_USER} activity since 1698700000...");
    report(
        service
            .query_by_partition(
                DEMO_USER,
                SortKeyCondition::GreaterThanOrEquals("1698700000".to_string()),
            )
            .await,
        |records| {
            let mut lines = vec![format!("Found {} records", records.len())];
            for record in records {
                lines.push(format!(
                    "    timestamp={} loginCount={}",
                    record.timestamp,
                    record
                        .login_count
                        .map(|count| count.to_string())
                        .unwrap_or_else(|| "-".to_string())
                ));
            }
            lines.join("\n")
        },
    );

    println!("\n4. Incrementing login count for {demo_key}...");
    report(service.increment_login_count(&demo_key, 1).await, |count| {
        format!("New login count: {count}")
    });

    println!("\n5. Updating theme preference for {demo_key}...");
    report(
        service
            .update_preferences(&demo_key, &[PreferenceUpdate::Theme("blue".to_string())])
            .await,
        |profile| match &profile.preferences {
            Some(preferences) => format!("Preferences now: {preferences}"),
            None => "Preferences now empty".to_string(),
        },
    );

    println!("\n6. Querying by email user456@example.com...");
    report(service.query_by_email("user456@example.com").await, |profiles| {
        let mut lines = vec![format!("Found {} profiles", profiles.len())];
        for profile in profiles {
            lines.push(format!(
                "    {} ({})",
                profile.user_id,
                profile.first_name.as_deref().unwrap_or("-")
            ));
        }
        lines.join("\n")
    });

    println!("\n7. Batch fetching profiles...");
    report(
        service
            .batch_fetch(&[demo_key.clone(), ProfileKey::new("user456", "1698940800")])
            .await,
        |profiles| format!("Retrieved {} profiles", profiles.len()),
    );

    println!("\n8. Deleting user789...");
    let delete_key = ProfileKey::new("user789", timestamp::now());
    report(service.delete(&delete_key).await, |profile| {
        format!("Deleted {}", profile.key())
    });
}

// Prints the outcome of a step. Errors never abort the demo.
fn report<T>(result: Result<T, DynamoError>, describe: impl FnOnce(&T) -> String) {
    match result {
        Ok(value) => println!("✓ {}", describe(&value)),
        Err(e) if e.is_condition_failed() => {
            println!("✗ Condition not met: {e}");
        }
        Err(e) => {
            tracing::error!(error = %e, "Demo step failed");
            println!("✗ {e}");
        }
    }
}
