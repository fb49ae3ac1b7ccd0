//! Command line plumbing shared by the binaries.

use clap::Args;

use crate::{env::DynamoEnvConfig, errors::DynamoError};

/// Overrides for values otherwise read from the environment.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// AWS region (overrides DYNAMO_REGION env var)
    #[arg(long)]
    pub region: Option<String>,

    /// Profile table name (overrides PROFILE_TABLE_NAME env var)
    #[arg(long)]
    pub table: Option<String>,

    /// Email secondary index name (overrides PROFILE_EMAIL_INDEX env var)
    #[arg(long)]
    pub email_index: Option<String>,

    /// DynamoDB endpoint URL, e.g. http://localhost:8000 for DynamoDB Local
    /// (overrides DYNAMODB_ENDPOINT_URL env var)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Log level: trace, debug, info, warn, error (ignored if RUST_LOG is set)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ConfigArgs {
    /// Environment config with the flags applied on top.
    pub fn load(&self) -> Result<DynamoEnvConfig, DynamoError> {
        self.apply(DynamoEnvConfig::from_env()?)
    }

    pub fn apply(&self, mut config: DynamoEnvConfig) -> Result<DynamoEnvConfig, DynamoError> {
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(table) = &self.table {
            config.table_name = table.clone();
        }
        if let Some(email_index) = &self.email_index {
            config.email_index = email_index.clone();
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint_url.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout only carries
/// program output.
pub fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> DynamoEnvConfig {
        DynamoEnvConfig::from_lookup(|_| None).unwrap()
    }

    #[test]
    fn test_no_overrides() {
        let config = ConfigArgs::default().apply(base_config()).unwrap();
        assert_eq!(config, base_config());
    }

    #[test]
    fn test_overrides() {
        let args = ConfigArgs {
            region: Some("eu-central-1".to_string()),
            table: Some("Profiles".to_string()),
            email_index: None,
            endpoint_url: Some("http://localhost:8000".to_string()),
            log_level: "debug".to_string(),
        };
        let config = args.apply(base_config()).unwrap();
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.table_name, "Profiles");
        assert_eq!(config.email_index, "EmailIndex");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_blank_override_rejected() {
        let args = ConfigArgs {
            table: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            args.apply(base_config()),
            Err(DynamoError::Config(_))
        ));
    }
}
