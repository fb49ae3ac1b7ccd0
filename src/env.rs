use crate::{errors::DynamoError, DynamoCtxView};

pub const DYNAMO_REGION: &str = "DYNAMO_REGION";
pub const PROFILE_TABLE_NAME: &str = "PROFILE_TABLE_NAME";
pub const PROFILE_EMAIL_INDEX: &str = "PROFILE_EMAIL_INDEX";
pub const DYNAMODB_ENDPOINT_URL: &str = "DYNAMODB_ENDPOINT_URL";

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_TABLE_NAME: &str = "UserProfiles";
const DEFAULT_EMAIL_INDEX: &str = "EmailIndex";

/// Table and client configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamoEnvConfig {
    pub region: String,
    pub table_name: String,
    pub email_index: String,
    pub endpoint_url: Option<String>,
}

impl DynamoEnvConfig {
    /// Loads the configuration from environment variables, after loading an
    /// optional `.env` file from the working directory.
    pub fn from_env() -> Result<Self, DynamoError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DynamoError> {
        let config = Self {
            region: lookup(DYNAMO_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            table_name: lookup(PROFILE_TABLE_NAME)
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            email_index: lookup(PROFILE_EMAIL_INDEX)
                .unwrap_or_else(|| DEFAULT_EMAIL_INDEX.to_string()),
            endpoint_url: lookup(DYNAMODB_ENDPOINT_URL),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DynamoError> {
        for (name, value) in [
            (DYNAMO_REGION, &self.region),
            (PROFILE_TABLE_NAME, &self.table_name),
            (PROFILE_EMAIL_INDEX, &self.email_index),
        ] {
            if value.trim().is_empty() {
                return Err(DynamoError::Config(format!("{name} must not be blank")));
            }
        }
        if let Some(url) = &self.endpoint_url {
            if url.trim().is_empty() {
                return Err(DynamoError::Config(format!(
                    "{DYNAMODB_ENDPOINT_URL} must not be blank when set"
                )));
            }
        }
        Ok(())
    }
}

impl DynamoCtxView for DynamoEnvConfig {
    fn dynamo_region(&self) -> &str {
        &self.region
    }
    fn dynamo_endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DynamoEnvConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(
            config,
            DynamoEnvConfig {
                region: "us-east-1".to_string(),
                table_name: "UserProfiles".to_string(),
                email_index: "EmailIndex".to_string(),
                endpoint_url: None,
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = DynamoEnvConfig::from_lookup(lookup_from(&[
            (DYNAMO_REGION, "eu-central-1"),
            (PROFILE_TABLE_NAME, "Profiles"),
            (PROFILE_EMAIL_INDEX, "ByEmail"),
            (DYNAMODB_ENDPOINT_URL, "http://localhost:8000"),
        ]))
        .unwrap();
        assert_eq!(config.dynamo_region(), "eu-central-1");
        assert_eq!(config.table_name, "Profiles");
        assert_eq!(config.email_index, "ByEmail");
        assert_eq!(config.dynamo_endpoint_url(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_blank_values_rejected() {
        let result = DynamoEnvConfig::from_lookup(lookup_from(&[(PROFILE_TABLE_NAME, "  ")]));
        assert!(matches!(result, Err(DynamoError::Config(_))));

        let result = DynamoEnvConfig::from_lookup(lookup_from(&[(DYNAMODB_ENDPOINT_URL, "")]));
        assert!(matches!(result, Err(DynamoError::Config(_))));
    }
}
