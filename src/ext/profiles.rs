//! Typed access to the user profile table.

use std::{collections::HashSet, path::Path};

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};

use crate::{
    env::DynamoEnvConfig,
    errors::DynamoError,
    schema::{
        parsing::parse_dynamo_map,
        PreferenceUpdate, ProfileKey, UserProfile, EMAIL_ATTRIBUTE, LOGIN_COUNT_ATTRIBUTE,
        PARTITION_KEY, PREFERENCES_ATTRIBUTE, SORT_KEY,
    },
    util::{
        backend::DynamoBackendImpl, update_helpers::UpdateExpression, DynamoMap, DynamoUtil,
        IndexConfig, KeySchema, SortKeyCondition, WriteCondition,
    },
};

/// Profile operations over a single table. Each method maps to exactly one
/// DynamoDB call (except seed loading, which batches).
pub struct ProfileService<B: DynamoBackendImpl> {
    dynamo_util: DynamoUtil<B>,
    email_index: IndexConfig,
}

impl ProfileService<aws_sdk_dynamodb::Client> {
    pub async fn connect(config: &DynamoEnvConfig) -> Result<Self, DynamoError> {
        config.validate()?;
        let dynamo_util =
            DynamoUtil::new(config, config.table_name.clone(), Self::key_schema()).await?;
        Ok(Self::new(dynamo_util, config.email_index.clone()))
    }
}

impl<B: DynamoBackendImpl> ProfileService<B> {
    pub fn new(dynamo_util: DynamoUtil<B>, email_index: impl Into<String>) -> Self {
        Self {
            dynamo_util,
            email_index: IndexConfig {
                name: email_index.into(),
                partition_field: EMAIL_ATTRIBUTE.to_string(),
                sort_field: None,
            },
        }
    }

    pub fn key_schema() -> KeySchema {
        KeySchema::new(PARTITION_KEY, SORT_KEY)
    }

    pub fn table(&self) -> &str {
        &self.dynamo_util.table
    }

    /// Inserts a new profile. Fails with `DynamoError::ConditionFailed` if a
    /// profile with the same key already exists.
    pub async fn create(&self, profile: &UserProfile) -> Result<(), DynamoError> {
        let item = profile.to_dynamo_map()?;
        self.dynamo_util
            .put_item(item, Some(WriteCondition::ItemDoesNotExist))
            .await?;
        tracing::info!(key = %profile.key(), "Created profile");
        Ok(())
    }

    /// Point lookup. When `attributes` is given, only those attributes (plus
    /// the key) are fetched.
    pub async fn fetch(
        &self,
        key: &ProfileKey,
        attributes: Option<&[&str]>,
    ) -> Result<Option<UserProfile>, DynamoError> {
        let item = self
            .dynamo_util
            .get_item(key.to_dynamo_map(), attributes)
            .await?;
        match item {
            Some(item) => {
                tracing::info!(%key, "Retrieved profile");
                Ok(Some(parse_dynamo_map(&item)?))
            }
            None => {
                tracing::info!(%key, "No profile found");
                Ok(None)
            }
        }
    }

    /// All records of one user within `range`, ordered by timestamp
    /// ascending.
    pub async fn query_by_partition(
        &self,
        user_id: &str,
        range: SortKeyCondition,
    ) -> Result<Vec<UserProfile>, DynamoError> {
        let items = self
            .dynamo_util
            .query_generic(None, AttributeValue::S(user_id.to_string()), range)
            .await?;
        tracing::info!(user_id, count = items.len(), "Queried activity records");
        parse_all(&items)
    }

    /// Atomically adds `delta` to the login counter of an existing profile and
    /// returns the new value.
    pub async fn increment_login_count(
        &self,
        key: &ProfileKey,
        delta: i64,
    ) -> Result<i64, DynamoError> {
        let attributes = self
            .dynamo_util
            .update_item(
                key.to_dynamo_map(),
                UpdateExpression::new().add(
                    &[LOGIN_COUNT_ATTRIBUTE],
                    AttributeValue::N(delta.to_string()),
                ),
                Some(WriteCondition::ItemExists),
                ReturnValue::UpdatedNew,
            )
            .await?;
        let new_count = attributes
            .get(LOGIN_COUNT_ATTRIBUTE)
            .ok_or_else(|| {
                DynamoError::ItemParsing(format!("update response missing {LOGIN_COUNT_ATTRIBUTE}"))
            })?
            .as_n()
            .map_err(|_| {
                DynamoError::ItemParsing(format!("{LOGIN_COUNT_ATTRIBUTE} was not a number"))
            })?
            .parse::<i64>()
            .map_err(|e| DynamoError::ItemParsing(format!("invalid {LOGIN_COUNT_ATTRIBUTE}: {e}")))?;
        tracing::info!(%key, new_count, "Updated login count");
        Ok(new_count)
    }

    /// Replaces individual fields inside `preferences`, leaving the others
    /// untouched. Returns the full updated profile.
    pub async fn update_preferences(
        &self,
        key: &ProfileKey,
        updates: &[PreferenceUpdate],
    ) -> Result<UserProfile, DynamoError> {
        if updates.is_empty() {
            return Err(DynamoError::InvalidOperation(
                "no preference updates specified".to_string(),
            ));
        }
        let update = updates
            .iter()
            .fold(UpdateExpression::new(), |update, field| match field {
                PreferenceUpdate::Theme(theme) => update.set(
                    &[PREFERENCES_ATTRIBUTE, "theme"],
                    AttributeValue::S(theme.clone()),
                ),
                PreferenceUpdate::Notifications(enabled) => update.set(
                    &[PREFERENCES_ATTRIBUTE, "notifications"],
                    AttributeValue::Bool(*enabled),
                ),
            });
        let attributes = self
            .dynamo_util
            .update_item(
                key.to_dynamo_map(),
                update,
                Some(WriteCondition::ItemExists),
                ReturnValue::AllNew,
            )
            .await?;
        tracing::info!(%key, "Updated preferences");
        parse_dynamo_map(&attributes)
    }

    /// Looks profiles up through the email secondary index.
    pub async fn query_by_email(&self, email: &str) -> Result<Vec<UserProfile>, DynamoError> {
        let items = self
            .dynamo_util
            .query_generic(
                Some(&self.email_index),
                AttributeValue::S(email.to_string()),
                SortKeyCondition::Any,
            )
            .await?;
        tracing::info!(email, count = items.len(), "Queried profiles by email");
        parse_all(&items)
    }

    /// Deletes an existing profile and returns it. Fails with
    /// `DynamoError::ConditionFailed` if it does not exist.
    pub async fn delete(&self, key: &ProfileKey) -> Result<UserProfile, DynamoError> {
        let old = self
            .dynamo_util
            .delete_item(
                key.to_dynamo_map(),
                Some(WriteCondition::ItemExists),
                ReturnValue::AllOld,
            )
            .await?
            .ok_or_else(|| {
                DynamoError::ItemParsing(format!("delete of {key} returned no attributes"))
            })?;
        tracing::info!(%key, "Deleted profile");
        parse_dynamo_map(&old)
    }

    /// Fetches several profiles in one round trip. Keys that don't exist are
    /// left out of the result. Duplicate keys are fetched once.
    pub async fn batch_fetch(&self, keys: &[ProfileKey]) -> Result<Vec<UserProfile>, DynamoError> {
        let mut seen = HashSet::new();
        let key_maps = keys
            .iter()
            .filter(|key| seen.insert(*key))
            .map(ProfileKey::to_dynamo_map)
            .collect::<Vec<_>>();
        let items = self.dynamo_util.batch_get_items(key_maps).await?;
        tracing::info!(requested = keys.len(), count = items.len(), "Batch retrieved profiles");
        parse_all(&items)
    }

    /// Loads a JSON array of profiles from `path` and writes them with batch
    /// writes, overwriting existing items. Returns the number of profiles
    /// written.
    pub async fn load_seed_data(&self, path: impl AsRef<Path>) -> Result<usize, DynamoError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DynamoError::SeedData(format!("{}: {e}", path.display())))?;
        let profiles: Vec<UserProfile> = serde_json::from_str(&contents)
            .map_err(|e| DynamoError::SeedData(format!("{}: {e}", path.display())))?;
        let items = profiles
            .iter()
            .map(UserProfile::to_dynamo_map)
            .collect::<Result<Vec<_>, _>>()?;
        let written = self.dynamo_util.batch_put_items(items).await?;
        tracing::info!(path = %path.display(), written, "Loaded seed data");
        Ok(written)
    }

    /// Creates the profile table and its email index. Returns false if the
    /// table already exists.
    pub async fn create_table(&self) -> Result<bool, DynamoError> {
        let created = self
            .dynamo_util
            .create_table(std::slice::from_ref(&self.email_index))
            .await?;
        tracing::info!(table = %self.table(), created, "Profile table setup finished");
        Ok(created)
    }
}

fn parse_all(items: &[DynamoMap]) -> Result<Vec<UserProfile>, DynamoError> {
    items.iter().map(parse_dynamo_map).collect()
}

// Tests.
// --------------------------------------------------
