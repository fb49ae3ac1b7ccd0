use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{errors::DynamoError, util::DynamoMap};

pub mod parsing;
pub mod profile_key;
pub mod timestamp;

/// Partition key attribute of the profile table.
pub const PARTITION_KEY: &str = "userId";
/// Sort key attribute of the profile table. Reserved word in DynamoDB
/// expressions, so it is always referenced through a placeholder.
pub const SORT_KEY: &str = "timestamp";
/// Attribute backing the email secondary index.
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const LOGIN_COUNT_ATTRIBUTE: &str = "loginCount";
pub const PREFERENCES_ATTRIBUTE: &str = "preferences";

// Identifies a single profile record: userId (partition) + timestamp (sort,
// epoch seconds as a string).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Hash, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileKey {
    pub user_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
}

/// A single nested field of `preferences` to replace.
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceUpdate {
    Theme(String),
    Notifications(bool),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_count: Option<i64>,

    /// Any other attributes stored on the item. Kept on read, written back on
    /// create. Entries named like a key attribute are never written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// New profile stamped with the current time as its sort key.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: timestamp::now(),
            email: Some(email.into()),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_login_count(mut self, login_count: i64) -> Self {
        self.login_count = Some(login_count);
        self
    }

    /// Adds a free-form attribute. The key attributes can't be set this way.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if name == PARTITION_KEY || name == SORT_KEY {
            tracing::warn!(attribute = %name, "Ignoring extra attribute named like a key");
            return self;
        }
        self.extra.insert(name, value);
        self
    }

    /// Item to store. `user_id` and `timestamp` always win over same-named
    /// entries in `extra`, so the stored key matches `key()`.
    pub fn to_dynamo_map(&self) -> Result<DynamoMap, DynamoError> {
        let mut item = parsing::build_dynamo_map(self)?;
        item.extend(self.key().to_dynamo_map());
        Ok(item)
    }

    pub fn key(&self) -> ProfileKey {
        ProfileKey {
            user_id: self.user_id.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}
