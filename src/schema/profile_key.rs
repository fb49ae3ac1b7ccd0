use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::{errors::DynamoError, util::DynamoMap};

use super::{ProfileKey, PARTITION_KEY, SORT_KEY};

impl ProfileKey {
    pub fn new(user_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn to_dynamo_map(&self) -> DynamoMap {
        collection! {
            PARTITION_KEY.to_string() => AttributeValue::S(self.user_id.clone()),
            SORT_KEY.to_string() => AttributeValue::S(self.timestamp.clone()),
        }
    }

    /// Extracts the key attributes from a full or partial item.
    pub fn from_dynamo_map(map: &DynamoMap) -> Result<Self, DynamoError> {
        let get = |name: &str| {
            map.get(name)
                .ok_or_else(|| DynamoError::ItemParsing(format!("item missing key '{name}'")))?
                .as_s()
                .map(|s| s.to_string())
                .map_err(|_| DynamoError::ItemParsing(format!("key '{name}' was not a string")))
        };
        Ok(Self {
            user_id: get(PARTITION_KEY)?,
            timestamp: get(SORT_KEY)?,
        })
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}|{}", self.user_id, self.timestamp)
    }
}
