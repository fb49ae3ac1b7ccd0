use std::collections::HashMap;

use aws_sdk_dynamodb::{
    operation::create_table::CreateTableError,
    types::{
        AttributeDefinition, AttributeValue, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        Projection, ProjectionType, ReturnValue, ScalarAttributeType,
    },
};
use backend::DynamoBackendImpl;
use update_helpers::{projection_expression, UpdateExpression};

use crate::errors::{callout_error, DynamoError};

pub mod backend;
pub mod update_helpers;

pub type DynamoMap = HashMap<String, AttributeValue>;

/// Max keys DynamoDB accepts in a single BatchGetItem request.
pub const BATCH_GET_LIMIT: usize = 100;
/// Max items DynamoDB accepts in a single BatchWriteItem request.
pub const BATCH_WRITE_LIMIT: usize = 25;

const PK_PLACEHOLDER: &str = "#pk";
const SK_PLACEHOLDER: &str = "#sk";

/// Primary key attributes of a table or index.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySchema {
    pub partition_field: String,
    pub sort_field: String,
}

impl KeySchema {
    pub fn new(partition_field: impl Into<String>, sort_field: impl Into<String>) -> Self {
        Self {
            partition_field: partition_field.into(),
            sort_field: sort_field.into(),
        }
    }
}

/// A global secondary index. Indexes without a sort key only support
/// `SortKeyCondition::Any`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub name: String,
    pub partition_field: String,
    pub sort_field: Option<String>,
}

/// Condition on the sort key, applied together with the partition key
/// equality in queries.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SortKeyCondition {
    #[default]
    Any,
    GreaterThanOrEquals(String),
    LessThanOrEquals(String),
    /// Inclusive on both ends.
    Between(String, String),
}

/// Guard attached to a write, evaluated by DynamoDB against the stored item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteCondition {
    ItemExists,
    ItemDoesNotExist,
}

#[derive(Clone)]
pub struct DynamoUtil<B: DynamoBackendImpl> {
    pub backend: B,
    pub table: String,
    pub key_schema: KeySchema,
}

impl<B: DynamoBackendImpl> DynamoUtil<B> {
    fn condition_expression(
        &self,
        condition: Option<WriteCondition>,
    ) -> (Option<String>, HashMap<String, String>) {
        let mut names = HashMap::new();
        let expression = condition.map(|condition| {
            names.insert(
                PK_PLACEHOLDER.to_string(),
                self.key_schema.partition_field.clone(),
            );
            match condition {
                WriteCondition::ItemExists => format!("attribute_exists({PK_PLACEHOLDER})"),
                WriteCondition::ItemDoesNotExist => {
                    names.insert(
                        SK_PLACEHOLDER.to_string(),
                        self.key_schema.sort_field.clone(),
                    );
                    format!(
                        "attribute_not_exists({PK_PLACEHOLDER}) AND \
                         attribute_not_exists({SK_PLACEHOLDER})"
                    )
                }
            }
        });
        (expression, names)
    }

    pub async fn query_generic(
        &self,
        index: Option<&IndexConfig>,
        partition_value: AttributeValue,
        sort_condition: SortKeyCondition,
    ) -> Result<Vec<DynamoMap>, DynamoError> {
        let (index_name, partition_field, sort_field) = match index {
            Some(index) => (
                Some(index.name.clone()),
                index.partition_field.clone(),
                index.sort_field.clone(),
            ),
            None => (
                None,
                self.key_schema.partition_field.clone(),
                Some(self.key_schema.sort_field.clone()),
            ),
        };
        let mut attribute_names: HashMap<String, String> = HashMap::new();
        let mut attribute_values: DynamoMap = HashMap::new();
        attribute_names.insert(PK_PLACEHOLDER.to_string(), partition_field);
        attribute_values.insert(":pk_val".to_string(), partition_value);

        let sort_clause = match sort_condition {
            SortKeyCondition::Any => None,
            SortKeyCondition::GreaterThanOrEquals(start) => {
                attribute_values.insert(":sk_val".to_string(), AttributeValue::S(start));
                Some(format!("{SK_PLACEHOLDER} >= :sk_val"))
            }
            SortKeyCondition::LessThanOrEquals(end) => {
                attribute_values.insert(":sk_val".to_string(), AttributeValue::S(end));
                Some(format!("{SK_PLACEHOLDER} <= :sk_val"))
            }
            SortKeyCondition::Between(start, end) => {
                attribute_values.insert(":sk_min".to_string(), AttributeValue::S(start));
                attribute_values.insert(":sk_max".to_string(), AttributeValue::S(end));
                Some(format!("{SK_PLACEHOLDER} BETWEEN :sk_min AND :sk_max"))
            }
        };
        let condition = match sort_clause {
            Some(sort_clause) => {
                let sort_field = sort_field.ok_or_else(|| {
                    DynamoError::InvalidOperation(format!(
                        "index '{}' has no sort key, so it can't be queried with a sort key \
                         condition",
                        index_name.as_deref().unwrap_or_default()
                    ))
                })?;
                attribute_names.insert(SK_PLACEHOLDER.to_string(), sort_field);
                format!("{PK_PLACEHOLDER} = :pk_val AND {sort_clause}")
            }
            None => format!("{PK_PLACEHOLDER} = :pk_val"),
        };

        tracing::debug!(
            table = %self.table,
            index = ?index_name,
            condition = %condition,
            "Sending Query"
        );
        let pages = self
            .backend
            .query(
                self.table.clone(),
                index_name,
                condition,
                attribute_names,
                attribute_values,
                true,
            )
            .await
            .map_err(|e| callout_error("Query", e))?;
        Ok(pages
            .into_iter()
            .flat_map(|page| page.items.unwrap_or_default())
            .collect())
    }

    /// Point lookup. `projection` restricts the returned attributes to the
    /// given document paths (e.g. `preferences.theme`); the key attributes are
    /// always included.
    pub async fn get_item(
        &self,
        key: DynamoMap,
        projection: Option<&[&str]>,
    ) -> Result<Option<DynamoMap>, DynamoError> {
        let (projection_expression, attribute_names) = match projection {
            Some(attributes) => {
                let key_fields = [
                    self.key_schema.partition_field.as_str(),
                    self.key_schema.sort_field.as_str(),
                ];
                let (expression, names) = projection_expression(
                    key_fields.into_iter().chain(attributes.iter().copied()),
                );
                (Some(expression), names)
            }
            None => (None, HashMap::new()),
        };
        tracing::debug!(table = %self.table, projection = ?projection_expression, "Sending GetItem");
        let response = self
            .backend
            .get_item(self.table.clone(), key, projection_expression, attribute_names)
            .await
            .map_err(|e| callout_error("GetItem", e))?;
        Ok(response.item)
    }

    pub async fn put_item(
        &self,
        item: DynamoMap,
        condition: Option<WriteCondition>,
    ) -> Result<(), DynamoError> {
        let (condition_expression, attribute_names) = self.condition_expression(condition);
        tracing::debug!(table = %self.table, condition = ?condition, "Sending PutItem");
        self.backend
            .put_item(
                self.table.clone(),
                item,
                condition_expression,
                attribute_names,
            )
            .await
            .map_err(|e| callout_error("PutItem", e))?;
        Ok(())
    }

    /// Applies a partial update. Returns the attributes selected by
    /// `return_values` (empty for `ReturnValue::None`).
    pub async fn update_item(
        &self,
        key: DynamoMap,
        update: UpdateExpression,
        condition: Option<WriteCondition>,
        return_values: ReturnValue,
    ) -> Result<DynamoMap, DynamoError> {
        if update.is_empty() {
            return Err(DynamoError::InvalidOperation(
                "update expression has no actions".to_string(),
            ));
        }
        let (condition_expression, condition_names) = self.condition_expression(condition);
        let (update_expression, mut attribute_names, attribute_values) = update.into_parts();
        attribute_names.extend(condition_names);
        tracing::debug!(
            table = %self.table,
            update = %update_expression,
            condition = ?condition,
            "Sending UpdateItem"
        );
        let response = self
            .backend
            .update_item(
                self.table.clone(),
                key,
                update_expression,
                attribute_values,
                attribute_names,
                condition_expression,
                return_values,
            )
            .await
            .map_err(|e| callout_error("UpdateItem", e))?;
        Ok(response.attributes.unwrap_or_default())
    }

    /// Returns the removed item when `return_values` is `ReturnValue::AllOld`
    /// and the item existed.
    pub async fn delete_item(
        &self,
        key: DynamoMap,
        condition: Option<WriteCondition>,
        return_values: ReturnValue,
    ) -> Result<Option<DynamoMap>, DynamoError> {
        let (condition_expression, attribute_names) = self.condition_expression(condition);
        tracing::debug!(table = %self.table, condition = ?condition, "Sending DeleteItem");
        let response = self
            .backend
            .delete_item(
                self.table.clone(),
                key,
                condition_expression,
                attribute_names,
                return_values,
            )
            .await
            .map_err(|e| callout_error("DeleteItem", e))?;
        Ok(response.attributes)
    }

    /// Single BatchGetItem round trip. Missing keys are absent from the
    /// result; unprocessed keys are reported and dropped.
    pub async fn batch_get_items(&self, keys: Vec<DynamoMap>) -> Result<Vec<DynamoMap>, DynamoError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        if keys.len() > BATCH_GET_LIMIT {
            return Err(DynamoError::InvalidOperation(format!(
                "batch get of {} keys exceeds the limit of {BATCH_GET_LIMIT}",
                keys.len()
            )));
        }
        tracing::debug!(table = %self.table, keys = keys.len(), "Sending BatchGetItem");
        let response = self
            .backend
            .batch_get_item(self.table.clone(), keys)
            .await
            .map_err(|e| callout_error("BatchGetItem", e))?;
        let unprocessed = response
            .unprocessed_keys
            .as_ref()
            .and_then(|unprocessed| unprocessed.get(&self.table))
            .map(|keys_and_attributes| keys_and_attributes.keys().len())
            .unwrap_or_default();
        if unprocessed > 0 {
            tracing::warn!(table = %self.table, unprocessed, "BatchGetItem left keys unprocessed");
        }
        Ok(response
            .responses
            .and_then(|mut responses| responses.remove(&self.table))
            .unwrap_or_default())
    }

    /// Writes items in BatchWriteItem chunks. Returns the number of items
    /// submitted; unprocessed items are reported and dropped.
    pub async fn batch_put_items(&self, items: Vec<DynamoMap>) -> Result<usize, DynamoError> {
        let total = items.len();
        // Split into 25-item chunks (max supported by DynamoDB).
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            tracing::debug!(table = %self.table, items = chunk.len(), "Sending BatchWriteItem");
            let response = self
                .backend
                .batch_put_item(self.table.clone(), chunk.to_vec())
                .await
                .map_err(|e| callout_error("BatchWriteItem", e))?;
            let unprocessed = response
                .unprocessed_items
                .as_ref()
                .and_then(|unprocessed| unprocessed.get(&self.table))
                .map(Vec::len)
                .unwrap_or_default();
            if unprocessed > 0 {
                tracing::warn!(
                    table = %self.table,
                    unprocessed,
                    "BatchWriteItem left items unprocessed"
                );
            }
        }
        Ok(total)
    }

    /// Creates the table with string-typed keys, plus the given global
    /// secondary indexes (projecting all attributes). Returns false if the
    /// table already exists.
    pub async fn create_table(&self, indexes: &[IndexConfig]) -> Result<bool, DynamoError> {
        let mut attribute_names: Vec<&str> = vec![
            self.key_schema.partition_field.as_str(),
            self.key_schema.sort_field.as_str(),
        ];
        let mut global_secondary_indexes = Vec::new();
        for index in indexes {
            let mut key_schema = vec![key_element(&index.partition_field, KeyType::Hash)?];
            attribute_names.push(index.partition_field.as_str());
            if let Some(sort_field) = &index.sort_field {
                key_schema.push(key_element(sort_field, KeyType::Range)?);
                attribute_names.push(sort_field.as_str());
            }
            global_secondary_indexes.push(
                GlobalSecondaryIndex::builder()
                    .index_name(&index.name)
                    .set_key_schema(Some(key_schema))
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()?,
            );
        }
        // Each attribute may only be defined once, even if several indexes use it.
        let mut attribute_definitions = Vec::new();
        for (i, name) in attribute_names.iter().enumerate() {
            if attribute_names[..i].contains(name) {
                continue;
            }
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(*name)
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            );
        }
        let key_schema = vec![
            key_element(&self.key_schema.partition_field, KeyType::Hash)?,
            key_element(&self.key_schema.sort_field, KeyType::Range)?,
        ];

        tracing::debug!(table = %self.table, indexes = indexes.len(), "Sending CreateTable");
        match self
            .backend
            .create_table(
                self.table.clone(),
                key_schema,
                attribute_definitions,
                global_secondary_indexes,
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(CreateTableError::ResourceInUseException(_))
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(callout_error("CreateTable", e)),
        }
    }
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, DynamoError> {
    Ok(KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()?)
}
