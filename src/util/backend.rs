use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{
    error::SdkError,
    operation::{
        batch_get_item::{BatchGetItemError, BatchGetItemOutput},
        batch_write_item::{BatchWriteItemError, BatchWriteItemOutput},
        create_table::{CreateTableError, CreateTableOutput},
        delete_item::{DeleteItemError, DeleteItemOutput},
        get_item::{GetItemError, GetItemOutput},
        put_item::{PutItemError, PutItemOutput},
        query::{QueryError, QueryOutput},
        update_item::{UpdateItemError, UpdateItemOutput},
    },
    types::{
        AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex,
        KeySchemaElement, KeysAndAttributes, PutRequest, ReturnValue, WriteRequest,
    },
};
use mockall::automock;

use crate::{errors::DynamoError, DynamoCtxView};

use super::{DynamoUtil, KeySchema};

// Underlying backend, which performs the actual AWS operations. Kept generic so
// that it can be swapped with a mock backend for testing.
//
// Should be kept as minimal and close as possible to the real
// aws_sdk_dynamodb::Client, to minimize untestable code.
#[automock]
#[async_trait]
pub trait DynamoBackendImpl: Send + Sync {
    /// Returns every page of the query result.
    async fn query(
        &self,
        table_name: String,
        index: Option<String>,
        condition: String,
        attribute_names: HashMap<String, String>,
        attribute_values: HashMap<String, AttributeValue>,
        scan_index_forward: bool,
    ) -> Result<Vec<QueryOutput>, SdkError<QueryError>>;

    async fn get_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        projection_expression: Option<String>,
        attribute_names: HashMap<String, String>,
    ) -> Result<GetItemOutput, SdkError<GetItemError>>;

    async fn put_item(
        &self,
        table_name: String,
        item: HashMap<String, AttributeValue>,
        condition_expression: Option<String>,
        attribute_names: HashMap<String, String>,
    ) -> Result<PutItemOutput, SdkError<PutItemError>>;

    async fn batch_get_item(
        &self,
        table_name: String,
        keys: Vec<HashMap<String, AttributeValue>>,
    ) -> Result<BatchGetItemOutput, SdkError<BatchGetItemError>>;

    async fn batch_put_item(
        &self,
        table_name: String,
        items: Vec<HashMap<String, AttributeValue>>,
    ) -> Result<BatchWriteItemOutput, SdkError<BatchWriteItemError>>;

    async fn update_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        update_expression: String,
        expression_attribute_values: HashMap<String, AttributeValue>,
        expression_attribute_names: HashMap<String, String>,
        condition_expression: Option<String>,
        return_values: ReturnValue,
    ) -> Result<UpdateItemOutput, SdkError<UpdateItemError>>;

    async fn delete_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        condition_expression: Option<String>,
        attribute_names: HashMap<String, String>,
        return_values: ReturnValue,
    ) -> Result<DeleteItemOutput, SdkError<DeleteItemError>>;

    async fn create_table(
        &self,
        table_name: String,
        key_schema: Vec<KeySchemaElement>,
        attribute_definitions: Vec<AttributeDefinition>,
        global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    ) -> Result<CreateTableOutput, SdkError<CreateTableError>>;
}

// Real implementation,
// making actual calls to AWS.
// --------------------------------------------------

impl DynamoUtil<aws_sdk_dynamodb::Client> {
    pub async fn new(
        ctx: &impl DynamoCtxView,
        table: impl Into<String>,
        key_schema: KeySchema,
    ) -> Result<Self, DynamoError> {
        let region = Region::new(ctx.dynamo_region().to_string());
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(endpoint_url) = ctx.dynamo_endpoint_url() {
            tracing::info!(endpoint = %endpoint_url, "Using custom DynamoDB endpoint");
            loader = loader.endpoint_url(endpoint_url);
        }
        let shared_config = loader.load().await;
        let client = aws_sdk_dynamodb::Client::new(&shared_config);
        Ok(Self {
            backend: client,
            table: table.into(),
            key_schema,
        })
    }
}

// DynamoDB rejects empty expression maps, so they are omitted instead.
fn non_empty<K, V>(map: HashMap<K, V>) -> Option<HashMap<K, V>> {
    (!map.is_empty()).then_some(map)
}

#[async_trait]
impl DynamoBackendImpl for aws_sdk_dynamodb::Client {
    async fn query(
        &self,
        table_name: String,
        index: Option<String>,
        condition: String,
        attribute_names: HashMap<String, String>,
        attribute_values: HashMap<String, AttributeValue>,
        scan_index_forward: bool,
    ) -> Result<Vec<QueryOutput>, SdkError<QueryError>> {
        self.query()
            .set_table_name(Some(table_name))
            .set_index_name(index)
            .set_key_condition_expression(Some(condition))
            .set_expression_attribute_names(non_empty(attribute_names))
            .set_expression_attribute_values(non_empty(attribute_values))
            .scan_index_forward(scan_index_forward)
            .into_paginator()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
    }

    async fn get_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        projection_expression: Option<String>,
        attribute_names: HashMap<String, String>,
    ) -> Result<GetItemOutput, SdkError<GetItemError>> {
        self.get_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .set_projection_expression(projection_expression)
            .set_expression_attribute_names(non_empty(attribute_names))
            .send()
            .await
    }

    async fn put_item(
        &self,
        table_name: String,
        item: HashMap<String, AttributeValue>,
        condition_expression: Option<String>,
        attribute_names: HashMap<String, String>,
    ) -> Result<PutItemOutput, SdkError<PutItemError>> {
        self.put_item()
            .set_table_name(Some(table_name))
            .set_item(Some(item))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(non_empty(attribute_names))
            .send()
            .await
    }

    async fn batch_get_item(
        &self,
        table_name: String,
        keys: Vec<HashMap<String, AttributeValue>>,
    ) -> Result<BatchGetItemOutput, SdkError<BatchGetItemError>> {
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .build()
            .map_err(SdkError::construction_failure)?;
        self.batch_get_item()
            .set_request_items(Some(collection!(table_name => keys_and_attributes)))
            .send()
            .await
    }

    async fn batch_put_item(
        &self,
        table_name: String,
        items: Vec<HashMap<String, AttributeValue>>,
    ) -> Result<BatchWriteItemOutput, SdkError<BatchWriteItemError>> {
        let requests = items
            .into_iter()
            .map(|item| {
                PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(SdkError::construction_failure)?;
        self.batch_write_item()
            .set_request_items(Some(collection!(table_name => requests)))
            .send()
            .await
    }

    async fn update_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        update_expression: String,
        expression_attribute_values: HashMap<String, AttributeValue>,
        expression_attribute_names: HashMap<String, String>,
        condition_expression: Option<String>,
        return_values: ReturnValue,
    ) -> Result<UpdateItemOutput, SdkError<UpdateItemError>> {
        self.update_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .set_update_expression(Some(update_expression))
            .set_expression_attribute_values(non_empty(expression_attribute_values))
            .set_expression_attribute_names(non_empty(expression_attribute_names))
            .set_condition_expression(condition_expression)
            .return_values(return_values)
            .send()
            .await
    }

    async fn delete_item(
        &self,
        table_name: String,
        key: HashMap<String, AttributeValue>,
        condition_expression: Option<String>,
        attribute_names: HashMap<String, String>,
        return_values: ReturnValue,
    ) -> Result<DeleteItemOutput, SdkError<DeleteItemError>> {
        self.delete_item()
            .set_table_name(Some(table_name))
            .set_key(Some(key))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(non_empty(attribute_names))
            .return_values(return_values)
            .send()
            .await
    }

    async fn create_table(
        &self,
        table_name: String,
        key_schema: Vec<KeySchemaElement>,
        attribute_definitions: Vec<AttributeDefinition>,
        global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    ) -> Result<CreateTableOutput, SdkError<CreateTableError>> {
        self.create_table()
            .set_table_name(Some(table_name))
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .set_global_secondary_indexes(
                (!global_secondary_indexes.is_empty()).then_some(global_secondary_indexes),
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_ctx::TestCtx;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(HashMap::<String, String>::new()), None);
        let map: HashMap<String, String> = collection!("#a".to_string() => "a".to_string());
        assert_eq!(non_empty(map.clone()), Some(map));
    }

    #[tokio::test]
    async fn test_new_uses_ctx_region_and_table() {
        let ctx = TestCtx {
            region: "eu-west-2".to_string(),
            endpoint_url: Some("http://localhost:8000".to_string()),
        };
        let util = DynamoUtil::new(&ctx, "UserProfiles", KeySchema::new("userId", "timestamp"))
            .await
            .unwrap();
        assert_eq!(util.table, "UserProfiles");
        assert_eq!(util.key_schema, KeySchema::new("userId", "timestamp"));
        assert_eq!(
            util.backend.config().region().map(|r| r.as_ref()),
            Some("eu-west-2")
        );
    }
}
