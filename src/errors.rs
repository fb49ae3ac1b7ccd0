use aws_sdk_dynamodb::{
    error::{BuildError, DisplayErrorContext, SdkError},
    operation::{
        batch_get_item::BatchGetItemError, batch_write_item::BatchWriteItemError,
        create_table::CreateTableError, delete_item::DeleteItemError, get_item::GetItemError,
        put_item::PutItemError, query::QueryError, update_item::UpdateItemError,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum DynamoError {
    /// The guard condition attached to a write was not met.
    #[error("DynamoDB conditional check failed: {0}.")]
    ConditionFailed(String),
    #[error("Generic DynamoDB error: {0}.")]
    Callout(String),
    #[error("DynamoDB item parsing error: {0}.")]
    ItemParsing(String),
    /// Rejected locally, before anything was sent to DynamoDB.
    #[error("Invalid DynamoDB operation: {0}.")]
    InvalidOperation(String),
    #[error("Invalid configuration: {0}.")]
    Config(String),
    #[error("Seed data error: {0}.")]
    SeedData(String),
    #[error("Invalid DynamoDB request: {0}.")]
    Build(#[from] BuildError),
}

impl DynamoError {
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, DynamoError::ConditionFailed(_))
    }
}

/// Operation errors that may carry a conditional check failure.
pub(crate) trait GuardedOperationError {
    fn is_condition_failed(&self) -> bool {
        false
    }
}

impl GuardedOperationError for PutItemError {
    fn is_condition_failed(&self) -> bool {
        matches!(self, PutItemError::ConditionalCheckFailedException(_))
    }
}

impl GuardedOperationError for UpdateItemError {
    fn is_condition_failed(&self) -> bool {
        matches!(self, UpdateItemError::ConditionalCheckFailedException(_))
    }
}

impl GuardedOperationError for DeleteItemError {
    fn is_condition_failed(&self) -> bool {
        matches!(self, DeleteItemError::ConditionalCheckFailedException(_))
    }
}

impl GuardedOperationError for GetItemError {}
impl GuardedOperationError for QueryError {}
impl GuardedOperationError for BatchGetItemError {}
impl GuardedOperationError for BatchWriteItemError {}
impl GuardedOperationError for CreateTableError {}

/// Classifies an SDK error into the crate's error kinds.
pub(crate) fn callout_error<E, R>(operation: &str, err: SdkError<E, R>) -> DynamoError
where
    E: GuardedOperationError + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service_err) if service_err.is_condition_failed() => {
            DynamoError::ConditionFailed(format!("{operation}: {service_err}"))
        }
        _ => DynamoError::Callout(format!("{operation}: {}", DisplayErrorContext(&err))),
    }
}
