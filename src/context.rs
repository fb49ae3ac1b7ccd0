/// The slice of configuration needed to build a DynamoDB client.
pub trait DynamoCtxView: Send + Sync {
    fn dynamo_region(&self) -> &str;

    /// Overrides the service endpoint (DynamoDB Local, LocalStack).
    fn dynamo_endpoint_url(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_ctx {
    use super::DynamoCtxView;

    pub(crate) struct TestCtx {
        pub(crate) region: String,
        pub(crate) endpoint_url: Option<String>,
    }

    impl DynamoCtxView for TestCtx {
        fn dynamo_region(&self) -> &str {
            &self.region
        }
        fn dynamo_endpoint_url(&self) -> Option<&str> {
            self.endpoint_url.as_deref()
        }
    }

    #[test]
    fn test_default_endpoint_is_none() {
        struct RegionOnly;
        impl DynamoCtxView for RegionOnly {
            fn dynamo_region(&self) -> &str {
                "eu-west-1"
            }
        }
        assert_eq!(RegionOnly.dynamo_region(), "eu-west-1");
        assert_eq!(RegionOnly.dynamo_endpoint_url(), None);
    }
}
