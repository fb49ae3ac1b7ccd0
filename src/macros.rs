/// Builds any collection implementing `From<[T; N]>`, most commonly the
/// `HashMap<String, AttributeValue>` maps DynamoDB requests are made of.
///
/// ```rust,ignore
/// let key: DynamoMap = collection! {
///     "userId".to_string() => AttributeValue::S("user123".to_string()),
/// };
/// let empty: DynamoMap = collection!();
/// ```
#[macro_export]
macro_rules! collection {
    ($($k:expr => $v:expr),* $(,)?) => {{
        ::core::convert::From::from([$(($k, $v),)*])
    }};
    ($($v:expr),+ $(,)?) => {{
        ::core::convert::From::from([$($v,)+])
    }};
}
