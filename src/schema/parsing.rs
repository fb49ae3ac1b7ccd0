use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};

use crate::{errors::DynamoError, util::DynamoMap};

// Converting between DynamoMap and serde types.
// --------------------------------------------------

pub fn build_dynamo_map<T: Serialize>(object: &T) -> Result<DynamoMap, DynamoError> {
    // Object -> Serde value.
    let json_value = serde_json::to_value(object).map_err(|e| {
        DynamoError::ItemParsing(format!("failed to serialize object: {e}"))
    })?;

    // Serde value -> DynamoMap.
    match json_value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| serde_value_to_attribute_value(value).map(|v| (key, v)))
            .collect(),
        unsupported => Err(DynamoError::ItemParsing(format!(
            "can't build DynamoMap from non-object value {unsupported:?}"
        ))),
    }
}

pub fn parse_dynamo_map<T: DeserializeOwned>(map: &DynamoMap) -> Result<T, DynamoError> {
    // DynamoMap -> Serde value.
    let serde_map = map
        .iter()
        .map(|(key, value)| {
            attribute_value_to_serde_value(value.clone()).map(|v| (key.clone(), v))
        })
        .collect::<Result<serde_json::Map<String, serde_json::Value>, DynamoError>>()?;

    // Serde value -> T.
    serde_json::from_value(serde_json::Value::Object(serde_map)).map_err(|e| {
        DynamoError::ItemParsing(format!("failed to convert from Serde value: {e}"))
    })
}

// Inner recursive functions.
// --------------------------------------------------

pub(crate) fn serde_value_to_attribute_value(
    value: serde_json::Value,
) -> Result<AttributeValue, DynamoError> {
    match value {
        serde_json::Value::Null => Ok(AttributeValue::Null(true)),
        serde_json::Value::Bool(b) => Ok(AttributeValue::Bool(b)),
        serde_json::Value::String(s) => Ok(AttributeValue::S(s)),
        serde_json::Value::Number(n) => Ok(AttributeValue::N(n.to_string())),
        serde_json::Value::Object(map) => {
            let mut attribute_map: HashMap<String, AttributeValue> = HashMap::new();
            for (key, value) in map.into_iter() {
                attribute_map.insert(key, serde_value_to_attribute_value(value)?);
            }
            Ok(AttributeValue::M(attribute_map))
        }
        serde_json::Value::Array(array) => Ok(AttributeValue::L(
            array
                .into_iter()
                .map(serde_value_to_attribute_value)
                .collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

pub(crate) fn attribute_value_to_serde_value(
    value: AttributeValue,
) -> Result<serde_json::Value, DynamoError> {
    match value {
        AttributeValue::Null(_) => Ok(serde_json::Value::Null),
        AttributeValue::Bool(b) => Ok(serde_json::Value::Bool(b)),
        AttributeValue::S(s) => Ok(serde_json::Value::String(s)),
        AttributeValue::N(n) => Ok(serde_json::Value::Number(parse_number(&n)?)),
        AttributeValue::M(map) => {
            let mut serde_map: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();
            for (key, value) in map.into_iter() {
                serde_map.insert(key, attribute_value_to_serde_value(value)?);
            }
            Ok(serde_json::Value::Object(serde_map))
        }
        AttributeValue::L(array) => Ok(serde_json::Value::Array(
            array
                .into_iter()
                .map(attribute_value_to_serde_value)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        // Sets have no JSON counterpart; they are read as arrays.
        AttributeValue::Ss(set) => Ok(serde_json::Value::Array(
            set.into_iter().map(serde_json::Value::String).collect(),
        )),
        AttributeValue::Ns(set) => Ok(serde_json::Value::Array(
            set.iter()
                .map(|n| parse_number(n).map(serde_json::Value::Number))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        unsupported => Err(DynamoError::ItemParsing(format!(
            "unsupported AttributeValue type {unsupported:?}"
        ))),
    }
}

fn parse_number(n: &str) -> Result<serde_json::Number, DynamoError> {
    n.parse()
        .map_err(|e| DynamoError::ItemParsing(format!("failed to parse number '{n}': {e}")))
}

// Tests.
// --------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Preferences, UserProfile};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
    struct TestItem {
        name: String,
        name_nullable: Option<String>,
        num: u32,
        float: f64,
        flag: bool,
        nested_map: HashMap<String, String>,
        nested_vec: Vec<String>,
    }

    #[test]
    fn test_build_dynamo_map() {
        let input = TestItem {
            name: "Test".to_string(),
            name_nullable: None,
            num: 42,
            float: 3.14,
            flag: true,
            nested_map: collection!("key".to_string() => "value".to_string()),
            nested_vec: vec!["elem1".to_string(), "elem2".to_string()],
        };

        let output = build_dynamo_map(&input).unwrap();

        let expected_output: DynamoMap = collection!(
            "name".to_string() => AttributeValue::S("Test".to_string()),
            "name_nullable".to_string() => AttributeValue::Null(true),
            "num".to_string() => AttributeValue::N("42".to_string()),
            "float".to_string() => AttributeValue::N("3.14".to_string()),
            "flag".to_string() => AttributeValue::Bool(true),
            "nested_map".to_string() => AttributeValue::M(collection!(
                "key".to_string() => AttributeValue::S("value".to_string())
            )),
            "nested_vec".to_string() => AttributeValue::L(vec![
                AttributeValue::S("elem1".to_string()),
                AttributeValue::S("elem2".to_string()),
            ]),
        );
        assert_eq!(output, expected_output);
    }

    #[test]
    fn test_build_dynamo_map_rejects_non_object() {
        let result = build_dynamo_map(&vec![1, 2, 3]);
        assert!(matches!(result, Err(DynamoError::ItemParsing(_))));
    }

    #[test]
    fn test_build_dynamo_map_profile_uses_wire_names() {
        let profile = UserProfile {
            user_id: "user789".to_string(),
            timestamp: "1698768000".to_string(),
            email: Some("user789@example.com".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: Some("Johnson".to_string()),
            preferences: Some(Preferences {
                theme: Some("dark".to_string()),
                notifications: Some(true),
            }),
            login_count: Some(0),
            ..Default::default()
        }
        .with_attribute("plan", json!("pro"));

        let output = build_dynamo_map(&profile).unwrap();

        let expected_output: DynamoMap = collection!(
            "userId".to_string() => AttributeValue::S("user789".to_string()),
            "timestamp".to_string() => AttributeValue::S("1698768000".to_string()),
            "email".to_string() => AttributeValue::S("user789@example.com".to_string()),
            "firstName".to_string() => AttributeValue::S("Alice".to_string()),
            "lastName".to_string() => AttributeValue::S("Johnson".to_string()),
            "preferences".to_string() => AttributeValue::M(collection!(
                "theme".to_string() => AttributeValue::S("dark".to_string()),
                "notifications".to_string() => AttributeValue::Bool(true),
            )),
            "loginCount".to_string() => AttributeValue::N("0".to_string()),
            "plan".to_string() => AttributeValue::S("pro".to_string()),
        );
        assert_eq!(output, expected_output);
    }

    #[test]
    fn test_parse_dynamo_map() {
        let input: DynamoMap = collection!(
            "name".to_string() => AttributeValue::S("Test".to_string()),
            "name_nullable".to_string() => AttributeValue::Null(true),
            "num".to_string() => AttributeValue::N("42".to_string()),
            "float".to_string() => AttributeValue::N("3.14".to_string()),
            "flag".to_string() => AttributeValue::Bool(false),
            "nested_map".to_string() => AttributeValue::M(collection!(
                "key".to_string() => AttributeValue::S("value".to_string())
            )),
            "nested_vec".to_string() => AttributeValue::Ss(vec![
                "elem1".to_string(),
                "elem2".to_string(),
            ]),
        );

        let output: TestItem = parse_dynamo_map(&input).unwrap();

        let expected_output = TestItem {
            name: "Test".to_string(),
            name_nullable: None,
            num: 42,
            float: 3.14,
            flag: false,
            nested_map: collection!("key".to_string() => "value".to_string()),
            nested_vec: vec!["elem1".to_string(), "elem2".to_string()],
        };
        assert_eq!(output, expected_output);
    }

    #[test]
    fn test_parse_dynamo_map_profile_keeps_unknown_attributes() {
        let input: DynamoMap = collection!(
            "userId".to_string() => AttributeValue::S("user123".to_string()),
            "timestamp".to_string() => AttributeValue::S("1698768000".to_string()),
            "loginCount".to_string() => AttributeValue::N("42".to_string()),
            "lastLoginIp".to_string() => AttributeValue::S("10.0.0.1".to_string()),
        );

        let output: UserProfile = parse_dynamo_map(&input).unwrap();

        assert_eq!(output.user_id, "user123");
        assert_eq!(output.timestamp, "1698768000");
        assert_eq!(output.login_count, Some(42));
        assert_eq!(output.email, None);
        assert_eq!(output.preferences, None);
        assert_eq!(output.extra.get("lastLoginIp"), Some(&json!("10.0.0.1")));
    }

    #[test]
    fn test_parse_dynamo_map_bad_number() {
        let input: DynamoMap = collection!(
            "num".to_string() => AttributeValue::N("not-a-number".to_string()),
        );
        let result = parse_dynamo_map::<serde_json::Value>(&input);
        assert!(matches!(result, Err(DynamoError::ItemParsing(_))));
    }

    #[test]
    fn test_parse_dynamo_map_unsupported_type() {
        let input: DynamoMap = collection!(
            "blob".to_string() => AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1u8])),
        );
        let result = parse_dynamo_map::<serde_json::Value>(&input);
        assert!(matches!(result, Err(DynamoError::ItemParsing(_))));
    }
}
