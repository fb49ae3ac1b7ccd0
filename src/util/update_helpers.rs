use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Write as _},
};

use aws_sdk_dynamodb::types::AttributeValue;

/// Trait to sanitize a string for use as Dynamo expression attribute name
/// (placeholder).
pub trait Sanitize {
    fn sanitized(&self) -> Sanitized<'_>;
}

impl Sanitize for str {
    fn sanitized(&self) -> Sanitized<'_> {
        Sanitized {
            inner: self.chars(),
        }
    }
}

impl Sanitize for String {
    fn sanitized(&self) -> Sanitized<'_> {
        Sanitized {
            inner: self.chars(),
        }
    }
}

pub struct Sanitized<'a> {
    inner: std::str::Chars<'a>,
}

impl<'a> fmt::Display for Sanitized<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.inner.clone(); // Clone iterator to avoid borrowing issues
        while let Some(c) = chars.next() {
            if c.is_ascii_alphanumeric() {
                f.write_char(c)?;
            } else {
                f.write_char('_')?;
            }
        }
        Ok(())
    }
}

/// Name placeholder for a single attribute, e.g. `#upd_loginCount`.
pub(crate) fn name_placeholder(prefix: &str, attribute: &str) -> String {
    format!("#{}_{}", prefix, attribute.sanitized())
}

/// Projection expression over document paths (`a`, `a.b`, `list[0].c`).
///
/// Each distinct path segment gets its own indexed placeholder (`#proj0`,
/// `#proj1`, ...), so nested paths resolve as paths and segments that only
/// differ in punctuation never collide. Repeated paths are listed once.
pub(crate) fn projection_expression<'a>(
    paths: impl IntoIterator<Item = &'a str>,
) -> (String, HashMap<String, String>) {
    let mut names = HashMap::new();
    let mut placeholders: HashMap<&str, String> = HashMap::new();
    let mut seen = HashSet::new();
    let mut expressions = Vec::new();
    for path in paths {
        if !seen.insert(path) {
            continue;
        }
        let mut expression = String::new();
        for (i, segment) in path.split('.').enumerate() {
            // List indexes stay outside the placeholder.
            let (name, index) = segment.split_at(segment.find('[').unwrap_or(segment.len()));
            let next = placeholders.len();
            let placeholder = placeholders.entry(name).or_insert_with(|| {
                let placeholder = format!("#proj{next}");
                names.insert(placeholder.clone(), name.to_string());
                placeholder
            });
            if i > 0 {
                expression.push('.');
            }
            expression.push_str(placeholder);
            expression.push_str(index);
        }
        expressions.push(expression);
    }
    (expressions.join(", "), names)
}

/// Update expression builder. Every path segment and value is referenced
/// through placeholders, so reserved words (e.g. `timestamp`) are safe to use.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateExpression {
    set: Vec<String>,
    add: Vec<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SET a.b = :v`, replacing the (possibly nested) attribute at `path`.
    pub fn set(mut self, path: &[&str], value: AttributeValue) -> Self {
        let clause = self.clause(path, value, " = ");
        self.set.push(clause);
        self
    }

    /// `ADD a :v`, atomically adding to a numeric attribute (created as 0 if
    /// absent).
    pub fn add(mut self, path: &[&str], value: AttributeValue) -> Self {
        let clause = self.clause(path, value, " ");
        self.add.push(clause);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add.is_empty()
    }

    pub fn expression(&self) -> String {
        let mut sections = Vec::new();
        if !self.set.is_empty() {
            sections.push(format!("SET {}", self.set.join(", ")));
        }
        if !self.add.is_empty() {
            sections.push(format!("ADD {}", self.add.join(", ")));
        }
        sections.join(" ")
    }

    pub fn into_parts(
        self,
    ) -> (
        String,
        HashMap<String, String>,
        HashMap<String, AttributeValue>,
    ) {
        (self.expression(), self.names, self.values)
    }

    fn clause(&mut self, path: &[&str], value: AttributeValue, operator: &str) -> String {
        let mut path_expr = String::new();
        for (i, segment) in path.iter().enumerate() {
            let placeholder = name_placeholder("upd", segment);
            if i > 0 {
                path_expr.push('.');
            }
            path_expr.push_str(&placeholder);
            self.names.insert(placeholder, segment.to_string());
        }
        let value_placeholder = format!(
            ":upd_{}",
            path.iter()
                .map(|segment| segment.sanitized().to_string())
                .collect::<Vec<_>>()
                .join("_")
        );
        self.values.insert(value_placeholder.clone(), value);
        format!("{path_expr}{operator}{value_placeholder}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized() {
        assert_eq!("loginCount".sanitized().to_string(), "loginCount");
        assert_eq!("first-name.v2".sanitized().to_string(), "first_name_v2");
    }

    #[test]
    fn test_sanitized_non_ascii() {
        assert_eq!("prénom".sanitized().to_string(), "pr_nom");
    }

    #[test]
    fn test_projection_expression_similar_names_do_not_collide() {
        let (expression, names) = projection_expression(["first-name", "first_name"]);
        assert_eq!(expression, "#proj0, #proj1");
        assert_eq!(
            names,
            collection!(
                "#proj0".to_string() => "first-name".to_string(),
                "#proj1".to_string() => "first_name".to_string(),
            )
        );
    }

    #[test]
    fn test_projection_expression_nested_paths() {
        let (expression, names) = projection_expression([
            "userId",
            "preferences.theme",
            "preferences.notifications",
            "tags[1]",
            "userId",
        ]);
        assert_eq!(expression, "#proj0, #proj1.#proj2, #proj1.#proj3, #proj4[1]");
        assert_eq!(
            names,
            collection!(
                "#proj0".to_string() => "userId".to_string(),
                "#proj1".to_string() => "preferences".to_string(),
                "#proj2".to_string() => "theme".to_string(),
                "#proj3".to_string() => "notifications".to_string(),
                "#proj4".to_string() => "tags".to_string(),
            )
        );
    }

    #[test]
    fn test_add_expression() {
        let (expression, names, values) = UpdateExpression::new()
            .add(&["loginCount"], AttributeValue::N("3".to_string()))
            .into_parts();
        assert_eq!(expression, "ADD #upd_loginCount :upd_loginCount");
        assert_eq!(
            names,
            collection!("#upd_loginCount".to_string() => "loginCount".to_string())
        );
        assert_eq!(
            values,
            collection!(":upd_loginCount".to_string() => AttributeValue::N("3".to_string()))
        );
    }

    #[test]
    fn test_nested_set_expression() {
        let (expression, names, values) = UpdateExpression::new()
            .set(
                &["preferences", "theme"],
                AttributeValue::S("blue".to_string()),
            )
            .set(
                &["preferences", "notifications"],
                AttributeValue::Bool(false),
            )
            .into_parts();
        assert_eq!(
            expression,
            "SET #upd_preferences.#upd_theme = :upd_preferences_theme, \
             #upd_preferences.#upd_notifications = :upd_preferences_notifications"
        );
        assert_eq!(
            names,
            collection!(
                "#upd_preferences".to_string() => "preferences".to_string(),
                "#upd_theme".to_string() => "theme".to_string(),
                "#upd_notifications".to_string() => "notifications".to_string(),
            )
        );
        assert_eq!(
            values,
            collection!(
                ":upd_preferences_theme".to_string() => AttributeValue::S("blue".to_string()),
                ":upd_preferences_notifications".to_string() => AttributeValue::Bool(false),
            )
        );
    }

    #[test]
    fn test_set_and_add_combined() {
        let update = UpdateExpression::new()
            .set(&["timestamp"], AttributeValue::S("1".to_string()))
            .add(&["loginCount"], AttributeValue::N("1".to_string()));
        assert!(!update.is_empty());
        assert_eq!(
            update.expression(),
            "SET #upd_timestamp = :upd_timestamp ADD #upd_loginCount :upd_loginCount"
        );
    }

    #[test]
    fn test_empty() {
        let update = UpdateExpression::new();
        assert!(update.is_empty());
        assert_eq!(update.expression(), "");
    }
}
