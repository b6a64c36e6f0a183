use super::error::FilterError;
use super::operator::Operator;
use super::value::json_type_name;
use serde_json::{Map, Value};
use std::fmt;

/// A single comparison leaf: `{"op": ..., "name": ..., "val": ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: Operator,
    /// Field name handed to the value accessor
    pub name: String,
    pub value: Value,
}

impl Comparison {
    pub fn new(op: Operator, name: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            name: name.into(),
            value,
        }
    }

    /// Decode a comparison leaf from its wire form
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        let obj = expect_object(value)?;

        let op = match obj.get("op") {
            Some(Value::String(op)) => op.parse::<Operator>()?,
            Some(other) => {
                return Err(FilterError::MalformedFilter(format!(
                    "'op' must be a string, got {}",
                    json_type_name(other)
                )));
            }
            None => {
                return Err(FilterError::MalformedFilter(format!(
                    "expected 'op', 'name' and 'val' keys, got: {}",
                    value
                )));
            }
        };

        let name = match obj.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(FilterError::MalformedFilter(format!(
                    "'name' must be a string, got {}",
                    json_type_name(other)
                )));
            }
            None => {
                return Err(FilterError::MalformedFilter(format!(
                    "missing 'name' in condition: {}",
                    value
                )));
            }
        };

        let val = obj.get("val").ok_or_else(|| {
            FilterError::MalformedFilter(format!("missing 'val' in condition: {}", value))
        })?;

        Ok(Comparison::new(op, name, val.clone()))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.op, self.value)
    }
}

/// One node of a declarative filter tree
///
/// A list of nodes is conjunctive. `Not` only ever wraps a comparison leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Comparison(Comparison),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Comparison),
}

impl FilterNode {
    pub fn comparison(op: Operator, name: impl Into<String>, value: Value) -> Self {
        FilterNode::Comparison(Comparison::new(op, name, value))
    }

    /// Parse a top-level filter from a JSON string
    pub fn from_json_str(s: &str) -> Result<Vec<Self>, FilterError> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| FilterError::MalformedFilter(format!("invalid JSON: {}", e)))?;
        Self::parse_list(&value)
    }

    /// Decode a list of conditions
    pub fn parse_list(value: &Value) -> Result<Vec<Self>, FilterError> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            other => Err(FilterError::MalformedFilter(format!(
                "expected a list of conditions, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Decode a single condition
    ///
    /// Keys are checked in the order `and`, `or`, `not`, then the leaf form.
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        let obj = expect_object(value)?;

        if let Some(children) = obj.get("and") {
            return Ok(FilterNode::And(Self::parse_group("and", children)?));
        }
        if let Some(children) = obj.get("or") {
            return Ok(FilterNode::Or(Self::parse_group("or", children)?));
        }
        if let Some(inner) = obj.get("not") {
            if is_group(inner) {
                return Err(FilterError::MalformedFilter(
                    "'not' must wrap a single comparison, not a group".to_string(),
                ));
            }
            return Comparison::from_value(inner).map(FilterNode::Not);
        }

        Comparison::from_value(value).map(FilterNode::Comparison)
    }

    fn parse_group(key: &str, children: &Value) -> Result<Vec<Self>, FilterError> {
        match children {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            other => Err(FilterError::MalformedFilter(format!(
                "'{}' expects a list of conditions, got {}",
                key,
                json_type_name(other)
            ))),
        }
    }

    /// Iterate over every comparison leaf in this subtree, including negated ones
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        collect_comparisons(self, &mut out);
        out
    }
}

fn collect_comparisons<'a>(node: &'a FilterNode, out: &mut Vec<&'a Comparison>) {
    match node {
        FilterNode::Comparison(c) | FilterNode::Not(c) => out.push(c),
        FilterNode::And(children) | FilterNode::Or(children) => {
            for child in children {
                collect_comparisons(child, out);
            }
        }
    }
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>, FilterError> {
    value.as_object().ok_or_else(|| {
        FilterError::MalformedFilter(format!(
            "expected a condition object, got {}",
            json_type_name(value)
        ))
    })
}

fn is_group(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| ["and", "or", "not"].iter().any(|k| obj.contains_key(*k)))
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison(c) => write!(f, "{}", c),
            FilterNode::Not(c) => write!(f, "not({})", c),
            FilterNode::And(children) => write_group(f, "and", children),
            FilterNode::Or(children) => write_group(f, "or", children),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, key: &str, children: &[FilterNode]) -> fmt::Result {
    write!(f, "{}[", key)?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_leaf() {
        let node = FilterNode::from_value(&json!({"op": "eq", "name": "a", "val": 1})).unwrap();
        assert_eq!(node, FilterNode::comparison(Operator::Eq, "a", json!(1)));
    }

    #[test]
    fn test_parse_nested_groups() {
        let nodes = FilterNode::from_json_str(
            r#"[{"and": [{"op": "gt", "name": "a", "val": 1}]},
                {"or": [{"not": {"op": "eq", "name": "b", "val": null}}]}]"#,
        )
        .unwrap();

        assert_eq!(
            nodes,
            vec![
                FilterNode::And(vec![FilterNode::comparison(Operator::Gt, "a", json!(1))]),
                FilterNode::Or(vec![FilterNode::Not(Comparison::new(
                    Operator::Eq,
                    "b",
                    json!(null)
                ))]),
            ]
        );
    }

    #[test]
    fn test_null_val_is_accepted_but_missing_val_is_not() {
        assert!(FilterNode::from_value(&json!({"op": "eq", "name": "a", "val": null})).is_ok());
        let err = FilterNode::from_value(&json!({"op": "eq", "name": "a"})).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));
    }

    #[test]
    fn test_unknown_operator_is_reported() {
        let err = FilterNode::from_value(&json!({"op": "match", "name": "a", "val": "x"}))
            .unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("match".to_string()));
    }

    #[test]
    fn test_not_rejects_groups() {
        let err = FilterNode::from_value(&json!({"not": {"and": []}})).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));

        let err = FilterNode::from_value(&json!({"not": [1, 2]})).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(FilterNode::from_value(&json!("eq")).is_err());
        assert!(FilterNode::from_value(&json!({"xor": []})).is_err());
        assert!(FilterNode::from_value(&json!({"and": {"op": "eq"}})).is_err());
        assert!(FilterNode::parse_list(&json!({"op": "eq", "name": "a", "val": 1})).is_err());
    }

    #[test]
    fn test_display() {
        let node = FilterNode::Or(vec![
            FilterNode::comparison(Operator::In, "tag", json!(["a", "b"])),
            FilterNode::Not(Comparison::new(Operator::Like, "name", json!("x"))),
        ]);
        assert_eq!(
            node.to_string(),
            r#"or[tag in_ ["a","b"], not(name like "x")]"#
        );
    }
}
