//! Extraction of filters from JSON:API query parameters.
//!
//! Two forms are recognised:
//!
//! ```text
//! filter=[{"op": "eq", "name": "a", "val": 1}]    JSON list of conditions
//! filter[name]=value                              shorthand for an `eq` condition
//! ```

use crate::filter::value::json_type_name;
use crate::filter::{FilterError, FilterNode, Operator};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Incorrect filters format, expected list of conditions but got {0}")]
    NotAList(&'static str),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

const FILTER_KEY: &str = "filter";
const SIMPLE_FILTER_PREFIX: &str = "filter[";

/// Collect filter conditions from decoded query parameters
///
/// JSON filters come first, followed by simple `filter[name]` filters in
/// order of first appearance. A repeated key keeps its last value.
pub fn filters_from_query<I, K, V>(pairs: I) -> Result<Vec<FilterNode>, QueryError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut json_filter: Option<String> = None;
    let mut simple: Vec<(String, String)> = Vec::new();

    for (key, value) in pairs {
        let (key, value) = (key.as_ref(), value.as_ref());
        if key == FILTER_KEY {
            json_filter = Some(value.to_string());
        } else if key.starts_with(SIMPLE_FILTER_PREFIX) {
            let name = extract_item_key(key)?;
            match simple.iter_mut().find(|(existing, _)| existing == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => simple.push((name.to_string(), value.to_string())),
            }
        }
    }

    let mut nodes = match json_filter {
        Some(raw) => parse_json_filter(&raw)?,
        None => Vec::new(),
    };
    nodes.extend(
        simple
            .into_iter()
            .map(|(name, value)| FilterNode::comparison(Operator::Eq, name, Value::String(value))),
    );
    Ok(nodes)
}

fn parse_json_filter(raw: &str) -> Result<Vec<FilterNode>, QueryError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| QueryError::Parse(format!("filter: {}", e)))?;
    if !value.is_array() {
        return Err(QueryError::NotAList(json_type_name(&value)));
    }
    Ok(FilterNode::parse_list(&value)?)
}

/// `filter[name]` -> `name`
fn extract_item_key(key: &str) -> Result<&str, QueryError> {
    let start = key
        .find('[')
        .ok_or_else(|| QueryError::Parse(key.to_string()))?;
    let end = key
        .find(']')
        .filter(|end| *end > start)
        .ok_or_else(|| QueryError::Parse(key.to_string()))?;
    Ok(&key[start + 1..end])
}
