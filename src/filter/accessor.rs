//! Value accessors resolve a field name against a record.
//!
//! Accessors must be pure: a compiled predicate may call them any number of
//! times, from any thread.

use super::error::EvalError;
use serde_json::Value;

pub trait ValueAccessor: Send + Sync {
    fn get<'r>(&self, record: &'r Value, name: &str) -> Result<&'r Value, EvalError>;
}

/// Top-level key lookup on a JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyAccessor;

impl ValueAccessor for KeyAccessor {
    fn get<'r>(&self, record: &'r Value, name: &str) -> Result<&'r Value, EvalError> {
        record
            .get(name)
            .ok_or_else(|| EvalError::MissingField(name.to_string()))
    }
}

/// Reads fields from the `attributes` member of a JSON:API resource object
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributesAccessor;

impl ValueAccessor for AttributesAccessor {
    fn get<'r>(&self, record: &'r Value, name: &str) -> Result<&'r Value, EvalError> {
        record
            .get("attributes")
            .and_then(|attributes| attributes.get(name))
            .ok_or_else(|| EvalError::MissingField(name.to_string()))
    }
}

/// Walks a separated path such as `author.address.city`
///
/// Numeric segments index into lists.
#[derive(Debug, Clone, Copy)]
pub struct PathAccessor {
    separator: char,
}

impl Default for PathAccessor {
    fn default() -> Self {
        Self { separator: '.' }
    }
}

impl PathAccessor {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl ValueAccessor for PathAccessor {
    fn get<'r>(&self, record: &'r Value, name: &str) -> Result<&'r Value, EvalError> {
        let mut current = record;
        for segment in name.split(self.separator) {
            let next = match current {
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                other => other.get(segment),
            };
            current = next.ok_or_else(|| EvalError::MissingField(name.to_string()))?;
        }
        Ok(current)
    }
}

/// Adapter for closure accessors, see [`accessor_fn`]
#[derive(Clone, Copy)]
pub struct FnAccessor<F>(F);

/// Wrap a closure as a [`ValueAccessor`]
///
/// ```
/// use jsonapi_filter::filter::{EvalError, accessor_fn};
///
/// let accessor = accessor_fn(|record, name| {
///     record["meta"]
///         .get(name)
///         .ok_or_else(|| EvalError::MissingField(name.to_string()))
/// });
/// # let _ = accessor;
/// ```
pub fn accessor_fn<F>(f: F) -> FnAccessor<F>
where
    F: for<'r> Fn(&'r Value, &str) -> Result<&'r Value, EvalError> + Send + Sync,
{
    FnAccessor(f)
}

impl<F> ValueAccessor for FnAccessor<F>
where
    F: for<'r> Fn(&'r Value, &str) -> Result<&'r Value, EvalError> + Send + Sync,
{
    fn get<'r>(&self, record: &'r Value, name: &str) -> Result<&'r Value, EvalError> {
        (self.0)(record, name)
    }
}
