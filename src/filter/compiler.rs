//! Compiles a filter tree into a reusable predicate.
//!
//! Each level of the tree (the top-level list and the children of every
//! `and`/`or` group) is folded left to right:
//!
//! - comparisons, negated comparisons and `and` groups are accumulated and
//!   later ANDed together;
//! - an `or` group takes everything accumulated so far, ANDed, as its left
//!   operand and its own (conjunctive) children as the right operand. The
//!   result replaces the accumulator.
//!
//! So `[a, b, {"or": [c]}, d]` compiles to `((a and b) or c) and d`.

use super::accessor::{KeyAccessor, ValueAccessor};
use super::error::{EvalError, FilterError};
use super::node::{Comparison, FilterNode};
use super::operator::Operator;
use super::value::{SetKey, compare_values, json_type_name, values_equal};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Builds [`CompiledPredicate`]s from filter trees
#[derive(Clone)]
pub struct FilterCompiler {
    accessor: Arc<dyn ValueAccessor>,
    max_depth: usize,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCompiler")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl FilterCompiler {
    /// Compiler using top-level key lookup
    pub fn new() -> Self {
        Self::with_accessor(KeyAccessor)
    }

    pub fn with_accessor<A: ValueAccessor + 'static>(accessor: A) -> Self {
        Self::with_shared_accessor(Arc::new(accessor))
    }

    pub fn with_shared_accessor(accessor: Arc<dyn ValueAccessor>) -> Self {
        Self {
            accessor,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply `and`/`or` groups may nest
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Compile a conjunctive list of conditions
    pub fn compile(&self, conditions: &[FilterNode]) -> Result<CompiledPredicate, FilterError> {
        let root = self.compile_level(conditions, 0)?;
        debug!(
            conditions = conditions.len(),
            comparisons = root.comparison_count(),
            "compiled filter"
        );
        Ok(CompiledPredicate {
            root: Arc::new(root),
            accessor: Arc::clone(&self.accessor),
        })
    }

    fn compile_level(&self, nodes: &[FilterNode], depth: usize) -> Result<Predicate, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::TooDeep(self.max_depth));
        }
        if nodes.is_empty() {
            return Err(FilterError::EmptyFilter);
        }

        let mut pending: Vec<Predicate> = Vec::with_capacity(nodes.len());
        for node in nodes {
            trace!(depth, %node, "compiling filter node");
            match node {
                FilterNode::And(children) => {
                    pending.push(self.compile_level(children, depth + 1)?);
                }
                FilterNode::Or(children) => {
                    let left = conjunction(std::mem::take(&mut pending));
                    let right = self.compile_level(children, depth + 1)?;
                    pending.push(positional_or(left, right));
                }
                FilterNode::Not(comparison) => {
                    let inner = Predicate::Compare(CompiledComparison::new(comparison)?);
                    pending.push(Predicate::Not(Box::new(inner)));
                }
                FilterNode::Comparison(comparison) => {
                    pending.push(Predicate::Compare(CompiledComparison::new(comparison)?));
                }
            }
        }

        conjunction(pending).ok_or(FilterError::EmptyFilter)
    }
}

/// Compile with the default key accessor
pub fn compile(conditions: &[FilterNode]) -> Result<CompiledPredicate, FilterError> {
    FilterCompiler::new().compile(conditions)
}

/// AND a list of predicates, collapsing the single-element case
fn conjunction(mut predicates: Vec<Predicate>) -> Option<Predicate> {
    match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(Predicate::All(predicates)),
    }
}

/// An `or` node's left operand is everything accumulated before it
///
/// With nothing accumulated the left operand is an empty AND, which is
/// vacuously true, so a leading `or` matches every record.
fn positional_or(left: Option<Predicate>, right: Predicate) -> Predicate {
    let left = left.unwrap_or_else(|| Predicate::All(Vec::new()));
    Predicate::Any(vec![left, right])
}

/// A compiled, immutable filter
///
/// Cloning is cheap and shares the compiled tree.
#[derive(Clone)]
pub struct CompiledPredicate {
    root: Arc<Predicate>,
    accessor: Arc<dyn ValueAccessor>,
}

impl CompiledPredicate {
    /// Evaluate against one record
    ///
    /// `and`/`or` short-circuit, so accessor or type errors in branches that
    /// are never reached do not surface.
    pub fn matches(&self, record: &Value) -> Result<bool, EvalError> {
        self.root.evaluate(record, self.accessor.as_ref())
    }

    /// Number of comparison leaves in the compiled tree
    pub fn comparison_count(&self) -> usize {
        self.root.comparison_count()
    }
}

impl fmt::Debug for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[derive(Debug)]
enum Predicate {
    Compare(CompiledComparison),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn evaluate(&self, record: &Value, accessor: &dyn ValueAccessor) -> Result<bool, EvalError> {
        match self {
            Predicate::Compare(comparison) => comparison.evaluate(record, accessor),
            Predicate::All(predicates) => {
                for predicate in predicates {
                    if !predicate.evaluate(record, accessor)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Any(predicates) => {
                for predicate in predicates {
                    if predicate.evaluate(record, accessor)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => inner.evaluate(record, accessor).map(|hit| !hit),
        }
    }

    fn comparison_count(&self) -> usize {
        match self {
            Predicate::Compare(_) => 1,
            Predicate::All(predicates) | Predicate::Any(predicates) => {
                predicates.iter().map(Predicate::comparison_count).sum()
            }
            Predicate::Not(inner) => inner.comparison_count(),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All(predicates) | Predicate::Any(predicates) if predicates.len() > 1 => {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare(comparison) => write!(f, "{}", comparison),
            Predicate::Not(inner) => write!(f, "not ({})", inner),
            Predicate::All(predicates) if predicates.is_empty() => f.write_str("true"),
            Predicate::All(predicates) | Predicate::Any(predicates) => {
                let joiner = if matches!(self, Predicate::All(_)) {
                    " and "
                } else {
                    " or "
                };
                for (i, predicate) in predicates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    predicate.fmt_operand(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Per-operator evaluation strategy, with operands prepared at compile time
#[derive(Debug)]
enum Test {
    Equals { negate: bool },
    Ordered { accept: fn(Ordering) -> bool },
    Affix { suffix: bool },
    Contained { negate: bool },
    ContainedFolded { haystack: String, negate: bool },
    Member { set: HashSet<SetKey>, negate: bool },
}

#[derive(Debug)]
struct CompiledComparison {
    op: Operator,
    field: String,
    value: Value,
    test: Test,
}

impl CompiledComparison {
    fn new(comparison: &Comparison) -> Result<Self, FilterError> {
        let Comparison { op, name, value } = comparison;
        let test = match op {
            Operator::Eq => Test::Equals { negate: false },
            Operator::Ne => Test::Equals { negate: true },
            Operator::Gt => Test::Ordered {
                accept: Ordering::is_gt,
            },
            Operator::Ge => Test::Ordered {
                accept: Ordering::is_ge,
            },
            Operator::Lt => Test::Ordered {
                accept: Ordering::is_lt,
            },
            Operator::Le => Test::Ordered {
                accept: Ordering::is_le,
            },
            Operator::StartsWith => Test::Affix { suffix: false },
            Operator::EndsWith => Test::Affix { suffix: true },
            Operator::Like => Test::Contained { negate: false },
            Operator::NotLike => Test::Contained { negate: true },
            Operator::ILike | Operator::NotILike => Test::ContainedFolded {
                haystack: lowered_haystack(*op, name, value)?,
                negate: *op == Operator::NotILike,
            },
            Operator::In | Operator::NotIn => Test::Member {
                set: membership_set(*op, name, value)?,
                negate: *op == Operator::NotIn,
            },
        };

        Ok(Self {
            op: *op,
            field: name.clone(),
            value: value.clone(),
            test,
        })
    }

    fn evaluate(&self, record: &Value, accessor: &dyn ValueAccessor) -> Result<bool, EvalError> {
        let actual = accessor.get(record, &self.field)?;

        match &self.test {
            Test::Equals { negate } => Ok(values_equal(actual, &self.value) != *negate),
            Test::Ordered { accept } => compare_values(actual, &self.value)
                .map(*accept)
                .ok_or_else(|| {
                    self.type_error(format!(
                        "cannot order {} against {}",
                        json_type_name(actual),
                        json_type_name(&self.value)
                    ))
                }),
            Test::Affix { suffix } => match (actual, &self.value) {
                (Value::String(s), Value::String(affix)) if *suffix => Ok(s.ends_with(affix.as_str())),
                (Value::String(s), Value::String(affix)) => Ok(s.starts_with(affix.as_str())),
                (actual, value) => Err(self.type_error(format!(
                    "expected string operands, got {} and {}",
                    json_type_name(actual),
                    json_type_name(value)
                ))),
            },
            Test::Contained { negate } => self.contained(actual).map(|hit| hit != *negate),
            Test::ContainedFolded { haystack, negate } => match actual {
                Value::String(s) => Ok(haystack.contains(&s.to_lowercase()) != *negate),
                other => Err(self.type_error(format!(
                    "expected a string value, got {}",
                    json_type_name(other)
                ))),
            },
            Test::Member { set, negate } => SetKey::from_value(actual)
                .map(|key| set.contains(&key) != *negate)
                .ok_or_else(|| {
                    self.type_error(format!(
                        "{} values cannot be looked up in a set",
                        json_type_name(actual)
                    ))
                }),
        }
    }

    /// The accessed value is the needle, the filter value the haystack
    fn contained(&self, needle: &Value) -> Result<bool, EvalError> {
        match (&self.value, needle) {
            (Value::String(haystack), Value::String(needle)) => {
                Ok(haystack.contains(needle.as_str()))
            }
            (Value::String(_), other) => Err(self.type_error(format!(
                "expected a string value, got {}",
                json_type_name(other)
            ))),
            (Value::Array(items), needle) => Ok(items.iter().any(|item| values_equal(item, needle))),
            (other, _) => Err(self.type_error(format!(
                "filter value of type {} is not a container",
                json_type_name(other)
            ))),
        }
    }

    fn type_error(&self, reason: String) -> EvalError {
        EvalError::Type {
            op: self.op.canonical_name(),
            field: self.field.clone(),
            reason,
        }
    }
}

impl fmt::Display for CompiledComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

fn lowered_haystack(op: Operator, name: &str, value: &Value) -> Result<String, FilterError> {
    value.as_str().map(str::to_lowercase).ok_or_else(|| {
        FilterError::MalformedFilter(format!(
            "'{}' on '{}' requires a string value, got {}",
            op,
            name,
            json_type_name(value)
        ))
    })
}

fn membership_set(op: Operator, name: &str, value: &Value) -> Result<HashSet<SetKey>, FilterError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                SetKey::from_value(item).ok_or_else(|| {
                    FilterError::MalformedFilter(format!(
                        "'{}' on '{}' cannot hold {} members",
                        op,
                        name,
                        json_type_name(item)
                    ))
                })
            })
            .collect(),
        Value::String(s) => Ok(s.chars().map(|c| SetKey::Str(c.to_string())).collect()),
        other => Err(FilterError::MalformedFilter(format!(
            "'{}' on '{}' requires a list value, got {}",
            op,
            name,
            json_type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(name: &str, val: Value) -> FilterNode {
        FilterNode::comparison(Operator::Eq, name, val)
    }

    #[test]
    fn test_single_condition_is_not_wrapped() {
        let predicate = compile(&[eq("a", json!(1))]).unwrap();
        assert_eq!(predicate.to_string(), "a eq 1");
        assert_eq!(predicate.comparison_count(), 1);
    }

    #[test]
    fn test_or_takes_preceding_conditions_as_left_operand() {
        let predicate = compile(&[
            eq("a", json!(1)),
            eq("b", json!(2)),
            FilterNode::Or(vec![eq("c", json!(3))]),
            eq("d", json!(4)),
        ])
        .unwrap();
        assert_eq!(predicate.to_string(), "((a eq 1 and b eq 2) or c eq 3) and d eq 4");
    }

    #[test]
    fn test_leading_or_has_vacuously_true_left_operand() {
        let predicate = compile(&[FilterNode::Or(vec![eq("a", json!(1))])]).unwrap();
        assert_eq!(predicate.to_string(), "true or a eq 1");
        assert!(predicate.matches(&json!({"a": 2})).unwrap());
        assert!(predicate.matches(&json!({})).unwrap());
    }

    #[test]
    fn test_or_children_are_conjunctive() {
        let predicate = compile(&[
            eq("a", json!(1)),
            FilterNode::Or(vec![eq("b", json!(2)), eq("c", json!(3))]),
        ])
        .unwrap();
        assert_eq!(predicate.to_string(), "a eq 1 or (b eq 2 and c eq 3)");
    }

    #[test]
    fn test_empty_groups_are_rejected() {
        assert_eq!(compile(&[]).unwrap_err(), FilterError::EmptyFilter);
        assert_eq!(
            compile(&[FilterNode::And(vec![])]).unwrap_err(),
            FilterError::EmptyFilter
        );
        assert_eq!(
            compile(&[eq("a", json!(1)), FilterNode::Or(vec![])]).unwrap_err(),
            FilterError::EmptyFilter
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut node = eq("a", json!(1));
        for _ in 0..5 {
            node = FilterNode::And(vec![node]);
        }
        let tree = vec![node];

        assert!(FilterCompiler::new().max_depth(5).compile(&tree).is_ok());
        assert_eq!(
            FilterCompiler::new().max_depth(4).compile(&tree).unwrap_err(),
            FilterError::TooDeep(4)
        );
    }

    #[test]
    fn test_short_circuit_skips_unreachable_errors() {
        let predicate = compile(&[
            eq("a", json!(1)),
            FilterNode::comparison(Operator::Gt, "missing", json!(0)),
        ])
        .unwrap();
        assert!(!predicate.matches(&json!({"a": 2})).unwrap());
        assert_eq!(
            predicate.matches(&json!({"a": 1})).unwrap_err(),
            EvalError::MissingField("missing".to_string())
        );
    }

    #[test]
    fn test_ilike_requires_string_value_at_compile_time() {
        let err = compile(&[FilterNode::comparison(Operator::ILike, "x", json!(5))]).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));
    }

    #[test]
    fn test_in_rejects_unhashable_members_at_compile_time() {
        let err =
            compile(&[FilterNode::comparison(Operator::In, "x", json!([[1], 2]))]).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));

        let err = compile(&[FilterNode::comparison(Operator::NotIn, "x", json!(3))]).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilter(_)));
    }

    #[test]
    fn test_in_over_string_uses_characters() {
        let predicate =
            compile(&[FilterNode::comparison(Operator::In, "x", json!("abc"))]).unwrap();
        assert!(predicate.matches(&json!({"x": "b"})).unwrap());
        assert!(!predicate.matches(&json!({"x": "ab"})).unwrap());
    }

    #[test]
    fn test_ordering_type_error_is_deferred() {
        let predicate = compile(&[FilterNode::comparison(Operator::Lt, "x", json!(3))]).unwrap();
        assert!(predicate.matches(&json!({"x": 2.5})).unwrap());
        let err = predicate.matches(&json!({"x": "2"})).unwrap_err();
        assert!(matches!(err, EvalError::Type { op: "lt", .. }));
    }

    #[test]
    fn test_compiled_predicate_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledPredicate>();
        assert_send_sync::<FilterCompiler>();
    }
}
