use super::error::FilterError;
use super::node::FilterNode;
use super::operator::Operator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::EndsWith,
    Operator::ILike,
    Operator::In,
    Operator::Like,
    Operator::NotILike,
    Operator::NotLike,
    Operator::NotIn,
    Operator::StartsWith,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::In,
    Operator::Lt,
    Operator::Le,
    Operator::NotIn,
];

const BOOL_OPERATORS: &[Operator] = &[Operator::Eq, Operator::Ne];

impl FieldKind {
    pub fn permitted_operators(&self) -> &'static [Operator] {
        match self {
            FieldKind::Str => STRING_OPERATORS,
            FieldKind::Int | FieldKind::Float => NUMBER_OPERATORS,
            FieldKind::Bool => BOOL_OPERATORS,
        }
    }

    pub fn permits(&self, op: Operator) -> bool {
        self.permitted_operators().contains(&op)
    }

    /// Name used in validation messages
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldKind::Str => "STRING",
            FieldKind::Int => "INT",
            FieldKind::Float => "FLOAT",
            FieldKind::Bool => "BOOL",
        }
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "str" | "string" => Ok(FieldKind::Str),
            "int" | "integer" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "bool" | "boolean" => Ok(FieldKind::Bool),
            _ => Err(format!(
                "Unknown field type: '{}'. Valid types are: str, int, float, bool",
                s
            )),
        }
    }
}

/// Field declarations used to reject operators a field's type does not support
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every comparison in the tree against the declared field types
    pub fn validate(&self, nodes: &[FilterNode]) -> Result<(), FilterError> {
        for comparison in nodes.iter().flat_map(FilterNode::comparisons) {
            let kind = self
                .get(&comparison.name)
                .ok_or_else(|| FilterError::UnknownField(comparison.name.clone()))?;

            if !kind.permits(comparison.op) {
                return Err(FilterError::OperatorNotPermitted {
                    field: comparison.name.clone(),
                    op: comparison.op.canonical_name().to_string(),
                    kind: kind.display_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, FieldKind)> for FieldSchema {
    fn from_iter<I: IntoIterator<Item = (String, FieldKind)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
