//! Filter tree decoding and compilation
//!
//! Filters arrive as JSON:API filter objects and are compiled once into a
//! [`CompiledPredicate`] that can be evaluated against any number of records.
//!
//! # Syntax
//!
//! ```text
//! condition := { "op": string, "name": string, "val": any }
//!            | { "and": [condition, ...] }
//!            | { "or":  [condition, ...] }
//!            | { "not": { "op": ..., "name": ..., "val": ... } }
//! filter    := [condition, ...]            conditions combine with AND
//! ```
//!
//! An `or` node is positional: everything before it at the same level is
//! ANDed into its left operand.
//!
//! # Operators
//!
//! `eq ne gt ge lt le startswith endswith like ilike notlike notilike in_ notin_`
//!
//! `like` tests whether the record's value is contained in the filter value.
//!
//! # Examples
//!
//! ```text
//! [{"op": "eq", "name": "status", "val": "active"}]
//! [{"op": "ge", "name": "age", "val": 18}, {"not": {"op": "in_", "name": "role", "val": ["bot"]}}]
//! [{"op": "eq", "name": "a", "val": 1}, {"or": [{"op": "eq", "name": "b", "val": 2}]}]   # a == 1 or b == 2
//! ```

pub mod accessor;
pub mod compiler;
pub mod error;
pub mod node;
pub mod operator;
pub mod schema;
pub mod value;

pub use accessor::{
    AttributesAccessor, FnAccessor, KeyAccessor, PathAccessor, ValueAccessor, accessor_fn,
};
pub use compiler::{CompiledPredicate, DEFAULT_MAX_DEPTH, FilterCompiler, compile};
pub use error::{EvalError, FilterError};
pub use node::{Comparison, FilterNode};
pub use operator::Operator;
pub use schema::{FieldKind, FieldSchema};
