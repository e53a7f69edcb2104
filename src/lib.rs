//! Compile JSON filter documents into SQL `WHERE` fragments.

pub mod ast;
pub mod config;
pub mod formatter;
pub mod gate;
pub mod parser;
pub mod sql_compiler;

pub use ast::{Condition, Group, GroupKey, Key, Node, Relation, Tree, Value};
pub use formatter::{LiteralFormatter, PostgresFormatter, ValueFormatter};
pub use gate::{FieldGate, FieldRule, RuleOutcome};
pub use parser::ParseError;
pub use sql_compiler::SqlQuery;
