//! SQL compiler that turns a condition tree into a `WHERE` fragment.
//!
//! Every group and leaf is checked against the [`FieldGate`]; anything it
//! rejects is left out of the output instead of failing the compilation.

use crate::ast::{Condition, Group, GroupKey, Key, Node, Relation, Tree};
use crate::formatter::{LiteralFormatter, ValueFormatter};
use crate::gate::{FieldGate, RuleOutcome};
use crate::parser::{self, ParseError};
use serde_json::Map;
use tracing::{debug, trace};

/// Compiles condition trees into SQL `WHERE` fragments
pub struct SqlQuery {
    gate: FieldGate,
    formatter: Box<dyn ValueFormatter>,
}

impl Default for SqlQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlQuery {
    /// Compiler with the common keys allowed and the literal formatter installed
    pub fn new() -> Self {
        Self {
            gate: FieldGate::with_common_keys(),
            formatter: Box::new(LiteralFormatter),
        }
    }

    pub fn with_formatter(formatter: impl ValueFormatter + 'static) -> Self {
        let mut query = Self::new();
        query.formatter = Box::new(formatter);
        query
    }

    /// Replace the default value formatter; `None` restores [`LiteralFormatter`]
    pub fn set_value_format(&mut self, formatter: Option<Box<dyn ValueFormatter>>) -> &mut Self {
        self.formatter = formatter.unwrap_or_else(|| Box::new(LiteralFormatter));
        self
    }

    pub fn gate(&self) -> &FieldGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut FieldGate {
        &mut self.gate
    }

    /// Clear gate state between independent queries
    pub fn reset(&mut self) -> &mut Self {
        self.gate.reset();
        self
    }

    /// Compile a tree into `WHERE ...`, or an empty string when nothing survives
    pub fn compile(&self, tree: &Tree, alias: Option<&str>) -> String {
        if tree.is_empty() {
            return String::new();
        }
        let alias = alias.filter(|a| !a.is_empty());
        let fragments: Vec<String> = tree
            .children
            .iter()
            .map(|node| self.compile_node(node, alias))
            .filter(|sql| !sql.is_empty())
            .collect();

        if fragments.is_empty() {
            return String::new();
        }
        format!("WHERE {}", fragments.join(" AND "))
    }

    /// Parse a JSON document and compile it
    pub fn compile_json(&self, input: &str, alias: Option<&str>) -> Result<String, ParseError> {
        let tree = parser::parse_json(input)?;
        Ok(self.compile(&tree, alias))
    }

    /// Parse an already decoded key/value map and compile it
    pub fn compile_map(
        &self,
        map: &Map<String, serde_json::Value>,
        alias: Option<&str>,
    ) -> Result<String, ParseError> {
        let tree = parser::parse_map(map)?;
        Ok(self.compile(&tree, alias))
    }

    fn compile_node(&self, node: &Node, alias: Option<&str>) -> String {
        match node {
            Node::Group(group) => self.compile_group(group, alias),
            Node::Condition(condition) => self.render_condition(condition, alias),
        }
    }

    fn compile_group(&self, group: &Group, alias: Option<&str>) -> String {
        if let GroupKey::Named(key) = group.key {
            if !self.gate.is_allowed(key.as_str()) {
                debug!(key = %key, "group key not allowed, dropping group");
                return String::new();
            }
        }

        let parts: Vec<String> = group
            .children
            .iter()
            .map(|child| self.compile_node(child, alias))
            .filter(|sql| !sql.is_empty())
            .collect();

        if parts.is_empty() {
            return String::new();
        }

        match group.key {
            GroupKey::Anonymous(_) if parts.len() == 1 => parts.join(""),
            GroupKey::Anonymous(Relation::Or) => format!("({})", parts.join(" OR ")),
            GroupKey::Anonymous(Relation::And) => format!("({})", parts.join(" AND ")),
            GroupKey::Named(Key::And) => parts.join(" AND "),
            GroupKey::Named(Key::Or) if parts.len() == 1 => parts.join(""),
            GroupKey::Named(Key::Or) => format!("({})", parts.join(" OR ")),
            GroupKey::Named(key) => {
                debug!(key = %key, "unsupported group key");
                String::new()
            }
        }
    }

    /// Render a single condition through the gate, its field rules and the formatter.
    ///
    /// The input is never modified; renaming, transforms and the alias prefix
    /// are applied to a working copy.
    fn render_condition(&self, condition: &Condition, alias: Option<&str>) -> String {
        if !self.gate.is_allowed(condition.key.as_str()) {
            debug!(field = %condition.field, key = %condition.key, "operator not allowed");
            return String::new();
        }
        if !self.gate.is_allowed(&condition.field) {
            debug!(field = %condition.field, "field not allowed");
            return String::new();
        }

        let mapped = self.gate.get_mapping(&condition.field);
        if mapped.is_empty() {
            debug!(field = %condition.field, "field mapped to empty name");
            return String::new();
        }

        let mut working = Condition {
            field: mapped.to_string(),
            key: condition.key,
            value: condition.value.clone(),
        };

        for rule in self.gate.rules_for(mapped) {
            match rule.attempt(&working, alias) {
                RuleOutcome::Rendered(sql) => {
                    trace!(field = %mapped, sql = %sql, "rendered by field override");
                    return sql;
                }
                RuleOutcome::Rewritten(rewritten) => working = rewritten,
                RuleOutcome::Rejected => {
                    debug!(field = %mapped, "condition rejected by field rule");
                    return String::new();
                }
                RuleOutcome::Declined => {}
            }
        }

        if let Some(alias) = alias {
            working.field = format!("{}.{}", alias, working.field);
        }

        let sql = self.formatter.format(&working);
        if sql.is_empty() {
            debug!(field = %working.field, key = %working.key, "formatter dropped condition");
        }
        sql
    }
}
