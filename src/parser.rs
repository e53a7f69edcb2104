//! JSON 过滤文档的解析器
//!
//! ## 文档结构
//!
//! ```text
//! 根节点
//!   ├─ 对象 → 每个键值对解析为一个顶层节点 (parse_entry)
//!   └─ 数组 → 每个元素必须是对象，解析为匿名 AND 分组
//!
//! parse_entry(key, value)
//!   ├─ "$and" / "$or"
//!   │    ├─ 数组 → 命名分组，每个元素（对象）是一个匿名 AND 分组
//!   │    └─ 对象 → 命名分组，对象的每个键值对是一个子节点
//!   ├─ 其他 "$op" + 对象 → 命名分组（编译时输出为空）
//!   └─ 字段名 → parse_field(field, value)
//!
//! parse_field(field, value)
//!   ├─ 标量 → field $eq value
//!   ├─ 对象 → 每个 "$op": value 是一个条件；多于一个时为匿名 AND 分组
//!   └─ 数组 → 匿名 OR 分组，元素为标量（$eq）或操作符对象
//! ```
//!
//! ## 示例
//!
//! ```text
//! {"status": "active", "age": {"$bt": [18, 30]}}
//! {"$or": [{"a": "x"}, {"b": "y"}]}
//! {"id": {"$in": [1, 2, 3]}, "level": [1, {"$gt": 5}]}
//! ```
//!
//! 对象的键顺序会被保留，输出中的条件顺序与文档一致。

use crate::ast::{Condition, Group, Key, Node, Relation, Tree, Value};
use serde_json::{Map, Value as Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无法解析JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("未知的关键字: {0}")]
    UnknownKey(String),
    #[error("{0} 需要对象或数组")]
    ExpectedGroup(String),
    #[error("字段 {field} 下需要操作符，实际为 {found}")]
    ExpectedOperator { field: String, found: String },
    #[error("{context} 的值不受支持: {found}")]
    UnsupportedValue { context: String, found: String },
    #[error("文档根节点必须是对象或对象数组")]
    InvalidRoot,
}

/// 解析 JSON 字符串为条件树
pub fn parse_json(input: &str) -> Result<Tree, ParseError> {
    let document: Json = serde_json::from_str(input)?;
    Parser::new().parse(&document)
}

/// 解析已解码的键值映射为条件树
pub fn parse_map(map: &Map<String, Json>) -> Result<Tree, ParseError> {
    Parser::new().parse_object(map).map(Tree::new)
}

#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, document: &Json) -> Result<Tree, ParseError> {
        match document {
            Json::Object(map) => self.parse_object(map).map(Tree::new),
            Json::Array(items) => items
                .iter()
                .map(|item| self.parse_anonymous_object(item, "根节点"))
                .collect::<Result<Vec<_>, _>>()
                .map(Tree::new),
            _ => Err(ParseError::InvalidRoot),
        }
    }

    /// 对象的每个键值对依次解析为节点
    fn parse_object(&self, map: &Map<String, Json>) -> Result<Vec<Node>, ParseError> {
        map.iter()
            .map(|(key, value)| self.parse_entry(key, value))
            .collect()
    }

    /// 数组中的对象元素解析为匿名 AND 分组
    fn parse_anonymous_object(&self, item: &Json, context: &str) -> Result<Node, ParseError> {
        match item {
            Json::Object(map) => Ok(Group::anonymous(Relation::And, self.parse_object(map)?).into()),
            _ => Err(ParseError::ExpectedGroup(context.to_string())),
        }
    }

    fn parse_entry(&self, key: &str, value: &Json) -> Result<Node, ParseError> {
        if !key.starts_with('$') {
            return self.parse_field(key, value);
        }
        let group_key: Key = key
            .parse()
            .map_err(|_| ParseError::UnknownKey(key.to_string()))?;

        let children = match value {
            Json::Array(items) if matches!(group_key, Key::And | Key::Or) => items
                .iter()
                .map(|item| self.parse_anonymous_object(item, key))
                .collect::<Result<Vec<_>, _>>()?,
            Json::Object(map) => self.parse_object(map)?,
            _ => return Err(ParseError::ExpectedGroup(key.to_string())),
        };
        Ok(Group::named(group_key, children).into())
    }

    fn parse_field(&self, field: &str, value: &Json) -> Result<Node, ParseError> {
        match value {
            Json::Object(map) => self.parse_operators(field, map),
            Json::Array(items) => {
                let alternatives = items
                    .iter()
                    .map(|item| match item {
                        Json::Object(map) => self.parse_operators(field, map),
                        scalar => Ok(Condition::new(field, Key::Eq, self.parse_scalar(field, scalar)?).into()),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Group::anonymous(Relation::Or, alternatives).into())
            }
            scalar => Ok(Condition::new(field, Key::Eq, self.parse_scalar(field, scalar)?).into()),
        }
    }

    /// `{"$gt": 1, "$lt": 5}` 形式的操作符对象
    fn parse_operators(&self, field: &str, map: &Map<String, Json>) -> Result<Node, ParseError> {
        let mut conditions = map
            .iter()
            .map(|(op, value)| {
                let key: Key = op.parse().map_err(|_| ParseError::ExpectedOperator {
                    field: field.to_string(),
                    found: op.clone(),
                })?;
                Ok(Node::Condition(Condition::new(field, key, self.parse_value(field, value)?)))
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        if conditions.len() == 1 {
            if let Some(only) = conditions.pop() {
                return Ok(only);
            }
        }
        Ok(Group::anonymous(Relation::And, conditions).into())
    }

    /// 操作符的值：标量或标量数组
    fn parse_value(&self, field: &str, value: &Json) -> Result<Value, ParseError> {
        match value {
            Json::Array(items) => items
                .iter()
                .map(|item| self.parse_scalar(field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            scalar => self.parse_scalar(field, scalar),
        }
    }

    fn parse_scalar(&self, field: &str, value: &Json) -> Result<Value, ParseError> {
        match value {
            Json::Number(n) => Ok(Value::Number(n.clone())),
            Json::String(s) => Ok(Value::Text(s.clone())),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(ParseError::UnsupportedValue {
                context: field.to_string(),
                found: other.to_string(),
            }),
        }
    }
}
