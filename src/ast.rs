//! 过滤条件树：解析器的输出，编译器的输入

use std::fmt;
use std::str::FromStr;

/// 操作符与逻辑关键字，例如：`$eq`, `$or`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    And,        // $and
    Or,         // $or
    Eq,         // $eq
    Ne,         // $ne
    Lt,         // $lt
    Lte,        // $lte
    Gt,         // $gt
    Gte,        // $gte
    Like,       // $like
    In,         // $in
    Between,    // $bt
    NotBetween, // $nbt
}

impl Key {
    /// 默认允许的关键字集合（不包含 LIKE）
    pub const COMMON: [Key; 11] = [
        Key::And,
        Key::Or,
        Key::Eq,
        Key::Ne,
        Key::Lt,
        Key::Lte,
        Key::Gt,
        Key::Gte,
        Key::In,
        Key::Between,
        Key::NotBetween,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Key::And => "$and",
            Key::Or => "$or",
            Key::Eq => "$eq",
            Key::Ne => "$ne",
            Key::Lt => "$lt",
            Key::Lte => "$lte",
            Key::Gt => "$gt",
            Key::Gte => "$gte",
            Key::Like => "$like",
            Key::In => "$in",
            Key::Between => "$bt",
            Key::NotBetween => "$nbt",
        }
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "$and" => Key::And,
            "$or" => Key::Or,
            "$eq" => Key::Eq,
            "$ne" => Key::Ne,
            "$lt" => Key::Lt,
            "$lte" => Key::Lte,
            "$gt" => Key::Gt,
            "$gte" => Key::Gte,
            "$like" => Key::Like,
            "$in" => Key::In,
            "$bt" => Key::Between,
            "$nbt" => Key::NotBetween,
            other => return Err(UnknownKey(other.to_string())),
        };
        Ok(key)
    }
}

/// 匿名分组内子节点之间的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    #[default]
    And,
    Or,
}

/// 条件的值，解析时确定类型
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
    /// 多值操作符（IN / BETWEEN）使用的有序列表，元素均为标量
    List(Vec<Value>),
}

impl Value {
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => match n.as_f64() {
                // 整数值的浮点数不输出小数部分：30.0 → 30
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x),
                _ => write!(f, "{}", n),
            },
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// 叶子节点：单个字段的过滤条件，例如：`status = 'active'`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub key: Key,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, key: Key, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            key,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// 没有显式关键字的分组
    Anonymous(Relation),
    /// `$and` / `$or` 等显式关键字
    Named(Key),
}

/// 逻辑分组节点
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub children: Vec<Node>,
}

impl Group {
    pub fn anonymous(relation: Relation, children: Vec<Node>) -> Self {
        Self {
            key: GroupKey::Anonymous(relation),
            children,
        }
    }

    pub fn named(key: Key, children: Vec<Node>) -> Self {
        Self {
            key: GroupKey::Named(key),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Condition(Condition),
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<Condition> for Node {
    fn from(condition: Condition) -> Self {
        Node::Condition(condition)
    }
}

/// 条件树的根节点
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub children: Vec<Node>,
}

impl Tree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip_through_wire_spelling() {
        for key in Key::COMMON.iter().chain([Key::Like].iter()) {
            assert_eq!(key.as_str().parse::<Key>(), Ok(*key));
        }
        assert_eq!("$regex".parse::<Key>(), Err(UnknownKey("$regex".to_string())));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(30).to_string(), "30");
        assert_eq!(Value::from("active").to_string(), "active");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "1, 2");
        let float: serde_json::Number = serde_json::from_str("30.5").unwrap();
        assert_eq!(Value::Number(float).to_string(), "30.5");
        let integral: serde_json::Number = serde_json::from_str("30.0").unwrap();
        assert_eq!(Value::Number(integral).to_string(), "30");
        let negative: serde_json::Number = serde_json::from_str("-2.0").unwrap();
        assert_eq!(Value::Number(negative).to_string(), "-2");
    }
}
