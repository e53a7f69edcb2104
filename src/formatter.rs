//! 叶子条件的默认格式化器
//!
//! `LiteralFormatter` 直接拼接字面量：数字不加引号，其余类型用单引号包裹，
//! 不做任何转义。`PostgresFormatter` 借助 sea-query 生成带标识符引号与
//! 字符串转义的片段。两者遵循相同的丢弃规则。

use crate::ast::{Condition, Key, Value};
use sea_query::{Asterisk, Expr, Iden, PostgresQueryBuilder, Query, QueryStatementWriter, SimpleExpr};

/// 全局的值格式化策略，返回空字符串表示丢弃该条件
pub trait ValueFormatter: Send + Sync {
    fn format(&self, condition: &Condition) -> String;
}

impl<F> ValueFormatter for F
where
    F: Fn(&Condition) -> String + Send + Sync,
{
    fn format(&self, condition: &Condition) -> String {
        self(condition)
    }
}

/// 比较运算符对应的 SQL 符号
fn comparison_operator(key: Key) -> Option<&'static str> {
    match key {
        Key::Eq => Some("="),
        Key::Ne => Some("<>"),
        Key::Lt => Some("<"),
        Key::Lte => Some("<="),
        Key::Gt => Some(">"),
        Key::Gte => Some(">="),
        _ => None,
    }
}

/// 取出 BETWEEN 的上下界，不足两个元素时返回 None
fn bounds(value: &Value) -> Option<(&Value, &Value)> {
    match value.as_list()? {
        [lo, hi, ..] => Some((lo, hi)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralFormatter;

impl LiteralFormatter {
    /// 数字原样输出，其他类型加单引号
    fn literal(value: &Value) -> String {
        if value.is_number() {
            value.to_string()
        } else {
            format!("'{}'", value)
        }
    }

    fn between(field: &str, keyword: &str, value: &Value) -> String {
        let Some((lo, hi)) = bounds(value) else {
            return String::new();
        };
        // 引号规则只看下界的类型
        if lo.is_number() {
            format!("{} {} {} AND {}", field, keyword, lo, hi)
        } else {
            format!("{} {} '{}' AND '{}'", field, keyword, lo, hi)
        }
    }
}

impl ValueFormatter for LiteralFormatter {
    fn format(&self, condition: &Condition) -> String {
        let field = condition.field.as_str();
        let value = &condition.value;

        if let Some(op) = comparison_operator(condition.key) {
            if value.as_list().is_some() {
                return String::new();
            }
            return format!("{}{}{}", field, op, Self::literal(value));
        }

        match condition.key {
            Key::Like => {
                if value.as_list().is_some() {
                    return String::new();
                }
                format!("{} LIKE '%{}%'", field, value)
            }
            Key::In => match value.as_list() {
                Some(items) if !items.is_empty() => {
                    let items: Vec<String> = items.iter().map(Self::literal).collect();
                    format!("{} IN ({})", field, items.join(", "))
                }
                _ => String::new(),
            },
            Key::Between => Self::between(field, "BETWEEN", value),
            Key::NotBetween => Self::between(field, "NOT BETWEEN", value),
            _ => String::new(),
        }
    }
}

/// 列标识符包装
#[derive(Debug, Clone)]
struct ColumnName(String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

/// 普通的 SQL 标识符：字母或下划线开头，只含字母、数字、下划线
fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// 通过 sea-query 渲染条件，标识符加双引号，字符串按 PostgreSQL 规则转义
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFormatter;

impl PostgresFormatter {
    /// `age` / `t.age` / `s.t.age` 渲染为带引号的列引用，
    /// 其他形式（例如改写规则产生的 `date(day)`）原样输出
    fn column(field: &str) -> Expr {
        let parts: Vec<&str> = field.split('.').collect();
        if !parts.iter().all(|part| is_identifier(part)) {
            return Expr::expr(Expr::cust(field));
        }
        let name = |part: &str| ColumnName(part.to_string());
        match parts.as_slice() {
            [column] => Expr::col(name(column)),
            [table, column] => Expr::col((name(table), name(column))),
            [schema, table, column] => Expr::col((name(schema), name(table), name(column))),
            _ => Expr::expr(Expr::cust(field)),
        }
    }

    fn value_to_sea(value: &Value) -> sea_query::Value {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    sea_query::Value::BigInt(Some(i))
                } else if let Some(u) = n.as_u64() {
                    sea_query::Value::BigUnsigned(Some(u))
                } else {
                    sea_query::Value::Double(n.as_f64())
                }
            }
            Value::Bool(b) => sea_query::Value::Bool(Some(*b)),
            other => sea_query::Value::String(Some(Box::new(other.to_string()))),
        }
    }

    fn expression(condition: &Condition) -> Option<SimpleExpr> {
        let col = Self::column(&condition.field);
        let value = &condition.value;

        let scalar_only = comparison_operator(condition.key).is_some() || condition.key == Key::Like;
        if scalar_only && value.as_list().is_some() {
            return None;
        }

        let expr = match condition.key {
            Key::Eq => col.eq(Self::value_to_sea(value)),
            Key::Ne => col.ne(Self::value_to_sea(value)),
            Key::Lt => col.lt(Self::value_to_sea(value)),
            Key::Lte => col.lte(Self::value_to_sea(value)),
            Key::Gt => col.gt(Self::value_to_sea(value)),
            Key::Gte => col.gte(Self::value_to_sea(value)),
            Key::Like => col.like(format!("%{}%", value)),
            Key::In => {
                let items = value.as_list().filter(|items| !items.is_empty())?;
                col.is_in(items.iter().map(Self::value_to_sea))
            }
            Key::Between => {
                let (lo, hi) = bounds(value)?;
                col.between(Self::value_to_sea(lo), Self::value_to_sea(hi))
            }
            Key::NotBetween => {
                let (lo, hi) = bounds(value)?;
                col.not_between(Self::value_to_sea(lo), Self::value_to_sea(hi))
            }
            Key::And | Key::Or => return None,
        };
        Some(expr)
    }
}

impl ValueFormatter for PostgresFormatter {
    fn format(&self, condition: &Condition) -> String {
        let Some(expr) = Self::expression(condition) else {
            return String::new();
        };
        // sea-query 只能渲染完整语句，取出 WHERE 之后的部分
        let sql = Query::select()
            .column(Asterisk)
            .from(ColumnName("_".to_string()))
            .and_where(expr)
            .to_string(PostgresQueryBuilder);
        sql.split_once(" WHERE ")
            .map(|(_, predicate)| predicate.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(field: &str, key: Key, value: impl Into<Value>) -> String {
        LiteralFormatter.format(&Condition::new(field, key, value))
    }

    #[test]
    fn test_comparison_quoting() {
        assert_eq!(literal("status", Key::Eq, "active"), "status='active'");
        assert_eq!(literal("age", Key::Eq, 30), "age=30");
        assert_eq!(literal("age", Key::Ne, 30), "age<>30");
        assert_eq!(literal("age", Key::Lt, 30), "age<30");
        assert_eq!(literal("age", Key::Lte, 30), "age<=30");
        assert_eq!(literal("age", Key::Gt, 30), "age>30");
        assert_eq!(literal("age", Key::Gte, 30), "age>=30");
        assert_eq!(literal("vip", Key::Eq, true), "vip='true'");
    }

    #[test]
    fn test_no_escaping_of_quotes() {
        assert_eq!(literal("name", Key::Eq, "O'Brien"), "name='O'Brien'");
    }

    #[test]
    fn test_like_wraps_with_wildcards() {
        assert_eq!(literal("name", Key::Like, "bob"), "name LIKE '%bob%'");
        assert_eq!(literal("code", Key::Like, 42), "code LIKE '%42%'");
    }

    #[test]
    fn test_in_list() {
        assert_eq!(literal("id", Key::In, vec![1, 2, 3]), "id IN (1, 2, 3)");
        assert_eq!(
            literal("status", Key::In, vec![Value::from("a"), Value::from(2)]),
            "status IN ('a', 2)"
        );
        assert_eq!(literal("id", Key::In, Vec::<Value>::new()), "");
        assert_eq!(literal("id", Key::In, 1), "");
    }

    #[test]
    fn test_between_bounds() {
        assert_eq!(literal("age", Key::Between, vec![18, 30]), "age BETWEEN 18 AND 30");
        assert_eq!(
            literal("day", Key::NotBetween, vec!["2024-01-01", "2024-02-01"]),
            "day NOT BETWEEN '2024-01-01' AND '2024-02-01'"
        );
        assert_eq!(literal("age", Key::Between, vec![18]), "");
        assert_eq!(literal("age", Key::Between, vec![18, 30, 40]), "age BETWEEN 18 AND 30");
        // 引号由下界决定
        assert_eq!(
            literal("age", Key::Between, vec![Value::from(18), Value::from("x")]),
            "age BETWEEN 18 AND x"
        );
    }

    #[test]
    fn test_shape_mismatch_and_logical_keys_drop() {
        assert_eq!(literal("age", Key::Eq, vec![1, 2]), "");
        assert_eq!(literal("age", Key::Like, vec![1]), "");
        assert_eq!(literal("age", Key::And, 1), "");
    }

    #[test]
    fn test_closure_formatter() {
        let placeholder = |c: &Condition| format!("{} {} ?", c.field, c.key);
        assert_eq!(placeholder.format(&Condition::new("age", Key::Gt, 1)), "age $gt ?");
    }

    #[test]
    fn test_postgres_formatter_quotes_identifiers() {
        let pg = PostgresFormatter;
        assert_eq!(pg.format(&Condition::new("status", Key::Eq, "active")), r#""status" = 'active'"#);
        assert_eq!(pg.format(&Condition::new("t.age", Key::Gt, 30)), r#""t"."age" > 30"#);
        assert_eq!(pg.format(&Condition::new("id", Key::In, vec![1, 2])), r#""id" IN (1, 2)"#);
        assert_eq!(pg.format(&Condition::new("id", Key::In, Vec::<Value>::new())), "");
        assert_eq!(pg.format(&Condition::new("age", Key::Between, vec![1])), "");
    }

    #[test]
    fn test_postgres_formatter_column_paths() {
        let pg = PostgresFormatter;
        assert_eq!(
            pg.format(&Condition::new("t.u.user_id", Key::Eq, 1)),
            r#""t"."u"."user_id" = 1"#
        );
        // 非标识符的字段（如计算列）不加引号
        assert_eq!(
            pg.format(&Condition::new("t.date(day)", Key::Eq, "2024")),
            "t.date(day) = '2024'"
        );
        assert_eq!(pg.format(&Condition::new("a.b.c.d", Key::Gt, 1)), "a.b.c.d > 1");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("user_id"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("date(day)"));
    }
}
