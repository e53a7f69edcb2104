//! 字段闸门：允许列表、字段重命名以及按字段注册的渲染规则

use crate::ast::{Condition, Key, Value};
use std::collections::{HashMap, HashSet};

/// 单条规则对一个条件的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// 最终 SQL 文本，跳过默认格式化
    Rendered(String),
    /// 改写后的条件，继续后续规则与默认格式化
    Rewritten(Condition),
    /// 丢弃该条件
    Rejected,
    /// 不处理，交给下一条规则
    Declined,
}

/// 按字段注册的渲染策略
pub trait FieldRule: Send + Sync {
    fn attempt(&self, condition: &Condition, alias: Option<&str>) -> RuleOutcome;
}

/// 完全覆盖默认渲染的字段规则；返回 `None` 表示回退到默认渲染
pub struct Override<F>(pub F);

impl<F> FieldRule for Override<F>
where
    F: Fn(&str, &Value, Key, Option<&str>) -> Option<String> + Send + Sync,
{
    fn attempt(&self, condition: &Condition, alias: Option<&str>) -> RuleOutcome {
        match (self.0)(&condition.field, &condition.value, condition.key, alias) {
            Some(sql) => RuleOutcome::Rendered(sql),
            None => RuleOutcome::Declined,
        }
    }
}

/// 改写字段名与值的规则；返回 `None` 表示丢弃该条件
pub struct Transform<F>(pub F);

impl<F> FieldRule for Transform<F>
where
    F: Fn(&str, &Value) -> Option<(String, Value)> + Send + Sync,
{
    fn attempt(&self, condition: &Condition, _alias: Option<&str>) -> RuleOutcome {
        match (self.0)(&condition.field, &condition.value) {
            Some((field, value)) => RuleOutcome::Rewritten(Condition {
                field,
                key: condition.key,
                value,
            }),
            None => RuleOutcome::Rejected,
        }
    }
}

/// 编译期间只读的字段闸门
#[derive(Default)]
pub struct FieldGate {
    allowed: HashSet<String>,
    mapping: HashMap<String, String>,
    overrides: HashMap<String, Box<dyn FieldRule>>,
    transforms: HashMap<String, Box<dyn FieldRule>>,
}

impl FieldGate {
    /// 空闸门，任何关键字都不被允许
    pub fn new() -> Self {
        Self::default()
    }

    /// 允许常用的比较与逻辑关键字
    pub fn with_common_keys() -> Self {
        let mut gate = Self::new();
        gate.allow_common_keys();
        gate
    }

    pub fn allow_common_keys(&mut self) -> &mut Self {
        self.allow(Key::COMMON)
    }

    pub fn allow<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.allowed
            .extend(keys.into_iter().map(|k| k.as_ref().to_string()));
        self
    }

    pub fn disallow<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for key in keys {
            self.allowed.remove(key.as_ref());
        }
        self
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.allowed.contains(key)
    }

    /// 注册字段重命名
    pub fn set_mapping(&mut self, field: impl Into<String>, rendered: impl Into<String>) -> &mut Self {
        self.mapping.insert(field.into(), rendered.into());
        self
    }

    /// 获取字段的渲染名，如果没有注册则原样返回
    pub fn get_mapping<'a>(&'a self, field: &'a str) -> &'a str {
        self.mapping.get(field).map(String::as_str).unwrap_or(field)
    }

    pub fn set_override<F>(&mut self, field: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&str, &Value, Key, Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        self.set_override_rule(field, Box::new(Override(f)))
    }

    pub fn set_override_rule(&mut self, field: impl Into<String>, rule: Box<dyn FieldRule>) -> &mut Self {
        self.overrides.insert(field.into(), rule);
        self
    }

    pub fn get_override(&self, field: &str) -> Option<&dyn FieldRule> {
        self.overrides.get(field).map(|r| r.as_ref())
    }

    pub fn set_transform<F>(&mut self, field: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&str, &Value) -> Option<(String, Value)> + Send + Sync + 'static,
    {
        self.set_transform_rule(field, Box::new(Transform(f)))
    }

    pub fn set_transform_rule(&mut self, field: impl Into<String>, rule: Box<dyn FieldRule>) -> &mut Self {
        self.transforms.insert(field.into(), rule);
        self
    }

    pub fn get_transform(&self, field: &str) -> Option<&dyn FieldRule> {
        self.transforms.get(field).map(|r| r.as_ref())
    }

    /// 字段的规则链：先覆盖规则，再改写规则
    pub fn rules_for<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a dyn FieldRule> + 'a {
        let chain = [self.get_override(field), self.get_transform(field)];
        chain.into_iter().flatten()
    }

    /// 清空所有状态并恢复默认允许的关键字
    pub fn reset(&mut self) -> &mut Self {
        self.allowed.clear();
        self.mapping.clear();
        self.overrides.clear();
        self.transforms.clear();
        self.allow_common_keys()
    }
}

impl std::fmt::Debug for FieldGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldGate")
            .field("allowed", &self.allowed)
            .field("mapping", &self.mapping)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}
