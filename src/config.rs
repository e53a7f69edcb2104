//! 配置模块，负责加载字段闸门的JSON配置文件

use crate::formatter::{LiteralFormatter, PostgresFormatter};
use crate::sql_compiler::SqlQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 闸门配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),
    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析JSON配置文件 {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 默认格式化器的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Literal,
    Postgres,
}

/// 字段闸门配置结构
///
/// ```json
/// {
///     "allow": ["status", "age", "uid"],
///     "mapping": { "uid": "user_id" },
///     "alias": "t",
///     "formatter": "literal"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// 允许出现在过滤条件中的字段
    #[serde(default)]
    pub allow: Vec<String>,
    /// 字段名到列名的映射
    #[serde(default)]
    pub mapping: HashMap<String, String>,
    /// 默认的表别名
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub formatter: FormatterKind,
}

impl GateConfig {
    /// 从JSON文件加载闸门配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    /// 把配置应用到编译器，保留默认允许的操作符
    pub fn apply(&self, query: &mut SqlQuery) {
        match self.formatter {
            FormatterKind::Literal => query.set_value_format(Some(Box::new(LiteralFormatter))),
            FormatterKind::Postgres => query.set_value_format(Some(Box::new(PostgresFormatter))),
        };

        let gate = query.gate_mut();
        gate.allow(&self.allow);
        for (field, column) in &self.mapping {
            gate.set_mapping(field.as_str(), column.as_str());
        }
    }

    /// 根据配置创建编译器
    pub fn build(&self) -> SqlQuery {
        let mut query = SqlQuery::new();
        self.apply(&mut query);
        query
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}
