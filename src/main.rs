use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sql_filter::config::{ConfigError, GateConfig};
use sql_filter::SqlQuery;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "filter_gate.json";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(filter)
        .init();
}

/// 加载闸门配置，文件不存在时使用默认配置
fn load_config(path: &str) -> Result<GateConfig> {
    match GateConfig::from_json_file(path) {
        Ok(config) => {
            info!(path, fields = config.allow.len(), mappings = config.mapping.len(), "loaded gate config");
            Ok(config)
        }
        Err(ConfigError::NotFound(_)) => {
            warn!(path, "gate config not found, using defaults");
            Ok(GateConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path)),
    }
}

/// REPL 的会话状态
struct Session {
    config: GateConfig,
    query: SqlQuery,
    alias: Option<String>,
}

impl Session {
    fn new(config: GateConfig) -> Self {
        let query = config.build();
        let alias = config.alias.clone();
        Self { config, query, alias }
    }

    /// 处理一行输入，返回 false 表示退出
    fn handle(&mut self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(":quit") | Some(":q") => return false,
            Some(":allow") => {
                let fields: Vec<&str> = words.collect();
                self.query.gate_mut().allow(&fields);
                println!("allowed: {}", fields.join(", "));
            }
            Some(":alias") => {
                self.alias = words.next().map(str::to_string);
                println!("alias: {}", self.alias.as_deref().unwrap_or("<none>"));
            }
            Some(":reset") => {
                self.query.reset();
                self.config.apply(&mut self.query);
                println!("gate reset to configuration");
            }
            Some(":help") => print_help(),
            Some(_) => match self.query.compile_json(line, self.alias.as_deref()) {
                Ok(sql) if sql.is_empty() => println!("(no predicate)"),
                Ok(sql) => println!("{}", sql),
                Err(e) => println!("✗ {}", e),
            },
            None => {}
        }
        true
    }
}

fn print_help() {
    println!("输入 JSON 过滤文档，例如: {{\"status\": \"active\", \"age\": {{\"$bt\": [18, 30]}}}}");
    println!("  :allow <field>...  允许字段");
    println!("  :alias [name]      设置或清除表别名");
    println!("  :reset             恢复配置中的闸门状态");
    println!("  :quit              退出");
}

fn main() -> Result<()> {
    init_logging();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_config(&path)?;

    println!("--- JSON Filter 到 SQL WHERE 编译器 ---");
    print_help();

    let mut session = Session::new(config);
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                if !session.handle(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
