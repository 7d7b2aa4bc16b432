use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted by `stagehand config set`.
pub const KNOWN_KEYS: &[&str] = &["engine", "author", "log_file"];

/// Author recorded on commits when none is configured.
pub const DEFAULT_AUTHOR: &str = "user";

pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Location of the config file: `$STAGEHAND_CONFIG`, else
/// `<config dir>/stagehand/config.json`.
pub fn config_path() -> PathBuf {
    if let Some(p) = std::env::var_os("STAGEHAND_CONFIG") {
        return PathBuf::from(p);
    }
    if let Some(dir) = dirs::config_dir() {
        dir.join("stagehand").join("config.json")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".stagehand").join("config.json")
    } else {
        PathBuf::from(".stagehand-config.json")
    }
}

/// Read the config file. Returns an empty map if it doesn't exist.
pub fn read_config(path: &Path) -> anyhow::Result<ConfigMap> {
    if !path.exists() {
        return Ok(ConfigMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(ConfigMap::new()),
    }
}

/// Write the config file atomically: temp file in the same dir, then rename.
pub fn write_config(path: &Path, config: &ConfigMap) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let json = serde_json::to_string_pretty(config)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub engine: Option<String>,
    pub author: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Effective settings for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Engine argv; empty when nothing is configured.
    pub engine: Vec<String>,
    pub author: String,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(config: &ConfigMap, overrides: Overrides) -> Self {
        let engine = match overrides.engine {
            Some(cmd) => split_command(&cmd),
            None => match config.get("engine") {
                Some(serde_json::Value::String(cmd)) => split_command(cmd),
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
                _ => Vec::new(),
            },
        };
        let author = overrides
            .author
            .or_else(|| config_str(config, "author"))
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
        let log_file = overrides
            .log_file
            .or_else(|| config_str(config, "log_file").map(PathBuf::from));
        Self {
            engine,
            author,
            log_file,
        }
    }
}

fn config_str(config: &ConfigMap, key: &str) -> Option<String> {
    match config.get(key)? {
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(String::from).collect()
}
