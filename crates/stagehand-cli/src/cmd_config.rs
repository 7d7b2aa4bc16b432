use clap::Subcommand;
use std::path::Path;

use crate::config::{self, KNOWN_KEYS};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (engine, author, log_file)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// Remove a config value
    Unset {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(path, &key, &value),
        ConfigCmd::Get { key } => get(path, &key),
        ConfigCmd::Unset { key } => unset(path, &key),
        ConfigCmd::List => list(path),
    }
}

// ── Command Implementations ──

fn check_key(key: &str) -> anyhow::Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        anyhow::bail!(
            "unknown config key {key:?} (expected one of: {})",
            KNOWN_KEYS.join(", ")
        );
    }
    Ok(())
}

/// `stagehand config set <key> <value>`
pub fn set(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    check_key(key)?;
    let mut map = config::read_config(path)?;
    map.insert(key.to_string(), config::parse_value(value));
    config::write_config(path, &map)?;
    println!("{key} = {value}");
    Ok(())
}

/// `stagehand config get <key>`
pub fn get(path: &Path, key: &str) -> anyhow::Result<()> {
    let map = config::read_config(path)?;
    match map.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `stagehand config unset <key>`
pub fn unset(path: &Path, key: &str) -> anyhow::Result<()> {
    let mut map = config::read_config(path)?;
    if map.remove(key).is_some() {
        config::write_config(path, &map)?;
        println!("{key} removed");
    } else {
        println!("(not set)");
    }
    Ok(())
}

/// `stagehand config list`
pub fn list(path: &Path) -> anyhow::Result<()> {
    let map = config::read_config(path)?;
    if map.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &map {
            println!("{k} = {v}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_known_key_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set(&path, "author", "ada").unwrap();
        let map = config::read_config(&path).unwrap();
        assert_eq!(map.get("author"), Some(&serde_json::json!("ada")));
    }

    #[test]
    fn set_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let err = set(&path, "colour", "blue").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
        assert!(!path.exists());
    }

    #[test]
    fn unset_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set(&path, "engine", "vcs-engine").unwrap();
        unset(&path, "engine").unwrap();
        assert!(config::read_config(&path).unwrap().is_empty());
    }
}
