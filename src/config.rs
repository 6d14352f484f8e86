use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_JJ_BIN: &str = "jj";
/// Structural diff renderer; jj passes this straight to `--tool`.
pub const DEFAULT_DIFF_TOOL: &str = "difft";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct JjviewConfig {
    /// jj executable, resolved via the search path.
    pub jj_bin: String,
    /// Selector passed through to `jj diff --tool`.
    pub diff_tool: String,
    /// Bound on each subprocess invocation.
    pub timeout_secs: u64,
}

impl Default for JjviewConfig {
    fn default() -> Self {
        Self {
            jj_bin: DEFAULT_JJ_BIN.to_string(),
            diff_tool: DEFAULT_DIFF_TOOL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    jj_bin: Option<String>,
    #[serde(default)]
    diff_tool: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

fn config_path() -> PathBuf {
    let mut path = dirs_home().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("jjview");
    path.push("config.toml");
    path
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Load config from `~/.config/jjview/config.toml`, falling back to defaults.
pub fn load_config() -> JjviewConfig {
    load_from(&config_path())
}

fn load_from(path: &Path) -> JjviewConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return JjviewConfig::default(),
    };

    let file: ConfigFile = match toml::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("ignoring malformed config at {}: {e}", path.display());
            return JjviewConfig::default();
        }
    };

    let defaults = JjviewConfig::default();
    JjviewConfig {
        jj_bin: file.jj_bin.unwrap_or(defaults.jj_bin),
        diff_tool: file.diff_tool.unwrap_or(defaults.diff_tool),
        timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
    }
}

/// Save the effective settings to `~/.config/jjview/config.toml`.
/// Reads the existing file (if any), updates only our fields, and writes
/// back, preserving unknown keys.
pub fn save_settings(config: &JjviewConfig) {
    save_to(&config_path(), config);
}

fn save_to(path: &Path, config: &JjviewConfig) {
    let mut table = if let Ok(contents) = std::fs::read_to_string(path) {
        contents
            .parse::<toml::Table>()
            .unwrap_or_else(|_| toml::Table::new())
    } else {
        toml::Table::new()
    };

    table.insert(
        "jj_bin".to_string(),
        toml::Value::String(config.jj_bin.clone()),
    );
    table.insert(
        "diff_tool".to_string(),
        toml::Value::String(config.diff_tool.clone()),
    );
    table.insert(
        "timeout_secs".to_string(),
        toml::Value::Integer(config.timeout_secs as i64),
    );

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let toml_string = toml::to_string_pretty(&table).unwrap_or_default();
    let _ = std::fs::write(path, toml_string);
}
