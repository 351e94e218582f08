//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$LINKSCAN_CONFIG` (environment variable)
//! 2. `~/.config/linkscan/config.toml` (Linux/macOS)
//!    `%APPDATA%\linkscan\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Content-tree extraction settings.
    pub extract: ExtractConfig,
    /// File-link classification settings.
    pub links: LinksConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// What to do when one branch of a message's content tree fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort extraction for the whole message.
    Propagate,
    /// Log the failure and let the branch contribute empty text.
    Isolate,
}

/// Content-tree extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Policy for failed remote fetches of plain-text attachments.
    pub attachment_failures: FailurePolicy,
    /// Policy for failures while descending into nested container parts.
    pub nested_part_failures: FailurePolicy,
    /// Maximum nesting depth of a content tree.
    pub max_depth: usize,
    /// Number of messages extracted concurrently.
    pub max_concurrent_messages: usize,
}

/// File-link classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Match the built-in file-hosting link shapes.
    pub builtin_patterns: bool,
    /// Additional regexes recognizing file links.
    pub extra_file_patterns: Vec<String>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            attachment_failures: FailurePolicy::Propagate,
            nested_part_failures: FailurePolicy::Isolate,
            max_depth: 32,
            max_concurrent_messages: 16,
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            builtin_patterns: true,
            extra_file_patterns: Vec::new(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("LINKSCAN_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("linkscan").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linkscan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.extract.attachment_failures, FailurePolicy::Propagate);
        assert_eq!(cfg.extract.nested_part_failures, FailurePolicy::Isolate);
        assert_eq!(cfg.extract.max_depth, 32);
        assert!(cfg.links.builtin_patterns);
        assert!(cfg.links.extra_file_patterns.is_empty());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(
            parsed.extract.max_concurrent_messages,
            cfg.extract.max_concurrent_messages
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[extract]
attachment_failures = "isolate"

[links]
extra_file_patterns = ["^https://files\\.example\\.com/"]
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.extract.attachment_failures, FailurePolicy::Isolate);
        assert_eq!(cfg.links.extra_file_patterns.len(), 1);
        // Other fields use defaults
        assert_eq!(cfg.extract.nested_part_failures, FailurePolicy::Isolate);
        assert_eq!(cfg.extract.max_depth, 32);
        assert!(cfg.links.builtin_patterns);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let bad = "[extract]\nattachment_failures = \"ignore\"\n";
        assert!(toml::from_str::<Config>(bad).is_err());
    }
}
