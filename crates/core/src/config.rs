use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_CONFIG_ROOT: &str = "/etc/udev/";
pub const DEFAULT_RULES_FILE: &str = "namedev.config";
pub const DEFAULT_PERMISSIONS_FILE: &str = "namedev.permissions";
pub const DEFAULT_COMMENT_CHAR: char = '#';
pub const DEFAULT_MAX_LINE_LEN: usize = 255;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, reporting the offending key on failure.
fn profiled_env_parse<T>(profile: &str, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match profiled_env_opt(profile, key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub paths: PathsConfig,
    pub parse: ParseConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `NAMEDEV_PROFILE`. When set (e.g. `TEST`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("NAMEDEV_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            paths: PathsConfig::from_env_profiled(p),
            parse: ParseConfig::from_env_profiled(p)?,
        })
    }

    /// Default config rooted at an explicit directory, ignoring the environment.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                config_root: root.into(),
                ..PathsConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:       {}", self.paths.rules_path().display());
        tracing::info!("  permissions: {}", self.paths.permissions_path().display());
        tracing::info!(
            "  parse:       comment={:?}, max_line_len={}, unnamed_rules={}",
            self.parse.comment_char,
            self.parse.max_line_len,
            self.parse.unnamed_rules
        );
    }

    /// Return a JSON view of the effective configuration.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "paths": {
                "rules": self.paths.rules_path(),
                "permissions": self.paths.permissions_path(),
            },
            "parse": {
                "comment_char": self.parse.comment_char.to_string(),
                "max_line_len": self.parse.max_line_len,
                "unnamed_rules": self.parse.unnamed_rules.to_string(),
            },
        })
    }
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub config_root: PathBuf,
    pub rules_file: String,
    pub permissions_file: String,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            config_root: PathBuf::from(profiled_env_or(p, "NAMEDEV_CONFIG_ROOT", DEFAULT_CONFIG_ROOT)),
            rules_file: profiled_env_or(p, "NAMEDEV_CONFIG_FILE", DEFAULT_RULES_FILE),
            permissions_file: profiled_env_or(p, "NAMEDEV_PERMISSIONS_FILE", DEFAULT_PERMISSIONS_FILE),
        }
    }

    pub fn rules_path(&self) -> PathBuf {
        self.config_root.join(&self.rules_file)
    }

    pub fn permissions_path(&self) -> PathBuf {
        self.config_root.join(&self.permissions_file)
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from(DEFAULT_CONFIG_ROOT),
            rules_file: DEFAULT_RULES_FILE.to_string(),
            permissions_file: DEFAULT_PERMISSIONS_FILE.to_string(),
        }
    }
}

// ── Line parsing ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Lines whose first non-space character is this marker are ignored.
    pub comment_char: char,
    /// Longest accepted line in bytes, excluding the terminator.
    pub max_line_len: usize,
    pub unnamed_rules: UnnamedRulePolicy,
}

impl ParseConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let comment = profiled_env_or(p, "NAMEDEV_COMMENT_CHAR", "#");
        let mut chars = comment.chars();
        let comment_char = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "NAMEDEV_COMMENT_CHAR".to_string(),
                    value: comment,
                    reason: "expected exactly one character".to_string(),
                })
            }
        };
        Ok(Self {
            comment_char,
            max_line_len: profiled_env_parse(p, "NAMEDEV_MAX_LINE_LEN", DEFAULT_MAX_LINE_LEN)?,
            unnamed_rules: profiled_env_parse(p, "NAMEDEV_UNNAMED_RULES", UnnamedRulePolicy::default())?,
        })
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            comment_char: DEFAULT_COMMENT_CHAR,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            unnamed_rules: UnnamedRulePolicy::default(),
        }
    }
}

/// How `LABEL`, `NUMBER` and `TOPOLOGY` lines obtain their registry key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnnamedRulePolicy {
    /// The line must carry `NAME="..."` after `BUS="..."`; otherwise it is skipped.
    #[default]
    RequireName,
    /// Only `BUS` is read and the rule is stored under the empty name, so all
    /// such rules merge into one shared record.
    Collapse,
}

impl fmt::Display for UnnamedRulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnnamedRulePolicy::RequireName => write!(f, "require-name"),
            UnnamedRulePolicy::Collapse => write!(f, "collapse"),
        }
    }
}

impl FromStr for UnnamedRulePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "require-name" => Ok(UnnamedRulePolicy::RequireName),
            "collapse" => Ok(UnnamedRulePolicy::Collapse),
            other => Err(format!("unknown unnamed rule policy: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_udev_root() {
        let config = Config::default();
        assert_eq!(config.paths.rules_path(), PathBuf::from("/etc/udev/namedev.config"));
        assert_eq!(
            config.paths.permissions_path(),
            PathBuf::from("/etc/udev/namedev.permissions")
        );
        assert_eq!(config.parse.comment_char, '#');
        assert_eq!(config.parse.max_line_len, 255);
        assert_eq!(config.parse.unnamed_rules, UnnamedRulePolicy::RequireName);
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn with_root_keeps_file_names() {
        let config = Config::with_root("/tmp/namedev");
        assert_eq!(config.paths.rules_path(), PathBuf::from("/tmp/namedev/namedev.config"));
        assert_eq!(config.paths.config_root(), Path::new("/tmp/namedev"));
    }

    #[test]
    fn profiled_keys_take_precedence() {
        env::set_var("CFGTEST_ONE_NAMEDEV_CONFIG_ROOT", "/srv/rules");
        env::set_var("CFGTEST_ONE_NAMEDEV_UNNAMED_RULES", "collapse");
        env::set_var("CFGTEST_ONE_NAMEDEV_COMMENT_CHAR", ";");

        let config = Config::for_profile("cfgtest_one").unwrap();
        assert_eq!(config.profile, "CFGTEST_ONE");
        assert_eq!(config.paths.config_root, PathBuf::from("/srv/rules"));
        assert_eq!(config.parse.unnamed_rules, UnnamedRulePolicy::Collapse);
        assert_eq!(config.parse.comment_char, ';');
    }

    #[test]
    fn multi_char_comment_marker_is_rejected() {
        env::set_var("CFGTEST_TWO_NAMEDEV_COMMENT_CHAR", "//");
        let err = Config::for_profile("CFGTEST_TWO").unwrap_err();
        assert!(err.to_string().contains("NAMEDEV_COMMENT_CHAR"));
    }

    #[test]
    fn bad_policy_is_rejected() {
        env::set_var("CFGTEST_THREE_NAMEDEV_UNNAMED_RULES", "merge-all");
        let err = Config::for_profile("CFGTEST_THREE").unwrap_err();
        assert!(err.to_string().contains("merge-all"));
    }

    #[test]
    fn summary_reports_policy() {
        let summary = Config::default().summary();
        assert_eq!(summary["parse"]["unnamed_rules"], "require-name");
        assert_eq!(summary["profile"], "default");
    }
}
