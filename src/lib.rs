//! Recall Sync
//!
//! Replicates notes recalled from a knowledge API into a Notion database:
//! - Recall client and note normalization with content hashing
//! - Persistent sync state with hash-based change detection
//! - Browser-driven page reconciliation over WebDriver
//! - Structured-API replication as an alternative strategy
//! - Single-pass or watch-mode scheduling

pub mod browser;
pub mod error;
pub mod notes;
pub mod notion;
pub mod orchestrator;
pub mod recall;
pub mod reconcile;
pub mod state;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use browser::Key;
use error::{Result, SyncError};
use notes::FieldFallback;

pub const DEFAULT_CONFIG_FILE: &str = "recall-sync.yaml";
pub const DEFAULT_RECALL_API_BASE: &str = "https://open-api.biji.com/getnote/openapi";
pub const DEFAULT_RECALL_QUERY: &str = "请返回最近更新的笔记";
pub const DEFAULT_TOP_K: u32 = 50;
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_PROFILE_DIR: &str = ".playwright-notion";
pub const DEFAULT_STATE_FILE: &str = ".sync-state.json";
pub const DEFAULT_MAX_PER_RUN: usize = 20;
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;
/// Upper bound for the watch interval (one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

// ============================================================================
// Enums
// ============================================================================

/// Which replication path writes to the target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Drive the web UI through a browser session
    #[default]
    Ui,
    /// Use the structured REST API
    Api,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => write!(f, "ui"),
            Self::Api => write!(f, "api"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ui" | "browser" => Ok(Self::Ui),
            "api" => Ok(Self::Api),
            _ => Err(format!("Unknown sync strategy: {}", s)),
        }
    }
}

impl Strategy {
    /// Normalization policy each path has always used.
    pub fn default_field_fallback(&self) -> FieldFallback {
        match self {
            Self::Ui => FieldFallback::Falsy,
            Self::Api => FieldFallback::NullOnly,
        }
    }
}

/// Recall scope: one topic or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicSelector {
    Single(String),
    Many(Vec<String>),
}

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub recall: RecallYamlConfig,
    pub target: TargetYamlConfig,
    pub browser: BrowserYamlConfig,
    pub sync: SyncYamlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecallYamlConfig {
    pub api_base: String,
    pub api_key: String,
    pub query: String,
    pub top_k: i64,
    pub topic_id: Option<String>,
    pub topic_ids: Vec<String>,
}

impl Default for RecallYamlConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_RECALL_API_BASE.into(),
            api_key: String::new(),
            query: DEFAULT_RECALL_QUERY.into(),
            top_k: DEFAULT_TOP_K as i64,
            topic_id: None,
            topic_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetYamlConfig {
    pub strategy: Strategy,
    pub database_url: String,
    pub database_id: Option<String>,
    pub token: Option<String>,
    pub api_base: String,
}

impl Default for TargetYamlConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Ui,
            database_url: String::new(),
            database_id: None,
            token: None,
            api_base: notion::DEFAULT_NOTION_API_BASE.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserYamlConfig {
    pub webdriver_url: String,
    pub profile_dir: String,
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub login_timeout_secs: u64,
    /// `control`, `meta` or `auto` (the host's convention)
    pub select_all_key: Option<String>,
}

impl Default for BrowserYamlConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.into(),
            profile_dir: DEFAULT_PROFILE_DIR.into(),
            headless: false,
            navigation_timeout_secs: 60,
            element_timeout_secs: 10,
            login_timeout_secs: 300,
            select_all_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncYamlConfig {
    pub state_file: String,
    pub max_per_run: i64,
    pub interval_minutes: i64,
    pub title_max_chars: usize,
    pub body_max_chars: usize,
    pub watch: bool,
    /// Defaults per strategy when unset
    pub field_fallback: Option<FieldFallback>,
}

impl Default for SyncYamlConfig {
    fn default() -> Self {
        Self {
            state_file: DEFAULT_STATE_FILE.into(),
            max_per_run: DEFAULT_MAX_PER_RUN as i64,
            interval_minutes: DEFAULT_INTERVAL_MINUTES as i64,
            title_max_chars: 200,
            body_max_chars: 12_000,
            watch: false,
            field_fallback: None,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecallConfig {
    pub api_base: String,
    pub api_key: String,
    pub query: String,
    pub top_k: u32,
    pub topics: Option<TopicSelector>,
    pub field_fallback: FieldFallback,
}

#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub strategy: Strategy,
    /// Collection view opened by the browser path
    pub database_url: String,
    /// Database id for the API path (derived from the URL when unset)
    pub database_id: Option<String>,
    pub token: Option<String>,
    pub api_base: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Ui,
            database_url: String::new(),
            database_id: None,
            token: None,
            api_base: notion::DEFAULT_NOTION_API_BASE.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    /// Persistent browser profile that keeps the login
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
    pub login_timeout: Duration,
    /// Modifier of the select-all chord, for the OS the browser runs on
    pub select_all_modifier: Key,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub state_file: PathBuf,
    pub max_per_run: usize,
    pub interval: Duration,
    pub title_max_chars: usize,
    pub body_max_chars: usize,
    pub watch: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub recall: RecallConfig,
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries `recall-sync.yaml` in CWD. Nothing is
    /// validated here; call [`Config::validate`] before any side effect.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        // Recall
        let top_k = env_int("GET_TOP_K").unwrap_or(yaml.recall.top_k);
        let topic_id = env_string("GET_TOPIC_ID").or(yaml.recall.topic_id);
        let topic_ids = env_string("GET_TOPIC_IDS")
            .map(|raw| split_list(&raw))
            .unwrap_or(yaml.recall.topic_ids);

        // Target
        let strategy = match env_string("SYNC_STRATEGY") {
            Some(s) => s.parse().map_err(SyncError::Config)?,
            None => yaml.target.strategy,
        };
        let database_url = env_string("NOTION_DATABASE_URL").unwrap_or(yaml.target.database_url);
        let database_id = env_string("NOTION_DATABASE_ID")
            .or(yaml.target.database_id)
            .or_else(|| derive_database_id(&database_url));

        let field_fallback = match env_string("NORMALIZE_FIELD_FALLBACK") {
            Some(s) => s.parse().map_err(SyncError::Config)?,
            None => yaml
                .sync
                .field_fallback
                .unwrap_or_else(|| strategy.default_field_fallback()),
        };

        // Sync
        let max_per_run = env_int("MAX_SYNC_PER_RUN")
            .unwrap_or(yaml.sync.max_per_run)
            .max(1) as usize;
        let interval_minutes = env_int("SYNC_INTERVAL_MINUTES")
            .unwrap_or(yaml.sync.interval_minutes)
            .clamp(1, MAX_INTERVAL_MINUTES as i64) as u64;

        let select_all_modifier = match env_string("NOTION_SELECT_ALL_KEY")
            .or(yaml.browser.select_all_key)
        {
            Some(s) if !s.trim().eq_ignore_ascii_case("auto") => {
                s.parse().map_err(SyncError::Config)?
            }
            _ => Key::select_all_modifier(),
        };

        Ok(Self {
            recall: RecallConfig {
                api_base: env_string("GET_API_BASE").unwrap_or(yaml.recall.api_base),
                api_key: env_string("GET_API_KEY").unwrap_or(yaml.recall.api_key),
                query: env_string("GET_SYNC_QUERY").unwrap_or(yaml.recall.query),
                top_k: if top_k > 0 {
                    top_k.min(u32::MAX as i64) as u32
                } else {
                    DEFAULT_TOP_K
                },
                topics: topic_selector(topic_id, topic_ids),
                field_fallback,
            },
            target: TargetConfig {
                strategy,
                database_url,
                database_id,
                token: env_string("NOTION_TOKEN").or(yaml.target.token),
                api_base: env_string("NOTION_API_BASE").unwrap_or(yaml.target.api_base),
            },
            browser: BrowserConfig {
                webdriver_url: env_string("WEBDRIVER_URL").unwrap_or(yaml.browser.webdriver_url),
                profile_dir: resolve_path(
                    &env_string("NOTION_PROFILE_DIR").unwrap_or(yaml.browser.profile_dir),
                ),
                headless: env_bool("NOTION_HEADLESS").unwrap_or(yaml.browser.headless),
                navigation_timeout: Duration::from_secs(yaml.browser.navigation_timeout_secs),
                element_timeout: Duration::from_secs(yaml.browser.element_timeout_secs),
                login_timeout: Duration::from_secs(yaml.browser.login_timeout_secs),
                select_all_modifier,
            },
            sync: SyncConfig {
                state_file: resolve_path(&env_string("STATE_FILE").unwrap_or(yaml.sync.state_file)),
                max_per_run,
                interval: Duration::from_secs(interval_minutes * 60),
                title_max_chars: env_int("TITLE_MAX_CHARS")
                    .map(|n| n.max(1) as usize)
                    .unwrap_or(yaml.sync.title_max_chars),
                body_max_chars: env_int("BODY_MAX_CHARS")
                    .map(|n| n.max(1) as usize)
                    .unwrap_or(yaml.sync.body_max_chars),
                watch: env_bool("SYNC_WATCH").unwrap_or(yaml.sync.watch),
            },
        })
    }

    /// Fail fast on missing required settings.
    pub fn validate(&self) -> Result<()> {
        if self.recall.api_key.is_empty() {
            return Err(missing("GET_API_KEY"));
        }
        if self.recall.topics.is_none() {
            return Err(SyncError::Config(
                "Missing GET_TOPIC_ID (or GET_TOPIC_IDS)".into(),
            ));
        }
        self.validate_target()
    }

    /// Target settings only (enough for the `login` command).
    pub fn validate_target(&self) -> Result<()> {
        match self.target.strategy {
            Strategy::Ui => {
                if self.target.database_url.is_empty() {
                    return Err(missing("NOTION_DATABASE_URL"));
                }
            }
            Strategy::Api => {
                if self.target.token.is_none() {
                    return Err(missing("NOTION_TOKEN"));
                }
                if self.target.database_id.is_none() {
                    return Err(missing("NOTION_DATABASE_ID"));
                }
            }
        }
        Ok(())
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

fn missing(name: &str) -> SyncError {
    SyncError::Config(format!("Missing required environment variable: {}", name))
}

// ============================================================================
// Value helpers
// ============================================================================

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    env_string(name).map(|v| parse_bool(&v))
}

fn env_int(name: &str) -> Option<i64> {
    env_string(name).and_then(|v| parse_int(&v))
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Integer value, flooring decimals. `None` when not a finite number.
pub fn parse_int(value: &str) -> Option<i64> {
    let n: f64 = value.trim().parse().ok()?;
    n.is_finite().then(|| n.floor() as i64)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn topic_selector(topic_id: Option<String>, topic_ids: Vec<String>) -> Option<TopicSelector> {
    if let Some(id) = topic_id.filter(|id| !id.trim().is_empty()) {
        return Some(TopicSelector::Single(id));
    }
    let ids: Vec<String> = topic_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    (!ids.is_empty()).then_some(TopicSelector::Many(ids))
}

/// Database id from a Notion database URL: the last 32-hex run of the path,
/// as a hyphenated UUID. Query strings (view ids) are ignored.
pub fn derive_database_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let re = Regex::new(r"[0-9a-fA-F]{32}").ok()?;
    let hex = re.find_iter(path).last()?.as_str();
    uuid::Uuid::parse_str(hex)
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Expand `~/` and anchor relative paths at the current directory.
pub fn resolve_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
recall:
  api_key: yaml-key
  top_k: 10
  topic_ids: [a, b]

target:
  strategy: api
  database_url: https://www.notion.so/ws/Notes-0123456789abcdef0123456789abcdef
  token: secret

browser:
  webdriver_url: http://driver:4444
  headless: true

sync:
  max_per_run: 5
  interval_minutes: 15
  field_fallback: falsy
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.recall.api_key, "yaml-key");
        assert_eq!(config.recall.top_k, 10);
        assert_eq!(config.recall.topic_ids, vec!["a", "b"]);
        assert_eq!(config.recall.api_base, DEFAULT_RECALL_API_BASE);
        assert_eq!(config.target.strategy, Strategy::Api);
        assert_eq!(config.browser.webdriver_url, "http://driver:4444");
        assert!(config.browser.headless);
        assert_eq!(config.browser.navigation_timeout_secs, 60);
        assert_eq!(config.sync.max_per_run, 5);
        assert_eq!(config.sync.field_fallback, Some(FieldFallback::Falsy));
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.recall.top_k, 50);
        assert_eq!(config.recall.query, DEFAULT_RECALL_QUERY);
        assert_eq!(config.target.strategy, Strategy::Ui);
        assert_eq!(config.browser.profile_dir, ".playwright-notion");
        assert!(!config.browser.headless);
        assert_eq!(config.sync.state_file, ".sync-state.json");
        assert_eq!(config.sync.max_per_run, 20);
        assert_eq!(config.sync.interval_minutes, 5);
        assert_eq!(config.sync.title_max_chars, 200);
        assert_eq!(config.sync.body_max_chars, 12_000);
        assert!(config.sync.field_fallback.is_none());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("UI".parse::<Strategy>().unwrap(), Strategy::Ui);
        assert_eq!("api".parse::<Strategy>().unwrap(), Strategy::Api);
        assert!("smoke-signals".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Api.to_string(), "api");
        assert_eq!(Strategy::Ui.default_field_fallback(), FieldFallback::Falsy);
        assert_eq!(Strategy::Api.default_field_fallback(), FieldFallback::NullOnly);
    }

    #[test]
    fn test_parse_bool_and_int() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_bool(v), "{} should be true", v);
        }
        for v in ["0", "false", "no", "off", "maybe"] {
            assert!(!parse_bool(v), "{} should be false", v);
        }
        assert_eq!(parse_int("7"), Some(7));
        assert_eq!(parse_int("7.9"), Some(7));
        assert_eq!(parse_int("-2"), Some(-2));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("inf"), None);
    }

    #[test]
    fn test_topic_selector() {
        assert_eq!(
            topic_selector(Some("t".into()), vec!["a".into()]),
            Some(TopicSelector::Single("t".into()))
        );
        assert_eq!(
            topic_selector(None, split_list(" a, ,b ")),
            Some(TopicSelector::Many(vec!["a".into(), "b".into()]))
        );
        assert_eq!(topic_selector(Some("  ".into()), vec![]), None);
    }

    #[test]
    fn test_derive_database_id() {
        assert_eq!(
            derive_database_id(
                "https://www.notion.so/ws/Notes-0123456789abcdef0123456789ABCDEF?v=fedcba9876543210fedcba9876543210"
            )
            .as_deref(),
            Some("01234567-89ab-cdef-0123-456789abcdef")
        );
        assert!(derive_database_id("https://www.notion.so/ws/no-id").is_none());
        assert!(derive_database_id("").is_none());
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/abs/state.json"), PathBuf::from("/abs/state.json"));
        assert!(resolve_path("state.json").is_absolute());
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolve_path("~/profile"), home.join("profile"));
        }
    }

    /// Combined test for YAML file loading, env var overrides, and validation.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "GET_API_KEY",
                "GET_API_BASE",
                "GET_SYNC_QUERY",
                "GET_TOP_K",
                "GET_TOPIC_ID",
                "GET_TOPIC_IDS",
                "SYNC_STRATEGY",
                "NOTION_DATABASE_URL",
                "NOTION_DATABASE_ID",
                "NOTION_TOKEN",
                "NOTION_API_BASE",
                "WEBDRIVER_URL",
                "NOTION_PROFILE_DIR",
                "NOTION_HEADLESS",
                "STATE_FILE",
                "MAX_SYNC_PER_RUN",
                "SYNC_INTERVAL_MINUTES",
                "TITLE_MAX_CHARS",
                "BODY_MAX_CHARS",
                "SYNC_WATCH",
                "NORMALIZE_FIELD_FALLBACK",
                "NOTION_SELECT_ALL_KEY",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
recall:
  api_key: yaml-key
  topic_id: yaml-topic
target:
  database_url: https://www.notion.so/ws/db-0123456789abcdef0123456789abcdef
sync:
  state_file: /tmp/yaml-state.json
  max_per_run: 3
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("recall-sync.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.recall.api_key, "yaml-key");
        assert_eq!(
            config.recall.topics,
            Some(TopicSelector::Single("yaml-topic".into()))
        );
        assert_eq!(config.recall.field_fallback, FieldFallback::Falsy);
        assert_eq!(config.sync.state_file, PathBuf::from("/tmp/yaml-state.json"));
        assert_eq!(config.sync.max_per_run, 3);
        assert_eq!(config.sync.interval, Duration::from_secs(300));
        assert_eq!(config.browser.select_all_modifier, Key::select_all_modifier());
        assert_eq!(
            config.target.database_id.as_deref(),
            Some("01234567-89ab-cdef-0123-456789abcdef")
        );
        config.validate().unwrap();

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("GET_API_KEY", "env-key");
        std::env::set_var("GET_TOPIC_ID", "");
        std::env::set_var("GET_TOPIC_IDS", "x, y");
        std::env::set_var("MAX_SYNC_PER_RUN", "0");
        std::env::set_var("SYNC_INTERVAL_MINUTES", "2.7");
        std::env::set_var("GET_TOP_K", "-3");
        std::env::set_var("NOTION_HEADLESS", "yes");
        std::env::set_var("SYNC_STRATEGY", "api");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.recall.api_key, "env-key");
        // Empty env falls through to YAML
        assert_eq!(
            config.recall.topics,
            Some(TopicSelector::Single("yaml-topic".into()))
        );
        assert_eq!(config.sync.max_per_run, 1);
        assert_eq!(config.sync.interval, Duration::from_secs(120));
        assert_eq!(config.recall.top_k, 50);
        assert!(config.browser.headless);
        assert_eq!(config.target.strategy, Strategy::Api);
        assert_eq!(config.recall.field_fallback, FieldFallback::NullOnly);
        // API strategy needs a token
        assert!(config.validate().is_err());

        std::env::set_var("NOTION_TOKEN", "secret");
        std::env::set_var("NORMALIZE_FIELD_FALLBACK", "falsy");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        config.validate().unwrap();
        assert_eq!(config.recall.field_fallback, FieldFallback::Falsy);

        // Oversized intervals are capped instead of overflowing
        std::env::set_var("SYNC_INTERVAL_MINUTES", "1e18");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(
            config.sync.interval,
            Duration::from_secs(MAX_INTERVAL_MINUTES * 60)
        );

        // Remote browser on another OS
        std::env::set_var("NOTION_SELECT_ALL_KEY", "meta");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.browser.select_all_modifier, Key::Meta);
        std::env::set_var("NOTION_SELECT_ALL_KEY", "auto");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.browser.select_all_modifier, Key::select_all_modifier());
        std::env::set_var("NOTION_SELECT_ALL_KEY", "shift");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());
        std::env::remove_var("NOTION_SELECT_ALL_KEY");

        std::env::set_var("SYNC_STRATEGY", "carrier-pigeon");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- Phase 3: No YAML file → defaults, and validation fails fast ---
        let nonexistent = Path::new("/tmp/nonexistent-recall-sync-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.sync.max_per_run, 20);
        assert_eq!(config.recall.top_k, 50);
        assert!(config.recall.topics.is_none());
        match config.validate() {
            Err(SyncError::Config(msg)) => assert!(msg.contains("GET_API_KEY")),
            other => panic!("expected config error, got {:?}", other),
        }

        std::env::set_var("GET_API_KEY", "k");
        std::env::set_var("GET_TOPIC_IDS", "t");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        match config.validate() {
            Err(SyncError::Config(msg)) => assert!(msg.contains("NOTION_DATABASE_URL")),
            other => panic!("expected config error, got {:?}", other),
        }

        clear_env();
    }
}
