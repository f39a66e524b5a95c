//! Server configuration
//!
//! Configuration is loaded once at startup from environment variables and the
//! TOML secrets file that holds the pre-registered login keys.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::session::state::Credential;

/// Errors raised while loading the secrets file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read secrets file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse secrets file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,

    /// Session configuration
    pub session: SessionConfig,

    /// Login gate configuration
    pub auth: AuthConfig,

    /// Browser automation setup configuration
    pub setup: SetupConfig,
}

/// Session-related configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sliding inactivity window
    pub timeout: Duration,
    /// How long an unseen browser entry is kept before it is forgotten
    pub retention: Duration,
}

/// Login gate configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Path of the TOML secrets file (`participant = [...]`)
    pub secrets_path: PathBuf,
    /// Pre-registered login keys
    pub participants: BTreeSet<String>,
    /// Credential handed to users who log in with a registered key
    pub default_credential: Option<Credential>,
}

/// Browser automation setup configuration
#[derive(Debug, Clone)]
pub struct SetupConfig {
    /// Whether the one-time install runs at all
    pub enabled: bool,
    /// Program to execute
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

/// Shape of the secrets file
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    participant: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            session: SessionConfig::default(),
            auth: AuthConfig {
                secrets_path: PathBuf::from("secrets.toml"),
                ..AuthConfig::default()
            },
            setup: SetupConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15 * 60), // 15 minutes
            retention: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "playwright".to_string(),
            args: vec!["install".to_string(), "chromium".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This does not touch the secrets file; see [`Config::load`].
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build configuration from a variable lookup, falling back to defaults
    /// for unset or unparsable values
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // Server config
        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        // Session config
        if let Some(timeout) = var("SESSION_TIMEOUT_SECS").as_deref().and_then(parse_secs) {
            config.session.timeout = timeout;
        }
        if let Some(retention) = var("SESSION_RETENTION_SECS")
            .as_deref()
            .and_then(parse_secs)
        {
            config.session.retention = retention;
        }

        // Auth config
        if let Some(path) = var("SECRETS_PATH")
            && !path.is_empty()
        {
            config.auth.secrets_path = PathBuf::from(path);
        }
        if let Some(keys) = var("PARTICIPANT_KEYS") {
            config.auth.participants.extend(parse_key_list(&keys));
        }
        if let Some(key) = var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            config.auth.default_credential = Some(Credential::new(key));
        }

        // Setup config
        if let Some(val) = var("BROWSER_SETUP_ENABLED") {
            config.setup.enabled = parse_flag(&val);
        }
        if let Some((program, args)) = var("BROWSER_SETUP_COMMAND")
            .as_deref()
            .and_then(parse_command)
        {
            config.setup.program = program;
            config.setup.args = args;
        }

        config
    }

    /// Load configuration from the environment and merge the secrets file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        let keys = load_participants(&config.auth.secrets_path)?;
        config.auth.participants.extend(keys);
        info!(
            "Loaded {} registered login keys",
            config.auth.participants.len()
        );
        if config.auth.default_credential.is_none() {
            warn!("OPENAI_API_KEY is not set; registered users will have no default credential");
        }
        Ok(config)
    }
}

/// Read the `participant` list from a TOML secrets file
///
/// A missing file yields an empty list so that guests can still enter with
/// their own API key.
pub fn load_participants(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Secrets file {:?} not found; no login keys are registered",
                path
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let secrets: SecretsFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(secrets.participant)
}

fn parse_secs(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("true") || raw == "1"
}

/// Split a command line into program and arguments
fn parse_command(raw: &str) -> Option<(String, Vec<String>)> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn parse_key_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8501);
        assert_eq!(config.session.timeout, Duration::from_secs(900));
        assert!(config.setup.enabled);
        assert_eq!(config.setup.program, "playwright");
        assert_eq!(config.setup.args, vec!["install", "chromium"]);
        assert!(config.auth.participants.is_empty());
    }

    #[test]
    fn test_config_from_env() {
        // Without any variables set, defaults are used
        let config = Config::from_vars(|_| None);
        assert_eq!(config.port, 8501);
        assert_eq!(config.session.timeout, Duration::from_secs(900));
        assert_eq!(config.session.retention, Duration::from_secs(3600));
        assert!(config.auth.default_credential.is_none());
        assert!(config.setup.enabled);
    }

    #[test]
    fn test_config_from_vars_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("SESSION_TIMEOUT_SECS", "60"),
            ("SESSION_RETENTION_SECS", "120"),
            ("SECRETS_PATH", "/etc/patientsim/secrets.toml"),
            ("PARTICIPANT_KEYS", "alice, bob"),
            ("OPENAI_API_KEY", "sk-env"),
            ("BROWSER_SETUP_ENABLED", "false"),
            ("BROWSER_SETUP_COMMAND", "npx playwright install --with-deps chromium"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.session.timeout, Duration::from_secs(60));
        assert_eq!(config.session.retention, Duration::from_secs(120));
        assert_eq!(
            config.auth.secrets_path,
            PathBuf::from("/etc/patientsim/secrets.toml")
        );
        assert!(config.auth.participants.contains("alice"));
        assert!(config.auth.participants.contains("bob"));
        assert_eq!(
            config.auth.default_credential.as_ref().map(|c| c.expose()),
            Some("sk-env")
        );
        assert!(!config.setup.enabled);
        assert_eq!(config.setup.program, "npx");
        assert_eq!(
            config.setup.args,
            vec!["playwright", "install", "--with-deps", "chromium"]
        );
    }

    #[test]
    fn test_config_from_vars_ignores_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "not-a-port"),
            ("SESSION_TIMEOUT_SECS", "-5"),
            ("OPENAI_API_KEY", ""),
            ("BROWSER_SETUP_COMMAND", "   "),
        ]
        .into_iter()
        .collect();
        let config = Config::from_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.port, 8501);
        assert_eq!(config.session.timeout, Duration::from_secs(900));
        assert!(config.auth.default_credential.is_none());
        assert_eq!(config.setup.program, "playwright");
        assert_eq!(config.setup.args, vec!["install", "chromium"]);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("playwright install chromium"),
            Some((
                "playwright".to_string(),
                vec!["install".to_string(), "chromium".to_string()]
            ))
        );
        assert_eq!(
            parse_command("  /opt/setup.sh  "),
            Some(("/opt/setup.sh".to_string(), Vec::new()))
        );
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command(" \t "), None);
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("900"), Some(Duration::from_secs(900)));
        assert_eq!(parse_secs(" 30 "), Some(Duration::from_secs(30)));
        assert_eq!(parse_secs("15m"), None);
    }

    #[test]
    fn test_parse_key_list() {
        let keys: Vec<String> = parse_key_list(" alice, bob ,,carol ").collect();
        assert_eq!(keys, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_load_participants_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "participant = [\"alice\", \"bob\"]").unwrap();

        let keys = load_participants(file.path()).unwrap();
        assert_eq!(keys, vec!["alice", "bob"]);
    }

    #[test]
    fn test_load_participants_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let keys = load_participants(&dir.path().join("absent.toml")).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_load_participants_without_key_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "other = 1").unwrap();

        let keys = load_participants(file.path()).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_load_participants_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "participant = [\"alice\"").unwrap();

        let result = load_participants(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
