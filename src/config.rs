use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{Participant, Role};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub refetch_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: 5_000,
            refetch_delay_ms: 750,
            request_timeout_ms: 10_000,
            user_id: None,
            role: None,
            token: None,
            token_file: None,
        }
    }
}

impl AppConfig {
    /// Applies `BEEHIVE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("BEEHIVE_API_URL") {
            self.api_base_url = url;
        }
        if let Some(user_id) = lookup("BEEHIVE_USER_ID") {
            self.user_id = Some(user_id);
        }
        if let Some(role) = lookup("BEEHIVE_ROLE") {
            match role.parse() {
                Ok(role) => self.role = Some(role),
                Err(err) => log::warn!("Ignoring BEEHIVE_ROLE: {err}"),
            }
        }
        if let Some(token) = lookup("BEEHIVE_TOKEN") {
            self.token = Some(token);
        }
        if let Some(path) = lookup("BEEHIVE_TOKEN_FILE") {
            self.token_file = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self
            .user_id
            .as_deref()
            .is_none_or(|user_id| user_id.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "user_id is required (config file, BEEHIVE_USER_ID or --user-id)".into(),
            ));
        }
        Ok(())
    }

    /// The local participant; defaults to a regular user.
    pub fn participant(&self) -> Result<Participant, ConfigError> {
        self.validate()?;
        let user_id = self.user_id.clone().unwrap_or_default();
        Ok(Participant::new(user_id.trim(), self.role.unwrap_or(Role::User)))
    }
}

/// Reads the config file, falling back to defaults when it is missing or
/// unreadable.
pub fn load_config(path: impl AsRef<Path>) -> AppConfig {
    let path = path.as_ref();
    match read_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
        Err(err) => {
            log::warn!("Failed to parse config file {}: {err}", path.display());
            AppConfig::default()
        }
    }
}

pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
        assert!(matches!(read_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        fs::write(
            &path,
            r#"{"user_id": "u9", "role": "admin", "poll_interval_ms": 2000}"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.user_id.as_deref(), Some("u9"));
        assert_eq!(config.role, Some(Role::Admin));
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.refetch_delay_ms, 750);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn example_config_parses() {
        let config: AppConfig =
            serde_json::from_str(include_str!("../config/chat.example.json")).unwrap();
        assert_eq!(config.role, Some(Role::User));
        assert!(config.participant().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig {
            user_id: Some("from-file".into()),
            ..AppConfig::default()
        };
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BEEHIVE_API_URL", "https://chat.example.org"),
            ("BEEHIVE_USER_ID", "from-env"),
            ("BEEHIVE_ROLE", "ADMIN"),
            ("BEEHIVE_TOKEN", ""),
        ]);
        config.apply_overrides(|name| vars.get(name).map(|value| value.to_string()));

        assert_eq!(config.api_base_url, "https://chat.example.org");
        assert_eq!(config.user_id.as_deref(), Some("from-env"));
        assert_eq!(config.role, Some(Role::Admin));
        assert_eq!(config.token, None);
    }

    #[test]
    fn invalid_role_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|name| (name == "BEEHIVE_ROLE").then(|| "owner".to_string()));
        assert_eq!(config.role, None);
    }

    #[test]
    fn validation_requires_user_and_interval() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.user_id = Some("u1".into());
        assert!(config.validate().is_ok());
        assert_eq!(config.participant().unwrap().role, Role::User);

        config.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
