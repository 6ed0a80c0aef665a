//! Startup configuration from the environment

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Name of the bundled tool server binary
pub const SERVER_BINARY: &str = "meeting-server";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("Cannot locate the tool server next to this executable: {0}")]
    ServerPath(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    /// Endpoint override for the model backend
    pub base_url: Option<String>,
    pub server_command: String,
    pub server_args: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values are treated alike
    /// for the optional settings
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = lookup("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::Empty("GEMINI_API_KEY"));
        }

        let model = non_blank("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = non_blank("GEMINI_BASE_URL");

        let (server_command, server_args) = match non_blank("MEETING_SERVER_CMD") {
            Some(cmd) => {
                let mut words = cmd.split_whitespace().map(str::to_string);
                let program = words.next().ok_or(ConfigError::Empty("MEETING_SERVER_CMD"))?;
                (program, words.collect())
            }
            None => (
                default_server_path()?.to_string_lossy().into_owned(),
                Vec::new(),
            ),
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            server_command,
            server_args,
        })
    }
}

fn default_server_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::ServerPath)?;
    let dir = exe.parent().ok_or_else(|| {
        ConfigError::ServerPath(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        ))
    })?;
    Ok(dir.join(format!("{SERVER_BINARY}{}", std::env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("GEMINI_API_KEY"))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])),
            Err(ConfigError::Empty("GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.base_url.is_none());
        assert!(config.server_command.contains(SERVER_BINARY));
        assert!(config.server_args.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:9000"),
            ("MEETING_SERVER_CMD", "/opt/meeting/server --stdio  --verbose"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.server_command, "/opt/meeting/server");
        assert_eq!(config.server_args, vec!["--stdio", "--verbose"]);
    }

    #[test]
    fn test_blank_model_falls_back() {
        let config =
            AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("GEMINI_MODEL", "")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
