use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const API_TOKEN_VAR: &str = "TOGGLR_TOGGL_API_TOKEN";
pub const WORKSPACE_ID_VAR: &str = "TOGGLR_TOGGL_WSID";
pub const SETTINGS_FILE_VAR: &str = "TOGGLR_SETTINGS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Credentials for the report API. Either value may be missing; requests
/// made without them are rejected upstream rather than at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub workspace_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

// Workspace ids are numeric upstream; settings files may write either form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        StringOrNumber::String(value) => value,
        StringOrNumber::Number(value) => value.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    pub fn new(api_token: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            workspace_id: Some(workspace_id.into()),
        }
    }

    /// Settings file first, then direct environment variables on top.
    /// A file problem is logged and the file skipped.
    pub fn load(settings_path: Option<PathBuf>) -> Self {
        Self::load_from(settings_path, |key| env::var(key).ok())
    }

    pub fn load_from<F>(settings_path: Option<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = settings_path.or_else(|| lookup(SETTINGS_FILE_VAR).map(PathBuf::from));
        let mut settings = match explicit {
            Some(path) => read_settings_file(&path).unwrap_or_else(|err| {
                warn!(error = %err, "ignoring settings file");
                Settings::default()
            }),
            None => default_settings_path()
                .filter(|path| path.exists())
                .and_then(|path| {
                    read_settings_file(&path)
                        .map_err(|err| warn!(error = %err, "ignoring settings file"))
                        .ok()
                })
                .unwrap_or_default(),
        };

        if let Some(value) = lookup(API_TOKEN_VAR) {
            settings.api_token = Some(value);
        }
        if let Some(value) = lookup(WORKSPACE_ID_VAR) {
            settings.workspace_id = Some(value);
        }

        settings.api_token = normalize(settings.api_token);
        settings.workspace_id = normalize(settings.workspace_id);
        settings
    }

    pub fn api_token(&self) -> &str {
        self.api_token.as_deref().unwrap_or_default()
    }

    pub fn workspace_id(&self) -> &str {
        self.workspace_id.as_deref().unwrap_or_default()
    }

    /// Environment variable names of the values that are not set, sorted.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_token.is_none() {
            missing.push(API_TOKEN_VAR);
        }
        if self.workspace_id.is_none() {
            missing.push(WORKSPACE_ID_VAR);
        }
        missing.sort_unstable();
        missing
    }

    pub fn warn_missing(&self) -> bool {
        let missing = self.missing_keys();
        for key in &missing {
            warn!(variable = *key, "configuration variable not defined");
        }
        !missing.is_empty()
    }
}

fn read_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_settings_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".togglr.json");
    Some(path)
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_direct_env_vars() {
        let missing_file = PathBuf::from("/nonexistent/togglr.json");
        let settings = Settings::load_from(
            Some(missing_file),
            lookup(&[(API_TOKEN_VAR, "token123"), (WORKSPACE_ID_VAR, "737293")]),
        );
        assert_eq!(settings, Settings::new("token123", "737293"));
        assert!(settings.missing_keys().is_empty());
    }

    #[test]
    fn env_vars_override_settings_file() {
        let file = settings_file(r#"{"api_token": "from-file", "workspace_id": "1"}"#);
        let settings = Settings::load_from(
            Some(file.path().to_path_buf()),
            lookup(&[(API_TOKEN_VAR, "from-env")]),
        );
        assert_eq!(settings.api_token(), "from-env");
        assert_eq!(settings.workspace_id(), "1");
    }

    #[test]
    fn settings_file_path_comes_from_env() {
        let file = settings_file(r#"{"workspace_id": "42"}"#);
        let path = file.path().to_str().unwrap().to_string();
        let settings = Settings::load_from(None, lookup(&[(SETTINGS_FILE_VAR, path.as_str())]));
        assert_eq!(settings.workspace_id(), "42");
        assert_eq!(settings.missing_keys(), vec![API_TOKEN_VAR]);
    }

    #[test]
    fn invalid_settings_file_is_skipped() {
        let file = settings_file("not json");
        let settings = Settings::load_from(
            Some(file.path().to_path_buf()),
            lookup(&[(WORKSPACE_ID_VAR, "7")]),
        );
        assert_eq!(settings.api_token, None);
        assert_eq!(settings.workspace_id(), "7");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let settings = Settings::load_from(
            Some(PathBuf::from("/nonexistent/togglr.json")),
            lookup(&[(API_TOKEN_VAR, "   "), (WORKSPACE_ID_VAR, "")]),
        );
        assert_eq!(settings.missing_keys(), vec![API_TOKEN_VAR, WORKSPACE_ID_VAR]);
        assert!(settings.warn_missing());
        assert_eq!(settings.api_token(), "");
    }

    #[test]
    fn complete_settings_do_not_warn() {
        assert!(!Settings::new("t", "w").warn_missing());
    }

    #[test]
    fn numeric_workspace_id_in_settings_file() {
        let file = settings_file(r#"{"api_token": "tok", "workspace_id": 737293}"#);
        let settings = Settings::load_from(Some(file.path().to_path_buf()), lookup(&[]));
        assert_eq!(settings, Settings::new("tok", "737293"));
        assert!(settings.missing_keys().is_empty());
    }

    #[test]
    fn null_workspace_id_in_settings_file_is_missing() {
        let file = settings_file(r#"{"api_token": "tok", "workspace_id": null}"#);
        let settings = Settings::load_from(Some(file.path().to_path_buf()), lookup(&[]));
        assert_eq!(settings.api_token(), "tok");
        assert_eq!(settings.missing_keys(), vec![WORKSPACE_ID_VAR]);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let bind = ServerSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        };
        assert_eq!(bind.bind_addr(), "127.0.0.1:5000");
    }
}
