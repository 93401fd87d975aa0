use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

const APP_DIR: &str = "slack-transcript";
const SETTINGS_FILE: &str = "config.toml";
const TOKEN_ENV: &str = "SLACK_TOKEN";
const TOKEN_PREFIX: &str = "xoxp-";
const MIN_TOKEN_LEN: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub slack: SlackSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// A missing file yields default settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }

    /// Save to the default location and return the path written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |e| AppError::WriteFile {
            path: path.display().to_string(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::TomlSerialize(e.to_string()))?;
        fs::write(path, content).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
        }

        Ok(())
    }
}

fn non_empty(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn resolve_config_dir(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf> {
    if let Some(base) = non_empty(xdg_config_home) {
        return Ok(base.join(APP_DIR));
    }
    let home = non_empty(home).ok_or(AppError::MissingConfigDir)?;
    Ok(home.join(".config").join(APP_DIR))
}

pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(env::var_os("XDG_CONFIG_HOME"), env::var_os("HOME"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

/// `SLACK_TOKEN` wins over the stored token; the settings file is only read
/// when the variable is unset or empty.
fn select_token(
    env_token: Option<String>,
    load: impl FnOnce() -> Result<Settings>,
) -> Result<String> {
    if let Some(token) = env_token.filter(|t| !t.is_empty()) {
        return Ok(token);
    }
    Some(load()?.slack.token)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)
}

pub fn load_token() -> Result<String> {
    select_token(env::var(TOKEN_ENV).ok(), Settings::load)
}

pub fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(AppError::InvalidToken("token is empty".to_string()));
    }
    if !token.starts_with(TOKEN_PREFIX) {
        return Err(AppError::InvalidToken(format!(
            "expected a user token starting with '{}'",
            TOKEN_PREFIX
        )));
    }
    if token.chars().count() < MIN_TOKEN_LEN {
        return Err(AppError::InvalidToken("token is too short".to_string()));
    }
    Ok(())
}

/// Show the first 10 and last 4 characters; short tokens are fully masked.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 14 {
        return "*".repeat(chars.len());
    }

    let head: String = chars.iter().take(10).collect();
    let tail: String = chars.iter().skip(chars.len() - 4).collect();
    format!("{}...{}", head, tail)
}
