use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::DEFAULT_BASE_URL;
use crate::error::{Error, Result};

/// Credentials persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub token: String,
    pub base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialAuthConfig {
    token: Option<String>,
    base_url: Option<String>,
}

/// `auth.json` under the per-user config directory.
#[derive(Debug, Clone)]
pub struct AuthFile {
    path: PathBuf,
}

impl AuthFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuthFile { path: path.into() }
    }

    /// `<config dir>/ghs/auth.json`.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not find config directory".into()))?;
        Ok(AuthFile::new(dir.join("ghs").join("auth.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored config, or `None` when the file is missing or lacks either
    /// field.
    pub fn load(&self) -> Result<Option<AuthConfig>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no auth file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let partial: PartialAuthConfig = if contents.trim().is_empty() {
            PartialAuthConfig::default()
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse {}: {}", self.path.display(), e)))?
        };
        Ok(match (partial.token, partial.base_url) {
            (Some(token), Some(base_url)) if !token.is_empty() && !base_url.is_empty() => {
                Some(AuthConfig { token, base_url })
            }
            _ => None,
        })
    }

    /// Token only, when the file holds one.
    pub fn stored_token(&self) -> Result<Option<String>> {
        Ok(self.load()?.map(|config| config.token))
    }

    pub fn save(&self, config: &AuthConfig) -> Result<()> {
        self.write(&serde_json::to_string_pretty(config)?)
    }

    pub fn clear(&self) -> Result<()> {
        self.write("{}")
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;
        debug!("wrote {}", self.path.display());
        Ok(())
    }
}

/// Credentials for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub base_url: String,
}

impl Credentials {
    /// Flags win over environment variables, which win over the auth file.
    pub fn resolve(api_token: Option<&str>, api_base_url: Option<&str>, file: &AuthFile) -> Result<Self> {
        let stored = file.load()?;
        let non_empty = |value: String| (!value.trim().is_empty()).then_some(value);

        let token = api_token
            .map(str::to_string)
            .and_then(non_empty)
            .or_else(|| env::var("GITHUB_API_TOKEN").ok().and_then(non_empty))
            .or_else(|| env::var("GITHUB_TOKEN").ok().and_then(non_empty))
            .or_else(|| stored.as_ref().map(|c| c.token.clone()))
            .ok_or_else(|| {
                Error::Config(
                    "no api token configured; run `ghs config --token <token>` or set GITHUB_API_TOKEN".into(),
                )
            })?;

        let base_url = api_base_url
            .map(str::to_string)
            .and_then(non_empty)
            .or_else(|| env::var("GITHUB_API_BASE_URL").ok().and_then(non_empty))
            .or_else(|| stored.map(|c| c.base_url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Credentials { token, base_url })
    }
}

/// Outcome of `ghs config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Cleared,
    Saved(AuthConfig),
    /// Nothing usable was supplied.
    Usage,
}

/// Apply `ghs config` flags to the auth file.
pub fn apply_config(file: &AuthFile, clear: bool, token: Option<String>, base_url: Option<String>) -> Result<ConfigChange> {
    if clear {
        file.clear()?;
        return Ok(ConfigChange::Cleared);
    }
    let config = match (token, base_url) {
        (Some(token), Some(base_url)) => AuthConfig { token, base_url },
        (Some(token), None) => AuthConfig {
            token,
            base_url: file
                .load()?
                .map(|c| c.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        },
        (None, Some(base_url)) => match file.stored_token()? {
            Some(token) => AuthConfig { token, base_url },
            None => return Ok(ConfigChange::Usage),
        },
        (None, None) => return Ok(ConfigChange::Usage),
    };
    file.save(&config)?;
    Ok(ConfigChange::Saved(config))
}
