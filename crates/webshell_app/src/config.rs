use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shell_logging::{shell_info, shell_warn};
use thiserror::Error;
use url::Url;
use webshell_core::{callback_scheme, ChromeSettings, NavigationClassifier, NavigationRules};
use webshell_engine::DownloadSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Shell settings, stored as RON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub start_url: Option<Url>,
    /// Identity of the embedding application; the auth callback scheme is
    /// derived from it.
    pub app_identity: Option<String>,
    pub download_dir: PathBuf,
    /// Where picked media and camera captures are copied before upload.
    pub staging_dir: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub ephemeral_auth_sessions: bool,
    pub chrome: ChromeSettings,
    pub rules: NavigationRules,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            start_url: None,
            app_identity: None,
            download_dir: temp.join("webshell-downloads"),
            staging_dir: temp.join("webshell-uploads"),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            ephemeral_auth_sessions: false,
            chrome: ChromeSettings::default(),
            rules: NavigationRules::default(),
        }
    }
}

impl ShellConfig {
    pub fn callback_scheme(&self) -> String {
        callback_scheme(self.app_identity.as_deref())
    }

    pub fn classifier(&self) -> NavigationClassifier {
        NavigationClassifier::new(self.rules.clone(), self.callback_scheme())
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            download_dir: self.download_dir.clone(),
        }
    }
}

pub fn parse_config(text: &str) -> Result<ShellConfig, ConfigError> {
    Ok(ron::from_str(text)?)
}

pub fn read_config(path: &Path) -> Result<ShellConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_config(&text)
}

/// Loads the config at `path`, falling back to defaults when it is absent
/// or unusable.
pub fn load_config(path: &Path) -> ShellConfig {
    match read_config(path) {
        Ok(config) => {
            shell_info!("Loaded config from {:?}", path);
            config
        }
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            ShellConfig::default()
        }
        Err(err) => {
            shell_warn!("Using default config, {:?} is unusable: {}", path, err);
            ShellConfig::default()
        }
    }
}
