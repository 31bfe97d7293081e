use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::{Cli, CliCommand};
use crate::error::{Error, Result};
use crate::model::DEFAULT_MODEL;
use crate::providers::{ProviderCredentials, ProviderKind};

pub const DEFAULT_CONFIG_FILE: &str = ".pr-reviewer.toml";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub model_timeout_secs: Option<u64>,
    pub provider_timeout_secs: Option<u64>,
    pub max_diff_chars: Option<usize>,
    pub listen_addr: Option<String>,
    pub prompt_template: Option<PathBuf>,
    pub github_api_url: Option<String>,
    pub gitlab_api_url: Option<String>,
    pub bitbucket_api_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub api_base: Option<String>,
    pub model_timeout_secs: u64,
    pub provider_timeout_secs: u64,
    pub max_diff_chars: Option<usize>,
    pub listen_addr: String,
    pub prompt_template: Option<PathBuf>,
    pub github_api_url: Option<String>,
    pub gitlab_api_url: Option<String>,
    pub bitbucket_api_url: Option<String>,
}

impl Config {
    /// Load the config file (explicit `--config`, else the default file if
    /// it exists) and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        merge(file_config, cli)
    }

    pub fn api_url_for(&self, kind: ProviderKind) -> Option<String> {
        match kind {
            ProviderKind::GitHub => self.github_api_url.clone(),
            ProviderKind::GitLab => self.gitlab_api_url.clone(),
            ProviderKind::Bitbucket => self.bitbucket_api_url.clone(),
        }
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref provider) = config.provider {
        provider.parse::<ProviderKind>()?;
    }
    if config.model_timeout_secs == Some(0) {
        return Err(Error::ConfigValidation(
            "model_timeout_secs must be > 0".to_string(),
        ));
    }
    if config.provider_timeout_secs == Some(0) {
        return Err(Error::ConfigValidation(
            "provider_timeout_secs must be > 0".to_string(),
        ));
    }
    if config.max_diff_chars == Some(0) {
        return Err(Error::ConfigValidation(
            "max_diff_chars must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Result<Config> {
    let provider = match cli.provider.as_deref().or(file.provider.as_deref()) {
        Some(p) => p.parse()?,
        None => ProviderKind::GitHub,
    };
    let cli_addr = match &cli.command {
        Some(CliCommand::Serve { addr }) => addr.clone(),
        None => None,
    };

    Ok(Config {
        provider,
        model: cli
            .model
            .clone()
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        api_base: file.api_base,
        model_timeout_secs: cli
            .timeout
            .or(file.model_timeout_secs)
            .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
        provider_timeout_secs: file
            .provider_timeout_secs
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        max_diff_chars: file.max_diff_chars,
        listen_addr: cli_addr
            .or(file.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        prompt_template: file.prompt_template,
        github_api_url: file.github_api_url,
        gitlab_api_url: file.gitlab_api_url,
        bitbucket_api_url: file.bitbucket_api_url,
    })
}

/// Secrets read from the environment. Never written anywhere.
#[derive(Clone, Default)]
pub struct Credentials {
    github_token: Option<String>,
    gitlab_token: Option<String>,
    bitbucket_username: Option<String>,
    bitbucket_app_password: Option<String>,
    google_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            github_token: get("GITHUB_TOKEN"),
            gitlab_token: get("GITLAB_TOKEN"),
            bitbucket_username: get("BITBUCKET_USERNAME"),
            bitbucket_app_password: get("BITBUCKET_APP_PASSWORD"),
            google_api_key: get("GOOGLE_API_KEY"),
        }
    }

    pub fn provider(&self, kind: ProviderKind) -> Result<ProviderCredentials> {
        let missing = |what: &str| {
            Error::Configuration(format!("{what} must be set to use the {kind} provider"))
        };
        match kind {
            ProviderKind::GitHub => self
                .github_token
                .clone()
                .map(ProviderCredentials::Token)
                .ok_or_else(|| missing("GITHUB_TOKEN")),
            ProviderKind::GitLab => self
                .gitlab_token
                .clone()
                .map(ProviderCredentials::Token)
                .ok_or_else(|| missing("GITLAB_TOKEN")),
            ProviderKind::Bitbucket => {
                match (&self.bitbucket_username, &self.bitbucket_app_password) {
                    (Some(username), Some(password)) => Ok(ProviderCredentials::AppPassword {
                        username: username.clone(),
                        password: password.clone(),
                    }),
                    _ => Err(missing("BITBUCKET_USERNAME and BITBUCKET_APP_PASSWORD")),
                }
            }
        }
    }

    pub fn model_api_key(&self) -> Result<String> {
        self.google_api_key.clone().ok_or_else(|| {
            Error::Configuration("GOOGLE_API_KEY must be set to run AI reviews".to_string())
        })
    }
}
