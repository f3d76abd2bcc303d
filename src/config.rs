//! Stack configuration (`config.json`) and the directory layout every
//! command works against.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize configuration: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

/// How the stack obtains its TLS certificate. `None` means an external
/// reverse proxy terminates TLS and the bundled nginx is not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslStrategy {
    SelfSigned,
    Letsencrypt,
    Manual,
    None,
}

impl std::fmt::Display for SslStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SslStrategy::SelfSigned => "self-signed",
            SslStrategy::Letsencrypt => "letsencrypt",
            SslStrategy::Manual => "manual",
            SslStrategy::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslSettings {
    pub strategy: SslStrategy,
    pub cert_path: String,
    pub key_path: String,
    #[serde(default)]
    pub le_email: String,
}

/// A DataSHIELD Rock profile, added to the compose file as its own service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RockProfile {
    pub name: String,
    pub image: String,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    pub stack_name: String,
    pub hosts: Vec<String>,
    pub opal_external_port: u16,
    pub opal_admin_password: String,
    pub profiles: Vec<RockProfile>,
    pub ssl: SslSettings,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: "easy-opal".to_string(),
            hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            opal_external_port: 443,
            opal_admin_password: "password".to_string(),
            profiles: vec![RockProfile {
                name: "rock".to_string(),
                image: "datashield/rock-base".to_string(),
                tag: "latest".to_string(),
            }],
            ssl: SslSettings {
                strategy: SslStrategy::SelfSigned,
                cert_path: "data/nginx/certs/opal.crt".to_string(),
                key_path: "data/nginx/certs/opal.key".to_string(),
                le_email: String::new(),
            },
        }
    }
}

impl StackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::Validation {
                message: "at least one hostname or IP is required".to_string(),
            });
        }
        if self.opal_external_port == 0 {
            return Err(ConfigError::Validation {
                message: "opal_external_port must be greater than 0".to_string(),
            });
        }
        for (i, profile) in self.profiles.iter().enumerate() {
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::Validation {
                    message: format!("duplicate profile name '{}'", profile.name),
                });
            }
        }
        Ok(())
    }

    /// First configured host; used as the primary domain for Opal's proxy
    /// settings and for Let's Encrypt certificate paths.
    pub fn primary_host(&self) -> &str {
        self.hosts.first().map(String::as_str).unwrap_or("localhost")
    }
}

/// Resolves every file and directory the tool touches, relative to the
/// stack directory. Keeping the root injectable is what makes the managers
/// testable against a temporary directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn compose_file(&self) -> PathBuf {
        self.root.join("docker-compose.yml")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn mongo_data_dir(&self) -> PathBuf {
        self.data_dir().join("mongo")
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.data_dir().join("nginx").join("certs")
    }

    pub fn nginx_conf_dir(&self) -> PathBuf {
        self.data_dir().join("nginx").join("conf")
    }

    pub fn nginx_conf_file(&self) -> PathBuf {
        self.nginx_conf_dir().join("nginx.conf")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.data_dir().join("nginx").join("html")
    }

    pub fn letsencrypt_dir(&self) -> PathBuf {
        self.data_dir().join("letsencrypt")
    }

    /// Create the data and backup tree. Idempotent.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [
            self.backups_dir(),
            self.mongo_data_dir(),
            self.certs_dir(),
            self.nginx_conf_dir(),
            self.html_dir(),
            self.letsencrypt_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Load `config.json`, writing and returning the defaults when it does not
/// exist yet.
pub fn load_config(workspace: &Workspace) -> Result<StackConfig, ConfigError> {
    let path = workspace.config_file();
    if !path.exists() {
        debug!("no config at {}, initializing defaults", path.display());
        let config = StackConfig::default();
        save_config(workspace, &config)?;
        return Ok(config);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config: StackConfig =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
    config.validate()?;
    Ok(config)
}

/// Save the configuration as pretty-printed JSON.
pub fn save_config(workspace: &Workspace, config: &StackConfig) -> Result<(), ConfigError> {
    let path = workspace.config_file();
    let json = serde_json::to_string_pretty(config)
        .map_err(|source| ConfigError::Serialize { source })?;
    debug!("saving config to {}", path.display());
    std::fs::write(&path, json).map_err(|source| ConfigError::Write { path, source })
}
