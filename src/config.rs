use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the schedule API, e.g. `https://horarios.example.com`.
    pub base_url: String,
    #[serde(default)]
    pub allow_insecure_certs: bool,
    /// Overrides the platform cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub paths: Endpoints,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub regular: String,
    pub exceptions: String,
    pub eventual: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            regular: "/api/regular".to_string(),
            exceptions: "/api/excepcion".to_string(),
            eventual: "/api/eventual".to_string(),
        }
    }
}

impl Config {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            allow_insecure_certs: false,
            cache_dir: None,
            paths: Endpoints::default(),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tutorcal", "tutorcal").map(|proj| proj.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::default_path().context("No config directory on this platform")?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config at {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config at {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        Ok(config)
    }

    /// `base_url` joined with an endpoint path, without doubling the slash.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
