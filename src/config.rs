use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_FB_ACCESS_TOKEN: &str = "FB_ACCESS_TOKEN";
pub const ENV_FB_PAGE_ID: &str = "FB_PAGE_ID";
pub const ENV_DASHBOARD_URL: &str = "DASHBOARD_URL";
pub const ENV_DASHBOARD_CSRF_TOKEN: &str = "DASHBOARD_CSRF_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub base_url: String,
    pub version: String,
    /// Page access token. Prefer the FB_ACCESS_TOKEN environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            version: "v2.8".to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            csrf_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub default_page: Option<String>,
    pub description_preview_chars: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_page: None,
            description_preview_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads the config from `path` or the per-user config dir, writing the
    /// defaults there first if the file does not exist yet.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(&config_path)?;
            info!("Wrote default config to {}", config_path.display());
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Environment variables win over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_var(ENV_FB_ACCESS_TOKEN) {
            self.graph.access_token = Some(token);
        }
        if let Some(page) = non_empty_var(ENV_FB_PAGE_ID) {
            self.import.default_page = Some(page);
        }
        if let Some(url) = non_empty_var(ENV_DASHBOARD_URL) {
            self.dashboard.base_url = url;
        }
        if let Some(token) = non_empty_var(ENV_DASHBOARD_CSRF_TOKEN) {
            self.dashboard.csrf_token = Some(token);
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Loads `.env` from the working directory if there is one.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => log::debug!("No .env file loaded: {}", e),
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "fbimport", "fbimport")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
