// File: src/config.rs
// Purpose: Configuration parsing from folio.toml

use anyhow::{Context, Result};
use folio_router::LayoutPolicy;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

static GLOBAL: OnceCell<Config> = OnceCell::new();

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub dev: DevConfig,

    /// Free-form values exposed to templates as `{config.<key>}`
    #[serde(default)]
    pub app: BTreeMap<String, String>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directory containing the page tree (default: "pages")
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// Whether static segments match case-insensitively (default: false)
    #[serde(default)]
    pub case_insensitive: bool,

    /// Layout wrapping every page that does not declare one
    #[serde(default = "default_layout")]
    pub default_layout: String,

    /// Path rendered for unmatched requests (default: "/404")
    #[serde(default = "default_not_found_path")]
    pub not_found_path: String,

    /// Layout for the not-found page, falls back to `default_layout`
    #[serde(default)]
    pub not_found_layout: Option<String>,

    /// Request header marking a partial navigation fetch
    #[serde(default = "default_partial_header")]
    pub partial_header: String,

    /// Query parameter marking a partial navigation fetch
    #[serde(default = "default_partial_query")]
    pub partial_query: String,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Rebuild the catalog when the page tree changes
    #[serde(default)]
    pub hot_reload: bool,

    /// Quiet period before a rebuild, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default values
fn default_name() -> String {
    "folio-app".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_layout() -> String {
    "default".to_string()
}

fn default_not_found_path() -> String {
    "/404".to_string()
}

fn default_partial_header() -> String {
    "x-folio-partial".to_string()
}

fn default_partial_query() -> String {
    "partial".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            pages_dir: default_pages_dir(),
            case_insensitive: false,
            default_layout: default_layout(),
            not_found_path: default_not_found_path(),
            not_found_layout: None,
            partial_header: default_partial_header(),
            partial_query: default_partial_query(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            hot_reload: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl RoutingConfig {
    /// Layout defaults for the selector
    pub fn layout_policy(&self) -> LayoutPolicy {
        let policy = LayoutPolicy::new(self.default_layout.as_str());
        match &self.not_found_layout {
            Some(layout) => policy.with_not_found_layout(layout.as_str()),
            None => policy,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Installs `config` as the process-wide configuration
    ///
    /// The first call wins; later calls return the installed value unchanged.
    pub fn install(config: Config) -> &'static Config {
        GLOBAL.get_or_init(|| config)
    }
}
