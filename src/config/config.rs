use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{QueryMode, QuerySubtype};

/// Placeholder backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "https://cx-rag-backend.onrender.com";

/// Environment variable that overrides the configured backend URL
pub const API_URL_ENV: &str = "CX_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub behavior: BehaviorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the answer service, without a trailing slash.
    /// Request timeouts are fixed by `ApiClient` and not configurable.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Mode used at startup: "general", "policy" or "complaint"
    pub default_mode: String,

    /// Document set for general queries: "both", "policy" or "complaint"
    pub default_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for icons
    pub use_glyphs: bool,

    /// Icons for different states (can be overridden)
    pub icons: IconConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub answer: String,
    pub sources: String,
    pub next_action: String,
    pub risk: String,
    pub confidence_high: String,
    pub confidence_other: String,
    pub online: String,
    pub offline: String,
    pub error: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            default_mode: QueryMode::General.as_str().to_string(),
            default_type: QuerySubtype::Both.as_str().to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            icons: IconConfig::default(),
        }
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            answer: "🤖".to_string(),
            sources: "📚".to_string(),
            next_action: "➡️".to_string(),
            risk: "⚠️".to_string(),
            confidence_high: "🟢".to_string(),
            confidence_other: "🟡".to_string(),
            online: "✅".to_string(),
            offline: "❌".to_string(),
            error: "❌".to_string(),
        }
    }
}

impl IconConfig {
    /// Get simple ASCII alternatives for terminals without glyph support
    pub fn simple() -> Self {
        Self {
            answer: "[A]".to_string(),
            sources: "[S]".to_string(),
            next_action: "[>]".to_string(),
            risk: "[!]".to_string(),
            confidence_high: "[+]".to_string(),
            confidence_other: "[~]".to_string(),
            online: "[OK]".to_string(),
            offline: "[X]".to_string(),
            error: "[X]".to_string(),
        }
    }
}

impl BehaviorConfig {
    /// Falls back to `General` when the configured value is not recognised
    pub fn mode(&self) -> QueryMode {
        self.default_mode.parse().unwrap_or_else(|e| {
            tracing::warn!(target: "config", "{}; using general", e);
            QueryMode::General
        })
    }

    pub fn subtype(&self) -> QuerySubtype {
        self.default_type.parse().unwrap_or_else(|e| {
            tracing::warn!(target: "config", "{}; using both", e);
            QuerySubtype::Both
        })
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.display.use_glyphs {
            config.display.icons = IconConfig::simple();
        }

        tracing::debug!(target: "config", "Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        crate::app_paths::AppPaths::config_file()
    }

    /// Resolve the backend URL: explicit argument, then environment, then file
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url_with(cli_override, env_value.as_deref())
    }

    fn resolve_api_url_with(&self, cli_override: Option<&str>, env_value: Option<&str>) -> String {
        [cli_override, env_value, Some(self.api.base_url.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        format!(
            r#"# CX Query Configuration File
# Location: ~/.config/cx-query/config.toml (Linux)
#           ~/Library/Application Support/cx-query/config.toml (macOS)
#           %APPDATA%\cx-query\config.toml (Windows)

[api]
# Base URL of the answer service. The {env} environment variable
# and the --api-url argument take precedence over this value.
base_url = "{url}"

[behavior]
# Mode at startup: "general", "policy" or "complaint"
default_mode = "general"

# Document set for general queries: "both", "policy" or "complaint"
default_type = "both"

[display]
# Use Unicode glyphs for icons
# Set to false for ASCII-only mode (better compatibility)
use_glyphs = true
"#,
            env = API_URL_ENV,
            url = DEFAULT_API_URL,
        )
    }

    /// Initialize config with a setup wizard
    pub fn init_wizard() -> Result<Self> {
        println!("CX Query Configuration Setup");
        println!("============================");

        let mut config = Config::default();

        print!("Answer service URL [{}]: ", DEFAULT_API_URL);
        std::io::Write::flush(&mut std::io::stdout())?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().is_empty() {
            config.api.base_url = input.trim().trim_end_matches('/').to_string();
        }

        print!("Does your terminal support Unicode icons? (y/n) [y]: ");
        std::io::Write::flush(&mut std::io::stdout())?;
        input.clear();
        std::io::stdin().read_line(&mut input)?;
        config.display.use_glyphs = !input.trim().eq_ignore_ascii_case("n");
        if !config.display.use_glyphs {
            config.display.icons = IconConfig::simple();
        }

        config.save()?;

        println!("\nConfiguration saved to: {:?}", Config::get_config_path()?);
        println!("You can edit this file directly to customize further.");

        Ok(config)
    }
}
