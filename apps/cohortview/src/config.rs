//! # Configuration Module
//!
//! Application settings, resolved in three layers (last wins):
//!
//! 1. TOML file: `--config <path>`, else `COHORTVIEW_CONFIG`, else
//!    `./cohortview.toml` when it exists, else built-in defaults
//! 2. Environment: `COHORTVIEW_RATE_LIMIT`, `COHORTVIEW_CORS_ORIGINS`
//! 3. CLI flags (`server --host/--port`), applied by the CLI
//!
//! ## Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8501
//! rate_limit = 50
//! cors_origins = ["http://lab.example.org"]
//!
//! [dashboard]
//! title = "Wuzhishan pig biochemistry"
//! team = ["Study coordination", "Veterinary care", "Biochemistry lab"]
//! contact_email = "cohort@example.org"
//! ```

use cohortview_core::CohortError;
use cohortview_core::primitives::MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cohortview.toml";

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body; leaves room for multipart framing around an upload.
    pub body_limit_bytes: usize,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Allowed CORS origins; `["*"]` allows all, `None` means localhost only.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            body_limit_bytes: MAX_UPLOAD_BYTES + 1024 * 1024,
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

/// Dashboard content settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Lines shown on the team page.
    pub team: Vec<String>,
    /// Address shown on the contact page.
    pub contact_email: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Cohort biochemical metrics".to_string(),
            team: Vec::new(),
            contact_email: None,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, CohortError> {
        toml::from_str(text).map_err(|e| CohortError::IoError(format!("Invalid config: {}", e)))
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CohortError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CohortError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve the configuration file and environment overrides.
    ///
    /// An explicit path must exist; the implicit default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CohortError> {
        let env_path = std::env::var("COHORTVIEW_CONFIG").ok().map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                tracing::info!(path = DEFAULT_CONFIG_FILE, "Loading configuration");
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Some(limit) = std::env::var("COHORTVIEW_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.server.rate_limit = limit;
        }

        if let Ok(origins) = std::env::var("COHORTVIEW_CORS_ORIGINS") {
            self.server.cors_origins = Some(parse_origin_list(&origins));
        }
    }

    /// Socket address string for the server.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
