use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use stratus::search::{DEFAULT_API_VERSION, DEFAULT_REGION};
use stratus::{Mode, SearchDomain};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_TIMEOUT_SECS};

// =============================================================================
// File Configuration
// =============================================================================

/// Domain configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DomainFileConfig {
    pub name: Option<String>,
    pub region: Option<String>,
    pub api_version: Option<String>,
}

/// HTTP configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HttpFileConfig {
    pub timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub domain: Option<DomainFileConfig>,
    pub http: Option<HttpFileConfig>,
    pub sandbox: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of keys not recognised at the top level
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(domain) = other.domain {
            let current = self.domain.get_or_insert_with(DomainFileConfig::default);
            if domain.name.is_some() {
                tracing::trace!(name = ?domain.name, "Merging domain.name");
                current.name = domain.name;
            }
            if domain.region.is_some() {
                tracing::trace!(region = ?domain.region, "Merging domain.region");
                current.region = domain.region;
            }
            if domain.api_version.is_some() {
                tracing::trace!(api_version = ?domain.api_version, "Merging domain.api_version");
                current.api_version = domain.api_version;
            }
        }

        if let Some(http) = other.http {
            let current = self.http.get_or_insert_with(HttpFileConfig::default);
            if http.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?http.timeout_secs, "Merging http.timeout_secs");
                current.timeout_secs = http.timeout_secs;
            }
        }

        if other.sandbox.is_some() {
            tracing::trace!(sandbox = ?other.sandbox, "Merging sandbox");
            self.sandbox = other.sandbox;
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub name: String,
    pub region: String,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration after layering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub domain: DomainConfig,
    pub http: HttpConfig,
    pub sandbox: bool,
}

impl AppConfig {
    /// Load configuration with precedence (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.stratus/stratus.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layered(cli, get_profile_config_path(), PathBuf::from(CONFIG_FILE_NAME))
    }

    fn load_layered(cli: &CliConfig, profile_path: Option<PathBuf>, local: PathBuf) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile config - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else if local.exists() {
            Some(local)
        } else {
            None
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_domain = file_config.domain.unwrap_or_default();
        let file_http = file_config.http.unwrap_or_default();

        let config = Self {
            domain: DomainConfig {
                name: cli.domain.clone().or(file_domain.name).unwrap_or_default(),
                region: cli
                    .region
                    .clone()
                    .or(file_domain.region)
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                api_version: cli
                    .api_version
                    .clone()
                    .or(file_domain.api_version)
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            },
            http: HttpConfig {
                timeout_secs: cli
                    .timeout
                    .or(file_http.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            sandbox: cli.sandbox.or(file_config.sandbox).unwrap_or(false),
        };

        config.validate()?;
        tracing::debug!(
            domain = %config.domain.name,
            region = %config.domain.region,
            sandbox = config.sandbox,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.domain.name.trim().is_empty() {
            anyhow::bail!(
                "Configuration error: domain.name must be set (--domain or STRATUS_DOMAIN)"
            );
        }
        if self.domain.region.trim().is_empty() {
            anyhow::bail!("Configuration error: domain.region must not be empty");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("Configuration error: http.timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn search_domain(&self) -> SearchDomain {
        SearchDomain::new(&self.domain.name)
            .with_region(&self.domain.region)
            .with_api_version(&self.domain.api_version)
    }

    pub fn mode(&self) -> Mode {
        if self.sandbox { Mode::Sandbox } else { Mode::Live }
    }
}

/// Get the profile config path (~/.stratus/stratus.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_domain() -> CliConfig {
        CliConfig {
            domain: Some("movies".to_string()),
            ..CliConfig::default()
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "domain": { "name": "movies", "region": "us-west-2", "api_version": "2011-02-01" },
            "http": { "timeout_secs": 5 },
            "sandbox": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let domain = config.domain.as_ref().unwrap();
        assert_eq!(domain.name.as_deref(), Some("movies"));
        assert_eq!(domain.region.as_deref(), Some("us-west-2"));
        assert_eq!(domain.api_version.as_deref(), Some("2011-02-01"));
        assert_eq!(config.http.as_ref().unwrap().timeout_secs, Some(5));
        assert_eq!(config.sandbox, Some(true));
        assert!(config.unknown_fields().is_empty());
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.domain.is_none());
        assert!(config.http.is_none());
        assert!(config.sandbox.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "domain": { "name": "movies" }, "regoin": "eu-west-1" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.unknown_fields(), vec!["regoin"]);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            domain: Some(DomainFileConfig {
                name: Some("movies".to_string()),
                region: Some("us-west-2".to_string()),
                api_version: None,
            }),
            ..FileConfig::default()
        };
        let overlay = FileConfig {
            domain: Some(DomainFileConfig {
                name: None,
                region: Some("eu-west-1".to_string()),
                api_version: None,
            }),
            http: Some(HttpFileConfig {
                timeout_secs: Some(3),
            }),
            sandbox: Some(true),
            ..FileConfig::default()
        };
        base.merge(overlay);

        let domain = base.domain.unwrap();
        assert_eq!(domain.name.as_deref(), Some("movies"));
        assert_eq!(domain.region.as_deref(), Some("eu-west-1"));
        assert_eq!(base.http.unwrap().timeout_secs, Some(3));
        assert_eq!(base.sandbox, Some(true));
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config =
            AppConfig::load_layered(&cli_with_domain(), None, dir.path().join("absent.json"))
                .unwrap();
        assert_eq!(config.domain.region, DEFAULT_REGION);
        assert_eq!(config.domain.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.http.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.sandbox);
        assert_eq!(config.mode(), Mode::Live);
    }

    #[test]
    fn test_layer_precedence() {
        let dir = TempDir::new().unwrap();
        let profile = write(
            &dir,
            "profile.json",
            r#"{ "domain": { "name": "profile", "region": "us-west-2" }, "http": { "timeout_secs": 9 } }"#,
        );
        let local = write(
            &dir,
            "local.json",
            r#"{ "domain": { "name": "local" }, "sandbox": true }"#,
        );

        let config =
            AppConfig::load_layered(&CliConfig::default(), Some(profile.clone()), local.clone())
                .unwrap();
        assert_eq!(config.domain.name, "local");
        assert_eq!(config.domain.region, "us-west-2");
        assert_eq!(config.http.timeout_secs, 9);
        assert!(config.sandbox);

        let cli = CliConfig {
            domain: Some("cli".to_string()),
            timeout: Some(1),
            sandbox: Some(false),
            ..CliConfig::default()
        };
        let config = AppConfig::load_layered(&cli, Some(profile), local).unwrap();
        assert_eq!(config.domain.name, "cli");
        assert_eq!(config.domain.region, "us-west-2");
        assert_eq!(config.http.timeout_secs, 1);
        assert!(!config.sandbox);
    }

    #[test]
    fn test_explicit_config_replaces_local() {
        let dir = TempDir::new().unwrap();
        let local = write(&dir, "local.json", r#"{ "domain": { "name": "local" } }"#);
        let explicit = write(&dir, "explicit.json", r#"{ "domain": { "name": "explicit" } }"#);

        let cli = CliConfig {
            config: Some(explicit),
            ..CliConfig::default()
        };
        let config = AppConfig::load_layered(&cli, None, local).unwrap();
        assert_eq!(config.domain.name, "explicit");
    }

    #[test]
    fn test_explicit_config_missing() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("nope.json")),
            ..cli_with_domain()
        };
        let err = AppConfig::load_layered(&cli, None, dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().starts_with("Config file not found"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let local = write(&dir, "local.json", "{ not json");
        let err = AppConfig::load_layered(&cli_with_domain(), None, local).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_validate_requires_domain() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load_layered(&CliConfig::default(), None, dir.path().join("x.json"))
            .unwrap_err();
        assert!(err.to_string().contains("domain.name must be set"));
    }

    #[test]
    fn test_validate_rejects_empty_region_and_zero_timeout() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("x.json");

        let cli = CliConfig {
            region: Some(" ".to_string()),
            ..cli_with_domain()
        };
        let err = AppConfig::load_layered(&cli, None, absent.clone()).unwrap_err();
        assert!(err.to_string().contains("domain.region"));

        let cli = CliConfig {
            timeout: Some(0),
            ..cli_with_domain()
        };
        let err = AppConfig::load_layered(&cli, None, absent).unwrap_err();
        assert!(err.to_string().contains("http.timeout_secs"));
    }

    #[test]
    fn test_search_domain_and_mode() {
        let config = AppConfig {
            domain: DomainConfig {
                name: "movies".to_string(),
                region: "eu-west-1".to_string(),
                api_version: "2013-01-01".to_string(),
            },
            http: HttpConfig { timeout_secs: 2 },
            sandbox: true,
        };
        assert_eq!(
            config.search_domain().search_url().unwrap(),
            "http://search-movies.eu-west-1.cloudsearch.amazonaws.com/2013-01-01/search"
        );
        assert_eq!(config.mode(), Mode::Sandbox);
        assert_eq!(config.http.timeout(), Duration::from_secs(2));
    }
}
