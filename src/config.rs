use anyhow::{Context, Result, bail};
use harbor::{ClientSettings, ProjectConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cli::RegistryArgs;

// ============================================================================
// Registry Config
// ============================================================================

/// `[registry]` table: how to reach the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Usually supplied through `HARBOR_PASSWORD` instead
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub api_path: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Regsync Config
// ============================================================================

/// Parsed `regsync.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegsyncConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Declared projects, one `[[project]]` table each
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectConfig>,
}

impl RegsyncConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!(
            "Loaded {} project(s) from {}",
            config.projects.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every project and reject duplicate names
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for project in &self.projects {
            project.validate()?;
            if !seen.insert(project.name.as_str()) {
                bail!("project {} is declared more than once", project.name);
            }
        }
        Ok(())
    }

    /// Find a declared project by name
    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Connection settings, with command-line and environment values winning
    pub fn client_settings(&self, overrides: &RegistryArgs) -> Result<ClientSettings> {
        let registry = &self.registry;
        let Some(url) = overrides.url.clone().or_else(|| registry.url.clone()) else {
            bail!("registry url is not set (use [registry].url, --url or HARBOR_URL)");
        };
        let Some(username) = overrides
            .username
            .clone()
            .or_else(|| registry.username.clone())
        else {
            bail!("registry username is not set (use [registry].username, --username or HARBOR_USERNAME)");
        };
        let Some(password) = overrides
            .password
            .clone()
            .or_else(|| registry.password.clone())
        else {
            bail!("registry password is not set (use --password or HARBOR_PASSWORD)");
        };

        let mut settings = ClientSettings::new(url, username, password);
        settings.insecure = overrides.insecure || registry.insecure;
        if let Some(api_path) = &registry.api_path {
            settings.api_path = api_path.clone();
        }
        if let Some(secs) = registry.timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        settings.validate()?;
        Ok(settings)
    }
}
