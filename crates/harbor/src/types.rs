//! Core types for project reconciliation.
//!
//! [`ProjectConfig`] is what the user declares, [`ProjectState`] is what gets
//! persisted between runs. The two overlap but are not the same: the state
//! carries the registry-assigned identity and numeric ids, and its
//! `deployment_security` may be cleared to `""` when the registry reports an
//! inconsistent combination.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Storage quota meaning "no limit".
pub const UNLIMITED_QUOTA: i64 = -1;

static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("project name pattern is valid")
});

/// Severity threshold above which vulnerable images are blocked from pulling.
///
/// # Example
///
/// ```
/// use harbor::DeploymentSecurity;
///
/// let level: DeploymentSecurity = "high".parse().unwrap();
/// assert_eq!(level, DeploymentSecurity::High);
/// assert!(DeploymentSecurity::None.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentSecurity {
    /// Nothing is blocked.
    None,
    /// Block images with low or worse vulnerabilities.
    Low,
    /// Block images with medium or worse vulnerabilities.
    Medium,
    /// Block images with high or worse vulnerabilities.
    High,
    /// Block images with critical vulnerabilities.
    Critical,
}

impl DeploymentSecurity {
    /// All accepted levels, in increasing strictness.
    #[must_use]
    pub fn all() -> &'static [DeploymentSecurity] {
        &[
            Self::None,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::Critical,
        ]
    }

    /// Wire and configuration spelling of this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether this is the `none` level.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Parse a level name, ignoring ASCII case; `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for DeploymentSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeploymentSecurity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            let allowed: Vec<&str> = Self::all().iter().map(DeploymentSecurity::as_str).collect();
            Error::InvalidConfig(format!(
                "deployment_security must be one of [{}], got {s}",
                allowed.join(", ")
            ))
        })
    }
}

/// Desired configuration of a registry project.
///
/// Field defaults follow the registry's own defaults, so a config that only
/// names the project produces a private project with scanning enabled and no
/// quota.
///
/// # Example
///
/// ```
/// use harbor::{DeploymentSecurity, ProjectConfig};
///
/// let config = ProjectConfig::new("team-a")
///     .cve_allowlist(vec!["CVE-2023-1234".to_string()])
///     .deployment_security(Some(DeploymentSecurity::High));
///
/// assert!(config.vulnerability_scanning);
/// assert_eq!(config.storage_quota, -1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name. Changing it recreates the project.
    pub name: String,

    /// Proxy-cache registry id. Only sent at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<i64>,

    /// Whether anonymous users can pull.
    #[serde(default)]
    pub public: bool,

    /// Scan images automatically on push.
    #[serde(default = "default_true")]
    pub vulnerability_scanning: bool,

    /// Storage quota in bytes, `-1` for unlimited.
    #[serde(default = "default_storage_quota")]
    pub storage_quota: i64,

    /// CVE ids exempted from deployment security, in declaration order.
    #[serde(default)]
    pub cve_allowlist: Vec<String>,

    /// Only allow signed images (Notary).
    #[serde(default)]
    pub enable_content_trust: bool,

    /// Only allow images signed with cosign.
    #[serde(default)]
    pub enable_content_trust_cosign: bool,

    /// Delete all repositories when the project is destroyed. Never sent.
    #[serde(default)]
    pub force_destroy: bool,

    /// Generate an SBOM automatically on push.
    #[serde(default)]
    pub auto_sbom_generation: bool,

    /// Block vulnerable images at or above this severity; unset inherits.
    #[serde(default, with = "optional_security")]
    pub deployment_security: Option<DeploymentSecurity>,
}

fn default_true() -> bool {
    true
}

fn default_storage_quota() -> i64 {
    UNLIMITED_QUOTA
}

impl ProjectConfig {
    /// Create a config with registry defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry_id: None,
            public: false,
            vulnerability_scanning: true,
            storage_quota: UNLIMITED_QUOTA,
            cve_allowlist: Vec::new(),
            enable_content_trust: false,
            enable_content_trust_cosign: false,
            force_destroy: false,
            auto_sbom_generation: false,
            deployment_security: None,
        }
    }

    /// Rebuild the minimal config needed to delete a project known only from state.
    #[must_use]
    pub fn from_state(state: &ProjectState) -> Self {
        Self {
            storage_quota: state.storage_quota,
            force_destroy: state.force_destroy,
            ..Self::new(state.name.clone())
        }
    }

    /// Set whether the project is public.
    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Set the storage quota in bytes.
    pub fn storage_quota(mut self, bytes: i64) -> Self {
        self.storage_quota = bytes;
        self
    }

    /// Set the proxy-cache registry id.
    pub fn registry_id(mut self, id: i64) -> Self {
        self.registry_id = Some(id);
        self
    }

    /// Set the CVE allow-list.
    pub fn cve_allowlist(mut self, cves: Vec<String>) -> Self {
        self.cve_allowlist = cves;
        self
    }

    /// Set whether destroy cascades to repositories.
    pub fn force_destroy(mut self, force: bool) -> Self {
        self.force_destroy = force;
        self
    }

    /// Set the deployment security level.
    pub fn deployment_security(mut self, level: Option<DeploymentSecurity>) -> Self {
        self.deployment_security = level;
        self
    }

    /// Check the config before anything is sent to the registry.
    pub fn validate(&self) -> Result<()> {
        if !PROJECT_NAME.is_match(&self.name) {
            return Err(Error::InvalidConfig(format!(
                "project name {:?} must be lowercase alphanumerics separated by '.', '_' or '-'",
                self.name
            )));
        }
        if self.storage_quota != UNLIMITED_QUOTA && self.storage_quota <= 0 {
            return Err(Error::InvalidConfig(format!(
                "project {}: storage_quota must be -1 or positive, got {}",
                self.name, self.storage_quota
            )));
        }
        if let Some(blank) = self.cve_allowlist.iter().position(|cve| cve.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "project {}: cve_allowlist entry {blank} is empty",
                self.name
            )));
        }
        Ok(())
    }
}

/// Persisted state of one project, written by the reconciler.
///
/// `id` is the identity assigned at creation (e.g. `/projects/12`); `None`
/// means the project does not exist remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Identity used for every read, update and delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub registry_id: i64,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub vulnerability_scanning: bool,
    #[serde(default)]
    pub enable_content_trust: bool,
    #[serde(default)]
    pub enable_content_trust_cosign: bool,
    #[serde(default)]
    pub auto_sbom_generation: bool,
    /// Derived level, or `""` when the registry reports an inconsistent pair.
    #[serde(default)]
    pub deployment_security: String,
    #[serde(default)]
    pub cve_allowlist: Vec<String>,
    /// Last applied quota; the project endpoint never reports it.
    #[serde(default = "default_storage_quota")]
    pub storage_quota: i64,
    /// Last applied cascade flag, local only.
    #[serde(default)]
    pub force_destroy: bool,
}

impl ProjectState {
    /// Empty state for a project that has not been created yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            project_id: 0,
            registry_id: 0,
            public: false,
            vulnerability_scanning: false,
            enable_content_trust: false,
            enable_content_trust_cosign: false,
            auto_sbom_generation: false,
            deployment_security: String::new(),
            cve_allowlist: Vec::new(),
            storage_quota: UNLIMITED_QUOTA,
            force_destroy: false,
        }
    }

    /// State pointing at an existing identity, to be filled by a read.
    #[must_use]
    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(name)
        }
    }

    /// Whether the project exists remotely as far as state knows.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    /// Forget the identity after the project disappeared or was deleted.
    pub fn clear_identity(&mut self) {
        self.id = None;
    }

    /// Record the fields that the registry never reports back.
    pub fn record_local(&mut self, config: &ProjectConfig) {
        self.storage_quota = config.storage_quota;
        self.force_destroy = config.force_destroy;
    }
}

/// A repository inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Full name including the project prefix, e.g. `team-a/app`.
    pub name: String,
    #[serde(default)]
    pub artifact_count: u64,
}

impl Repository {
    /// Repository name without the `project/` prefix.
    #[must_use]
    pub fn short_name<'a>(&'a self, project: &str) -> &'a str {
        self.name
            .strip_prefix(project)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.name)
    }
}

/// `deployment_security` is written as `""` when unset, both in config files
/// and in state.
mod optional_security {
    use super::DeploymentSecurity;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DeploymentSecurity>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map_or("", |level| level.as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DeploymentSecurity>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_security_parse() {
        assert_eq!(DeploymentSecurity::parse("none"), Some(DeploymentSecurity::None));
        assert_eq!(
            DeploymentSecurity::parse("critical"),
            Some(DeploymentSecurity::Critical)
        );
        assert_eq!(DeploymentSecurity::parse("High"), Some(DeploymentSecurity::High));
        assert_eq!(DeploymentSecurity::parse(""), None);
    }

    #[test]
    fn test_deployment_security_from_str_error_lists_levels() {
        let err = "severe".parse::<DeploymentSecurity>().unwrap_err();
        let display = err.to_string();
        assert!(display.contains("none, low, medium, high, critical"));
        assert!(display.contains("severe"));
    }

    #[test]
    fn test_config_defaults() {
        let config = ProjectConfig::new("team-a");
        assert!(!config.public);
        assert!(config.vulnerability_scanning);
        assert_eq!(config.storage_quota, UNLIMITED_QUOTA);
        assert!(config.cve_allowlist.is_empty());
        assert!(!config.force_destroy);
        assert_eq!(config.deployment_security, None);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: ProjectConfig = serde_json::from_str(r#"{"name":"team-a"}"#).unwrap();
        assert_eq!(config, ProjectConfig::new("team-a"));
    }

    #[test]
    fn test_config_deserialize_security() {
        let config: ProjectConfig =
            serde_json::from_str(r#"{"name":"a","deployment_security":"medium"}"#).unwrap();
        assert_eq!(config.deployment_security, Some(DeploymentSecurity::Medium));

        let config: ProjectConfig =
            serde_json::from_str(r#"{"name":"a","deployment_security":""}"#).unwrap();
        assert_eq!(config.deployment_security, None);

        let result: std::result::Result<ProjectConfig, _> =
            serde_json::from_str(r#"{"name":"a","deployment_security":"extreme"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialize_unset_security_as_empty() {
        let json = serde_json::to_value(ProjectConfig::new("a")).unwrap();
        assert_eq!(json["deployment_security"], "");
    }

    #[test]
    fn test_validate_name() {
        assert!(ProjectConfig::new("team-a").validate().is_ok());
        assert!(ProjectConfig::new("team.a_b-c").validate().is_ok());
        assert!(ProjectConfig::new("Team").validate().is_err());
        assert!(ProjectConfig::new("-team").validate().is_err());
        assert!(ProjectConfig::new("").validate().is_err());
    }

    #[test]
    fn test_validate_quota() {
        assert!(ProjectConfig::new("a").storage_quota(1024).validate().is_ok());
        assert!(ProjectConfig::new("a").storage_quota(0).validate().is_err());
        assert!(ProjectConfig::new("a").storage_quota(-5).validate().is_err());
    }

    #[test]
    fn test_validate_blank_cve() {
        let config = ProjectConfig::new("a").cve_allowlist(vec![
            "CVE-2023-1".to_string(),
            " ".to_string(),
        ]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_state_identity() {
        let mut state = ProjectState::with_id("team-a", "/projects/7");
        assert!(state.is_present());
        state.clear_identity();
        assert!(!state.is_present());
        assert_eq!(state.name, "team-a");
    }

    #[test]
    fn test_state_record_local() {
        let mut state = ProjectState::new("a");
        state.record_local(&ProjectConfig::new("a").storage_quota(2048).force_destroy(true));
        assert_eq!(state.storage_quota, 2048);
        assert!(state.force_destroy);

        let config = ProjectConfig::from_state(&state);
        assert_eq!(config.name, "a");
        assert!(config.force_destroy);
    }

    #[test]
    fn test_repository_short_name() {
        let repo = Repository {
            name: "team-a/tools/app".to_string(),
            artifact_count: 1,
        };
        assert_eq!(repo.short_name("team-a"), "tools/app");
        assert_eq!(repo.short_name("other"), "team-a/tools/app");
    }
}
