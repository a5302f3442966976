//! Fold an observed project back into configuration values.
//!
//! Two things make this more than a field copy:
//!
//! - metadata flags arrive as booleans, strings, numbers or not at all, and a
//!   single odd flag must not fail the whole read;
//! - the registry has no deployment-security field. The level is rebuilt from
//!   `severity` plus `prevent_vul`, and an inconsistent pair is written back as
//!   `""` so the next apply sets it again.

use crate::types::{DeploymentSecurity, ProjectState};
use crate::wire::{FlexValue, ProjectResponse};

/// Interpret a loosely typed flag, falling back to `default`.
///
/// # Example
///
/// ```
/// use harbor::normalize::parse_flexible_bool;
/// use harbor::wire::FlexValue;
///
/// assert!(parse_flexible_bool(Some(&FlexValue::Text("true".into())), false));
/// assert!(!parse_flexible_bool(Some(&FlexValue::Bool(false)), true));
/// assert!(parse_flexible_bool(None, true));
/// ```
#[must_use]
pub fn parse_flexible_bool(value: Option<&FlexValue>, default: bool) -> bool {
    let parsed = match value {
        None => return default,
        Some(FlexValue::Bool(flag)) => Some(*flag),
        Some(FlexValue::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => return default,
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Some(FlexValue::Number(number)) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Some(FlexValue::Other(serde_json::Value::Null)) => return default,
        Some(FlexValue::Other(_)) => None,
    };

    parsed.unwrap_or_else(|| {
        log::warn!("ignoring unparseable flag value {value:?}, using {default}");
        default
    })
}

/// Outcome of rebuilding deployment security from the two remote signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityDerivation {
    /// `severity = none` with prevention disabled.
    PassThroughNone,
    /// A real level with prevention enabled.
    PassThroughLevel(DeploymentSecurity),
    /// The pair disagrees; the stored value is cleared.
    Clear,
}

impl SecurityDerivation {
    /// Value written to [`ProjectState::deployment_security`].
    #[must_use]
    pub fn as_state_value(&self) -> &'static str {
        match self {
            Self::PassThroughNone => DeploymentSecurity::None.as_str(),
            Self::PassThroughLevel(level) => level.as_str(),
            Self::Clear => "",
        }
    }
}

/// Rebuild the deployment security level.
///
/// | severity | prevent_vul | result           |
/// |----------|-------------|------------------|
/// | none     | false       | PassThroughNone  |
/// | none     | true        | Clear            |
/// | level    | true        | PassThroughLevel |
/// | level    | false       | Clear            |
///
/// A severity outside the known levels is always cleared.
#[must_use]
pub fn derive_deployment_security(severity: &str, prevent_vul: bool) -> SecurityDerivation {
    let Some(level) = DeploymentSecurity::parse(severity.trim()) else {
        return SecurityDerivation::Clear;
    };

    match (level.is_none(), prevent_vul) {
        (true, false) => SecurityDerivation::PassThroughNone,
        (true, true) => SecurityDerivation::Clear,
        (false, true) => SecurityDerivation::PassThroughLevel(level),
        (false, false) => SecurityDerivation::Clear,
    }
}

/// Every value a read writes back into state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProject {
    pub name: String,
    pub project_id: i64,
    pub registry_id: i64,
    pub public: bool,
    pub vulnerability_scanning: bool,
    pub enable_content_trust: bool,
    pub enable_content_trust_cosign: bool,
    pub auto_sbom_generation: bool,
    pub deployment_security: SecurityDerivation,
    pub cve_allowlist: Vec<String>,
}

/// Normalize an observed project.
///
/// The registry omits disabled flags, so every absent flag reads as `false`.
#[must_use]
pub fn normalize(observed: &ProjectResponse) -> NormalizedProject {
    let metadata = &observed.metadata;
    let flag = |value: &Option<FlexValue>| parse_flexible_bool(value.as_ref(), false);

    let severity = metadata
        .severity
        .as_ref()
        .and_then(FlexValue::as_text)
        .unwrap_or_default();
    let deployment_security = derive_deployment_security(severity, flag(&metadata.prevent_vul));
    if deployment_security == SecurityDerivation::Clear && !severity.is_empty() {
        log::warn!(
            "project {}: severity {severity:?} disagrees with prevent_vul, deployment_security cleared",
            observed.name
        );
    }

    NormalizedProject {
        name: observed.name.clone(),
        project_id: observed.project_id,
        registry_id: observed.registry_id,
        public: flag(&metadata.public),
        vulnerability_scanning: flag(&metadata.auto_scan),
        enable_content_trust: flag(&metadata.enable_content_trust),
        enable_content_trust_cosign: flag(&metadata.enable_content_trust_cosign),
        auto_sbom_generation: flag(&metadata.auto_sbom_generation),
        deployment_security,
        cve_allowlist: observed
            .cve_allowlist
            .items
            .iter()
            .map(|item| item.cve_id.clone())
            .collect(),
    }
}

impl NormalizedProject {
    /// Write every derived field into state. Identity and local-only fields
    /// are left untouched.
    pub fn write_into(self, state: &mut ProjectState) {
        state.name = self.name;
        state.project_id = self.project_id;
        state.registry_id = self.registry_id;
        state.public = self.public;
        state.vulnerability_scanning = self.vulnerability_scanning;
        state.enable_content_trust = self.enable_content_trust;
        state.enable_content_trust_cosign = self.enable_content_trust_cosign;
        state.auto_sbom_generation = self.auto_sbom_generation;
        state.deployment_security = self.deployment_security.as_state_value().to_string();
        state.cve_allowlist = self.cve_allowlist;
    }
}
