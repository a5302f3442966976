//! Wire shapes of the registry's project API.
//!
//! Outbound bodies are strictly typed. Inbound metadata is not: the registry
//! reports flags as `"true"`/`"false"` strings, literal booleans, or omits them
//! entirely, so every metadata value is a [`FlexValue`] and interpretation is
//! left to [`crate::normalize`].

use crate::error::{Error, Result};
use crate::types::ProjectConfig;
use serde::{Deserialize, Serialize};

/// API prefixes stripped from `Location` headers to form an identity.
const API_PREFIXES: &[&str] = &["/api/v2.0", "/api"];

/// Outbound project body for create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBody {
    pub project_name: String,
    pub public: bool,
    pub metadata: MetadataBody,
    /// Only sent when creating; quota changes go through the quota endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<i64>,
    /// Only sent when creating; the registry ignores it afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<i64>,
    pub cve_allowlist: CveAllowlist,
}

/// Project metadata as the registry expects it: every value is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataBody {
    pub public: String,
    pub auto_scan: String,
    pub severity: String,
    pub prevent_vul: String,
    pub enable_content_trust: String,
    pub enable_content_trust_cosign: String,
    pub auto_sbom_generation: String,
    pub reuse_sys_cve_allowlist: String,
}

/// CVE allow-list sub-record, shared by request and response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveAllowlist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CveItem>,
}

/// One allow-listed CVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveItem {
    pub cve_id: String,
}

impl ProjectBody {
    /// Body for `POST /projects`, including the creation-only fields.
    #[must_use]
    pub fn for_create(config: &ProjectConfig) -> Self {
        Self {
            storage_limit: Some(config.storage_quota),
            registry_id: config.registry_id,
            ..Self::for_update(config)
        }
    }

    /// Body for `PUT <identity>`.
    ///
    /// The registry applies replace semantics, so every mutable field is
    /// always populated from the config. An unset `deployment_security` is
    /// sent as the registry default (`severity = "low"`, `prevent_vul =
    /// false`) rather than omitted, so the remote value is reset to that
    /// default on every update.
    #[must_use]
    pub fn for_update(config: &ProjectConfig) -> Self {
        let (severity, prevent_vul) = match config.deployment_security {
            Some(level) if level.is_none() => (level.as_str(), false),
            Some(level) => (level.as_str(), true),
            // The registry's own default pair. It is inconsistent, so it
            // reads back as unset.
            None => ("low", false),
        };

        Self {
            project_name: config.name.clone(),
            public: config.public,
            metadata: MetadataBody {
                public: config.public.to_string(),
                auto_scan: config.vulnerability_scanning.to_string(),
                severity: severity.to_string(),
                prevent_vul: prevent_vul.to_string(),
                enable_content_trust: config.enable_content_trust.to_string(),
                enable_content_trust_cosign: config.enable_content_trust_cosign.to_string(),
                auto_sbom_generation: config.auto_sbom_generation.to_string(),
                reuse_sys_cve_allowlist: config.cve_allowlist.is_empty().to_string(),
            },
            storage_limit: None,
            registry_id: None,
            cve_allowlist: CveAllowlist {
                items: config
                    .cve_allowlist
                    .iter()
                    .map(|cve| CveItem {
                        cve_id: cve.clone(),
                    })
                    .collect(),
            },
        }
    }

    /// Encode as a JSON value for the transport.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A metadata value as the registry happens to encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Anything else (arrays, objects); never fails the decode.
    Other(serde_json::Value),
}

impl FlexValue {
    /// String view, for values that are meant to be strings.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Observed project as returned by `GET <identity>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectResponse {
    pub project_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub registry_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ProjectMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cve_allowlist: CveAllowlist,
}

/// Loosely typed project metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub public: Option<FlexValue>,
    #[serde(default)]
    pub auto_scan: Option<FlexValue>,
    #[serde(default)]
    pub severity: Option<FlexValue>,
    #[serde(default)]
    pub prevent_vul: Option<FlexValue>,
    #[serde(default)]
    pub enable_content_trust: Option<FlexValue>,
    #[serde(default)]
    pub enable_content_trust_cosign: Option<FlexValue>,
    #[serde(default)]
    pub auto_sbom_generation: Option<FlexValue>,
}

/// Parse a project response body.
///
/// Fails with [`Error::Decode`] when the body is not a project record. Callers
/// treat that as a hard failure, never as "not found".
pub fn parse_response(bytes: &[u8]) -> Result<ProjectResponse> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}

/// Turn a `Location` header into the identity used for later requests.
///
/// Accepts both absolute URLs and paths, and strips the API prefix, so
/// `https://registry/api/v2.0/projects/12` becomes `/projects/12`.
#[must_use]
pub fn identity_from_location(location: &str) -> Option<String> {
    let location = location.trim();
    let path = match location.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |slash| &rest[slash..]),
        None => location,
    };

    let identity = API_PREFIXES
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix))
        .unwrap_or(path)
        .trim_end_matches('/');

    (identity.starts_with('/') && identity.len() > 1).then(|| identity.to_string())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
