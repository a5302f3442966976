//! Storage quota of a project.
//!
//! The project endpoint only accepts a quota at creation. Later changes go
//! through the quota record the registry keeps per project.

use crate::error::{Error, Result};
use crate::transport::{Request, Transport};
use crate::types::ProjectConfig;
use serde::Deserialize;

/// Quota operations the reconciler depends on.
pub trait StorageQuota: Send + Sync {
    /// Bring the quota of the project at `identity` in line with `config`.
    ///
    /// A no-op when the registry already holds the desired value.
    fn update_storage_quota(&self, config: &ProjectConfig, identity: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct QuotaRecord {
    id: i64,
    #[serde(default)]
    hard: QuotaLimits,
}

#[derive(Debug, Default, Deserialize)]
struct QuotaLimits {
    storage: Option<i64>,
}

/// Numeric project id at the end of an identity such as `/projects/12`.
pub fn project_id_from_identity(identity: &str) -> Result<i64> {
    identity
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| Error::Decode(format!("identity {identity:?} does not end in a project id")))
}

/// Look up the project's quota record and update it when it differs.
pub fn update_storage_quota(
    transport: &dyn Transport,
    config: &ProjectConfig,
    identity: &str,
) -> Result<()> {
    let project_id = project_id_from_identity(identity)?;
    let response = transport.send(&Request::get(
        format!("/quotas?reference=project&reference_id={project_id}"),
        200,
    ))?;
    let records: Vec<QuotaRecord> = serde_json::from_str(&response.body)?;

    let Some(record) = records.first() else {
        log::debug!("project {}: no quota record", config.name);
        return Ok(());
    };

    if record.hard.storage == Some(config.storage_quota) {
        log::debug!("project {}: quota already {}", config.name, config.storage_quota);
        return Ok(());
    }

    log::info!(
        "project {}: storage quota {} -> {}",
        config.name,
        record.hard.storage.unwrap_or(crate::types::UNLIMITED_QUOTA),
        config.storage_quota
    );
    let body = serde_json::json!({ "hard": { "storage": config.storage_quota } });
    transport.send(&Request::put(format!("/quotas/{}", record.id), body, 200))?;
    Ok(())
}
