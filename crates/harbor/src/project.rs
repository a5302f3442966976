//! Create, read, update and delete of a single project.
//!
//! Each operation is a short, strictly ordered sequence of requests. Nothing
//! is rolled back: when a later step fails, the error is returned and whatever
//! already happened remotely stays, with `state` reflecting it (a created
//! project keeps its identity even if the allow-list write failed).

use crate::client::Client;
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::quota::StorageQuota;
use crate::repositories::Repositories;
use crate::transport::{Request, Transport};
use crate::types::{ProjectConfig, ProjectState};
use crate::wire::{ProjectBody, identity_from_location, parse_response};

const CREATED: u16 = 201;
const OK: u16 = 200;

/// Result of reading a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The project exists and state was refreshed from it.
    Present,
    /// The project is gone; the identity has been cleared.
    Absent,
}

/// Drives one project toward its declared configuration.
///
/// Borrows its collaborators, so one client can serve many reconcilers on
/// different threads.
pub struct ProjectReconciler<'a> {
    transport: &'a dyn Transport,
    repositories: &'a dyn Repositories,
    quota: &'a dyn StorageQuota,
}

impl<'a> ProjectReconciler<'a> {
    /// Reconciler using `client` for every collaborator.
    #[must_use]
    pub fn new(client: &'a Client) -> Self {
        Self {
            transport: client,
            repositories: client,
            quota: client,
        }
    }

    /// Reconciler with separately injected collaborators.
    #[must_use]
    pub fn with_collaborators(
        transport: &'a dyn Transport,
        repositories: &'a dyn Repositories,
        quota: &'a dyn StorageQuota,
    ) -> Self {
        Self {
            transport,
            repositories,
            quota,
        }
    }

    /// Create the project, then refresh `state` from the registry.
    ///
    /// A declared CVE allow-list is only honoured by an update, so a second
    /// write follows the create when the list is non-empty.
    pub fn create(&self, config: &ProjectConfig, state: &mut ProjectState) -> Result<ReadOutcome> {
        config.validate()?;
        log::info!("creating project {}", config.name);

        let body = ProjectBody::for_create(config).to_json()?;
        let response = self
            .transport
            .send(&Request::post("/projects", body.clone(), CREATED))?;

        let location = response.header("location");
        let identity = location
            .and_then(identity_from_location)
            .ok_or_else(|| Error::IdentityExtraction {
                location: location.map(str::to_string),
            })?;
        log::debug!("project {} created as {identity}", config.name);

        state.id = Some(identity.clone());
        state.name.clone_from(&config.name);
        state.record_local(config);

        if !config.cve_allowlist.is_empty() {
            log::info!(
                "setting CVE allow-list of {} ({} entries)",
                config.name,
                config.cve_allowlist.len()
            );
            self.transport.send(&Request::put(identity, body, OK))?;
        }

        self.read(state)
    }

    /// Refresh `state` from the registry.
    ///
    /// A 404 means the project was deleted out-of-band: the identity is
    /// cleared and [`ReadOutcome::Absent`] returned. Every other failure,
    /// including an unreadable body, is an error and leaves `state` untouched.
    pub fn read(&self, state: &mut ProjectState) -> Result<ReadOutcome> {
        let identity = identity_of(state)?;

        let response = match self.transport.send(&Request::get(identity, OK)) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                log::warn!("project {} no longer exists, dropping it from state", state.name);
                state.clear_identity();
                return Ok(ReadOutcome::Absent);
            }
            Err(e) => return Err(e),
        };

        let observed = parse_response(response.body.as_bytes())?;
        normalize(&observed).write_into(state);
        Ok(ReadOutcome::Present)
    }

    /// Replace every mutable field, sync the quota, then refresh `state`.
    ///
    /// The quota call is made on every update; it is itself a no-op when the
    /// registry already holds the value.
    pub fn update(&self, config: &ProjectConfig, state: &mut ProjectState) -> Result<ReadOutcome> {
        config.validate()?;
        let identity = identity_of(state)?;
        log::info!("updating project {}", config.name);

        let body = ProjectBody::for_update(config).to_json()?;
        self.transport.send(&Request::put(identity.clone(), body, OK))?;
        self.quota.update_storage_quota(config, &identity)?;
        state.record_local(config);

        self.read(state)
    }

    /// Delete the project.
    ///
    /// With `force_destroy` every repository is deleted first; without it a
    /// project that still has repositories is refused before anything is
    /// sent. A project that is already gone counts as deleted.
    pub fn delete(&self, config: &ProjectConfig, state: &mut ProjectState) -> Result<()> {
        let Some(identity) = state.id.clone() else {
            log::debug!("project {} has no identity, nothing to delete", config.name);
            return Ok(());
        };

        if config.force_destroy {
            log::info!("deleting all repositories of {}", config.name);
            self.repositories.delete_all_repositories(&config.name)?;
        } else {
            let repositories = self.repositories.list_repositories(&config.name)?;
            if !repositories.is_empty() {
                return Err(Error::NotEmpty {
                    project: config.name.clone(),
                    repositories: repositories.len(),
                });
            }
        }

        log::info!("deleting project {}", config.name);
        match self.transport.send(&Request::delete(identity, OK)) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                log::debug!("project {} was already deleted", config.name);
            }
            Err(e) => return Err(e),
        }

        state.clear_identity();
        Ok(())
    }
}

fn identity_of(state: &ProjectState) -> Result<String> {
    state.id.clone().ok_or_else(|| Error::MissingIdentity {
        project: state.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use crate::types::{DeploymentSecurity, Repository};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRepositories {
        existing: Vec<Repository>,
        fail_cascade: bool,
        cascaded: Mutex<Vec<String>>,
    }

    impl FakeRepositories {
        fn with(names: &[&str]) -> Self {
            Self {
                existing: names
                    .iter()
                    .map(|name| Repository {
                        name: (*name).to_string(),
                        artifact_count: 1,
                    })
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl Repositories for FakeRepositories {
        fn list_repositories(&self, _project: &str) -> Result<Vec<Repository>> {
            Ok(self.existing.clone())
        }

        fn delete_all_repositories(&self, project: &str) -> Result<()> {
            if self.fail_cascade {
                return Err(Error::transport("repository delete failed", Some(500)));
            }
            self.cascaded.lock().unwrap().push(project.to_string());
            Ok(())
        }
    }

    /// Records how many requests the transport had seen when the quota was
    /// synced, so tests can check ordering.
    struct FakeQuota {
        transport: MockTransport,
        calls: Mutex<Vec<(String, usize)>>,
        fail: bool,
    }

    impl FakeQuota {
        fn new(transport: &MockTransport) -> Self {
            Self {
                transport: transport.clone(),
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StorageQuota for FakeQuota {
        fn update_storage_quota(&self, _config: &ProjectConfig, identity: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((identity.to_string(), self.transport.requests().len()));
            if self.fail {
                return Err(Error::transport("quota update failed", Some(500)));
            }
            Ok(())
        }
    }

    fn project_json(id: i64, name: &str) -> String {
        serde_json::json!({
            "project_id": id,
            "name": name,
            "registry_id": 0,
            "metadata": {"public": "false", "auto_scan": "true", "severity": "low", "prevent_vul": "false"},
            "cve_allowlist": {"items": []}
        })
        .to_string()
    }

    #[test]
    fn test_create_without_allowlist_writes_once() {
        let mock = MockTransport::new();
        mock.push_with_header(201, "", "Location", "/api/v2.0/projects/12");
        mock.push(200, project_json(12, "team-a"));
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::new("team-a");
        let outcome = reconciler
            .create(&ProjectConfig::new("team-a"), &mut state)
            .unwrap();

        assert_eq!(outcome, ReadOutcome::Present);
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, Method::Post);
        assert_eq!(writes[0].path, "/projects");
        assert_eq!(state.id.as_deref(), Some("/projects/12"));
        assert_eq!(state.project_id, 12);
        assert!(state.vulnerability_scanning);
        assert_eq!(state.deployment_security, "");
        assert!(quota.calls().is_empty());
    }

    #[test]
    fn test_create_with_allowlist_writes_twice() {
        let mock = MockTransport::new();
        mock.push_with_header(201, "", "location", "/api/v2.0/projects/12");
        mock.push(200, "");
        mock.push(200, project_json(12, "team-a"));
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let config = ProjectConfig::new("team-a")
            .cve_allowlist(vec!["CVE-2023-1234".to_string()])
            .deployment_security(Some(DeploymentSecurity::High));
        let mut state = ProjectState::new("team-a");
        reconciler.create(&config, &mut state).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].method, Method::Post);
        assert_eq!(writes[1].method, Method::Put);
        assert_eq!(writes[1].path, "/projects/12");
        assert_eq!(writes[0].body, writes[1].body);
    }

    #[test]
    fn test_create_without_location_fails() {
        let mock = MockTransport::new();
        mock.push(201, "");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::new("team-a");
        let err = reconciler
            .create(&ProjectConfig::new("team-a"), &mut state)
            .unwrap_err();

        assert!(matches!(err, Error::IdentityExtraction { location: None }));
        assert_eq!(mock.requests().len(), 1);
        assert!(!state.is_present());
    }

    #[test]
    fn test_create_allowlist_failure_keeps_identity() {
        let mock = MockTransport::new();
        mock.push_with_header(201, "", "location", "/api/v2.0/projects/12");
        mock.push(400, "bad allow-list");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let config = ProjectConfig::new("team-a").cve_allowlist(vec!["CVE-1".to_string()]);
        let mut state = ProjectState::new("team-a");
        let err = reconciler.create(&config, &mut state).unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(state.id.as_deref(), Some("/projects/12"));
        assert_eq!(mock.writes().len(), 2);
    }

    #[test]
    fn test_create_rejects_invalid_config_before_sending() {
        let mock = MockTransport::new();
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::new("Bad Name");
        let err = reconciler
            .create(&ProjectConfig::new("Bad Name"), &mut state)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_read_not_found_clears_identity() {
        let mock = MockTransport::new();
        mock.push(404, r#"{"errors":[{"code":"NOT_FOUND"}]}"#);
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let outcome = reconciler.read(&mut state).unwrap();

        assert_eq!(outcome, ReadOutcome::Absent);
        assert!(!state.is_present());
    }

    #[test]
    fn test_read_transport_not_found_clears_identity() {
        let mock = MockTransport::new();
        mock.push_error("HTTP 404", Some(404));
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        assert_eq!(reconciler.read(&mut state).unwrap(), ReadOutcome::Absent);
        assert!(!state.is_present());
    }

    #[test]
    fn test_read_other_errors_keep_identity() {
        let mock = MockTransport::new();
        mock.push(500, "internal");
        mock.push(200, "<html>maintenance</html>");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        assert!(reconciler.read(&mut state).is_err());
        assert!(state.is_present());

        let err = reconciler.read(&mut state).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(state.is_present());
    }

    #[test]
    fn test_read_without_identity() {
        let mock = MockTransport::new();
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::new("team-a");
        let err = reconciler.read(&mut state).unwrap_err();
        assert!(matches!(err, Error::MissingIdentity { .. }));
    }

    #[test]
    fn test_read_derives_fields() {
        let mock = MockTransport::new();
        mock.push(
            200,
            r#"{
                "project_id": 12,
                "name": "team-a",
                "registry_id": 2,
                "metadata": {"public": "true", "severity": "critical", "prevent_vul": "true"},
                "cve_allowlist": {"items": [{"cve_id": "CVE-1"}, {"cve_id": "CVE-2"}]}
            }"#,
        );
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        reconciler.read(&mut state).unwrap();

        assert!(state.public);
        assert!(!state.vulnerability_scanning);
        assert_eq!(state.registry_id, 2);
        assert_eq!(state.deployment_security, "critical");
        assert_eq!(state.cve_allowlist, vec!["CVE-1", "CVE-2"]);
    }

    #[test]
    fn test_update_puts_then_syncs_quota() {
        let mock = MockTransport::new();
        mock.push(200, "");
        mock.push(200, project_json(12, "team-a"));
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let config = ProjectConfig::new("team-a").public(true);
        reconciler.update(&config, &mut state).unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].path, "/projects/12");
        assert_eq!(requests[1].method, Method::Get);
        assert_eq!(quota.calls(), vec![("/projects/12".to_string(), 1)]);
    }

    #[test]
    fn test_update_quota_failure_propagates() {
        let mock = MockTransport::new();
        mock.push(200, "");
        let repos = FakeRepositories::default();
        let mut quota = FakeQuota::new(&mock);
        quota.fail = true;
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let config = ProjectConfig::new("team-a").storage_quota(1024);
        assert!(reconciler.update(&config, &mut state).is_err());
        assert_eq!(state.storage_quota, -1);
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_update_put_failure_skips_quota() {
        let mock = MockTransport::new();
        mock.push(409, "conflict");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        assert!(reconciler
            .update(&ProjectConfig::new("team-a"), &mut state)
            .is_err());
        assert!(quota.calls().is_empty());
    }

    #[test]
    fn test_delete_refuses_non_empty_project() {
        let mock = MockTransport::new();
        let repos = FakeRepositories::with(&["team-a/app"]);
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let err = reconciler
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .unwrap_err();

        assert!(matches!(err, Error::NotEmpty { repositories: 1, .. }));
        assert!(err.to_string().contains("team-a"));
        assert!(mock.requests().is_empty());
        assert!(state.is_present());
    }

    #[test]
    fn test_delete_empty_project() {
        let mock = MockTransport::new();
        mock.push(200, "");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        reconciler
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, Method::Delete);
        assert_eq!(writes[0].path, "/projects/12");
        assert!(!state.is_present());
    }

    #[test]
    fn test_delete_already_gone() {
        let mock = MockTransport::new();
        mock.push(404, "");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        reconciler
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .unwrap();
        assert!(!state.is_present());
    }

    #[test]
    fn test_delete_other_error_keeps_identity() {
        let mock = MockTransport::new();
        mock.push(412, "precondition failed");
        let repos = FakeRepositories::default();
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        assert!(reconciler
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .is_err());
        assert!(state.is_present());
    }

    #[test]
    fn test_delete_force_cascades_first() {
        let mock = MockTransport::new();
        mock.push(200, "");
        let repos = FakeRepositories::with(&["team-a/app"]);
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let config = ProjectConfig::new("team-a").force_destroy(true);
        reconciler.delete(&config, &mut state).unwrap();

        assert_eq!(*repos.cascaded.lock().unwrap(), vec!["team-a".to_string()]);
        assert_eq!(mock.writes().len(), 1);
        assert!(!state.is_present());
    }

    #[test]
    fn test_delete_force_cascade_failure_aborts() {
        let mock = MockTransport::new();
        let repos = FakeRepositories {
            fail_cascade: true,
            ..FakeRepositories::default()
        };
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        let config = ProjectConfig::new("team-a").force_destroy(true);
        assert!(reconciler.delete(&config, &mut state).is_err());
        assert!(mock.requests().is_empty());
        assert!(state.is_present());
    }

    #[test]
    fn test_delete_without_identity_is_noop() {
        let mock = MockTransport::new();
        let repos = FakeRepositories::with(&["team-a/app"]);
        let quota = FakeQuota::new(&mock);
        let reconciler = ProjectReconciler::with_collaborators(&mock, &repos, &quota);

        let mut state = ProjectState::new("team-a");
        reconciler
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .unwrap();
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_reconciler_over_client() {
        let mock = MockTransport::new();
        mock.push(200, "[]");
        mock.push(200, "");
        let client = Client::with_transport(Box::new(mock.clone()));

        let mut state = ProjectState::with_id("team-a", "/projects/12");
        client
            .reconciler()
            .delete(&ProjectConfig::new("team-a"), &mut state)
            .unwrap();

        let requests = mock.requests();
        assert!(requests[0].path.starts_with("/projects/team-a/repositories"));
        assert_eq!(requests[1].method, Method::Delete);
    }
}
