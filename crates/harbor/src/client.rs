//! High-level registry client.

use crate::error::{Error, Result};
use crate::project::ProjectReconciler;
use crate::quota::{self, StorageQuota};
use crate::repositories::{self, Repositories};
use crate::transport::http::{DEFAULT_API_PATH, DEFAULT_TIMEOUT, HttpTransport};
use crate::transport::{Request, Response, Transport};
use crate::types::{ProjectConfig, Repository};
use std::time::Duration;

/// Connection settings for one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    pub api_path: String,
    pub timeout: Duration,
}

impl ClientSettings {
    /// Settings with the default API prefix and timeout.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            insecure: false,
            api_path: DEFAULT_API_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "registry url {:?} must start with http:// or https://",
                self.url
            )));
        }
        if self.username.is_empty() {
            return Err(Error::InvalidConfig("registry username is empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("registry timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Registry client: one transport, plus the repository and quota operations
/// built on top of it.
///
/// # Example
///
/// ```
/// use harbor::transport::MockTransport;
/// use harbor::{Client, ProjectState, ReadOutcome};
///
/// let mock = MockTransport::new();
/// mock.push(404, r#"{"errors":[]}"#);
///
/// let client = Client::with_transport(Box::new(mock.clone()));
/// let mut state = ProjectState::with_id("team-a", "/projects/12");
/// let outcome = client.reconciler().read(&mut state).unwrap();
///
/// assert_eq!(outcome, ReadOutcome::Absent);
/// assert!(!state.is_present());
/// ```
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Create a client talking HTTP to the configured registry.
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        settings.validate()?;
        log::debug!("registry {} (api {})", settings.url, settings.api_path);
        Ok(Self {
            transport: Box::new(HttpTransport::new(
                &settings.url,
                &settings.api_path,
                &settings.username,
                &settings.password,
                settings.insecure,
                settings.timeout,
            )),
        })
    }

    /// Create a client with a custom transport (useful for testing).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Reconciler using this client for every collaborator.
    #[must_use]
    pub fn reconciler(&self) -> ProjectReconciler<'_> {
        ProjectReconciler::new(self)
    }
}

impl Transport for Client {
    fn execute(&self, request: &Request) -> Result<Response> {
        self.transport.execute(request)
    }
}

impl Repositories for Client {
    fn list_repositories(&self, project: &str) -> Result<Vec<Repository>> {
        repositories::list_repositories(self.transport.as_ref(), project)
    }

    fn delete_all_repositories(&self, project: &str) -> Result<()> {
        repositories::delete_all_repositories(self.transport.as_ref(), project)
    }
}

impl StorageQuota for Client {
    fn update_storage_quota(&self, config: &ProjectConfig, identity: &str) -> Result<()> {
        quota::update_storage_quota(self.transport.as_ref(), config, identity)
    }
}
