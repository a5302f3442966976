//! Blocking HTTP transport over `ureq`.
//!
//! Status codes are never turned into errors here; the shared check in
//! [`Transport::send`] decides what is acceptable for each request.

use crate::error::{Error, Result};
use crate::transport::{Method, Request, Response, Transport};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use std::time::Duration;
use ureq::tls::TlsConfig;

/// Default API prefix of the registry.
pub const DEFAULT_API_PATH: &str = "/api/v2.0";

/// Default global request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("regsync/", env!("CARGO_PKG_VERSION"));

/// HTTP transport for a single registry.
///
/// # Example
///
/// ```no_run
/// use harbor::transport::http::HttpTransport;
/// use harbor::transport::{Request, Transport};
/// use std::time::Duration;
///
/// let transport = HttpTransport::new(
///     "https://harbor.example.com",
///     "/api/v2.0",
///     "admin",
///     "secret",
///     false,
///     Duration::from_secs(30),
/// );
/// let response = transport.send(&Request::get("/projects/12", 200)).unwrap();
/// println!("{}", response.body);
/// ```
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl HttpTransport {
    /// Create a transport for `url` + `api_path`.
    ///
    /// `insecure` disables TLS certificate verification.
    #[must_use]
    pub fn new(
        url: &str,
        api_path: &str,
        username: &str,
        password: &str,
        insecure: bool,
        timeout: Duration,
    ) -> Self {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .user_agent(USER_AGENT);
        if insecure {
            log::warn!("TLS certificate verification disabled for {url}");
            config = config.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        let agent: ureq::Agent = config.build().into();

        Self {
            agent,
            base_url: base_url(url, api_path),
            authorization: basic_auth(username, password),
        }
    }

    /// Absolute base URL every request path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> Result<Response> {
        let url = self.url(&request.path);
        let auth = self.authorization.as_str();

        let result = match (request.method, &request.body) {
            (Method::Get, _) => self.agent.get(&url).header("Authorization", auth).call(),
            (Method::Delete, _) => self.agent.delete(&url).header("Authorization", auth).call(),
            (Method::Post, Some(body)) => self
                .agent
                .post(&url)
                .header("Authorization", auth)
                .send_json(body),
            (Method::Post, None) => self
                .agent
                .post(&url)
                .header("Authorization", auth)
                .send_empty(),
            (Method::Put, Some(body)) => self
                .agent
                .put(&url)
                .header("Authorization", auth)
                .send_json(body),
            (Method::Put, None) => self
                .agent
                .put(&url)
                .header("Authorization", auth)
                .send_empty(),
        };

        let mut response = result.map_err(Error::from)?;
        let status = response.status().as_u16();

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::transport(format!("failed to read response body: {e}"), Some(status)))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Join the registry URL and API prefix without doubled slashes.
fn base_url(url: &str, api_path: &str) -> String {
    let url = url.trim_end_matches('/');
    let api_path = api_path.trim_matches('/');
    if api_path.is_empty() {
        url.to_string()
    } else {
        format!("{url}/{api_path}")
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
