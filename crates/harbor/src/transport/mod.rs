//! Request/response plumbing between the reconciler and the registry.
//!
//! The reconciler never talks HTTP itself. It hands a [`Request`] to a
//! [`Transport`] and gets a [`Response`] back. [`http::HttpTransport`] is the
//! real implementation; [`MockTransport`] replays scripted responses.
//!
//! # Testing
//!
//! ```
//! use harbor::transport::{MockTransport, Request, Transport};
//!
//! let mock = MockTransport::new();
//! mock.push_with_header(201, "", "location", "/api/v2.0/projects/12");
//!
//! let response = mock.send(&Request::post("/projects", serde_json::json!({}), 201)).unwrap();
//! assert_eq!(response.header("Location"), Some("/api/v2.0/projects/12"));
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// HTTP method of a registry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether the request changes remote state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// A single request against the registry API.
///
/// `path` is relative to the API base, e.g. `/projects/12`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub expected_status: u16,
}

impl Request {
    #[must_use]
    pub fn get(path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            expected_status,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value, expected_status: u16) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            expected_status,
        }
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: serde_json::Value, expected_status: u16) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
            expected_status,
        }
    }

    #[must_use]
    pub fn delete(path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            expected_status,
        }
    }
}

/// What the registry answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Response {
    /// Look up a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Synchronous request function handed to the reconciler.
///
/// Implementors only provide [`Transport::execute`]; the status check in
/// [`Transport::send`] is shared.
pub trait Transport: Send + Sync {
    /// Perform the request and return whatever the registry answered.
    ///
    /// A non-2xx status is not an error at this level.
    fn execute(&self, request: &Request) -> Result<Response>;

    /// Perform the request and require `expected_status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] carrying the body when the status
    /// differs, or whatever [`Transport::execute`] failed with.
    fn send(&self, request: &Request) -> Result<Response> {
        log::debug!("{} {}", request.method, request.path);
        let response = self.execute(request)?;
        if response.status != request.expected_status {
            log::debug!(
                "{} {} -> {} (expected {})",
                request.method,
                request.path,
                response.status,
                request.expected_status
            );
            return Err(Error::UnexpectedStatus {
                status: response.status,
                expected: request.expected_status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

/// Scripted reply of a [`MockTransport`].
#[derive(Debug, Clone)]
enum Reply {
    Respond(Response),
    Fail { message: String, status: Option<u16> },
}

/// Transport for tests: replays queued replies in order and records every
/// request it receives.
///
/// Clones share the same queue and log, so a test can keep one handle while
/// the reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    /// Create a mock with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.push_response(Response {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        });
    }

    /// Queue a response carrying one header.
    pub fn push_with_header(
        &self,
        status: u16,
        body: impl Into<String>,
        name: &str,
        value: impl Into<String>,
    ) {
        let mut headers = BTreeMap::new();
        headers.insert(name.to_ascii_lowercase(), value.into());
        self.push_response(Response {
            status,
            headers,
            body: body.into(),
        });
    }

    /// Queue a fully built response.
    pub fn push_response(&self, response: Response) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Reply::Respond(response));
    }

    /// Queue a transport-level failure.
    pub fn push_error(&self, message: impl Into<String>, status: Option<u16>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Reply::Fail {
                message: message.into(),
                status,
            });
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the requests that change remote state.
    #[must_use]
    pub fn writes(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method.is_write())
            .collect()
    }

    /// Number of replies not consumed yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &Request) -> Result<Response> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail { message, status }) => Err(Error::transport(message, status)),
            None => Err(Error::transport(
                format!("no scripted reply for {} {}", request.method, request.path),
                None,
            )),
        }
    }
}
