//! # harbor
//!
//! Declarative reconciliation of projects in a Harbor container registry.
//!
//! The crate is split the way a request flows:
//!
//! - [`wire`] builds request bodies and parses responses;
//! - [`normalize`] turns a parsed response into state values, absorbing the
//!   registry's loose flag encoding and rebuilding deployment security;
//! - [`project::ProjectReconciler`] sequences create, read, update and delete.
//!
//! Networking is behind the [`transport::Transport`] trait. [`Client`] wires
//! an HTTP transport to the repository and quota operations.
//!
//! ## Example
//!
//! ```no_run
//! use harbor::{Client, ClientSettings, ProjectConfig, ProjectState};
//!
//! let client = Client::new(&ClientSettings::new(
//!     "https://harbor.example.com",
//!     "admin",
//!     "secret",
//! ))
//! .expect("valid settings");
//!
//! let config = ProjectConfig::new("team-a").cve_allowlist(vec!["CVE-2023-1234".into()]);
//! let mut state = ProjectState::new("team-a");
//! client.reconciler().create(&config, &mut state).unwrap();
//! println!("created {}", state.id.unwrap());
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod normalize;
pub mod project;
pub mod quota;
pub mod repositories;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::{Client, ClientSettings};
pub use error::{Error, ErrorCategory, Result};
pub use project::{ProjectReconciler, ReadOutcome};
pub use quota::StorageQuota;
pub use repositories::Repositories;
pub use transport::MockTransport;
pub use types::{DeploymentSecurity, ProjectConfig, ProjectState, Repository, UNLIMITED_QUOTA};
