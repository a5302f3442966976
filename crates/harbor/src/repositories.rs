//! Child repositories of a project.
//!
//! Only delete needs these: a project with repositories cannot be removed, so
//! they are either listed (to refuse) or deleted first (to cascade).

use crate::error::Result;
use crate::transport::{Request, Transport};
use crate::types::Repository;

/// Repositories requested per page.
pub const PAGE_SIZE: usize = 100;

/// Repository operations the reconciler depends on.
pub trait Repositories: Send + Sync {
    /// All repositories of `project`. A missing project has none.
    fn list_repositories(&self, project: &str) -> Result<Vec<Repository>>;

    /// Delete every repository of `project`, stopping at the first failure.
    fn delete_all_repositories(&self, project: &str) -> Result<()>;
}

/// List repositories page by page until a short page.
pub fn list_repositories(transport: &dyn Transport, project: &str) -> Result<Vec<Repository>> {
    let mut repositories = Vec::new();

    for page in 1.. {
        let path = format!("/projects/{project}/repositories?page={page}&page_size={PAGE_SIZE}");
        let response = match transport.send(&Request::get(path, 200)) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => break,
            Err(e) => return Err(e),
        };

        let batch: Vec<Repository> = serde_json::from_str(&response.body)?;
        let done = batch.len() < PAGE_SIZE;
        repositories.extend(batch);
        if done {
            break;
        }
    }

    log::debug!("project {project}: {} repositories", repositories.len());
    Ok(repositories)
}

/// Delete every repository of `project`.
///
/// A repository that vanished in the meantime is skipped.
pub fn delete_all_repositories(transport: &dyn Transport, project: &str) -> Result<()> {
    for repository in list_repositories(transport, project)? {
        let path = format!(
            "/projects/{project}/repositories/{}",
            encode_repository_name(repository.short_name(project))
        );
        log::info!("deleting repository {}", repository.name);
        match transport.send(&Request::delete(path, 200)) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                log::debug!("repository {} already gone", repository.name);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Nested repository names are double-encoded in the path: `a/b` -> `a%252Fb`.
#[must_use]
pub fn encode_repository_name(name: &str) -> String {
    name.replace('/', "%252F")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::{Method, MockTransport};

    fn page(names: &[&str]) -> String {
        let items: Vec<serde_json::Value> = names
            .iter()
            .map(|name| serde_json::json!({"name": name, "artifact_count": 1}))
            .collect();
        serde_json::Value::Array(items).to_string()
    }

    #[test]
    fn test_encode_nested_name() {
        assert_eq!(encode_repository_name("app"), "app");
        assert_eq!(encode_repository_name("tools/app"), "tools%252Fapp");
    }

    #[test]
    fn test_list_single_page() {
        let mock = MockTransport::new();
        mock.push(200, page(&["team-a/app", "team-a/db"]));

        let repos = list_repositories(&mock, "team-a").unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(
            mock.requests()[0].path,
            "/projects/team-a/repositories?page=1&page_size=100"
        );
    }

    #[test]
    fn test_list_follows_pages() {
        let mock = MockTransport::new();
        let names: Vec<String> = (0..PAGE_SIZE).map(|i| format!("team-a/r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        mock.push(200, page(&refs));
        mock.push(200, page(&["team-a/last"]));

        let repos = list_repositories(&mock, "team-a").unwrap();
        assert_eq!(repos.len(), PAGE_SIZE + 1);
        assert!(mock.requests()[1].path.contains("page=2"));
    }

    #[test]
    fn test_list_missing_project_is_empty() {
        let mock = MockTransport::new();
        mock.push(404, r#"{"errors":[{"code":"NOT_FOUND"}]}"#);
        assert!(list_repositories(&mock, "gone").unwrap().is_empty());
    }

    #[test]
    fn test_list_server_error_propagates() {
        let mock = MockTransport::new();
        mock.push(500, "");
        let err = list_repositories(&mock, "team-a").unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 500, .. }));
    }

    #[test]
    fn test_delete_all_encodes_and_skips_missing() {
        let mock = MockTransport::new();
        mock.push(200, page(&["team-a/tools/app", "team-a/db"]));
        mock.push(404, "");
        mock.push(200, "");

        delete_all_repositories(&mock, "team-a").unwrap();

        let deletes: Vec<String> = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Delete)
            .map(|r| r.path)
            .collect();
        assert_eq!(
            deletes,
            vec![
                "/projects/team-a/repositories/tools%252Fapp",
                "/projects/team-a/repositories/db",
            ]
        );
    }

    #[test]
    fn test_delete_all_stops_on_failure() {
        let mock = MockTransport::new();
        mock.push(200, page(&["team-a/a", "team-a/b"]));
        mock.push(403, "forbidden");

        assert!(delete_all_repositories(&mock, "team-a").is_err());
        assert_eq!(mock.writes().len(), 1);
    }
}
