use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use harbor::ProjectState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::paths;

/// Recorded state of every managed project, keyed by project name
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegsyncState {
    /// Projects known to exist remotely
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectState>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

impl Default for RegsyncState {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl RegsyncState {
    /// Load state from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::state_file()?)
    }

    /// Load state from disk, or return default if file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!(
            "Loaded state for {} project(s) from {}",
            state.projects.len(),
            path.display()
        );
        Ok(state)
    }

    /// Stamp and save state to the default location
    pub fn save(&mut self) -> Result<()> {
        self.last_updated = Utc::now();
        self.save_to(&paths::state_file()?)
    }

    /// Save state to disk
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Recorded state of one project, if any
    pub fn get(&self, name: &str) -> Option<&ProjectState> {
        self.projects.get(name)
    }

    /// Record a project after an operation
    ///
    /// A project without identity no longer exists remotely and is dropped.
    pub fn record(&mut self, project: ProjectState) {
        if project.is_present() {
            self.projects.insert(project.name.clone(), project);
        } else {
            log::debug!("Dropping {} from state", project.name);
            self.projects.remove(&project.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let state = RegsyncState::load_from(&dir.path().join("state.toml")).unwrap();
        assert!(state.projects.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = RegsyncState::default();
        let mut project = ProjectState::with_id("team-a", "/projects/12");
        project.project_id = 12;
        project.deployment_security = "high".to_string();
        project.cve_allowlist = vec!["CVE-2023-1234".to_string()];
        project.storage_quota = 1024;
        state.record(project.clone());
        state.save_to(&path).unwrap();

        let loaded = RegsyncState::load_from(&path).unwrap();
        assert_eq!(loaded.get("team-a"), Some(&project));
        assert_eq!(loaded.last_updated, state.last_updated);
    }

    #[test]
    fn test_record_drops_absent_projects() {
        let mut state = RegsyncState::default();
        state.record(ProjectState::with_id("team-a", "/projects/12"));
        assert!(state.get("team-a").is_some());

        state.record(ProjectState::new("team-a"));
        assert!(state.get("team-a").is_none());
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, "projects = 3").unwrap();

        let err = RegsyncState::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("state.toml"));
    }
}
