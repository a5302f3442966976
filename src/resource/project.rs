//! Registry project resource

use anyhow::{Context, Result, bail};
use declarative::{Action, ApplyContext, ApplyResult, Attributes, Resource, ResourceState};
use harbor::{Client, ProjectConfig, ProjectState, ReadOutcome};
use std::fmt;
use std::sync::Arc;

/// Fields whose change cannot be applied in place
const FORCE_NEW: &[&str] = &["name", "registry_id"];

/// One registry project: its declaration (if still declared) and its recorded state
pub struct ProjectResource {
    client: Arc<Client>,
    config: Option<ProjectConfig>,
    state: ProjectState,
}

impl ProjectResource {
    /// Declared project, with whatever state is recorded for it
    pub fn declared(client: Arc<Client>, config: ProjectConfig, state: Option<ProjectState>) -> Self {
        let state = state.unwrap_or_else(|| ProjectState::new(config.name.clone()));
        Self {
            client,
            config: Some(config),
            state,
        }
    }

    /// Project only known from state; planning it yields a delete
    pub fn orphaned(client: Arc<Client>, state: ProjectState) -> Self {
        Self {
            client,
            config: None,
            state,
        }
    }

    /// Stop declaring the project so that it plans a delete
    ///
    /// The declared `force_destroy` is kept for the delete.
    pub fn into_retired(mut self) -> Self {
        if let Some(config) = self.config.take() {
            self.state.force_destroy = config.force_destroy;
        }
        self
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn into_state(self) -> ProjectState {
        self.state
    }

    /// Config used to delete: declared `force_destroy` wins over the recorded one
    fn delete_config(&self) -> ProjectConfig {
        let recorded = ProjectConfig::from_state(&self.state);
        match &self.config {
            Some(config) => recorded.force_destroy(config.force_destroy),
            None => recorded,
        }
    }
}

impl fmt::Debug for ProjectResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectResource")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Resource for ProjectResource {
    fn id(&self) -> String {
        self.config
            .as_ref()
            .map_or_else(|| self.state.name.clone(), |config| config.name.clone())
    }

    fn description(&self) -> String {
        format!("Registry project {}", self.id())
    }

    fn resource_type(&self) -> &'static str {
        "project"
    }

    fn refresh(&mut self) -> Result<ResourceState> {
        if !self.state.is_present() {
            return Ok(ResourceState::Absent);
        }

        let outcome = self
            .client
            .reconciler()
            .read(&mut self.state)
            .with_context(|| format!("Failed to read project {}", self.state.name))?;

        Ok(match outcome {
            ReadOutcome::Present => ResourceState::Present {
                attributes: state_attributes(&self.state),
            },
            ReadOutcome::Absent => ResourceState::Absent,
        })
    }

    fn desired(&self) -> Option<Attributes> {
        self.config.as_ref().map(config_attributes)
    }

    fn current(&self) -> Option<Attributes> {
        self.state
            .is_present()
            .then(|| state_attributes(&self.state))
    }

    fn force_new(&self) -> &'static [&'static str] {
        FORCE_NEW
    }

    fn apply(&mut self, action: &Action, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: format!("dry run: would {}", action.verb()),
            });
        }

        let reconciler = self.client.reconciler();
        match action {
            Action::NoChange => Ok(ApplyResult::NoChange),
            Action::Create => {
                let Some(config) = &self.config else {
                    bail!("project {} is not declared, cannot create it", self.state.name);
                };
                let outcome = reconciler
                    .create(config, &mut self.state)
                    .with_context(|| format!("Failed to create project {}", config.name))?;
                if outcome == ReadOutcome::Absent {
                    bail!("project {} disappeared right after creation", config.name);
                }
                Ok(ApplyResult::Created)
            }
            Action::Update { .. } => {
                let Some(config) = &self.config else {
                    bail!("project {} is not declared, cannot update it", self.state.name);
                };
                let outcome = reconciler
                    .update(config, &mut self.state)
                    .with_context(|| format!("Failed to update project {}", config.name))?;
                if outcome == ReadOutcome::Absent {
                    bail!("project {} disappeared during update", config.name);
                }
                Ok(ApplyResult::Modified)
            }
            Action::Delete => {
                let config = self.delete_config();
                reconciler
                    .delete(&config, &mut self.state)
                    .with_context(|| format!("Failed to delete project {}", config.name))?;
                Ok(ApplyResult::Removed)
            }
            Action::Replace { .. } => {
                bail!("replacement of {} must be applied as delete then create", self.id())
            }
        }
    }
}

fn flag(value: bool) -> String {
    value.to_string()
}

/// Comparable fields of a declared project
fn config_attributes(config: &ProjectConfig) -> Attributes {
    let mut attrs = Attributes::from([
        ("name".to_string(), config.name.clone()),
        ("public".to_string(), flag(config.public)),
        (
            "vulnerability_scanning".to_string(),
            flag(config.vulnerability_scanning),
        ),
        ("storage_quota".to_string(), config.storage_quota.to_string()),
        ("cve_allowlist".to_string(), config.cve_allowlist.join(",")),
        (
            "enable_content_trust".to_string(),
            flag(config.enable_content_trust),
        ),
        (
            "enable_content_trust_cosign".to_string(),
            flag(config.enable_content_trust_cosign),
        ),
        (
            "auto_sbom_generation".to_string(),
            flag(config.auto_sbom_generation),
        ),
        (
            "deployment_security".to_string(),
            config
                .deployment_security
                .map_or_else(String::new, |level| level.as_str().to_string()),
        ),
        ("force_destroy".to_string(), flag(config.force_destroy)),
    ]);
    if let Some(registry_id) = config.registry_id {
        attrs.insert("registry_id".to_string(), registry_id.to_string());
    }
    attrs
}

/// Fields of a recorded project; `project_id` is computed and never diffed
fn state_attributes(state: &ProjectState) -> Attributes {
    Attributes::from([
        ("name".to_string(), state.name.clone()),
        ("project_id".to_string(), state.project_id.to_string()),
        ("registry_id".to_string(), state.registry_id.to_string()),
        ("public".to_string(), flag(state.public)),
        (
            "vulnerability_scanning".to_string(),
            flag(state.vulnerability_scanning),
        ),
        ("storage_quota".to_string(), state.storage_quota.to_string()),
        ("cve_allowlist".to_string(), state.cve_allowlist.join(",")),
        (
            "enable_content_trust".to_string(),
            flag(state.enable_content_trust),
        ),
        (
            "enable_content_trust_cosign".to_string(),
            flag(state.enable_content_trust_cosign),
        ),
        (
            "auto_sbom_generation".to_string(),
            flag(state.auto_sbom_generation),
        ),
        (
            "deployment_security".to_string(),
            state.deployment_security.clone(),
        ),
        ("force_destroy".to_string(), flag(state.force_destroy)),
    ])
}
