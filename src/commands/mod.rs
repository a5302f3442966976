//! Command implementations
//!
//! Every command that talks to the registry opens a [`Workspace`]: the
//! parsed config, the recorded state and one shared client.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod show;

use anyhow::{Context as _, Result};
use declarative::{ExecutionPlan, Resource, ResourceState};
use harbor::Client;
use std::sync::Arc;

use crate::Context;
use crate::config::RegsyncConfig;
use crate::resource::{self, ProjectResource};
use crate::state::RegsyncState;
use crate::ui;

/// Config, state and client for one command run
pub struct Workspace {
    pub config: RegsyncConfig,
    pub state: RegsyncState,
    pub client: Arc<Client>,
}

impl Workspace {
    /// Load the config and state, and connect to the registry
    pub fn open(ctx: &Context) -> Result<Self> {
        let config = RegsyncConfig::load(&ctx.config_path)?;
        let settings = config.client_settings(&ctx.registry)?;
        let client = Client::new(&settings).context("Failed to set up registry client")?;
        let state = RegsyncState::load()?;
        Ok(Self {
            config,
            state,
            client: Arc::new(client),
        })
    }

    /// Every declared or recorded project matching `target`, refreshed
    ///
    /// State is saved right away, so projects deleted out-of-band are
    /// forgotten even if the command stops later.
    pub fn refreshed_resources(&mut self, target: Option<&str>) -> Result<Vec<ProjectResource>> {
        let resources = resource::project_resources(&self.client, &self.config, &self.state);
        let mut resources = ExecutionPlan::build(resources)
            .filter_by_target(target)
            .into_resources();

        for resource in &mut resources {
            let was_present = resource.state().is_present();
            let refreshed = resource.refresh()?;
            if was_present && refreshed == ResourceState::Absent {
                ui::warn(&format!(
                    "{} was deleted outside regsync, dropping it from state",
                    resource.address()
                ));
            }
            if was_present {
                self.state.record(resource.state().clone());
            }
        }

        self.state.save()?;
        Ok(resources)
    }

    /// Record the post-apply state of `resources` and save
    pub fn persist(&mut self, resources: Vec<ProjectResource>) -> Result<()> {
        for resource in resources {
            self.state.record(resource.into_state());
        }
        self.state.save()
    }
}
