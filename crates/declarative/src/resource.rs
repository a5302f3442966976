//! Resource trait for declarative state management
//!
//! A Resource pairs a declared configuration with the recorded state of one
//! remote object, and knows how to move the object between the two.

use crate::context::ApplyContext;
use crate::diff::diff_attributes;
use crate::types::{Action, ApplyResult, Attributes, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (id, description, type)
/// - State detection (`refresh`, `current`) and intent (`desired`)
/// - Convergence (`apply`)
///
/// Attributes absent from [`Resource::desired`] are never diffed, so a
/// resource can expose remote-computed fields through [`Resource::current`]
/// without causing drift.
///
/// # Example
///
/// ```
/// use declarative::{Action, ApplyContext, ApplyResult, Attributes, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Label {
///     name: String,
///     want: Option<String>,
///     have: Option<String>,
/// }
///
/// impl Label {
///     fn attrs(value: &str) -> Attributes {
///         Attributes::from([("value".to_string(), value.to_string())])
///     }
/// }
///
/// impl Resource for Label {
///     fn id(&self) -> String { self.name.clone() }
///     fn description(&self) -> String { format!("Label {}", self.name) }
///     fn resource_type(&self) -> &'static str { "label" }
///
///     fn refresh(&mut self) -> anyhow::Result<ResourceState> {
///         Ok(self.current().map_or(ResourceState::Absent, |attributes| {
///             ResourceState::Present { attributes }
///         }))
///     }
///
///     fn desired(&self) -> Option<Attributes> { self.want.as_deref().map(Self::attrs) }
///     fn current(&self) -> Option<Attributes> { self.have.as_deref().map(Self::attrs) }
///
///     fn apply(&mut self, action: &Action, _ctx: &ApplyContext) -> anyhow::Result<ApplyResult> {
///         self.have = self.want.clone();
///         Ok(match action {
///             Action::Delete => ApplyResult::Removed,
///             _ => ApplyResult::Created,
///         })
///     }
/// }
///
/// let label = Label { name: "env".into(), want: Some("prod".into()), have: None };
/// assert_eq!(label.plan(), Action::Create);
/// assert_eq!(label.address(), "label.env");
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// This should be stable and uniquely identify the resource
    /// within its type, e.g. the project name.
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category
    ///
    /// Used for grouping and target filtering.
    fn resource_type(&self) -> &'static str;

    /// Address used in plans and targets: `type.id`
    fn address(&self) -> String {
        format!("{}.{}", self.resource_type(), self.id())
    }

    /// Re-read the remote object and update the recorded state
    fn refresh(&mut self) -> Result<ResourceState>;

    /// Declared attributes, or `None` when the resource should not exist
    fn desired(&self) -> Option<Attributes>;

    /// Recorded attributes, or `None` when the resource does not exist
    fn current(&self) -> Option<Attributes>;

    /// Fields whose change requires delete-then-create
    fn force_new(&self) -> &'static [&'static str] {
        &[]
    }

    /// Compute the action that converges this resource
    fn plan(&self) -> Action {
        diff_attributes(
            self.desired().as_ref(),
            self.current().as_ref(),
            self.force_new(),
        )
    }

    /// Perform `action`
    ///
    /// [`Action::Replace`] is never passed here by the executor; it is split
    /// into a delete followed by a create.
    fn apply(&mut self, action: &Action, ctx: &ApplyContext) -> Result<ApplyResult>;

    /// Whether this resource can be applied in parallel with others
    ///
    /// Override to return false for resources that have ordering
    /// dependencies or shared state concerns.
    fn can_parallelize(&self) -> bool {
        true
    }
}
