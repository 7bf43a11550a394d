//! Per-project authorization.
//!
//! Every guarded operation follows the same order: the target must exist
//! (`NotFound`), then the caller's effective access is computed from the
//! current membership rows (`role_of`), then the policy table decides
//! (`Forbidden`). Nothing here is cached across requests.

pub mod attachment;
pub mod guard;
pub mod visibility;

pub use attachment::{resolve_anchor, Anchor, AnchorInput};
pub use guard::{authorize, authorize_documentation_edit, Action};

use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Membership, Project, Role};
use crate::database::{DatabaseError, StoreTx};

/// Effective standing of a user within one project.
///
/// `Owner` is not a `Role`: it is never stored in the membership table and
/// outranks every role in the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Role(Role),
    None,
}

impl Access {
    /// Combine the ownership check with an optional membership row.
    pub fn resolve(user_id: Uuid, project: &Project, membership: Option<&Membership>) -> Self {
        if project.is_owned_by(user_id) {
            return Access::Owner;
        }
        match membership {
            Some(m) if m.project_id == project.id && m.user_id == user_id => Access::Role(m.role),
            _ => Access::None,
        }
    }

    pub fn has_any(&self) -> bool {
        !matches!(self, Access::None)
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Either project_id or task_id must be provided")]
    InvalidAttachment,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Effective access of `user_id` in `project`, read fresh from the store.
pub async fn role_of(tx: &mut dyn StoreTx, user_id: Uuid, project: &Project) -> Result<Access, DatabaseError> {
    if project.is_owned_by(user_id) {
        return Ok(Access::Owner);
    }
    let membership = tx.find_membership(project.id, user_id).await?;
    Ok(Access::resolve(user_id, project, membership.as_ref()))
}

/// Load a project (404 when absent) and the caller's access to it.
pub async fn project_access(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<(Project, Access), AccessError> {
    let project = tx
        .find_project(project_id)
        .await?
        .ok_or(AccessError::NotFound("Project"))?;
    let access = role_of(tx, user_id, &project).await?;
    Ok((project, access))
}

/// Existence check, then evaluator, then guard.
pub async fn require(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    project_id: Uuid,
    action: Action,
) -> Result<(Project, Access), AccessError> {
    let (project, access) = project_access(tx, user_id, project_id).await?;
    if let Err(err) = authorize(access, action) {
        tracing::warn!(
            "Denied {:?} on project {} for user {} ({:?})",
            action, project.id, user_id, access
        );
        return Err(err);
    }
    Ok((project, access))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{EntityStore, MemoryStore};

    #[test]
    fn owner_outranks_any_membership_row() {
        let owner = Uuid::new_v4();
        let project = Project::new("Apollo", None, owner);
        let stray = Membership::new(project.id, owner, Role::Viewer);

        assert_eq!(Access::resolve(owner, &project, Some(&stray)), Access::Owner);
        assert_eq!(Access::resolve(owner, &project, None), Access::Owner);
    }

    #[test]
    fn membership_of_another_project_grants_nothing() {
        let project = Project::new("Apollo", None, Uuid::new_v4());
        let user = Uuid::new_v4();
        let elsewhere = Membership::new(Uuid::new_v4(), user, Role::Admin);

        assert_eq!(Access::resolve(user, &project, Some(&elsewhere)), Access::None);
    }

    #[tokio::test]
    async fn role_of_reads_membership() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let project = Project::new("Apollo", None, owner);
        tx.insert_project(&project).await.unwrap();
        tx.insert_membership(&Membership::new(project.id, member, Role::Member)).await.unwrap();

        assert_eq!(role_of(tx.as_mut(), owner, &project).await.unwrap(), Access::Owner);
        assert_eq!(role_of(tx.as_mut(), member, &project).await.unwrap(), Access::Role(Role::Member));
        assert_eq!(role_of(tx.as_mut(), stranger, &project).await.unwrap(), Access::None);
    }

    #[tokio::test]
    async fn missing_project_is_not_found_before_forbidden() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let err = require(tx.as_mut(), Uuid::new_v4(), Uuid::new_v4(), Action::ViewProject)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Project")));
    }

    #[tokio::test]
    async fn stranger_is_forbidden_on_existing_project() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let project = Project::new("Apollo", None, Uuid::new_v4());
        tx.insert_project(&project).await.unwrap();

        let err = require(tx.as_mut(), Uuid::new_v4(), project.id, Action::ViewProject)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }
}
