use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{cascade, required_text, ServiceError};
use crate::access::{require, visibility, Action};
use crate::api::double_option;
use crate::api::format::{MemberDetail, ProjectDetail, UserSummary};
use crate::database::models::{Membership, Project, Role, User};
use crate::database::StoreTx;
use crate::filter::TaskQuery;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; absent fields are left unchanged and an explicit `null`
/// description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub user_id: Uuid,
    pub role: Option<Role>,
}

/// The caller becomes the owner; no membership row is written for them.
pub async fn create(tx: &mut dyn StoreTx, caller: Uuid, input: NewProject) -> Result<Project, ServiceError> {
    let name = required_text("name", &input.name)?;
    let project = Project::new(name, input.description, caller);
    tx.insert_project(&project).await?;

    info!("Created project {} for user {}", project.id, caller);
    Ok(project)
}

pub async fn list(tx: &mut dyn StoreTx, caller: Uuid) -> Result<Vec<Project>, ServiceError> {
    Ok(visibility::visible_projects(tx, caller).await?)
}

pub async fn get(tx: &mut dyn StoreTx, caller: Uuid, project_id: Uuid) -> Result<ProjectDetail, ServiceError> {
    let (project, _) = require(tx, caller, project_id, Action::ViewProject).await?;

    let owner = tx.find_user(project.owner_id).await?.map(UserSummary::from);
    let members = member_details(tx, project.id).await?;
    let tasks = tx.list_tasks(&TaskQuery::in_project(project.id)).await?;

    Ok(ProjectDetail {
        project,
        owner,
        members,
        tasks,
    })
}

pub async fn update(
    tx: &mut dyn StoreTx,
    caller: Uuid,
    project_id: Uuid,
    changes: ProjectChanges,
) -> Result<Project, ServiceError> {
    let (mut project, _) = require(tx, caller, project_id, Action::UpdateProject).await?;

    if let Some(name) = changes.name {
        project.name = required_text("name", &name)?;
    }
    if let Some(description) = changes.description {
        project.description = description;
    }
    project.touch();

    tx.update_project(&project).await?;
    Ok(project)
}

pub async fn delete(tx: &mut dyn StoreTx, caller: Uuid, project_id: Uuid) -> Result<(), ServiceError> {
    require(tx, caller, project_id, Action::DeleteProject).await?;
    cascade::delete_project(tx, project_id).await?;
    Ok(())
}

pub async fn add_member(
    tx: &mut dyn StoreTx,
    caller: Uuid,
    project_id: Uuid,
    input: NewMember,
) -> Result<MemberDetail, ServiceError> {
    let (project, _) = require(tx, caller, project_id, Action::AddMember).await?;

    let user = tx
        .find_user(input.user_id)
        .await?
        .ok_or(ServiceError::not_found("User"))?;

    if project.is_owned_by(user.id) {
        return Err(ServiceError::Conflict("User is the project owner".to_string()));
    }
    if tx.find_membership(project.id, user.id).await?.is_some() {
        return Err(ServiceError::Conflict("User is already a member of this project".to_string()));
    }

    let membership = Membership::new(project.id, user.id, input.role.unwrap_or_default());
    tx.insert_membership(&membership).await?;

    info!(
        "Added user {} to project {} as {}",
        user.id, project.id, membership.role
    );
    Ok(MemberDetail {
        user: UserSummary::from(user),
        role: membership.role,
    })
}

pub async fn members(tx: &mut dyn StoreTx, caller: Uuid, project_id: Uuid) -> Result<Vec<MemberDetail>, ServiceError> {
    require(tx, caller, project_id, Action::ViewProject).await?;
    member_details(tx, project_id).await
}

async fn member_details(tx: &mut dyn StoreTx, project_id: Uuid) -> Result<Vec<MemberDetail>, ServiceError> {
    let memberships = tx.project_memberships(project_id).await?;
    let ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
    let users = tx.find_users(&ids).await?;

    Ok(memberships
        .into_iter()
        .filter_map(|m| {
            users
                .iter()
                .find(|u: &&User| u.id == m.user_id)
                .map(|u| MemberDetail {
                    user: UserSummary::from(u),
                    role: m.role,
                })
        })
        .collect())
}
