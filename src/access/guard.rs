use uuid::Uuid;

use super::{Access, AccessError};
use crate::database::models::{Documentation, Project, Role};

/// Guarded project-scoped actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the project or anything inside it
    ViewProject,
    UpdateProject,
    DeleteProject,
    AddMember,
    CreateTask,
    UpdateTask,
    DeleteTask,
    AttachDocumentation,
}

impl Action {
    /// The fixed policy table.
    pub fn permits(self, access: Access) -> bool {
        match (self, access) {
            (_, Access::None) => false,
            (Action::ViewProject | Action::AttachDocumentation, _) => true,
            (_, Access::Owner) => true,
            (Action::DeleteProject, Access::Role(_)) => false,
            (Action::CreateTask | Action::UpdateTask, Access::Role(role)) => role >= Role::Member,
            (Action::UpdateProject | Action::DeleteTask | Action::AddMember, Access::Role(role)) => role >= Role::Admin,
        }
    }

    fn denial(self, access: Access) -> &'static str {
        if !access.has_any() {
            return "Access denied to project";
        }
        match self {
            Action::DeleteProject => "Only project owner can delete project",
            Action::DeleteTask => "Only owners and admins can delete tasks",
            _ => "Insufficient permissions",
        }
    }
}

pub fn authorize(access: Access, action: Action) -> Result<(), AccessError> {
    if action.permits(access) {
        Ok(())
    } else {
        Err(AccessError::Forbidden(action.denial(access)))
    }
}

/// Documentation may be changed by its author or by the owner of the
/// project it is anchored in. Membership roles do not count here.
pub fn authorize_documentation_edit(user_id: Uuid, doc: &Documentation, project: &Project) -> Result<(), AccessError> {
    if doc.is_authored_by(user_id) || project.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AccessError::Forbidden("Not authorized to modify this documentation"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::database::models::DocType;

    const ALL_ACTIONS: [Action; 8] = [
        Action::ViewProject,
        Action::UpdateProject,
        Action::DeleteProject,
        Action::AddMember,
        Action::CreateTask,
        Action::UpdateTask,
        Action::DeleteTask,
        Action::AttachDocumentation,
    ];

    fn allowed(access: Access) -> Vec<Action> {
        ALL_ACTIONS.into_iter().filter(|a| a.permits(access)).collect()
    }

    #[test]
    fn owner_may_do_everything() {
        assert_eq!(allowed(Access::Owner), ALL_ACTIONS.to_vec());
    }

    #[test]
    fn no_access_may_do_nothing() {
        assert!(allowed(Access::None).is_empty());
    }

    #[test]
    fn admin_cannot_delete_project() {
        assert_eq!(
            allowed(Access::Role(Role::Admin)),
            vec![
                Action::ViewProject,
                Action::UpdateProject,
                Action::AddMember,
                Action::CreateTask,
                Action::UpdateTask,
                Action::DeleteTask,
                Action::AttachDocumentation,
            ]
        );
    }

    #[test]
    fn member_writes_tasks_but_cannot_delete_them() {
        assert_eq!(
            allowed(Access::Role(Role::Member)),
            vec![
                Action::ViewProject,
                Action::CreateTask,
                Action::UpdateTask,
                Action::AttachDocumentation,
            ]
        );
    }

    #[test]
    fn viewer_reads_and_attaches_only() {
        assert_eq!(
            allowed(Access::Role(Role::Viewer)),
            vec![Action::ViewProject, Action::AttachDocumentation]
        );
        assert!(matches!(
            authorize(Access::Role(Role::Viewer), Action::CreateTask),
            Err(AccessError::Forbidden("Insufficient permissions"))
        ));
    }

    #[test]
    fn denial_messages() {
        assert!(matches!(
            authorize(Access::None, Action::ViewProject),
            Err(AccessError::Forbidden("Access denied to project"))
        ));
        assert!(matches!(
            authorize(Access::Role(Role::Admin), Action::DeleteProject),
            Err(AccessError::Forbidden("Only project owner can delete project"))
        ));
    }

    #[test]
    fn documentation_edit_is_author_or_project_owner() {
        let owner = Uuid::new_v4();
        let author = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let project = Project::new("Apollo", None, owner);
        let now = Utc::now();
        let doc = Documentation {
            id: Uuid::new_v4(),
            title: "Runbook".to_string(),
            content: String::new(),
            doc_type: DocType::Markdown,
            language: None,
            url: None,
            author_id: author,
            project_id: project.id,
            task_id: None,
            created_at: now,
            updated_at: now,
        };

        assert!(authorize_documentation_edit(author, &doc, &project).is_ok());
        assert!(authorize_documentation_edit(owner, &doc, &project).is_ok());
        assert!(authorize_documentation_edit(admin, &doc, &project).is_err());
    }
}
