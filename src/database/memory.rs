//! In-memory entity store.
//!
//! A transaction holds the store's mutex for its whole life and works on a
//! snapshot, so transactions are fully serialized. `commit` writes the
//! snapshot back; dropping the transaction throws it away.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Documentation, Membership, Project, Task, User};
use crate::database::store::{EntityStore, StoreTx};
use crate::filter::{DocumentationQuery, TaskQuery};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    /// Keyed by (project_id, user_id)
    memberships: HashMap<(Uuid, Uuid), Membership>,
    tasks: HashMap<Uuid, Task>,
    documentation: HashMap<Uuid, Documentation>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

/// Stable ordering for list results: oldest first, ties by id.
fn sorted_by_creation<T, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.sort_by_key(key);
    out
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        let users = &self.working.users;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("Email already registered".to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("Username already taken".to_string()));
        }
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.working.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        Ok(ids.iter().filter_map(|id| self.working.users.get(id).cloned()).collect())
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), DatabaseError> {
        self.working.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        Ok(self.working.projects.get(&id).cloned())
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), DatabaseError> {
        if let Some(existing) = self.working.projects.get_mut(&project.id) {
            *existing = project.clone();
        }
        Ok(())
    }

    async fn delete_project(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        self.working.projects.remove(&id);
        Ok(())
    }

    async fn projects_visible_to(&mut self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let state = &self.working;
        let visible = state.projects.values().filter(|p| {
            p.owner_id == user_id || state.memberships.contains_key(&(p.id, user_id))
        });
        Ok(sorted_by_creation(visible.cloned(), |p| (p.created_at, p.id)))
    }

    async fn find_membership(&mut self, project_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, DatabaseError> {
        Ok(self.working.memberships.get(&(project_id, user_id)).cloned())
    }

    async fn insert_membership(&mut self, membership: &Membership) -> Result<(), DatabaseError> {
        let key = (membership.project_id, membership.user_id);
        if self.working.memberships.contains_key(&key) {
            return Err(DatabaseError::Conflict("User is already a member of this project".to_string()));
        }
        self.working.memberships.insert(key, membership.clone());
        Ok(())
    }

    async fn project_memberships(&mut self, project_id: Uuid) -> Result<Vec<Membership>, DatabaseError> {
        let rows = self.working.memberships.values().filter(|m| m.project_id == project_id);
        Ok(sorted_by_creation(rows.cloned(), |m| (m.created_at, m.user_id)))
    }

    async fn delete_memberships(&mut self, project_id: Uuid) -> Result<u64, DatabaseError> {
        let before = self.working.memberships.len();
        self.working.memberships.retain(|(pid, _), _| *pid != project_id);
        Ok((before - self.working.memberships.len()) as u64)
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        self.working.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, DatabaseError> {
        Ok(self.working.tasks.get(&id).cloned())
    }

    async fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        if let Some(existing) = self.working.tasks.get_mut(&task.id) {
            *existing = task.clone();
        }
        Ok(())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        self.working.tasks.remove(&id);
        Ok(())
    }

    async fn list_tasks(&mut self, query: &TaskQuery) -> Result<Vec<Task>, DatabaseError> {
        let rows = self.working.tasks.values().filter(|t| query.matches(t));
        Ok(sorted_by_creation(rows.cloned(), |t| (t.created_at, t.id)))
    }

    async fn insert_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError> {
        self.working.documentation.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn find_documentation(&mut self, id: Uuid) -> Result<Option<Documentation>, DatabaseError> {
        Ok(self.working.documentation.get(&id).cloned())
    }

    async fn update_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError> {
        if let Some(existing) = self.working.documentation.get_mut(&doc.id) {
            *existing = doc.clone();
        }
        Ok(())
    }

    async fn delete_documentation(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        self.working.documentation.remove(&id);
        Ok(())
    }

    async fn list_documentation(&mut self, query: &DocumentationQuery) -> Result<Vec<Documentation>, DatabaseError> {
        let rows = self.working.documentation.values().filter(|d| query.matches(d));
        Ok(sorted_by_creation(rows.cloned(), |d| (d.created_at, d.id)))
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;

    #[tokio::test]
    async fn uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        let user = User::new("a@example.com", "alice", "x".to_string());

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let user = User::new("a@example.com", "alice", "x".to_string());

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.find_user_by_username("alice").await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&User::new("a@example.com", "alice", "x".to_string())).await.unwrap();

        let err = tx
            .insert_user(&User::new("b@example.com", "alice", "x".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_membership_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let project_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        tx.insert_membership(&Membership::new(project_id, user_id, Role::Viewer)).await.unwrap();
        let err = tx
            .insert_membership(&Membership::new(project_id, user_id, Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(
            tx.find_membership(project_id, user_id).await.unwrap().map(|m| m.role),
            Some(Role::Viewer)
        );
    }

    #[tokio::test]
    async fn visible_projects_cover_owner_and_member() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let project = Project::new("Apollo", None, owner);
        tx.insert_project(&project).await.unwrap();
        tx.insert_membership(&Membership::new(project.id, viewer, Role::Viewer)).await.unwrap();

        assert_eq!(tx.projects_visible_to(owner).await.unwrap().len(), 1);
        assert_eq!(tx.projects_visible_to(viewer).await.unwrap().len(), 1);
        assert!(tx.projects_visible_to(stranger).await.unwrap().is_empty());
    }
}
