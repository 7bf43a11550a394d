use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Documentation, Membership, Project, Task, User};
use crate::filter::{DocumentationQuery, TaskQuery};

/// Durable storage for users, projects, memberships, tasks and
/// documentation. All reads and writes go through a transaction obtained
/// from `begin`; there is no ambient session.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// A request-scoped unit of work. Dropping it without `commit` discards
/// every write made through it.
///
/// The store does not cascade: deleting a parent with live children is the
/// caller's responsibility (see `services::cascade`).
#[async_trait]
pub trait StoreTx: Send {
    /// Fails with `Conflict` when the email or username is taken.
    async fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError>;
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError>;

    async fn insert_project(&mut self, project: &Project) -> Result<(), DatabaseError>;
    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, DatabaseError>;
    async fn update_project(&mut self, project: &Project) -> Result<(), DatabaseError>;
    async fn delete_project(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    /// Projects `user_id` owns or holds any membership in.
    async fn projects_visible_to(&mut self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError>;

    async fn find_membership(&mut self, project_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, DatabaseError>;
    /// Fails with `Conflict` when the user already has a role in the project.
    async fn insert_membership(&mut self, membership: &Membership) -> Result<(), DatabaseError>;
    async fn project_memberships(&mut self, project_id: Uuid) -> Result<Vec<Membership>, DatabaseError>;
    async fn delete_memberships(&mut self, project_id: Uuid) -> Result<u64, DatabaseError>;

    async fn insert_task(&mut self, task: &Task) -> Result<(), DatabaseError>;
    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, DatabaseError>;
    async fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError>;
    async fn delete_task(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn list_tasks(&mut self, query: &TaskQuery) -> Result<Vec<Task>, DatabaseError>;

    async fn insert_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError>;
    async fn find_documentation(&mut self, id: Uuid) -> Result<Option<Documentation>, DatabaseError>;
    async fn update_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError>;
    async fn delete_documentation(&mut self, id: Uuid) -> Result<(), DatabaseError>;
    async fn list_documentation(&mut self, query: &DocumentationQuery) -> Result<Vec<Documentation>, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}
