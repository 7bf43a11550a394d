//! Postgres entity store. Expects the tables in `sql/schema.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Documentation, Membership, Project, Task, User};
use crate::database::store::{EntityStore, StoreTx};
use crate::filter::{DocumentationQuery, TaskQuery};

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at";
const PROJECT_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, status, priority, project_id, assignee_id, created_at, updated_at";
const DOCUMENTATION_COLUMNS: &str = "id, title, content, doc_type, language, url, author_id, \
     project_id, task_id, created_at, updated_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(FromRow)]
struct MembershipRow {
    project_id: Uuid,
    user_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DatabaseError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            project_id: row.project_id,
            user_id: row.user_id,
            role: row.role.parse().map_err(invalid_row)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    project_id: Uuid,
    assignee_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status.parse().map_err(invalid_row)?,
            priority: row.priority.parse().map_err(invalid_row)?,
            project_id: row.project_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DocumentationRow {
    id: Uuid,
    title: String,
    content: String,
    doc_type: String,
    language: Option<String>,
    url: Option<String>,
    author_id: Uuid,
    project_id: Uuid,
    task_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentationRow> for Documentation {
    type Error = DatabaseError;

    fn try_from(row: DocumentationRow) -> Result<Self, Self::Error> {
        Ok(Documentation {
            id: row.id,
            title: row.title,
            content: row.content,
            doc_type: row.doc_type.parse().map_err(invalid_row)?,
            language: row.language,
            url: row.url,
            author_id: row.author_id,
            project_id: row.project_id,
            task_id: row.task_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn invalid_row(err: crate::database::models::UnknownVariant) -> DatabaseError {
    DatabaseError::InvalidRow(err.to_string())
}

/// Unique violations become `Conflict` with a client-facing message.
fn unique_violation(err: sqlx::Error, message: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Conflict(message.to_string()),
        _ => DatabaseError::Sqlx(err),
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Escape LIKE metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_violation(e, "Email or username already registered"))?;
        Ok(())
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_users(&mut self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(users)
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, owner_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.owner_id)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(project)
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE projects SET name = $2, description = $3, updated_at = $4 WHERE id = $1")
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_project(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn projects_visible_to(&mut self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.owner_id = $1
                OR EXISTS (SELECT 1 FROM project_members m WHERE m.project_id = p.id AND m.user_id = $1)
             ORDER BY p.created_at, p.id"
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(projects)
    }

    async fn find_membership(&mut self, project_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, DatabaseError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            "SELECT project_id, user_id, role, created_at FROM project_members
             WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Membership::try_from).transpose()
    }

    async fn insert_membership(&mut self, membership: &Membership) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(membership.project_id)
        .bind(membership.user_id)
        .bind(membership.role.as_str())
        .bind(membership.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_violation(e, "User is already a member of this project"))?;
        Ok(())
    }

    async fn project_memberships(&mut self, project_id: Uuid) -> Result<Vec<Membership>, DatabaseError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT project_id, user_id, role, created_at FROM project_members
             WHERE project_id = $1 ORDER BY created_at, user_id",
        )
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn delete_memberships(&mut self, project_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, priority, project_id, assignee_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.project_id)
        .bind(task.assignee_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(Task::try_from).transpose()
    }

    async fn update_task(&mut self, task: &Task) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE tasks SET title = $2, description = $3, status = $4, priority = $5,
                 assignee_id = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.assignee_id)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_tasks(&mut self, query: &TaskQuery) -> Result<Vec<Task>, DatabaseError> {
        if query.project_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ANY($1) ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(query.project_ids.clone())
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn insert_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO documentation (id, title, content, doc_type, language, url, author_id,
                 project_id, task_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.doc_type.as_str())
        .bind(&doc.language)
        .bind(&doc.url)
        .bind(doc.author_id)
        .bind(doc.project_id)
        .bind(doc.task_id)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_documentation(&mut self, id: Uuid) -> Result<Option<Documentation>, DatabaseError> {
        let sql = format!("SELECT {DOCUMENTATION_COLUMNS} FROM documentation WHERE id = $1");
        let row = sqlx::query_as::<_, DocumentationRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(Documentation::try_from).transpose()
    }

    async fn update_documentation(&mut self, doc: &Documentation) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE documentation SET title = $2, content = $3, doc_type = $4, language = $5,
                 url = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.doc_type.as_str())
        .bind(&doc.language)
        .bind(&doc.url)
        .bind(doc.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_documentation(&mut self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM documentation WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_documentation(&mut self, query: &DocumentationQuery) -> Result<Vec<Documentation>, DatabaseError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {DOCUMENTATION_COLUMNS} FROM documentation WHERE TRUE"));

        if let Some(ids) = &query.project_ids {
            qb.push(" AND project_id = ANY(").push_bind(ids.clone()).push(")");
        }
        if let Some(project_id) = query.project_id {
            qb.push(" AND project_id = ").push_bind(project_id);
        }
        if let Some(task_id) = query.task_id {
            qb.push(" AND task_id = ").push_bind(task_id);
        }
        if let Some(doc_type) = query.doc_type {
            qb.push(" AND doc_type = ").push_bind(doc_type.as_str());
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR content ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY created_at, id");

        let rows = qb
            .build_query_as::<DocumentationRow>()
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}
