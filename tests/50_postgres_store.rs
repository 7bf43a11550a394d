//! Runs the visibility and documentation filters against a real Postgres.
//! Each test loads `sql/schema.sql` into a throwaway schema on the database
//! named by `DATABASE_URL`; without it the tests return early.

use anyhow::Result;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use uuid::Uuid;

use devhub_api::access::visibility::{visible_documentation, visible_projects, visible_tasks};
use devhub_api::database::models::{DocType, Documentation, Membership, Project, Role, Task, User};
use devhub_api::database::{EntityStore, PgStore};
use devhub_api::filter::DocumentationFilter;

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

struct PgWorld {
    admin: PgPool,
    pool: PgPool,
    schema: String,
    store: PgStore,
    owner: Uuid,
    viewer: Uuid,
    stranger: Uuid,
    shared: Project,
    task: Task,
}

impl PgWorld {
    /// Drops the schema; call at the end of each test
    async fn teardown(self) -> Result<()> {
        drop(self.store);
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}

fn doc(author: Uuid, project_id: Uuid, task_id: Option<Uuid>, title: &str, content: &str, doc_type: DocType) -> Documentation {
    let now = Utc::now();
    Documentation {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.to_string(),
        doc_type,
        language: None,
        url: None,
        author_id: author,
        project_id,
        task_id,
        created_at: now,
        updated_at: now,
    }
}

async fn world() -> Result<Option<PgWorld>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return Ok(None);
    };

    let schema = format!("devhub_test_{}", Uuid::new_v4().simple());
    let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
    admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

    let search_path = format!("SET search_path TO {}", schema);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let sql = search_path.clone();
            Box::pin(async move {
                conn.execute(sql.as_str()).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await?;
    pool.execute(SCHEMA_SQL).await?;

    let owner = User::new("owner@example.com", "owner", "x".to_string());
    let viewer = User::new("viewer@example.com", "viewer", "x".to_string());
    let stranger = User::new("stranger@example.com", "stranger", "x".to_string());
    let shared = Project::new("Shared", None, owner.id);
    let private = Project::new("Private", None, owner.id);
    let task = Task::new(shared.id, "Design API");

    let store = PgStore::new(pool.clone());
    let mut tx = store.begin().await?;
    for user in [&owner, &viewer, &stranger] {
        tx.insert_user(user).await?;
    }
    tx.insert_project(&shared).await?;
    tx.insert_project(&private).await?;
    tx.insert_membership(&Membership::new(shared.id, viewer.id, Role::Viewer)).await?;
    tx.insert_task(&task).await?;
    tx.insert_task(&Task::new(private.id, "Secret")).await?;
    for d in [
        doc(owner.id, shared.id, None, "API Guide", "auth flow", DocType::Markdown),
        doc(owner.id, shared.id, Some(task.id), "Endpoints", "list", DocType::Markdown),
        doc(owner.id, shared.id, None, "Coverage", "100% done", DocType::Link),
        doc(owner.id, private.id, None, "Billing", "invoices", DocType::Markdown),
    ] {
        tx.insert_documentation(&d).await?;
    }
    tx.commit().await?;

    Ok(Some(PgWorld {
        admin,
        pool,
        schema,
        store,
        owner: owner.id,
        viewer: viewer.id,
        stranger: stranger.id,
        shared,
        task,
    }))
}

fn titles(docs: &[Documentation]) -> Vec<&str> {
    docs.iter().map(|d| d.title.as_str()).collect()
}

fn search(term: &str) -> DocumentationFilter {
    DocumentationFilter {
        search: Some(term.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn projects_visible_to_owner_or_member() -> Result<()> {
    let Some(w) = world().await? else { return Ok(()) };
    let mut tx = w.store.begin().await?;

    let projects = visible_projects(tx.as_mut(), w.viewer).await?;
    assert_eq!(projects.iter().map(|p| p.id).collect::<Vec<_>>(), vec![w.shared.id]);
    assert_eq!(visible_projects(tx.as_mut(), w.owner).await?.len(), 2);
    assert!(visible_projects(tx.as_mut(), w.stranger).await?.is_empty());

    let tasks = visible_tasks(tx.as_mut(), w.viewer, None).await?;
    assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![w.task.id]);
    assert_eq!(visible_tasks(tx.as_mut(), w.owner, None).await?.len(), 2);

    tx.commit().await?;
    w.teardown().await
}

#[tokio::test]
async fn documentation_is_limited_to_visible_projects() -> Result<()> {
    let Some(w) = world().await? else { return Ok(()) };
    let mut tx = w.store.begin().await?;

    let docs = visible_documentation(tx.as_mut(), w.viewer, &DocumentationFilter::default()).await?;
    assert_eq!(docs.len(), 3);
    assert!(docs.iter().all(|d| d.project_id == w.shared.id));
    assert!(visible_documentation(tx.as_mut(), w.stranger, &DocumentationFilter::default())
        .await?
        .is_empty());

    // Project filter includes documentation anchored through the project's tasks
    let by_project = DocumentationFilter {
        project_id: Some(w.shared.id),
        ..Default::default()
    };
    let docs = visible_documentation(tx.as_mut(), w.viewer, &by_project).await?;
    assert!(titles(&docs).contains(&"Endpoints"));

    let by_task = DocumentationFilter {
        task_id: Some(w.task.id),
        ..Default::default()
    };
    let docs = visible_documentation(tx.as_mut(), w.viewer, &by_task).await?;
    assert_eq!(titles(&docs), vec!["Endpoints"]);

    tx.commit().await?;
    w.teardown().await
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() -> Result<()> {
    let Some(w) = world().await? else { return Ok(()) };
    let mut tx = w.store.begin().await?;

    assert_eq!(titles(&visible_documentation(tx.as_mut(), w.viewer, &search("api")).await?), vec!["API Guide"]);
    assert_eq!(titles(&visible_documentation(tx.as_mut(), w.viewer, &search("AUTH")).await?), vec!["API Guide"]);
    assert!(visible_documentation(tx.as_mut(), w.viewer, &search("billing")).await?.is_empty());
    assert_eq!(visible_documentation(tx.as_mut(), w.owner, &search("billing")).await?.len(), 1);

    // LIKE wildcards in the term match only themselves
    assert_eq!(titles(&visible_documentation(tx.as_mut(), w.viewer, &search("%")).await?), vec!["Coverage"]);
    assert!(visible_documentation(tx.as_mut(), w.viewer, &search("_uide")).await?.is_empty());

    tx.commit().await?;
    w.teardown().await
}

#[tokio::test]
async fn doc_type_composes_with_search() -> Result<()> {
    let Some(w) = world().await? else { return Ok(()) };
    let mut tx = w.store.begin().await?;

    let filter = |doc_type: DocType| DocumentationFilter {
        search: Some("api".to_string()),
        doc_type: Some(doc_type),
        ..Default::default()
    };
    assert_eq!(titles(&visible_documentation(tx.as_mut(), w.viewer, &filter(DocType::Markdown)).await?), vec!["API Guide"]);
    assert!(visible_documentation(tx.as_mut(), w.viewer, &filter(DocType::Link)).await?.is_empty());

    tx.commit().await?;
    w.teardown().await
}
