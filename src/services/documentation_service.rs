//! Documentation items. Creation goes through the anchor resolver; edits
//! are limited to the author and the anchoring project's owner.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{required_text, ServiceError};
use crate::access::{authorize_documentation_edit, require, resolve_anchor, visibility, Action, AnchorInput};
use crate::api::double_option;
use crate::api::format::{DocumentationDetail, UserSummary};
use crate::database::models::{DocType, Documentation, Project};
use crate::database::StoreTx;
use crate::filter::DocumentationFilter;

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocumentation {
    pub title: String,
    pub content: String,
    pub doc_type: DocType,
    pub language: Option<String>,
    pub url: Option<String>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Anchors are fixed at creation and cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentationChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub doc_type: Option<DocType>,
    #[serde(default, deserialize_with = "double_option")]
    pub language: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
}

pub async fn create(
    tx: &mut dyn StoreTx,
    caller: Uuid,
    input: NewDocumentation,
) -> Result<DocumentationDetail, ServiceError> {
    let anchor = resolve_anchor(
        tx,
        AnchorInput {
            project_id: input.project_id,
            task_id: input.task_id,
        },
    )
    .await?;
    require(tx, caller, anchor.project_id, Action::AttachDocumentation).await?;

    let now = Utc::now();
    let doc = Documentation {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title)?,
        content: input.content,
        doc_type: input.doc_type,
        language: input.language,
        url: input.url,
        author_id: caller,
        project_id: anchor.project_id,
        task_id: anchor.task_id,
        created_at: now,
        updated_at: now,
    };
    tx.insert_documentation(&doc).await?;

    info!(
        "Created documentation {} in project {} (task {:?})",
        doc.id, doc.project_id, doc.task_id
    );
    with_author(tx, doc).await
}

pub async fn list(
    tx: &mut dyn StoreTx,
    caller: Uuid,
    filter: &DocumentationFilter,
) -> Result<Vec<DocumentationDetail>, ServiceError> {
    let docs = visibility::visible_documentation(tx, caller, filter).await?;

    let mut author_ids: Vec<Uuid> = docs.iter().map(|d| d.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = tx.find_users(&author_ids).await?;

    Ok(docs
        .into_iter()
        .map(|doc| {
            let author = authors.iter().find(|u| u.id == doc.author_id).map(UserSummary::from);
            DocumentationDetail {
                documentation: doc,
                author,
            }
        })
        .collect())
}

pub async fn get(tx: &mut dyn StoreTx, caller: Uuid, doc_id: Uuid) -> Result<DocumentationDetail, ServiceError> {
    let doc = find(tx, doc_id).await?;
    require(tx, caller, doc.project_id, Action::ViewProject).await?;
    with_author(tx, doc).await
}

pub async fn update(
    tx: &mut dyn StoreTx,
    caller: Uuid,
    doc_id: Uuid,
    changes: DocumentationChanges,
) -> Result<DocumentationDetail, ServiceError> {
    let (mut doc, project) = find_with_project(tx, doc_id).await?;
    authorize_documentation_edit(caller, &doc, &project)?;

    if let Some(title) = changes.title {
        doc.title = required_text("title", &title)?;
    }
    if let Some(content) = changes.content {
        doc.content = content;
    }
    if let Some(doc_type) = changes.doc_type {
        doc.doc_type = doc_type;
    }
    if let Some(language) = changes.language {
        doc.language = language;
    }
    if let Some(url) = changes.url {
        doc.url = url;
    }
    doc.touch();

    tx.update_documentation(&doc).await?;
    with_author(tx, doc).await
}

pub async fn delete(tx: &mut dyn StoreTx, caller: Uuid, doc_id: Uuid) -> Result<(), ServiceError> {
    let (doc, project) = find_with_project(tx, doc_id).await?;
    authorize_documentation_edit(caller, &doc, &project)?;

    tx.delete_documentation(doc.id).await?;
    info!("Deleted documentation {} from project {}", doc.id, project.id);
    Ok(())
}

async fn find(tx: &mut dyn StoreTx, doc_id: Uuid) -> Result<Documentation, ServiceError> {
    tx.find_documentation(doc_id)
        .await?
        .ok_or(ServiceError::not_found("Documentation"))
}

async fn find_with_project(tx: &mut dyn StoreTx, doc_id: Uuid) -> Result<(Documentation, Project), ServiceError> {
    let doc = find(tx, doc_id).await?;
    let project = tx
        .find_project(doc.project_id)
        .await?
        .ok_or(ServiceError::not_found("Project"))?;
    Ok((doc, project))
}

async fn with_author(tx: &mut dyn StoreTx, doc: Documentation) -> Result<DocumentationDetail, ServiceError> {
    let author = tx.find_user(doc.author_id).await?.map(UserSummary::from);
    Ok(DocumentationDetail {
        documentation: doc,
        author,
    })
}
