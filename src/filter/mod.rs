//! Predicates for list queries.
//!
//! A query value describes *which* rows a list endpoint may return. The
//! access layer builds them from the caller's visibility; each store
//! evaluates them its own way (`matches` in memory, SQL in Postgres).

use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{DocType, Documentation, Task};

/// Tasks whose project is one of `project_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub project_ids: Vec<Uuid>,
}

impl TaskQuery {
    pub fn in_project(project_id: Uuid) -> Self {
        Self {
            project_ids: vec![project_id],
        }
    }

    pub fn in_projects(project_ids: Vec<Uuid>) -> Self {
        Self { project_ids }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.project_ids.contains(&task.project_id)
    }
}

/// Conjunction of documentation conditions. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentationQuery {
    /// Restrict to documentation anchored in one of these projects.
    pub project_ids: Option<Vec<Uuid>>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Case-insensitive substring over title or content.
    pub search: Option<String>,
    pub doc_type: Option<DocType>,
}

impl DocumentationQuery {
    /// Every item stored under a project, whether anchored directly or via
    /// one of its tasks.
    pub fn for_project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn for_task(task_id: Uuid) -> Self {
        Self {
            task_id: Some(task_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, doc: &Documentation) -> bool {
        if let Some(ids) = &self.project_ids {
            if !ids.contains(&doc.project_id) {
                return false;
            }
        }
        if self.project_id.is_some_and(|id| id != doc.project_id) {
            return false;
        }
        if self.task_id.is_some() && self.task_id != doc.task_id {
            return false;
        }
        if self.doc_type.is_some_and(|t| t != doc.doc_type) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            if !doc.title.to_lowercase().contains(&needle)
                && !doc.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Query string accepted by `GET /documentation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentationFilter {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub search: Option<String>,
    pub doc_type: Option<DocType>,
}

impl DocumentationFilter {
    /// An empty search term is treated as absent; any other term, including
    /// its whitespace, is matched literally.
    pub fn search_term(&self) -> Option<String> {
        self.search.clone().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn doc(title: &str, content: &str, doc_type: DocType) -> Documentation {
        let now = Utc::now();
        Documentation {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            doc_type,
            language: None,
            url: None,
            author_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            task_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_matches_title_or_content_ignoring_case() {
        let d = doc("API Guide", "auth flow", DocType::Markdown);

        let q = |s: &str| DocumentationQuery {
            search: Some(s.to_string()),
            ..Default::default()
        };

        assert!(q("api").matches(&d));
        assert!(q("AUTH").matches(&d));
        assert!(!q("billing").matches(&d));
    }

    #[test]
    fn conditions_compose_with_and() {
        let d = doc("API Guide", "auth flow", DocType::Markdown);

        let wrong_type = DocumentationQuery {
            search: Some("api".to_string()),
            doc_type: Some(DocType::Link),
            ..Default::default()
        };
        assert!(!wrong_type.matches(&d));

        let right_type = DocumentationQuery {
            search: Some("api".to_string()),
            doc_type: Some(DocType::Markdown),
            project_ids: Some(vec![d.project_id]),
            ..Default::default()
        };
        assert!(right_type.matches(&d));
    }

    #[test]
    fn visible_project_set_restricts() {
        let d = doc("Notes", "", DocType::Markdown);
        let q = DocumentationQuery {
            project_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(!q.matches(&d));
    }

    #[test]
    fn task_filter_excludes_project_level_docs() {
        let d = doc("Notes", "", DocType::Markdown);
        assert!(!DocumentationQuery::for_task(Uuid::new_v4()).matches(&d));
        assert!(DocumentationQuery::for_project(d.project_id).matches(&d));
    }

    #[test]
    fn empty_search_is_ignored() {
        let filter = DocumentationFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);
    }

    #[test]
    fn search_whitespace_is_part_of_the_term() {
        let filter = DocumentationFilter {
            search: Some(" flow".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term().as_deref(), Some(" flow"));

        let q = DocumentationQuery {
            search: filter.search_term(),
            ..Default::default()
        };
        assert!(!q.matches(&doc("Notes", "authflow", DocType::Markdown)));
        assert!(q.matches(&doc("Notes", "auth flow", DocType::Markdown)));
    }
}
