use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Markdown,
    Link,
    CodeSnippet,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Markdown => "markdown",
            DocType::Link => "link",
            DocType::CodeSnippet => "code_snippet",
        }
    }
}

impl FromStr for DocType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(DocType::Markdown),
            "link" => Ok(DocType::Link),
            "code_snippet" => Ok(DocType::CodeSnippet),
            other => Err(UnknownVariant::new("documentation type", other)),
        }
    }
}

/// A documentation item. `project_id` is always populated; when `task_id`
/// is set it is the task's project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub doc_type: DocType,
    /// Source language, meaningful for code snippets.
    pub language: Option<String>,
    /// Target, meaningful for links.
    pub url: Option<String>,
    pub author_id: Uuid,
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Documentation {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
