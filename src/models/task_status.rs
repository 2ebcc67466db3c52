use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;

lazy_static! {
    // Slugs are lowercase identifiers such as `to_review`.
    static ref SLUG_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9_]+$").unwrap();
}

/// A workflow state a task can be in, referenced from tasks by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewTaskStatus {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaskStatusCreateRequest {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(
        length(min = 1, max = 100),
        regex(
            path = "SLUG_REGEX",
            message = "Slug may contain lowercase letters, digits and underscores only"
        )
    )]
    pub slug: String,
}

impl From<TaskStatusCreateRequest> for NewTaskStatus {
    fn from(request: TaskStatusCreateRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TaskStatusUpdateRequest {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 100),
        regex(
            path = "SLUG_REGEX",
            message = "Slug may contain lowercase letters, digits and underscores only"
        )
    )]
    pub slug: Option<String>,
}

impl TaskStatusUpdateRequest {
    pub fn apply_to(self, status: &mut TaskStatus) {
        if let Some(name) = self.name {
            status.name = name;
        }
        if let Some(slug) = self.slug {
            status.slug = slug;
        }
    }
}
