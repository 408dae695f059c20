// rest/routes/tasks.rs — Task CRUD routes.
//
// Validation happens here, before anything touches the store. The
// create/update rules are deliberately asymmetric: create coerces an invalid
// status or priority to its default, update rejects it with a 400. Observable
// behavior depends on this split; do not unify the two paths.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::store::{NewTask, TaskChanges, TaskFilter, TaskRow};
use crate::AppContext;

/// Allowed `status` values.
pub const ALLOWED_STATUSES: &[&str] = &["pending", "in-progress", "done"];

const DEFAULT_STATUS: &str = "pending";
const DEFAULT_PRIORITY: i32 = 1;
const MIN_PRIORITY: i32 = 1;
const MAX_PRIORITY: i32 = 5;

/// Incoming task body for both create and update. Everything is optional at
/// the type level; `title` presence is enforced by validation so the error
/// body stays in our shape.
#[derive(Debug, Default, Deserialize)]
pub struct TaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

impl TaskPayload {
    /// Create-side coercion: an invalid or absent status/priority falls back
    /// to its default instead of being rejected.
    fn into_new_task(self) -> Result<NewTask, ApiError> {
        let title = require_title(self.title.as_deref())?;
        let status = self
            .status
            .filter(|s| is_valid_status(s))
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let priority = self
            .priority
            .filter(|p| is_valid_priority(*p))
            .unwrap_or(DEFAULT_PRIORITY);
        Ok(NewTask {
            title,
            description: none_if_blank(self.description),
            status,
            priority,
            due_date: self.due_date,
        })
    }

    /// Update-side validation: a present-but-invalid status or priority is
    /// rejected; an absent one keeps the stored value.
    fn into_changes(self) -> Result<TaskChanges, ApiError> {
        let title = require_title(self.title.as_deref())?;
        if let Some(status) = &self.status {
            if !is_valid_status(status) {
                return Err(ApiError::Validation(format!(
                    "Invalid status: must be one of {}",
                    ALLOWED_STATUSES.join(", ")
                )));
            }
        }
        if let Some(priority) = self.priority {
            if !is_valid_priority(priority) {
                return Err(ApiError::Validation(format!(
                    "Invalid priority: must be an integer between {MIN_PRIORITY} and {MAX_PRIORITY}"
                )));
            }
        }
        Ok(TaskChanges {
            title,
            description: none_if_blank(self.description),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        })
    }
}

/// List query parameters, string-typed so an unparseable value is ignored
/// rather than rejected (filtering is best-effort narrowing).
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    fn into_filter(self) -> TaskFilter {
        TaskFilter {
            status: self.status.filter(|s| is_valid_status(s)),
            priority: self
                .priority
                .and_then(|p| p.parse().ok())
                .filter(|p| is_valid_priority(*p)),
            limit: self.limit.and_then(|l| l.parse().ok()).filter(|l| *l > 0),
        }
    }
}

fn is_valid_status(status: &str) -> bool {
    ALLOWED_STATUSES.contains(&status)
}

fn is_valid_priority(priority: i32) -> bool {
    (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority)
}

/// Trimmed, non-empty title or a 400.
fn require_title(title: Option<&str>) -> Result<String, ApiError> {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ApiError::Validation("Title is required".to_string())),
    }
}

/// Empty-string descriptions normalize to NULL.
fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Path ids are parsed by hand so a non-numeric id yields our 400 body
/// without ever reaching the store.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TaskRow>>, ApiError> {
    let tasks = ctx
        .store
        .find_all(params.into_filter())
        .await
        .map_err(|e| ApiError::database("Failed to fetch tasks", e))?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<TaskRow>, ApiError> {
    let id = parse_id(&id)?;
    let task = ctx
        .store
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::database("Failed to fetch task", e))?;
    task.map(Json).ok_or(ApiError::NotFound)
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(payload): Json<TaskPayload>,
) -> Result<(StatusCode, Json<TaskRow>), ApiError> {
    let new_task = payload.into_new_task()?;
    let task = ctx
        .store
        .insert(new_task)
        .await
        .map_err(|e| ApiError::database("Failed to create task", e))?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<TaskRow>, ApiError> {
    let id = parse_id(&id)?;
    let changes = payload.into_changes()?;
    let task = ctx
        .store
        .update(id, changes)
        .await
        .map_err(|e| ApiError::database("Failed to update task", e))?;
    task.map(Json).ok_or(ApiError::NotFound)
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<TaskRow>, ApiError> {
    let id = parse_id(&id)?;
    let task = ctx
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::database("Failed to delete task", e))?;
    task.map(Json).ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: Option<&str>) -> TaskPayload {
        TaskPayload {
            title: title.map(String::from),
            ..TaskPayload::default()
        }
    }

    #[test]
    fn create_requires_title() {
        assert!(matches!(
            payload(None).into_new_task(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            payload(Some("")).into_new_task(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            payload(Some("   \t ")).into_new_task(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn create_trims_title() {
        let task = payload(Some("  write report  ")).into_new_task().unwrap();
        assert_eq!(task.title, "write report");
    }

    #[test]
    fn create_defaults_absent_fields() {
        let task = payload(Some("x")).into_new_task().unwrap();
        assert_eq!(task.status, "pending");
        assert_eq!(task.priority, 1);
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn create_coerces_invalid_status_to_default() {
        let task = TaskPayload {
            status: Some("archived".to_string()),
            ..payload(Some("x"))
        }
        .into_new_task()
        .unwrap();
        assert_eq!(task.status, "pending");
    }

    #[test]
    fn create_coerces_out_of_range_priority_to_default() {
        for bad in [0, -3, 6, 99] {
            let task = TaskPayload {
                priority: Some(bad),
                ..payload(Some("x"))
            }
            .into_new_task()
            .unwrap();
            assert_eq!(task.priority, 1, "priority {bad} should fall back to 1");
        }
    }

    #[test]
    fn create_keeps_valid_status_and_priority() {
        let task = TaskPayload {
            status: Some("in-progress".to_string()),
            priority: Some(5),
            ..payload(Some("x"))
        }
        .into_new_task()
        .unwrap();
        assert_eq!(task.status, "in-progress");
        assert_eq!(task.priority, 5);
    }

    #[test]
    fn create_blanks_empty_description() {
        let task = TaskPayload {
            description: Some(String::new()),
            ..payload(Some("x"))
        }
        .into_new_task()
        .unwrap();
        assert_eq!(task.description, None);
    }

    #[test]
    fn update_requires_title() {
        assert!(matches!(
            payload(Some(" ")).into_changes(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn update_rejects_invalid_status() {
        let result = TaskPayload {
            status: Some("archived".to_string()),
            ..payload(Some("x"))
        }
        .into_changes();
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn update_rejects_out_of_range_priority() {
        for bad in [0, -1, 6] {
            let result = TaskPayload {
                priority: Some(bad),
                ..payload(Some("x"))
            }
            .into_changes();
            assert!(
                matches!(result, Err(ApiError::Validation(_))),
                "priority {bad} should be rejected on update"
            );
        }
    }

    #[test]
    fn update_merges_absent_status_and_priority() {
        let changes = payload(Some("x")).into_changes().unwrap();
        assert_eq!(changes.status, None);
        assert_eq!(changes.priority, None);
    }

    #[test]
    fn update_passes_valid_fields_through() {
        let changes = TaskPayload {
            status: Some("done".to_string()),
            priority: Some(2),
            ..payload(Some("x"))
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.status.as_deref(), Some("done"));
        assert_eq!(changes.priority, Some(2));
    }

    #[test]
    fn id_parsing_rejects_non_numeric() {
        assert!(parse_id("17").is_ok());
        assert!(matches!(parse_id("abc"), Err(ApiError::InvalidId)));
        assert!(matches!(parse_id("1.5"), Err(ApiError::InvalidId)));
        assert!(matches!(parse_id(""), Err(ApiError::InvalidId)));
    }

    #[test]
    fn list_params_ignore_invalid_values() {
        let filter = ListParams {
            status: Some("archived".to_string()),
            priority: Some("high".to_string()),
            limit: Some("-2".to_string()),
        }
        .into_filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.priority, None);
        assert_eq!(filter.limit, None);
    }

    #[test]
    fn list_params_keep_valid_values() {
        let filter = ListParams {
            status: Some("done".to_string()),
            priority: Some("3".to_string()),
            limit: Some("10".to_string()),
        }
        .into_filter();
        assert_eq!(filter.status.as_deref(), Some("done"));
        assert_eq!(filter.priority, Some(3));
        assert_eq!(filter.limit, Some(10));
    }
}
