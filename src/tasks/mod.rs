//! Owner-scoped task persistence.
//!
//! Every query filters by the authenticated owner's id — no code path in
//! this module can see, replace, or remove another owner's rows. Update
//! deliberately omits `owner` from its SET list so ownership can never be
//! reassigned after creation.

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the server indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A persisted task. `effort` and `due_date` are `None` when the value was
/// unparseable at import time (the not-a-number / invalid-date sentinels —
/// SQLite REAL cannot hold NaN, so NULL carries the sentinel).
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub effort: Option<f64>,
    /// ISO `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub created_at: String,
}

/// Validated task fields, ready for insert. Owner and id are never part of
/// a draft — the store assigns the id and the caller's identity supplies
/// the owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub effort: Option<f64>,
    pub due_date: Option<String>,
}

impl TaskDraft {
    /// Build a draft from a JSON request body, with strict typed parsing:
    /// a missing or blank title, a non-numeric `effort`, or an unparseable
    /// `dueDate` is a validation failure. Caller-supplied `owner` and `id`
    /// fields are ignored.
    ///
    /// Import rows go through `import::draft_from_record` instead, which
    /// applies the sentinel-on-failure policy for typed fields.
    pub fn from_json(body: &Value) -> std::result::Result<Self, String> {
        let obj = body
            .as_object()
            .ok_or_else(|| "request body must be a JSON object".to_string())?;

        let title = match obj.get("title") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err("title is required".to_string()),
        };

        let description = match obj.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err("description must be a string".to_string()),
        };

        let effort = match obj.get("effort") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(
                n.as_f64()
                    .ok_or_else(|| "effort must be a finite number".to_string())?,
            ),
            Some(_) => return Err("effort must be a number".to_string()),
        };

        let due_date = match obj.get("dueDate").or_else(|| obj.get("due_date")) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|_| format!("dueDate is not a valid YYYY-MM-DD date: {s:?}"))?
                    .to_string(),
            ),
            Some(_) => return Err("dueDate must be a string".to_string()),
        };

        Ok(Self {
            title,
            description,
            effort,
            due_date,
        })
    }
}

// ─── TaskStore ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one task owned by `owner` and return the created row.
    pub async fn create(&self, owner: &str, draft: &TaskDraft) -> Result<TaskRow> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tasks (id, owner, title, description, effort, due_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.effort)
        .bind(&draft.due_date)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(owner, &id)
            .await?
            .ok_or_else(|| anyhow!("task not found after insert"))
    }

    pub async fn get(&self, owner: &str, id: &str) -> Result<Option<TaskRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND owner = ?")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// All tasks owned by `owner`, in insertion order.
    pub async fn list(&self, owner: &str) -> Result<Vec<TaskRow>> {
        let pool = self.pool.clone();
        let owner = owner.to_string();
        with_timeout(async move {
            Ok(
                sqlx::query_as("SELECT * FROM tasks WHERE owner = ? ORDER BY rowid")
                    .bind(&owner)
                    .fetch_all(&pool)
                    .await?,
            )
        })
        .await
    }

    /// Full-document replace of the task matching `(id, owner)`. Returns
    /// `None` without touching anything when no row matches — a non-owned
    /// or nonexistent id is a no-op, not an error.
    pub async fn update(&self, owner: &str, id: &str, draft: &TaskDraft) -> Result<Option<TaskRow>> {
        let rows_affected = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, effort = ?, due_date = ?
             WHERE id = ? AND owner = ?",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.effort)
        .bind(&draft.due_date)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get(owner, id).await
    }

    /// Delete the task matching `(id, owner)`. Succeeds whether or not a
    /// row matched.
    pub async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ? AND owner = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert every draft as a task owned by `owner` inside one
    /// transaction. Any failure rolls the whole batch back; on success
    /// returns the number of rows inserted.
    pub async fn insert_batch(&self, owner: &str, drafts: &[TaskDraft]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();
        for draft in drafts {
            sqlx::query(
                "INSERT INTO tasks (id, owner, title, description, effort, due_date, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(owner)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(draft.effort)
            .bind(&draft.due_date)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(drafts.len())
    }
}
