//! PostgreSQL-backed task persistence.
//!
//! The store exclusively owns the durable representation of tasks. Every
//! operation is a single parameterized statement; caller-controlled values
//! always go through `bind`/`push_bind`, never into the SQL text.

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, QueryBuilder};

use crate::config::DatabaseConfig;

/// Upper bound on pooled connections toward the database.
const MAX_POOL_CONNECTIONS: u32 = 10;

/// A persisted task row. This is also the wire shape: `created_at` and
/// `updated_at` serialize as RFC 3339 timestamps, `due_date` as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct TaskRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new row. `status` and `priority` are always concrete here;
/// create-side defaulting happens at the API boundary before the store is
/// reached.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
}

/// Field changes for an update. `title`, `description`, and `due_date`
/// overwrite the stored values unconditionally (NULL when absent);
/// `status` and `priority` keep the stored value when `None`.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Conjunction of optional row filters for [`TaskStore::find_all`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<i32>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct TaskStore {
    pool: PgPool,
}

impl TaskStore {
    /// Open a bounded connection pool and verify connectivity with a probe
    /// query. Startup must not proceed past a failure here.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .connect_with(connect_options(cfg)?)
            .await
            .context("failed to connect to PostgreSQL")?;
        let store = Self { pool };
        store
            .ping()
            .await
            .context("database connectivity check failed")?;
        Ok(store)
    }

    /// Idempotently create the tasks table. Safe to call on every process
    /// start; a failure here means no other operation is safe.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id SERIAL PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                status VARCHAR(20) DEFAULT 'pending',
                priority INTEGER DEFAULT 1,
                due_date DATE,
                created_at TIMESTAMPTZ DEFAULT NOW(),
                updated_at TIMESTAMPTZ DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("failed to create tasks table")?;
        Ok(())
    }

    pub async fn insert(&self, task: NewTask) -> Result<TaskRow> {
        Ok(sqlx::query_as(
            "INSERT INTO tasks (title, description, status, priority, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?)
    }

    /// All rows matching the filter, ordered by priority ascending then
    /// creation time descending.
    pub async fn find_all(&self, filter: TaskFilter) -> Result<Vec<TaskRow>> {
        let mut query: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("SELECT * FROM tasks");
        let mut prefix = " WHERE ";
        if let Some(status) = &filter.status {
            query.push(prefix).push("status = ").push_bind(status);
            prefix = " AND ";
        }
        if let Some(priority) = filter.priority {
            query.push(prefix).push("priority = ").push_bind(priority);
        }
        query.push(" ORDER BY priority ASC, created_at DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }
        Ok(query.build_query_as().fetch_all(&self.pool).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Apply `changes` to the row with this id, refreshing `updated_at`.
    /// Returns `None` if no such row exists.
    pub async fn update(&self, id: i32, changes: TaskChanges) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as(
            "UPDATE tasks SET
                title = $1,
                description = $2,
                status = COALESCE($3, status),
                priority = COALESCE($4, priority),
                due_date = $5,
                updated_at = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.status)
        .bind(changes.priority)
        .bind(changes.due_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Remove the row, returning it as it was immediately before removal.
    /// Returns `None` if it did not exist.
    pub async fn delete(&self, id: i32) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("DELETE FROM tasks WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Cheap connectivity probe, used by the startup check and the detailed
    /// health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Release pooled connections. Called after the graceful request drain.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn connect_options(cfg: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &cfg.url {
        return url
            .parse::<PgConnectOptions>()
            .context("invalid DATABASE_URL");
    }
    let ssl_mode = if cfg.ssl {
        PgSslMode::Require
    } else {
        PgSslMode::Prefer
    };
    Ok(PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .database(&cfg.name)
        .username(&cfg.user)
        .password(&cfg.password)
        .ssl_mode(ssl_mode))
}
