//! Plan persistence.
//!
//! Two stores with different lifetimes:
//!
//! - [`PlanSlot`]: one JSON file holding the most recent plan, overwritten
//!   after every successful generation.
//! - [`PlanArchive`]: an append-only sqlite table of plans users chose to
//!   save, listed most recent first.

use crate::error::{PlanError, Result};
use crate::types::PlanResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Rows returned by [`PlanArchive::recent`].
pub const RECENT_LIMIT: i64 = 10;

/// Single-file slot for the latest plan.
#[derive(Debug)]
pub struct PlanSlot {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PlanSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Replace the slot contents with `plan`.
    pub async fn save(&self, plan: &PlanResult) -> Result<()> {
        let json = serde_json::to_vec_pretty(plan)?;
        let _guard = self.lock.lock().await;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "latest plan saved");
        Ok(())
    }

    /// The stored plan, or `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<PlanResult>> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Body of a save request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    pub plan: PlanResult,
}

/// A row of the saved-plan table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: i64,
    pub name: Option<String>,
    pub goal: Option<String>,
    pub plan: PlanResult,
    pub created_at: DateTime<Utc>,
}

/// Append-only table of saved plans.
#[derive(Debug, Clone)]
pub struct PlanArchive {
    pool: SqlitePool,
}

impl PlanArchive {
    /// Open (and create if needed) the database at `url` and ensure the
    /// table exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool_options = if url.contains(":memory:") {
            // Every connection to an in-memory database is a separate database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        let archive = Self { pool };
        archive.migrate().await?;
        info!("plan archive ready");
        Ok(archive)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                goal TEXT,
                workout TEXT NOT NULL,
                diet TEXT NOT NULL,
                tips TEXT NOT NULL,
                motivation TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a plan and return the stored row.
    pub async fn save(&self, new: NewPlan) -> Result<SavedPlan> {
        let plan = &new.plan;
        if [&plan.workout, &plan.diet, &plan.tips, &plan.motivation]
            .iter()
            .all(|f| f.trim().is_empty())
        {
            return Err(PlanError::InvalidInput("plan is empty".to_string()));
        }

        let name = non_blank(new.name);
        let goal = non_blank(new.goal);
        let now = Utc::now();

        let result = sqlx::query(
            r"
            INSERT INTO plans (name, goal, workout, diet, tips, motivation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&name)
        .bind(&goal)
        .bind(&plan.workout)
        .bind(&plan.diet)
        .bind(&plan.tips)
        .bind(&plan.motivation)
        .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "plan archived");
        Ok(SavedPlan {
            id,
            name,
            goal,
            plan: new.plan,
            created_at: now,
        })
    }

    /// The most recent saved plans, newest first.
    pub async fn recent(&self) -> Result<Vec<SavedPlan>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, goal, workout, diet, tips, motivation, created_at
            FROM plans
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_saved_plan).collect()
    }
}

fn row_to_saved_plan(row: &SqliteRow) -> Result<SavedPlan> {
    let created: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created)
        .map_err(|e| PlanError::Other(format!("bad created_at '{}': {}", created, e)))?
        .with_timezone(&Utc);

    Ok(SavedPlan {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        goal: row.try_get("goal")?,
        plan: PlanResult {
            workout: row.try_get("workout")?,
            diet: row.try_get("diet")?,
            tips: row.try_get("tips")?,
            motivation: row.try_get("motivation")?,
        },
        created_at,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
