use crate::error::DbError;
use crate::models::{ActivityFilter, ActivityRow};
use bpa_core::{Activity, ActivityKind, ActivityState, TaskState};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const ACTIVITY_COLUMNS: &str =
    "id, partner_id, link_type, link_id, kind, role, state, task_state, created_at, updated_at";

#[derive(Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the activity unless one already exists for the same
    /// correlation id and kind. Returns `true` when this call created it.
    pub async fn insert_if_absent(&self, activity: &Activity) -> Result<bool, DbError> {
        let row = ActivityRow::from(activity);

        let inserted: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO activities (id, partner_id, link_type, link_id, kind, role, state, task_state, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (link_id, kind) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&row.id)
        .bind(&row.partner_id)
        .bind(&row.link_type)
        .bind(&row.link_id)
        .bind(&row.kind)
        .bind(&row.role)
        .bind(&row.state)
        .bind(&row.task_state)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    pub async fn find_by_link_and_kind(
        &self,
        link_id: Uuid,
        kind: ActivityKind,
    ) -> Result<Option<Activity>, DbError> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE link_id = ? AND kind = ?");
        let row: Option<ActivityRow> = sqlx::query_as(&sql)
            .bind(link_id.to_string())
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ActivityRow::into_domain).transpose()
    }

    /// Move an OPEN task to `to`. A single conditional UPDATE, so concurrent
    /// callers cannot both win and an OPEN row is never lost. Returns the
    /// updated activity, or `None` when there was no open task.
    pub async fn transition_open_task(
        &self,
        link_id: Uuid,
        kind: ActivityKind,
        to: TaskState,
        state: ActivityState,
    ) -> Result<Option<Activity>, DbError> {
        let sql = format!(
            r#"
            UPDATE activities
            SET task_state = ?, state = ?, updated_at = ?
            WHERE link_id = ? AND kind = ? AND task_state = 'open'
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let row: Option<ActivityRow> = sqlx::query_as(&sql)
            .bind(to.as_str())
            .bind(state.as_str())
            .bind(Utc::now().timestamp_millis())
            .bind(link_id.to_string())
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ActivityRow::into_domain).transpose()
    }

    pub async fn find_all(&self, filter: ActivityFilter) -> Result<Vec<Activity>, DbError> {
        let mut sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE (task_state IS NULL OR task_state != 'deleted')"
        );
        if filter.tasks_only {
            sql.push_str(" AND task_state IS NOT NULL");
        }
        if filter.open_only {
            sql.push_str(" AND task_state = 'open'");
        }
        if filter.partner_id.is_some() {
            sql.push_str(" AND partner_id = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut query = sqlx::query_as::<_, ActivityRow>(&sql);
        if let Some(partner_id) = filter.partner_id {
            query = query.bind(partner_id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(ActivityRow::into_domain).collect()
    }

    pub async fn count_by_link_id(&self, link_id: Uuid) -> Result<i64, DbError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activities WHERE link_id = ?")
            .bind(link_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
