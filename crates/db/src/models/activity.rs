use bpa_core::{Activity, ActivityKind, ActivityLink, ActivityRole, ActivityState, TaskState};
use uuid::Uuid;

use super::{datetime_to_millis, millis_to_datetime};
use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: String,
    pub partner_id: String,
    pub link_type: String,
    pub link_id: String,
    pub kind: String,
    pub role: String,
    pub state: String,
    pub task_state: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ActivityRow {
    pub fn into_domain(self) -> Result<Activity, DbError> {
        let link_id = parse_uuid("link_id", &self.link_id)?;
        let link = ActivityLink::from_parts(&self.link_type, link_id)
            .ok_or_else(|| DbError::invalid("link_type", &self.link_type))?;
        let task = match self.task_state {
            Some(ref s) => Some(TaskState::parse(s).ok_or_else(|| DbError::invalid("task_state", s))?),
            None => None,
        };

        Ok(Activity {
            id: parse_uuid("id", &self.id)?,
            partner_id: parse_uuid("partner_id", &self.partner_id)?,
            link,
            kind: ActivityKind::parse(&self.kind).ok_or_else(|| DbError::invalid("kind", &self.kind))?,
            role: ActivityRole::parse(&self.role).ok_or_else(|| DbError::invalid("role", &self.role))?,
            state: ActivityState::parse(&self.state)
                .ok_or_else(|| DbError::invalid("state", &self.state))?,
            task,
            created_at: millis_to_datetime(self.created_at),
            updated_at: millis_to_datetime(self.updated_at),
        })
    }
}

impl From<&Activity> for ActivityRow {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id.to_string(),
            partner_id: activity.partner_id.to_string(),
            link_type: activity.link.as_str().to_string(),
            link_id: activity.link.correlation_id().to_string(),
            kind: activity.kind.as_str().to_string(),
            role: activity.role.as_str().to_string(),
            state: activity.state.as_str().to_string(),
            task_state: activity.task.map(|t| t.as_str().to_string()),
            created_at: datetime_to_millis(activity.created_at),
            updated_at: datetime_to_millis(activity.updated_at),
        }
    }
}

/// Narrows an activity listing. Deleted tasks are never listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityFilter {
    pub tasks_only: bool,
    pub open_only: bool,
    pub partner_id: Option<Uuid>,
}

impl ActivityFilter {
    pub fn tasks() -> Self {
        Self {
            tasks_only: true,
            ..Default::default()
        }
    }

    pub fn open_tasks() -> Self {
        Self {
            tasks_only: true,
            open_only: true,
            ..Default::default()
        }
    }
}

pub(crate) fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|_| DbError::invalid(column, value))
}
