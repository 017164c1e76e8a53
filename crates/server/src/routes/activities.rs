use axum::extract::{Query, State};
use axum::Json;
use bpa_core::Activity;
use db::ActivityFilter;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesQuery {
    #[serde(default)]
    pub tasks_only: bool,
    #[serde(default)]
    pub open_only: bool,
    pub partner_id: Option<Uuid>,
}

impl From<ActivitiesQuery> for ActivityFilter {
    fn from(query: ActivitiesQuery) -> Self {
        ActivityFilter {
            tasks_only: query.tasks_only || query.open_only,
            open_only: query.open_only,
            partner_id: query.partner_id,
        }
    }
}

pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<Vec<Activity>>, AppError> {
    let activities = state.activities.list_activities(query.into()).await?;
    Ok(Json(activities))
}
