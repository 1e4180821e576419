use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Hard cap on rows returned regardless of the requested window.
const STATS_RESPONSE_CAP: i64 = 5_000;

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatPointItem {
    time: DateTime<Utc>,
    usercount: i32,
    chancount: i32,
    mem: i64,
}

pub(super) async fn list_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<Vec<StatPointItem>>>, ApiError> {
    let since = Utc::now() - chrono::Duration::hours(normalize_hours(query.hours));
    let rows = chansync_db::list_stats_since(&state.pool, since, STATS_RESPONSE_CAP)
        .await
        .map_err(|e| map_db_error(&e))?;

    let data = rows
        .into_iter()
        .map(|row| StatPointItem {
            time: row.time,
            usercount: row.usercount,
            chancount: row.chancount,
            mem: row.mem,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::now(),
    }))
}

pub(super) fn normalize_hours(hours: Option<i64>) -> i64 {
    hours.unwrap_or(24).clamp(1, 720)
}
