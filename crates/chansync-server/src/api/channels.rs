use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Channel names are also database keys and log fields; keep them short and
/// unambiguous.
const MAX_CHANNEL_NAME_LEN: usize = 30;

#[derive(Debug, Serialize)]
pub(super) struct ChannelItem {
    name: String,
    usercount: usize,
}

pub(super) async fn list_channels(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ChannelItem>>> {
    let data = state
        .channels
        .snapshot()
        .iter()
        .map(|chan| ChannelItem {
            name: chan.name().to_string(),
            usercount: chan.user_count(),
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::now(),
    })
}

pub(super) async fn join_channel(
    State(state): State<AppState>,
    Path((name, nick)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ChannelItem>>, ApiError> {
    if !valid_channel_name(&name) {
        return Err(ApiError::new("validation_error", "invalid channel name"));
    }

    let chan = state
        .channels
        .get_or_open(&state.pool, &name)
        .await
        .map_err(|e| map_db_error(&e))?;
    chan.add_user(&nick);

    Ok(Json(ApiResponse {
        data: ChannelItem {
            name: chan.name().to_string(),
            usercount: chan.user_count(),
        },
        meta: ResponseMeta::now(),
    }))
}

pub(super) async fn leave_channel(
    State(state): State<AppState>,
    Path((name, nick)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ChannelItem>>, ApiError> {
    let Some(chan) = state.channels.get(&name) else {
        return Err(ApiError::new("not_found", "unknown channel"));
    };
    chan.remove_user(&nick);

    Ok(Json(ApiResponse {
        data: ChannelItem {
            name: chan.name().to_string(),
            usercount: chan.user_count(),
        },
        meta: ResponseMeta::now(),
    }))
}

/// Replace a channel's state document. The new document is persisted by the
/// next save sweep (or a final save on teardown), not immediately.
pub(super) async fn update_channel_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(doc): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<ChannelItem>>, ApiError> {
    let Some(chan) = state.channels.get(&name) else {
        return Err(ApiError::new("not_found", "unknown channel"));
    };
    chan.set_state(doc);

    Ok(Json(ApiResponse {
        data: ChannelItem {
            name: chan.name().to_string(),
            usercount: chan.user_count(),
        },
        meta: ResponseMeta::now(),
    }))
}

pub(super) async fn teardown_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<ChannelItem>>, ApiError> {
    let Some(chan) = state.channels.remove(&name) else {
        return Err(ApiError::new("not_found", "unknown channel"));
    };

    // Final best-effort save. The channel is already dead, so an in-flight
    // sweep will skip it; a failure here loses at most the delta since the
    // last successful sweep.
    if let Err(e) = chan.save_state(&state.pool).await {
        tracing::error!(channel = %chan.name(), error = %e, "final save on teardown failed");
    }

    Ok(Json(ApiResponse {
        data: ChannelItem {
            name: chan.name().to_string(),
            usercount: chan.user_count(),
        },
        meta: ResponseMeta::now(),
    }))
}

fn valid_channel_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_CHANNEL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
