// 운영 REST API 핸들러
//
// GET  /status  → 회의실 스냅샷 (uptime, 명단, 진행 상태, 대기열, 발언 시간 기록)
// POST /reset   → 회의 전체 초기화 (전원에게 meeting_reset 후 연결 종료)

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use tracing::info;

use crate::core::{lock_room, RoomSnapshot};
use crate::protocol::AppState;
use crate::utils::current_timestamp;

// ----------------------------------------------------------------------------
// [응답 타입]
// ----------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub room:        RoomSnapshot,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub dropped: usize,
}

// ----------------------------------------------------------------------------
// [핸들러]
// ----------------------------------------------------------------------------

/// GET /status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let room = lock_room(&state.room).snapshot();
    let uptime_secs = current_timestamp().saturating_sub(state.start_time_ms) / 1000;
    Json(StatusResponse { uptime_secs, room })
}

/// POST /reset
/// 운영자 요청이므로 Master 확인 없음
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    let dropped = lock_room(&state.room).reset(None).unwrap_or_default();
    info!("[http] meeting reset by operator ({} connections)", dropped);
    Json(ResetResponse { message: "meeting reset".to_string(), dropped })
}
