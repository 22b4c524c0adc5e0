use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitStream, StreamExt},
};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config;
use crate::core::{lock_room, SharedRoom};
use crate::error::{StandupError, StandupResult};
use crate::protocol::codec::decode_handshake;
use crate::protocol::meeting;

// ----------------------------------------------------------------------------
// [공유 상태] WS / HTTP 핸들러 공통
// ----------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub room:            SharedRoom,
    /// 서버 프로세스 시작 시각 (Unix millis) — uptime 계산용
    pub start_time_ms:   u64,
    pub semaphore_delay: SemaphoreDelay,
}

/// 세마포어 녹색 전환 지연 범위 (ms, 양끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for SemaphoreDelay {
    fn default() -> Self {
        Self { min_ms: config::SEMAPHORE_MIN_DELAY_MS, max_ms: config::SEMAPHORE_MAX_DELAY_MS }
    }
}

impl SemaphoreDelay {
    pub fn pick(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

// ----------------------------------------------------------------------------
// [WS 진입점]
// ----------------------------------------------------------------------------

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

// ----------------------------------------------------------------------------
// [핵심] 개별 클라이언트 WS 생명주기
//   1. 첫 프레임 {name} 핸드셰이크 (타임아웃)
//   2. Room 입장 → broadcast_tx는 Member가 소유
//   3. rx_loop: broadcast_rx → WS 송신. Member가 제거되면(리셋) Close 후 종료
//   4. 수신 루프: WS → 코덱 → Room. rx_loop 종료 또는 송신 큐 초과 시 종료
// ----------------------------------------------------------------------------

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let name = match read_handshake(&mut ws_rx).await {
        Ok(n)  => n,
        Err(e) => {
            warn!("[ws] handshake rejected: {} (code={})", e, e.code());
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let (broadcast_tx, mut broadcast_rx) = mpsc::channel::<String>(config::EGRESS_QUEUE_SIZE);

    let joined = lock_room(&state.room).join(&name, broadcast_tx);
    let conn_id = match joined {
        Ok(id) => id,
        Err(e) => {
            warn!("[ws] join rejected: {} (code={})", e, e.code());
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let lagged = lock_room(&state.room).lag_signal(conn_id).unwrap_or_default();

    // [rx_loop] broadcast_rx → WS 송신
    let mut rx_loop = tokio::spawn(async move {
        while let Some(json) = broadcast_rx.recv().await {
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    // [수신 루프] WS 수신 → 의도 처리
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(t)))  => t,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => { warn!("[ws] conn={} error: {}", conn_id, e); break; }
                    Some(Ok(_)) => continue,
                };
                trace!("[ws] conn={} <- {}", conn_id, text.as_str());

                if let Err(e) = meeting::handle_text(&state, conn_id, text.as_str()) {
                    warn!("[ws] conn={} intent dropped: {} (code={})", conn_id, e, e.code());
                }
            }
            _ = &mut rx_loop => {
                debug!("[ws] conn={} egress closed", conn_id);
                break;
            }
            _ = lagged.notified() => {
                warn!("[ws] conn={} fell behind, disconnecting", conn_id);
                break;
            }
        }
    }

    lock_room(&state.room).leave(conn_id);
    rx_loop.abort();
}

/// 첫 텍스트 프레임에서 이름을 읽음 (검증은 Room::join)
async fn read_handshake(ws_rx: &mut SplitStream<WebSocket>) -> StandupResult<String> {
    let deadline = Instant::now() + Duration::from_millis(config::HANDSHAKE_TIMEOUT_MS);

    loop {
        let msg = tokio::time::timeout_at(deadline, ws_rx.next())
            .await
            .map_err(|_| StandupError::Handshake("timed out waiting for name".into()))?;

        match msg {
            Some(Ok(Message::Text(text))) => {
                return decode_handshake(text.as_str()).map_err(|e| StandupError::Handshake(e.to_string()));
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(StandupError::Handshake("closed before handshake".into()));
            }
            Some(Err(e)) => return Err(StandupError::Handshake(e.to_string())),
            Some(Ok(_)) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semaphore_delay_stays_in_range() {
        let delay = SemaphoreDelay::default();
        for _ in 0..100 {
            let d = delay.pick().as_millis() as u64;
            assert!((config::SEMAPHORE_MIN_DELAY_MS..=config::SEMAPHORE_MAX_DELAY_MS).contains(&d));
        }
    }

    #[test]
    fn semaphore_delay_degenerate_range() {
        let delay = SemaphoreDelay { min_ms: 30, max_ms: 10 };
        assert_eq!(delay.pick(), Duration::from_millis(30));
    }
}
