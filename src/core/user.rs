// Member — 회의실 접속자 1명 (WS 연결 1개)

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tracing::{trace, warn};

use crate::utils::current_timestamp;

/// 연결 식별자. 핸드셰이크 통과 시 Room이 발급 (1부터 증가)
pub type ConnId = u64;

/// 브로드캐스트 송신자 타입 (직렬화된 Envelope JSON)
pub type BroadcastTx = mpsc::Sender<String>;

// ----------------------------------------------------------------------------
// [Member] 핸드셰이크 시 등록, WS 종료/리셋 시 제거
// Member가 drop되면 tx도 drop → 해당 연결의 rx_loop 종료 → 소켓 Close
// 큐가 넘치면 lagged 신호 → WS 핸들러가 연결을 끊음 (프레임이 빠진 채 계속 두지 않음)
// ----------------------------------------------------------------------------

pub struct Member {
    pub conn_id:    ConnId,
    pub name:       String,
    pub tx:         BroadcastTx,
    /// 이번 회의에서 이미 발언했는지 (재참여 방지)
    pub has_spoken: bool,
    pub joined_at:  u64,
    lagged:         Arc<Notify>,
}

impl Member {
    pub fn new(conn_id: ConnId, name: String, tx: BroadcastTx) -> Self {
        Self {
            conn_id,
            name,
            tx,
            has_spoken: false,
            joined_at:  current_timestamp(),
            lagged:     Arc::new(Notify::new()),
        }
    }

    /// 송신 큐 초과 시 깨어나는 신호
    pub fn lag_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.lagged)
    }

    /// 논블로킹 전송. 큐가 가득 차면 프레임을 버리고 lagged 신호
    /// Room 락을 쥔 채로 호출되므로 절대 await 하지 않음
    pub fn push(&self, json: &str) -> bool {
        match self.tx.try_send(json.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("[room] egress queue full for {} (conn={}), closing", self.name, self.conn_id);
                self.lagged.notify_one();
                false
            }
            Err(TrySendError::Closed(_)) => {
                trace!("[room] egress closed for {} (conn={})", self.name, self.conn_id);
                false
            }
        }
    }
}
