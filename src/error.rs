use thiserror::Error;

use crate::core::ConnId;

// ----------------------------------------------------------------------------
// [서버] 핸들러 에러
// 대부분은 "조용히 무시" 대상이며 로그로만 남깁니다 (클라이언트로 에러 패킷을 보내지 않음).
// ----------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StandupError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("invalid display name: {0:?}")]
    InvalidName(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("member {0} is not the master")]
    NotMaster(String),

    #[error("member not found: conn={0}")]
    MemberNotFound(ConnId),

    #[error("intent ignored: {0}")]
    Ignored(String),

    #[error("network I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<DecodeError> for StandupError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownType(t) => StandupError::UnknownType(t),
            other                       => StandupError::InvalidPayload(other.to_string()),
        }
    }
}

pub type StandupResult<T> = Result<T, StandupError>;

// ----------------------------------------------------------------------------
// [공통] 코덱 에러 — 수신 메시지 해석 실패. 절대 치명적이지 않음 (로그 후 무시)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// JSON이 아니거나 type 필드가 없는 경우
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("malformed payload for {msg_type}: {reason}")]
    MalformedPayload { msg_type: String, reason: String },
}

// ----------------------------------------------------------------------------
// [클라이언트] 전송 계층 에러 — 자동 재시도 없음, 수동 재접속 필요
// ----------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("session is closed")]
    Closed,
}

// ----------------------------------------------------------------------------
// [클라이언트] 로컬 디스패치 거부 — 서버로 아무것도 보내지 않고 알림으로만 표시
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{intent} is not allowed for your role")]
    NotAuthorized { intent: &'static str },

    #[error("{intent} is not allowed right now: {reason}")]
    InvalidPhase { intent: &'static str, reason: &'static str },

    #[error("already waiting in the turn queue")]
    AlreadyPending,

    #[error("reset_meeting needs an explicit confirmation")]
    NeedsConfirmation,

    #[error("new order must be a permutation of the current queue")]
    InvalidOrder,

    #[error("not connected to the meeting")]
    NotConnected,
}
