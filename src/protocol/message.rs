use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// [공통] 메시지 봉투 (Envelope)
// ----------------------------------------------------------------------------

/// 핸드셰이크 이후 모든 WebSocket 메시지의 최상위 구조체
/// 수신/송신 공통으로 사용하며, payload는 type에 따라 해석합니다.
///
/// 예시:
///   { "type": "meeting_state", "payload": { "meetingStarted": true, "semaphoreGreen": false } }
///   { "type": "meeting_reset", "payload": null }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    /// 메시지 종류 (protocol::msg_type 참조)
    #[serde(rename = "type")]
    pub msg_type: String,
    /// type에 따라 구조가 달라지므로 raw JSON으로 보관. null/누락 모두 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload:  Option<serde_json::Value>,
}

impl Envelope {
    pub fn new(msg_type: &str, payload: impl Serialize) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            payload:  Some(serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)),
        }
    }

    pub fn no_payload(msg_type: &str) -> Self {
        Self { msg_type: msg_type.to_string(), payload: None }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ----------------------------------------------------------------------------
// [핸드셰이크] 접속 직후 첫 프레임 — type 필드 없음
// ----------------------------------------------------------------------------

/// { "name": "Ana" }
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HandshakePayload {
    pub name: String,
}

// ----------------------------------------------------------------------------
// [S→C] payload 타입들
// ----------------------------------------------------------------------------

/// type: initial_role
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitialRolePayload {
    pub is_master: bool,
}

/// type: meeting_state
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingStatePayload {
    pub meeting_started: bool,
    pub semaphore_green: bool,
}

// user_list / turn_order : 이름 배열 (Vec<String>)
// next_speaker / meeting_end : 문자열

// ----------------------------------------------------------------------------
// [C→S] payload 타입들
// ----------------------------------------------------------------------------

/// type: reorder_turn_order
/// 정식 형식은 이름 배열. { "names": [...] } 형식도 수용
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ReorderPayload {
    List(Vec<String>),
    Named { names: Vec<String> },
}

impl ReorderPayload {
    pub fn into_names(self) -> Vec<String> {
        match self {
            ReorderPayload::List(names)      => names,
            ReorderPayload::Named { names }  => names,
        }
    }
}

// end_turn : 경과 시간 ms (u64, 선택)
