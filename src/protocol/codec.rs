// 메시지 코덱 — 와이어(JSON 텍스트) <-> 타입 있는 이벤트/명령
//
//   서버 → 클라이언트 : ServerEvent   (encode_event / decode_event)
//   클라이언트 → 서버 : ClientCommand (encode_command / decode_command)
//   핸드셰이크        : { "name": ... } (encode_handshake / decode_handshake)
//
// 알 수 없는 필드, 누락된 선택 필드는 봉투 전체를 실패시키지 않습니다.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;
use crate::protocol::message::{
    Envelope, HandshakePayload, InitialRolePayload, MeetingStatePayload, ReorderPayload,
};
use crate::protocol::msg_type::{client, server};

// ----------------------------------------------------------------------------
// [타입]
// ----------------------------------------------------------------------------

/// 서버가 보내는 이벤트 (디코딩 완료)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    InitialRole  { is_master: bool },
    MeetingState { meeting_started: bool, semaphore_green: bool },
    UserList(Vec<String>),
    TurnOrder(Vec<String>),
    NextSpeaker(String),
    MeetingEnd(String),
    MeetingReset,
}

impl ServerEvent {
    pub fn msg_type(&self) -> &'static str {
        match self {
            ServerEvent::InitialRole { .. }  => server::INITIAL_ROLE,
            ServerEvent::MeetingState { .. } => server::MEETING_STATE,
            ServerEvent::UserList(_)         => server::USER_LIST,
            ServerEvent::TurnOrder(_)        => server::TURN_ORDER,
            ServerEvent::NextSpeaker(_)      => server::NEXT_SPEAKER,
            ServerEvent::MeetingEnd(_)       => server::MEETING_END,
            ServerEvent::MeetingReset        => server::MEETING_RESET,
        }
    }
}

/// 클라이언트가 보내는 명령 (와이어 수준)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    PressButton,
    /// elapsed_ms: 클라이언트 측 측정값. 서버 측정이 우선
    EndTurn { elapsed_ms: Option<u64> },
    StartMeeting,
    StartSemaphore,
    SkipTurn,
    ResetMeeting,
    AddVirtualUser,
    ReorderTurnOrder(Vec<String>),
}

impl ClientCommand {
    pub fn msg_type(&self) -> &'static str {
        match self {
            ClientCommand::PressButton         => client::PRESS_BUTTON,
            ClientCommand::EndTurn { .. }      => client::END_TURN,
            ClientCommand::StartMeeting        => client::START_MEETING,
            ClientCommand::StartSemaphore      => client::START_SEMAPHORE,
            ClientCommand::SkipTurn            => client::SKIP_TURN,
            ClientCommand::ResetMeeting        => client::RESET_MEETING,
            ClientCommand::AddVirtualUser      => client::ADD_VIRTUAL_USER,
            ClientCommand::ReorderTurnOrder(_) => client::REORDER_TURN_ORDER,
        }
    }
}

// ----------------------------------------------------------------------------
// [핸드셰이크]
// ----------------------------------------------------------------------------

pub fn encode_handshake(name: &str) -> String {
    serde_json::to_string(&HandshakePayload { name: name.to_string() }).unwrap_or_default()
}

/// 첫 프레임에서 이름 추출 (정규화/검증은 호출자 몫)
pub fn decode_handshake(text: &str) -> Result<String, DecodeError> {
    serde_json::from_str::<HandshakePayload>(text)
        .map(|h| h.name)
        .map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))
}

// ----------------------------------------------------------------------------
// [S→C]
// ----------------------------------------------------------------------------

pub fn encode_event(event: &ServerEvent) -> String {
    let msg_type = event.msg_type();
    let envelope = match event {
        ServerEvent::InitialRole { is_master } => {
            Envelope::new(msg_type, InitialRolePayload { is_master: *is_master })
        }
        ServerEvent::MeetingState { meeting_started, semaphore_green } => {
            Envelope::new(msg_type, MeetingStatePayload {
                meeting_started: *meeting_started,
                semaphore_green: *semaphore_green,
            })
        }
        ServerEvent::UserList(names) | ServerEvent::TurnOrder(names) => Envelope::new(msg_type, names),
        ServerEvent::NextSpeaker(text) | ServerEvent::MeetingEnd(text) => Envelope::new(msg_type, text),
        ServerEvent::MeetingReset => Envelope::no_payload(msg_type),
    };
    envelope.to_json()
}

pub fn decode_event(text: &str) -> Result<ServerEvent, DecodeError> {
    let envelope = parse_envelope(text)?;
    let msg_type = envelope.msg_type.as_str();

    match msg_type {
        server::INITIAL_ROLE => {
            let p: InitialRolePayload = parse_payload(msg_type, envelope.payload)?;
            Ok(ServerEvent::InitialRole { is_master: p.is_master })
        }
        server::MEETING_STATE => {
            let p: MeetingStatePayload = parse_payload(msg_type, envelope.payload)?;
            Ok(ServerEvent::MeetingState {
                meeting_started: p.meeting_started,
                semaphore_green: p.semaphore_green,
            })
        }
        server::USER_LIST  => Ok(ServerEvent::UserList(parse_names(msg_type, envelope.payload)?)),
        server::TURN_ORDER => Ok(ServerEvent::TurnOrder(parse_names(msg_type, envelope.payload)?)),
        server::NEXT_SPEAKER => {
            let name: String = parse_payload(msg_type, envelope.payload)?;
            Ok(ServerEvent::NextSpeaker(name))
        }
        server::MEETING_END => {
            // 종료 안내는 놓치면 안 되므로 문구가 없어도 종료 자체는 반영
            let message = match envelope.payload {
                None | Some(Value::Null) => String::new(),
                Some(v) => serde_json::from_value(v).map_err(|e| malformed(msg_type, e))?,
            };
            Ok(ServerEvent::MeetingEnd(message))
        }
        server::MEETING_RESET => Ok(ServerEvent::MeetingReset),
        unknown => Err(DecodeError::UnknownType(unknown.to_string())),
    }
}

// ----------------------------------------------------------------------------
// [C→S]
// ----------------------------------------------------------------------------

pub fn encode_command(command: &ClientCommand) -> String {
    let msg_type = command.msg_type();
    let envelope = match command {
        ClientCommand::EndTurn { elapsed_ms: Some(ms) } => Envelope::new(msg_type, ms),
        ClientCommand::ReorderTurnOrder(names)          => Envelope::new(msg_type, names),
        _ => Envelope::no_payload(msg_type),
    };
    envelope.to_json()
}

pub fn decode_command(text: &str) -> Result<ClientCommand, DecodeError> {
    let envelope = parse_envelope(text)?;
    let msg_type = envelope.msg_type.as_str();

    match msg_type {
        client::PRESS_BUTTON     => Ok(ClientCommand::PressButton),
        client::END_TURN         => Ok(ClientCommand::EndTurn {
            // 참고값이므로 숫자가 아니면 그냥 버림
            elapsed_ms: envelope.payload.as_ref().and_then(|v| {
                v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            }),
        }),
        client::START_MEETING    => Ok(ClientCommand::StartMeeting),
        client::START_SEMAPHORE  => Ok(ClientCommand::StartSemaphore),
        client::SKIP_TURN        => Ok(ClientCommand::SkipTurn),
        client::RESET_MEETING    => Ok(ClientCommand::ResetMeeting),
        client::ADD_VIRTUAL_USER => Ok(ClientCommand::AddVirtualUser),
        client::REORDER_TURN_ORDER => {
            let p: ReorderPayload = parse_payload(msg_type, envelope.payload)?;
            Ok(ClientCommand::ReorderTurnOrder(p.into_names()))
        }
        unknown => Err(DecodeError::UnknownType(unknown.to_string())),
    }
}

// ----------------------------------------------------------------------------
// [내부 파싱 유틸]
// ----------------------------------------------------------------------------

fn parse_envelope(text: &str) -> Result<Envelope, DecodeError> {
    serde_json::from_str(text).map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))
}

fn parse_payload<T: DeserializeOwned>(msg_type: &str, payload: Option<Value>) -> Result<T, DecodeError> {
    let value = payload.ok_or_else(|| DecodeError::MalformedPayload {
        msg_type: msg_type.to_string(),
        reason:   "missing payload".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| malformed(msg_type, e))
}

/// 이름 배열 — null/누락은 빈 목록 (빈 슬라이스를 null로 보내는 서버 호환)
fn parse_names(msg_type: &str, payload: Option<Value>) -> Result<Vec<String>, DecodeError> {
    match payload {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v).map_err(|e| malformed(msg_type, e)),
    }
}

fn malformed(msg_type: &str, err: serde_json::Error) -> DecodeError {
    DecodeError::MalformedPayload { msg_type: msg_type.to_string(), reason: err.to_string() }
}
