// 렌더링용 읽기 전용 투영 (ClientProjection) + 렌더 콜백 계약
//
// 화면은 원본 프로토콜 메시지를 보지 않고 이 투영만 봅니다.
// 상태 전이가 일어날 때마다 (연결 끊김, 로컬 거부 포함) on_projection_changed 호출.

use std::time::Duration;

use crate::client::state::ClientState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Participant,
    Master,
}

/// NotStarted → InProgress → Finished. 리셋 시에만 NotStarted로 복귀
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingPhase {
    NotStarted,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphorePhase {
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// 세션 생성 ~ initial_role 수신 전
    Connecting,
    Joined,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProjection {
    pub role:                   Role,
    pub meeting_phase:          MeetingPhase,
    pub semaphore_phase:        SemaphorePhase,
    pub roster:                 Vec<String>,
    pub queue:                  Vec<String>,
    pub current_speaker:        Option<String>,
    pub local_has_joined_queue: bool,
    pub local_is_speaking:      bool,
    pub local_speaking_elapsed: Duration,
    pub local_name:             String,
    pub connection:             ConnectionPhase,
    /// meeting_end 안내 문구
    pub end_message:            Option<String>,
    /// 마지막 일시 알림 (로컬 거부, 연결 끊김 등)
    pub notice:                 Option<String>,
}

impl ClientProjection {
    /// 접속 전 기본값. meeting_reset 이후에도 이 상태로 돌아감
    pub fn pre_join(local_name: &str) -> Self {
        project(&ClientState::pre_join(local_name), 0)
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }
}

/// 순수 함수. 같은 상태와 시각이면 항상 같은 투영
pub fn project(state: &ClientState, now_ms: u64) -> ClientProjection {
    let current_speaker = state.speaking.as_ref().map(|s| s.speaker.clone());
    let local_is_speaking = state.local_speaking_since.is_some()
        && current_speaker.as_deref() == Some(state.local_name.as_str());
    let local_speaking_elapsed = match state.local_speaking_since {
        Some(since) if local_is_speaking => Duration::from_millis(now_ms.saturating_sub(since)),
        _ => Duration::ZERO,
    };

    ClientProjection {
        role:                   state.role,
        meeting_phase:          state.meeting,
        semaphore_phase:        state.semaphore,
        roster:                 state.roster.clone(),
        queue:                  state.queue.clone(),
        current_speaker,
        local_has_joined_queue: state.has_joined_queue,
        local_is_speaking,
        local_speaking_elapsed,
        local_name:             state.local_name.clone(),
        connection:             state.connection,
        end_message:            state.end_message.clone(),
        notice:                 state.notice.clone(),
    }
}

// ----------------------------------------------------------------------------
// [렌더 콜백]
// ----------------------------------------------------------------------------

pub trait Render {
    fn on_projection_changed(&mut self, projection: &ClientProjection);
}

impl<F> Render for F
where
    F: FnMut(&ClientProjection),
{
    fn on_projection_changed(&mut self, projection: &ClientProjection) {
        self(projection)
    }
}

/// 받은 투영을 순서대로 쌓아두는 렌더러 (헤드리스 실행/검증용)
#[derive(Debug, Default)]
pub struct ProjectionLog {
    pub frames: Vec<ClientProjection>,
}

impl ProjectionLog {
    pub fn last(&self) -> Option<&ClientProjection> {
        self.frames.last()
    }
}

impl Render for ProjectionLog {
    fn on_projection_changed(&mut self, projection: &ClientProjection) {
        self.frames.push(projection.clone());
    }
}
