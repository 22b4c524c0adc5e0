// 클라이언트 회의 상태머신 (sans-IO)
//
// 입력: 세션 이벤트(열림/메시지/닫힘), 사용자 의도
// 출력: ClientEffect 목록 (전송할 프레임, 로그인 화면 복귀 예약, 재접속 요청)
// 실제 전송/타이머는 driver가 담당. 여기서는 시간도 인자로만 받음.

use std::time::Duration;
use tracing::{debug, warn};

use crate::client::dispatcher::{dispatch, Intent};
use crate::client::projection::{
    project, ClientProjection, ConnectionPhase, MeetingPhase, Render, Role, SemaphorePhase,
};
use crate::client::session::CloseReason;
use crate::config;
use crate::error::Rejection;
use crate::protocol::codec::{decode_event, encode_command, ClientCommand, ServerEvent};
use crate::utils::normalize_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakingSession {
    pub speaker:    String,
    pub started_at: u64,
}

/// 상태머신 내부 상태 (투영의 원천)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientState {
    pub local_name:           String,
    pub connection:           ConnectionPhase,
    pub role:                 Role,
    pub meeting:              MeetingPhase,
    pub semaphore:            SemaphorePhase,
    pub roster:               Vec<String>,
    pub queue:                Vec<String>,
    pub speaking:             Option<SpeakingSession>,
    /// 본인 발언 시작 시각. end_turn을 보내면 즉시 해제
    pub local_speaking_since: Option<u64>,
    /// 낙관적 누름 잠금. 회의 종료/리셋 때만 해제
    pub has_joined_queue:     bool,
    pub end_message:          Option<String>,
    pub notice:               Option<String>,
}

impl ClientState {
    /// 이름은 서버와 같은 규칙으로 정규화 (next_speaker / turn_order 비교용)
    pub fn pre_join(local_name: &str) -> Self {
        Self {
            local_name:           normalize_name(local_name),
            connection:           ConnectionPhase::Connecting,
            role:                 Role::Participant,
            meeting:              MeetingPhase::NotStarted,
            semaphore:            SemaphorePhase::Red,
            roster:               Vec::new(),
            queue:                Vec::new(),
            speaking:             None,
            local_speaking_since: None,
            has_joined_queue:     false,
            end_message:          None,
            notice:               None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEffect {
    /// 인코딩된 프레임 전송
    Send(String),
    /// 지연 후 로그인 화면으로 (세션 종료)
    ReturnToLogin { after: Duration },
    /// 세션을 닫고 같은 이름으로 핸드셰이크부터 다시
    Rejoin,
}

pub struct MeetingClient<R: Render> {
    state:           ClientState,
    render:          R,
    return_to_login: Duration,
}

impl<R: Render> MeetingClient<R> {
    pub fn new(local_name: &str, render: R) -> Self {
        Self {
            state:           ClientState::pre_join(local_name),
            render,
            return_to_login: Duration::from_millis(config::RETURN_TO_LOGIN_DELAY_MS),
        }
    }

    pub fn with_return_to_login(mut self, after: Duration) -> Self {
        self.return_to_login = after;
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn projection(&self, now_ms: u64) -> ClientProjection {
        project(&self.state, now_ms)
    }

    // ------------------------------------------------------------------------
    // 세션 이벤트
    // ------------------------------------------------------------------------

    pub fn on_open(&mut self, now_ms: u64) {
        debug!("[client] session opened for {}", self.state.local_name);
        self.state.connection = ConnectionPhase::Connecting;
        self.emit(now_ms);
    }

    /// 수신 프레임 처리. 해석 실패는 로그만 남기고 상태/렌더 변화 없음
    pub fn on_message(&mut self, text: &str, now_ms: u64) -> Vec<ClientEffect> {
        match decode_event(text) {
            Ok(event) => self.apply(event, now_ms),
            Err(e) => {
                warn!("[client] dropped inbound frame: {}", e);
                Vec::new()
            }
        }
    }

    pub fn apply(&mut self, event: ServerEvent, now_ms: u64) -> Vec<ClientEffect> {
        let mut effects = Vec::new();
        let s = &mut self.state;

        match event {
            ServerEvent::InitialRole { is_master } => {
                s.role = if is_master { Role::Master } else { Role::Participant };
                s.connection = ConnectionPhase::Joined;
            }
            ServerEvent::MeetingState { meeting_started, semaphore_green } => {
                let meeting = match (meeting_started, s.meeting) {
                    (true, _)                      => MeetingPhase::InProgress,
                    (false, MeetingPhase::Finished) => MeetingPhase::Finished,
                    (false, _)                     => MeetingPhase::NotStarted,
                };
                let semaphore = if semaphore_green { SemaphorePhase::Green } else { SemaphorePhase::Red };
                if meeting == s.meeting && semaphore == s.semaphore {
                    return effects;
                }
                s.meeting = meeting;
                s.semaphore = semaphore;
            }
            ServerEvent::UserList(names) => {
                s.roster = names;
            }
            ServerEvent::TurnOrder(names) => {
                if names.iter().any(|n| *n == s.local_name) {
                    s.has_joined_queue = true;
                }
                s.queue = names;
            }
            ServerEvent::NextSpeaker(name) => {
                if name == s.local_name {
                    s.local_speaking_since = Some(now_ms);
                    s.has_joined_queue = true;
                } else {
                    s.local_speaking_since = None;
                }
                s.speaking = Some(SpeakingSession { speaker: name, started_at: now_ms });
            }
            ServerEvent::MeetingEnd(message) => {
                s.meeting = MeetingPhase::Finished;
                s.semaphore = SemaphorePhase::Red;
                s.speaking = None;
                s.local_speaking_since = None;
                s.has_joined_queue = false;
                s.end_message = Some(message);
                effects.push(ClientEffect::ReturnToLogin { after: self.return_to_login });
            }
            ServerEvent::MeetingReset => {
                debug!("[client] meeting reset, rejoining as {}", s.local_name);
                let local_name = std::mem::take(&mut s.local_name);
                *s = ClientState::pre_join(&local_name);
                effects.push(ClientEffect::Rejoin);
            }
        }

        self.emit(now_ms);
        effects
    }

    pub fn on_close(&mut self, reason: &CloseReason, now_ms: u64) {
        if self.state.connection == ConnectionPhase::Disconnected {
            return;
        }
        debug!("[client] session closed: {}", reason);
        self.state.connection = ConnectionPhase::Disconnected;
        self.state.local_speaking_since = None;
        if *reason != CloseReason::Local {
            self.state.notice = Some(format!("connection lost: {}", reason));
        }
        self.emit(now_ms);
    }

    // ------------------------------------------------------------------------
    // 사용자 의도
    // ------------------------------------------------------------------------

    /// 검사 통과 시 낙관적 갱신 + 전송 프레임 반환. 거부 시 알림만 표시하고 전송 없음
    pub fn submit(&mut self, intent: Intent, now_ms: u64) -> Result<Vec<ClientEffect>, Rejection> {
        if let Err(rejection) = dispatch(&intent, &self.projection(now_ms)) {
            debug!("[client] {} rejected locally: {}", intent.name(), rejection);
            self.state.notice = Some(rejection.to_string());
            self.emit(now_ms);
            return Err(rejection);
        }

        let s = &mut self.state;
        s.notice = None;

        let command = match intent {
            Intent::PressButton => {
                s.has_joined_queue = true;
                ClientCommand::PressButton
            }
            Intent::EndTurn => {
                let elapsed_ms = s.local_speaking_since.map(|since| now_ms.saturating_sub(since));
                s.local_speaking_since = None;
                ClientCommand::EndTurn { elapsed_ms }
            }
            Intent::StartMeeting          => ClientCommand::StartMeeting,
            Intent::StartSemaphore        => ClientCommand::StartSemaphore,
            Intent::SkipTurn              => ClientCommand::SkipTurn,
            Intent::ResetMeeting { .. }   => ClientCommand::ResetMeeting,
            Intent::AddVirtualUser        => ClientCommand::AddVirtualUser,
            Intent::ReorderTurnOrder(names) => {
                s.queue = names.clone();
                ClientCommand::ReorderTurnOrder(names)
            }
        };

        self.emit(now_ms);
        Ok(vec![ClientEffect::Send(encode_command(&command))])
    }

    /// 알림 닫기
    pub fn dismiss_notice(&mut self, now_ms: u64) {
        if self.state.notice.take().is_some() {
            self.emit(now_ms);
        }
    }

    fn emit(&mut self, now_ms: u64) {
        let projection = project(&self.state, now_ms);
        self.render.on_projection_changed(&projection);
    }
}
