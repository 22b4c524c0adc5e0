// 클라이언트 구동 루프 — 상태머신의 단일 소유 태스크
//
// 세션 이벤트와 UI 의도를 select!로 하나씩 순서대로 적용하므로
// 수신 전이와 의도 처리가 겹치지 않습니다.

use std::future::pending;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::client::dispatcher::Intent;
use crate::client::projection::Render;
use crate::client::session::{CloseReason, Session, SessionEvent};
use crate::client::state::{ClientEffect, MeetingClient};
use crate::utils::current_timestamp;

/// UI에서 구동 루프로 들어오는 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Intent(Intent),
    /// 알림 닫기 (로컬 전용, 전송 없음)
    DismissNotice,
}

impl From<Intent> for UiCommand {
    fn from(intent: Intent) -> Self {
        UiCommand::Intent(intent)
    }
}

/// 한 세션이 끝난 이유 — 호출자가 다음 행동을 결정
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// meeting_end 후 지연 만료 → 로그인 화면
    ReturnToLogin,
    /// meeting_reset → 같은 이름으로 재접속
    Rejoin,
    /// 전송 계층 종료 (자동 재시도 없음)
    Disconnected(CloseReason),
    /// UI 의도 채널 종료
    Quit,
}

pub async fn run_meeting<R: Render>(
    client:  &mut MeetingClient<R>,
    session: &Session,
    events:  &mut mpsc::Receiver<SessionEvent>,
    commands: &mut mpsc::Receiver<UiCommand>,
) -> SessionOutcome {
    let mut login_at: Option<Instant> = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let now = current_timestamp();
                let effects = match event {
                    Some(SessionEvent::Opened) => {
                        client.on_open(now);
                        Vec::new()
                    }
                    Some(SessionEvent::Message(text)) => client.on_message(&text, now),
                    Some(SessionEvent::Closed(reason)) => {
                        client.on_close(&reason, now);
                        return match login_at {
                            // 종료 안내를 받은 뒤라면 예정대로 로그인 화면으로
                            Some(deadline) => {
                                sleep_until(deadline).await;
                                SessionOutcome::ReturnToLogin
                            }
                            None => SessionOutcome::Disconnected(reason),
                        };
                    }
                    None => {
                        client.on_close(&CloseReason::Local, now);
                        return SessionOutcome::Disconnected(CloseReason::Local);
                    }
                };
                if let Some(outcome) = apply_effects(effects, session, &mut login_at) {
                    return outcome;
                }
            }
            command = commands.recv() => {
                let intent = match command {
                    Some(UiCommand::Intent(i)) => i,
                    Some(UiCommand::DismissNotice) => {
                        client.dismiss_notice(current_timestamp());
                        continue;
                    }
                    None => {
                        debug!("[client] ui channel closed");
                        session.close();
                        return SessionOutcome::Quit;
                    }
                };
                // 거부는 상태머신이 알림으로 렌더링함
                if let Ok(effects) = client.submit(intent, current_timestamp()) {
                    if let Some(outcome) = apply_effects(effects, session, &mut login_at) {
                        return outcome;
                    }
                }
            }
            _ = login_timer(login_at) => {
                session.close();
                return SessionOutcome::ReturnToLogin;
            }
        }
    }
}

fn apply_effects(
    effects:  Vec<ClientEffect>,
    session:  &Session,
    login_at: &mut Option<Instant>,
) -> Option<SessionOutcome> {
    for effect in effects {
        match effect {
            ClientEffect::Send(text) => {
                if let Err(e) = session.send(text) {
                    warn!("[client] send failed: {}", e);
                }
            }
            ClientEffect::ReturnToLogin { after } => {
                *login_at = Some(Instant::now() + after);
            }
            ClientEffect::Rejoin => {
                session.close();
                return Some(SessionOutcome::Rejoin);
            }
        }
    }
    None
}

async fn login_timer(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(d).await,
        None    => pending::<()>().await,
    }
}

