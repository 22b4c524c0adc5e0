use daily_standup::client::{
    run_meeting, ClientProjection, ConnectionPhase, Intent, MeetingClient, MeetingPhase, SemaphorePhase, Session,
    SessionOutcome, UiCommand,
};
use daily_standup::protocol::SemaphoreDelay;
use daily_standup::{app_state, build_router};
use portpicker::pick_unused_port;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

// ----------------------------------------------------------------------------
// [테스트 헬퍼] 실제 서버 + Session + 구동 루프
// ----------------------------------------------------------------------------

async fn spawn_test_server() -> String {
    let port = pick_unused_port().expect("사용 가능한 포트를 찾을 수 없습니다.");
    let addr = format!("127.0.0.1:{}", port);

    let app = build_router(app_state(SemaphoreDelay { min_ms: 10, max_ms: 20 }));
    let listener = TcpListener::bind(&addr).await.unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("ws://{}/ws", addr)
}

/// 구동 중인 클라이언트 1개. 렌더된 투영은 frames 채널로 흘려보냄
struct Running {
    intents: mpsc::Sender<UiCommand>,
    frames:  mpsc::UnboundedReceiver<ClientProjection>,
    handle:  JoinHandle<SessionOutcome>,
}

impl Running {
    async fn start(endpoint: &str, name: &str) -> Self {
        let (session, mut events) = Session::open(endpoint, name).await.expect("세션 연결 실패");
        let (intent_tx, mut intent_rx) = mpsc::channel(16);
        let (frame_tx, frames) = mpsc::unbounded_channel();

        let name = name.to_string();
        let handle = tokio::spawn(async move {
            let render = move |p: &ClientProjection| {
                let _ = frame_tx.send(p.clone());
            };
            let mut client = MeetingClient::new(&name, render).with_return_to_login(Duration::from_millis(50));
            run_meeting(&mut client, &session, &mut events, &mut intent_rx).await
        });

        Self { intents: intent_tx, frames, handle }
    }

    async fn intent(&self, intent: Intent) {
        self.command(intent.into()).await;
    }

    async fn command(&self, command: UiCommand) {
        self.intents.send(command).await.expect("구동 루프 종료됨");
    }

    async fn wait_for(&mut self, label: &str, pred: impl Fn(&ClientProjection) -> bool) -> ClientProjection {
        let frames = &mut self.frames;
        timeout(Duration::from_secs(2), async {
            loop {
                let p = frames.recv().await.expect("렌더 채널 종료");
                if pred(&p) {
                    return p;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{} 대기 타임아웃", label))
    }

    async fn outcome(self) -> SessionOutcome {
        timeout(Duration::from_secs(2), self.handle)
            .await
            .expect("세션 종료 타임아웃")
            .expect("구동 태스크 패닉")
    }
}

fn joined(p: &ClientProjection) -> bool {
    p.connection == ConnectionPhase::Joined
}

// ----------------------------------------------------------------------------
// [시나리오 1] 세마포어 → 누름 → 발언 → 회의 종료 → 로그인 화면
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_meeting_round_through_sessions() {
    let endpoint = spawn_test_server().await;

    let mut ana = Running::start(&endpoint, "Ana").await;
    let p = ana.wait_for("Ana 입장", joined).await;
    assert!(p.is_master());

    let mut bob = Running::start(&endpoint, "Bob").await;
    let p = bob.wait_for("Bob 명단", |p| joined(p) && p.roster.len() == 2).await;
    assert!(!p.is_master());
    assert_eq!(p.roster, vec!["Ana".to_string(), "Bob".to_string()]);

    ana.intent(Intent::StartMeeting).await;
    ana.wait_for("회의 시작", |p| p.meeting_phase == MeetingPhase::InProgress).await;
    ana.intent(Intent::StartSemaphore).await;

    bob.wait_for("녹색", |p| p.semaphore_phase == SemaphorePhase::Green).await;
    bob.intent(Intent::PressButton).await;
    let p = bob.wait_for("Bob 발언", |p| p.local_is_speaking).await;
    assert_eq!(p.current_speaker.as_deref(), Some("Bob"));

    let p = ana.wait_for("Ana가 본 발언자", |p| p.current_speaker.is_some()).await;
    assert_eq!(p.current_speaker.as_deref(), Some("Bob"));
    assert!(!p.local_is_speaking);

    bob.intent(Intent::EndTurn).await;
    let p = bob.wait_for("회의 종료", |p| p.meeting_phase == MeetingPhase::Finished).await;
    assert!(p.end_message.is_some());

    assert_eq!(bob.outcome().await, SessionOutcome::ReturnToLogin);
    assert_eq!(ana.outcome().await, SessionOutcome::ReturnToLogin);
}

// ----------------------------------------------------------------------------
// [시나리오 2] Master 리셋 → 전원 Rejoin → 같은 이름으로 재입장
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_reset_leads_to_rejoin() {
    let endpoint = spawn_test_server().await;

    let mut ana = Running::start(&endpoint, "Ana").await;
    ana.wait_for("Ana 입장", joined).await;
    let mut bob = Running::start(&endpoint, "Bob").await;
    bob.wait_for("Bob 입장", joined).await;
    ana.wait_for("명단 2명", |p| p.roster.len() == 2).await;

    ana.intent(Intent::ResetMeeting { confirmed: true }).await;

    let p = bob.wait_for("Bob 초기화", |p| p.connection == ConnectionPhase::Connecting).await;
    assert_eq!(p, ClientProjection::pre_join("Bob"));

    assert_eq!(ana.outcome().await, SessionOutcome::Rejoin);
    assert_eq!(bob.outcome().await, SessionOutcome::Rejoin);

    let mut bob = Running::start(&endpoint, "Bob").await;
    let p = bob.wait_for("Bob 재입장", joined).await;
    assert!(p.is_master(), "빈 방의 첫 입장자는 Master");
}

// ----------------------------------------------------------------------------
// [시나리오 2-1] 앞뒤 공백이 있는 이름도 서버 명단과 같은 이름으로 취급
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_padded_name_is_trimmed_on_both_sides() {
    let endpoint = spawn_test_server().await;

    let mut ana = Running::start(&endpoint, "  Ana ").await;
    let p = ana.wait_for("Ana 명단", |p| joined(p) && !p.roster.is_empty()).await;
    assert_eq!(p.local_name, "Ana");
    assert_eq!(p.roster, vec!["Ana".to_string()]);
}

// ----------------------------------------------------------------------------
// [시나리오 3] 로컬 거부는 서버로 아무것도 보내지 않음
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_local_rejection_is_rendered() {
    let endpoint = spawn_test_server().await;

    let mut ana = Running::start(&endpoint, "Ana").await;
    ana.wait_for("Ana 입장", joined).await;
    let mut bob = Running::start(&endpoint, "Bob").await;
    bob.wait_for("Bob 입장", joined).await;

    bob.intent(Intent::StartMeeting).await;
    let p = bob.wait_for("거부 알림", |p| p.notice.is_some()).await;
    assert_eq!(p.notice.as_deref(), Some("start_meeting is not allowed for your role"));
    assert_eq!(p.meeting_phase, MeetingPhase::NotStarted);

    bob.command(UiCommand::DismissNotice).await;
    bob.wait_for("알림 닫힘", |p| p.notice.is_none()).await;

    // UI 채널이 닫히면 세션도 정리
    drop(bob.intents);
    assert_eq!(timeout(Duration::from_secs(2), bob.handle).await.unwrap().unwrap(), SessionOutcome::Quit);

    let p = ana.wait_for("Bob 퇴장", |p| p.roster == vec!["Ana".to_string()]).await;
    assert!(p.is_master());
}
