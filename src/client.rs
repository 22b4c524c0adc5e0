// 회의 클라이언트
//
// session    : WS 연결 1개 (핸드셰이크, 프레임 송수신)
// state      : sans-IO 상태머신 — 서버 이벤트/사용자 의도 → ClientEffect
// dispatcher : 역할/단계 기반 로컬 의도 검사
// projection : 렌더링용 읽기 전용 투영
// driver     : 세션 ↔ 상태머신 구동 루프

pub mod dispatcher;
pub mod driver;
pub mod projection;
pub mod session;
pub mod state;

pub use dispatcher::{dispatch, Intent};
pub use driver::{run_meeting, SessionOutcome, UiCommand};
pub use projection::{
    project, ClientProjection, ConnectionPhase, MeetingPhase, ProjectionLog, Render, Role, SemaphorePhase,
};
pub use session::{CloseReason, Session, SessionEvent};
pub use state::{ClientEffect, ClientState, MeetingClient};
