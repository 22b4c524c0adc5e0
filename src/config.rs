// 매직 넘버를 배제하고 회의 진행 규칙과 한계를 제어하는 상수 모음입니다.

/// 웹소켓 시그널링 서버 TCP 포트
pub const SIGNALING_PORT: u16 = 8080;

/// 클라이언트 기본 접속 호스트
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// 송신(Egress) 큐 사이즈 (연결당).
/// 꽉 차면 해당 유저에게 가는 메시지를 버립니다(Drop/Backpressure).
pub const EGRESS_QUEUE_SIZE: usize = 256;

/// 세션 이벤트 큐 사이즈 (클라이언트 측 수신 → 상태머신)
pub const SESSION_EVENT_QUEUE_SIZE: usize = 256;

/// 접속 직후 {name} 핸드셰이크 최대 대기 시간 (10초)
pub const HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// 표시 이름 최대 길이 (문자 수)
pub const MAX_NAME_LENGTH: usize = 32;

// ----------------------------------------------------------------------------
// 회의 진행
// ----------------------------------------------------------------------------

/// 세마포어 녹색 전환 최소 지연 (2초)
pub const SEMAPHORE_MIN_DELAY_MS: u64 = 2_000;

/// 세마포어 녹색 전환 최대 지연 (5초)
pub const SEMAPHORE_MAX_DELAY_MS: u64 = 5_000;

/// meeting_end 수신 후 로그인 화면 복귀까지 지연 (3초)
pub const RETURN_TO_LOGIN_DELAY_MS: u64 = 3_000;

/// 가상 참가자 이름 접두어. 실제 이름은 "Virtual User 1", "Virtual User 2" ...
pub const VIRTUAL_USER_NAME: &str = "Virtual User";

/// 발언 대기열이 비었을 때 전원에게 보내는 종료 안내
pub const MEETING_END_MESSAGE: &str = "The meeting has finished. Thanks for participating!";
