// 와이어 메시지 type 문자열 표.
// 한 동작에 대해 하나의 이름만 사용 (toggle_semaphore / next_turn / meeting_finished 등 구버전 이름은 미지원)

/// Client → Server
pub mod client {
    /// 발언 대기열 참여 요청 (세마포어 녹색일 때만)
    pub const PRESS_BUTTON:       &str = "press_button";
    /// 발언 종료. payload: 경과 시간(ms, 참고값)
    pub const END_TURN:           &str = "end_turn";

    // --- Master 전용 ---
    /// 회의 시작
    pub const START_MEETING:      &str = "start_meeting";
    /// 세마포어 가동 (적색 → 랜덤 지연 후 녹색)
    pub const START_SEMAPHORE:    &str = "start_semaphore";
    /// 현재 발언자 건너뛰기
    pub const SKIP_TURN:          &str = "skip_turn";
    /// 회의 전체 초기화 (전원 재접속)
    pub const RESET_MEETING:      &str = "reset_meeting";
    /// 가상 참가자 대기열 추가
    pub const ADD_VIRTUAL_USER:   &str = "add_virtual_user";
    /// 대기열 순서 변경. payload: 이름 배열
    pub const REORDER_TURN_ORDER: &str = "reorder_turn_order";

    pub const ALL: &[&str] = &[
        PRESS_BUTTON, END_TURN, START_MEETING, START_SEMAPHORE,
        SKIP_TURN, RESET_MEETING, ADD_VIRTUAL_USER, REORDER_TURN_ORDER,
    ];
}

/// Server → Client
pub mod server {
    /// 역할 통지 (접속 직후 1회, Master 승계 시 재전송)
    pub const INITIAL_ROLE:  &str = "initial_role";
    /// 회의 진행 여부 + 세마포어 상태
    pub const MEETING_STATE: &str = "meeting_state";
    /// 접속자 이름 목록 (전체 교체)
    pub const USER_LIST:     &str = "user_list";
    /// 발언 대기열 (전체 교체)
    pub const TURN_ORDER:    &str = "turn_order";
    /// 다음 발언자
    pub const NEXT_SPEAKER:  &str = "next_speaker";
    /// 회의 종료 안내
    pub const MEETING_END:   &str = "meeting_end";
    /// 회의 초기화 — 클라이언트는 처음부터 다시 접속
    pub const MEETING_RESET: &str = "meeting_reset";

    pub const ALL: &[&str] = &[
        INITIAL_ROLE, MEETING_STATE, USER_LIST, TURN_ORDER,
        NEXT_SPEAKER, MEETING_END, MEETING_RESET,
    ];
}
