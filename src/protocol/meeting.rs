// 회의 진행 핸들러 — 디코딩된 ClientCommand를 Room 연산으로 연결
//
// [Send 안전 원칙]
//   std::sync::MutexGuard는 .await 포인트를 넘길 수 없음.
//   모든 처리는 동기 함수 안에서 lock → 변경 → drop.
//   세마포어 지연만 별도 태스크에서 sleep 후 다시 lock.

use std::time::Duration;
use tracing::debug;

use crate::core::{lock_room, ConnId, SharedRoom};
use crate::error::StandupResult;
use crate::protocol::codec::{decode_command, ClientCommand};
use crate::protocol::protocol::AppState;

pub fn handle_text(state: &AppState, conn_id: ConnId, text: &str) -> StandupResult<()> {
    let command = decode_command(text)?;
    handle_command(state, conn_id, command)
}

pub fn handle_command(state: &AppState, conn_id: ConnId, command: ClientCommand) -> StandupResult<()> {
    let mut room = lock_room(&state.room);

    match command {
        ClientCommand::PressButton              => room.press_button(conn_id),
        ClientCommand::EndTurn { elapsed_ms }   => room.end_turn(conn_id, elapsed_ms),
        ClientCommand::StartMeeting             => room.start_meeting(conn_id),
        ClientCommand::StartSemaphore           => {
            let gen = room.start_semaphore(conn_id)?;
            drop(room);
            spawn_semaphore_timer(state.room.clone(), gen, state.semaphore_delay.pick());
            Ok(())
        }
        ClientCommand::SkipTurn                 => room.skip_turn(conn_id),
        ClientCommand::ResetMeeting             => room.reset(Some(conn_id)).map(|_| ()),
        ClientCommand::AddVirtualUser           => room.add_virtual_user(conn_id).map(|_| ()),
        ClientCommand::ReorderTurnOrder(names)  => room.reorder(conn_id, names),
    }
}

fn spawn_semaphore_timer(room: SharedRoom, gen: u64, delay: Duration) {
    debug!("[meeting] semaphore goes green in {}ms (gen={})", delay.as_millis(), gen);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        lock_room(&room).semaphore_turn_green(gen);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Room;
    use crate::error::StandupError;
    use crate::protocol::codec::{decode_event, ServerEvent};
    use crate::protocol::protocol::SemaphoreDelay;
    use tokio::sync::mpsc;

    fn state(delay_ms: u64) -> AppState {
        AppState {
            room:            Room::shared(),
            start_time_ms:   0,
            semaphore_delay: SemaphoreDelay { min_ms: delay_ms, max_ms: delay_ms },
        }
    }

    #[test]
    fn unknown_and_legacy_types_are_rejected() {
        let state = state(0);
        let (tx, _rx) = mpsc::channel(16);
        let ana = lock_room(&state.room).join("Ana", tx).unwrap();

        let err = handle_text(&state, ana, r#"{"type":"toggle_semaphore"}"#).unwrap_err();
        assert!(matches!(err, StandupError::UnknownType(t) if t == "toggle_semaphore"));
        let err = handle_text(&state, ana, "{oops").unwrap_err();
        assert!(matches!(err, StandupError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn semaphore_turns_green_after_delay() {
        let state = state(20);
        let (tx, mut rx) = mpsc::channel(16);
        let ana = lock_room(&state.room).join("Ana", tx).unwrap();

        handle_command(&state, ana, ClientCommand::StartMeeting).unwrap();
        handle_command(&state, ana, ClientCommand::StartSemaphore).unwrap();
        assert!(handle_command(&state, ana, ClientCommand::StartMeeting).is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut last_state = None;
        while let Ok(json) = rx.try_recv() {
            if let Ok(ev @ ServerEvent::MeetingState { .. }) = decode_event(&json) {
                last_state = Some(ev);
            }
        }
        assert_eq!(last_state, Some(ServerEvent::MeetingState { meeting_started: true, semaphore_green: true }));
    }

    #[tokio::test]
    async fn reset_cancels_pending_semaphore() {
        let state = state(30);
        let (tx, _rx) = mpsc::channel(16);
        let ana = lock_room(&state.room).join("Ana", tx).unwrap();

        handle_command(&state, ana, ClientCommand::StartMeeting).unwrap();
        handle_command(&state, ana, ClientCommand::StartSemaphore).unwrap();
        handle_command(&state, ana, ClientCommand::ResetMeeting).unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        let snap = lock_room(&state.room).snapshot();
        assert!(!snap.semaphore_green);
        assert!(snap.members.is_empty());
    }
}
