// 역할/단계 기반 의도 검사 — 서버로 보내기 전에 로컬에서 거부
// 마지막으로 알고 있는 상태(투영)만 보고 판단. 자동 재시도 없음

use crate::client::projection::{ClientProjection, ConnectionPhase, MeetingPhase, Role, SemaphorePhase};
use crate::error::Rejection;
use crate::protocol::msg_type::client;

/// UI에서 올라오는 사용자 의도
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    PressButton,
    EndTurn,
    StartMeeting,
    StartSemaphore,
    SkipTurn,
    /// 확인 단계를 거친 경우에만 confirmed=true
    ResetMeeting { confirmed: bool },
    AddVirtualUser,
    ReorderTurnOrder(Vec<String>),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::PressButton          => client::PRESS_BUTTON,
            Intent::EndTurn              => client::END_TURN,
            Intent::StartMeeting         => client::START_MEETING,
            Intent::StartSemaphore       => client::START_SEMAPHORE,
            Intent::SkipTurn             => client::SKIP_TURN,
            Intent::ResetMeeting { .. }  => client::RESET_MEETING,
            Intent::AddVirtualUser       => client::ADD_VIRTUAL_USER,
            Intent::ReorderTurnOrder(_)  => client::REORDER_TURN_ORDER,
        }
    }

    pub fn is_master_only(&self) -> bool {
        !matches!(self, Intent::PressButton | Intent::EndTurn)
    }

    /// Master는 대기열에 들어가지 않음
    pub fn is_participant_only(&self) -> bool {
        matches!(self, Intent::PressButton)
    }
}

pub fn dispatch(intent: &Intent, projection: &ClientProjection) -> Result<(), Rejection> {
    if projection.connection != ConnectionPhase::Joined {
        return Err(Rejection::NotConnected);
    }

    let name = intent.name();
    let authorized = match projection.role {
        Role::Master      => !intent.is_participant_only(),
        Role::Participant => !intent.is_master_only(),
    };
    if !authorized {
        return Err(Rejection::NotAuthorized { intent: name });
    }

    let phase = |reason| Err(Rejection::InvalidPhase { intent: name, reason });

    match intent {
        Intent::PressButton => {
            if projection.local_has_joined_queue {
                return Err(Rejection::AlreadyPending);
            }
            if projection.semaphore_phase != SemaphorePhase::Green {
                return phase("semaphore is red");
            }
        }
        Intent::EndTurn => {
            if !projection.local_is_speaking {
                return phase("you are not speaking");
            }
        }
        Intent::StartMeeting => {
            if projection.meeting_phase != MeetingPhase::NotStarted {
                return phase("meeting already started");
            }
        }
        Intent::StartSemaphore => {
            if projection.meeting_phase != MeetingPhase::InProgress {
                return phase("meeting is not in progress");
            }
            if projection.semaphore_phase == SemaphorePhase::Green {
                return phase("semaphore is already green");
            }
        }
        Intent::SkipTurn => {
            if projection.meeting_phase != MeetingPhase::InProgress {
                return phase("meeting is not in progress");
            }
        }
        Intent::ResetMeeting { confirmed } => {
            if !confirmed {
                return Err(Rejection::NeedsConfirmation);
            }
        }
        Intent::AddVirtualUser => {}
        Intent::ReorderTurnOrder(names) => {
            if !is_permutation(names, &projection.queue) {
                return Err(Rejection::InvalidOrder);
            }
        }
    }
    Ok(())
}

fn is_permutation(proposed: &[String], current: &[String]) -> bool {
    if proposed.len() != current.len() {
        return false;
    }
    let mut a = proposed.to_vec();
    let mut b = current.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(role: Role) -> ClientProjection {
        let mut p = ClientProjection::pre_join("Ana");
        p.connection = ConnectionPhase::Joined;
        p.role = role;
        p
    }

    #[test]
    fn nothing_passes_before_join() {
        let p = ClientProjection::pre_join("Ana");
        assert_eq!(dispatch(&Intent::PressButton, &p), Err(Rejection::NotConnected));
        assert_eq!(dispatch(&Intent::StartMeeting, &p), Err(Rejection::NotConnected));
    }

    #[test]
    fn master_only_intents_rejected_for_participant() {
        let p = joined(Role::Participant);
        let intents = [
            Intent::StartMeeting,
            Intent::StartSemaphore,
            Intent::SkipTurn,
            Intent::ResetMeeting { confirmed: true },
            Intent::AddVirtualUser,
            Intent::ReorderTurnOrder(vec![]),
        ];
        for intent in intents {
            assert_eq!(
                dispatch(&intent, &p),
                Err(Rejection::NotAuthorized { intent: intent.name() }),
                "{:?}", intent
            );
        }
    }

    #[test]
    fn press_checks_pending_then_semaphore() {
        let mut p = joined(Role::Participant);
        p.meeting_phase = MeetingPhase::InProgress;
        assert!(matches!(dispatch(&Intent::PressButton, &p), Err(Rejection::InvalidPhase { .. })));

        p.semaphore_phase = SemaphorePhase::Green;
        assert_eq!(dispatch(&Intent::PressButton, &p), Ok(()));

        p.local_has_joined_queue = true;
        assert_eq!(dispatch(&Intent::PressButton, &p), Err(Rejection::AlreadyPending));
    }

    #[test]
    fn master_cannot_press() {
        let mut p = joined(Role::Master);
        p.meeting_phase = MeetingPhase::InProgress;
        p.semaphore_phase = SemaphorePhase::Green;
        assert_eq!(
            dispatch(&Intent::PressButton, &p),
            Err(Rejection::NotAuthorized { intent: client::PRESS_BUTTON })
        );
    }

    #[test]
    fn end_turn_only_while_speaking() {
        let mut p = joined(Role::Participant);
        assert!(dispatch(&Intent::EndTurn, &p).is_err());
        p.local_is_speaking = true;
        assert_eq!(dispatch(&Intent::EndTurn, &p), Ok(()));
    }

    #[test]
    fn master_phase_checks() {
        let mut p = joined(Role::Master);
        assert_eq!(dispatch(&Intent::StartMeeting, &p), Ok(()));
        assert!(dispatch(&Intent::StartSemaphore, &p).is_err());
        assert!(dispatch(&Intent::SkipTurn, &p).is_err());

        p.meeting_phase = MeetingPhase::InProgress;
        assert!(dispatch(&Intent::StartMeeting, &p).is_err());
        assert_eq!(dispatch(&Intent::StartSemaphore, &p), Ok(()));
        assert_eq!(dispatch(&Intent::SkipTurn, &p), Ok(()));
        assert_eq!(dispatch(&Intent::AddVirtualUser, &p), Ok(()));

        p.semaphore_phase = SemaphorePhase::Green;
        assert!(dispatch(&Intent::StartSemaphore, &p).is_err());
    }

    #[test]
    fn reset_needs_confirmation() {
        let p = joined(Role::Master);
        assert_eq!(dispatch(&Intent::ResetMeeting { confirmed: false }, &p), Err(Rejection::NeedsConfirmation));
        assert_eq!(dispatch(&Intent::ResetMeeting { confirmed: true }, &p), Ok(()));
    }

    #[test]
    fn reorder_must_be_permutation() {
        let mut p = joined(Role::Master);
        p.queue = vec!["Bob".into(), "Cid".into()];
        let ok = Intent::ReorderTurnOrder(vec!["Cid".into(), "Bob".into()]);
        assert_eq!(dispatch(&ok, &p), Ok(()));

        let missing = Intent::ReorderTurnOrder(vec!["Cid".into()]);
        assert_eq!(dispatch(&missing, &p), Err(Rejection::InvalidOrder));
        let foreign = Intent::ReorderTurnOrder(vec!["Cid".into(), "Dan".into()]);
        assert_eq!(dispatch(&foreign, &p), Err(Rejection::InvalidOrder));
    }
}
