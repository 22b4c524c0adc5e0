// Room — 단일 회의실 상태 (접속자, Master, 세마포어, 발언 대기열, 현재 발언자)
//
// 모든 변경은 SharedRoom(Mutex) 안에서 직렬 처리됩니다.
// "lock → 변경 + 패킷 생성/큐잉 → drop" 순서를 지켜, 모든 클라이언트가 같은 순서로 이벤트를 봅니다.
// 무효한 의도는 Err로 돌려주고 호출자(WS 핸들러)가 로그만 남깁니다. 와이어로 거부 응답은 없음.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{debug, info, trace};

use crate::config;
use crate::core::user::{BroadcastTx, ConnId, Member};
use crate::error::{StandupError, StandupResult};
use crate::protocol::codec::{encode_event, ServerEvent};
use crate::utils::{current_timestamp, normalize_name};

pub type SharedRoom = Arc<Mutex<Room>>;

/// 락 획득. 다른 태스크가 패닉으로 락을 오염시켜도 상태는 계속 사용
pub fn lock_room(room: &SharedRoom) -> MutexGuard<'_, Room> {
    room.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ----------------------------------------------------------------------------
// [타입]
// ----------------------------------------------------------------------------

/// 대기열/발언 자리 — 실제 접속자 또는 Master가 추가한 가상 참가자
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    Member(ConnId),
    Virtual(String),
}

#[derive(Debug, Clone)]
pub struct Speaking {
    pub seat:       Seat,
    pub name:       String,
    pub started_at: u64,
}

/// 서버 측정 발언 시간 (end_turn 시 기록, skip은 기록하지 않음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub name:        String,
    pub duration_ms: u64,
}

// ----------------------------------------------------------------------------
// [스냅샷] GET /status 응답
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MemberSnapshot {
    pub name:       String,
    pub is_master:  bool,
    pub has_spoken: bool,
    pub joined_at:  u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub members:          Vec<MemberSnapshot>,
    pub meeting_started:  bool,
    pub semaphore_green:  bool,
    pub queue:            Vec<String>,
    pub current_speaker:  Option<String>,
    pub speaking_ms:      Option<u64>,
    pub turn_times:       Vec<TurnRecord>,
}

// ----------------------------------------------------------------------------
// [Room]
// ----------------------------------------------------------------------------

pub struct Room {
    /// 입장 순서 유지 (Master 승계 시 가장 먼저 들어온 사람)
    members:         Vec<Member>,
    master:          Option<ConnId>,
    meeting_started: bool,
    semaphore_green: bool,
    /// 세마포어 타이머 세대. 리셋/종료/재가동 시 증가 → 이전 타이머 무효화
    semaphore_gen:   u64,
    queue:           VecDeque<Seat>,
    speaking:        Option<Speaking>,
    virtual_seq:     u32,
    turn_times:      Vec<TurnRecord>,
    next_conn_id:    ConnId,
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

impl Room {
    pub fn new() -> Self {
        trace!("Initializing Room");
        Self {
            members:         Vec::new(),
            master:          None,
            meeting_started: false,
            semaphore_green: false,
            semaphore_gen:   0,
            queue:           VecDeque::new(),
            speaking:        None,
            virtual_seq:     0,
            turn_times:      Vec::new(),
            next_conn_id:    0,
        }
    }

    pub fn shared() -> SharedRoom {
        Arc::new(Mutex::new(Self::new()))
    }

    // ------------------------------------------------------------------------
    // 입장 / 퇴장
    // ------------------------------------------------------------------------

    /// 핸드셰이크 이름으로 입장. 첫 입장자(또는 방이 빈 뒤 첫 입장자)가 Master
    pub fn join(&mut self, raw_name: &str, tx: BroadcastTx) -> StandupResult<ConnId> {
        let name = normalize_name(raw_name);
        if name.is_empty() || name.chars().count() > config::MAX_NAME_LENGTH {
            return Err(StandupError::InvalidName(raw_name.to_string()));
        }
        if self.name_in_use(&name) {
            return Err(StandupError::Handshake(format!("name {:?} is already in use", name)));
        }

        self.next_conn_id += 1;
        let conn_id   = self.next_conn_id;
        let is_master = self.master.is_none();
        if is_master {
            self.master = Some(conn_id);
        }

        let member = Member::new(conn_id, name.clone(), tx);
        member.push(&encode_event(&ServerEvent::InitialRole { is_master }));
        member.push(&encode_event(&self.state_event()));
        self.members.push(member);

        info!("[room] {} joined (conn={}, master={}, members={})", name, conn_id, is_master, self.members.len());

        // 전원(본인 포함)에게 명단, 본인에게 대기열/현재 발언자
        self.broadcast(&ServerEvent::UserList(self.roster()));
        self.send_to(conn_id, &ServerEvent::TurnOrder(self.queue_names()));
        if let Some(speaking) = &self.speaking {
            self.send_to(conn_id, &ServerEvent::NextSpeaker(speaking.name.clone()));
        }

        Ok(conn_id)
    }

    /// WS 종료 시 호출. 이미 리셋으로 제거된 연결이면 false
    pub fn leave(&mut self, conn_id: ConnId) -> bool {
        let pos = match self.members.iter().position(|m| m.conn_id == conn_id) {
            Some(p) => p,
            None    => return false,
        };
        let member = self.members.remove(pos);
        self.queue.retain(|s| *s != Seat::Member(conn_id));
        info!("[room] {} left (conn={}, members={})", member.name, conn_id, self.members.len());

        if self.members.is_empty() {
            // 아무도 없으면 회의 자체를 정리. 다음 입장자는 새 회의의 Master
            self.master = None;
            self.clear_meeting();
            self.turn_times.clear();
            self.virtual_seq = 0;
            debug!("[room] room is empty, meeting cleared");
            return true;
        }

        if self.master == Some(conn_id) {
            self.master = self.members.first().map(|m| m.conn_id);
            if let Some(new_master) = self.master {
                info!("[room] master promoted: {}", self.member_name(new_master));
                self.send_to(new_master, &ServerEvent::InitialRole { is_master: true });
            }
        }

        self.broadcast(&ServerEvent::UserList(self.roster()));
        self.broadcast(&ServerEvent::TurnOrder(self.queue_names()));

        let speaker_left = matches!(&self.speaking, Some(s) if s.seat == Seat::Member(conn_id));
        if speaker_left {
            self.speaking = None;
            if self.meeting_started {
                info!("[room] speaker {} left mid-turn, advancing", member.name);
                self.advance();
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Master 전용
    // ------------------------------------------------------------------------

    pub fn start_meeting(&mut self, conn_id: ConnId) -> StandupResult<()> {
        self.require_master(conn_id)?;
        if self.meeting_started {
            return Err(StandupError::Ignored("meeting already started".into()));
        }

        self.meeting_started = true;
        self.turn_times.clear();
        for m in &mut self.members {
            m.has_spoken = false;
        }
        info!("[room] meeting started");
        self.broadcast(&self.state_event());
        Ok(())
    }

    /// 세마포어 가동: 적색 브로드캐스트 후 타이머 세대를 돌려줌
    /// 호출자가 랜덤 지연 뒤 semaphore_turn_green(gen) 호출
    pub fn start_semaphore(&mut self, conn_id: ConnId) -> StandupResult<u64> {
        self.require_master(conn_id)?;
        if !self.meeting_started {
            return Err(StandupError::Ignored("meeting not started".into()));
        }
        if self.semaphore_green {
            return Err(StandupError::Ignored("semaphore already green".into()));
        }

        self.semaphore_gen += 1;
        self.broadcast(&self.state_event());
        debug!("[room] semaphore armed (gen={})", self.semaphore_gen);
        Ok(self.semaphore_gen)
    }

    /// 지연 만료. 그 사이 리셋/종료/재가동이 있었으면 무시
    pub fn semaphore_turn_green(&mut self, gen: u64) -> bool {
        if gen != self.semaphore_gen || !self.meeting_started || self.semaphore_green {
            trace!("[room] stale semaphore timer (gen={}, current={})", gen, self.semaphore_gen);
            return false;
        }
        self.semaphore_green = true;
        info!("[room] semaphore is green");
        self.broadcast(&self.state_event());
        true
    }

    /// 현재 발언 종료 (시간 기록 없음) 후 다음 순서로
    pub fn skip_turn(&mut self, conn_id: ConnId) -> StandupResult<()> {
        self.require_master(conn_id)?;
        if !self.meeting_started {
            return Err(StandupError::Ignored("meeting not started".into()));
        }
        if self.speaking.is_none() && self.queue.is_empty() {
            return Err(StandupError::Ignored("nothing to skip".into()));
        }

        if let Some(skipped) = self.speaking.take() {
            info!("[room] turn skipped: {}", skipped.name);
        }
        self.advance();
        Ok(())
    }

    pub fn add_virtual_user(&mut self, conn_id: ConnId) -> StandupResult<String> {
        self.require_master(conn_id)?;

        let name = loop {
            self.virtual_seq += 1;
            let candidate = format!("{} {}", config::VIRTUAL_USER_NAME, self.virtual_seq);
            if !self.name_in_use(&candidate) {
                break candidate;
            }
        };
        self.queue.push_back(Seat::Virtual(name.clone()));
        info!("[room] virtual seat added: {}", name);
        self.broadcast(&ServerEvent::TurnOrder(self.queue_names()));
        Ok(name)
    }

    /// 대기열 순서 변경. 현재 대기열의 순열이 아니면 요청자에게 정답 turn_order 재전송
    pub fn reorder(&mut self, conn_id: ConnId, names: Vec<String>) -> StandupResult<()> {
        let current = self.queue_names();
        let result = self.require_master(conn_id).and_then(|_| {
            if is_permutation(&current, &names) {
                Ok(())
            } else {
                Err(StandupError::Ignored("reorder is not a permutation of the queue".into()))
            }
        });
        if let Err(e) = result {
            self.send_to(conn_id, &ServerEvent::TurnOrder(current));
            return Err(e);
        }

        let seats: Vec<(String, Seat)> = self.queue.iter()
            .map(|s| (self.seat_name(s), s.clone()))
            .collect();
        self.queue = names.iter()
            .filter_map(|n| seats.iter().find(|(name, _)| name == n).map(|(_, s)| s.clone()))
            .collect();

        info!("[room] turn order changed: {:?}", names);
        self.broadcast(&ServerEvent::TurnOrder(self.queue_names()));
        Ok(())
    }

    /// 전체 초기화. by=None 이면 운영자(HTTP) 요청
    /// meeting_reset 전송 후 모든 Member를 제거 → 각 연결이 닫히고 클라이언트는 재접속
    pub fn reset(&mut self, by: Option<ConnId>) -> StandupResult<usize> {
        if let Some(conn_id) = by {
            self.require_master(conn_id)?;
        }

        self.broadcast(&ServerEvent::MeetingReset);
        let dropped = self.members.len();
        self.members.clear();
        self.master = None;
        self.clear_meeting();
        self.turn_times.clear();
        self.virtual_seq = 0;

        info!("[room] meeting reset ({} connections dropped)", dropped);
        Ok(dropped)
    }

    // ------------------------------------------------------------------------
    // 참가자
    // ------------------------------------------------------------------------

    pub fn press_button(&mut self, conn_id: ConnId) -> StandupResult<()> {
        let member = self.member(conn_id)?;
        if self.master == Some(conn_id) {
            return Err(StandupError::Ignored("master does not join the queue".into()));
        }
        if !self.meeting_started {
            return Err(StandupError::Ignored("meeting not started".into()));
        }
        if !self.semaphore_green {
            return Err(StandupError::Ignored("semaphore is red".into()));
        }
        if member.has_spoken {
            return Err(StandupError::Ignored(format!("{} already spoke", member.name)));
        }
        let seat = Seat::Member(conn_id);
        let is_speaking = matches!(&self.speaking, Some(s) if s.seat == seat);
        if is_speaking || self.queue.contains(&seat) {
            return Err(StandupError::Ignored(format!("{} is already queued", member.name)));
        }

        info!("[room] {} joined the turn queue", member.name);
        self.queue.push_back(seat);
        self.broadcast(&ServerEvent::TurnOrder(self.queue_names()));

        if self.speaking.is_none() {
            self.advance();
        }
        Ok(())
    }

    /// 현재 발언자 본인만. 클라이언트 경과 시간은 참고용 로그
    pub fn end_turn(&mut self, conn_id: ConnId, client_elapsed_ms: Option<u64>) -> StandupResult<()> {
        let is_speaker = matches!(&self.speaking, Some(s) if s.seat == Seat::Member(conn_id));
        if !is_speaker {
            return Err(StandupError::Ignored("not the current speaker".into()));
        }

        if let Some(ended) = self.speaking.take() {
            let duration_ms = current_timestamp().saturating_sub(ended.started_at);
            info!("[room] turn ended: {} ({}ms, client reported {:?}ms)", ended.name, duration_ms, client_elapsed_ms);
            self.turn_times.push(TurnRecord { name: ended.name, duration_ms });
        }
        self.advance();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 조회
    // ------------------------------------------------------------------------

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_master(&self, conn_id: ConnId) -> bool {
        self.master == Some(conn_id)
    }

    pub fn roster(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn queue_names(&self) -> Vec<String> {
        self.queue.iter().map(|s| self.seat_name(s)).collect()
    }

    /// 연결별 송신 큐 초과 신호 (WS 핸들러가 감시)
    pub fn lag_signal(&self, conn_id: ConnId) -> Option<Arc<Notify>> {
        self.member(conn_id).ok().map(Member::lag_signal)
    }

    pub fn current_speaker(&self) -> Option<&str> {
        self.speaking.as_ref().map(|s| s.name.as_str())
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            members: self.members.iter()
                .map(|m| MemberSnapshot {
                    name:       m.name.clone(),
                    is_master:  self.master == Some(m.conn_id),
                    has_spoken: m.has_spoken,
                    joined_at:  m.joined_at,
                })
                .collect(),
            meeting_started: self.meeting_started,
            semaphore_green: self.semaphore_green,
            queue:           self.queue_names(),
            current_speaker: self.speaking.as_ref().map(|s| s.name.clone()),
            speaking_ms:     self.speaking.as_ref()
                .map(|s| current_timestamp().saturating_sub(s.started_at)),
            turn_times:      self.turn_times.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // 내부
    // ------------------------------------------------------------------------

    /// 대기열 머리를 현재 발언자로. 비었으면 회의 종료
    fn advance(&mut self) {
        self.speaking = None;

        let seat = match self.queue.pop_front() {
            Some(s) => s,
            None    => {
                self.finish_meeting();
                return;
            }
        };

        let name = self.seat_name(&seat);
        if let Seat::Member(conn_id) = &seat {
            if let Some(m) = self.members.iter_mut().find(|m| m.conn_id == *conn_id) {
                m.has_spoken = true;
            }
        }
        self.speaking = Some(Speaking { seat, name: name.clone(), started_at: current_timestamp() });

        info!("[room] next speaker: {}", name);
        self.broadcast(&ServerEvent::TurnOrder(self.queue_names()));
        self.broadcast(&ServerEvent::NextSpeaker(name));
    }

    /// 종료 안내 후 회의 필드만 초기화. 연결은 유지 (클라이언트가 스스로 로그인 화면으로)
    fn finish_meeting(&mut self) {
        self.broadcast(&ServerEvent::MeetingEnd(config::MEETING_END_MESSAGE.to_string()));
        for record in &self.turn_times {
            info!("[room] turn time: {} {}ms", record.name, record.duration_ms);
        }
        info!("[room] meeting finished ({} turns recorded)", self.turn_times.len());
        self.clear_meeting();
    }

    fn clear_meeting(&mut self) {
        self.meeting_started = false;
        self.semaphore_green = false;
        self.semaphore_gen  += 1;
        self.queue.clear();
        self.speaking = None;
        for m in &mut self.members {
            m.has_spoken = false;
        }
    }

    fn state_event(&self) -> ServerEvent {
        ServerEvent::MeetingState {
            meeting_started: self.meeting_started,
            semaphore_green: self.semaphore_green,
        }
    }

    fn broadcast(&self, event: &ServerEvent) {
        let json = encode_event(event);
        for m in &self.members {
            m.push(&json);
        }
    }

    fn send_to(&self, conn_id: ConnId, event: &ServerEvent) {
        if let Some(m) = self.members.iter().find(|m| m.conn_id == conn_id) {
            m.push(&encode_event(event));
        }
    }

    fn member(&self, conn_id: ConnId) -> StandupResult<&Member> {
        self.members.iter()
            .find(|m| m.conn_id == conn_id)
            .ok_or(StandupError::MemberNotFound(conn_id))
    }

    fn member_name(&self, conn_id: ConnId) -> String {
        self.member(conn_id).map(|m| m.name.clone()).unwrap_or_default()
    }

    fn require_master(&self, conn_id: ConnId) -> StandupResult<()> {
        let member = self.member(conn_id)?;
        if self.master != Some(conn_id) {
            return Err(StandupError::NotMaster(member.name.clone()));
        }
        Ok(())
    }

    fn seat_name(&self, seat: &Seat) -> String {
        match seat {
            Seat::Member(conn_id) => self.member_name(*conn_id),
            Seat::Virtual(name)   => name.clone(),
        }
    }

    /// 명단, 대기열(가상 참가자 포함), 현재 발언자 이름과 겹치면 사용 중
    fn name_in_use(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
            || self.queue.iter().any(|s| matches!(s, Seat::Virtual(v) if v == name))
            || matches!(&self.speaking, Some(s) if s.name == name)
    }
}

fn is_permutation(current: &[String], proposed: &[String]) -> bool {
    let mut a = current.to_vec();
    let mut b = proposed.to_vec();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::decode_event;
    use tokio::sync::mpsc;

    fn join(room: &mut Room, name: &str) -> (ConnId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(64);
        let id = room.join(name, tx).unwrap();
        (id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(json) = rx.try_recv() {
            out.push(decode_event(&json).unwrap());
        }
        out
    }

    /// Master(Ana) + 참가자(Bob, Cid), 회의 시작 + 녹색
    fn green_room() -> (Room, Vec<(ConnId, mpsc::Receiver<String>)>) {
        let mut room = Room::new();
        let ana = join(&mut room, "Ana");
        let bob = join(&mut room, "Bob");
        let cid = join(&mut room, "Cid");
        room.start_meeting(ana.0).unwrap();
        let gen = room.start_semaphore(ana.0).unwrap();
        assert!(room.semaphore_turn_green(gen));
        let mut conns = vec![ana, bob, cid];
        for (_, rx) in conns.iter_mut() {
            drain(rx);
        }
        (room, conns)
    }

    #[test]
    fn first_joiner_is_master_and_gets_full_state() {
        let mut room = Room::new();
        let (ana, mut rx) = join(&mut room, "  Ana ");
        assert!(room.is_master(ana));

        let events = drain(&mut rx);
        assert_eq!(events, vec![
            ServerEvent::InitialRole { is_master: true },
            ServerEvent::MeetingState { meeting_started: false, semaphore_green: false },
            ServerEvent::UserList(vec!["Ana".into()]),
            ServerEvent::TurnOrder(vec![]),
        ]);

        let (bob, mut bob_rx) = join(&mut room, "Bob");
        assert!(!room.is_master(bob));
        assert_eq!(drain(&mut bob_rx)[0], ServerEvent::InitialRole { is_master: false });
        assert_eq!(drain(&mut rx), vec![ServerEvent::UserList(vec!["Ana".into(), "Bob".into()])]);
    }

    #[test]
    fn join_rejects_bad_names() {
        let mut room = Room::new();
        let (tx, _rx) = mpsc::channel(4);
        assert!(matches!(room.join("   ", tx.clone()), Err(StandupError::InvalidName(_))));
        let long = "x".repeat(config::MAX_NAME_LENGTH + 1);
        assert!(matches!(room.join(&long, tx.clone()), Err(StandupError::InvalidName(_))));
        room.join("Ana", tx.clone()).unwrap();
        assert!(matches!(room.join("Ana", tx), Err(StandupError::Handshake(_))));
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn master_leave_promotes_earliest_joiner() {
        let mut room = Room::new();
        let (ana, _ana_rx) = join(&mut room, "Ana");
        let (bob, mut bob_rx) = join(&mut room, "Bob");
        let (_cid, _cid_rx) = join(&mut room, "Cid");
        drain(&mut bob_rx);

        assert!(room.leave(ana));
        assert!(room.is_master(bob));
        let events = drain(&mut bob_rx);
        assert_eq!(events[0], ServerEvent::InitialRole { is_master: true });
        assert!(events.contains(&ServerEvent::UserList(vec!["Bob".into(), "Cid".into()])));
        assert!(!room.leave(ana));
    }

    #[test]
    fn press_requires_green_and_participant() {
        let mut room = Room::new();
        let (ana, _a) = join(&mut room, "Ana");
        let (bob, _b) = join(&mut room, "Bob");
        room.start_meeting(ana).unwrap();
        assert!(room.press_button(bob).is_err());

        let gen = room.start_semaphore(ana).unwrap();
        assert!(room.press_button(bob).is_err());
        assert!(room.semaphore_turn_green(gen));
        assert!(room.press_button(ana).is_err());
        assert!(room.press_button(bob).is_ok());
        assert_eq!(room.current_speaker(), Some("Bob"));
    }

    #[test]
    fn full_round_ends_meeting() {
        let (mut room, mut conns) = green_room();
        let bob = conns[1].0;
        let cid = conns[2].0;

        room.press_button(bob).unwrap();
        room.press_button(cid).unwrap();
        assert!(room.press_button(cid).is_err());
        assert_eq!(room.current_speaker(), Some("Bob"));
        assert_eq!(room.queue_names(), vec!["Cid".to_string()]);

        let events = drain(&mut conns[0].1);
        assert_eq!(events, vec![
            ServerEvent::TurnOrder(vec!["Bob".into()]),
            ServerEvent::TurnOrder(vec![]),
            ServerEvent::NextSpeaker("Bob".into()),
            ServerEvent::TurnOrder(vec!["Cid".into()]),
        ]);

        assert!(room.end_turn(cid, None).is_err());
        room.end_turn(bob, Some(1200)).unwrap();
        assert_eq!(room.current_speaker(), Some("Cid"));
        assert!(room.press_button(bob).is_err());

        room.end_turn(cid, None).unwrap();
        let events = drain(&mut conns[1].1);
        assert_eq!(events.last(), Some(&ServerEvent::MeetingEnd(config::MEETING_END_MESSAGE.into())));

        let snap = room.snapshot();
        assert!(!snap.meeting_started);
        assert!(!snap.semaphore_green);
        assert!(snap.current_speaker.is_none());
        assert_eq!(snap.turn_times.len(), 2);
        assert_eq!(room.member_count(), 3);
    }

    #[test]
    fn stale_semaphore_timer_is_ignored() {
        let mut room = Room::new();
        let (ana, _a) = join(&mut room, "Ana");
        room.start_meeting(ana).unwrap();
        let gen = room.start_semaphore(ana).unwrap();
        room.reset(None).unwrap();
        assert!(!room.semaphore_turn_green(gen));
    }

    #[test]
    fn participant_cannot_use_master_intents() {
        let mut room = Room::new();
        let (_ana, _a) = join(&mut room, "Ana");
        let (bob, _b) = join(&mut room, "Bob");
        assert!(matches!(room.start_meeting(bob), Err(StandupError::NotMaster(_))));
        assert!(matches!(room.add_virtual_user(bob), Err(StandupError::NotMaster(_))));
        assert!(matches!(room.reset(Some(bob)), Err(StandupError::NotMaster(_))));
        assert_eq!(room.member_count(), 2);
    }

    #[test]
    fn reorder_accepts_only_permutations() {
        let (mut room, mut conns) = green_room();
        let ana = conns[0].0;
        room.add_virtual_user(ana).unwrap();
        room.add_virtual_user(ana).unwrap();
        assert_eq!(room.queue_names(), vec!["Virtual User 1".to_string(), "Virtual User 2".to_string()]);
        drain(&mut conns[0].1);

        room.reorder(ana, vec!["Virtual User 2".into(), "Virtual User 1".into()]).unwrap();
        assert_eq!(room.queue_names(), vec!["Virtual User 2".to_string(), "Virtual User 1".to_string()]);
        drain(&mut conns[0].1);

        assert!(room.reorder(ana, vec!["Virtual User 2".into()]).is_err());
        assert_eq!(drain(&mut conns[0].1), vec![
            ServerEvent::TurnOrder(vec!["Virtual User 2".into(), "Virtual User 1".into()]),
        ]);
        assert!(drain(&mut conns[1].1).is_empty());
    }

    #[test]
    fn skip_turn_advances_without_recording() {
        let (mut room, conns) = green_room();
        let ana = conns[0].0;
        let bob = conns[1].0;
        room.press_button(bob).unwrap();
        room.add_virtual_user(ana).unwrap();
        room.skip_turn(ana).unwrap();
        assert_eq!(room.current_speaker(), Some("Virtual User 1"));
        room.skip_turn(ana).unwrap();
        assert!(room.snapshot().turn_times.is_empty());
        assert!(!room.snapshot().meeting_started);
    }

    #[test]
    fn speaker_leaving_mid_turn_advances() {
        let (mut room, mut conns) = green_room();
        let bob = conns[1].0;
        let cid = conns[2].0;
        room.press_button(bob).unwrap();
        room.press_button(cid).unwrap();
        drain(&mut conns[2].1);

        room.leave(bob);
        assert_eq!(room.current_speaker(), Some("Cid"));
        let events = drain(&mut conns[2].1);
        assert!(events.contains(&ServerEvent::NextSpeaker("Cid".into())));
    }

    #[test]
    fn reset_notifies_and_drops_everyone() {
        let (mut room, mut conns) = green_room();
        let ana = conns[0].0;
        assert_eq!(room.reset(Some(ana)).unwrap(), 3);
        assert_eq!(room.member_count(), 0);

        for (_, rx) in conns.iter_mut() {
            assert_eq!(rx.try_recv().ok().map(|j| decode_event(&j).unwrap()), Some(ServerEvent::MeetingReset));
            // Member(tx) drop → 채널 종료
            assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
        }

        let (next, _rx) = join(&mut room, "Bob");
        assert!(room.is_master(next));
    }

    #[tokio::test]
    async fn slow_member_is_flagged_for_disconnect() {
        let mut room = Room::new();
        let (_ana, _rx) = join(&mut room, "Ana");

        // 입장 직후 여러 프레임이 한 번에 나가므로 용량 1 큐는 바로 넘침
        let (tx, _slow_rx) = mpsc::channel(1);
        let slow = room.join("Bob", tx).unwrap();
        let lagged = room.lag_signal(slow).expect("joined member has a signal");
        let woke = tokio::time::timeout(std::time::Duration::from_millis(100), lagged.notified()).await;
        assert!(woke.is_ok());

        assert!(room.lag_signal(999).is_none());
    }
}
