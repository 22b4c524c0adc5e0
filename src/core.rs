// 네트워크 로직과 분리된 회의실 상태 관리 모듈입니다.

pub mod room;
pub mod user;

pub use room::{lock_room, MemberSnapshot, Room, RoomSnapshot, Seat, SharedRoom, TurnRecord};
pub use user::{BroadcastTx, ConnId, Member};
