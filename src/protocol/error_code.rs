use crate::error::StandupError;

/// 1xxx: 접속/핸드셰이크
pub const HANDSHAKE_FAILED:  u16 = 1000;
pub const INVALID_NAME:      u16 = 1001;
pub const UNKNOWN_TYPE:      u16 = 1003;
pub const INVALID_PAYLOAD:   u16 = 1004;

/// 2xxx: 역할/멤버
pub const NOT_MASTER:        u16 = 2000;
pub const MEMBER_NOT_FOUND:  u16 = 2001;

/// 3xxx: 회의 진행 (현재 상태에서 허용되지 않는 의도)
pub const INTENT_IGNORED:    u16 = 3000;

/// 9xxx: 서버 내부
pub const INTERNAL_ERROR:    u16 = 9000;

/// StandupError → 에러 코드 변환
/// 와이어로는 나가지 않고 로그 필드로만 사용 (서버는 무효 의도를 조용히 버림)
pub fn to_error_code(err: &StandupError) -> u16 {
    match err {
        StandupError::Handshake(_)       => HANDSHAKE_FAILED,
        StandupError::InvalidName(_)     => INVALID_NAME,
        StandupError::UnknownType(_)     => UNKNOWN_TYPE,
        StandupError::InvalidPayload(_)  => INVALID_PAYLOAD,

        StandupError::NotMaster(_)       => NOT_MASTER,
        StandupError::MemberNotFound(_)  => MEMBER_NOT_FOUND,

        StandupError::Ignored(_)         => INTENT_IGNORED,

        StandupError::IoError(_)         => INTERNAL_ERROR,
    }
}

impl StandupError {
    pub fn code(&self) -> u16 {
        to_error_code(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        assert_eq!(StandupError::InvalidName(String::new()).code(), INVALID_NAME);
        assert_eq!(StandupError::NotMaster("Bob".into()).code(), NOT_MASTER);
        assert_eq!(StandupError::Ignored("semaphore is red".into()).code() / 1000, 3);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(StandupError::from(io).code(), INTERNAL_ERROR);
    }
}
