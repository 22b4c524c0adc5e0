use std::time::{SystemTime, UNIX_EPOCH};

/// 현재 시간을 밀리초 단위의 Unix Timestamp로 반환합니다.
/// 에러 발생 시 시스템 패닉 대신 0(기본값)을 반환하여 장애를 방어합니다.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// 이름 정규화 — 앞뒤 공백 제거
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_monotonic_enough() {
        let t1 = current_timestamp();
        let t2 = current_timestamp();
        assert!(t2 >= t1);
        assert!(t1 > 0);
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(normalize_name("  Ana \n"), "Ana");
        assert_eq!(normalize_name("   "), "");
    }
}
