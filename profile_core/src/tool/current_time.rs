use chrono::{DateTime, SubsecRound, Utc};

/// 타임스탬프 생성 도구
///
/// 저장소가 보존하는 정밀도(마이크로초)로 잘라서 반환하므로,
/// 저장 후 다시 읽은 값과 메모리의 값이 일치합니다.
pub struct CurrentTime;

impl CurrentTime {
    /// 현재 UTC 시각 (마이크로초 정밀도)
    pub fn now_utc() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
