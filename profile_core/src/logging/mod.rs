//! 로깅 초기화
//!
//! `tracing_subscriber`의 fmt 구독자를 `RUST_LOG` 기반 필터와 함께 설치합니다.
//!
//! # 사용 예시
//! ```rust
//! profile_core::logging::init_logging("info").ok();
//! tracing::info!("마이그레이션 시작");
//! ```

use tracing_subscriber::{fmt, EnvFilter};

/// 전역 로깅 구독자를 설치합니다.
///
/// `RUST_LOG`가 있으면 그 필터를, 없으면 `default_level`을 사용합니다.
/// 이미 구독자가 설치되어 있으면 에러를 반환하므로 테스트에서 여러 번 호출해도 안전합니다.
pub fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow::anyhow!("로깅 설정 파싱 실패: {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))
}
