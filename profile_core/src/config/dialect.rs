//! 데이터베이스 방언 판별
//!
//! 연결 URL의 스킴으로 대상 엔진을 판별하고, 방언별 연결 풀 정책을 선택합니다.

use crate::tool::error::ProfileError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// 연결 URL이 가리키는 데이터베이스 방언
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// 네트워크 관계형 서버
    Postgres,
    /// 파일 기반 임베디드 엔진
    SqliteFile(PathBuf),
    /// 메모리 임베디드 엔진
    SqliteMemory,
    /// 전용 정책이 없는 방언 (스킴 이름)
    Other(String),
}

impl Dialect {
    /// 연결 URL에서 방언을 판별합니다.
    ///
    /// `postgresql+psycopg://`처럼 드라이버가 붙은 스킴은 백엔드 이름만 사용합니다.
    pub fn from_url(url: &str) -> Result<Self, ProfileError> {
        let (scheme, rest) = url
            .split_once(':')
            .filter(|(scheme, _)| !scheme.is_empty())
            .ok_or_else(|| {
                ProfileError::Configuration(format!("연결 URL에 스킴이 없습니다: {url}"))
            })?;
        let backend = scheme
            .split('+')
            .next()
            .unwrap_or(scheme)
            .to_ascii_lowercase();

        Ok(match backend.as_str() {
            "postgres" | "postgresql" => Dialect::Postgres,
            "sqlite" => match sqlite_path(rest) {
                Some(path) => Dialect::SqliteFile(path),
                None => Dialect::SqliteMemory,
            },
            _ => Dialect::Other(backend),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Dialect::Postgres => "postgresql",
            Dialect::SqliteFile(_) | Dialect::SqliteMemory => "sqlite",
            Dialect::Other(name) => name,
        }
    }

    pub fn is_sqlite(&self) -> bool {
        matches!(self, Dialect::SqliteFile(_) | Dialect::SqliteMemory)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::SqliteFile(path) => write!(f, "sqlite(file: {})", path.display()),
            Dialect::SqliteMemory => f.write_str("sqlite(memory)"),
            other => f.write_str(other.name()),
        }
    }
}

/// `sqlite:` 뒤 부분에서 파일 경로를 추출합니다. 메모리 DB이면 `None`.
///
/// 지원 형식: `sqlite:///rel.db`, `sqlite:////abs.db`, `sqlite://rel.db`, `sqlite:rel.db`,
/// `sqlite://`, `sqlite::memory:`, `sqlite:///:memory:`
fn sqlite_path(rest: &str) -> Option<PathBuf> {
    let rest = rest.split('?').next().unwrap_or(rest);
    let path = match rest.strip_prefix("//") {
        // SQLAlchemy 형식: 세 번째 슬래시는 구분자, 네 번째부터 절대 경로
        Some(after) => after.strip_prefix('/').unwrap_or(after),
        None => rest,
    };

    if path.is_empty() || path == ":memory:" || path == "/:memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// 서버 방언 연결 풀 기본값
pub const SERVER_POOL_SIZE: u32 = 10;
pub const SERVER_MAX_OVERFLOW: u32 = 20;
pub const SERVER_POOL_RECYCLE: Duration = Duration::from_secs(3600);
pub const SERVER_POOL_TIMEOUT: Duration = Duration::from_secs(30);

/// 방언별 연결 풀 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPolicy {
    /// 고정 크기 + 초과 허용 풀, 주기적 재활용, 사용 전 생존 확인
    Queue {
        pool_size: u32,
        max_overflow: u32,
        recycle: Duration,
        pre_ping: bool,
        timeout: Duration,
    },
    /// 풀 없음: 논리 연결마다 새 물리 연결 (파일 잠금 경합 방지)
    Null,
    /// 프로세스 수명 동안 유지되는 단일 공유 연결 (메모리 DB 보존)
    Static,
    /// 전용 정책이 없는 방언의 기본값: 단일 연결, 풀 없음
    Single,
}

impl PoolPolicy {
    pub fn for_dialect(dialect: &Dialect) -> Self {
        match dialect {
            Dialect::Postgres => PoolPolicy::Queue {
                pool_size: SERVER_POOL_SIZE,
                max_overflow: SERVER_MAX_OVERFLOW,
                recycle: SERVER_POOL_RECYCLE,
                pre_ping: true,
                timeout: SERVER_POOL_TIMEOUT,
            },
            Dialect::SqliteFile(_) => PoolPolicy::Null,
            Dialect::SqliteMemory => PoolPolicy::Static,
            Dialect::Other(_) => PoolPolicy::Single,
        }
    }

    /// 동시에 열릴 수 있는 최대 물리 연결 수. `None`이면 풀이 제한하지 않음.
    pub fn max_connections(&self) -> Option<u32> {
        match self {
            PoolPolicy::Queue {
                pool_size,
                max_overflow,
                ..
            } => Some(pool_size + max_overflow),
            PoolPolicy::Null => None,
            PoolPolicy::Static | PoolPolicy::Single => Some(1),
        }
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, PoolPolicy::Queue { .. } | PoolPolicy::Static)
    }
}
