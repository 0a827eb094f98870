//! 방언 인식 연결 팩토리
//!
//! 연결 URL의 방언에 맞는 풀 정책으로 연결 핸들을 생성합니다.
//! 핸들은 전역 상태가 아니라 호출자가 명시적으로 소유하고 서비스에 주입합니다.
//!
//! # 방언별 정책
//! - Postgres: 크기 10 + 초과 20, 3600초 재활용, 사용 전 생존 확인
//! - SQLite 파일: 풀 없음, 세션마다 새 연결
//! - SQLite 메모리: 단일 공유 연결을 프로세스 수명 동안 유지
//! - 기타: 단일 연결, 풀 없는 기본 정책 (`sqlx::any` 드라이버, 컴파일된 드라이버가 없으면 설정 오류)

use crate::config::db::{redact_url, DatabaseSettings};
use crate::config::dialect::{Dialect, PoolPolicy};
use crate::tool::error::ProfileError;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Any, ConnectOptions, Connection, Postgres, Sqlite, SqliteConnection};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// 초과 연결이 유휴 상태로 남아 있을 수 있는 시간
const OVERFLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// 전용 정책이 없지만 `sqlx::any`로 연결할 수 있는 스킴
const FALLBACK_SCHEMES: &[&str] = &["mysql", "mariadb"];

/// 방언별 물리 연결 백엔드
enum Backend {
    Postgres(PgPool),
    /// 풀 없이 세션마다 새 연결을 여는 데 쓰는 옵션
    SqliteFresh(SqliteConnectOptions),
    SqliteShared(SqlitePool),
    /// 기본 정책: 연결 하나만 허용하는 런타임 드라이버 풀
    Fallback(AnyPool),
}

/// 논리 세션 하나가 점유하는 연결
///
/// 드롭되면 풀 연결은 반환되고, 단독 연결은 닫힙니다.
pub enum Session {
    Postgres(PoolConnection<Postgres>),
    Sqlite(PoolConnection<Sqlite>),
    SqliteFresh(SqliteConnection),
    Any(PoolConnection<Any>),
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Session::Postgres(_) => "Postgres",
            Session::Sqlite(_) => "Sqlite",
            Session::SqliteFresh(_) => "SqliteFresh",
            Session::Any(_) => "Any",
        };
        f.debug_tuple("Session").field(&kind).finish()
    }
}

/// 세션 연결을 구체 타입으로 꺼내 같은 본문을 방언별로 실행합니다.
///
/// 본문 안에서 `$db`는 해당 방언의 `sqlx::Database` 타입, `$conn`은 `&mut` 연결입니다.
/// 본문이 `sqlx::Any`에서 컴파일되지 않으면(예: 시간대 타입 바인딩) `else`로
/// 기본 정책 세션에서 돌려줄 값을 지정합니다.
macro_rules! with_session {
    ($session:expr, |$conn:ident, $db:ident| $body:block else $fallback:expr) => {
        match $session {
            $crate::config::connection_pool::Session::Postgres(pooled) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Postgres;
                let $conn: &mut ::sqlx::PgConnection = &mut **pooled;
                $body
            }
            $crate::config::connection_pool::Session::Sqlite(pooled) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Sqlite;
                let $conn: &mut ::sqlx::SqliteConnection = &mut **pooled;
                $body
            }
            $crate::config::connection_pool::Session::SqliteFresh(fresh) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Sqlite;
                let $conn: &mut ::sqlx::SqliteConnection = fresh;
                $body
            }
            $crate::config::connection_pool::Session::Any(_) => $fallback,
        }
    };
    ($session:expr, |$conn:ident, $db:ident| $body:block) => {
        match $session {
            $crate::config::connection_pool::Session::Postgres(pooled) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Postgres;
                let $conn: &mut ::sqlx::PgConnection = &mut **pooled;
                $body
            }
            $crate::config::connection_pool::Session::Sqlite(pooled) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Sqlite;
                let $conn: &mut ::sqlx::SqliteConnection = &mut **pooled;
                $body
            }
            $crate::config::connection_pool::Session::SqliteFresh(fresh) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Sqlite;
                let $conn: &mut ::sqlx::SqliteConnection = fresh;
                $body
            }
            $crate::config::connection_pool::Session::Any(pooled) => {
                #[allow(dead_code)]
                type $db = ::sqlx::Any;
                let $conn: &mut ::sqlx::AnyConnection = &mut **pooled;
                $body
            }
        }
    };
}
pub(crate) use with_session;

/// 기본 정책 세션에서 수행할 수 없는 작업의 에러
pub(crate) fn unsupported_on_fallback(operation: &str) -> sqlx::Error {
    sqlx::Error::Configuration(
        format!("기본 연결 정책에서는 지원하지 않는 작업입니다: {operation}").into(),
    )
}

/// 연결 풀 통계 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32, // 전체 연결 수
    pub idle: u32, // 유휴 연결 수
}

/// 방언에 맞게 구성된 연결 핸들
pub struct ConnectionHandle {
    dialect: Dialect,
    policy: PoolPolicy,
    backend: Backend,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("dialect", &self.dialect)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    /// 논리 작업 하나를 위한 세션을 획득합니다.
    ///
    /// 서버 풀이 가득 차면 정책의 타임아웃까지 대기합니다. 팩토리는 재시도하지 않습니다.
    pub async fn session(&self) -> Result<Session, ProfileError> {
        let session = match &self.backend {
            Backend::Postgres(pool) => pool.acquire().await.map(Session::Postgres),
            Backend::SqliteShared(pool) => pool.acquire().await.map(Session::Sqlite),
            Backend::SqliteFresh(options) => options.connect().await.map(Session::SqliteFresh),
            Backend::Fallback(pool) => pool.acquire().await.map(Session::Any),
        };

        session.map_err(|e| {
            let err = match ProfileError::from(e) {
                ProfileError::Query(msg) => ProfileError::Connection(msg),
                other => other,
            };
            err.log("세션 획득");
            err
        })
    }

    /// 데이터베이스 연결 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool, ProfileError> {
        let mut session = self.session().await?;
        let ping = with_session!(&mut session, |conn, DB| { conn.ping().await });

        match ping {
            Ok(()) => {
                debug!("데이터베이스 연결 상태 양호");
                Ok(true)
            }
            Err(e) => {
                error!("데이터베이스 상태 확인 실패: {}", e);
                Err(ProfileError::Connection(format!("상태 확인 실패: {e}")))
            }
        }
    }

    /// 연결 풀 통계를 반환합니다. 풀이 없는 정책이면 `None`.
    pub fn pool_stats(&self) -> Option<PoolStats> {
        match &self.backend {
            Backend::Postgres(pool) => Some(PoolStats {
                size: pool.size(),
                idle: pool.num_idle() as u32,
            }),
            Backend::SqliteShared(pool) => Some(PoolStats {
                size: pool.size(),
                idle: pool.num_idle() as u32,
            }),
            Backend::Fallback(pool) => Some(PoolStats {
                size: pool.size(),
                idle: pool.num_idle() as u32,
            }),
            Backend::SqliteFresh(_) => None,
        }
    }

    /// 서버 풀이 허용하는 최대 연결 수 (sqlx 풀 설정 기준)
    pub fn max_connections(&self) -> Option<u32> {
        match &self.backend {
            Backend::Postgres(pool) => Some(pool.options().get_max_connections()),
            Backend::SqliteShared(pool) => Some(pool.options().get_max_connections()),
            Backend::Fallback(pool) => Some(pool.options().get_max_connections()),
            Backend::SqliteFresh(_) => None,
        }
    }

    /// 연결을 닫습니다. 프로세스 종료 시 호출합니다.
    pub async fn close(&self) {
        info!("데이터베이스 연결 핸들을 닫는 중... ({})", self.dialect);
        match &self.backend {
            Backend::Postgres(pool) => pool.close().await,
            Backend::SqliteShared(pool) => pool.close().await,
            Backend::Fallback(pool) => pool.close().await,
            Backend::SqliteFresh(_) => {}
        }
    }
}

/// 연결 핸들 팩토리
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// 설정에서 연결 핸들을 생성합니다.
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<ConnectionHandle, ProfileError> {
        Self::connect(settings.url()).await
    }

    /// 연결 URL에서 방언을 판별해 연결 핸들을 생성합니다.
    ///
    /// 생성 중 발생한 에러는 컨텍스트와 함께 기록한 뒤 그대로 반환합니다.
    pub async fn connect(url: &str) -> Result<ConnectionHandle, ProfileError> {
        let redacted = redact_url(url);
        match Self::build(url).await {
            Ok(handle) => {
                info!(
                    dialect = %handle.dialect,
                    policy = ?handle.policy,
                    "연결 핸들 생성 완료: {}",
                    redacted
                );
                Ok(handle)
            }
            Err(e) => {
                error!(url = %redacted, error = ?e, "연결 핸들 생성 실패: {}", e);
                Err(e)
            }
        }
    }

    async fn build(url: &str) -> Result<ConnectionHandle, ProfileError> {
        let dialect = Dialect::from_url(url)?;
        let policy = PoolPolicy::for_dialect(&dialect);

        let backend = match (&dialect, policy) {
            (
                Dialect::Postgres,
                PoolPolicy::Queue {
                    pool_size,
                    max_overflow,
                    recycle,
                    pre_ping,
                    timeout,
                },
            ) => {
                let options = PgConnectOptions::from_str(&with_scheme(url, "postgres"))?;
                // 엔진처럼 지연 생성: 첫 세션 요청 시 연결
                let pool = PgPoolOptions::new()
                    .min_connections(pool_size)
                    .max_connections(pool_size + max_overflow)
                    .max_lifetime(Some(recycle))
                    .idle_timeout(Some(OVERFLOW_IDLE_TIMEOUT))
                    .test_before_acquire(pre_ping)
                    .acquire_timeout(timeout)
                    .connect_lazy_with(options);
                Backend::Postgres(pool)
            }
            (Dialect::SqliteFile(path), PoolPolicy::Null) => {
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true);
                Backend::SqliteFresh(options)
            }
            (Dialect::SqliteMemory, PoolPolicy::Static) => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
                // 연결이 닫히면 메모리 DB가 사라지므로 재활용/유휴 종료를 끔
                let pool = SqlitePoolOptions::new()
                    .min_connections(1)
                    .max_connections(1)
                    .max_lifetime(None)
                    .idle_timeout(None)
                    .connect_with(options)
                    .await?;
                Backend::SqliteShared(pool)
            }
            (Dialect::Other(scheme), PoolPolicy::Single)
                if FALLBACK_SCHEMES.contains(&scheme.as_str()) =>
            {
                sqlx::any::install_default_drivers();
                // 풀 없이 연결 하나만 사용하며, 첫 세션 요청 시 연결
                let pool = AnyPoolOptions::new()
                    .min_connections(0)
                    .max_connections(1)
                    .max_lifetime(None)
                    .connect_lazy(&with_scheme(url, scheme))?;
                Backend::Fallback(pool)
            }
            (dialect, policy) => {
                return Err(ProfileError::Configuration(format!(
                    "지원하는 드라이버가 없는 방언입니다: {dialect} (정책: {policy:?})"
                )));
            }
        };

        Ok(ConnectionHandle {
            dialect,
            policy,
            backend,
        })
    }
}

/// `postgresql+driver://` 형식의 스킴을 sqlx가 이해하는 스킴으로 바꿉니다.
fn with_scheme(url: &str, scheme: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => format!("{scheme}://{rest}"),
        None => url.to_string(),
    }
}
