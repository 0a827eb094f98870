//! 프로필 서비스 에러 관리
//!
//! 데이터 무결성 계층에서 발생하는 모든 에러를 정의합니다.
//! 호출자가 "잘못된 입력"(Validation)과 "검증을 통과했는데도 저장소 제약이 깨짐"(Integrity)을
//! 구분할 수 있도록 두 종류를 분리해 보고합니다.

use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 필드 규칙 위반 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// 필수 필드 누락 또는 공백
    Required,
    /// 최대 길이 초과
    TooLong { max: usize },
    /// 한글/공백 이외 문자 포함
    NotKorean,
    /// 허용되지 않은 특수문자 포함
    SpecialCharacters,
    /// 숫자 범위 초과
    OutOfRange { min: i64, max: i64 },
    /// 잘못된 값 타입 (예: 문자열 자리에 숫자)
    InvalidType,
}

/// 단일 필드에 대한 규칙 위반
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 필드 검증 실패
///
/// 한 번의 검증에서 발견된 모든 위반을 담습니다. 비어 있는 상태로는 생성되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// 특정 필드의 첫 번째 위반을 찾습니다.
    pub fn violation_for(&self, field: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.field == field)
    }

    pub fn has_violation(&self, field: &str, kind: ViolationKind) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.kind == kind)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.violations.iter().map(|v| v.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// 공통 프로필 서비스 에러
#[derive(Error, Debug)]
pub enum ProfileError {
    /// 연결 URL 누락/형식 오류 등 시작 시점의 치명적 설정 오류
    #[error("설정 오류: {0}")]
    Configuration(String),

    #[error("입력값 검증 실패: {0}")]
    Validation(#[from] ValidationError),

    /// 저장소 제약 위반 (NOT NULL, CHECK 등)
    #[error("무결성 제약 위반: {0}")]
    Integrity(String),

    #[error("프로필을 찾을 수 없습니다: id={0}")]
    NotFound(i64),

    /// 풀 고갈, 생존 확인 실패 등
    #[error("데이터베이스 연결 실패: {0}")]
    Connection(String),

    #[error("데이터베이스 쿼리 실패: {0}")]
    Query(String),

    #[error("마이그레이션 실패: {0}")]
    Migration(String),
}

impl ProfileError {
    /// 에러의 심각도를 반환합니다.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Critical: 시스템 장애
            ProfileError::Configuration(_) | ProfileError::Connection(_) => ErrorSeverity::Critical,

            // High: 저장소 계약 위반 (검증 엔진 버그 신호)
            ProfileError::Integrity(_) | ProfileError::Query(_) | ProfileError::Migration(_) => {
                ErrorSeverity::High
            }

            // Medium: 사용자 입력 오류
            ProfileError::Validation(_) => ErrorSeverity::Medium,

            ProfileError::NotFound(_) => ErrorSeverity::Low,
        }
    }

    /// 에러를 로깅합니다.
    ///
    /// 검증 실패와 미존재는 호출자 책임이므로 시스템 장애 레벨로 남기지 않습니다.
    pub fn log(&self, context: &str) {
        match self.severity() {
            ErrorSeverity::Critical => error!("[CRITICAL] {} - {}", context, self),
            ErrorSeverity::High => error!("[HIGH] {} - {}", context, self),
            ErrorSeverity::Medium => info!("[MEDIUM] {} - {}", context, self),
            ErrorSeverity::Low => debug!("[LOW] {} - {}", context, self),
        }
    }

    /// 호출자가 재시도를 고려할 수 있는 에러인지 여부
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProfileError::Connection(_))
    }
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical, // 시스템 장애
    High,     // 저장소 계약 위반
    Medium,   // 사용자 입력 오류
    Low,      // 일반적인 경고
}

// Postgres SQLSTATE 22001: string_data_right_truncation
const PG_VALUE_TOO_LONG: &str = "22001";

impl From<sqlx::Error> for ProfileError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation => ProfileError::Integrity(db_err.to_string()),
                _ if db_err.code().as_deref() == Some(PG_VALUE_TOO_LONG) => {
                    ProfileError::Integrity(db_err.to_string())
                }
                _ => ProfileError::Query(db_err.to_string()),
            },
            sqlx::Error::PoolTimedOut => {
                ProfileError::Connection("데이터베이스 연결 풀 타임아웃".to_string())
            }
            sqlx::Error::PoolClosed => {
                ProfileError::Connection("데이터베이스 연결 풀이 닫혔습니다".to_string())
            }
            sqlx::Error::Io(io_err) => ProfileError::Connection(io_err.to_string()),
            sqlx::Error::Tls(tls_err) => ProfileError::Connection(tls_err.to_string()),
            sqlx::Error::Configuration(cfg_err) => ProfileError::Configuration(cfg_err.to_string()),
            other => {
                warn!("분류되지 않은 데이터베이스 에러: {}", other);
                ProfileError::Query(other.to_string())
            }
        }
    }
}
