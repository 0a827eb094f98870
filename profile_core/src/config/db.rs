//! 데이터베이스 환경 설정
//!
//! .env 파일 또는 환경 변수에서 `DATABASE_URL`을 읽어옵니다.
//! 연결 URL이 없으면 시작 시점의 치명적 설정 오류로 처리합니다.

use crate::tool::error::ProfileError;
use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

/// 연결 URL 환경 변수 이름
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// 데이터베이스 연결 설정
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    url: String,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.redacted_url())
            .finish()
    }
}

impl DatabaseSettings {
    /// 명시적인 URL로 설정을 생성합니다.
    pub fn new(url: impl Into<String>) -> Result<Self, ProfileError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ProfileError::Configuration(format!(
                "{DATABASE_URL_ENV}가 비어 있습니다"
            )));
        }
        Ok(Self {
            url: url.trim().to_string(),
        })
    }

    /// 환경에서 설정을 읽어옵니다.
    ///
    /// 현재 디렉토리의 .env, 상위 디렉토리의 .env, 기본 탐색 순으로 시도합니다.
    pub fn from_env() -> Result<Self, ProfileError> {
        load_env_file();

        let url = env::var(DATABASE_URL_ENV).map_err(|_| {
            ProfileError::Configuration(format!(
                "환경변수 '{DATABASE_URL_ENV}'가 설정되지 않았습니다. .env 파일을 확인하세요."
            ))
        })?;
        Self::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 비밀번호를 가린 URL (로그 출력용)
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

/// URL의 비밀번호 부분을 `***`로 가립니다. 파싱할 수 없는 URL은 그대로 둡니다.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("***")).is_ok() {
                parsed.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

fn load_env_file() {
    let current_dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let workspace_env = current_dir.join(".env");
    let parent_env = current_dir.parent().map(|p| p.join(".env"));

    if workspace_env.exists() {
        dotenv::from_path(&workspace_env).ok();
        info!("환경 파일 로드: {:?}", workspace_env);
        return;
    }
    // 서브패키지에서 실행되는 경우
    if let Some(parent_env) = parent_env.filter(|p| p.exists()) {
        dotenv::from_path(&parent_env).ok();
        info!("환경 파일 로드: {:?}", parent_env);
        return;
    }
    if dotenv().is_err() {
        warn!(".env 파일을 찾을 수 없어서 환경 변수를 직접 사용합니다.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_is_configuration_error() {
        assert!(matches!(
            DatabaseSettings::new("  "),
            Err(ProfileError::Configuration(_))
        ));
    }

    #[test]
    fn test_redacted_url_hides_password() {
        let settings = DatabaseSettings::new("postgresql://app:s3cret@db:5432/profiles").unwrap();
        let redacted = settings.redacted_url();
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("***"));
        assert!(!format!("{settings:?}").contains("s3cret"));

        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
    }
}
