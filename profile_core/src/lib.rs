//! 사용자 프로필 데이터 무결성 계층
//!
//! 필드 규칙 검증, 방언 인식 연결 팩토리, 프로필 생명주기 관리, 스키마 마이그레이션을 제공합니다.

pub mod config;
pub mod logging;
pub mod model;
pub mod schema;
pub mod security;
pub mod service;
pub mod tool;

pub use config::{ConnectionFactory, ConnectionHandle, DatabaseSettings, Dialect, PoolPolicy};
pub use model::{NewUserProfile, UserProfile, UserProfileChanges};
pub use service::{MigrationRunner, UserProfileService, UserProfileServiceImpl};
pub use tool::error::{ProfileError, ValidationError};
