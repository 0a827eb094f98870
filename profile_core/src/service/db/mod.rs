//! 데이터베이스 서비스 모듈
//!
//! 사용자 프로필 생명주기 관리와 스키마 마이그레이션을 제공합니다.

pub mod migration;        // 스키마 리비전과 실행기
pub mod profile_service;  // 프로필 생성/조회/수정/삭제

pub use migration::{MigrationChain, MigrationRunner, Revision, REVISIONS};
pub use profile_service::{UserProfileService, UserProfileServiceImpl};
