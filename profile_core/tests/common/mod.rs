//! 통합 테스트 공용 설정

use profile_core::config::{ConnectionFactory, ConnectionHandle};
use profile_core::service::{MigrationRunner, UserProfileServiceImpl};
use std::sync::Arc;

/// 마이그레이션이 적용된 메모리 DB 핸들
pub async fn migrated_memory_handle() -> Arc<ConnectionHandle> {
    let _ = profile_core::logging::init_logging("debug");

    let handle = Arc::new(
        ConnectionFactory::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database"),
    );
    MigrationRunner::new(handle.clone())
        .expect("Invalid revision chain")
        .upgrade(None)
        .await
        .expect("Failed to migrate");
    handle
}

#[allow(dead_code)]
pub async fn memory_service() -> UserProfileServiceImpl {
    UserProfileServiceImpl::new(migrated_memory_handle().await)
}
