//! 사용자 프로필 생명주기 서비스
//!
//! 생성/조회/수정/삭제를 담당합니다. 경계에서 검증된 입력이라도 저장 직전에 같은 규칙 테이블로
//! 다시 검증하고, 타임스탬프를 직접 찍습니다.
//! 기본 정책(런타임 드라이버) 연결에서는 시간대 타입을 다룰 수 없어 삭제만 지원합니다.
//! 모든 작업은 주입된 연결 핸들에서 세션을 하나 획득하고, 작업이 끝나면(실패 포함) 세션을 반환합니다.

use crate::config::connection_pool::{unsupported_on_fallback, with_session, ConnectionHandle};
use crate::model::user_profile::{NewUserProfile, UserProfile, UserProfileChanges, TABLE_NAME};
use crate::tool::current_time::CurrentTime;
use crate::tool::error::ProfileError;
use async_trait::async_trait;
use sqlx::QueryBuilder;
use std::sync::Arc;
use tracing::{debug, info};

/// 사용자 프로필 서비스 trait - 인터페이스 정의
#[async_trait]
pub trait UserProfileService: Send + Sync {
    /// 새 프로필을 저장하고 식별자를 반환합니다.
    async fn create(&self, profile: NewUserProfile) -> Result<i64, ProfileError>;

    async fn read(&self, id: i64) -> Result<UserProfile, ProfileError>;

    /// 제공된 필드만 수정합니다. 변경이 없어도 `updated_at`은 갱신됩니다.
    async fn update(&self, id: i64, changes: UserProfileChanges)
        -> Result<UserProfile, ProfileError>;

    /// 행을 완전히 삭제합니다. 없는 식별자는 `NotFound`입니다.
    async fn delete(&self, id: i64) -> Result<(), ProfileError>;
}

/// 사용자 프로필 서비스 구현체
pub struct UserProfileServiceImpl {
    handle: Arc<ConnectionHandle>,
}

impl UserProfileServiceImpl {
    pub fn new(handle: Arc<ConnectionHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }
}

/// 작업 실패를 기록하고 그대로 돌려줍니다.
fn logged<T>(result: Result<T, ProfileError>, context: &str) -> Result<T, ProfileError> {
    if let Err(e) = &result {
        e.log(context);
    }
    result
}

#[async_trait]
impl UserProfileService for UserProfileServiceImpl {
    async fn create(&self, profile: NewUserProfile) -> Result<i64, ProfileError> {
        let profile = logged(profile.validated().map_err(ProfileError::from), "프로필 생성 검증")?;
        let now = CurrentTime::now_utc();

        let mut session = self.handle.session().await?;
        let id = with_session!(&mut session, |conn, DB| {
            let mut builder = QueryBuilder::<DB>::new(format!(
                "INSERT INTO {TABLE_NAME} \
                 (name, region, company, bio, hobbies, interests, age, created_at, updated_at) "
            ));
            builder.push_values(std::iter::once(&profile), |mut row, p| {
                row.push_bind(p.name.clone())
                    .push_bind(p.region.clone())
                    .push_bind(p.company.clone())
                    .push_bind(p.bio.clone())
                    .push_bind(p.hobbies.clone())
                    .push_bind(p.interests.clone())
                    .push_bind(p.age)
                    .push_bind(now)
                    .push_bind(now);
            });
            builder.push(" RETURNING id");

            builder
                .build_query_scalar::<i64>()
                .fetch_one(&mut *conn)
                .await
        } else Err(unsupported_on_fallback("프로필 생성")));

        let id = logged(id.map_err(ProfileError::from), "프로필 생성")?;
        info!("프로필 생성 완료: id={}", id);
        Ok(id)
    }

    async fn read(&self, id: i64) -> Result<UserProfile, ProfileError> {
        let mut session = self.handle.session().await?;
        let profile = with_session!(&mut session, |conn, DB| {
            let mut builder =
                QueryBuilder::<DB>::new(format!("SELECT * FROM {TABLE_NAME} WHERE id = "));
            builder.push_bind(id);

            builder
                .build_query_as::<UserProfile>()
                .fetch_optional(&mut *conn)
                .await
        } else Err(unsupported_on_fallback("프로필 조회")));

        match logged(profile.map_err(ProfileError::from), "프로필 조회")? {
            Some(profile) => Ok(profile),
            None => {
                debug!("프로필 없음: id={}", id);
                Err(ProfileError::NotFound(id))
            }
        }
    }

    async fn update(
        &self,
        id: i64,
        changes: UserProfileChanges,
    ) -> Result<UserProfile, ProfileError> {
        let changes = logged(changes.validated().map_err(ProfileError::from), "프로필 수정 검증")?;
        let now = CurrentTime::now_utc();

        let mut session = self.handle.session().await?;
        let updated = with_session!(&mut session, |conn, DB| {
            let mut builder = QueryBuilder::<DB>::new(format!("UPDATE {TABLE_NAME} SET "));
            let mut assignments = builder.separated(", ");
            if let Some(name) = &changes.name {
                assignments.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(region) = &changes.region {
                assignments.push("region = ").push_bind_unseparated(region.clone());
            }
            if let Some(company) = &changes.company {
                assignments.push("company = ").push_bind_unseparated(company.clone());
            }
            if let Some(bio) = &changes.bio {
                assignments.push("bio = ").push_bind_unseparated(bio.clone());
            }
            if let Some(hobbies) = &changes.hobbies {
                assignments.push("hobbies = ").push_bind_unseparated(hobbies.clone());
            }
            if let Some(interests) = &changes.interests {
                assignments.push("interests = ").push_bind_unseparated(interests.clone());
            }
            if let Some(age) = changes.age {
                assignments.push("age = ").push_bind_unseparated(age);
            }
            // created_at과 id는 절대 갱신하지 않음
            assignments.push("updated_at = ").push_bind_unseparated(now);

            builder.push(" WHERE id = ");
            builder.push_bind(id);
            builder.push(" RETURNING *");

            builder
                .build_query_as::<UserProfile>()
                .fetch_optional(&mut *conn)
                .await
        } else Err(unsupported_on_fallback("프로필 수정")));

        match logged(updated.map_err(ProfileError::from), "프로필 수정")? {
            Some(profile) => {
                info!("프로필 수정 완료: id={}", id);
                Ok(profile)
            }
            None => Err(ProfileError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), ProfileError> {
        let mut session = self.handle.session().await?;
        let affected = with_session!(&mut session, |conn, DB| {
            let mut builder =
                QueryBuilder::<DB>::new(format!("DELETE FROM {TABLE_NAME} WHERE id = "));
            builder.push_bind(id);

            builder
                .build()
                .execute(&mut *conn)
                .await
                .map(|result| result.rows_affected())
        });

        match logged(affected.map_err(ProfileError::from), "프로필 삭제")? {
            0 => Err(ProfileError::NotFound(id)),
            _ => {
                info!("프로필 삭제 완료: id={}", id);
                Ok(())
            }
        }
    }
}
