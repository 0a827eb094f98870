//! 사용자 프로필 영속 모델
//!
//! `user_profile` 테이블의 행과, 저장소 계층으로 들어오는 생성/수정 입력을 정의합니다.
//! 입력은 경계 스키마에서 이미 검증되었더라도 여기서 같은 규칙 테이블로 다시 검증합니다.

use crate::security::field_rules::{Completeness, FieldCheck, ProfileField};
use crate::tool::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TABLE_NAME: &str = "user_profile";

/// `user_profile` 테이블의 한 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<UserProfile(id={}, name='{}', region='{}')>",
            self.id, self.name, self.region
        )
    }
}

/// 새 프로필 삽입 입력
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUserProfile {
    pub name: String,
    pub region: String,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,
    pub age: Option<i32>,
}

impl NewUserProfile {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    /// 모든 필드를 규칙 테이블로 검증하고 정규화된 값을 반환합니다.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let mut check = FieldCheck::new(Completeness::Full);
        let name = check.text(ProfileField::Name, Some(self.name.as_str()));
        let region = check.text(ProfileField::Region, Some(self.region.as_str()));
        let company = check.text(ProfileField::Company, self.company.as_deref());
        let bio = check.text(ProfileField::Bio, self.bio.as_deref());
        let hobbies = check.text(ProfileField::Hobbies, self.hobbies.as_deref());
        let interests = check.text(ProfileField::Interests, self.interests.as_deref());
        let age = check.integer(ProfileField::Age, self.age.map(i64::from));
        check.finish()?;

        Ok(Self {
            name: name.unwrap_or_default(),
            region: region.unwrap_or_default(),
            company,
            bio,
            hobbies,
            interests,
            // 범위 검사를 통과했으므로 i32로 손실 없이 변환됨
            age: age.map(|a| a as i32),
        })
    }
}

/// 부분 수정 입력. `None`은 "변경하지 않음"을 뜻합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfileChanges {
    pub name: Option<String>,
    pub region: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,
    pub age: Option<i32>,
}

impl UserProfileChanges {
    /// 제공된 필드만 검증합니다. 빈 선택 필드는 제공되지 않은 것으로 정규화됩니다.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let mut check = FieldCheck::new(Completeness::Partial);
        let changes = Self {
            name: check.text(ProfileField::Name, self.name.as_deref()),
            region: check.text(ProfileField::Region, self.region.as_deref()),
            company: check.text(ProfileField::Company, self.company.as_deref()),
            bio: check.text(ProfileField::Bio, self.bio.as_deref()),
            hobbies: check.text(ProfileField::Hobbies, self.hobbies.as_deref()),
            interests: check.text(ProfileField::Interests, self.interests.as_deref()),
            age: check
                .integer(ProfileField::Age, self.age.map(i64::from))
                .map(|a| a as i32),
        };
        check.finish()?;
        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
