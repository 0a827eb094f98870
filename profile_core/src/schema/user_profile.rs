//! 사용자 프로필 경계 스키마
//!
//! - `UserProfileCreate`: 생성 요청 (필수 필드 포함, 선택 필드 생략 가능)
//! - `UserProfileRead`: 조회 응답 (식별자와 타임스탬프 포함 전체 레코드)
//! - `UserProfileUpdate`: 수정 요청 (모든 필드 선택, 생략은 "변경하지 않음")
//!
//! 저장소 계층과 동일한 규칙 테이블을 사용하므로, 여기서 통과한 값은 저장소 검증도 통과합니다.

use crate::model::user_profile::{NewUserProfile, UserProfile, UserProfileChanges};
use crate::security::field_rules::{Completeness, FieldCheck, FieldValue, Normalized, ProfileField};
use crate::tool::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 프로필 생성 요청
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileCreate {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

/// 프로필 조회 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileRead {
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

/// 프로필 수정 요청
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub region: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub hobbies: Option<String>,
    pub interests: Option<String>,
    pub age: Option<i32>,
}

/// 정규화된 필드 값 묶음 (ProfileField::ALL 순서)
struct CheckedFields([Normalized; 7]);

impl CheckedFields {
    /// JSON 객체의 원시 값을 규칙 테이블로 검사합니다.
    ///
    /// 잘못된 타입의 값도 역직렬화 에러가 아닌 필드 위반으로 보고됩니다.
    fn from_json(json: &Value, completeness: Completeness) -> Result<Self, ValidationError> {
        let object = json.as_object();
        let mut check = FieldCheck::new(completeness);
        let fields = ProfileField::ALL.map(|field| {
            let raw = object.and_then(|o| o.get(field.as_str()));
            check.value(field, FieldValue::from_json(raw))
        });
        check.finish()?;
        Ok(Self(fields))
    }

    fn text(&self, field: ProfileField) -> Option<String> {
        match &self.0[field as usize] {
            Normalized::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn age(&self) -> Option<i32> {
        match self.0[ProfileField::Age as usize] {
            // 범위 검사를 통과한 값
            Normalized::Integer(age) => Some(age as i32),
            _ => None,
        }
    }
}

impl UserProfileCreate {
    /// 원시 JSON에서 생성 요청을 검증하며 만듭니다.
    pub fn from_json(json: &Value) -> Result<Self, ValidationError> {
        let fields = CheckedFields::from_json(json, Completeness::Full)?;
        Ok(Self {
            name: fields.text(ProfileField::Name).unwrap_or_default(),
            region: fields.text(ProfileField::Region).unwrap_or_default(),
            company: fields.text(ProfileField::Company),
            bio: fields.text(ProfileField::Bio),
            hobbies: fields.text(ProfileField::Hobbies),
            interests: fields.text(ProfileField::Interests),
            age: fields.age(),
        })
    }

    /// 규칙 테이블로 검증하고 정규화된 요청을 반환합니다.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        self.clone().into_new_profile().map(Self::from)
    }

    /// 검증 후 저장소 계층 입력으로 변환합니다. 검증은 저장소 모델이 수행합니다.
    pub fn into_new_profile(self) -> Result<NewUserProfile, ValidationError> {
        NewUserProfile::from(self).validated()
    }
}

impl From<UserProfileCreate> for NewUserProfile {
    fn from(create: UserProfileCreate) -> Self {
        Self {
            name: create.name,
            region: create.region,
            company: create.company,
            bio: create.bio,
            hobbies: create.hobbies,
            interests: create.interests,
            age: create.age,
        }
    }
}

impl From<NewUserProfile> for UserProfileCreate {
    fn from(profile: NewUserProfile) -> Self {
        Self {
            name: profile.name,
            region: profile.region,
            company: profile.company,
            bio: profile.bio,
            hobbies: profile.hobbies,
            interests: profile.interests,
            age: profile.age,
        }
    }
}

impl UserProfileUpdate {
    /// 원시 JSON에서 수정 요청을 검증하며 만듭니다. 없는 키와 `null`은 "변경하지 않음"입니다.
    pub fn from_json(json: &Value) -> Result<Self, ValidationError> {
        let fields = CheckedFields::from_json(json, Completeness::Partial)?;
        Ok(Self {
            name: fields.text(ProfileField::Name),
            region: fields.text(ProfileField::Region),
            company: fields.text(ProfileField::Company),
            bio: fields.text(ProfileField::Bio),
            hobbies: fields.text(ProfileField::Hobbies),
            interests: fields.text(ProfileField::Interests),
            age: fields.age(),
        })
    }

    /// 제공된 필드만 검증합니다.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        self.clone().into_changes().map(Self::from)
    }

    pub fn into_changes(self) -> Result<UserProfileChanges, ValidationError> {
        UserProfileChanges::from(self).validated()
    }
}

impl From<UserProfileUpdate> for UserProfileChanges {
    fn from(update: UserProfileUpdate) -> Self {
        Self {
            name: update.name,
            region: update.region,
            company: update.company,
            bio: update.bio,
            hobbies: update.hobbies,
            interests: update.interests,
            age: update.age,
        }
    }
}

impl From<UserProfileChanges> for UserProfileUpdate {
    fn from(changes: UserProfileChanges) -> Self {
        Self {
            name: changes.name,
            region: changes.region,
            company: changes.company,
            bio: changes.bio,
            hobbies: changes.hobbies,
            interests: changes.interests,
            age: changes.age,
        }
    }
}

impl From<UserProfile> for UserProfileRead {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            region: profile.region,
            company: profile.company,
            bio: profile.bio,
            hobbies: profile.hobbies,
            interests: profile.interests,
            age: profile.age,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::error::ViolationKind;
    use serde_json::json;

    fn valid_create() -> UserProfileCreate {
        UserProfileCreate {
            name: "홍길동".to_string(),
            region: "서울".to_string(),
            company: Some("네이버".to_string()),
            bio: Some("Hello, world!".to_string()),
            hobbies: Some("독서123".to_string()),
            interests: Some("여행, 사진, 음악".to_string()),
            age: Some(30),
        }
    }

    #[test]
    fn test_create_accepts_valid_data() {
        let create = valid_create();
        assert_eq!(create.validate().unwrap(), create);
    }

    #[test]
    fn test_create_accepts_minimal_required_fields() {
        let create = UserProfileCreate {
            name: "김철수".to_string(),
            region: "부산".to_string(),
            ..UserProfileCreate::default()
        };
        let profile = create.into_new_profile().unwrap();
        assert_eq!(profile, NewUserProfile::new("김철수", "부산"));
    }

    #[test]
    fn test_create_rejects_non_korean_name_and_region() {
        let create = UserProfileCreate {
            name: "John".to_string(),
            region: "Seoul".to_string(),
            ..valid_create()
        };
        let err = create.validate().unwrap_err();
        let name = err.violation_for("name").unwrap();
        assert_eq!(name.message, "name must contain only Korean characters and spaces");
        assert!(err.has_violation("region", ViolationKind::NotKorean));
    }

    #[test]
    fn test_create_rejects_non_korean_company() {
        let create = UserProfileCreate {
            company: Some("Samsung".to_string()),
            ..valid_create()
        };
        assert!(create
            .validate()
            .unwrap_err()
            .has_violation("company", ViolationKind::NotKorean));
    }

    #[test]
    fn test_create_rejects_overlength_fields() {
        let create = UserProfileCreate {
            name: "가나다라마바사".to_string(),
            region: "가".repeat(11),
            company: Some("가".repeat(11)),
            bio: Some("x".repeat(129)),
            hobbies: Some("a".repeat(11)),
            ..valid_create()
        };
        let err = create.validate().unwrap_err();
        assert!(err.has_violation("name", ViolationKind::TooLong { max: 6 }));
        assert!(err.has_violation("region", ViolationKind::TooLong { max: 10 }));
        assert!(err.has_violation("company", ViolationKind::TooLong { max: 10 }));
        assert!(err.has_violation("bio", ViolationKind::TooLong { max: 128 }));
        assert!(err.has_violation("hobbies", ViolationKind::TooLong { max: 10 }));
    }

    #[test]
    fn test_create_rejects_empty_required_fields() {
        let create = UserProfileCreate {
            name: "   ".to_string(),
            region: "".to_string(),
            ..valid_create()
        };
        let err = create.validate().unwrap_err();
        assert_eq!(err.violation_for("name").unwrap().message, "name is required");
        assert_eq!(err.violation_for("region").unwrap().message, "region is required");
    }

    #[test]
    fn test_create_from_json_reports_type_errors_per_field() {
        let body = json!({
            "name": 123,
            "region": "서울",
            "bio": ["not", "text"],
            "age": "서른",
        });
        let err = UserProfileCreate::from_json(&body).unwrap_err();
        assert!(err.has_violation("name", ViolationKind::NotKorean));
        assert!(err.has_violation("bio", ViolationKind::InvalidType));
        assert!(err.has_violation("age", ViolationKind::InvalidType));
    }

    #[test]
    fn test_create_from_json_normalizes() {
        let body = json!({"name": " 이영희 ", "region": "대구", "company": "", "age": 200});
        let create = UserProfileCreate::from_json(&body).unwrap();
        assert_eq!(create.name, "이영희");
        assert_eq!(create.company, None);
        assert_eq!(create.age, Some(200));

        let missing = UserProfileCreate::from_json(&json!({})).unwrap_err();
        assert!(missing.has_violation("name", ViolationKind::Required));
        assert!(missing.has_violation("region", ViolationKind::Required));
    }

    #[test]
    fn test_update_accepts_all_none_values() {
        let update = UserProfileUpdate::default();
        assert_eq!(update.validate().unwrap(), update);
        assert!(update.into_changes().unwrap().is_empty());
    }

    #[test]
    fn test_update_rejects_blank_name_if_provided() {
        let update = UserProfileUpdate {
            name: Some("".to_string()),
            ..UserProfileUpdate::default()
        };
        assert!(update
            .validate()
            .unwrap_err()
            .has_violation("name", ViolationKind::Required));
    }

    #[test]
    fn test_update_boundary_values() {
        for age in [0, 200] {
            let update = UserProfileUpdate {
                age: Some(age),
                ..UserProfileUpdate::default()
            };
            assert!(update.validate().is_ok());
        }
        for age in [-1, 201] {
            let update = UserProfileUpdate {
                age: Some(age),
                ..UserProfileUpdate::default()
            };
            assert!(update.validate().is_err());
        }
        let update = UserProfileUpdate {
            hobbies: Some("독서!".to_string()),
            ..UserProfileUpdate::default()
        };
        assert!(update
            .validate()
            .unwrap_err()
            .has_violation("hobbies", ViolationKind::SpecialCharacters));
    }

    #[test]
    fn test_update_from_json_null_means_untouched() {
        let update = UserProfileUpdate::from_json(&json!({"name": null, "age": 31})).unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.age, Some(31));
    }

    #[test]
    fn test_update_deserializes_missing_fields() {
        let update: UserProfileUpdate = serde_json::from_str(r#"{"region": "광주"}"#).unwrap();
        assert_eq!(update.region.as_deref(), Some("광주"));
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_read_from_model() {
        let now = Utc::now();
        let profile = UserProfile {
            id: 7,
            name: "홍길동".to_string(),
            region: "서울".to_string(),
            company: None,
            bio: None,
            hobbies: None,
            interests: None,
            age: Some(20),
            created_at: now,
            updated_at: now,
        };
        let read = UserProfileRead::from(profile);
        assert_eq!(read.id, 7);
        assert_eq!(read.created_at, read.updated_at);

        let dumped = serde_json::to_value(&read).unwrap();
        assert_eq!(dumped["name"], "홍길동");
        assert!(dumped["company"].is_null());
    }

    #[test]
    fn test_boundary_and_model_validation_agree() {
        let cases = [
            valid_create(),
            UserProfileCreate {
                name: "가나다라마바사".to_string(),
                hobbies: Some("독서!".to_string()),
                ..valid_create()
            },
            UserProfileCreate {
                company: Some("  ".to_string()),
                age: Some(201),
                ..valid_create()
            },
            UserProfileCreate::default(),
        ];
        for create in cases {
            let model = NewUserProfile::from(create.clone()).validated();
            assert_eq!(create.clone().into_new_profile(), model);
            assert_eq!(create.validate(), model.map(UserProfileCreate::from));
        }

        let update = UserProfileUpdate {
            name: Some(" ".to_string()),
            region: Some("제주".to_string()),
            ..UserProfileUpdate::default()
        };
        let model = UserProfileChanges::from(update.clone()).validated();
        assert_eq!(update.validate(), model.clone().map(UserProfileUpdate::from));
        assert_eq!(update.into_changes(), model);
    }
}
