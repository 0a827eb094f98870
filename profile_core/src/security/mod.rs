//! 입력 검증 모듈 - 문자 집합 검사, 필드 규칙
//!
//! 경계 스키마와 영속 모델이 같은 규칙 테이블을 공유합니다.

pub mod charset;
pub mod field_rules;

pub use charset::{has_special_characters, is_korean_only};
pub use field_rules::{
    Completeness, FieldCheck, FieldRule, FieldValue, Normalized, ProfileField, USER_PROFILE_RULES,
};
