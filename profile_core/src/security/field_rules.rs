//! 필드 규칙 엔진
//!
//! 프로필 필드별 제약(필수 여부, 최대 길이, 문자 집합, 숫자 범위)을 하나의 규칙 테이블로 정의하고,
//! 경계 스키마와 영속 모델이 동일한 테이블을 통해 검증하도록 합니다.
//! 두 계층이 같은 함수를 호출하므로 규칙이 서로 어긋날 수 없습니다.
//!
//! # 사용 예시
//! ```
//! use profile_core::security::field_rules::{Completeness, FieldCheck, ProfileField};
//!
//! let mut check = FieldCheck::new(Completeness::Full);
//! let name = check.text(ProfileField::Name, Some("홍길동"));
//! let age = check.integer(ProfileField::Age, Some(30));
//! check.finish().unwrap();
//! assert_eq!(name.as_deref(), Some("홍길동"));
//! assert_eq!(age, Some(30));
//! ```

use crate::security::charset::{has_special_characters, is_korean_only};
use crate::tool::error::{FieldViolation, ValidationError, ViolationKind};
use std::fmt;

/// 사용자가 입력할 수 있는 프로필 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Region,
    Company,
    Bio,
    Hobbies,
    Interests,
    Age,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::Name,
        ProfileField::Region,
        ProfileField::Company,
        ProfileField::Bio,
        ProfileField::Hobbies,
        ProfileField::Interests,
        ProfileField::Age,
    ];

    /// 컬럼/JSON 키 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Region => "region",
            ProfileField::Company => "company",
            ProfileField::Bio => "bio",
            ProfileField::Hobbies => "hobbies",
            ProfileField::Interests => "interests",
            ProfileField::Age => "age",
        }
    }

    /// 이 필드에 적용되는 규칙
    pub fn rule(&self) -> &'static FieldRule {
        // 테이블 순서는 ALL 순서와 동일
        &USER_PROFILE_RULES[*self as usize]
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 필드 값의 기대 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
        }
    }
}

/// 문자 집합 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// 제한 없음
    Any,
    /// 한글과 공백만 허용
    KoreanOnly,
    /// 영문, 숫자, 한글, 공백만 허용
    NoSpecialChars,
}

impl CharClass {
    /// 값이 문자 집합 규칙을 만족하는지 확인합니다.
    ///
    /// 텍스트가 아닌 값은 보수적으로 실패 처리합니다.
    pub fn admits(&self, value: &FieldValue<'_>) -> bool {
        let FieldValue::Text(text) = value else {
            return false;
        };
        match self {
            CharClass::Any => true,
            CharClass::KoreanOnly => is_korean_only(text),
            CharClass::NoSpecialChars => !has_special_characters(text),
        }
    }
}

/// 단일 필드의 선언적 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: ProfileField,
    pub kind: FieldKind,
    pub required: bool,
    /// `None`이면 길이 제한 없음
    pub max_length: Option<usize>,
    pub char_class: CharClass,
    /// 숫자 필드의 포함 범위
    pub range: Option<(i64, i64)>,
}

/// 나이 허용 범위
pub const AGE_RANGE: (i64, i64) = (0, 200);

/// 프로필 규칙 테이블 (ProfileField 선언 순서)
pub static USER_PROFILE_RULES: [FieldRule; 7] = [
    FieldRule {
        field: ProfileField::Name,
        kind: FieldKind::Text,
        required: true,
        max_length: Some(6),
        char_class: CharClass::KoreanOnly,
        range: None,
    },
    FieldRule {
        field: ProfileField::Region,
        kind: FieldKind::Text,
        required: true,
        max_length: Some(10),
        char_class: CharClass::KoreanOnly,
        range: None,
    },
    FieldRule {
        field: ProfileField::Company,
        kind: FieldKind::Text,
        required: false,
        max_length: Some(10),
        char_class: CharClass::KoreanOnly,
        range: None,
    },
    FieldRule {
        field: ProfileField::Bio,
        kind: FieldKind::Text,
        required: false,
        max_length: Some(128),
        char_class: CharClass::Any,
        range: None,
    },
    FieldRule {
        field: ProfileField::Hobbies,
        kind: FieldKind::Text,
        required: false,
        max_length: Some(10),
        char_class: CharClass::NoSpecialChars,
        range: None,
    },
    FieldRule {
        field: ProfileField::Interests,
        kind: FieldKind::Text,
        required: false,
        max_length: None,
        char_class: CharClass::Any,
        range: None,
    },
    FieldRule {
        field: ProfileField::Age,
        kind: FieldKind::Integer,
        required: false,
        max_length: None,
        char_class: CharClass::Any,
        range: Some(AGE_RANGE),
    },
];

/// 규칙 검사 대상 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Integer(i64),
    /// 텍스트/정수가 아닌 외부 입력 (JSON 타입 이름)
    Other(&'static str),
}

impl<'a> FieldValue<'a> {
    pub fn from_text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Text)
    }

    pub fn from_integer(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Integer)
    }

    /// JSON 값을 검사 대상 값으로 변환합니다. `null`은 부재로 봅니다.
    pub fn from_json(value: Option<&'a serde_json::Value>) -> Self {
        use serde_json::Value;

        match value {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Other("number"),
            },
            Some(Value::Bool(_)) => FieldValue::Other("boolean"),
            Some(Value::Array(_)) => FieldValue::Other("array"),
            Some(Value::Object(_)) => FieldValue::Other("object"),
        }
    }
}

/// 정규화된 검사 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Absent,
    Text(String),
    Integer(i64),
}

/// 부재 필드 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// 생성: 필수 필드가 없으면 실패
    Full,
    /// 부분 수정: 없는 필드는 검사하지 않음
    Partial,
}

impl FieldRule {
    /// 규칙을 값에 적용합니다.
    ///
    /// 텍스트는 앞뒤 공백을 제거한 값으로 검사하고 반환합니다.
    /// 선택 텍스트 필드가 공백뿐이면 부재로 취급합니다.
    pub fn apply(
        &self,
        value: FieldValue<'_>,
        completeness: Completeness,
    ) -> Result<Normalized, FieldViolation> {
        let value = match value {
            FieldValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    // 부분 수정에서도 "있는데 비어 있는" 필수 값은 실패
                    if self.required {
                        return Err(self.violation(ViolationKind::Required));
                    }
                    FieldValue::Absent
                } else {
                    FieldValue::Text(trimmed)
                }
            }
            other => other,
        };

        if value == FieldValue::Absent {
            if self.required && completeness == Completeness::Full {
                return Err(self.violation(ViolationKind::Required));
            }
            return Ok(Normalized::Absent);
        }

        match (self.kind, value) {
            (FieldKind::Text, FieldValue::Text(text)) => {
                if let Some(max) = self.max_length {
                    if text.chars().count() > max {
                        return Err(self.violation(ViolationKind::TooLong { max }));
                    }
                }
                if !self.char_class.admits(&value) {
                    return Err(self.violation(self.char_class_violation()));
                }
                Ok(Normalized::Text(text.to_string()))
            }
            (FieldKind::Integer, FieldValue::Integer(number)) => {
                if let Some((min, max)) = self.range {
                    if number < min || number > max {
                        return Err(self.violation(ViolationKind::OutOfRange { min, max }));
                    }
                }
                Ok(Normalized::Integer(number))
            }
            // 텍스트 규칙에 텍스트가 아닌 값: 문자 집합 규칙이 있으면 그 위반으로 보고
            (FieldKind::Text, other) if self.char_class != CharClass::Any => {
                debug_assert!(!self.char_class.admits(&other));
                Err(self.violation(self.char_class_violation()))
            }
            _ => Err(self.violation(ViolationKind::InvalidType)),
        }
    }

    fn char_class_violation(&self) -> ViolationKind {
        match self.char_class {
            CharClass::KoreanOnly => ViolationKind::NotKorean,
            CharClass::NoSpecialChars => ViolationKind::SpecialCharacters,
            CharClass::Any => ViolationKind::InvalidType,
        }
    }

    fn violation(&self, kind: ViolationKind) -> FieldViolation {
        let field = self.field.as_str();
        let message = match kind {
            ViolationKind::Required => format!("{field} is required"),
            ViolationKind::TooLong { max } => {
                format!("{field} length must be at most {max} characters")
            }
            ViolationKind::NotKorean => {
                format!("{field} must contain only Korean characters and spaces")
            }
            ViolationKind::SpecialCharacters => {
                format!("{field} cannot contain special characters")
            }
            ViolationKind::OutOfRange { min, max } => {
                format!("{field} must be between {min} and {max} inclusive")
            }
            ViolationKind::InvalidType => {
                format!("{field} has an invalid type, expected {}", self.kind.as_str())
            }
        };
        FieldViolation {
            field,
            kind,
            message,
        }
    }
}

/// 여러 필드를 검사하며 위반을 모으는 누산기
///
/// 각 메서드는 정규화된 값을 돌려주고, 위반은 내부에 쌓아 [`FieldCheck::finish`]에서 한 번에 보고합니다.
#[derive(Debug)]
pub struct FieldCheck {
    completeness: Completeness,
    violations: Vec<FieldViolation>,
}

impl FieldCheck {
    pub fn new(completeness: Completeness) -> Self {
        Self {
            completeness,
            violations: Vec::new(),
        }
    }

    /// 임의의 값을 규칙 테이블로 검사합니다.
    pub fn value(&mut self, field: ProfileField, value: FieldValue<'_>) -> Normalized {
        match field.rule().apply(value, self.completeness) {
            Ok(normalized) => normalized,
            Err(violation) => {
                self.violations.push(violation);
                Normalized::Absent
            }
        }
    }

    pub fn text(&mut self, field: ProfileField, value: Option<&str>) -> Option<String> {
        match self.value(field, FieldValue::from_text(value)) {
            Normalized::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&mut self, field: ProfileField, value: Option<i64>) -> Option<i64> {
        match self.value(field, FieldValue::from_integer(value)) {
            Normalized::Integer(number) => Some(number),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(field: ProfileField, value: FieldValue<'_>) -> Result<Normalized, FieldViolation> {
        field.rule().apply(value, Completeness::Full)
    }

    #[test]
    fn test_rule_table_order_matches_fields() {
        for field in ProfileField::ALL {
            assert_eq!(field.rule().field, field);
        }
    }

    #[test]
    fn test_name_length_boundary() {
        assert_eq!(
            apply(ProfileField::Name, FieldValue::Text("가나다라마바")),
            Ok(Normalized::Text("가나다라마바".to_string()))
        );
        let err = apply(ProfileField::Name, FieldValue::Text("가나다라마바사")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::TooLong { max: 6 });
        assert_eq!(err.message, "name length must be at most 6 characters");
    }

    #[test]
    fn test_required_fields() {
        for value in [FieldValue::Absent, FieldValue::Text(""), FieldValue::Text("   ")] {
            let err = apply(ProfileField::Region, value).unwrap_err();
            assert_eq!(err.kind, ViolationKind::Required);
            assert_eq!(err.message, "region is required");
        }
    }

    #[test]
    fn test_partial_skips_absent_but_not_blank_required() {
        let rule = ProfileField::Name.rule();
        assert_eq!(
            rule.apply(FieldValue::Absent, Completeness::Partial),
            Ok(Normalized::Absent)
        );
        let err = rule
            .apply(FieldValue::Text(" "), Completeness::Partial)
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Required);

        // 존재하는 값은 부분 수정에서도 동일하게 검사
        let err = rule
            .apply(FieldValue::Text("John"), Completeness::Partial)
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::NotKorean);
    }

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(
            apply(ProfileField::Name, FieldValue::Text("  홍길동 ")),
            Ok(Normalized::Text("홍길동".to_string()))
        );
    }

    #[test]
    fn test_empty_company_is_absent() {
        assert_eq!(apply(ProfileField::Company, FieldValue::Text("")), Ok(Normalized::Absent));
        assert_eq!(apply(ProfileField::Company, FieldValue::Text("  ")), Ok(Normalized::Absent));
    }

    #[test]
    fn test_hobbies_char_class() {
        assert_eq!(
            apply(ProfileField::Hobbies, FieldValue::Text("독서123")),
            Ok(Normalized::Text("독서123".to_string()))
        );
        let err = apply(ProfileField::Hobbies, FieldValue::Text("독서!")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::SpecialCharacters);
        assert_eq!(err.message, "hobbies cannot contain special characters");
    }

    #[test]
    fn test_age_range_boundaries() {
        assert!(apply(ProfileField::Age, FieldValue::Integer(0)).is_ok());
        assert!(apply(ProfileField::Age, FieldValue::Integer(200)).is_ok());
        for age in [-1, 201] {
            let err = apply(ProfileField::Age, FieldValue::Integer(age)).unwrap_err();
            assert_eq!(err.kind, ViolationKind::OutOfRange { min: 0, max: 200 });
            assert_eq!(err.message, "age must be between 0 and 200 inclusive");
        }
    }

    #[test]
    fn test_bio_and_interests_limits() {
        let long_bio = "a".repeat(129);
        let err = apply(ProfileField::Bio, FieldValue::Text(&long_bio)).unwrap_err();
        assert_eq!(err.kind, ViolationKind::TooLong { max: 128 });
        assert!(apply(ProfileField::Bio, FieldValue::Text("Hello! 😀")).is_ok());

        let long_interests = "관심사 ".repeat(500);
        assert!(apply(ProfileField::Interests, FieldValue::Text(&long_interests)).is_ok());
    }

    #[test]
    fn test_non_text_input_fails_conservatively() {
        assert!(!CharClass::KoreanOnly.admits(&FieldValue::Integer(1)));
        assert!(!CharClass::NoSpecialChars.admits(&FieldValue::Other("array")));

        let err = apply(ProfileField::Name, FieldValue::Integer(7)).unwrap_err();
        assert_eq!(err.kind, ViolationKind::NotKorean);
        let err = apply(ProfileField::Hobbies, FieldValue::Other("boolean")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::SpecialCharacters);
        let err = apply(ProfileField::Bio, FieldValue::Integer(7)).unwrap_err();
        assert_eq!(err.kind, ViolationKind::InvalidType);
        let err = apply(ProfileField::Age, FieldValue::Text("서른")).unwrap_err();
        assert_eq!(err.kind, ViolationKind::InvalidType);
    }

    #[test]
    fn test_field_check_collects_all_violations() {
        let mut check = FieldCheck::new(Completeness::Full);
        let name = check.text(ProfileField::Name, Some("Alice"));
        let region = check.text(ProfileField::Region, None);
        let age = check.integer(ProfileField::Age, Some(250));
        let company = check.text(ProfileField::Company, Some("회사"));

        assert_eq!(name, None);
        assert_eq!(region, None);
        assert_eq!(age, None);
        assert_eq!(company.as_deref(), Some("회사"));
        assert!(!check.is_valid());

        let err = check.finish().unwrap_err();
        assert_eq!(err.violations().len(), 3);
        assert!(err.has_violation("name", ViolationKind::NotKorean));
        assert!(err.has_violation("region", ViolationKind::Required));
        assert!(err.has_violation("age", ViolationKind::OutOfRange { min: 0, max: 200 }));
    }

    #[test]
    fn test_json_values() {
        let json = serde_json::json!({"a": "text", "b": 3, "c": 1.5, "d": null, "e": [1]});
        assert_eq!(FieldValue::from_json(json.get("a")), FieldValue::Text("text"));
        assert_eq!(FieldValue::from_json(json.get("b")), FieldValue::Integer(3));
        assert_eq!(FieldValue::from_json(json.get("c")), FieldValue::Other("number"));
        assert_eq!(FieldValue::from_json(json.get("d")), FieldValue::Absent);
        assert_eq!(FieldValue::from_json(json.get("missing")), FieldValue::Absent);
        assert_eq!(FieldValue::from_json(json.get("e")), FieldValue::Other("array"));
    }
}
