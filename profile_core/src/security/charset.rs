//! 문자 집합 검증 모듈
//!
//! 텍스트가 허용된 문자 집합으로만 이루어져 있는지 판별하는 순수 함수들입니다.
//!
//! 한글 범위:
//! - 한글 자모: U+1100-U+11FF
//! - 한글 호환 자모: U+3130-U+318F
//! - 한글 음절: U+AC00-U+D7A3
//! - 한글 자모 확장-A: U+A960-U+A97F
//! - 한글 자모 확장-B: U+D7B0-U+D7FF

use once_cell::sync::Lazy;
use regex::Regex;

static KOREAN_ONLY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\x{1100}-\x{11FF}\x{3130}-\x{318F}\x{AC00}-\x{D7A3}\x{A960}-\x{A97F}\x{D7B0}-\x{D7FF}\s]*$")
        .expect("한글 패턴은 정적으로 유효함")
});

// 영문/숫자/한글/공백 이외의 문자가 하나라도 있으면 불일치
static ALLOWED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9\x{1100}-\x{11FF}\x{3130}-\x{318F}\x{AC00}-\x{D7A3}\x{A960}-\x{A97F}\x{D7B0}-\x{D7FF}\s]*$")
        .expect("허용 문자 패턴은 정적으로 유효함")
});

/// 문자열이 한글과 공백으로만 이루어졌는지 확인합니다.
///
/// 빈 문자열은 `true`입니다. 필수 여부는 호출자가 따로 확인합니다.
pub fn is_korean_only(text: &str) -> bool {
    KOREAN_ONLY_PATTERN.is_match(text)
}

/// 문자열에 특수문자가 포함되어 있는지 확인합니다.
///
/// 영문 대소문자, 숫자, 한글, 공백 이외의 문자는 모두 특수문자로 취급합니다.
pub fn has_special_characters(text: &str) -> bool {
    !ALLOWED_PATTERN.is_match(text)
}
