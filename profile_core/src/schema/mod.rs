//! 외부 경계 스키마
//!
//! 웹 계층 등 외부 협력자가 주고받는 데이터 형태를 정의합니다.

pub mod user_profile;

pub use user_profile::{UserProfileCreate, UserProfileRead, UserProfileUpdate};
