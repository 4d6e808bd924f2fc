//! # Fund Core
//!
//! 펀드 대시보드의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 펀드 시세/순자산 이력/공시 데이터 계약 구조체
//! - 에러 타입
//! - 거래소 현지(UTC+8) 달력 날짜 변환
//! - 고정 소수점 반올림 헬퍼
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod dates;
pub mod error;
pub mod logging;
pub mod numeric;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
