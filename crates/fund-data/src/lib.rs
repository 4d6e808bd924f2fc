//! 펀드 데이터 수집 레이어.
//!
//! 업스트림(Eastmoney)의 JS/JSONP/HTML 표면을 소비해 검증된 도메인
//! 타입으로 변환하고, TTL 캐시와 동시 요청 병합으로 업스트림 호출을
//! 최소화합니다.
//!
//! # 구조
//!
//! - [`fetch`]: 타임아웃/헤더를 지원하는 HTTP 텍스트 페치
//! - [`cache`]: 주입 가능한 TTL 캐시와 in-flight 병합
//! - [`extract`]: JSONP / JS 리터럴 / HTML 테이블 추출기
//! - [`provider`]: [`EastmoneyClient`]와 [`FundMarketData`] 트레이트

pub mod cache;
pub mod extract;
pub mod fetch;
pub mod provider;

pub use cache::{CachePolicy, FundCache};
pub use fetch::FetchClient;
pub use provider::{EastmoneyClient, FundMarketData, PingZhongData};
