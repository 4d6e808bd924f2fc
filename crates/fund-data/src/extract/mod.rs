//! 업스트림 원시 형식 추출기.
//!
//! Eastmoney는 구조화된 API 대신 JS 파일과 HTML 조각으로 데이터를
//! 내보냅니다. 형식별 추출기는 세 가지입니다:
//!
//! - [`jsonp`]: `jsonpgz({...});` 형태의 JSONP 봉투
//! - [`literal`]: JS 파일 내 `var NAME = <JSON 리터럴>;` 구문
//! - [`html`]: 정의 테이블(th/td)과 헤더 주도 데이터 테이블

pub mod html;
pub mod jsonp;
pub mod literal;
