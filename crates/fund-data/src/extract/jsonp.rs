//! JSONP 봉투 추출.
//!
//! 장중 추정치 피드는 `jsonpgz({...});` 형태로 응답합니다. 콜백 이름과
//! 괄호를 벗겨 내부 JSON만 파싱합니다. 끝의 세미콜론은 선택적입니다.

use serde::de::DeserializeOwned;

use fund_core::{FundError, FundResult};

/// `callback(<json>);` 봉투에서 내부 JSON 텍스트를 추출합니다.
pub fn strip_envelope<'a>(text: &'a str, callback: &str) -> FundResult<&'a str> {
    let trimmed = text.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);

    body.strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| {
            FundError::UpstreamFormat(format!("malformed JSONP envelope for {}", callback))
        })
}

/// JSONP 봉투를 벗기고 내부 JSON을 역직렬화합니다.
pub fn parse_json<T: DeserializeOwned>(text: &str, callback: &str) -> FundResult<T> {
    let inner = strip_envelope(text, callback)?;
    serde_json::from_str(inner)
        .map_err(|e| FundError::UpstreamFormat(format!("invalid JSONP payload: {}", e)))
}
