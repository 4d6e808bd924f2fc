//! 업스트림 HTTP 페치 레이어.
//!
//! 모든 업스트림 호출은 이 클라이언트를 거칩니다. 요청별 타임아웃과
//! 추가 헤더를 지원하며, 실패를 타임아웃 / 네트워크 / HTTP 상태로
//! 구분해 보고합니다.

use std::time::Duration;

use tracing::debug;

use fund_core::{FundError, FundResult};

/// 타임아웃과 헤더 오버라이드를 지원하는 텍스트 페치 클라이언트.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl FetchClient {
    pub fn new(user_agent: &str, default_timeout: Duration) -> FundResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| FundError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_timeout,
        })
    }

    /// 기본 타임아웃으로 텍스트를 가져옵니다.
    pub async fn fetch_text(&self, url: &str) -> FundResult<String> {
        self.fetch_text_with(url, self.default_timeout, &[]).await
    }

    /// 명시적 타임아웃과 추가 헤더로 텍스트를 가져옵니다.
    ///
    /// 2xx가 아닌 응답은 상태 코드와 본문 일부를 담은
    /// [`FundError::UpstreamHttp`]로 반환됩니다.
    pub async fn fetch_text_with(
        &self,
        url: &str,
        timeout: Duration,
        headers: &[(&str, &str)],
    ) -> FundResult<String> {
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Fetching upstream text");

        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FundError::UpstreamHttp {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let text = response.text().await.map_err(|e| classify(url, e))?;
        // 일부 업스트림 JS 파일은 UTF-8 BOM으로 시작
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

fn classify(url: &str, error: reqwest::Error) -> FundError {
    if error.is_timeout() {
        FundError::UpstreamTimeout(url.to_string())
    } else {
        FundError::Network(error.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
