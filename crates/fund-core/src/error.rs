//! 펀드 데이터 시스템의 에러 타입.
//!
//! 업스트림(써드파티 펀드 사이트) 장애와 로컬 장애를 구분하여
//! 배치 호출자가 항목별 성공/실패를 검사할 수 있도록 명시적인
//! 에러 종류를 정의합니다.

use thiserror::Error;

/// 펀드 데이터 에러.
///
/// 디듀프 테이블이 동일한 에러를 여러 대기자에게 전달해야 하므로
/// 모든 변형은 `Clone` 가능해야 합니다.
#[derive(Debug, Clone, Error)]
pub enum FundError {
    /// 잘못된 파라미터 (I/O 이전에 거부)
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// 업스트림 비성공 응답 (상태 코드 + 본문 보존)
    #[error("Upstream HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// 업스트림 요청 타임아웃
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// 네트워크 전송 에러 (DNS, 연결 끊김 등)
    #[error("Network error: {0}")]
    Network(String),

    /// 성공 응답이지만 기대한 리터럴/테이블/필드가 없음
    #[error("Upstream format error: {0}")]
    UpstreamFormat(String),

    /// 델타 계산에 필요한 이력 포인트 부족
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// 캐시 직렬화/역직렬화 에러
    #[error("Cache error: {0}")]
    Cache(String),

    /// 내부 에러
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 펀드 작업을 위한 Result 타입.
pub type FundResult<T> = Result<T, FundError>;

impl FundError {
    /// 업스트림 쪽 원인으로 분류되는 에러인지 확인합니다.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            FundError::UpstreamHttp { .. }
                | FundError::UpstreamTimeout(_)
                | FundError::UpstreamFormat(_)
                | FundError::Network(_)
        )
    }

    /// 호출자 입력 문제로 분류되는 에러인지 확인합니다.
    pub fn is_caller(&self) -> bool {
        matches!(self, FundError::InvalidParams(_))
    }
}

impl From<serde_json::Error> for FundError {
    fn from(err: serde_json::Error) -> Self {
        FundError::UpstreamFormat(format!("JSON parse failed: {}", err))
    }
}
