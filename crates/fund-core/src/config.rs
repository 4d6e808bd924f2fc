//! 설정 관리.
//!
//! 업스트림 엔드포인트, 타임아웃, 캐시 TTL을 정의합니다.
//! 기본값 → 파일 → `FUND__` 접두사 환경 변수 순으로 로드되며,
//! 테스트에서는 베이스 URL을 로컬 목 서버로 주입할 수 있습니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FundConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 업스트림 엔드포인트 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 캐시 TTL 설정
    #[serde(default)]
    pub cache: CacheTtlConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 업스트림 엔드포인트 설정.
///
/// URL 형태는 업스트림과의 계약 상수입니다. 파서가 기대하는 리터럴
/// 변수명/필드 라벨과 함께 바이트 단위로 일치해야 합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// pingzhongdata JS 데이터 파일 베이스
    pub pingzhong_base: String,
    /// 장중 추정치(JSONP) 베이스
    pub fundgz_base: String,
    /// F10 기본 정보 HTML 페이지 베이스
    pub f10_profile_base: String,
    /// F10 JSON API 베이스
    pub f10_api_base: String,
    /// F10 아카이브(보유 종목) 엔드포인트
    pub f10_archives_base: String,
    /// 요청 User-Agent
    pub user_agent: String,
    /// 기본 요청 타임아웃 (초)
    pub fetch_timeout_secs: u64,
    /// 장중 추정치 요청 타임아웃 (초, 베스트에포트 피드라 더 짧게)
    pub estimate_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            pingzhong_base: "https://fund.eastmoney.com/pingzhongdata".to_string(),
            fundgz_base: "https://fundgz.1234567.com.cn/js".to_string(),
            f10_profile_base: "https://fundf10.eastmoney.com".to_string(),
            f10_api_base: "https://api.fund.eastmoney.com/f10".to_string(),
            f10_archives_base: "https://fundf10.eastmoney.com/FundArchivesDatas.aspx".to_string(),
            user_agent: "FundDashboard/0.1 (+local dev)".to_string(),
            fetch_timeout_secs: 15,
            estimate_timeout_secs: 8,
        }
    }
}

impl UpstreamConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn estimate_timeout(&self) -> Duration {
        Duration::from_secs(self.estimate_timeout_secs)
    }
}

/// 캐시 TTL 설정 (초).
///
/// TTL은 데이터 변동성에 따라 형식별로 고정됩니다: 장중 시세는 초 단위,
/// 이력 구간은 분 단위, 분기 공시는 시간 단위입니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheTtlConfig {
    /// 장중 시세
    pub quote_secs: u64,
    /// NAV 이력 구간
    pub nav_history_secs: u64,
    /// 원시 pingzhongdata 페이로드 및 파싱된 시리즈
    pub raw_payload_secs: u64,
    /// 누적 수익률 비교 시리즈
    pub grand_total_secs: u64,
    /// 동류 순위
    pub similar_ranking_secs: u64,
    /// 분기 공시 (기본 정보, 업종, 보유 종목)
    pub disclosure_secs: u64,
    /// 자산 배분
    pub asset_allocation_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            quote_secs: 30,
            nav_history_secs: 5 * 60,
            raw_payload_secs: 60 * 60,
            grand_total_secs: 60 * 60,
            similar_ranking_secs: 6 * 60 * 60,
            disclosure_secs: 12 * 60 * 60,
            asset_allocation_secs: 24 * 60 * 60,
        }
    }
}

impl CacheTtlConfig {
    pub fn quote(&self) -> Duration {
        Duration::from_secs(self.quote_secs)
    }

    pub fn nav_history(&self) -> Duration {
        Duration::from_secs(self.nav_history_secs)
    }

    pub fn raw_payload(&self) -> Duration {
        Duration::from_secs(self.raw_payload_secs)
    }

    pub fn grand_total(&self) -> Duration {
        Duration::from_secs(self.grand_total_secs)
    }

    pub fn similar_ranking(&self) -> Duration {
        Duration::from_secs(self.similar_ranking_secs)
    }

    pub fn disclosure(&self) -> Duration {
        Duration::from_secs(self.disclosure_secs)
    }

    pub fn asset_allocation(&self) -> Duration {
        Duration::from_secs(self.asset_allocation_secs)
    }
}

impl FundConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FUND")
                    .separator("__")
                    .try_parsing(true),
            );

        let loaded = builder.build()?;
        loaded.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
