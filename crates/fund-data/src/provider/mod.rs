//! 업스트림 데이터 제공자.
//!
//! [`FundMarketData`]는 조회 연산의 공통 인터페이스입니다. 파생 분석
//! 레이어는 이 트레이트에만 의존하므로 테스트에서 목 제공자로 교체할
//! 수 있습니다.

use async_trait::async_trait;
use chrono::NaiveDate;

use fund_core::types::{
    FundAssetAllocation, FundBasicInfo, FundGrandTotal, FundIndustryConfig, FundQuote,
    FundTopHoldings, HistoryRange, NavHistory, SimilarRanking,
};
use fund_core::FundResult;

pub mod eastmoney;

pub use eastmoney::{EastmoneyClient, PingZhongData};

/// 펀드 시장 데이터 조회 인터페이스.
#[async_trait]
pub trait FundMarketData: Send + Sync {
    /// 최신 공식 NAV와 장중 추정치.
    async fn fund_quote(&self, fund_code: &str) -> FundResult<FundQuote>;

    /// 구간 NAV 이력. `end_date`는 포함 경계입니다.
    async fn nav_history(
        &self,
        fund_code: &str,
        range: HistoryRange,
        end_date: Option<NaiveDate>,
    ) -> FundResult<NavHistory>;

    /// 기본 정보 (F10 프로필 보강 포함).
    async fn basic_info(&self, fund_code: &str) -> FundResult<FundBasicInfo>;

    /// 분기 업종 구성.
    async fn industry_config(&self, fund_code: &str) -> FundResult<FundIndustryConfig>;

    /// 분기 자산 배분.
    async fn asset_allocation(&self, fund_code: &str) -> FundResult<FundAssetAllocation>;

    /// 분기 상위 보유 종목. `year`/`month`로 과거 분기를 지정할 수 있습니다.
    async fn top_holdings(
        &self,
        fund_code: &str,
        topline: usize,
        year: Option<i32>,
        month: Option<u32>,
    ) -> FundResult<FundTopHoldings>;

    /// 동류 펀드 내 순위.
    async fn similar_ranking(&self, fund_code: &str) -> FundResult<SimilarRanking>;

    /// 동류 평균/기준 지수 대비 누적 수익률.
    async fn grand_total(&self, fund_code: &str) -> FundResult<FundGrandTotal>;
}
