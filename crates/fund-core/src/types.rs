//! 다운스트림 계약 타입.
//!
//! HTTP/UI 레이어가 소비하는 구조체들입니다. JSON 직렬화는 기존 계약과
//! 동일하게 camelCase를 사용합니다. 파생 엔티티는 모두 입력의 순수 함수로
//! 재계산되며, 캐시를 제외한 요청 간 가변 상태를 갖지 않습니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FundError;

/// 순자산(NAV) 시계열의 원시 포인트.
///
/// `ms`는 epoch 밀리초(거래소 현지 날짜 기준), `nav`는 단위 순자산입니다.
/// 비유한(non-finite) 또는 0 이하의 nav는 수집 단계에서 제거됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub ms: i64,
    pub nav: f64,
}

/// 이력 조회 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "3y")]
    Year3,
    /// 설정 이후 전체
    #[serde(rename = "since")]
    Since,
}

impl HistoryRange {
    /// 구간 길이 (일). `Since`는 무제한이므로 `None`.
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Days30 => Some(30),
            Self::Days90 => Some(90),
            Self::Year1 => Some(365),
            Self::Year3 => Some(365 * 3),
            Self::Since => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days30 => "30d",
            Self::Days90 => "90d",
            Self::Year1 => "1y",
            Self::Year3 => "3y",
            Self::Since => "since",
        }
    }
}

impl std::str::FromStr for HistoryRange {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "30d" => Ok(Self::Days30),
            "90d" => Ok(Self::Days90),
            "1y" => Ok(Self::Year1),
            "3y" => Ok(Self::Year3),
            "since" => Ok(Self::Since),
            other => Err(FundError::InvalidParams(format!(
                "unknown range: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분석 지평. 대응하는 이력 구간으로 변환됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisHorizon {
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "3y")]
    Year3,
    #[serde(rename = "since")]
    Since,
}

impl AnalysisHorizon {
    pub fn to_range(self) -> HistoryRange {
        match self {
            Self::Year1 => HistoryRange::Year1,
            Self::Year3 => HistoryRange::Year3,
            Self::Since => HistoryRange::Since,
        }
    }
}

impl std::str::FromStr for AnalysisHorizon {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "3y" => Ok(Self::Year3),
            "since" => Ok(Self::Since),
            // 원 계약과 동일하게 기본 지평은 1년
            _ => Ok(Self::Year1),
        }
    }
}

/// 펀드 시세.
///
/// 공식 NAV(순자산 이력과 동일 소스)와 베스트에포트 장중 추정치를
/// 함께 담습니다. 추정치 부재는 시세 실패가 아닙니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundQuote {
    pub fund_code: String,
    /// 최신 공식 NAV (소수점 4자리)
    pub nav: f64,
    /// NAV 기준일 (거래소 현지 날짜)
    pub nav_date: NaiveDate,
    /// 전일 대비 변동 (소수점 4자리)
    pub change: f64,
    /// 전일 대비 변동률 (퍼센트 포인트, 소수점 2자리)
    pub change_percent: f64,
    pub updated_at: DateTime<Utc>,
    /// 기여한 업스트림 피드 식별자
    pub source: String,
    /// 장중 추정 NAV (보조 피드, 실패 시 생략)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_nav: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_change_percent: Option<f64>,
}

/// NAV 이력의 파생 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavHistoryPoint {
    pub date: NaiveDate,
    /// NAV (소수점 4자리)
    pub nav: f64,
    /// 직전 포인트 대비 수익률 (첫 포인트는 0)
    pub return_pct: f64,
    /// 조회 구간 첫 포인트 대비 누적 수익률
    pub cumulative_pct: f64,
}

/// 구간 NAV 이력.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavHistory {
    pub fund_code: String,
    pub range: HistoryRange,
    pub points: Vec<NavHistoryPoint>,
}

/// 펀드 기본 정보.
///
/// F10 프로필 페이지의 보강(enrichment)은 베스트에포트이며,
/// 실패 시 해당 필드는 생략됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundBasicInfo {
    pub fund_code: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub fund_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// 업종 비중.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryWeight {
    pub name: String,
    pub pct: f64,
}

/// 업종 구성 (분기 공시).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundIndustryConfig {
    pub fund_code: String,
    pub as_of_date: Option<NaiveDate>,
    /// 비중 내림차순
    pub industries: Vec<IndustryWeight>,
    pub source: String,
}

/// 분기별 자산 배분.
///
/// `date`는 업스트림 카테고리 라벨을 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocationQuarter {
    pub date: String,
    pub stock_pct: f64,
    pub bond_pct: f64,
    pub cash_pct: f64,
    /// `max(0, 100 - 주식 - 채권 - 현금)`
    pub other_pct: f64,
}

/// 자산 배분 시계열.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAssetAllocation {
    pub fund_code: String,
    pub as_of_date: String,
    pub quarters: Vec<AssetAllocationQuarter>,
    pub source: String,
}

/// 상위 보유 종목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHoldingItem {
    pub stock_code: String,
    pub stock_name: String,
    /// 순자산 대비 비중 (%)
    pub weight_pct: f64,
    /// 보유 주수 (만 주)
    pub shares_wan: f64,
    /// 보유 시가 (만 위안)
    pub market_value_wan: f64,
}

/// 분기 상위 보유 스냅샷. 식별자는 (fundCode, asOfDate) 쌍입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundTopHoldings {
    pub fund_code: String,
    pub as_of_date: Option<NaiveDate>,
    pub holdings: Vec<TopHoldingItem>,
    pub source: String,
}

/// 보유 변동 항목.
///
/// 신규 편입은 이전 비중이, 제외는 현재 비중이 알 수 없음(None)입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsChangeItem {
    pub stock_code: String,
    pub stock_name: String,
    pub prev_weight_pct: Option<f64>,
    pub curr_weight_pct: Option<f64>,
    pub delta_weight_pct: Option<f64>,
}

/// 추가/제외/변동 집합.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingsChanges {
    pub added: Vec<HoldingsChangeItem>,
    pub removed: Vec<HoldingsChangeItem>,
    pub changed: Vec<HoldingsChangeItem>,
}

/// 비교에 쓰인 분기 스냅샷 요약.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsSnapshot {
    pub as_of_date: Option<NaiveDate>,
    pub holdings: Vec<TopHoldingItem>,
}

/// 상위 보유 분기 대비 비교 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHoldingsComparison {
    pub fund_code: String,
    pub current: HoldingsSnapshot,
    pub previous: HoldingsSnapshot,
    pub changes: HoldingsChanges,
    pub source: String,
}

/// 누적 수익률 비교 시리즈의 한 포인트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotalPoint {
    pub date: NaiveDate,
    pub value_pct: f64,
}

/// 이름 붙은 비교 시리즈 (본 펀드 / 동류 평균 / 기준 지수).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrandTotalSeries {
    pub name: String,
    pub points: Vec<GrandTotalPoint>,
}

/// 동류 평균/기준 지수 대비 누적 수익률.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundGrandTotal {
    pub fund_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub series: Vec<GrandTotalSeries>,
    pub source: String,
}

/// 동류 펀드 내 순위.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarRanking {
    pub fund_code: String,
    pub as_of_date: Option<NaiveDate>,
    pub rank: Option<i64>,
    pub total: Option<i64>,
    pub percentile: Option<f64>,
    pub source: String,
}

/// 분석 지표.
///
/// 정의되지 않는 통계(샤프 비율, 회복 일수)는 0으로 대체하지 않고
/// 명시적으로 null(None)로 보고합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub nav: f64,
    pub nav_change_pct: f64,
    pub year_return_pct: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown_pct: f64,
    pub volatility_pct: f64,
    pub max_drawdown_recovery_days: Option<i64>,
    pub similar_rank: Option<i64>,
    pub similar_total: Option<i64>,
    pub similar_percentile: Option<f64>,
}

/// 분석 시계열 묶음.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSeries {
    pub dates: Vec<NaiveDate>,
    pub fund_cumulative_pct: Vec<f64>,
    pub benchmark_cumulative_pct: Vec<f64>,
    pub drawdown_pct: Vec<f64>,
    pub monthly_return_pct: Vec<f64>,
}

/// NAV 파생 분석 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub fund_code: String,
    pub metrics: AnalysisMetrics,
    pub series: AnalysisSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_range_parse() {
        assert_eq!("30d".parse::<HistoryRange>().unwrap(), HistoryRange::Days30);
        assert_eq!("1Y".parse::<HistoryRange>().unwrap(), HistoryRange::Year1);
        assert_eq!(
            "since".parse::<HistoryRange>().unwrap(),
            HistoryRange::Since
        );
        assert!("7d".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn test_history_range_days() {
        assert_eq!(HistoryRange::Days90.days(), Some(90));
        assert_eq!(HistoryRange::Since.days(), None);
    }

    #[test]
    fn test_horizon_defaults_to_one_year() {
        assert_eq!(
            "weird".parse::<AnalysisHorizon>().unwrap(),
            AnalysisHorizon::Year1
        );
        assert_eq!(
            AnalysisHorizon::Year3.to_range(),
            HistoryRange::Year3
        );
    }

    #[test]
    fn test_quote_serializes_camel_case_and_omits_estimate() {
        let quote = FundQuote {
            fund_code: "161725".to_string(),
            nav: 1.2345,
            nav_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            change: 0.0123,
            change_percent: 1.01,
            updated_at: Utc::now(),
            source: "eastmoney:pingzhongdata".to_string(),
            estimated_nav: None,
            estimated_change_percent: None,
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["fundCode"], "161725");
        assert_eq!(json["navDate"], "2024-05-31");
        assert!(json.get("estimatedNav").is_none());
    }

    #[test]
    fn test_metrics_preserve_null_statistics() {
        let metrics = AnalysisMetrics {
            nav: 1.0,
            nav_change_pct: 0.0,
            year_return_pct: 0.0,
            sharpe_ratio: None,
            max_drawdown_pct: 0.0,
            volatility_pct: 0.0,
            max_drawdown_recovery_days: None,
            similar_rank: None,
            similar_total: None,
            similar_percentile: None,
        };

        let json = serde_json::to_value(&metrics).unwrap();
        // 정의되지 않은 통계는 생략이 아니라 null로 노출
        assert!(json["sharpeRatio"].is_null());
        assert!(json["maxDrawdownRecoveryDays"].is_null());
    }
}
