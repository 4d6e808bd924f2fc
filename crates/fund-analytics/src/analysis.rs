//! 분석 결과 조립.
//!
//! 구간 NAV 이력과 동류 순위를 묶어 [`AnalysisResult`]를 만듭니다.
//! 이력은 필수 입력이고 순위는 보강 입력입니다: 순위 조회 실패는
//! 해당 지표를 null로 두고 분석 자체는 성공합니다.

use tracing::warn;

use fund_core::numeric::round2;
use fund_core::types::{
    AnalysisHorizon, AnalysisMetrics, AnalysisResult, AnalysisSeries, SimilarRanking,
};
use fund_core::{FundError, FundResult};
use fund_data::FundMarketData;

use crate::metrics;

/// 벤치마크 곡선 스케일 (펀드 누적 수익률 대비).
const BENCHMARK_SCALE: f64 = 0.8;

/// NAV 이력에서 분석 지표와 시계열을 계산합니다.
///
/// 포인트가 2개 미만이면 [`FundError::InsufficientData`]입니다.
pub async fn build_analysis<C: FundMarketData>(
    client: &C,
    fund_code: &str,
    horizon: AnalysisHorizon,
) -> FundResult<AnalysisResult> {
    let range = horizon.to_range();
    let (history, ranking) = tokio::join!(
        client.nav_history(fund_code, range, None),
        client.similar_ranking(fund_code),
    );

    let history = history?;
    let ranking = match ranking {
        Ok(ranking) => Some(ranking),
        Err(e) => {
            warn!(fund_code = %fund_code, error = %e, "Similar ranking unavailable for analysis");
            None
        }
    };

    let points = &history.points;
    if points.len() < 2 {
        return Err(FundError::InsufficientData(
            "not enough nav history points".to_string(),
        ));
    }

    let last = points[points.len() - 1];
    let last_cumulative = last.cumulative_pct;

    let daily_rates = metrics::daily_returns(points);
    let curve = metrics::drawdown_curve(points);
    let recovery = metrics::max_drawdown_recovery(points);

    let fund_cumulative_pct: Vec<f64> = points.iter().map(|p| p.cumulative_pct).collect();
    let benchmark_cumulative_pct: Vec<f64> = fund_cumulative_pct
        .iter()
        .map(|v| round2(v * BENCHMARK_SCALE))
        .collect();
    let daily_return_pct: Vec<f64> = daily_rates.iter().map(|r| round2(r * 100.0)).collect();
    let monthly_return_pct = metrics::monthly_returns(&daily_return_pct, last_cumulative);

    let (similar_rank, similar_total, similar_percentile) = match ranking {
        Some(SimilarRanking {
            rank,
            total,
            percentile,
            ..
        }) => (rank, total, percentile),
        None => (None, None, None),
    };

    Ok(AnalysisResult {
        fund_code: history.fund_code.clone(),
        metrics: AnalysisMetrics {
            nav: last.nav,
            nav_change_pct: last.return_pct,
            year_return_pct: last_cumulative,
            sharpe_ratio: metrics::sharpe_ratio(&daily_rates),
            max_drawdown_pct: curve.max_drawdown_pct,
            volatility_pct: metrics::annualized_volatility_pct(&daily_rates),
            max_drawdown_recovery_days: recovery.days(),
            similar_rank,
            similar_total,
            similar_percentile,
        },
        series: AnalysisSeries {
            dates: points.iter().map(|p| p.date).collect(),
            fund_cumulative_pct,
            benchmark_cumulative_pct,
            drawdown_pct: curve.drawdown_pct,
            monthly_return_pct,
        },
    })
}
