//! NAV 시계열 지표.
//!
//! 모든 지표는 구간 NAV 이력 포인트에서 계산됩니다. 정의되지 않는
//! 통계는 0으로 대체하지 않습니다: 수익률 표준편차가 0이면 샤프 비율은
//! `None`, 최대 드로다운이 구간 내에 회복되지 않으면 회복 일수도
//! `None`입니다.

use fund_core::numeric::round2;
use fund_core::types::NavHistoryPoint;

/// 연환산 계수 (거래일 기준).
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// 드로다운 곡선과 최대 드로다운.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownCurve {
    /// 포인트별 드로다운 (%, 항상 0 이하)
    pub drawdown_pct: Vec<f64>,
    /// 가장 깊은 드로다운 (%, 0 이하)
    pub max_drawdown_pct: f64,
}

/// 최대 드로다운 회복 소요.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// 저점에서 직전 고점 회복까지의 일수. 드로다운이 없으면 0.
    Days(i64),
    /// 구간 내 미회복 또는 판단 불가.
    Unresolved,
}

impl Recovery {
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Days(days) => Some(*days),
            Self::Unresolved => None,
        }
    }
}

/// 인접 포인트 간 일간 수익률 (소수). nav가 0 이하인 쌍은 건너뜁니다.
pub fn daily_returns(points: &[NavHistoryPoint]) -> Vec<f64> {
    points
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].nav;
            let curr = pair[1].nav;
            if prev <= 0.0 || curr <= 0.0 {
                return None;
            }
            let rate = curr / prev - 1.0;
            rate.is_finite().then_some(rate)
        })
        .collect()
}

/// 모집단 표준편차. 빈 입력은 0.
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// 러닝 피크 대비 드로다운 곡선을 계산합니다.
///
/// 피크 위치의 드로다운은 정확히 0이고 모든 값은 0 이하입니다.
pub fn drawdown_curve(points: &[NavHistoryPoint]) -> DrawdownCurve {
    let mut peak_nav = points.first().map(|p| p.nav).unwrap_or(0.0);
    let mut drawdown_pct = Vec::with_capacity(points.len());
    let mut max_drawdown_pct: f64 = 0.0;

    for point in points {
        if point.nav > peak_nav {
            peak_nav = point.nav;
        }
        let dd = if peak_nav > 0.0 {
            round2(point.nav / peak_nav * 100.0 - 100.0)
        } else {
            0.0
        };
        if dd < max_drawdown_pct {
            max_drawdown_pct = dd;
        }
        drawdown_pct.push(dd);
    }

    DrawdownCurve {
        drawdown_pct,
        max_drawdown_pct: round2(max_drawdown_pct),
    }
}

/// 최대 드로다운의 저점에서 직전 고점을 회복하기까지의 일수.
///
/// 단조 비감소 시계열(드로다운 없음)은 `Days(0)`, 구간 끝까지
/// 회복하지 못하면 `Unresolved`입니다. 두 경우를 혼동하면 안 됩니다.
pub fn max_drawdown_recovery(points: &[NavHistoryPoint]) -> Recovery {
    if points.len() < 2 {
        return Recovery::Unresolved;
    }

    let mut peak_nav = points[0].nav;
    let mut max_drawdown: f64 = 0.0;
    let mut trough_idx: Option<usize> = None;
    let mut peak_at_max = peak_nav;

    for (i, point) in points.iter().enumerate() {
        if point.nav > peak_nav {
            peak_nav = point.nav;
            continue;
        }
        if peak_nav <= 0.0 {
            continue;
        }
        let dd = point.nav / peak_nav - 1.0;
        if dd < max_drawdown {
            max_drawdown = dd;
            trough_idx = Some(i);
            peak_at_max = peak_nav;
        }
    }

    let Some(trough_idx) = trough_idx else {
        return Recovery::Days(0);
    };

    for point in &points[trough_idx..] {
        if point.nav >= peak_at_max {
            let days = (point.date - points[trough_idx].date).num_days();
            return Recovery::Days(days.max(0));
        }
    }
    Recovery::Unresolved
}

/// 연환산 변동성 (%).
pub fn annualized_volatility_pct(daily_rates: &[f64]) -> f64 {
    round2(stddev(daily_rates) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// 연환산 샤프 비율 (무위험 수익률 0 가정). 표준편차가 0이면 `None`.
pub fn sharpe_ratio(daily_rates: &[f64]) -> Option<f64> {
    let sd = stddev(daily_rates);
    if sd == 0.0 {
        return None;
    }
    let mean = daily_rates.iter().sum::<f64>() / daily_rates.len() as f64;
    Some(round2(mean / sd * TRADING_DAYS_PER_YEAR.sqrt()))
}

/// 일간 수익률(%)을 12개 버킷으로 접어 월별 수익률을 만듭니다.
///
/// 나머지 일수는 앞 버킷부터 하루씩 더 배분합니다. 버킷 합이 목표
/// 누적치와 일치하도록 잔차를 마지막 버킷에 반영합니다. 목표 누적치가
/// 권위 값입니다.
pub fn monthly_returns(daily_return_pct: &[f64], target_total_pct: f64) -> Vec<f64> {
    const MONTHS: usize = 12;

    let base = daily_return_pct.len() / MONTHS;
    let remainder = daily_return_pct.len() % MONTHS;

    let mut monthly = Vec::with_capacity(MONTHS);
    let mut idx = 0;
    for m in 0..MONTHS {
        let len = if m < remainder { base + 1 } else { base };
        let bucket: f64 = daily_return_pct[idx..idx + len].iter().sum();
        monthly.push(round2(bucket));
        idx += len;
    }

    let total: f64 = monthly.iter().sum();
    let diff = round2(target_total_pct - total);
    if let Some(last) = monthly.last_mut() {
        *last = round2(*last + diff);
    }
    monthly
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn points_from_navs(navs: &[f64]) -> Vec<NavHistoryPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        navs.iter()
            .enumerate()
            .map(|(i, &nav)| NavHistoryPoint {
                date: start + chrono::Duration::days(i as i64),
                nav,
                return_pct: 0.0,
                cumulative_pct: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_drawdown_curve_basic() {
        let points = points_from_navs(&[1.0, 1.1, 0.99, 1.05, 1.2]);
        let curve = drawdown_curve(&points);

        assert_eq!(curve.drawdown_pct[0], 0.0);
        assert_eq!(curve.drawdown_pct[1], 0.0);
        // 0.99/1.1 = -10%
        assert_eq!(curve.drawdown_pct[2], -10.0);
        assert_eq!(curve.max_drawdown_pct, -10.0);
        // 새 고점에서 다시 0
        assert_eq!(curve.drawdown_pct[4], 0.0);
    }

    #[test]
    fn test_recovery_days_counted_from_trough() {
        // 고점 1.1 (1일차), 저점 0.99 (2일차), 회복 1.2 (4일차): 2일
        let points = points_from_navs(&[1.0, 1.1, 0.99, 1.05, 1.2]);
        assert_eq!(max_drawdown_recovery(&points), Recovery::Days(2));
    }

    #[test]
    fn test_recovery_monotonic_is_zero_days() {
        let points = points_from_navs(&[1.0, 1.0, 1.1, 1.2]);
        assert_eq!(max_drawdown_recovery(&points), Recovery::Days(0));
        assert_eq!(max_drawdown_recovery(&points).days(), Some(0));
    }

    #[test]
    fn test_recovery_unresolved_is_not_zero() {
        // 구간 끝까지 회복 실패: 0일과 구분되는 미회복
        let points = points_from_navs(&[1.0, 1.2, 0.9, 0.95]);
        assert_eq!(max_drawdown_recovery(&points), Recovery::Unresolved);
        assert_eq!(max_drawdown_recovery(&points).days(), None);

        let short = points_from_navs(&[1.0]);
        assert_eq!(max_drawdown_recovery(&short), Recovery::Unresolved);
    }

    #[test]
    fn test_sharpe_none_when_flat() {
        // 동일 수익률 반복: sd == 0, 샤프는 0이 아니라 None
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01]), None);
        assert_eq!(sharpe_ratio(&[]), None);

        let sharpe = sharpe_ratio(&[0.01, -0.02, 0.015]).unwrap();
        assert!(sharpe.is_finite());
    }

    #[test]
    fn test_volatility_annualization() {
        let rates = [0.01, -0.01, 0.01, -0.01];
        let expected = round2(stddev(&rates) * 252f64.sqrt() * 100.0);
        assert_eq!(annualized_volatility_pct(&rates), expected);
        assert_eq!(annualized_volatility_pct(&[]), 0.0);
    }

    #[test]
    fn test_daily_returns_skip_invalid_navs() {
        let points = points_from_navs(&[1.0, 1.1, 0.0, 1.2]);
        let rates = daily_returns(&points);
        // 0 nav가 낀 두 쌍은 제외
        assert_eq!(rates.len(), 1);
        assert!((rates[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_monthly_returns_remainder_distribution() {
        // 26일 = 2일 버킷 2개 + 2일... 26 = 12*2 + 2: 앞 2개 버킷이 3일
        let daily: Vec<f64> = vec![1.0; 26];
        let monthly = monthly_returns(&daily, 26.0);

        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[0], 3.0);
        assert_eq!(monthly[1], 3.0);
        assert_eq!(monthly[2], 2.0);
        let total: f64 = monthly.iter().sum();
        assert!((total - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_returns_short_series() {
        // 12일 미만이어도 항상 12개 버킷
        let monthly = monthly_returns(&[0.5, -0.3, 0.1], 0.3);
        assert_eq!(monthly.len(), 12);
        let total: f64 = monthly.iter().sum();
        assert!((total - 0.3).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_drawdown_never_positive(navs in prop::collection::vec(0.01f64..100.0, 1..120)) {
            let points = points_from_navs(&navs);
            let curve = drawdown_curve(&points);

            let mut peak = navs[0];
            for (i, &nav) in navs.iter().enumerate() {
                prop_assert!(curve.drawdown_pct[i] <= 0.0);
                if nav >= peak {
                    peak = nav;
                    // 러닝 피크에서는 정확히 0
                    prop_assert_eq!(curve.drawdown_pct[i], 0.0);
                }
            }
            prop_assert!(curve.max_drawdown_pct <= 0.0);
        }

        #[test]
        fn prop_monthly_sum_matches_target(
            daily in prop::collection::vec(-5.0f64..5.0, 0..400),
            target in -100.0f64..100.0,
        ) {
            let monthly = monthly_returns(&daily, target);
            prop_assert_eq!(monthly.len(), 12);

            // 버킷 합은 저장 정밀도(2자리) 이내에서 목표 누적치와 일치
            let total: f64 = monthly.iter().sum();
            prop_assert!((total - target).abs() <= 0.005 + 1e-9);
        }

        #[test]
        fn prop_recovery_days_non_negative(navs in prop::collection::vec(0.01f64..100.0, 2..120)) {
            let points = points_from_navs(&navs);
            if let Recovery::Days(days) = max_drawdown_recovery(&points) {
                prop_assert!(days >= 0);
            }
        }
    }
}
