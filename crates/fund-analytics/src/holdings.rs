//! 분기 상위 보유 비교.
//!
//! 최신 분기와 직전 분기의 상위 보유 스냅샷을 비교해 신규 편입,
//! 제외, 비중 변동 집합을 만듭니다. 비교는 두 스냅샷의 순수 함수이며
//! 스냅샷 자체는 수집 레이어에서 캐시됩니다.

use std::collections::HashMap;

use tracing::warn;

use fund_core::dates::previous_quarter;
use fund_core::numeric::round2;
use fund_core::types::{
    FundTopHoldings, HoldingsChangeItem, HoldingsChanges, HoldingsSnapshot, TopHoldingItem,
    TopHoldingsComparison,
};
use fund_core::FundResult;
use fund_data::FundMarketData;

const SOURCE_COMPARE: &str = "eastmoney:f10:FundArchivesDatas:jjcc:compare";

/// 현재/이전 보유 목록의 차이를 계산합니다.
///
/// 정렬 규칙: 신규는 현재 비중 내림차순, 제외는 이전 비중 내림차순,
/// 변동은 변동 절대값 내림차순입니다.
pub fn diff_holdings(current: &[TopHoldingItem], previous: &[TopHoldingItem]) -> HoldingsChanges {
    let prev_by_code: HashMap<&str, &TopHoldingItem> = previous
        .iter()
        .filter(|h| !h.stock_code.is_empty())
        .map(|h| (h.stock_code.as_str(), h))
        .collect();
    let curr_by_code: HashMap<&str, &TopHoldingItem> = current
        .iter()
        .filter(|h| !h.stock_code.is_empty())
        .map(|h| (h.stock_code.as_str(), h))
        .collect();

    let mut changes = HoldingsChanges::default();

    for curr in current {
        if curr.stock_code.is_empty() {
            continue;
        }
        match prev_by_code.get(curr.stock_code.as_str()) {
            None => changes.added.push(HoldingsChangeItem {
                stock_code: curr.stock_code.clone(),
                stock_name: curr.stock_name.clone(),
                prev_weight_pct: None,
                curr_weight_pct: Some(round2(curr.weight_pct)),
                delta_weight_pct: None,
            }),
            Some(prev) => {
                let prev_weight = round2(prev.weight_pct);
                let curr_weight = round2(curr.weight_pct);
                changes.changed.push(HoldingsChangeItem {
                    stock_code: curr.stock_code.clone(),
                    stock_name: if curr.stock_name.is_empty() {
                        prev.stock_name.clone()
                    } else {
                        curr.stock_name.clone()
                    },
                    prev_weight_pct: Some(prev_weight),
                    curr_weight_pct: Some(curr_weight),
                    delta_weight_pct: Some(round2(curr_weight - prev_weight)),
                });
            }
        }
    }

    for prev in previous {
        if prev.stock_code.is_empty() || curr_by_code.contains_key(prev.stock_code.as_str()) {
            continue;
        }
        changes.removed.push(HoldingsChangeItem {
            stock_code: prev.stock_code.clone(),
            stock_name: prev.stock_name.clone(),
            prev_weight_pct: Some(round2(prev.weight_pct)),
            curr_weight_pct: None,
            delta_weight_pct: None,
        });
    }

    let weight_desc = |value: fn(&HoldingsChangeItem) -> Option<f64>| {
        move |a: &HoldingsChangeItem, b: &HoldingsChangeItem| {
            value(b)
                .unwrap_or(0.0)
                .partial_cmp(&value(a).unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    };
    changes.added.sort_by(weight_desc(|item| item.curr_weight_pct));
    changes
        .removed
        .sort_by(weight_desc(|item| item.prev_weight_pct));
    changes.changed.sort_by(|a, b| {
        let delta_a = a.delta_weight_pct.unwrap_or(0.0).abs();
        let delta_b = b.delta_weight_pct.unwrap_or(0.0).abs();
        delta_b
            .partial_cmp(&delta_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    changes
}

/// 최신 분기와 직전 회계 분기의 상위 보유를 비교합니다.
///
/// 직전 분기 공시가 없거나 조회에 실패하면 빈 스냅샷과 비교하므로
/// 모든 현재 종목이 신규로 보고됩니다.
pub async fn compare_top_holdings<C: FundMarketData>(
    client: &C,
    fund_code: &str,
    topline: usize,
) -> FundResult<TopHoldingsComparison> {
    let current = client.top_holdings(fund_code, topline, None, None).await?;

    let previous = match current.as_of_date.map(previous_quarter) {
        Some((year, month)) => {
            match client
                .top_holdings(fund_code, topline, Some(year), Some(month))
                .await
            {
                Ok(previous) => previous,
                Err(e) => {
                    warn!(fund_code = %fund_code, error = %e, "Previous quarter holdings unavailable");
                    empty_snapshot(&current)
                }
            }
        }
        None => empty_snapshot(&current),
    };

    let changes = diff_holdings(&current.holdings, &previous.holdings);

    Ok(TopHoldingsComparison {
        fund_code: current.fund_code.clone(),
        current: HoldingsSnapshot {
            as_of_date: current.as_of_date,
            holdings: current.holdings,
        },
        previous: HoldingsSnapshot {
            as_of_date: previous.as_of_date,
            holdings: previous.holdings,
        },
        changes,
        source: SOURCE_COMPARE.to_string(),
    })
}

fn empty_snapshot(current: &FundTopHoldings) -> FundTopHoldings {
    FundTopHoldings {
        fund_code: current.fund_code.clone(),
        as_of_date: None,
        holdings: Vec::new(),
        source: current.source.clone(),
    }
}
