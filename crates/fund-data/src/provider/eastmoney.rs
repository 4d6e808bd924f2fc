//! Eastmoney 데이터 제공자.
//!
//! 네 가지 업스트림 표면을 소비합니다:
//!
//! - `pingzhongdata/<code>.js`: NAV 시계열, 순위, 자산 배분, 누적 비교
//! - `fundgz/<code>.js`: 장중 추정치 (JSONP, 베스트에포트)
//! - `jbgk_<code>.html`: F10 기본 정보 정의 테이블
//! - `FundArchivesDatas.aspx`: 분기 보유 종목 아카이브
//!
//! 모든 조회는 주입된 [`FundCache`]를 거치며 같은 키의 동시 요청은
//! 하나의 업스트림 호출로 병합됩니다. 원시 JS 페이로드는 파싱 결과와
//! 별도 키로 캐시되어 순위/배분/비교 조회가 재다운로드 없이
//! 같은 파일을 재사용합니다.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use fund_core::config::{CacheTtlConfig, FundConfig, UpstreamConfig};
use fund_core::dates::{ms_to_civil_date, civil_day_end_ms, normalize_date_text, quarter_end_for_month};
use fund_core::numeric::{parse_numeric_text, round2, round4};
use fund_core::types::{
    AssetAllocationQuarter, FundAssetAllocation, FundBasicInfo, FundGrandTotal,
    FundIndustryConfig, FundQuote, FundTopHoldings, GrandTotalPoint, GrandTotalSeries,
    HistoryRange, IndustryWeight, NavHistory, NavHistoryPoint, NavPoint, SimilarRanking,
};
use fund_core::{FundError, FundResult};

use crate::cache::{CachePolicy, FundCache};
use crate::extract::html as html_extract;
use crate::extract::{jsonp, literal};
use crate::fetch::FetchClient;
use crate::provider::FundMarketData;

const SOURCE_PINGZHONG: &str = "eastmoney:pingzhongdata";
const SOURCE_PINGZHONG_FUNDGZ: &str = "eastmoney:pingzhongdata+fundgz";
const SOURCE_HYPZ: &str = "eastmoney:f10:HYPZ";
const SOURCE_JJCC: &str = "eastmoney:f10:FundArchivesDatas:jjcc";
const SOURCE_ASSET_ALLOCATION: &str = "eastmoney:pingzhongdata:Data_assetAllocation";
const SOURCE_GRAND_TOTAL: &str = "eastmoney:pingzhongdata:Data_grandTotal";

/// 추정치 피드의 JSONP 콜백 이름
const ESTIMATE_CALLBACK: &str = "jsonpgz";
/// F10 계열 엔드포인트는 브라우저 UA와 Referer를 요구
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// pingzhongdata JS에서 파싱한 NAV 시계열.
///
/// 비유한 또는 0 이하 nav, 변환 불가능한 타임스탬프는 수집 단계에서
/// 제거되고 포인트는 시간 오름차순으로 정렬됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingZhongData {
    pub fund_code: String,
    pub name: String,
    pub points: Vec<NavPoint>,
}

/// Eastmoney 조회 클라이언트. `Clone`은 캐시와 HTTP 클라이언트를 공유합니다.
#[derive(Clone)]
pub struct EastmoneyClient {
    fetch: FetchClient,
    cache: FundCache,
    upstream: Arc<UpstreamConfig>,
    ttl: Arc<CacheTtlConfig>,
}

impl EastmoneyClient {
    pub fn new(config: &FundConfig) -> FundResult<Self> {
        Self::with_cache(config, FundCache::new())
    }

    /// 외부에서 만든 캐시를 주입해 생성합니다.
    pub fn with_cache(config: &FundConfig, cache: FundCache) -> FundResult<Self> {
        Ok(Self {
            fetch: FetchClient::new(&config.upstream.user_agent, config.upstream.fetch_timeout())?,
            cache,
            upstream: Arc::new(config.upstream.clone()),
            ttl: Arc::new(config.cache.clone()),
        })
    }

    pub fn cache(&self) -> &FundCache {
        &self.cache
    }

    /// 최신 공식 NAV와 장중 추정치를 조회합니다.
    pub async fn fund_quote(&self, fund_code: &str) -> FundResult<FundQuote> {
        self.fund_quote_with(fund_code, CachePolicy::UseCached).await
    }

    /// 캐시 정책을 지정해 시세를 조회합니다. 수동 새로고침용입니다.
    pub async fn fund_quote_with(
        &self,
        fund_code: &str,
        policy: CachePolicy,
    ) -> FundResult<FundQuote> {
        let code = normalize_code(fund_code)?;
        let key = format!("quote:{}", code);
        let this = self.clone();
        self.cache
            .remember(&key, self.ttl.quote(), policy, move || async move {
                this.build_quote(&code).await
            })
            .await
    }

    /// 여러 펀드의 시세를 동시 조회합니다.
    ///
    /// 개별 실패가 전체를 실패시키지 않고 코드별 결과로 반환됩니다.
    pub async fn fund_quotes_batch(
        &self,
        fund_codes: &[String],
    ) -> Vec<(String, FundResult<FundQuote>)> {
        let tasks = fund_codes.iter().map(|fund_code| {
            let this = self.clone();
            let code = fund_code.clone();
            async move {
                let result = this.fund_quote(&code).await;
                (code, result)
            }
        });
        futures::future::join_all(tasks).await
    }

    pub async fn nav_history(
        &self,
        fund_code: &str,
        range: HistoryRange,
        end_date: Option<NaiveDate>,
    ) -> FundResult<NavHistory> {
        let code = normalize_code(fund_code)?;
        let end_label = end_date.map(|d| d.to_string()).unwrap_or_default();
        let key = format!("navHistory:{}:{}:{}", code, range, end_label);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.nav_history(),
                CachePolicy::UseCached,
                move || async move { this.build_nav_history(&code, range, end_date).await },
            )
            .await
    }

    pub async fn basic_info(&self, fund_code: &str) -> FundResult<FundBasicInfo> {
        let code = normalize_code(fund_code)?;
        let key = format!("basic:{}", code);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.disclosure(),
                CachePolicy::UseCached,
                move || async move { this.build_basic_info(&code).await },
            )
            .await
    }

    pub async fn industry_config(&self, fund_code: &str) -> FundResult<FundIndustryConfig> {
        let code = normalize_code(fund_code)?;
        let key = format!("industryConfig:{}", code);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.disclosure(),
                CachePolicy::UseCached,
                move || async move { this.build_industry_config(&code).await },
            )
            .await
    }

    pub async fn asset_allocation(&self, fund_code: &str) -> FundResult<FundAssetAllocation> {
        let code = normalize_code(fund_code)?;
        let key = format!("assetAllocation:{}", code);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.asset_allocation(),
                CachePolicy::UseCached,
                move || async move { this.build_asset_allocation(&code).await },
            )
            .await
    }

    pub async fn top_holdings(
        &self,
        fund_code: &str,
        topline: usize,
        year: Option<i32>,
        month: Option<u32>,
    ) -> FundResult<FundTopHoldings> {
        let code = normalize_code(fund_code)?;
        let year_label = year.map(|y| y.to_string()).unwrap_or_default();
        let month_label = month.map(|m| m.to_string()).unwrap_or_default();
        let key = format!(
            "topHoldings:{}:{}:{}:{}",
            code, topline, year_label, month_label
        );
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.disclosure(),
                CachePolicy::UseCached,
                move || async move { this.build_top_holdings(&code, topline, year, month).await },
            )
            .await
    }

    pub async fn similar_ranking(&self, fund_code: &str) -> FundResult<SimilarRanking> {
        let code = normalize_code(fund_code)?;
        let key = format!("similarRanking:{}", code);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.similar_ranking(),
                CachePolicy::UseCached,
                move || async move { this.build_similar_ranking(&code).await },
            )
            .await
    }

    pub async fn grand_total(&self, fund_code: &str) -> FundResult<FundGrandTotal> {
        let code = normalize_code(fund_code)?;
        let key = format!("grandTotal:{}", code);
        let this = self.clone();
        self.cache
            .remember(
                &key,
                self.ttl.grand_total(),
                CachePolicy::UseCached,
                move || async move { this.build_grand_total(&code).await },
            )
            .await
    }

    /// 원시 pingzhongdata JS 페이로드. 파생 조회들이 공유합니다.
    async fn ping_zhong_raw(&self, code: &str) -> FundResult<String> {
        let key = format!("pingzhongRaw:{}", code);
        let this = self.clone();
        let owned = code.to_string();
        self.cache
            .remember(
                &key,
                self.ttl.raw_payload(),
                CachePolicy::UseCached,
                move || async move {
                    let url = format!(
                        "{}/{}.js?v={}",
                        this.upstream.pingzhong_base,
                        owned,
                        now_ms()
                    );
                    this.fetch.fetch_text(&url).await
                },
            )
            .await
    }

    async fn ping_zhong(&self, code: &str) -> FundResult<PingZhongData> {
        let key = format!("pingzhong:{}", code);
        let this = self.clone();
        let owned = code.to_string();
        self.cache
            .remember(
                &key,
                self.ttl.raw_payload(),
                CachePolicy::UseCached,
                move || async move {
                    let raw = this.ping_zhong_raw(&owned).await?;
                    parse_ping_zhong(&owned, &raw)
                },
            )
            .await
    }

    async fn build_quote(&self, code: &str) -> FundResult<FundQuote> {
        // 공식 NAV는 이력 시계열과 같은 소스를 사용해 표시 불일치를 피함
        let pz = self.ping_zhong(code).await?;
        let last = pz
            .points
            .last()
            .ok_or_else(|| FundError::UpstreamFormat("missing net worth points".to_string()))?;
        let prev = pz.points.len().checked_sub(2).map(|i| pz.points[i]);

        let nav = last.nav;
        let nav_date = ms_to_civil_date(last.ms).ok_or_else(|| {
            FundError::UpstreamFormat(format!("invalid nav timestamp: {}", last.ms))
        })?;

        let prev_nav = prev.map(|p| p.nav).unwrap_or(0.0);
        let (change, change_percent) = if prev_nav > 0.0 {
            (nav - prev_nav, nav / prev_nav * 100.0 - 100.0)
        } else {
            (0.0, 0.0)
        };

        let mut quote = FundQuote {
            fund_code: code.to_string(),
            nav: round4(nav),
            nav_date,
            change: round4(change),
            change_percent: round2(change_percent),
            updated_at: Utc::now(),
            source: SOURCE_PINGZHONG.to_string(),
            estimated_nav: None,
            estimated_change_percent: None,
        };

        // 추정치는 보조 피드: 실패해도 공식 NAV 표시에 영향 없음
        match self.fetch_estimate(code).await {
            Ok(Some((estimated_nav, estimated_change))) => {
                quote.estimated_nav = Some(round4(estimated_nav));
                quote.estimated_change_percent = Some(round2(estimated_change));
                quote.source = SOURCE_PINGZHONG_FUNDGZ.to_string();
            }
            Ok(None) => {}
            Err(e) => {
                debug!(fund_code = %code, error = %e, "Intraday estimate unavailable");
            }
        }

        Ok(quote)
    }

    async fn fetch_estimate(&self, code: &str) -> FundResult<Option<(f64, f64)>> {
        let url = format!("{}/{}.js?rt={}", self.upstream.fundgz_base, code, now_ms());
        let raw = self
            .fetch
            .fetch_text_with(&url, self.upstream.estimate_timeout(), &[])
            .await?;
        let payload: Value = jsonp::parse_json(&raw, ESTIMATE_CALLBACK)?;

        let estimated_nav = payload
            .get("gsz")
            .and_then(value_number)
            .filter(|nav| *nav > 0.0);
        Ok(estimated_nav.map(|nav| {
            let change = payload.get("gszzl").and_then(value_number).unwrap_or(0.0);
            (nav, change)
        }))
    }

    async fn build_nav_history(
        &self,
        code: &str,
        range: HistoryRange,
        end_date: Option<NaiveDate>,
    ) -> FundResult<NavHistory> {
        let pz = self.ping_zhong(code).await?;
        let last = pz
            .points
            .last()
            .ok_or_else(|| FundError::UpstreamFormat("no net worth points".to_string()))?;

        // endDate는 거래소 현지 기준 하루 끝까지 포함
        let end_ms = end_date.map(civil_day_end_ms).unwrap_or(last.ms);
        let min_ms = range
            .days()
            .map(|days| end_ms - days * 24 * 60 * 60 * 1000)
            .unwrap_or(i64::MIN);

        let sliced: Vec<NavPoint> = pz
            .points
            .iter()
            .filter(|p| p.ms <= end_ms && p.ms >= min_ms)
            .copied()
            .collect();
        if sliced.is_empty() {
            return Err(FundError::InsufficientData("no points in range".to_string()));
        }

        let start_nav = sliced[0].nav;
        let mut prev_nav = start_nav;
        let mut points = Vec::with_capacity(sliced.len());

        for (idx, p) in sliced.iter().enumerate() {
            let Some(date) = ms_to_civil_date(p.ms) else {
                continue;
            };
            let return_pct = if idx == 0 || prev_nav <= 0.0 {
                0.0
            } else {
                p.nav / prev_nav * 100.0 - 100.0
            };
            let cumulative_pct = if start_nav > 0.0 {
                p.nav / start_nav * 100.0 - 100.0
            } else {
                0.0
            };
            prev_nav = p.nav;

            points.push(NavHistoryPoint {
                date,
                nav: round4(p.nav),
                return_pct: round2(return_pct),
                cumulative_pct: round2(cumulative_pct),
            });
        }

        Ok(NavHistory {
            fund_code: code.to_string(),
            range,
            points,
        })
    }

    async fn build_basic_info(&self, code: &str) -> FundResult<FundBasicInfo> {
        let pz = self.ping_zhong(code).await?;

        // F10 보강은 베스트에포트: 실패 시 pingzhongdata의 이름만 사용
        let profile = match self.f10_profile(code).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(fund_code = %code, error = %e, "F10 profile enrichment failed");
                None
            }
        };

        let mut info = FundBasicInfo {
            fund_code: pz.fund_code,
            name: pz.name,
            fund_type: None,
            inception_date: None,
            company: None,
            risk_level: None,
            tags: None,
        };

        if let Some(profile) = profile {
            info.fund_type = non_empty(profile.fund_type);
            info.inception_date = profile.inception_date;
            info.company = non_empty(profile.company);
            info.risk_level = profile.risk_level;

            let mut tags = Vec::new();
            for candidate in [profile.track_index, profile.benchmark, profile.full_name] {
                if !candidate.is_empty() && !tags.contains(&candidate) {
                    tags.push(candidate);
                }
            }
            info.tags = (!tags.is_empty()).then_some(tags);
        }

        Ok(info)
    }

    async fn f10_profile(&self, code: &str) -> FundResult<F10Profile> {
        let key = format!("f10:jbgk:{}", code);
        let this = self.clone();
        let owned = code.to_string();
        self.cache
            .remember(
                &key,
                self.ttl.disclosure(),
                CachePolicy::UseCached,
                move || async move {
                    let url = format!("{}/jbgk_{}.html", this.upstream.f10_profile_base, owned);
                    let html = this.fetch.fetch_text(&url).await?;
                    parse_f10_profile(&html)
                },
            )
            .await
    }

    async fn build_industry_config(&self, code: &str) -> FundResult<FundIndustryConfig> {
        let url = format!("{}/HYPZ/?fundCode={}&year=", self.upstream.f10_api_base, code);
        let referer = format!("{}/hytz_{}.html", self.upstream.f10_profile_base, code);
        let raw = self
            .fetch
            .fetch_text_with(
                &url,
                self.upstream.fetch_timeout(),
                &[
                    ("User-Agent", BROWSER_USER_AGENT),
                    ("Referer", referer.as_str()),
                ],
            )
            .await?;

        let envelope: IndustryEnvelope = serde_json::from_str(&raw)?;
        if let Some(err_code) = envelope.err_code {
            if err_code != 0 {
                return Err(FundError::UpstreamFormat(format!(
                    "industry config error {}: {}",
                    err_code,
                    envelope.err_msg.unwrap_or_default()
                )));
            }
        }

        let quarters = envelope
            .data
            .map(|data| data.quarter_infos)
            .unwrap_or_default();
        let latest = quarters.into_iter().find(|q| !q.rows.is_empty());

        let (as_of_date, rows) = match latest {
            Some(quarter) => {
                let as_of = quarter
                    .as_of
                    .as_deref()
                    .and_then(normalize_date_text)
                    .or_else(|| {
                        quarter
                            .rows
                            .first()
                            .and_then(|row| row.date.as_deref())
                            .and_then(normalize_date_text)
                    });
                (as_of, quarter.rows)
            }
            None => (None, Vec::new()),
        };

        let mut industries: Vec<IndustryWeight> = rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name.unwrap_or_default().trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let pct = row
                    .pct
                    .as_ref()
                    .and_then(value_number)
                    .or_else(|| row.pct_desc.as_ref().and_then(value_number))
                    .unwrap_or(0.0);
                Some(IndustryWeight { name, pct })
            })
            .collect();
        industries.sort_by(|a, b| b.pct.partial_cmp(&a.pct).unwrap_or(Ordering::Equal));

        Ok(FundIndustryConfig {
            fund_code: code.to_string(),
            as_of_date,
            industries,
            source: SOURCE_HYPZ.to_string(),
        })
    }

    async fn build_asset_allocation(&self, code: &str) -> FundResult<FundAssetAllocation> {
        let raw = self.ping_zhong_raw(code).await?;
        let literal_text = literal::extract_var_json(&raw, "Data_assetAllocation")
            .ok_or_else(|| {
                FundError::UpstreamFormat("missing Data_assetAllocation".to_string())
            })?;
        let payload: AllocationPayload = serde_json::from_str(literal_text)?;

        let categories: Vec<String> = payload
            .categories
            .iter()
            .map(value_text)
            .filter(|label| !label.is_empty())
            .collect();

        let series_data = |needle: &str| {
            payload
                .series
                .iter()
                .find(|s| s.name.contains(needle))
                .map(|s| s.data.as_slice())
        };
        let stock = series_data("股票");
        let bond = series_data("债券");
        let cash = series_data("现金");

        let quarters: Vec<AssetAllocationQuarter> = categories
            .iter()
            .enumerate()
            .map(|(idx, date)| {
                let at = |data: Option<&[Value]>| {
                    data.and_then(|d| d.get(idx))
                        .and_then(value_number)
                        .unwrap_or(0.0)
                };
                let stock_pct = at(stock);
                let bond_pct = at(bond);
                let cash_pct = at(cash);
                let other_pct = (100.0 - stock_pct - bond_pct - cash_pct).max(0.0);

                AssetAllocationQuarter {
                    date: date.clone(),
                    stock_pct: round2(stock_pct),
                    bond_pct: round2(bond_pct),
                    cash_pct: round2(cash_pct),
                    other_pct: round2(other_pct),
                }
            })
            .collect();

        let as_of_date = quarters
            .last()
            .map(|q| q.date.clone())
            .unwrap_or_default();

        Ok(FundAssetAllocation {
            fund_code: code.to_string(),
            as_of_date,
            quarters,
            source: SOURCE_ASSET_ALLOCATION.to_string(),
        })
    }

    async fn build_top_holdings(
        &self,
        code: &str,
        topline: usize,
        year: Option<i32>,
        month: Option<u32>,
    ) -> FundResult<FundTopHoldings> {
        let target = match (year, month) {
            (Some(y), Some(m)) => quarter_end_for_month(y, m),
            _ => None,
        };
        let year_param = year.map(|y| y.to_string()).unwrap_or_default();
        let month_param = month.map(|m| m.to_string()).unwrap_or_default();
        let url = format!(
            "{}?type=jjcc&code={}&topline={}&year={}&month={}&rt={}",
            self.upstream.f10_archives_base,
            code,
            topline.max(1),
            year_param,
            month_param,
            rand::random::<f64>()
        );
        let referer = format!("{}/ccmx_{}.html", self.upstream.f10_profile_base, code);
        let js_text = self
            .fetch
            .fetch_text_with(
                &url,
                self.upstream.fetch_timeout(),
                &[
                    ("User-Agent", BROWSER_USER_AGENT),
                    ("Referer", referer.as_str()),
                ],
            )
            .await?;

        let content = literal::apidata_content(&js_text).unwrap_or_default();
        let blocks = html_extract::parse_quarter_holdings(&content);

        // 지정 분기가 있으면 정확 일치를 먼저 찾고, 없으면 최신 분기
        let selected = target
            .and_then(|t| blocks.iter().find(|b| b.as_of_date == Some(t)).cloned())
            .or_else(|| blocks.iter().max_by_key(|b| b.as_of_date).cloned());

        let (as_of_date, mut holdings) = match selected {
            Some(block) => (block.as_of_date, block.holdings),
            // 공시가 없는 펀드는 빈 목록으로 반환 (오류 아님)
            None => (None, Vec::new()),
        };
        holdings.truncate(topline.max(1));

        Ok(FundTopHoldings {
            fund_code: code.to_string(),
            as_of_date,
            holdings,
            source: SOURCE_JJCC.to_string(),
        })
    }

    async fn build_similar_ranking(&self, code: &str) -> FundResult<SimilarRanking> {
        let raw = self.ping_zhong_raw(code).await?;
        let mut ranking = SimilarRanking {
            fund_code: code.to_string(),
            as_of_date: None,
            rank: None,
            total: None,
            percentile: None,
            source: SOURCE_PINGZHONG.to_string(),
        };

        // 순위 데이터는 펀드에 따라 빠져 있을 수 있어 필드별로 독립 파싱
        if let Some(rows) = literal::extract_var_json(&raw, "Data_rateInSimilarType")
            .and_then(|text| serde_json::from_str::<Vec<RankRow>>(text).ok())
        {
            if let Some(last) = rows.last() {
                ranking.as_of_date = last.x.and_then(|ms| ms_to_civil_date(ms as i64));
                ranking.rank = last.y.map(|rank| rank as i64);
                ranking.total = last
                    .sc
                    .as_ref()
                    .and_then(value_number)
                    .map(|total| total as i64);
            }
        }

        if let Some(rows) = literal::extract_var_json(&raw, "Data_rateInSimilarPersent")
            .and_then(|text| serde_json::from_str::<Vec<Vec<Value>>>(text).ok())
        {
            if let Some(last) = rows.last() {
                if ranking.as_of_date.is_none() {
                    ranking.as_of_date = last
                        .first()
                        .and_then(value_number)
                        .and_then(|ms| ms_to_civil_date(ms as i64));
                }
                ranking.percentile = last.get(1).and_then(value_number);
            }
        }

        Ok(ranking)
    }

    async fn build_grand_total(&self, code: &str) -> FundResult<FundGrandTotal> {
        let raw = self.ping_zhong_raw(code).await?;
        let literal_text = literal::extract_var_json(&raw, "Data_grandTotal")
            .ok_or_else(|| FundError::UpstreamFormat("missing Data_grandTotal".to_string()))?;
        let entries: Vec<GrandTotalEntry> = serde_json::from_str(literal_text)?;

        let series: Vec<GrandTotalSeries> = entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.name.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let points: Vec<GrandTotalPoint> = entry
                    .data
                    .iter()
                    .filter_map(|row| {
                        let ms = row.first().and_then(value_number)? as i64;
                        let date = ms_to_civil_date(ms)?;
                        let value = row.get(1).and_then(value_number).unwrap_or(0.0);
                        Some(GrandTotalPoint {
                            date,
                            value_pct: round2(value),
                        })
                    })
                    .collect();
                (!points.is_empty()).then_some(GrandTotalSeries { name, points })
            })
            .collect();

        let first = series.first().map(|s| s.points.as_slice()).unwrap_or(&[]);
        Ok(FundGrandTotal {
            fund_code: code.to_string(),
            start_date: first.first().map(|p| p.date),
            end_date: first.last().map(|p| p.date),
            series,
            source: SOURCE_GRAND_TOTAL.to_string(),
        })
    }
}

#[async_trait]
impl FundMarketData for EastmoneyClient {
    async fn fund_quote(&self, fund_code: &str) -> FundResult<FundQuote> {
        EastmoneyClient::fund_quote(self, fund_code).await
    }

    async fn nav_history(
        &self,
        fund_code: &str,
        range: HistoryRange,
        end_date: Option<NaiveDate>,
    ) -> FundResult<NavHistory> {
        EastmoneyClient::nav_history(self, fund_code, range, end_date).await
    }

    async fn basic_info(&self, fund_code: &str) -> FundResult<FundBasicInfo> {
        EastmoneyClient::basic_info(self, fund_code).await
    }

    async fn industry_config(&self, fund_code: &str) -> FundResult<FundIndustryConfig> {
        EastmoneyClient::industry_config(self, fund_code).await
    }

    async fn asset_allocation(&self, fund_code: &str) -> FundResult<FundAssetAllocation> {
        EastmoneyClient::asset_allocation(self, fund_code).await
    }

    async fn top_holdings(
        &self,
        fund_code: &str,
        topline: usize,
        year: Option<i32>,
        month: Option<u32>,
    ) -> FundResult<FundTopHoldings> {
        EastmoneyClient::top_holdings(self, fund_code, topline, year, month).await
    }

    async fn similar_ranking(&self, fund_code: &str) -> FundResult<SimilarRanking> {
        EastmoneyClient::similar_ranking(self, fund_code).await
    }

    async fn grand_total(&self, fund_code: &str) -> FundResult<FundGrandTotal> {
        EastmoneyClient::grand_total(self, fund_code).await
    }
}

/// F10 기본 정보 프로필 (캐시 단위).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct F10Profile {
    short_name: String,
    full_name: String,
    fund_type: String,
    company: String,
    inception_date: Option<NaiveDate>,
    benchmark: String,
    track_index: String,
    risk_level: Option<String>,
}

// F10 정의 테이블의 업스트림 라벨
const LABEL_SHORT_NAME: &str = "基金简称";
const LABEL_FULL_NAME: &str = "基金全称";
const LABEL_FUND_TYPE: &str = "基金类型";
const LABEL_COMPANY: &str = "基金管理人";
const LABEL_INCEPTION: &str = "成立日期";
const LABEL_BENCHMARK: &str = "业绩比较基准";
const LABEL_TRACK_INDEX: &str = "跟踪标的";

fn parse_f10_profile(html: &str) -> FundResult<F10Profile> {
    let map = html_extract::definition_table(html);
    if map.is_empty() {
        return Err(FundError::UpstreamFormat(
            "missing F10 basic table".to_string(),
        ));
    }

    let field = |label: &str| {
        html_extract::definition_field(&map, label)
            .unwrap_or("")
            .to_string()
    };

    let fund_type = field(LABEL_FUND_TYPE);
    // "成立日期/规模" 같은 합성 라벨에서 날짜만 추출
    let inception_date = html_extract::definition_field(&map, LABEL_INCEPTION)
        .and_then(normalize_date_text);

    Ok(F10Profile {
        short_name: field(LABEL_SHORT_NAME),
        full_name: field(LABEL_FULL_NAME),
        company: field(LABEL_COMPANY),
        benchmark: field(LABEL_BENCHMARK),
        track_index: field(LABEL_TRACK_INDEX),
        risk_level: infer_risk_level(&fund_type),
        inception_date,
        fund_type,
    })
}

/// 펀드 유형 문자열에서 위험 등급을 추론합니다.
fn infer_risk_level(fund_type: &str) -> Option<String> {
    let level = if fund_type.is_empty() {
        return None;
    } else if fund_type.contains("货币") {
        "低"
    } else if fund_type.contains("债券") && !fund_type.contains("股票") {
        "中"
    } else if fund_type.contains("混合") {
        "中高"
    } else if fund_type.contains("QDII") {
        "高"
    } else if fund_type.contains("股票") || fund_type.contains("指数") {
        "高"
    } else {
        return None;
    };
    Some(level.to_string())
}

fn parse_ping_zhong(code: &str, raw: &str) -> FundResult<PingZhongData> {
    let name =
        literal::extract_var_string(raw, "fS_name").unwrap_or_else(|| code.to_string());
    let fund_code =
        literal::extract_var_string(raw, "fS_code").unwrap_or_else(|| code.to_string());

    let trend = literal::extract_var_json(raw, "Data_netWorthTrend")
        .ok_or_else(|| FundError::UpstreamFormat("missing Data_netWorthTrend".to_string()))?;
    let rows: Vec<TrendRow> = serde_json::from_str(trend)?;

    let mut points: Vec<NavPoint> = rows
        .into_iter()
        .filter_map(|row| {
            let ms = row.x?;
            let nav = row.y?;
            if !ms.is_finite() || !nav.is_finite() || nav <= 0.0 {
                return None;
            }
            let ms = ms as i64;
            ms_to_civil_date(ms)?;
            Some(NavPoint { ms, nav })
        })
        .collect();
    points.sort_by_key(|p| p.ms);

    debug!(fund_code = %fund_code, points = points.len(), "Parsed net worth trend");
    Ok(PingZhongData {
        fund_code,
        name,
        points,
    })
}

fn normalize_code(fund_code: &str) -> FundResult<String> {
    let code = fund_code.trim();
    if code.is_empty() {
        return Err(FundError::InvalidParams("fundCode is required".to_string()));
    }
    Ok(code.to_string())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// 숫자 또는 숫자 문자열("1.05", "93.08%")을 f64로 해석합니다.
fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Deserialize)]
struct TrendRow {
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RankRow {
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    sc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IndustryEnvelope {
    #[serde(rename = "ErrCode", default)]
    err_code: Option<i64>,
    #[serde(rename = "ErrMsg", default)]
    err_msg: Option<String>,
    #[serde(rename = "Data", default)]
    data: Option<IndustryData>,
}

#[derive(Debug, Default, Deserialize)]
struct IndustryData {
    #[serde(rename = "QuarterInfos", default)]
    quarter_infos: Vec<QuarterInfo>,
}

#[derive(Debug, Deserialize)]
struct QuarterInfo {
    #[serde(rename = "JZRQ", default)]
    as_of: Option<String>,
    #[serde(rename = "HYPZInfo", default)]
    rows: Vec<IndustryRow>,
}

#[derive(Debug, Deserialize)]
struct IndustryRow {
    #[serde(rename = "HYMC", default)]
    name: Option<String>,
    #[serde(rename = "ZJZBL", default)]
    pct: Option<Value>,
    #[serde(rename = "ZJZBLDesc", default)]
    pct_desc: Option<Value>,
    #[serde(rename = "FSRQ", default)]
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AllocationPayload {
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    series: Vec<AllocationSeries>,
}

#[derive(Debug, Deserialize)]
struct AllocationSeries {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GrandTotalEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}
