//! TTL 캐시와 동시 요청 병합(dedupe).
//!
//! 키별 만료 시각을 가진 인메모리 캐시입니다. 전역 상태가 아니라
//! 명시적으로 생성해 클라이언트에 주입하며, `Clone`은 같은 저장소를
//! 공유합니다. 같은 키의 동시 계산은 하나의 업스트림 호출로 병합되고,
//! 성공이든 실패든 모든 대기자가 같은 결과를 받습니다.
//!
//! 시간은 `tokio::time::Instant`를 사용하므로 테스트에서 가상 시계로
//! 만료를 구동할 수 있습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use fund_core::{FundError, FundResult};

/// 캐시 조회 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// 만료 전 엔트리가 있으면 사용
    UseCached,
    /// 캐시 조회를 건너뛰고 새로 계산 (진행 중 요청과는 병합됨)
    Refresh,
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

type FlightFuture = Shared<BoxFuture<'static, Result<Value, FundError>>>;

struct CacheInner {
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, FlightFuture>>,
}

/// 주입 가능한 TTL 캐시. `Clone`은 내부 저장소를 공유합니다.
#[derive(Clone)]
pub struct FundCache {
    inner: Arc<CacheInner>,
}

impl Default for FundCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FundCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// 만료되지 않은 엔트리를 조회합니다. 만료된 엔트리는 이때 제거됩니다.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.inner.entries.lock().await;
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                serde_json::from_value(entry.value.clone()).ok()
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// 값을 통째로 교체 저장합니다. 부분 갱신은 없습니다.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping cache store for unserializable value");
                return;
            }
        };

        let mut entries = self.inner.entries.lock().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: json,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub async fn remove(&self, key: &str) {
        self.inner.entries.lock().await.remove(key);
    }

    /// 같은 키의 동시 계산을 하나로 병합합니다.
    ///
    /// 계산은 별도 태스크에서 실행되므로 한 대기자가 취소되어도 나머지
    /// 대기자는 결과를 받습니다. 계산이 끝나면 (성공/실패 무관) 진행 중
    /// 표식이 제거되어 이후 호출은 새 계산을 시작합니다.
    pub async fn with_dedupe<T, F, Fut>(&self, key: &str, compute: F) -> FundResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = FundResult<T>> + Send + 'static,
    {
        let flight = {
            let mut in_flight = self.inner.in_flight.lock().await;
            if let Some(existing) = in_flight.get(key) {
                debug!(key = %key, "Joining in-flight computation");
                existing.clone()
            } else {
                let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
                let owned_key = key.to_string();
                let fut = compute();

                let handle = tokio::spawn(async move {
                    let result = match fut.await {
                        Ok(value) => serde_json::to_value(&value)
                            .map_err(|e| FundError::Cache(e.to_string())),
                        Err(e) => Err(e),
                    };
                    if let Some(inner) = weak.upgrade() {
                        inner.in_flight.lock().await.remove(&owned_key);
                    }
                    result
                });

                let shared: FlightFuture = handle
                    .map(|joined| match joined {
                        Ok(result) => result,
                        Err(e) => {
                            Err(FundError::Internal(format!("in-flight task failed: {}", e)))
                        }
                    })
                    .boxed()
                    .shared();

                in_flight.insert(key.to_string(), shared.clone());
                shared
            }
        };

        let value = flight.await?;
        serde_json::from_value(value).map_err(|e| FundError::Cache(e.to_string()))
    }

    /// 캐시 조회 → 병합 계산 → 저장을 한 번에 수행합니다.
    ///
    /// [`CachePolicy::Refresh`]는 캐시 조회만 건너뛰며, 진행 중 요청과의
    /// 병합과 결과 저장은 그대로 수행됩니다.
    pub async fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        policy: CachePolicy,
        compute: F,
    ) -> FundResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = FundResult<T>> + Send + 'static,
    {
        if policy == CachePolicy::UseCached {
            if let Some(hit) = self.get::<T>(key).await {
                debug!(key = %key, "Cache hit");
                return Ok(hit);
            }
        }

        let value = self.with_dedupe(key, compute).await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }
}
