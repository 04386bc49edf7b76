//! Cache abstractions for provider responses

use crate::core::outcome::{DataSet, FetchOutcome};
use async_trait::async_trait;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider call a cached value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListFunds,
    NavHistory,
    TopHoldings,
    IndustryHoldings,
    AssetHoldings,
    IndexHistory,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListFunds => "list_funds",
            Operation::NavHistory => "nav_history",
            Operation::TopHoldings => "top_holdings",
            Operation::IndustryHoldings => "industry_holdings",
            Operation::AssetHoldings => "asset_holdings",
            Operation::IndexHistory => "index_history",
        }
    }
}

/// `(operation, arguments)`; rendered as `operation:arg1:arg2` for prefix matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: Operation,
    pub args: Vec<String>,
}

impl CacheKey {
    pub fn new<I, S>(operation: Operation, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the rendered key starts with `prefix`, without rendering it.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let segments = std::iter::once(self.operation.as_str())
            .chain(self.args.iter().map(String::as_str));
        let mut rest = prefix;
        for (i, segment) in segments.enumerate() {
            if i > 0 {
                match rest.strip_prefix(':') {
                    Some(after) => rest = after,
                    None => return rest.is_empty(),
                }
            }
            if rest.len() <= segment.len() {
                return segment.starts_with(rest);
            }
            match rest.strip_prefix(segment) {
                Some(after) => rest = after,
                None => return false,
            }
        }
        rest.is_empty()
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operation.as_str())?;
        for arg in &self.args {
            write!(f, ":{arg}")?;
        }
        Ok(())
    }
}

pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Key-value store behind the response cache.
///
/// Entries remember when they were fetched; freshness is decided by the TTL
/// the reader passes in, so one store serves data kinds with different
/// update cadences.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value if it was stored less than `ttl` ago.
    async fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CachedValue>;
    async fn put(&self, key: CacheKey, value: CachedValue);
    /// Removes every entry whose rendered key starts with `prefix`, returning how many.
    async fn invalidate(&self, prefix: &str) -> usize;
    async fn clear(&self);
    async fn len(&self) -> usize;
}

/// Returns the cached value for `key`, or runs `fetcher` and caches what it returns.
///
/// A failing fetcher leaves the store untouched and yields
/// [`FetchOutcome::Failed`]; an empty but successful result is cached like
/// any other.
pub async fn get_or_fetch<T, F, Fut>(
    store: &dyn CacheStore,
    key: CacheKey,
    ttl: Duration,
    fetcher: F,
) -> FetchOutcome<T>
where
    T: DataSet + Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if let Some(cached) = store.get(&key, ttl).await {
        match cached.downcast::<T>() {
            Ok(value) => return FetchOutcome::from_result(Ok(T::clone(&value))),
            Err(_) => debug!("Cached value for {} has an unexpected type, refetching", key),
        }
    }

    match fetcher().await {
        Ok(value) => {
            store.put(key, Arc::new(value.clone())).await;
            FetchOutcome::from_result(Ok(value))
        }
        Err(e) => {
            warn!(key = %key, "Fetch failed, not caching: {e:#}");
            FetchOutcome::Failed(format!("{e:#}"))
        }
    }
}
