use crate::domain::{StockRecord, StrategyDescriptor};
use crate::services::CacheStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub is_loading: bool,
    pub cached_strategies: Vec<usize>,
    pub last_updated: Option<String>,
    pub cache_size: usize,
}

impl From<CacheStatus> for StatusResponse {
    fn from(status: CacheStatus) -> Self {
        Self {
            is_loading: status.is_loading,
            cached_strategies: status.cached_thresholds,
            last_updated: status.last_updated.map(|t| t.to_rfc3339()),
            cache_size: status.cache_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub min_strategies: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommonStocksRequest {
    pub strategies: Vec<String>,
}

/// Envelope shared by every stock-listing endpoint.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<StockRecord>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
}

impl SearchResponse {
    pub fn found(message: String, data: Vec<StockRecord>, from_cache: bool) -> Self {
        Self {
            success: true,
            message,
            total: data.len(),
            data,
            from_cache: Some(from_cache),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Vec::new(),
            total: 0,
            from_cache: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<StrategyDescriptor>,
}
