use super::models::{
    CommonStocksRequest, MessageResponse, RefreshResponse, SearchRequest, SearchResponse,
    StatusResponse, StrategiesResponse,
};
use super::AppState;
use crate::error::StockError;
use actix_web::{get, post, web, HttpResponse, Responder};
use tracing::{error, info};

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "API is running".to_string(),
    })
}

#[get("/status")]
async fn status(state: web::Data<AppState>) -> impl Responder {
    let status = state.cache.status().await;
    HttpResponse::Ok().json(StatusResponse::from(status))
}

#[get("/strategies")]
async fn strategies(state: web::Data<AppState>) -> impl Responder {
    let strategies = state.cache.aggregator().registry().iter().cloned().collect();
    HttpResponse::Ok().json(StrategiesResponse { strategies })
}

#[post("/refresh-cache")]
async fn refresh_cache(state: web::Data<AppState>) -> impl Responder {
    let response = if state.refresh.trigger() {
        info!("Manual cache refresh triggered");
        RefreshResponse {
            success: true,
            message: "Cache refresh triggered successfully".to_string(),
        }
    } else {
        RefreshResponse {
            success: false,
            message: "Cache refresh already in progress".to_string(),
        }
    };
    HttpResponse::Ok().json(response)
}

#[post("/search")]
async fn search(state: web::Data<AppState>, body: web::Json<SearchRequest>) -> impl Responder {
    let min_strategies = body.min_strategies;
    if min_strategies < 2 {
        return HttpResponse::Ok().json(SearchResponse::failure(
            "Minimum strategies must be at least 2",
        ));
    }
    let threshold = usize::try_from(min_strategies).unwrap_or(usize::MAX);

    let response = match state.cache.get(threshold).await {
        Ok(result) if result.records.is_empty() => SearchResponse::found(
            format!("No stocks found in {}+ strategies", threshold),
            result.records,
            result.from_cache,
        ),
        Ok(result) => {
            let suffix = if result.from_cache { " (cached)" } else { "" };
            SearchResponse::found(
                format!(
                    "Found {} stocks in {}+ strategies{}",
                    result.records.len(),
                    threshold,
                    suffix
                ),
                result.records,
                result.from_cache,
            )
        }
        Err(StockError::InvalidArgument(message)) => SearchResponse::failure(message),
        Err(e) => {
            error!("Search for {}+ strategies failed: {}", threshold, e);
            SearchResponse::failure(format!("Error: {}", e))
        }
    };

    HttpResponse::Ok().json(response)
}

#[post("/common-stocks")]
async fn common_stocks(
    state: web::Data<AppState>,
    body: web::Json<CommonStocksRequest>,
) -> impl Responder {
    if body.strategies.is_empty() {
        return HttpResponse::Ok().json(SearchResponse::failure(
            "At least one strategy must be selected",
        ));
    }

    let records = state
        .cache
        .aggregator()
        .intersect_strategies(&body.strategies)
        .await;
    let message = format!(
        "Found {} common stocks in {}",
        records.len(),
        body.strategies.join(", ")
    );

    HttpResponse::Ok().json(SearchResponse::found(message, records, false))
}
