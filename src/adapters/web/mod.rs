//! HTTP adapter.
//!
//! Exposes the seven backtest operations as a JSON API over axum. Route
//! names match the original wire surface consumed by existing clients.

mod error;
mod handlers;

pub use error::WebError;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::ports::result_port::ResultStore;
use crate::ports::strategy_port::StrategyStore;

pub struct AppState {
    pub strategies: Arc<dyn StrategyStore + Send + Sync>,
    pub results: Arc<dyn ResultStore + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/createStrategy", post(handlers::create_strategy))
        .route("/getStrategies", get(handlers::get_strategies))
        .route("/deleteStrategy/{name}", delete(handlers::delete_strategy))
        .route("/create", post(handlers::create_backtest))
        .route("/getAll", get(handlers::get_all))
        .route("/get/{name}", get(handlers::get_backtest))
        .route("/delete/{name}", delete(handlers::delete_backtest))
        .with_state(Arc::new(state))
}
