//! HTTP request handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::domain::execution::run_backtest;

use super::{AppState, WebError};

pub async fn create_strategy(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, WebError> {
    let mut uploaded: Option<(String, Vec<u8>)> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| WebError::bad_request("file field requires a filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| WebError::bad_request(e.to_string()))?;
            uploaded = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) =
        uploaded.ok_or_else(|| WebError::bad_request("missing 'file' field"))?;
    state.strategies.create(&filename, &bytes)?;
    Ok(Json(json!({ "message": "Strategy created successfully" })))
}

pub async fn get_strategies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, WebError> {
    let strategies = state.strategies.list()?;
    Ok(Json(json!({ "strategies": strategies })))
}

pub async fn delete_strategy(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, WebError> {
    state.strategies.delete(&name)?;
    Ok(Json(json!({ "message": "Strategy deleted successfully" })))
}

pub async fn create_backtest(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, WebError> {
    let mut name: Option<String> = None;
    let mut amount: Option<f64> = None;
    let mut strategy_name: Option<String> = None;
    let mut series: Option<Vec<u8>> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("name") => name = Some(text_field(field).await?),
            Some("amount") => {
                let raw = text_field(field).await?;
                let parsed: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| WebError::bad_request(format!("invalid amount '{raw}'")))?;
                amount = Some(parsed);
            }
            Some("strategy_name") => strategy_name = Some(text_field(field).await?),
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| WebError::bad_request("file field requires a filename"))?;
                if !filename.ends_with(".csv") {
                    return Err(WebError::bad_request("CSV file required"));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::bad_request(e.to_string()))?;
                series = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| WebError::bad_request("missing 'name' field"))?;
    let amount = amount.ok_or_else(|| WebError::bad_request("missing 'amount' field"))?;
    let strategy_name =
        strategy_name.ok_or_else(|| WebError::bad_request("missing 'strategy_name' field"))?;
    let series = series.ok_or_else(|| WebError::bad_request("missing 'file' field"))?;

    run_backtest(
        &series,
        &strategy_name,
        amount,
        &name,
        state.strategies.as_ref(),
        state.results.as_ref(),
    )?;

    Ok(Json(json!({ "message": "Backtest created successfully" })))
}

pub async fn get_all(State(state): State<Arc<AppState>>) -> Result<Json<Value>, WebError> {
    let backtests = state.results.list_names()?;
    Ok(Json(json!({ "backtests": backtests })))
}

pub async fn get_backtest(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, WebError> {
    let record = state.results.get(&name)?;
    Ok(Json(json!({
        "predictions": record.predictions,
        "results": record.results,
        "end_result": record.end_result,
    })))
}

pub async fn delete_backtest(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, WebError> {
    state.results.delete(&name)?;
    Ok(Json(json!({ "message": "Deleted successfully" })))
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, WebError> {
    multipart
        .next_field()
        .await
        .map_err(|e| WebError::bad_request(e.to_string()))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, WebError> {
    field
        .text()
        .await
        .map_err(|e| WebError::bad_request(e.to_string()))
}
