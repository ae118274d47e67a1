//! Persisted backtest outcome.

use serde_json::Value;

/// The `(predictions, results, end_result)` triple a strategy returns,
/// persisted under a unique run name.
///
/// The three fields have no fixed shape: they are opaque JSON value trees
/// stored and retrieved without interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRecord {
    pub predictions: Value,
    pub results: Value,
    pub end_result: Value,
}
