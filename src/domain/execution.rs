//! Backtest execution engine.
//!
//! Binds an ingested series to a loaded strategy and persists the outcome.
//! Every step is a hard precondition that fails fast; no partial state is
//! left behind on any failure path.

use crate::domain::error::TradebenchError;
use crate::domain::ingest;
use crate::ports::result_port::ResultStore;
use crate::ports::strategy_port::StrategyStore;

/// Run one backtest: ingest `raw`, load `strategy_name`, invoke its entry
/// point with `initial_amount`, store the triple under `result_name`.
///
/// Propagates `Format` from ingestion, `NotFound`/`ContractViolation` from
/// loading, `StrategyExecution` from the strategy's own code, and
/// `AlreadyExists` when `result_name` is taken. The invocation is
/// synchronous and in-process; faults are never retried.
pub fn run_backtest(
    raw: &[u8],
    strategy_name: &str,
    initial_amount: f64,
    result_name: &str,
    strategies: &dyn StrategyStore,
    results: &dyn ResultStore,
) -> Result<(), TradebenchError> {
    let series = ingest::ingest(raw)?;
    let handle = strategies.load(strategy_name)?;

    tracing::info!(
        strategy = strategy_name,
        result = result_name,
        bars = series.len(),
        initial_amount,
        "running backtest"
    );

    let record = handle.evaluate(&series, initial_amount)?;
    results.create(result_name, &record)?;
    Ok(())
}
