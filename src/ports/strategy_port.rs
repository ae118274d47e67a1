//! Strategy registry port traits.

use crate::domain::bar::BarSeries;
use crate::domain::error::TradebenchError;
use crate::domain::record::BacktestRecord;

/// A loaded, invocable strategy.
///
/// The one required entry point: evaluate a series with a starting amount
/// and return the `(predictions, results, end_result)` triple. The triple's
/// internal shape is opaque to the rest of the system.
pub trait StrategyHandle {
    fn evaluate(
        &self,
        series: &BarSeries,
        initial_amount: f64,
    ) -> Result<BacktestRecord, TradebenchError>;
}

/// Named store of externally supplied strategy artifacts.
pub trait StrategyStore {
    /// Store an uploaded artifact under the name its filename declares.
    /// Fails with `InvalidInput` if the artifact is not recognized as
    /// executable source, `AlreadyExists` if the name is taken.
    fn create(&self, filename: &str, source: &[u8]) -> Result<(), TradebenchError>;

    /// All currently stored strategy names, sorted.
    fn list(&self) -> Result<Vec<String>, TradebenchError>;

    /// Fails with `NotFound` if no such artifact exists.
    fn delete(&self, name: &str) -> Result<(), TradebenchError>;

    /// Load the artifact into an invocable unit. Fails with `NotFound` if
    /// absent, `ContractViolation` if the loaded unit does not expose the
    /// required entry point.
    fn load(&self, name: &str) -> Result<Box<dyn StrategyHandle>, TradebenchError>;
}
