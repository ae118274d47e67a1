//! Result store port trait.

use crate::domain::error::TradebenchError;
use crate::domain::record::BacktestRecord;

/// Durable key-value mapping from run name to its persisted triple.
///
/// `create` must be atomic with respect to the uniqueness check-and-insert:
/// two concurrent creates with the same name must not both succeed. The
/// SQLite adapter satisfies this through its primary-key constraint rather
/// than application-level locking.
pub trait ResultStore {
    /// Fails with `AlreadyExists` if `name` is already a key. Either the
    /// full record is stored or nothing is.
    fn create(&self, name: &str, record: &BacktestRecord) -> Result<(), TradebenchError>;

    /// Fails with `NotFound` if absent.
    fn get(&self, name: &str) -> Result<BacktestRecord, TradebenchError>;

    /// All current keys; order unspecified.
    fn list_names(&self) -> Result<Vec<String>, TradebenchError>;

    /// Fails with `NotFound` if absent; otherwise removes the key
    /// irrevocably.
    fn delete(&self, name: &str) -> Result<(), TradebenchError>;
}
