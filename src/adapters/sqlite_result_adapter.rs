//! SQLite result store adapter.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde_json::Value;

use crate::domain::error::TradebenchError;
use crate::domain::record::BacktestRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_port::ResultStore;

#[derive(Debug)]
pub struct SqliteResultAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteResultAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebenchError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| TradebenchError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("database", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TradebenchError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TradebenchError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TradebenchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Create-if-absent schema, run once at startup. Name uniqueness is the
    /// primary key; `create` relies on it for its atomicity guarantee.
    pub fn initialize_schema(&self) -> Result<(), TradebenchError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS backtests (
                name TEXT PRIMARY KEY,
                predictions TEXT NOT NULL,
                results TEXT NOT NULL,
                end_result TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| TradebenchError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, TradebenchError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TradebenchError::Database {
                reason: e.to_string(),
            })
    }
}

fn serialize_column(value: &Value) -> Result<String, TradebenchError> {
    serde_json::to_string(value).map_err(|e| TradebenchError::DatabaseQuery {
        reason: e.to_string(),
    })
}

fn deserialize_column(text: &str) -> Result<Value, TradebenchError> {
    serde_json::from_str(text).map_err(|e| TradebenchError::DatabaseQuery {
        reason: format!("stored value is not valid JSON: {e}"),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl ResultStore for SqliteResultAdapter {
    fn create(&self, name: &str, record: &BacktestRecord) -> Result<(), TradebenchError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO backtests (name, predictions, results, end_result)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                serialize_column(&record.predictions)?,
                serialize_column(&record.results)?,
                serialize_column(&record.end_result)?
            ],
        )
        .map_err(|e: rusqlite::Error| {
            if is_unique_violation(&e) {
                TradebenchError::AlreadyExists {
                    entity: "backtest",
                    name: name.to_string(),
                }
            } else {
                TradebenchError::DatabaseQuery {
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(())
    }

    fn get(&self, name: &str) -> Result<BacktestRecord, TradebenchError> {
        let conn = self.connection()?;
        let row: Result<(String, String, String), rusqlite::Error> = conn.query_row(
            "SELECT predictions, results, end_result FROM backtests WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        );

        match row {
            Ok((predictions, results, end_result)) => Ok(BacktestRecord {
                predictions: deserialize_column(&predictions)?,
                results: deserialize_column(&results)?,
                end_result: deserialize_column(&end_result)?,
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(TradebenchError::NotFound {
                entity: "backtest",
                name: name.to_string(),
            }),
            Err(e) => Err(TradebenchError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }

    fn list_names(&self) -> Result<Vec<String>, TradebenchError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT name FROM backtests")
            .map_err(|e: rusqlite::Error| TradebenchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| TradebenchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut names = Vec::new();
        for row in rows {
            names.push(
                row.map_err(|e: rusqlite::Error| TradebenchError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<(), TradebenchError> {
        let conn = self.connection()?;
        let affected = conn
            .execute("DELETE FROM backtests WHERE name = ?1", params![name])
            .map_err(|e: rusqlite::Error| TradebenchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        if affected == 0 {
            return Err(TradebenchError::NotFound {
                entity: "backtest",
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
