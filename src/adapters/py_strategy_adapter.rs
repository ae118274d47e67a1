//! Python strategy registry adapter.
//!
//! Strategies are user-uploaded `.py` files kept one-per-name under a
//! configured directory. Loading executes the artifact's module-level code
//! in the embedded interpreter and binds its `strategy` function; there is
//! no sandbox, no resource limit and no timeout. Uploaded artifacts are
//! trusted fully.

use std::fs;
use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyList, PyTuple};
use serde_json::Value;

use crate::domain::bar::BarSeries;
use crate::domain::error::TradebenchError;
use crate::domain::record::BacktestRecord;
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::{StrategyHandle, StrategyStore};

const ARTIFACT_EXTENSION: &str = "py";
const ENTRY_POINT: &str = "strategy";

#[derive(Debug)]
pub struct PyStrategyAdapter {
    dir: PathBuf,
}

impl PyStrategyAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Reads `[strategies] dir` and creates the directory if absent.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebenchError> {
        let dir =
            config
                .get_string("strategies", "dir")
                .ok_or_else(|| TradebenchError::ConfigMissing {
                    section: "strategies".into(),
                    key: "dir".into(),
                })?;

        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }
}

/// The declared filename must be `<name>.py` with a stem that cannot escape
/// the artifact directory. Only the final `.py` is stripped, so `a.py.py`
/// names the strategy `a.py`.
pub fn strategy_name_from_filename(filename: &str) -> Result<&str, TradebenchError> {
    let name = filename.strip_suffix(".py").ok_or_else(|| {
        TradebenchError::InvalidInput {
            reason: "Python file required".into(),
        }
    })?;

    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(TradebenchError::InvalidInput {
            reason: format!("invalid strategy name '{name}'"),
        });
    }
    Ok(name)
}

impl StrategyStore for PyStrategyAdapter {
    fn create(&self, filename: &str, source: &[u8]) -> Result<(), TradebenchError> {
        let name = strategy_name_from_filename(filename)?;
        let path = self.artifact_path(name);

        if path.exists() {
            return Err(TradebenchError::AlreadyExists {
                entity: "strategy",
                name: name.to_string(),
            });
        }

        fs::write(&path, source)?;
        tracing::info!(strategy = name, "strategy created");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, TradebenchError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
                && let Some(stem) = path.file_stem()
            {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<(), TradebenchError> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Err(TradebenchError::NotFound {
                entity: "strategy",
                name: name.to_string(),
            });
        }
        fs::remove_file(&path)?;
        tracing::info!(strategy = name, "strategy deleted");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Box<dyn StrategyHandle>, TradebenchError> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Err(TradebenchError::NotFound {
                entity: "strategy",
                name: name.to_string(),
            });
        }

        let source = fs::read_to_string(&path)?;

        let entry_point = Python::with_gil(|py| -> Result<Py<PyAny>, TradebenchError> {
            // Module-level code runs here, as a side effect of making the
            // entry point available.
            let module =
                PyModule::from_code_bound(py, &source, &format!("{name}.py"), name).map_err(
                    |e| TradebenchError::StrategyExecution {
                        reason: format!("error loading strategy '{name}': {e}"),
                    },
                )?;

            let entry_point = module.getattr(ENTRY_POINT).map_err(|_| {
                TradebenchError::ContractViolation {
                    reason: format!("strategy module must define '{ENTRY_POINT}' function"),
                }
            })?;

            if !entry_point.is_callable() {
                return Err(TradebenchError::ContractViolation {
                    reason: format!("'{ENTRY_POINT}' attribute is not callable"),
                });
            }

            Ok(entry_point.unbind())
        })?;

        Ok(Box::new(PyStrategyHandle { entry_point }))
    }
}

/// A bound `strategy` function held across GIL acquisitions.
struct PyStrategyHandle {
    entry_point: Py<PyAny>,
}

impl StrategyHandle for PyStrategyHandle {
    fn evaluate(
        &self,
        series: &BarSeries,
        initial_amount: f64,
    ) -> Result<BacktestRecord, TradebenchError> {
        Python::with_gil(|py| {
            let rows = series_to_py(py, series).map_err(execution_error)?;

            let output = self
                .entry_point
                .bind(py)
                .call1((rows, initial_amount))
                .map_err(execution_error)?;

            let (predictions, results, end_result) = unpack_triple(&output)?;
            Ok(BacktestRecord {
                predictions: py_to_json(&predictions)?,
                results: py_to_json(&results)?,
                end_result: py_to_json(&end_result)?,
            })
        })
    }
}

fn execution_error(err: PyErr) -> TradebenchError {
    TradebenchError::StrategyExecution {
        reason: err.to_string(),
    }
}

/// The series crosses the boundary as a list of per-bar dicts; `Time` is a
/// real `datetime.datetime` via pyo3's chrono conversion.
fn series_to_py<'py>(py: Python<'py>, series: &BarSeries) -> PyResult<Bound<'py, PyList>> {
    let rows = PyList::empty_bound(py);
    for bar in series.bars() {
        let row = PyDict::new_bound(py);
        row.set_item("Time", bar.time)?;
        row.set_item("Open", bar.open)?;
        row.set_item("High", bar.high)?;
        row.set_item("Low", bar.low)?;
        row.set_item("Close", bar.close)?;
        row.set_item("Volume", bar.volume)?;
        rows.append(row)?;
    }
    Ok(rows)
}

/// The contract requires a `(predictions, results, end_result)` triple; any
/// other return shape is an execution fault of the strategy, not a load
/// failure.
fn unpack_triple<'py>(
    output: &Bound<'py, PyAny>,
) -> Result<(Bound<'py, PyAny>, Bound<'py, PyAny>, Bound<'py, PyAny>), TradebenchError> {
    let items: Vec<Bound<'py, PyAny>> = if let Ok(tuple) = output.downcast::<PyTuple>() {
        tuple.iter().collect()
    } else if let Ok(list) = output.downcast::<PyList>() {
        list.iter().collect()
    } else {
        Vec::new()
    };

    match <[Bound<'py, PyAny>; 3]>::try_from(items) {
        Ok([predictions, results, end_result]) => Ok((predictions, results, end_result)),
        Err(_) => Err(TradebenchError::StrategyExecution {
            reason: "strategy must return a (predictions, results, end_result) triple".into(),
        }),
    }
}

/// Convert a strategy's return value into an opaque JSON tree. Anything
/// outside the JSON data model is an execution fault.
fn py_to_json(value: &Bound<'_, PyAny>) -> Result<Value, TradebenchError> {
    if value.is_none() {
        return Ok(Value::Null);
    }
    if let Ok(b) = value.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    // int before float: a Python float does not extract as i64, but an int
    // would happily extract as f64.
    if let Ok(i) = value.extract::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(f) = value.extract::<f64>() {
        // NaN and infinities have no JSON representation.
        return Ok(serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null));
    }
    if let Ok(s) = value.extract::<String>() {
        return Ok(Value::String(s));
    }
    if let Ok(list) = value.downcast::<PyList>() {
        let items: Result<Vec<Value>, TradebenchError> =
            list.iter().map(|item| py_to_json(&item)).collect();
        return Ok(Value::Array(items?));
    }
    if let Ok(tuple) = value.downcast::<PyTuple>() {
        let items: Result<Vec<Value>, TradebenchError> =
            tuple.iter().map(|item| py_to_json(&item)).collect();
        return Ok(Value::Array(items?));
    }
    if let Ok(dict) = value.downcast::<PyDict>() {
        let mut map = serde_json::Map::new();
        for (key, item) in dict.iter() {
            let key: String = key.extract().map_err(|_| TradebenchError::StrategyExecution {
                reason: "strategy returned a dict with non-string keys".into(),
            })?;
            map.insert(key, py_to_json(&item)?);
        }
        return Ok(Value::Object(map));
    }

    Err(TradebenchError::StrategyExecution {
        reason: format!(
            "strategy returned a value that is not JSON-serializable: {}",
            value.get_type()
        ),
    })
}
