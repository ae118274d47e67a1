#![allow(dead_code)]

use tempfile::TempDir;
use tradebench::adapters::py_strategy_adapter::PyStrategyAdapter;
use tradebench::adapters::sqlite_result_adapter::SqliteResultAdapter;

pub const HEADERED_SERIES: &str = "Time,Open,High,Low,Close,Volume\n\
    2024-01-15 10:00,100.0,110.0,90.0,105.0,50000\n\
    2024-01-15 10:15,105.0,115.0,100.0,110.0,60000\n\
    2024-01-15 10:30,110.0,120.0,105.0,115.0,55000\n";

pub const BUYHOLD_SOURCE: &str = "def strategy(series, amount):\n    return [], [], amount\n";

pub const FAILING_SOURCE: &str =
    "def strategy(series, amount):\n    raise ValueError('boom')\n";

/// Temp-backed stores; keep the returned TempDir alive for the test's
/// duration.
pub fn test_stores() -> (TempDir, PyStrategyAdapter, SqliteResultAdapter) {
    let dir = TempDir::new().unwrap();
    let strategies = PyStrategyAdapter::new(dir.path().to_path_buf());
    let results = SqliteResultAdapter::in_memory().unwrap();
    results.initialize_schema().unwrap();
    (dir, strategies, results)
}

pub const MULTIPART_BOUNDARY: &str = "tradebench-test-boundary";

/// Hand-rolled multipart/form-data body for handler tests.
pub struct MultipartBody {
    body: String,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self { body: String::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
             {value}\r\n"
        ));
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content: &str) -> Self {
        self.body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n"
        ));
        self
    }

    pub fn build(mut self) -> String {
        self.body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));
        self.body
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
    }
}
