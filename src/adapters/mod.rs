//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod py_strategy_adapter;
pub mod sqlite_result_adapter;
#[cfg(feature = "web")]
pub mod web;
