//! Core domain types and logic.

pub mod bar;
pub mod error;
pub mod execution;
pub mod ingest;
pub mod record;
