//! End-to-end pipeline tests against real adapters: temp-dir strategy
//! artifacts, in-memory SQLite, embedded Python.

mod common;

use common::*;
use serde_json::json;
use tradebench::domain::error::TradebenchError;
use tradebench::domain::execution::run_backtest;
use tradebench::ports::result_port::ResultStore;
use tradebench::ports::strategy_port::StrategyStore;

#[test]
fn upload_run_and_read_back() {
    let (_dir, strategies, results) = test_stores();

    strategies
        .create("buyhold.py", BUYHOLD_SOURCE.as_bytes())
        .unwrap();
    assert_eq!(strategies.list().unwrap(), vec!["buyhold"]);

    run_backtest(
        HEADERED_SERIES.as_bytes(),
        "buyhold",
        1000.0,
        "t1",
        &strategies,
        &results,
    )
    .unwrap();

    assert_eq!(results.list_names().unwrap(), vec!["t1"]);
    let record = results.get("t1").unwrap();
    assert_eq!(record.predictions, json!([]));
    assert_eq!(record.results, json!([]));
    assert_eq!(record.end_result, json!(1000.0));
}

#[test]
fn every_supported_encoding_runs_the_same_backtest() {
    let (_dir, strategies, results) = test_stores();

    // Sums closes so the stored result reflects the ingested values.
    let source = "def strategy(series, amount):\n\
                  \x20   return [], [], sum(bar['Close'] for bar in series)\n";
    strategies.create("sumclose.py", source.as_bytes()).unwrap();

    let headerless_comma = "2024-01-15 10:00,100.0,110.0,90.0,105.0,50000\n\
        2024-01-15 10:15,105.0,115.0,100.0,110.0,60000\n\
        2024-01-15 10:30,110.0,120.0,105.0,115.0,55000\n";
    let headerless_tab = headerless_comma.replace(',', "\t");
    // The whitespace encoding cannot hold a "date time" stamp, so its
    // rendition carries the same prices under date-only times.
    let headerless_whitespace = "2024-01-15  100.0 110.0 90.0 105.0 50000\n\
        2024-01-16  105.0 115.0 100.0 110.0 60000\n\
        2024-01-17  110.0 120.0 105.0 115.0 55000\n";

    let encodings: [(&str, &str); 4] = [
        ("headered", HEADERED_SERIES),
        ("comma", headerless_comma),
        ("tab", &headerless_tab),
        ("whitespace", headerless_whitespace),
    ];

    for (label, raw) in encodings {
        run_backtest(raw.as_bytes(), "sumclose", 0.0, label, &strategies, &results).unwrap();
        let record = results.get(label).unwrap();
        assert_eq!(record.end_result, json!(330.0), "{label}");
    }
}

#[test]
fn failed_run_persists_nothing() {
    let (_dir, strategies, results) = test_stores();
    strategies
        .create("boom.py", FAILING_SOURCE.as_bytes())
        .unwrap();

    let err = run_backtest(
        HEADERED_SERIES.as_bytes(),
        "boom",
        1000.0,
        "t1",
        &strategies,
        &results,
    )
    .unwrap_err();

    assert!(matches!(err, TradebenchError::StrategyExecution { .. }));
    assert!(results.list_names().unwrap().is_empty());
}

#[test]
fn strategy_lifecycle_create_delete_recreate() {
    let (_dir, strategies, _results) = test_stores();

    strategies
        .create("buyhold.py", BUYHOLD_SOURCE.as_bytes())
        .unwrap();
    assert!(matches!(
        strategies.create("buyhold.py", BUYHOLD_SOURCE.as_bytes()),
        Err(TradebenchError::AlreadyExists { .. })
    ));

    strategies.delete("buyhold").unwrap();
    assert!(strategies.list().unwrap().is_empty());

    // A deleted name is free for re-upload.
    strategies
        .create("buyhold.py", BUYHOLD_SOURCE.as_bytes())
        .unwrap();
    assert_eq!(strategies.list().unwrap(), vec!["buyhold"]);
}

#[test]
fn result_names_are_immutable_until_deleted() {
    let (_dir, strategies, results) = test_stores();
    strategies
        .create("buyhold.py", BUYHOLD_SOURCE.as_bytes())
        .unwrap();

    run_backtest(
        HEADERED_SERIES.as_bytes(),
        "buyhold",
        500.0,
        "t1",
        &strategies,
        &results,
    )
    .unwrap();

    let err = run_backtest(
        HEADERED_SERIES.as_bytes(),
        "buyhold",
        900.0,
        "t1",
        &strategies,
        &results,
    )
    .unwrap_err();
    assert!(matches!(err, TradebenchError::AlreadyExists { .. }));
    assert_eq!(results.get("t1").unwrap().end_result, json!(500.0));

    // Delete then recreate under the same name.
    results.delete("t1").unwrap();
    run_backtest(
        HEADERED_SERIES.as_bytes(),
        "buyhold",
        900.0,
        "t1",
        &strategies,
        &results,
    )
    .unwrap();
    assert_eq!(results.get("t1").unwrap().end_result, json!(900.0));
}
