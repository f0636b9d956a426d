#![allow(dead_code)]

use serde_json::Value as Json;
use sirius_core::{execute, DatabaseManager, EngineConfig, DEFAULT_DATABASE};

/// A fresh in-memory engine with nothing in it but the `default` database.
pub fn engine() -> DatabaseManager {
    DatabaseManager::new(EngineConfig::default()).unwrap()
}

/// Runs a `;`-separated batch against `default` and returns every response
/// as JSON, in statement order.
pub fn run(manager: &DatabaseManager, sql: &str) -> Vec<Json> {
    execute(manager, DEFAULT_DATABASE, sql)
        .iter()
        .map(|r| serde_json::to_value(r).unwrap())
        .collect()
}

/// Runs a batch expected to produce exactly one response, and returns it.
pub fn run_one(manager: &DatabaseManager, sql: &str) -> Json {
    let mut responses = run(manager, sql);
    assert_eq!(responses.len(), 1, "expected exactly one response for: {sql}");
    responses.remove(0)
}

pub fn status(response: &Json) -> &str {
    response["status"].as_str().expect("response has a status field")
}

pub fn assert_ok(response: &Json) {
    assert_eq!(status(response), "ok", "expected ok, got {response}");
}

pub fn assert_affected(response: &Json, rows: u64) {
    assert_eq!(status(response), "affected", "expected affected, got {response}");
    assert_eq!(response["rows_affected"], rows);
}

pub fn assert_done(response: &Json) {
    assert_eq!(status(response), "done", "expected done, got {response}");
}

pub fn assert_error(response: &Json) {
    assert_eq!(status(response), "error", "expected error, got {response}");
}

/// Extracts the `content` of every cell in a given `SELECT` response row.
pub fn row_contents(response: &Json, row: usize) -> Vec<Json> {
    response["cells"][row]
        .as_array()
        .unwrap()
        .iter()
        .map(|cell| cell["content"].clone())
        .collect()
}

pub fn row_count(response: &Json) -> usize {
    response["cells"].as_array().unwrap().len()
}
