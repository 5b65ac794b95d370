use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;

/// Scratch directory holding the JSON and TOML inputs of one test.
pub struct Inputs {
    dir: TempDir,
}

impl Inputs {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Write `contents` to `name` and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write input file");
        path
    }

    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &value.to_string())
    }
}

/// Recorded quote for the single-leg `AAA` call used across CLI tests.
pub fn aaa_call_quote(bid: f64, ask: f64) -> Value {
    serde_json::json!({
        "symbol": "AAA",
        "expiry": "2025-12-19",
        "strike": 420.0,
        "right": "call",
        "bid": bid,
        "ask": ask,
        "delta": 0.31,
        "iv": 0.22,
        "exchange": "SMART",
        "trading_class": "AAA",
        "con_id": 42
    })
}
