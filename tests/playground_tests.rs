//! Driver scenarios against an offline exchange

mod common;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ccxt_playground::playground::error::PlaygroundResult;
use ccxt_playground::playground::{
    Credentials, DriverOptions, Prompter, RunStatus, ScriptedPrompter,
};
use common::{driver, driver_with, LogCapture, MOCK_KEY, MOCK_SECRET};

fn single_shot(exchange: &str, endpoint: &str, dir: &Path) -> DriverOptions {
    let mut options = DriverOptions::new();
    options.exchange = Some(exchange.into());
    options.endpoint = Some(endpoint.into());
    options.output_dir = dir.to_path_buf();
    options
}

fn exported_files(dir: &Path, prefix: &str) -> Vec<std::path::PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"))
        })
        .collect()
}

// === Single-shot mode ===

#[tokio::test]
async fn test_single_shot_ticker_export_has_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = single_shot("indodax", "fetch_ticker", dir.path());
    options.credentials = Credentials::new(MOCK_KEY, MOCK_SECRET);
    options.export = true;

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    let status = driver.run().await.unwrap();
    assert_eq!(status, RunStatus::Completed);

    let files = exported_files(dir.path(), "ccxt_response_indodax_fetch_ticker_");
    assert_eq!(files.len(), 1);
    let raw = fs::read_to_string(&files[0]).unwrap();
    assert!(!raw.contains(MOCK_KEY));
    assert!(!raw.contains(MOCK_SECRET));

    let saved: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved["metadata"]["exchange"], "indodax");
    assert_eq!(saved["metadata"]["parameters"]["symbol"], "BTC/IDR");
    assert_eq!(saved["response"]["symbol"], "BTC/IDR");

    let out = capture.contents();
    assert!(out.contains("Response is an object"));
    assert!(out.contains("Response saved to"));
    assert!(!out.contains(MOCK_SECRET));
    assert!(driver.session().is_none());
}

#[tokio::test]
async fn test_single_shot_without_export_flag_does_not_ask_when_piped() {
    let dir = tempfile::tempdir().unwrap();
    let options = single_shot("indodax", "fetch_ticker", dir.path());

    let (mut driver, _capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    assert!(driver.prompter().asked().is_empty());
    assert!(exported_files(dir.path(), "ccxt_response_").is_empty());
}

#[tokio::test]
async fn test_single_shot_symbol_flag_overrides_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = single_shot("indodax", "fetchTicker", dir.path());
    options.params.insert("symbol".into(), "DOGE/IDR".into());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    let out = capture.contents();
    assert!(out.contains("symbol"));
    assert!(out.contains("BadSymbol"));
}

#[tokio::test]
async fn test_single_shot_private_endpoint_without_credentials_fails() {
    let dir = tempfile::tempdir().unwrap();
    let options = single_shot("indodax", "fetch_balance", dir.path());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    let out = capture.contents();
    assert!(out.contains("Error executing fetch_balance:"));
    assert!(out.contains("AuthenticationError"));
}

#[tokio::test]
async fn test_single_shot_unknown_exchange() {
    let dir = tempfile::tempdir().unwrap();
    let options = single_shot("mtgox", "fetch_ticker", dir.path());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    assert!(capture.contents().contains("Exchange 'mtgox' not found"));
}

#[tokio::test]
async fn test_single_shot_unknown_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let options = single_shot("indodax", "fetch_everything", dir.path());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    assert!(capture.contents().contains("Invalid parameter 'endpoint'"));
}

#[tokio::test]
async fn test_single_shot_bad_limit_is_invalid_parameter() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = single_shot("indodax", "fetch_order_book", dir.path());
    options.params.insert("limit".into(), "ten".into());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    assert!(capture.contents().contains("Invalid parameter 'limit'"));
}

#[tokio::test]
async fn test_single_shot_missing_required_param() {
    let dir = tempfile::tempdir().unwrap();
    let options = single_shot("indodax", "fetch_deposit_address", dir.path());

    let (mut driver, capture) =
        driver_with(ScriptedPrompter::new(Vec::<String>::new()).non_interactive(), options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Failed);
    assert!(capture.contents().contains("--param code=<value>"));
}

// === Credential handling ===

#[tokio::test]
async fn test_flag_credentials_declined() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = single_shot("indodax", "fetch_ticker", dir.path());
    options.credentials = Credentials::new(MOCK_KEY, MOCK_SECRET);
    options.credentials_from_flags = true;

    let (mut driver, capture) = driver(&["n"], options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Declined);
    let out = capture.contents();
    assert!(out.contains("Security Warning"));
    assert!(out.contains("Exiting for security"));
    assert!(driver.session().is_none());
}

#[tokio::test]
async fn test_flag_credentials_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = single_shot("indodax", "fetch_balance", dir.path());
    options.credentials = Credentials::new(MOCK_KEY, MOCK_SECRET);
    options.credentials_from_flags = true;

    // accept, then decline saving
    let (mut driver, capture) = driver(&["y", "n"], options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    let out = capture.contents();
    assert!(out.contains("API credentials configured"));
    assert!(!out.contains(MOCK_KEY));
}

#[tokio::test]
async fn test_credentials_never_reach_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = DriverOptions::new();
    options.output_dir = dir.path().to_path_buf();
    let (logs, _guard) = LogCapture::install();

    let answers = [
        "", MOCK_KEY, MOCK_SECRET, // exchange and credentials
        "3", "fetch_balance", "y", // authenticated call, saved
        "4", "kraken", "", "", // change exchange drops the session
        "3", "fetch_balance", // now fails
        "5",
    ];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let logs = logs.contents();
    assert!(logs.contains("session opened"), "{logs}");
    assert!(logs.contains("invocation failed"), "{logs}");
    assert!(!logs.contains(MOCK_KEY), "{logs}");
    assert!(!logs.contains(MOCK_SECRET), "{logs}");

    let out = capture.contents();
    assert!(out.contains("API credentials configured"));
    assert!(!out.contains(MOCK_KEY));
    assert!(!out.contains(MOCK_SECRET));

    let files = exported_files(dir.path(), "ccxt_response_indodax_fetch_balance_");
    assert_eq!(files.len(), 1);
    let raw = fs::read_to_string(&files[0]).unwrap();
    assert!(!raw.contains(MOCK_KEY));
    assert!(!raw.contains(MOCK_SECRET));
}

// === Interactive mode ===

#[tokio::test]
async fn test_interactive_ticker_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = DriverOptions::new();
    options.output_dir = dir.path().to_path_buf();

    // exchange, api key, secret, menu, endpoint, symbol, save?, menu
    let answers = ["", "", "", "3", "fetch_ticker", "", "n", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Successfully connected to indodax (2 markets)"));
    assert!(out.contains("Executing: fetch_ticker(\"BTC/IDR\")"));
    assert!(out.contains("Response is an object"));
    assert!(out.contains("Goodbye!"));
    assert_eq!(driver.prompter().remaining(), 0);
    assert!(exported_files(dir.path(), "ccxt_response_").is_empty());
}

#[tokio::test]
async fn test_interactive_unknown_exchange_reprompts() {
    let options = DriverOptions::new();
    let answers = ["mtgox", "kraken", "", "", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Exchange 'mtgox' not found. Please try again."));
    assert!(out.contains("Successfully connected to kraken"));
}

#[tokio::test]
async fn test_interactive_failure_returns_to_menu() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = DriverOptions::new();
    options.output_dir = dir.path().to_path_buf();

    let answers = [
        "", "", "", // exchange and empty credentials
        "3", "fetch_balance", // fails without credentials
        "3", "fetch_ticker", "ETH/IDR", "y", // still usable afterwards
        "5",
    ];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("AuthenticationError"));
    assert!(out.contains("Response saved to"));

    let files = exported_files(dir.path(), "ccxt_response_indodax_fetch_ticker_");
    assert_eq!(files.len(), 1);
    let saved: Value = serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(saved["response"]["symbol"], "ETH/IDR");
}

#[tokio::test]
async fn test_interactive_endpoint_by_index_and_invalid_index() {
    let options = DriverOptions::new();
    // sorted list starts with cancel_order; 99 is out of range
    let answers = ["", "", "", "3", "99", "q", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Page 1 of 1"));
    assert!(out.contains("Invalid endpoint number"));
    assert!(out.contains("Returning to main menu."));
}

#[tokio::test]
async fn test_interactive_change_exchange() {
    let options = DriverOptions::new();
    let answers = ["", "", "", "4", "binance", "", "", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Successfully connected to indodax"));
    assert!(out.contains("Successfully connected to binance"));
    assert!(driver.session().is_none());
}

#[tokio::test]
async fn test_interactive_catalog_and_capability_exports() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = DriverOptions::new();
    options.output_dir = dir.path().to_path_buf();

    let answers = ["", "", "", "1", "y", "2", "y", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Market Data Endpoints"));
    assert!(out.contains("Support Summary for indodax"));
    assert!(out.contains("Exchange Information"));

    let endpoints = exported_files(dir.path(), "ccxt_endpoints_indodax_");
    assert_eq!(endpoints.len(), 1);
    let saved: Value = serde_json::from_str(&fs::read_to_string(&endpoints[0]).unwrap()).unwrap();
    assert_eq!(saved["metadata"]["total_endpoints"], 19);

    let capabilities = exported_files(dir.path(), "ccxt_capabilities_indodax_");
    assert_eq!(capabilities.len(), 1);
    let saved: Value =
        serde_json::from_str(&fs::read_to_string(&capabilities[0]).unwrap()).unwrap();
    assert_eq!(saved["raw_has_dictionary"]["fetchOHLCV"], "emulated");
    assert_eq!(saved["raw_has_dictionary"]["fetchTicker"], true);
}

#[tokio::test]
async fn test_interactive_preset_endpoint_runs_first() {
    let mut options = DriverOptions::new();
    options.endpoint = Some("fetch_markets".into());

    let answers = ["", "", "", "n", "5"];
    let (mut driver, capture) = driver(&answers, options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    assert!(capture.contents().contains("Response is a list with 2 items"));
}

#[tokio::test]
async fn test_end_of_input_exits_cleanly() {
    let options = DriverOptions::new();
    let (mut driver, capture) = driver(&["", "", ""], options);
    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    assert!(capture.contents().contains("Operation cancelled by user"));
    assert!(driver.session().is_none());
}

// === Ctrl-C ===

#[tokio::test]
async fn test_ctrl_c_at_first_prompt_exits_cleanly() {
    let mut options = DriverOptions::new();
    options.credentials = Credentials::new(MOCK_KEY, MOCK_SECRET);
    let (mut driver, capture) = driver(&[ScriptedPrompter::CTRL_C], options);

    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    assert!(capture.contents().contains("Operation cancelled by user"));
    assert!(driver.session().is_none());
}

#[tokio::test]
async fn test_ctrl_c_in_endpoint_selection_returns_to_menu() {
    let options = DriverOptions::new();
    let answers = ["", "", "", "3", ScriptedPrompter::CTRL_C, "5"];
    let (mut driver, capture) = driver(&answers, options);

    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    let out = capture.contents();
    assert!(out.contains("Selection cancelled. Returning to main menu."));
    assert!(out.contains("Goodbye!"));
    assert!(!out.contains("Operation cancelled by user"));
}

/// 정해진 시간 뒤 Ctrl-C를 누르는 사용자
struct CtrlCAfter {
    answers: ScriptedPrompter,
    delay: Duration,
}

#[async_trait(?Send)]
impl Prompter for CtrlCAfter {
    async fn ask(&mut self, label: &str, default: Option<&str>) -> PlaygroundResult<String> {
        self.answers.ask(label, default).await
    }

    fn is_interactive(&self) -> bool {
        true
    }

    async fn cancelled(&self) {
        tokio::time::sleep(self.delay).await
    }
}

#[tokio::test]
async fn test_ctrl_c_during_call_exits_cleanly() {
    let prompter = CtrlCAfter {
        // fetch_time on the offline exchange never answers
        answers: ScriptedPrompter::new(["", MOCK_KEY, MOCK_SECRET, "3", "fetch_time"]),
        delay: Duration::from_millis(50),
    };
    let (mut driver, capture) = driver_with(prompter, DriverOptions::new());

    let status = tokio::time::timeout(Duration::from_secs(5), driver.run())
        .await
        .expect("cancellation did not stop the call")
        .unwrap();
    assert_eq!(status, RunStatus::Completed);

    let out = capture.contents();
    assert!(out.contains("Executing: fetch_time()"));
    assert!(out.contains("Operation cancelled by user"));
    assert!(driver.session().is_none());
}
