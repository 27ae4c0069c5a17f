//! Integration tests for the cryptotrack binary
//!
//! Tests argument handling and the cache behaviour visible from the command line.

use std::process::{Command, Output};

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns a URL nothing is listening on
fn dead_api_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cryptotrack"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cryptotrack")
}

/// Async variant for tests that keep a mock server running
async fn run_cli_async(args: &[&str]) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_cryptotrack"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .expect("Failed to execute cryptotrack")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn markets_server() -> MockServer {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        { "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
          "current_price": 67187.0, "market_cap": 1325000000000.0, "market_cap_rank": 1 },
        { "id": "ethereum", "symbol": "eth", "name": "Ethereum",
          "current_price": 3500.0, "market_cap": 420000000000.0, "market_cap_rank": 2 }
    ]);
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let out = stdout(&output);
    assert!(out.contains("cryptotrack"), "Help should mention cryptotrack");
    assert!(out.contains("top"), "Help should mention the top command");
    assert!(out.contains("search"), "Help should mention the search command");
}

#[test]
fn test_missing_command_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_per_page_prints_error_and_exits() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&[
        "top",
        "--per-page",
        "1000",
        "--cache-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("Invalid page size"),
        "Should explain the bad page size: {}",
        stderr(&output)
    );
}

#[test]
fn test_blank_search_needs_no_network() {
    let dir = TempDir::new().unwrap();
    let api = dead_api_url();
    let output = run_cli(&[
        "search",
        "   ",
        "--api-url",
        &api,
        "--cache-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).trim().is_empty());
}

#[test]
fn test_top_without_cache_or_network_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    let api = dead_api_url();
    let output = run_cli(&[
        "top",
        "--api-url",
        &api,
        "--cache-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("error:"), "stderr: {}", err);
    assert!(err.contains("hint:"), "stderr: {}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_top_uses_cache_when_api_goes_away() {
    let server = markets_server().await;
    let dir = TempDir::new().unwrap();
    let cache_dir = dir.path().to_str().unwrap();
    let api = server.uri();
    let dead = dead_api_url();

    // First run fills the cache
    let output = run_cli_async(&["top", "--api-url", &api, "--cache-dir", cache_dir]).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("BTC"));
    assert!(dir.path().join("coins.json").exists());

    // Fresh cache is served without the API
    let output = run_cli_async(&["top", "--api-url", &dead, "--cache-dir", cache_dir]).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("ETH"));
    assert!(!stderr(&output).contains("stale"));

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    // Stale cache is still served when the API is down
    let output = run_cli_async(&[
        "top",
        "--api-url",
        &dead,
        "--cache-dir",
        cache_dir,
        "--max-age-secs",
        "0",
    ])
    .await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("BTC"));
    assert!(stderr(&output).contains("stale"));

    // A forced refresh does not fall back
    let output = run_cli_async(&["refresh", "--api-url", &dead, "--cache-dir", cache_dir]).await;
    assert!(!output.status.success());

    // After clearing there is nothing to fall back to
    let output = run_cli_async(&["clear", "--cache-dir", cache_dir]).await;
    assert!(output.status.success());
    let output = run_cli_async(&["top", "--api-url", &dead, "--cache-dir", cache_dir]).await;
    assert!(!output.status.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_json_output() {
    let server = markets_server().await;
    let dir = TempDir::new().unwrap();
    let api = server.uri();

    let output = run_cli_async(&[
        "refresh",
        "--json",
        "--api-url",
        &api,
        "--cache-dir",
        dir.path().to_str().unwrap(),
    ])
    .await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let coins: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("Output should be JSON");
    let coins = coins.as_array().expect("Output should be an array");
    assert_eq!(coins.len(), 2);
    assert_eq!(coins[0]["id"], "bitcoin");
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use cryptotrack::cli::{Cli, Command};
    use cryptotrack::config::{Config, ConfigError};

    #[test]
    fn test_cli_top_parses() {
        let cli = Cli::parse_from(["cryptotrack", "top"]);
        assert_eq!(cli.command, Command::Top);
    }

    #[test]
    fn test_cli_clear_parses() {
        let cli = Cli::parse_from(["cryptotrack", "clear"]);
        assert_eq!(cli.command, Command::Clear);
    }

    #[test]
    fn test_config_from_cli_rejects_zero_page_size() {
        let cli = Cli::parse_from(["cryptotrack", "top", "--per-page", "0"]);
        assert!(matches!(
            Config::from_cli(&cli),
            Err(ConfigError::InvalidPerPage(0))
        ));
    }
}
