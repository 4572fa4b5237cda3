//! ccxt-playground binary

use anyhow::Context;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ccxt_playground::playground::exporter::DEFAULT_OUTPUT_DIR;
use ccxt_playground::playground::{Console, Credentials, Driver, DriverOptions, TerminalPrompter};

#[derive(Parser)]
#[command(name = "ccxt-playground")]
#[command(about = "Interactive explorer for unified cryptocurrency exchange endpoints")]
#[command(version)]
struct Args {
    /// Exchange ID (e.g. indodax, kraken, binance)
    #[arg(long, short)]
    exchange: Option<String>,

    /// API key. Prefer the CCXT_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,

    /// API secret. Prefer the CCXT_SECRET environment variable
    #[arg(long)]
    secret: Option<String>,

    /// Endpoint to run (e.g. fetch_ticker). With --exchange, runs once and exits
    #[arg(long)]
    endpoint: Option<String>,

    /// Trading symbol [default: BTC/IDR]
    #[arg(long)]
    symbol: Option<String>,

    /// Result limit [default: 10]
    #[arg(long)]
    limit: Option<String>,

    /// Extra endpoint parameter, repeatable
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Save the response without asking
    #[arg(long)]
    export: bool,

    /// Directory for exported files
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Show error traces
    #[arg(long)]
    debug: bool,

    /// Verbose logging on stderr
    #[arg(long, short)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// 로그는 stderr로. RUST_LOG가 없으면 warn (`-v`이면 debug)
fn init_logging(verbose: bool, color: bool) {
    let default_level = if verbose { "ccxt_playground=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(color),
        )
        .init();
}

impl Args {
    fn into_options(self) -> DriverOptions {
        let from_flags = self.api_key.is_some() || self.secret.is_some();
        let credentials = if from_flags {
            Credentials::new(
                self.api_key.unwrap_or_default(),
                self.secret.unwrap_or_default(),
            )
        } else {
            Credentials::from_env()
        };

        let mut params: HashMap<String, String> = self.params.into_iter().collect();
        if let Some(symbol) = self.symbol {
            params.insert("symbol".to_string(), symbol);
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit);
        }

        DriverOptions {
            exchange: self.exchange,
            endpoint: self.endpoint,
            credentials_from_flags: from_flags && credentials.is_some(),
            credentials,
            params,
            export: self.export,
            output_dir: self.output_dir,
            debug: self.debug,
        }
    }
}

async fn run(args: Args) -> anyhow::Result<u8> {
    let color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
    init_logging(args.verbose || args.debug, color);
    tracing::debug!(exchange = ?args.exchange, endpoint = ?args.endpoint, "starting");

    let mut driver = Driver::new(
        Console::stdout(color),
        TerminalPrompter::new(color),
        args.into_options(),
    );
    let status = driver.run().await.context("playground terminated")?;
    Ok(status.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("since=now").unwrap(), ("since".into(), "now".into()));
        assert_eq!(parse_param("a=b=c").unwrap(), ("a".into(), "b=c".into()));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_symbol_and_limit_become_params() {
        let args = Args::parse_from([
            "ccxt-playground",
            "-e",
            "indodax",
            "--endpoint",
            "fetch_order_book",
            "--symbol",
            "ETH/IDR",
            "--limit",
            "5",
            "--param",
            "reload=true",
        ]);
        let options = args.into_options();
        assert!(options.is_single_shot());
        assert_eq!(options.params["symbol"], "ETH/IDR");
        assert_eq!(options.params["limit"], "5");
        assert_eq!(options.params["reload"], "true");
        assert_eq!(options.output_dir, PathBuf::from("responses"));
    }

    #[test]
    fn test_flag_credentials_are_marked() {
        let args = Args::parse_from(["ccxt-playground", "--api-key", "k", "--secret", "s"]);
        let options = args.into_options();
        assert!(options.credentials_from_flags);
        assert!(options.credentials.is_some());
    }
}
