//! Command-line interface for the tradecrew pipeline
//!
//! Three commands: `analyze` runs the full six-stage pipeline per
//! ticker, `screen` ranks a watchlist in a single pass, and `check`
//! probes the configured LLM backend. Configuration comes from
//! environment variables with sensible defaults throughout.

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tradecrew_agents::{AppConfig, Screener, StepObserver, TradingGraph, report};
use tradecrew_core::{StepStatus, TradingDecision};
use tradecrew_data::{MarketData, MarketDataProvider, SourceConfig};
use tradecrew_llm::build_client;

#[derive(Parser, Debug)]
#[command(name = "tradecrew")]
#[command(about = "Multi-agent LLM stock analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis pipeline for one or more tickers
    Analyze {
        /// Tickers to analyze; defaults to the configured watchlist
        tickers: Vec<String>,

        /// Analysis date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Write a markdown report per ticker into this directory
        #[arg(short, long)]
        report_dir: Option<PathBuf>,

        /// Print each decision as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rank a watchlist with a single screening pass
    Screen {
        /// Watchlist, comma or whitespace separated
        watchlist: String,

        /// Number of picks to keep
        #[arg(short, long, default_value_t = 5)]
        top: usize,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check that the configured LLM backend is reachable
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "warn,tradecrew=info".to_string()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("loading configuration")?;

    match cli.command {
        Command::Analyze {
            tickers,
            date,
            report_dir,
            json,
        } => analyze(&config, tickers, date.as_deref(), report_dir, json).await,
        Command::Screen {
            watchlist,
            top,
            json,
        } => screen(&config, &watchlist, top, json).await,
        Command::Check => check(&config).await,
    }
}

async fn analyze(
    config: &AppConfig,
    tickers: Vec<String>,
    date: Option<&str>,
    report_dir: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let llm = build_client(&config.llm).context("building LLM client")?;
    let data: Arc<dyn MarketData> =
        Arc::new(MarketDataProvider::new(&SourceConfig::from(&config.data_sources))?);

    let tickers = if tickers.is_empty() {
        config.trading.tickers.clone()
    } else {
        tickers
    };

    let observer: StepObserver = Arc::new(|step| {
        let tag = match step.status {
            StepStatus::Pending => "..",
            StepStatus::Completed => "ok",
            StepStatus::Error => "!!",
        };
        eprintln!("  [{tag}] {}", step.step_name);
    });
    let graph = TradingGraph::new(llm, data, config.trading.clone()).with_observer(observer);

    let mut decisions = Vec::new();
    for ticker in &tickers {
        eprintln!("analyzing {ticker}");
        match graph.propagate(ticker, date).await {
            Ok(decision) => {
                if let Some(dir) = &report_dir {
                    std::fs::create_dir_all(dir)?;
                    let path = dir.join(format!(
                        "{}_{}.md",
                        decision.ticker, decision.analysis_date
                    ));
                    std::fs::write(&path, report::render_markdown(&decision))?;
                    eprintln!("  report written to {}", path.display());
                }
                decisions.push(decision);
            }
            Err(e) => error!(ticker, error = %e, "analysis failed"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&decisions)?);
    } else if let [decision] = decisions.as_slice() {
        println!("{}", report::render_markdown(decision));
    } else {
        print_decisions(&decisions);
    }
    Ok(())
}

fn print_decisions(decisions: &[TradingDecision]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Ticker",
        "Signal",
        "Confidence",
        "Rows",
        "Issues",
    ]);
    for decision in decisions {
        table.add_row(vec![
            Cell::new(&decision.ticker),
            Cell::new(decision.final_signal.as_str().to_uppercase()),
            Cell::new(format!("{:.0}%", decision.final_confidence)),
            Cell::new(decision.price_rows),
            Cell::new(decision.verification_issues.len()),
        ]);
    }
    println!("{table}");
}

async fn screen(
    config: &AppConfig,
    watchlist: &str,
    top: usize,
    json: bool,
) -> anyhow::Result<()> {
    let llm = build_client(&config.llm).context("building LLM client")?;
    let data: Arc<dyn MarketData> =
        Arc::new(MarketDataProvider::new(&SourceConfig::from(&config.data_sources))?);

    let observer: StepObserver = Arc::new(|step| {
        let tag = match step.status {
            StepStatus::Pending => "..",
            StepStatus::Completed => "ok",
            StepStatus::Error => "!!",
        };
        eprintln!("  [{tag}] {}", step.step_name);
    });
    let screener = Screener::new(llm, data, config.trading.clone()).with_observer(observer);
    let result = screener.screen(watchlist, top).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Rank",
        "Ticker",
        "Signal",
        "Confidence",
        "Rationale",
    ]);
    for pick in &result.picks {
        let rationale: String = pick.rationale.chars().take(60).collect();
        table.add_row(vec![
            Cell::new(pick.rank),
            Cell::new(&pick.ticker),
            Cell::new(pick.signal.as_str().to_uppercase()),
            Cell::new(format!("{:.0}%", pick.confidence)),
            Cell::new(rationale),
        ]);
    }
    println!("{table}");

    for err in &result.errors {
        eprintln!("skipped: {err}");
    }
    Ok(())
}

async fn check(config: &AppConfig) -> anyhow::Result<()> {
    println!("backend: {}", config.llm.backend);
    println!("model:   {}", config.llm.model);

    let llm = build_client(&config.llm).context("building LLM client")?;
    if llm.is_available().await {
        println!("status:  reachable");
        Ok(())
    } else {
        println!("status:  unreachable");
        std::process::exit(1);
    }
}
