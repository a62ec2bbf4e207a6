//! fragility: run market-fragility reports over a firm-year panel CSV.
//!
//! Reports are printed to stdout as JSON; logs go to stderr.
//!
//! Usage:
//!   fragility --panel market_data.csv
//!   fragility --panel market_data.csv --report ranking --industry AI
//!   fragility --panel market_data.csv --report scenario --shock severe
//!   fragility --panel market_data.csv --report portfolio --portfolio holdings.csv
//!
//! Reports: ranking, regime, backtest, portfolio, overview, monitor,
//! assessment, scenario, all (default).
//! Thresholds: --em-threshold, --peg-threshold, --min-share (override the
//! FRAGILITY_* environment variables).

mod args;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

use bubble_regime_detector::{industry_stress_monitor, market_overview};
use fragility_core::{load_panel, load_portfolio, Panel, PortfolioEntry};
use fragility_orchestrator::{
    backtest_report, crash_ranking, final_assessment, portfolio_report, regime_report,
    simulate_shock, AnalysisConfig, MarketShock,
};

use args::{CliArgs, Report};

const USAGE: &str = "usage: fragility --panel <CSV> [--report <name>] [--industry <name>] \
[--portfolio <CSV>] [--shock mild|severe|liquidity] [--top <n>] \
[--em-threshold <x>] [--peg-threshold <x>] [--min-share <x>]";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "fragility_cli=info,fragility_orchestrator=info,crash_model=warn".into()
    });
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let raw: Vec<String> = std::env::args().collect();
    if raw.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let args = CliArgs::parse(&raw).context(USAGE)?;
    let mut config = AnalysisConfig::from_env();
    args.apply_overrides(&mut config);

    let panel = load_panel(&args.panel)
        .with_context(|| format!("Failed to load panel from {}", args.panel.display()))?;
    let portfolio = match &args.portfolio {
        Some(path) => Some(
            load_portfolio(path)
                .with_context(|| format!("Failed to load portfolio from {}", path.display()))?,
        ),
        None => None,
    };

    tracing::info!(
        "Loaded {} firm-years ({} firms, {} years)",
        panel.len(),
        panel.firms().len(),
        panel.distinct_years()
    );

    let output = run_report(args.report, &panel, portfolio.as_deref(), &args, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn run_report(
    report: Report,
    panel: &Panel,
    portfolio: Option<&[PortfolioEntry]>,
    args: &CliArgs,
    config: &AnalysisConfig,
) -> Result<Value> {
    let industry = args.industry.as_deref();

    let value = match report {
        Report::Ranking => serde_json::to_value(crash_ranking(panel, industry, config)?)?,
        Report::Regime => serde_json::to_value(regime_report(panel, industry, config)?)?,
        Report::Backtest => serde_json::to_value(backtest_report(panel, industry, config)?)?,
        Report::Overview => serde_json::to_value(market_overview(panel)?)?,
        Report::Monitor => serde_json::to_value(industry_stress_monitor(panel))?,
        Report::Assessment => serde_json::to_value(final_assessment(panel, config, args.top)?)?,
        Report::Portfolio => {
            let Some(holdings) = portfolio else {
                bail!("--report portfolio needs --portfolio <CSV>");
            };
            serde_json::to_value(portfolio_report(panel, holdings, config)?)?
        }
        Report::Scenario => {
            let shocks = match args.shock {
                Some(shock) => vec![shock],
                None => MarketShock::ALL.to_vec(),
            };
            let results = shocks
                .into_iter()
                .map(|shock| simulate_shock(panel, industry, shock, portfolio, config))
                .collect::<fragility_core::Result<Vec<_>>>()?;
            serde_json::to_value(results)?
        }
        Report::All => {
            let mut all = Map::new();
            for (name, part) in [
                ("overview", Report::Overview),
                ("monitor", Report::Monitor),
                ("regime", Report::Regime),
                ("ranking", Report::Ranking),
                ("backtest", Report::Backtest),
                ("scenario", Report::Scenario),
                ("assessment", Report::Assessment),
            ] {
                all.insert(name.to_string(), run_report(part, panel, portfolio, args, config)?);
            }
            if portfolio.is_some() {
                all.insert(
                    "portfolio".to_string(),
                    run_report(Report::Portfolio, panel, portfolio, args, config)?,
                );
            }
            all.insert("config".to_string(), json!(config));
            Value::Object(all)
        }
    };

    Ok(value)
}
