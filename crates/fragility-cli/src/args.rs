use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use fragility_orchestrator::{AnalysisConfig, MarketShock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Ranking,
    Regime,
    Backtest,
    Portfolio,
    Overview,
    Monitor,
    Assessment,
    Scenario,
    All,
}

impl FromStr for Report {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "ranking" => Report::Ranking,
            "regime" => Report::Regime,
            "backtest" => Report::Backtest,
            "portfolio" => Report::Portfolio,
            "overview" => Report::Overview,
            "monitor" => Report::Monitor,
            "assessment" => Report::Assessment,
            "scenario" => Report::Scenario,
            "all" => Report::All,
            other => bail!("unknown report '{}'", other),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub panel: PathBuf,
    pub portfolio: Option<PathBuf>,
    pub industry: Option<String>,
    pub report: Report,
    pub shock: Option<MarketShock>,
    pub top: usize,
    pub em_threshold: Option<f64>,
    pub peg_threshold: Option<f64>,
    pub min_share: Option<f64>,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Result<Self> {
        let panel = flag_value(args, "--panel")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("--panel <CSV> is required"))?;

        let report = match flag_value(args, "--report") {
            Some(r) => r.parse()?,
            None => Report::All,
        };

        let shock = flag_value(args, "--shock")
            .map(|s| s.parse::<MarketShock>())
            .transpose()
            .context("invalid --shock")?;

        Ok(Self {
            panel,
            portfolio: flag_value(args, "--portfolio").map(PathBuf::from),
            industry: flag_value(args, "--industry").map(str::to_string),
            report,
            shock,
            top: parsed(args, "--top")?.unwrap_or(fragility_orchestrator::DEFAULT_TOP_FIRMS),
            em_threshold: parsed(args, "--em-threshold")?,
            peg_threshold: parsed(args, "--peg-threshold")?,
            min_share: parsed(args, "--min-share")?,
        })
    }

    /// Command-line thresholds win over environment and defaults.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(v) = self.em_threshold {
            config.em_threshold = v;
        }
        if let Some(v) = self.peg_threshold {
            config.peg_threshold = v;
        }
        if let Some(v) = self.min_share {
            config.min_share = v;
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parsed<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, flag)
        .map(|v| v.parse::<T>().with_context(|| format!("invalid value for {}: {}", flag, v)))
        .transpose()
}
