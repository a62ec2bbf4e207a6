//! Time-series risk metrics over a multi-year panel.
//!
//! All three metrics degrade to 0.0 instead of NaN when the panel is too
//! short to define them; [`RiskMetrics::is_low_confidence`] flags that case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fragility_core::stats::{mean, pct_change};
use fragility_core::PanelRecord;

/// Number of top firms summed by [`concentration_risk`].
pub const CONCENTRATION_TOP_N: usize = 3;

/// Time-series metrics feeding the regime scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Fraction of firms with two consecutive above-threshold years
    pub persistence: f64,
    /// Latest-year top-3 share of total Hybrid_EM
    pub concentration: f64,
    /// Mean YoY growth of PEG minus mean YoY growth of Hybrid_EM (can be negative)
    pub disconnect: f64,
    /// Distinct years the metrics were computed over
    pub years_observed: usize,
}

impl RiskMetrics {
    pub fn compute(records: &[PanelRecord], em_threshold: f64) -> Self {
        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        Self {
            persistence: em_persistence(records, em_threshold),
            concentration: concentration_risk(records),
            disconnect: disconnect_index(records),
            years_observed: years.len(),
        }
    }

    /// Fewer than two years: persistence and disconnect have no window to work with.
    pub fn is_low_confidence(&self) -> bool {
        self.years_observed < 2
    }
}

/// Fraction of firms whose Hybrid_EM exceeded `threshold` in two consecutive
/// observations at least once.
///
/// Each firm's history is ordered by year and scanned with a two-period
/// rolling count of above-threshold years; a single spike never counts.
pub fn em_persistence(records: &[PanelRecord], threshold: f64) -> f64 {
    let mut by_firm: BTreeMap<&str, Vec<&PanelRecord>> = BTreeMap::new();
    for record in records {
        by_firm.entry(record.firm.as_str()).or_default().push(record);
    }

    if by_firm.is_empty() {
        return 0.0;
    }

    let mut persistent = 0usize;
    for history in by_firm.values_mut() {
        history.sort_by_key(|r| r.year);
        let max_run = history
            .windows(2)
            .map(|w| w.iter().filter(|r| r.hybrid_em > threshold).count())
            .max()
            .unwrap_or(0);
        if max_run >= 2 {
            persistent += 1;
        }
    }

    persistent as f64 / by_firm.len() as f64
}

/// Share of latest-year Hybrid_EM held by the top three firms.
///
/// Bounded in (0, 1] when every value is non-negative. Returns 0.0 when the
/// latest-year total is zero.
pub fn concentration_risk(records: &[PanelRecord]) -> f64 {
    let Some(latest) = records.iter().map(|r| r.year).max() else {
        return 0.0;
    };

    let mut em: Vec<f64> = records
        .iter()
        .filter(|r| r.year == latest)
        .map(|r| r.hybrid_em)
        .collect();
    em.sort_by(|a, b| b.total_cmp(a));

    let total: f64 = em.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }

    let top: f64 = em.iter().take(CONCENTRATION_TOP_N).sum();
    top / total
}

/// Average over year transitions of (PEG growth - Hybrid_EM growth), using
/// cross-sectional means per year.
///
/// Positive means valuation is outrunning the manipulation signal. Transitions
/// off a zero mean are skipped; fewer than two years gives 0.0.
pub fn disconnect_index(records: &[PanelRecord]) -> f64 {
    let mut by_year: BTreeMap<i32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let entry = by_year.entry(record.year).or_default();
        entry.0.push(record.peg);
        entry.1.push(record.hybrid_em);
    }

    let peg_means: Vec<f64> = by_year.values().map(|(peg, _)| mean(peg)).collect();
    let em_means: Vec<f64> = by_year.values().map(|(_, em)| mean(em)).collect();

    let gaps: Vec<f64> = pct_change(&peg_means)
        .into_iter()
        .zip(pct_change(&em_means))
        .filter_map(|(peg, em)| Some(peg? - em?))
        .collect();

    mean(&gaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rec(firm: &str, year: i32, em: f64, peg: f64) -> PanelRecord {
        PanelRecord {
            firm: firm.to_string(),
            industry: "AI".to_string(),
            year,
            hybrid_em: em,
            peg,
            f_score: 5,
            debt_equity: 1.0,
            cfo_growth: 0.0,
            realized_return: 0.0,
        }
    }

    #[test]
    fn test_persistence_rewards_consecutive_years() {
        let records = vec![
            // A: above threshold in 2021 and 2022 -> persistent
            rec("A", 2020, 1.0, 1.0),
            rec("A", 2021, 2.0, 1.0),
            rec("A", 2022, 2.1, 1.0),
            // B: two spikes, never consecutive -> not persistent
            rec("B", 2020, 2.0, 1.0),
            rec("B", 2021, 1.0, 1.0),
            rec("B", 2022, 2.0, 1.0),
            // C: single observation
            rec("C", 2022, 3.0, 1.0),
            // D: never above
            rec("D", 2020, 0.5, 1.0),
            rec("D", 2021, 0.5, 1.0),
        ];
        assert_relative_eq!(em_persistence(&records, 1.5), 0.25);
    }

    #[test]
    fn test_persistence_sorts_each_firm_by_year() {
        // out-of-order rows: 2020 and 2022 are above but not adjacent
        let records = vec![
            rec("A", 2022, 2.0, 1.0),
            rec("A", 2020, 2.0, 1.0),
            rec("A", 2021, 1.0, 1.0),
        ];
        assert_eq!(em_persistence(&records, 1.5), 0.0);
        assert_eq!(em_persistence(&[], 1.5), 0.0);
    }

    #[test]
    fn test_concentration_uses_latest_year_top_three() {
        let records = vec![
            rec("A", 2021, 100.0, 1.0),
            rec("A", 2022, 4.0, 1.0),
            rec("B", 2022, 3.0, 1.0),
            rec("C", 2022, 2.0, 1.0),
            rec("D", 2022, 1.0, 1.0),
        ];
        assert_relative_eq!(concentration_risk(&records), 0.9);
    }

    #[test]
    fn test_concentration_with_few_firms_is_one() {
        let records = vec![rec("A", 2022, 1.5, 1.0), rec("B", 2022, 0.5, 1.0)];
        assert_relative_eq!(concentration_risk(&records), 1.0);
        assert_eq!(concentration_risk(&[rec("A", 2022, 0.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_disconnect_index() {
        // PEG mean: 1.0 -> 1.5 -> 1.8  (+50%, +20%)
        // EM mean:  1.0 -> 1.1 -> 1.21 (+10%, +10%)
        let records = vec![
            rec("A", 2020, 1.0, 1.0),
            rec("A", 2021, 1.1, 1.5),
            rec("A", 2022, 1.21, 1.8),
        ];
        assert_relative_eq!(disconnect_index(&records), (0.4 + 0.1) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disconnect_can_be_negative() {
        let records = vec![rec("A", 2020, 1.0, 2.0), rec("A", 2021, 2.0, 2.0)];
        assert_relative_eq!(disconnect_index(&records), -1.0);
    }

    #[test]
    fn test_single_year_is_low_confidence() {
        let records = vec![rec("A", 2022, 2.0, 1.0), rec("B", 2022, 2.0, 1.0)];
        let metrics = RiskMetrics::compute(&records, 1.5);
        assert!(metrics.is_low_confidence());
        assert_eq!(metrics.persistence, 0.0);
        assert_eq!(metrics.disconnect, 0.0);
        assert_relative_eq!(metrics.concentration, 1.0);
    }
}
