use serde::{Deserialize, Serialize};

/// Realized annual return below which a firm-year counts as a crash.
pub const CRASH_RETURN_THRESHOLD: f64 = -0.30;

/// Upper bound of the accounting-quality scale.
pub const MAX_F_SCORE: i32 = 9;

/// One firm-year observation in the panel.
///
/// Field names map onto the CSV column headers of the panel file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    #[serde(rename = "Firm")]
    pub firm: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Earnings-manipulation intensity, larger = more aggressive
    #[serde(rename = "Hybrid_EM")]
    pub hybrid_em: f64,
    #[serde(rename = "PEG")]
    pub peg: f64,
    /// Accounting-quality score, expected in 0..=9 but not enforced
    #[serde(rename = "F_Score")]
    pub f_score: i32,
    #[serde(rename = "Debt_Equity")]
    pub debt_equity: f64,
    #[serde(rename = "CFO_Growth")]
    pub cfo_growth: f64,
    #[serde(rename = "Return")]
    pub realized_return: f64,
}

impl PanelRecord {
    /// Binary crash label used for training and evaluation.
    pub fn is_crash(&self) -> bool {
        self.realized_return < CRASH_RETURN_THRESHOLD
    }
}

/// A portfolio holding supplied by the caller.
///
/// Weights are taken as given; they are not required to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    #[serde(rename = "Firm")]
    pub firm: String,
    #[serde(rename = "Weight")]
    pub weight: f64,
}

impl PortfolioEntry {
    pub fn new(firm: impl Into<String>, weight: f64) -> Self {
        Self {
            firm: firm.into(),
            weight,
        }
    }
}

/// Read-only firm-year panel.
///
/// Every slicing helper returns a fresh `Panel`; the source is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    records: Vec<PanelRecord>,
}

impl Panel {
    pub fn new(records: Vec<PanelRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PanelRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PanelRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PanelRecord> {
        self.records.iter()
    }

    /// Sorted distinct years.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn distinct_years(&self) -> usize {
        self.years().len()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Distinct industries in order of first appearance.
    pub fn industries(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            if !seen.iter().any(|i| i == &record.industry) {
                seen.push(record.industry.clone());
            }
        }
        seen
    }

    /// Distinct firms in order of first appearance.
    pub fn firms(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            if !seen.iter().any(|f| f == &record.firm) {
                seen.push(record.firm.clone());
            }
        }
        seen
    }

    pub fn filter<F>(&self, predicate: F) -> Panel
    where
        F: Fn(&PanelRecord) -> bool,
    {
        Panel::new(self.records.iter().filter(|r| predicate(r)).cloned().collect())
    }

    pub fn for_industry(&self, industry: &str) -> Panel {
        self.filter(|r| r.industry == industry)
    }

    /// Narrow to one industry when a filter is given, otherwise copy the whole panel.
    pub fn select_industry(&self, industry: Option<&str>) -> Panel {
        match industry {
            Some(name) => self.for_industry(name),
            None => self.clone(),
        }
    }

    pub fn for_year(&self, year: i32) -> Panel {
        self.filter(|r| r.year == year)
    }

    pub fn before_year(&self, year: i32) -> Panel {
        self.filter(|r| r.year < year)
    }

    /// Rows belonging to the most recent year; empty for an empty panel.
    pub fn latest(&self) -> Panel {
        match self.latest_year() {
            Some(year) => self.for_year(year),
            None => Panel::default(),
        }
    }
}

impl From<Vec<PanelRecord>> for Panel {
    fn from(records: Vec<PanelRecord>) -> Self {
        Panel::new(records)
    }
}

impl<'a> IntoIterator for &'a Panel {
    type Item = &'a PanelRecord;
    type IntoIter = std::slice::Iter<'a, PanelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
