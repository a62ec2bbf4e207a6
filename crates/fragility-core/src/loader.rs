//! Schema-checked CSV loading for the panel and portfolio tables.
//!
//! Required columns are verified against the header row before any data is
//! read, so a missing column surfaces as [`FragilityError::MissingColumn`]
//! instead of a generic parse failure halfway through the file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{FragilityError, Result};
use crate::types::{Panel, PanelRecord, PortfolioEntry};

pub const PANEL_COLUMNS: [&str; 9] = [
    "Firm",
    "Industry",
    "Year",
    "Hybrid_EM",
    "PEG",
    "F_Score",
    "Debt_Equity",
    "CFO_Growth",
    "Return",
];

pub const PORTFOLIO_COLUMNS: [&str; 2] = ["Firm", "Weight"];

/// Load a panel from any CSV source. Extra columns are ignored.
pub fn load_panel_from_reader<R: Read>(reader: R) -> Result<Panel> {
    let records: Vec<PanelRecord> = read_table(reader, &PANEL_COLUMNS)?;
    tracing::debug!("Loaded panel with {} firm-years", records.len());
    Ok(Panel::new(records))
}

pub fn load_panel<P: AsRef<Path>>(path: P) -> Result<Panel> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let panel = load_panel_from_reader(file)?;
    tracing::info!("Loaded {} firm-years from {}", panel.len(), path.display());
    Ok(panel)
}

pub fn load_portfolio_from_reader<R: Read>(reader: R) -> Result<Vec<PortfolioEntry>> {
    read_table(reader, &PORTFOLIO_COLUMNS)
}

pub fn load_portfolio<P: AsRef<Path>>(path: P) -> Result<Vec<PortfolioEntry>> {
    let file = File::open(path.as_ref())?;
    load_portfolio_from_reader(file)
}

fn read_table<R, T>(reader: R, required: &[&str]) -> Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(FragilityError::MissingColumn(column.to_string()));
        }
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        let row = result.map_err(|e| {
            if matches!(e.kind(), csv::ErrorKind::Deserialize { .. }) {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                FragilityError::InvalidData(format!("line {}: {}", line, e))
            } else {
                FragilityError::Csv(e)
            }
        })?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL_CSV: &str = "\
        Firm,Industry,Year,Hybrid_EM,PEG,F_Score,Debt_Equity,CFO_Growth,Return\n\
        NVIDIA,AI,2023,1.91,2.75,5,0.62,0.04,0.21\n\
        NVIDIA,AI,2024,2.12,3.10,4,0.70,-0.02,-0.41\n\
        Tesla,EV,2024,1.55,2.20,6,1.10,0.01,0.08\n";

    #[test]
    fn test_load_panel() {
        let panel = load_panel_from_reader(PANEL_CSV.as_bytes()).unwrap();
        assert_eq!(panel.len(), 3);
        assert_eq!(panel.records()[1].firm, "NVIDIA");
        assert_eq!(panel.records()[1].f_score, 4);
        assert!(panel.records()[1].is_crash());
        assert_eq!(panel.years(), vec![2023, 2024]);
    }

    #[test]
    fn test_missing_column_fails_loudly() {
        let csv = "Firm,Industry,Year,Hybrid_EM,F_Score,Debt_Equity,CFO_Growth,Return\n\
                   NVIDIA,AI,2023,1.91,5,0.62,0.04,0.21\n";
        match load_panel_from_reader(csv.as_bytes()) {
            Err(FragilityError::MissingColumn(col)) => assert_eq!(col, "PEG"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_cell_is_invalid_data() {
        let csv = "Firm,Industry,Year,Hybrid_EM,PEG,F_Score,Debt_Equity,CFO_Growth,Return\n\
                   NVIDIA,AI,2023,high,2.75,5,0.62,0.04,0.21\n";
        let err = load_panel_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FragilityError::InvalidData(_)));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "Firm,Weight,Sector\nNVIDIA,0.6,Tech\nTesla,0.4,Auto\n";
        let portfolio = load_portfolio_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio[0], PortfolioEntry::new("NVIDIA", 0.6));
    }

    #[test]
    fn test_portfolio_missing_weight() {
        let csv = "Firm\nNVIDIA\n";
        let err = load_portfolio_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FragilityError::MissingColumn(ref c) if c == "Weight"));
    }
}
