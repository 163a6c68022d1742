//! Hong Kong main-indicator reports.
//!
//! The provider publishes cumulative year-to-date figures, so every quarter
//! after Q1 is differenced against the preceding quarter of the same year.

use serde::Deserialize;
use tracing::debug;

use super::table::{FinancialRecord, FinancialTable};
use super::{nullable, parse_records, CUTOFF_YEAR};
use crate::error::AnalysisError;
use crate::quarter::QuarterId;

/// One row of `RPT_HKF10_FN_MAININDICATOR`
#[derive(Debug, Deserialize)]
struct HkIndicatorRecord {
    #[serde(rename = "REPORT_DATE")]
    report_date: String,
    #[serde(rename = "OPERATE_INCOME", deserialize_with = "nullable")]
    operate_income: Option<f64>,
    #[serde(rename = "GROSS_PROFIT", deserialize_with = "nullable")]
    gross_profit: Option<f64>,
    #[serde(rename = "OPERATE_PROFIT", deserialize_with = "nullable")]
    operate_profit: Option<f64>,
    #[serde(rename = "HOLDER_PROFIT", deserialize_with = "nullable")]
    holder_profit: Option<f64>,
    #[serde(rename = "TOTAL_MARKET_CAP", deserialize_with = "nullable")]
    total_market_cap: Option<f64>,
    #[serde(rename = "PE_TTM", deserialize_with = "nullable")]
    pe_ttm: Option<f64>,
    #[serde(rename = "ISSUED_COMMON_SHARES", deserialize_with = "nullable")]
    issued_common_shares: Option<f64>,
}

impl HkIndicatorRecord {
    fn to_record(&self) -> FinancialRecord {
        FinancialRecord {
            revenue: self.operate_income,
            gross_profit: self.gross_profit,
            operating_profit: self.operate_profit,
            net_profit: self.holder_profit,
            market_cap: self.total_market_cap,
            pe_ttm: self.pe_ttm,
            shares_outstanding: self.issued_common_shares,
        }
    }
}

/// Normalize an HK main-indicator payload into single-quarter figures.
///
/// Quarters whose predecessor is missing cannot be differenced and are left
/// out of the result.
pub fn normalize_hk_report(raw_payload: &[u8]) -> Result<FinancialTable, AnalysisError> {
    let records: Vec<HkIndicatorRecord> = parse_records(raw_payload)?;

    let mut cumulative = FinancialTable::new();
    for item in &records {
        let quarter = QuarterId::from_report_date(&item.report_date)?;
        if quarter.year() < CUTOFF_YEAR {
            debug!("Skipping HK record {} before {}", quarter, CUTOFF_YEAR);
            continue;
        }
        cumulative.insert(quarter, item.to_record());
    }

    let mut table = FinancialTable::new();
    for (quarter, record) in cumulative.iter() {
        let Some(previous) = quarter.previous_in_year() else {
            table.insert(*quarter, record.clone());
            continue;
        };

        match cumulative.get(&previous) {
            Some(previous_record) => {
                table.insert(*quarter, record.minus_cumulative(previous_record));
            }
            None => {
                debug!(
                    "Dropping HK quarter {}: cumulative figures for {} are missing",
                    quarter, previous
                );
            }
        }
    }

    Ok(table)
}
