//! US income-statement reports.
//!
//! Each provider row carries a single item (identified by a standard item
//! code) for one report, so quarters are assembled item by item. Market data
//! comes from a separate snapshot request that only has the latest values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::table::{FinancialField, FinancialRecord, FinancialTable};
use super::{nullable, parse_records, CUTOFF_YEAR};
use crate::error::AnalysisError;
use crate::quarter::QuarterId;

/// Quarterly report tags look like `2023/Q1`; annual rows (`2023/FY`) are skipped
static QUARTERLY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}/Q[1-4]").expect("report tag regex is valid"));

/// Standard item codes of `RPT_USF10_FN_INCOME`
const ITEM_CODES: [(&str, FinancialField); 4] = [
    ("004001001", FinancialField::Revenue),
    ("004005999", FinancialField::GrossProfit),
    ("004009999", FinancialField::OperatingProfit),
    ("004013999", FinancialField::NetProfit),
];

/// One row of `RPT_USF10_FN_INCOME`
#[derive(Debug, Deserialize)]
struct UsIncomeRecord {
    #[serde(rename = "REPORT")]
    report: String,
    #[serde(rename = "REPORT_DATE")]
    report_date: String,
    #[serde(rename = "STD_ITEM_CODE", deserialize_with = "nullable")]
    std_item_code: Option<String>,
    #[serde(rename = "AMOUNT", deserialize_with = "nullable")]
    amount: Option<f64>,
}

/// One row of `RPT_USF10_DATA_MAININDICATOR`
#[derive(Debug, Deserialize)]
struct UsSnapshotRecord {
    #[serde(rename = "REPORT_DATE")]
    report_date: String,
    #[serde(rename = "TOTAL_MARKET_CAP", deserialize_with = "nullable")]
    total_market_cap: Option<f64>,
    #[serde(rename = "PE_TTM", deserialize_with = "nullable")]
    pe_ttm: Option<f64>,
    #[serde(rename = "ISSUED_COMMON_SHARES", deserialize_with = "nullable")]
    issued_common_shares: Option<f64>,
}

fn field_for_item_code(code: Option<&str>) -> Option<FinancialField> {
    let code = code?.trim();
    ITEM_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, field)| *field)
}

/// Assemble quarter columns from item-coded income rows.
///
/// A quarter may end up with fewer than four items when upstream data is
/// incomplete.
pub fn parse_us_income(raw_payload: &[u8]) -> Result<FinancialTable, AnalysisError> {
    let records: Vec<UsIncomeRecord> = parse_records(raw_payload)?;

    let mut table = FinancialTable::new();
    for item in &records {
        if !QUARTERLY_TAG.is_match(&item.report) {
            continue;
        }
        let quarter = QuarterId::from_report_date(&item.report_date)?;
        if quarter.year() < CUTOFF_YEAR {
            continue;
        }

        let record = table.entry(quarter);
        match field_for_item_code(item.std_item_code.as_deref()) {
            Some(field) => record.set(field, item.amount),
            None => debug!(
                "Ignoring US item {:?} for {}",
                item.std_item_code, quarter
            ),
        }
    }

    Ok(table)
}

/// Latest market snapshot (market cap, P/E, shares outstanding).
///
/// The provider lists snapshots latest first; only the first one is used.
pub fn parse_us_snapshot(raw_payload: &[u8]) -> Result<FinancialRecord, AnalysisError> {
    let records: Vec<UsSnapshotRecord> = parse_records(raw_payload)?;
    let latest = records
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::malformed("US snapshot payload has no records"))?;

    debug!("Using US snapshot reported {}", latest.report_date);
    Ok(FinancialRecord {
        market_cap: latest.total_market_cap,
        pe_ttm: latest.pe_ttm,
        shares_outstanding: latest.issued_common_shares,
        ..Default::default()
    })
}

/// Normalize a US listing: income items per quarter, with the latest market
/// snapshot broadcast into every quarter column.
pub fn normalize_us_report(
    income_payload: &[u8],
    snapshot_payload: &[u8],
) -> Result<FinancialTable, AnalysisError> {
    let mut table = parse_us_income(income_payload)?;
    let snapshot = parse_us_snapshot(snapshot_payload)?;
    table.broadcast(&snapshot);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(year: i32, quarter: u8) -> QuarterId {
        QuarterId::new(year, quarter).unwrap()
    }

    fn item(report: &str, date: &str, code: &str, amount: f64) -> serde_json::Value {
        json!({
            "REPORT": report,
            "REPORT_DATE": date,
            "STD_ITEM_CODE": code,
            "AMOUNT": amount,
        })
    }

    fn payload(rows: Vec<serde_json::Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({ "result": { "data": rows } })).unwrap()
    }

    fn snapshot(market_cap: f64) -> Vec<u8> {
        payload(vec![
            json!({
                "REPORT_DATE": "2024-03-31 00:00:00",
                "TOTAL_MARKET_CAP": market_cap,
                "PE_TTM": 25.0,
                "ISSUED_COMMON_SHARES": 100.0,
            }),
            json!({
                "REPORT_DATE": "2023-12-31 00:00:00",
                "TOTAL_MARKET_CAP": 1.0,
                "PE_TTM": 1.0,
                "ISSUED_COMMON_SHARES": 1.0,
            }),
        ])
    }

    #[test]
    fn test_items_grouped_by_quarter() {
        let income = payload(vec![
            item("2023/Q1", "2023-03-31 00:00:00", "004001001", 100.0),
            item("2023/Q1", "2023-03-31 00:00:00", "004005999", 40.0),
            item("2023/Q2", "2023-06-30 00:00:00", "004001001", 120.0),
            item("2023/Q2", "2023-06-30 00:00:00", "004013999", 12.0),
            item("2023/Q1", "2023-03-31 00:00:00", "004009999", 20.0),
        ]);
        let table = parse_us_income(&income).unwrap();

        let q1 = table.get(&q(2023, 1)).unwrap();
        assert_eq!(q1.revenue, Some(100.0));
        assert_eq!(q1.gross_profit, Some(40.0));
        assert_eq!(q1.operating_profit, Some(20.0));
        assert_eq!(q1.net_profit, None);

        let q2 = table.get(&q(2023, 2)).unwrap();
        assert_eq!(q2.revenue, Some(120.0));
        assert_eq!(q2.net_profit, Some(12.0));
        assert_eq!(q2.gross_profit, None);
    }

    #[test]
    fn test_non_quarterly_tags_and_unknown_codes_are_ignored() {
        let income = payload(vec![
            item("2023/FY", "2023-12-31 00:00:00", "004001001", 999.0),
            item("2023/Q3", "2023-09-30 00:00:00", "004099999", 5.0),
            item("2023/Q3", "2023-09-30 00:00:00", "004001001", 30.0),
        ]);
        let table = parse_us_income(&income).unwrap();

        assert!(!table.contains(&q(2023, 4)));
        let q3 = table.get(&q(2023, 3)).unwrap();
        assert_eq!(q3.revenue, Some(30.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_cutoff_applies_to_us_records() {
        let income = payload(vec![
            item("2021/Q4", "2021-12-31 00:00:00", "004001001", 1.0),
            item("2022/Q1", "2022-03-31 00:00:00", "004001001", 2.0),
        ]);
        let table = parse_us_income(&income).unwrap();
        assert!(table.quarters().all(|q| q.year() >= CUTOFF_YEAR));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_snapshot_broadcast_to_every_quarter() {
        let income = payload(vec![
            item("2023/Q1", "2023-03-31 00:00:00", "004001001", 100.0),
            item("2023/Q2", "2023-06-30 00:00:00", "004001001", 120.0),
            item("2023/Q3", "2023-09-30 00:00:00", "004001001", 140.0),
        ]);
        let table = normalize_us_report(&income, &snapshot(500.0)).unwrap();

        assert_eq!(table.len(), 3);
        for (_, record) in table.iter() {
            assert_eq!(record.market_cap, Some(500.0));
            assert_eq!(record.pe_ttm, Some(25.0));
            assert_eq!(record.shares_outstanding, Some(100.0));
        }
    }

    #[test]
    fn test_empty_snapshot_is_malformed() {
        let income = payload(vec![item("2023/Q1", "2023-03-31 00:00:00", "004001001", 1.0)]);
        let err = normalize_us_report(&income, &payload(vec![])).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_item_code_is_malformed() {
        let bad = payload(vec![json!({
            "REPORT": "2023/Q1",
            "REPORT_DATE": "2023-03-31 00:00:00",
            "AMOUNT": 1.0,
        })]);
        assert!(matches!(
            parse_us_income(&bad),
            Err(AnalysisError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_null_item_code_is_ignored() {
        let raw = payload(vec![
            json!({
                "REPORT": "2023/Q1",
                "REPORT_DATE": "2023-03-31 00:00:00",
                "STD_ITEM_CODE": null,
                "AMOUNT": 5.0,
            }),
            json!({
                "REPORT": "2023/Q1",
                "REPORT_DATE": "2023-03-31 00:00:00",
                "STD_ITEM_CODE": "004001001",
                "AMOUNT": 100.0,
            }),
        ]);
        let table = parse_us_income(&raw).unwrap();
        let record = table.get(&QuarterId::new(2023, 1).unwrap()).unwrap();
        assert_eq!(record.revenue, Some(100.0));
        assert_eq!(record.net_profit, None);
    }
}
