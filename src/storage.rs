//! Quarter-table persistence as CSV
//!
//! One file per ticker, `report.{ticker}.csv`, with quarter labels as columns
//! and financial fields as rows. Absent values are written as empty cells.
//! [`load_report`] is the exact inverse of [`save_report`].

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AnalysisError;
use crate::quarter::QuarterId;
use crate::report::{FinancialField, FinancialRecord, FinancialTable};

const FIELD_HEADER: &str = "field";

pub fn report_path(data_dir: &Path, ticker: &str) -> PathBuf {
    data_dir.join(format!("report.{}.csv", ticker))
}

/// Write `table` to `data_dir/report.{ticker}.csv`, creating the directory
pub fn save_report(data_dir: &Path, ticker: &str, table: &FinancialTable) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let path = report_path(data_dir, ticker);
    let tmp_path = data_dir.join(format!("report.{}.csv.tmp", ticker));
    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create {:?}", tmp_path))?;
    write_table(file, table).with_context(|| format!("Failed to write report for {}", ticker))?;
    fs::rename(&tmp_path, &path).context("Failed to finalize report CSV file")?;

    info!("Saved {} quarters for {} to {:?}", table.len(), ticker, path);
    Ok(path)
}

/// Read the table previously saved for `ticker`
pub fn load_report(data_dir: &Path, ticker: &str) -> Result<FinancialTable> {
    let path = report_path(data_dir, ticker);
    let file =
        fs::File::open(&path).with_context(|| format!("No saved report at {:?}", path))?;
    read_table(file).with_context(|| format!("Failed to read {:?}", path))
}

pub fn write_table<W: Write>(writer: W, table: &FinancialTable) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = vec![FIELD_HEADER.to_string()];
    header.extend(table.quarters().map(|q| q.encode()));
    wtr.write_record(&header)?;

    for field in FinancialField::ALL {
        let mut row = vec![field.as_str().to_string()];
        row.extend(
            table
                .iter()
                .map(|(_, record)| record.get(field).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn read_table<R: Read>(reader: R) -> Result<FinancialTable> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let mut columns = headers.iter();
    match columns.next() {
        Some(first) if first == FIELD_HEADER => {}
        other => {
            return Err(AnalysisError::malformed(format!(
                "expected '{}' as first header, found {:?}",
                FIELD_HEADER, other
            ))
            .into())
        }
    }
    let quarters = columns
        .map(QuarterId::decode)
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = vec![FinancialRecord::default(); quarters.len()];
    for (idx, result) in rdr.records().enumerate() {
        let row = result.context("Failed to read CSV record")?;
        let name = row.get(0).unwrap_or_default();
        let field = name.parse::<FinancialField>().map_err(|_| {
            AnalysisError::malformed(format!("unknown field '{}' at row {}", name, idx + 2))
        })?;

        for (col, record) in records.iter_mut().enumerate() {
            let cell = row.get(col + 1).unwrap_or_default();
            record.set(field, parse_cell(cell, field, &quarters[col])?);
        }
    }

    let mut table = FinancialTable::new();
    for (quarter, record) in quarters.into_iter().zip(records) {
        table.insert(quarter, record);
    }
    Ok(table)
}

fn parse_cell(
    cell: &str,
    field: FinancialField,
    quarter: &QuarterId,
) -> Result<Option<f64>, AnalysisError> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some).map_err(|e| {
        AnalysisError::malformed(format!(
            "invalid {} for {}: '{}' ({})",
            field.as_str(),
            quarter,
            cell,
            e
        ))
    })
}
