//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use value_analysis::config::Config;
use value_analysis::report::{FinancialField, FinancialRecord, FinancialTable};
use value_analysis::utils::{format_compact, format_number, format_optional, format_pct};
use value_analysis::valuation::ValuationReport;

/// Format the configured watchlist for terminal table output
pub fn format_watchlist_table(config: &Config) -> String {
    #[derive(Tabled)]
    struct WatchlistRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ticker")]
        ticker: String,
        #[tabled(rename = "Currency")]
        currency: String,
        #[tabled(rename = "Valuation")]
        valuation: String,
    }

    let rows: Vec<WatchlistRow> = config
        .securities
        .iter()
        .map(|e| WatchlistRow {
            name: e.name.clone(),
            ticker: e.ticker.clone(),
            currency: e.currency.clone().unwrap_or_else(|| "-".to_string()),
            valuation: if e.valuation.is_some() {
                "yes".green().to_string()
            } else {
                "-".to_string()
            },
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    format!("\n{} Watchlist\n\n{}\n", "📋".cyan().bold(), table)
}

/// Format a watchlist for JSON output
pub fn format_watchlist_json(config: &Config) -> String {
    serde_json::to_string_pretty(&config.securities)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format a quarter table: one row per field, one column per quarter
pub fn format_report_table(ticker: &str, table: &FinancialTable) -> String {
    if table.is_empty() {
        return format!("{} No quarters saved for {}\n", "ℹ".blue().bold(), ticker);
    }

    let mut builder = Builder::default();
    let mut header = vec!["Field".to_string()];
    header.extend(table.quarters().map(|q| q.encode()));
    builder.push_record(header);

    for field in FinancialField::ALL {
        let mut row = vec![field.as_str().to_string()];
        row.extend(table.iter().map(|(_, record)| {
            let value = record.get(field);
            match field {
                FinancialField::PeTtm => format_optional(value, format_number),
                _ => format_optional(value, format_compact),
            }
        }));
        builder.push_record(row);
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());
    rendered.modify(Columns::new(1..), Alignment::right());

    format!(
        "\n{} {} ({} quarters)\n\n{}\n",
        "📊".cyan().bold(),
        ticker.bold(),
        table.len(),
        rendered
    )
}

/// Format a quarter table for JSON output, preserving column order
pub fn format_report_json(ticker: &str, table: &FinancialTable) -> String {
    #[derive(Serialize)]
    struct JsonQuarter<'a> {
        quarter: String,
        #[serde(flatten)]
        record: &'a FinancialRecord,
    }

    #[derive(Serialize)]
    struct JsonReport<'a> {
        ticker: &'a str,
        quarters: Vec<JsonQuarter<'a>>,
    }

    let report = JsonReport {
        ticker,
        quarters: table
            .iter()
            .map(|(q, record)| JsonQuarter {
                quarter: q.encode(),
                record,
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format a valuation report for terminal table output
pub fn format_valuation_table(report: &ValuationReport) -> String {
    let mut output = String::new();

    if report.rows.is_empty() && report.failures.is_empty() {
        return format_empty_valuation();
    }

    #[derive(Tabled)]
    struct ValuationRow {
        #[tabled(rename = "Security")]
        security: String,
        #[tabled(rename = "Init RPS")]
        init_rps: String,
        #[tabled(rename = "Unstable")]
        unstable: String,
        #[tabled(rename = "Unstable EPS")]
        unstable_eps: String,
        #[tabled(rename = "Rapid")]
        rapid: String,
        #[tabled(rename = "Rapid EPS")]
        rapid_eps: String,
        #[tabled(rename = "Fair Value")]
        fair_value: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Margin %")]
        margin: String,
        #[tabled(rename = "Entry P/E")]
        entry_pe: String,
    }

    if !report.rows.is_empty() {
        let rows: Vec<ValuationRow> = report
            .rows
            .iter()
            .map(|r| {
                let margin = match r.margin_of_safety_pct {
                    Some(m) if m >= 0.0 => format_pct(m).green().to_string(),
                    Some(m) => format_pct(m).red().to_string(),
                    None => "N/A".to_string(),
                };

                ValuationRow {
                    security: r.security.clone(),
                    init_rps: format_number(r.init_rps),
                    unstable: format!(
                        "{}y @ {} → {}",
                        r.unstable_years,
                        format_pct(r.unstable_growth_pct),
                        format_pct(r.unstable_margin_pct)
                    ),
                    unstable_eps: format_number(r.unstable_eps),
                    rapid: format!("{}y @ {}", r.rapid_years, format_pct(r.rapid_growth_pct)),
                    rapid_eps: format_number(r.rapid_eps),
                    fair_value: format_number(r.fair_value).bold().to_string(),
                    price: format_optional(r.current_price, format_number),
                    margin,
                    entry_pe: format_optional(r.implied_entry_pe, format_number),
                }
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        table.modify(Columns::new(1..), Alignment::right());

        output.push_str(&format!("\n{} Valuation\n\n", "💰".cyan().bold()));
        output.push_str(&table.to_string());
        output.push('\n');
    }

    if !report.failures.is_empty() {
        output.push_str(&format!("\n{} Failed\n", "❌".red()));
        for failure in &report.failures {
            output.push_str(&format!("  {}: {}\n", failure.security.bold(), failure.error));
        }
    }

    output
}

/// Format a valuation report for JSON output
pub fn format_valuation_json(report: &ValuationReport) -> String {
    #[derive(Serialize)]
    struct JsonFailure<'a> {
        security: &'a str,
        error: String,
    }

    #[derive(Serialize)]
    struct JsonValuation<'a> {
        rows: &'a [value_analysis::valuation::ValuationOutput],
        failures: Vec<JsonFailure<'a>>,
    }

    let json = JsonValuation {
        rows: &report.rows,
        failures: report
            .failures
            .iter()
            .map(|f| JsonFailure {
                security: &f.security,
                error: f.error.to_string(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format empty valuation message
pub fn format_empty_valuation() -> String {
    format!(
        "{} No securities with growth assumptions\nAdd a {} table to watchlist entries in the config file\n",
        "ℹ".blue().bold(),
        "[securities.valuation]".bold()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use value_analysis::quarter::QuarterId;

    #[test]
    fn test_empty_valuation_message() {
        colored::control::set_override(false);
        let msg = format_valuation_table(&ValuationReport::default());
        assert!(msg.contains("No securities with growth assumptions"));
    }

    #[test]
    fn test_report_table_lists_quarters_in_order() {
        colored::control::set_override(false);
        let mut table = FinancialTable::new();
        table.entry(QuarterId::new(2023, 2).unwrap()).revenue = Some(2.5e9);
        table.entry(QuarterId::new(2023, 1).unwrap()).revenue = Some(1.0e9);

        let out = format_report_table("00700.HK", &table);
        let q2 = out.find("2023Q2").unwrap();
        let q1 = out.find("2023Q1").unwrap();
        assert!(q2 < q1);
        assert!(out.contains("2.50B"));
        assert!(out.contains("N/A"));
    }

    #[test]
    fn test_report_json_flattens_records() {
        let mut table = FinancialTable::new();
        table.entry(QuarterId::new(2023, 1).unwrap()).net_profit = Some(7.0);
        let json: serde_json::Value =
            serde_json::from_str(&format_report_json("AAPL.O", &table)).unwrap();
        assert_eq!(json["ticker"], "AAPL.O");
        assert_eq!(json["quarters"][0]["quarter"], "2023Q1");
        assert_eq!(json["quarters"][0]["net_profit"], 7.0);
        assert!(json["quarters"][0]["revenue"].is_null());
    }
}
