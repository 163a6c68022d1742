
use assert_cmd::prelude::*;
use cli_helpers::{base_cmd, configured_cmd, data_dir, run_cmd, run_cmd_json, write_config};
use predicates::prelude::*;
use tempfile::TempDir;
use value_analysis::quarter::QuarterId;
use value_analysis::report::{FinancialRecord, FinancialTable};
use value_analysis::storage::save_report;

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

#[test]
fn watchlist_without_config_uses_builtin_list() {
    let home = setup_temp_home();

    base_cmd(&home)
        .arg("watchlist")
        .assert()
        .success()
        .stdout(predicate::str::contains("00700.HK"))
        .stdout(predicate::str::contains("NVDA.O"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn watchlist_json_reads_config() {
    let home = setup_temp_home();
    let config = write_config(&home);

    let json = run_cmd_json(&home, &config, &["watchlist"]).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["name"], "Tencent");
    assert_eq!(entries[2]["valuation"], serde_json::Value::Null);
}

#[test]
fn show_prints_saved_table() {
    let home = setup_temp_home();
    let config = write_config(&home);

    let mut table = FinancialTable::new();
    table.insert(
        QuarterId::new(2023, 2).unwrap(),
        FinancialRecord {
            revenue: Some(150.0),
            ..Default::default()
        },
    );
    table.insert(
        QuarterId::new(2023, 1).unwrap(),
        FinancialRecord {
            revenue: Some(100.0),
            ..Default::default()
        },
    );
    save_report(&data_dir(&home), "00700.HK", &table).unwrap();

    // Lookup by display name resolves to the ticker's file
    let output = run_cmd(&home, &config, &["show", "Tencent"]).unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2023Q2"));
    assert!(stdout.contains("150.00"));
    assert!(!stdout.contains("\u{001b}["));

    let json = run_cmd_json(&home, &config, &["show", "00700.HK"]).unwrap();
    assert_eq!(json["quarters"][0]["quarter"], "2023Q2");
    assert_eq!(json["quarters"][1]["revenue"], 100.0);
}

#[test]
fn show_missing_report_fails() {
    let home = setup_temp_home();
    let config = write_config(&home);

    configured_cmd(&home, &config)
        .arg("show")
        .arg("AAPL.O")
        .assert()
        .failure()
        .stderr(predicate::str::contains("report.AAPL.O.csv"));
}

#[test]
fn value_reports_rows_and_failures() {
    let home = setup_temp_home();
    let config = write_config(&home);

    let json = run_cmd_json(
        &home,
        &config,
        &["value", "--price", "Tencent=2", "--price", "AAPL.O=190"],
    )
    .unwrap();

    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["security"], "Tencent");
    assert_eq!(rows[0]["rapid_years"], 5);
    assert!(rows[0]["margin_of_safety_pct"].as_f64().unwrap() > 0.0);
    assert!((rows[0]["implied_entry_pe"].as_f64().unwrap() - 2.0).abs() < 1e-9);

    // Apple's unstable phase outlasts the 5-year horizon
    let failures = json["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["security"], "Apple");
    assert!(failures[0]["error"]
        .as_str()
        .unwrap()
        .contains("invalid parameter"));
}

#[test]
fn value_without_price_prints_na() {
    let home = setup_temp_home();
    let config = write_config(&home);

    configured_cmd(&home, &config)
        .arg("value")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tencent"))
        .stdout(predicate::str::contains("N/A"))
        .stdout(predicate::str::contains("Apple"));
}

#[test]
fn value_reads_prices_file() {
    let home = setup_temp_home();
    let config = write_config(&home);
    let prices = home.path().join("prices.csv");
    std::fs::write(&prices, "name,price\nTencent,2\n").unwrap();

    let json = run_cmd_json(
        &home,
        &config,
        &["value", "--prices-file", prices.to_str().unwrap()],
    )
    .unwrap();
    assert_eq!(json["rows"][0]["current_price"], 2.0);
}

#[test]
fn fetch_unsupported_market_fails_without_network() {
    let home = setup_temp_home();
    let config = write_config(&home);

    configured_cmd(&home, &config)
        .arg("fetch")
        .arg("BABA.N")
        .assert()
        .failure()
        .stdout(predicate::str::contains("unsupported market"))
        .stderr(predicate::str::contains("1 of 1 securities failed"));

    assert!(!data_dir(&home).join("report.BABA.N.csv").exists());
}
