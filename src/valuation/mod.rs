// Valuation module - two-phase intrinsic value and price comparison

pub mod model;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::AnalysisError;

pub use model::{two_phase_model, GlobalParams, TwoPhaseResult};

/// Per-security growth assumptions. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssumptions {
    /// Revenue per share at the start of the forecast
    pub init_rps: f64,
    /// Years until the company reaches stable profitability (0 for mature companies)
    #[serde(default)]
    pub unstable_years: u32,
    #[serde(default)]
    pub unstable_growth_pct: f64,
    /// Profit margin reached at the end of the unstable phase
    pub unstable_margin_pct: f64,
    pub rapid_growth_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationInput {
    pub security: String,
    pub assumptions: GrowthAssumptions,
}

/// One valuation row: the inputs echoed back plus every derived figure.
///
/// Price-derived columns are `None` when no current price was supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationOutput {
    pub security: String,
    pub init_rps: f64,
    pub unstable_years: u32,
    pub unstable_growth_pct: f64,
    pub unstable_margin_pct: f64,
    pub unstable_eps: f64,
    pub rapid_growth_pct: f64,
    pub rapid_years: u32,
    pub rapid_eps: f64,
    pub fair_value: f64,
    pub current_price: Option<f64>,
    pub margin_of_safety_pct: Option<f64>,
    pub implied_entry_pe: Option<f64>,
}

/// A security whose valuation could not be computed
#[derive(Debug)]
pub struct ValuationFailure {
    pub security: String,
    pub error: AnalysisError,
}

#[derive(Debug, Default)]
pub struct ValuationReport {
    pub rows: Vec<ValuationOutput>,
    pub failures: Vec<ValuationFailure>,
}

/// Value every input, joining `current_prices` by security name.
///
/// The price join is a left join: a security without a price still gets a
/// row, with `None` in the price-derived columns. A security whose model
/// fails is reported in `failures` and the remaining securities are still
/// valued.
pub fn perform_valuation(
    global: &GlobalParams,
    inputs: &[ValuationInput],
    current_prices: &HashMap<String, f64>,
) -> ValuationReport {
    let mut report = ValuationReport::default();

    for input in inputs {
        let price = current_prices.get(&input.security).copied();
        if price.is_none() {
            warn!("No current price for {}", input.security);
        }

        match value_security(global, input, price) {
            Ok(row) => report.rows.push(row),
            Err(error) => {
                warn!("Valuation failed for {}: {}", input.security, error);
                report.failures.push(ValuationFailure {
                    security: input.security.clone(),
                    error,
                });
            }
        }
    }

    info!(
        "Valued {} securities ({} failed)",
        report.rows.len(),
        report.failures.len()
    );
    report
}

fn value_security(
    global: &GlobalParams,
    input: &ValuationInput,
    price: Option<f64>,
) -> Result<ValuationOutput, AnalysisError> {
    let a = &input.assumptions;
    let unstable_growth = a.unstable_growth_pct / 100.0;
    let unstable_margin = a.unstable_margin_pct / 100.0;
    let rapid_growth = a.rapid_growth_pct / 100.0;

    let result = two_phase_model(
        global,
        a.init_rps,
        a.unstable_years,
        unstable_growth,
        unstable_margin,
        rapid_growth,
    )?;

    let (margin_of_safety_pct, implied_entry_pe) = match price {
        Some(price) => {
            let margin = margin_of_safety_pct(result.fair_value, price)?;
            let initial_eps =
                result.unstable_eps / (1.0 + rapid_growth).powi(a.unstable_years as i32);
            let pe = implied_entry_pe(price, initial_eps)?;
            (Some(margin), Some(pe))
        }
        None => (None, None),
    };

    Ok(ValuationOutput {
        security: input.security.clone(),
        init_rps: a.init_rps,
        unstable_years: a.unstable_years,
        unstable_growth_pct: a.unstable_growth_pct,
        unstable_margin_pct: a.unstable_margin_pct,
        unstable_eps: result.unstable_eps,
        rapid_growth_pct: a.rapid_growth_pct,
        rapid_years: result.rapid_years,
        rapid_eps: result.rapid_eps,
        fair_value: result.fair_value,
        current_price: price,
        margin_of_safety_pct,
        implied_entry_pe,
    })
}

/// `(fair_value - price) / fair_value * 100`
pub fn margin_of_safety_pct(fair_value: f64, price: f64) -> Result<f64, AnalysisError> {
    if fair_value == 0.0 {
        return Err(AnalysisError::NumericFault(
            "margin of safety is undefined for a zero fair value".to_string(),
        ));
    }
    Ok((fair_value - price) / fair_value * 100.0)
}

/// Price over the initial-year EPS equivalent
fn implied_entry_pe(price: f64, initial_eps: f64) -> Result<f64, AnalysisError> {
    let pe = price / initial_eps;
    if !pe.is_finite() {
        return Err(AnalysisError::NumericFault(format!(
            "implied P/E is undefined for initial EPS {}",
            initial_eps
        )));
    }
    Ok(pe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let rel = ((actual - expected) / expected).abs();
        assert!(rel < 1e-9, "expected {expected}, got {actual}");
    }

    fn mature(security: &str, init_rps: f64, margin_pct: f64, growth_pct: f64) -> ValuationInput {
        ValuationInput {
            security: security.to_string(),
            assumptions: GrowthAssumptions {
                init_rps,
                unstable_years: 0,
                unstable_growth_pct: 0.0,
                unstable_margin_pct: margin_pct,
                rapid_growth_pct: growth_pct,
            },
        }
    }

    fn global() -> GlobalParams {
        GlobalParams {
            total_growth_years: 5,
            terminal_years: 10,
            terminal_growth: 0.0,
            discount_rate: 0.1,
        }
    }

    #[test]
    fn test_percentages_are_converted_to_fractions() {
        let inputs = vec![mature("Tencent", 10.0, 10.0, 0.0)];
        let prices = HashMap::from([("Tencent".to_string(), 2.0)]);
        let report = perform_valuation(&global(), &inputs, &prices);

        assert!(report.failures.is_empty());
        let row = &report.rows[0];
        assert_close(row.unstable_eps, 1.0);
        assert_close(row.rapid_eps, 1.0);
        assert_eq!(row.rapid_years, 5);
        let expected: f64 = (6..=15).map(|k| 1.1f64.powi(-k)).sum();
        assert_close(row.fair_value, expected);
        // Mature company: initial EPS equals unstable EPS
        assert_close(row.implied_entry_pe.unwrap(), 2.0);
        assert_eq!(row.unstable_margin_pct, 10.0);
    }

    #[test]
    fn test_margin_of_safety_sign() {
        assert!(margin_of_safety_pct(10.0, 8.0).unwrap() > 0.0);
        assert_eq!(margin_of_safety_pct(10.0, 10.0).unwrap(), 0.0);
        assert!(margin_of_safety_pct(10.0, 12.0).unwrap() < 0.0);
        assert_close(margin_of_safety_pct(10.0, 8.0).unwrap(), 20.0);
        assert!(matches!(
            margin_of_safety_pct(0.0, 1.0),
            Err(AnalysisError::NumericFault(_))
        ));
    }

    #[test]
    fn test_initial_eps_back_discounts_unstable_phase() {
        let input = ValuationInput {
            security: "Kuaishou".to_string(),
            assumptions: GrowthAssumptions {
                init_rps: 30.0,
                unstable_years: 2,
                unstable_growth_pct: 20.0,
                unstable_margin_pct: 10.0,
                rapid_growth_pct: 10.0,
            },
        };
        let prices = HashMap::from([("Kuaishou".to_string(), 50.0)]);
        let report = perform_valuation(&global(), &[input], &prices);
        let row = &report.rows[0];

        let unstable_eps = 30.0 * 1.2f64.powi(2) * 0.1;
        assert_close(row.unstable_eps, unstable_eps);
        assert_eq!(row.rapid_years, 3);
        let initial_eps = unstable_eps / 1.1f64.powi(2);
        assert_close(row.implied_entry_pe.unwrap(), 50.0 / initial_eps);
    }

    #[test]
    fn test_missing_price_yields_explicit_none() {
        let inputs = vec![mature("Apple", 25.0, 25.0, 8.0)];
        let report = perform_valuation(&global(), &inputs, &HashMap::new());

        assert!(report.failures.is_empty());
        let row = &report.rows[0];
        assert!(row.fair_value > 0.0);
        assert_eq!(row.current_price, None);
        assert_eq!(row.margin_of_safety_pct, None);
        assert_eq!(row.implied_entry_pe, None);
    }

    #[test]
    fn test_failure_is_isolated_to_one_security() {
        let mut bad = mature("Broken", 10.0, 10.0, 5.0);
        bad.assumptions.unstable_years = 9;
        let inputs = vec![
            mature("Tencent", 10.0, 10.0, 5.0),
            bad,
            mature("Meituan", 20.0, 5.0, 15.0),
        ];
        let prices = HashMap::from([
            ("Tencent".to_string(), 5.0),
            ("Broken".to_string(), 5.0),
            ("Meituan".to_string(), 5.0),
        ]);
        let report = perform_valuation(&global(), &inputs, &prices);

        let names: Vec<_> = report.rows.iter().map(|r| r.security.as_str()).collect();
        assert_eq!(names, vec!["Tencent", "Meituan"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].security, "Broken");
        assert!(matches!(
            report.failures[0].error,
            AnalysisError::InvalidParameter(_)
        ));
    }

    #[test]
    fn test_zero_margin_with_price_is_numeric_fault() {
        let inputs = vec![mature("Zero", 10.0, 0.0, 5.0)];
        let prices = HashMap::from([("Zero".to_string(), 5.0)]);
        let report = perform_valuation(&global(), &inputs, &prices);
        assert!(report.rows.is_empty());
        assert!(matches!(
            report.failures[0].error,
            AnalysisError::NumericFault(_)
        ));
    }
}
