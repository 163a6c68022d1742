use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Horizon and discounting shared by every security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParams {
    /// Years of explicit growth (unstable + rapid phases)
    pub total_growth_years: u32,
    /// Length of the terminal annuity
    pub terminal_years: u32,
    /// Terminal growth rate as a fraction
    pub terminal_growth: f64,
    /// Discount rate as a fraction
    pub discount_rate: f64,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            total_growth_years: 10,
            terminal_years: 10,
            terminal_growth: 0.03,
            discount_rate: 0.10,
        }
    }
}

/// Intermediate and final figures of [`two_phase_model`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPhaseResult {
    pub unstable_eps: f64,
    pub rapid_years: u32,
    pub rapid_eps: f64,
    pub fair_value: f64,
}

/// Generalized two-phase growth model.
///
/// 1. Unstable phase: revenue per share compounds for `unstable_years` at
///    `unstable_growth`, then `unstable_margin` turns it into EPS.
/// 2. Rapid phase: EPS compounds at `rapid_growth` for the remaining
///    `total_growth_years - unstable_years` years.
/// 3. Fair value: present value of a `terminal_years` annuity growing at
///    `terminal_growth`, starting after the growth horizon. Earnings inside the
///    growth horizon are not counted; they are assumed to be reinvested.
///
/// All rates are fractions. Fails with `InvalidParameter` when the unstable
/// phase outlasts the growth horizon or a year count does not fit an `i32`
/// exponent, and with `NumericFault` when
/// `terminal_growth == discount_rate` or the result is not finite.
pub fn two_phase_model(
    global: &GlobalParams,
    init_rps: f64,
    unstable_years: u32,
    unstable_growth: f64,
    unstable_margin: f64,
    rapid_growth: f64,
) -> Result<TwoPhaseResult, AnalysisError> {
    let total_years = years_exponent(global.total_growth_years, "total_growth_years")?;
    let terminal_years = years_exponent(global.terminal_years, "terminal_years")?;

    let rapid_years = global
        .total_growth_years
        .checked_sub(unstable_years)
        .ok_or_else(|| {
            AnalysisError::InvalidParameter(format!(
                "unstable phase ({} years) exceeds total growth horizon ({} years)",
                unstable_years, global.total_growth_years
            ))
        })?;

    // Both fit in i32 because they are bounded by total_growth_years
    let unstable_eps =
        init_rps * (1.0 + unstable_growth).powi(unstable_years as i32) * unstable_margin;
    let rapid_eps = unstable_eps * (1.0 + rapid_growth).powi(rapid_years as i32);

    let q = (1.0 + global.terminal_growth) / (1.0 + global.discount_rate);
    if q == 1.0 {
        return Err(AnalysisError::NumericFault(format!(
            "terminal growth {} equals discount rate {}",
            global.terminal_growth, global.discount_rate
        )));
    }
    let denominator = (1.0 - q) * (1.0 + global.discount_rate).powi(total_years);
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(AnalysisError::NumericFault(format!(
            "discount factor over {} years is not representable",
            global.total_growth_years
        )));
    }

    let fair_value = rapid_eps * q * (1.0 - q.powi(terminal_years)) / denominator;
    if !fair_value.is_finite() {
        return Err(AnalysisError::NumericFault(format!(
            "fair value is not finite ({})",
            fair_value
        )));
    }

    Ok(TwoPhaseResult {
        unstable_eps,
        rapid_years,
        rapid_eps,
        fair_value,
    })
}

/// Year count as a `powi` exponent
pub(crate) fn years_exponent(years: u32, name: &str) -> Result<i32, AnalysisError> {
    i32::try_from(years).map_err(|_| {
        AnalysisError::InvalidParameter(format!("{} is too large: {}", name, years))
    })
}
