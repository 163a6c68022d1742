// Report normalization - HK and US report shapes into one quarter-indexed table

pub mod hk;
pub mod table;
pub mod us;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::AnalysisError;
use crate::provider::{self, ReportSource};

pub use hk::normalize_hk_report;
pub use table::{FinancialField, FinancialRecord, FinancialTable};
pub use us::normalize_us_report;

/// Records resolving to a year before this are discarded
pub const CUTOFF_YEAR: i32 = 2022;

/// Exchange a ticker is listed on, derived from its suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// `.HK` tickers: cumulative year-to-date main indicators
    HongKong,
    /// `.O` tickers: item-coded income statement plus a market snapshot
    Us,
}

impl Market {
    pub fn from_ticker(ticker: &str) -> Result<Self, AnalysisError> {
        let upper = ticker.trim().to_ascii_uppercase();
        if upper.ends_with(".HK") {
            Ok(Market::HongKong)
        } else if upper.ends_with(".O") {
            Ok(Market::Us)
        } else {
            Err(AnalysisError::UnsupportedMarket(ticker.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::HongKong => "HK",
            Market::Us => "US",
        }
    }
}

/// Provider response envelope: `{"result": {"data": [...]}}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<ResultData<T>>,
}

#[derive(Debug, Deserialize)]
struct ResultData<T> {
    data: Vec<T>,
}

/// Decode the record list of a provider payload.
///
/// The provider answers a query with no rows using `"result": null`; that is
/// an empty list, not an error.
pub(crate) fn parse_records<T>(raw_payload: &[u8]) -> Result<Vec<T>, AnalysisError>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: Envelope<T> = serde_json::from_slice(raw_payload)?;
    Ok(envelope.result.map(|r| r.data).unwrap_or_default())
}

/// Required key whose value may be `null`.
///
/// A plain `Option` field would silently accept a missing key.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Fetch and normalize the report for `ticker`.
///
/// HK tickers need one request; US tickers need the income statement and a
/// separate market snapshot, merged by [`normalize_us_report`].
pub fn normalize_report(
    ticker: &str,
    source: &dyn ReportSource,
) -> Result<FinancialTable, AnalysisError> {
    let market = Market::from_ticker(ticker)?;
    info!("Fetching {} report for {}", market.as_str(), ticker);

    let table = match market {
        Market::HongKong => {
            let raw = source.fetch(&provider::hk_main_indicator_url(ticker))?;
            normalize_hk_report(&raw)?
        }
        Market::Us => {
            let income = source.fetch(&provider::us_income_url(ticker))?;
            let snapshot = source.fetch(&provider::us_main_indicator_url(ticker))?;
            normalize_us_report(&income, &snapshot)?
        }
    };

    info!("Normalized {} quarters for {}", table.len(), ticker);
    Ok(table)
}
