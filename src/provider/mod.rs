// Provider module - East Money datacenter report client

mod eastmoney;

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::AnalysisError;

pub use eastmoney::{hk_main_indicator_url, us_income_url, us_main_indicator_url};

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Source of raw report bytes.
///
/// Implemented over HTTP by [`HttpReportSource`]; tests substitute canned
/// payloads.
pub trait ReportSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AnalysisError>;
}

/// Blocking HTTP report source with a fixed timeout. No retries.
pub struct HttpReportSource {
    client: Client,
}

impl HttpReportSource {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ValueAnalysis/0.1)")
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl ReportSource for HttpReportSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AnalysisError> {
        debug!("GET {}", url);

        let fetch_error = |reason: String| AnalysisError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("status {}", status)));
        }

        let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn should_skip_online_tests() -> bool {
        std::env::var("VALUE_ANALYSIS_SKIP_ONLINE_TESTS")
            .map(|v| v != "0")
            .unwrap_or(false)
    }

    #[test]
    fn test_unreachable_host_is_fetch_error() {
        let source = HttpReportSource::new(Duration::from_millis(500)).unwrap();
        let err = source.fetch("http://127.0.0.1:9/report").unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch { ref url, .. } if url.contains("127.0.0.1")));
    }

    #[test]
    fn test_fetch_hk_report() {
        if should_skip_online_tests() {
            return;
        }

        let source = HttpReportSource::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).unwrap();
        let table = match crate::report::normalize_report("00700.HK", &source) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Skipping HK report fetch test: {}", e);
                return;
            }
        };
        println!("00700.HK quarters: {}", table.len());
    }
}
