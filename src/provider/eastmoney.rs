//! Report URLs of the East Money securities datacenter

const DATACENTER_BASE_URL: &str = "https://datacenter.eastmoney.com/securities/api/data/v1/get";

fn security_filter(ticker: &str) -> String {
    format!(
        "(SECUCODE%3D%22{}%22)",
        ticker.trim().to_ascii_uppercase()
    )
}

/// HK main indicators, latest 9 reports, cumulative year-to-date figures
pub fn hk_main_indicator_url(ticker: &str) -> String {
    format!(
        "{}?reportName=RPT_HKF10_FN_MAININDICATOR&columns=ALL&quoteColumns=&filter={}&pageNumber=1&pageSize=9&sortTypes=-1&sortColumns=STD_REPORT_DATE&source=F10",
        DATACENTER_BASE_URL,
        security_filter(ticker)
    )
}

/// US income statement, one row per (report, item code)
pub fn us_income_url(ticker: &str) -> String {
    format!(
        "{}?reportName=RPT_USF10_FN_INCOME&columns=SECUCODE%2CSECURITY_CODE%2CSECURITY_NAME_ABBR%2CREPORT%2CREPORT_DATE%2CSTD_ITEM_CODE%2CAMOUNT&quoteColumns=&filter={}&pageNumber=1&pageSize=&sortTypes=1%2C-1&sortColumns=STD_ITEM_CODE%2CREPORT_DATE&source=SECURITIES",
        DATACENTER_BASE_URL,
        security_filter(ticker)
    )
}

/// US main indicators; only the latest row's market data is used
pub fn us_main_indicator_url(ticker: &str) -> String {
    format!(
        "{}?reportName=RPT_USF10_DATA_MAININDICATOR&columns=ALL&quoteColumns=&filter={}&pageNumber=1&pageSize=200&sortTypes=-1&sortColumns=REPORT_DATE&source=F10",
        DATACENTER_BASE_URL,
        security_filter(ticker)
    )
}
