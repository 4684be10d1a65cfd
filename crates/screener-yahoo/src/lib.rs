#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lynchlab/screener/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance snapshot provider.
//!
//! This crate implements the [`SnapshotProvider`] trait against Yahoo
//! Finance's quoteSummary API. One request per ticker pulls every module the
//! metric derivation needs (profile figures, annual and quarterly income
//! statements, balance sheet, earnings trend), so the resulting
//! [`RawSnapshot`] is a single temporally consistent bundle.
//!
//! # Example
//!
//! ```no_run
//! use screener_yahoo::YahooProvider;
//! use screener_core::{SnapshotProvider, Symbol};
//!
//! # async fn example() -> screener_core::Result<()> {
//! let provider = YahooProvider::new();
//! let snapshot = provider.fetch(&Symbol::new("AAPL")).await?;
//! println!("trailing P/E: {:?}", snapshot.profile.trailing_pe);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use screener_core::{
    BalancePeriod, CompanyProfile, ConsensusEstimates, IncomePeriod, RawSnapshot, Result,
    ScreenerError, SnapshotProvider, Symbol,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Modules requested per snapshot; one round fetches everything.
const MODULES: &str = "price,summaryDetail,defaultKeyStatistics,incomeStatementHistory,\
incomeStatementHistoryQuarterly,balanceSheetHistory,earningsTrend";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance snapshot provider.
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// The HTTP client carries a 30 second request timeout; expiry surfaces
    /// as [`ScreenerError::Network`].
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the quoteSummary URL for a symbol.
    fn build_url(&self, symbol: &Symbol) -> String {
        format!("{}/{}?modules={}", QUOTE_SUMMARY_URL, symbol.as_str(), MODULES)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<RawSnapshot> {
        let url = self.build_url(symbol);
        debug!("Fetching snapshot: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScreenerError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScreenerError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ScreenerError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(ScreenerError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        let summary: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| ScreenerError::Parse(e.to_string()))?;

        if let Some(error) = summary.quote_summary.error {
            return Err(ScreenerError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        let data = summary
            .quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::SymbolNotFound(symbol.to_string()))?;

        Ok(snapshot_from_summary(symbol, data))
    }
}

/// Resolve the loosely structured quoteSummary payload into a structured
/// snapshot, once, at the provider boundary.
fn snapshot_from_summary(symbol: &Symbol, data: QuoteSummaryData) -> RawSnapshot {
    let price = data.price.unwrap_or_default();
    let detail = data.summary_detail.unwrap_or_default();
    let statistics = data.default_key_statistics.unwrap_or_default();

    let profile = CompanyProfile {
        current_price: raw(&price.regular_market_price),
        trailing_eps: raw(&statistics.trailing_eps),
        trailing_pe: raw(&detail.trailing_pe),
        dividend_rate: raw(&detail.dividend_rate),
        shares_outstanding: raw(&statistics.shares_outstanding),
        trailing_peg: raw(&statistics.peg_ratio),
    };

    let income_annual = data
        .income_statement_history
        .map(|h| income_periods(h.income_statement_history))
        .unwrap_or_default();
    let income_quarterly = data
        .income_statement_history_quarterly
        .map(|h| income_periods(h.income_statement_history))
        .unwrap_or_default();

    let balance_sheet = data
        .balance_sheet_history
        .map(|h| {
            h.balance_sheet_statements
                .into_iter()
                .map(|entry| BalancePeriod {
                    period_end: end_date(&entry.end_date),
                    cash_and_short_term_investments: raw(
                        &entry.cash_and_short_term_investments,
                    ),
                    cash_and_equivalents: raw(&entry.cash),
                    other_short_term_investments: raw(&entry.short_term_investments),
                    long_term_debt: raw(&entry.long_term_debt),
                })
                .collect()
        })
        .unwrap_or_default();

    let mut estimates = ConsensusEstimates::default();
    if let Some(trend) = data.earnings_trend {
        for entry in trend.trend {
            let eps = entry
                .earnings_estimate
                .as_ref()
                .and_then(|e| raw(&e.avg));
            match entry.period.as_deref() {
                Some("0y") => {
                    estimates.eps_current_year = eps;
                    estimates.growth_current_year = raw(&entry.growth);
                }
                Some("+1y") => {
                    estimates.eps_next_year = eps;
                    estimates.growth_next_year = raw(&entry.growth);
                }
                _ => {}
            }
        }
    }

    RawSnapshot {
        symbol: symbol.clone(),
        profile,
        income_annual,
        income_quarterly,
        balance_sheet,
        estimates,
    }
}

/// Income-statement entries arrive most-recent-first; missing period-end
/// timestamps drop the row rather than inventing a date.
fn income_periods(entries: Vec<IncomeStatementEntry>) -> Vec<IncomePeriod> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let period_end = end_date(&entry.end_date)?;
            Some(IncomePeriod {
                period_end,
                net_income: raw(&entry.net_income),
                diluted_eps: raw(&entry.diluted_eps),
            })
        })
        .collect()
}

/// Unwraps Yahoo's `{raw, fmt}` number envelope.
fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

fn end_date(value: &Option<RawValue>) -> Option<NaiveDate> {
    let ts = raw(value)?;
    DateTime::from_timestamp(ts as i64, 0).map(|dt| dt.date_naive())
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Number envelope used throughout quoteSummary: `{"raw": 1.23, "fmt": "1.23"}`.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(default)]
    result: Vec<QuoteSummaryData>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
    income_statement_history: Option<IncomeStatementHistory>,
    income_statement_history_quarterly: Option<IncomeStatementHistory>,
    balance_sheet_history: Option<BalanceSheetHistory>,
    earnings_trend: Option<EarningsTrend>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_rate: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    trailing_eps: Option<RawValue>,
    shares_outstanding: Option<RawValue>,
    peg_ratio: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementHistory {
    #[serde(default)]
    income_statement_history: Vec<IncomeStatementEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementEntry {
    end_date: Option<RawValue>,
    net_income: Option<RawValue>,
    #[serde(rename = "dilutedEPS")]
    diluted_eps: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetHistory {
    #[serde(default)]
    balance_sheet_statements: Vec<BalanceSheetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetEntry {
    end_date: Option<RawValue>,
    cash_and_short_term_investments: Option<RawValue>,
    cash: Option<RawValue>,
    short_term_investments: Option<RawValue>,
    long_term_debt: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct EarningsTrend {
    #[serde(default)]
    trend: Vec<TrendEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendEntry {
    period: Option<String>,
    growth: Option<RawValue>,
    earnings_estimate: Option<EarningsEstimate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsEstimate {
    avg: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "quoteSummary": {
            "result": [{
                "price": {"regularMarketPrice": {"raw": 40.0, "fmt": "40.00"}},
                "summaryDetail": {
                    "trailingPE": {"raw": 20.0},
                    "dividendRate": {"raw": 0.96}
                },
                "defaultKeyStatistics": {
                    "trailingEps": {"raw": 2.0},
                    "sharesOutstanding": {"raw": 1000000},
                    "pegRatio": {"raw": 1.1}
                },
                "incomeStatementHistory": {
                    "incomeStatementHistory": [
                        {"endDate": {"raw": 1735603200}, "netIncome": {"raw": 2000000}, "dilutedEPS": {"raw": 2.0}},
                        {"endDate": {"raw": 1703980800}, "netIncome": {"raw": 1500000}, "dilutedEPS": {"raw": 1.5}}
                    ]
                },
                "balanceSheetHistory": {
                    "balanceSheetStatements": [
                        {"endDate": {"raw": 1735603200}, "cash": {"raw": 700000}, "shortTermInvestments": {"raw": 300000}, "longTermDebt": {"raw": 400000}}
                    ]
                },
                "earningsTrend": {
                    "trend": [
                        {"period": "0y", "growth": {"raw": 0.25}, "earningsEstimate": {"avg": {"raw": 2.4}}},
                        {"period": "+1y", "growth": {"raw": 0.18}, "earningsEstimate": {"avg": {"raw": 2.8}}}
                    ]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn build_url_requests_all_modules() {
        let provider = YahooProvider::new();
        let url = provider.build_url(&Symbol::new("aapl"));

        assert!(url.contains("/AAPL?"));
        assert!(url.contains("incomeStatementHistoryQuarterly"));
        assert!(url.contains("balanceSheetHistory"));
        assert!(url.contains("earningsTrend"));
    }

    #[test]
    fn provider_name() {
        assert_eq!(YahooProvider::default().name(), "Yahoo Finance");
    }

    #[test]
    fn resolves_summary_into_structured_snapshot() {
        let response: QuoteSummaryResponse = serde_json::from_str(FIXTURE).unwrap();
        let data = response.quote_summary.result.into_iter().next().unwrap();
        let snapshot = snapshot_from_summary(&Symbol::new("ACME"), data);

        assert_eq!(snapshot.profile.current_price, Some(40.0));
        assert_eq!(snapshot.profile.trailing_pe, Some(20.0));
        assert_eq!(snapshot.profile.dividend_rate, Some(0.96));
        assert_eq!(snapshot.profile.trailing_peg, Some(1.1));

        assert_eq!(snapshot.income_annual.len(), 2);
        assert_eq!(snapshot.income_annual[0].diluted_eps, Some(2.0));
        assert_eq!(snapshot.income_annual[1].diluted_eps, Some(1.5));

        let balance = &snapshot.balance_sheet[0];
        assert_eq!(balance.cash_and_short_term_investments, None);
        assert_eq!(balance.cash_and_equivalents, Some(700_000.0));
        assert_eq!(balance.other_short_term_investments, Some(300_000.0));
        assert_eq!(balance.long_term_debt, Some(400_000.0));

        assert_eq!(snapshot.estimates.eps_current_year, Some(2.4));
        assert_eq!(snapshot.estimates.growth_next_year, Some(0.18));
    }

    #[test]
    fn missing_modules_yield_empty_sections() {
        let response: QuoteSummaryResponse =
            serde_json::from_str(r#"{"quoteSummary": {"result": [{}], "error": null}}"#).unwrap();
        let data = response.quote_summary.result.into_iter().next().unwrap();
        let snapshot = snapshot_from_summary(&Symbol::new("VOID"), data);

        assert_eq!(snapshot.profile.trailing_pe, None);
        assert!(snapshot.income_annual.is_empty());
        assert!(snapshot.balance_sheet.is_empty());
    }
}
