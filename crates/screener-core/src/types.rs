//! Core data types for the fundamentals screener.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`RawSnapshot`] - Per-ticker fundamentals bundle fetched in one round
//! - [`CachedSnapshot`] - A snapshot plus its fetch timestamp
//! - [`DerivedMetrics`] - Computed valuation/growth metrics
//! - [`GradeSheet`] - Ordinal grades per scored metric plus the composite
//! - [`ScreenResult`] - One output row of the ranked table

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation, so cache keys and
/// provider requests always use the canonical form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Flat per-company profile fields as reported by the provider.
///
/// Every field is optional; providers fill in whatever the upstream source
/// carries for the symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Current market price per share.
    pub current_price: Option<f64>,
    /// Trailing twelve-month diluted earnings per share.
    pub trailing_eps: Option<f64>,
    /// Trailing price-to-earnings ratio.
    pub trailing_pe: Option<f64>,
    /// Annual dividend rate per share.
    pub dividend_rate: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
    /// Trailing PEG ratio, if the source computes one.
    pub trailing_peg: Option<f64>,
}

/// One income-statement reporting period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncomePeriod {
    /// End date of the reporting period.
    pub period_end: NaiveDate,
    /// Net income.
    pub net_income: Option<f64>,
    /// Diluted earnings per share.
    pub diluted_eps: Option<f64>,
}

impl IncomePeriod {
    /// Creates a new income period with required fields.
    #[must_use]
    pub const fn new(period_end: NaiveDate) -> Self {
        Self {
            period_end,
            net_income: None,
            diluted_eps: None,
        }
    }

    /// Sets the diluted EPS.
    #[must_use]
    pub const fn with_diluted_eps(mut self, eps: f64) -> Self {
        self.diluted_eps = Some(eps);
        self
    }
}

/// One balance-sheet reporting period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancePeriod {
    /// End date of the reporting period.
    pub period_end: Option<NaiveDate>,
    /// Combined cash, cash equivalents and short-term investments line.
    pub cash_and_short_term_investments: Option<f64>,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Option<f64>,
    /// Other short-term investments.
    pub other_short_term_investments: Option<f64>,
    /// Long-term debt.
    pub long_term_debt: Option<f64>,
}

/// Forward-looking consensus estimates.
///
/// Fetched as part of the snapshot so every metric derivation works from one
/// temporally consistent bundle, even though the current metric set does not
/// consume them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEstimates {
    /// Consensus EPS estimate for the current fiscal year.
    pub eps_current_year: Option<f64>,
    /// Consensus EPS estimate for the next fiscal year.
    pub eps_next_year: Option<f64>,
    /// Consensus earnings growth for the current fiscal year (fraction).
    pub growth_current_year: Option<f64>,
    /// Consensus earnings growth for the next fiscal year (fraction).
    pub growth_next_year: Option<f64>,
}

/// Immutable per-ticker fundamentals bundle fetched at one point in time.
///
/// Statement sequences are ordered most-recent-first. A snapshot is created
/// once per fetch and never mutated; a refresh produces a whole new snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Symbol this snapshot belongs to.
    pub symbol: Symbol,
    /// Flat profile fields.
    pub profile: CompanyProfile,
    /// Annual income-statement periods, most recent first.
    pub income_annual: Vec<IncomePeriod>,
    /// Quarterly income-statement periods, most recent first.
    pub income_quarterly: Vec<IncomePeriod>,
    /// Balance-sheet periods, most recent first.
    pub balance_sheet: Vec<BalancePeriod>,
    /// Forward-looking consensus estimates.
    pub estimates: ConsensusEstimates,
}

impl RawSnapshot {
    /// Creates an empty snapshot for a symbol.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            profile: CompanyProfile::default(),
            income_annual: Vec::new(),
            income_quarterly: Vec::new(),
            balance_sheet: Vec::new(),
            estimates: ConsensusEstimates::default(),
        }
    }
}

/// A cached snapshot together with the time it was fetched.
///
/// Entries are superseded whole on refresh, never partially updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    /// The snapshot payload.
    pub snapshot: RawSnapshot,
    /// When the snapshot was fetched from the provider.
    pub fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    /// Wraps a snapshot with the current time as its fetch timestamp.
    #[must_use]
    pub fn new(snapshot: RawSnapshot) -> Self {
        Self {
            snapshot,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true if the entry is older than `ttl`.
    #[must_use]
    pub fn is_stale(&self, ttl: std::time::Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Reason a derived metric could not be computed.
///
/// Absence means "insufficient data", not zero; carrying the reason lets
/// callers and tests distinguish a missing input from a division that would
/// have been undefined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MetricGap {
    /// A required statement line, profile field, or period is absent.
    #[error("required input missing")]
    MissingField,
    /// A denominator was zero or a growth base had no defined fallback.
    #[error("degenerate arithmetic")]
    Degenerate,
}

/// A derived metric: either a value or the reason it is absent.
pub type MetricResult = std::result::Result<f64, MetricGap>;

/// Per-ticker computed metrics.
///
/// Each field is independently a value or a [`MetricGap`]; one unusable input
/// never blocks the other metrics for the same ticker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Trailing price-to-earnings ratio (KGV).
    pub kgv: MetricResult,
    /// Net-liquidity-adjusted price-to-earnings ratio.
    pub kgv_adj: MetricResult,
    /// Year-over-year quarterly EPS growth, percent.
    pub gw_yoy: MetricResult,
    /// Fiscal-year EPS growth, percent.
    pub gw_fy: MetricResult,
    /// 3-year EPS CAGR ("long-term growth"), percent.
    pub long_gw: MetricResult,
    /// PEG ratio.
    pub peg: MetricResult,
    /// Annual dividend rate per share, as reported.
    pub dividend_rate: Option<f64>,
    /// YoY quarterly growth over trailing P/E.
    pub gw_kgv_yoy: MetricResult,
    /// Fiscal-year growth over trailing P/E.
    pub gw_kgv_fy: MetricResult,
    /// Long-term growth over trailing P/E.
    pub gw_kgv_long: MetricResult,
    /// Dividend-adjusted YoY growth over trailing P/E.
    pub kgv_pro_yoy: MetricResult,
    /// Dividend-adjusted fiscal-year growth over trailing P/E.
    pub kgv_pro_fy: MetricResult,
    /// Dividend-adjusted long-term growth over trailing P/E.
    pub kgv_pro_long: MetricResult,
}

/// Ordinal grades (1 = best, 6 = worst) for the seven scored metrics, plus
/// the averaged composite grade.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeSheet {
    /// Grade for YoY growth over P/E.
    pub gw_kgv_yoy: Option<u8>,
    /// Grade for fiscal-year growth over P/E.
    pub gw_kgv_fy: Option<u8>,
    /// Grade for long-term growth over P/E.
    pub gw_kgv_long: Option<u8>,
    /// Grade for dividend-adjusted YoY growth over P/E.
    pub kgv_pro_yoy: Option<u8>,
    /// Grade for dividend-adjusted fiscal-year growth over P/E.
    pub kgv_pro_fy: Option<u8>,
    /// Grade for dividend-adjusted long-term growth over P/E.
    pub kgv_pro_long: Option<u8>,
    /// Grade for the PEG ratio.
    pub peg: Option<u8>,
    /// Average of the non-null sub-grades, rounded to two decimals.
    /// `None` when no sub-grade is computable.
    pub composite: Option<f64>,
}

impl GradeSheet {
    /// Returns the seven sub-grades in display order.
    #[must_use]
    pub const fn sub_grades(&self) -> [Option<u8>; 7] {
        [
            self.gw_kgv_yoy,
            self.gw_kgv_fy,
            self.gw_kgv_long,
            self.kgv_pro_yoy,
            self.kgv_pro_fy,
            self.kgv_pro_long,
            self.peg,
        ]
    }
}

/// One row of the ranked output table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenResult {
    /// The screened symbol.
    pub symbol: Symbol,
    /// Derived metrics for the symbol.
    pub metrics: DerivedMetrics,
    /// Grades for the scored metrics.
    pub grades: GradeSheet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_uppercases() {
        assert_eq!(Symbol::new("aapl").as_str(), "AAPL");
        assert_eq!("msft".parse::<Symbol>().unwrap().as_str(), "MSFT");
    }

    #[test]
    fn cached_snapshot_staleness() {
        let entry = CachedSnapshot::new(RawSnapshot::new(Symbol::new("NVDA")));
        assert!(!entry.is_stale(std::time::Duration::from_secs(60)));
        assert!(entry.is_stale(std::time::Duration::ZERO));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut snapshot = RawSnapshot::new(Symbol::new("TSM"));
        snapshot.profile.trailing_pe = Some(20.0);
        snapshot.income_annual.push(
            IncomePeriod::new(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
                .with_diluted_eps(2.0),
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RawSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
