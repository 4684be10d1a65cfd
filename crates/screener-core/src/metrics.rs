//! Pure metric derivation from a fundamentals snapshot.
//!
//! [`derive`] maps a [`RawSnapshot`] to a [`DerivedMetrics`] record. It
//! performs no I/O and never fails as a whole: any unusable input degrades
//! the specific field to a [`MetricGap`] and the remaining fields are still
//! computed.
//!
//! Growth handling follows one policy across all three growth metrics: the
//! standard ratio `(current/prior) - 1` when the prior value is positive, and
//! a linear-extrapolation substitute when the prior value is non-positive
//! (a percentage-based rate is undefined against a negative or zero base).
//! The long-term substitute attributes the EPS delta per year over the
//! three-year window; the single-period substitutes use the full delta.

use crate::types::{DerivedMetrics, IncomePeriod, MetricGap, MetricResult, RawSnapshot};

/// Annual periods needed for the long-term growth window.
const LONG_TERM_YEARS: u32 = 3;

/// Quarterly period offset for the same quarter one year earlier.
const YOY_QUARTER_OFFSET: usize = 4;

/// Compound annual growth rate between two values over `years` years.
///
/// Defined only for a positive starting value; returns `None` otherwise.
/// A negative ending value has no real fractional root, so the non-finite
/// power result is rejected rather than propagated.
#[must_use]
pub fn cagr(start: f64, end: f64, years: u32) -> Option<f64> {
    if start <= 0.0 || years == 0 {
        return None;
    }
    let rate = (end / start).powf(1.0 / f64::from(years)) - 1.0;
    rate.is_finite().then_some(rate)
}

/// Rounds to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Diluted EPS at a period offset (0 = most recent).
fn diluted_eps(periods: &[IncomePeriod], offset: usize) -> MetricResult {
    periods
        .get(offset)
        .and_then(|p| p.diluted_eps)
        .ok_or(MetricGap::MissingField)
}

/// Single-period growth in percent: standard ratio against a positive prior,
/// linear-extrapolation substitute against a non-positive prior.
fn growth_pct(prior: MetricResult, current: MetricResult) -> MetricResult {
    let prior = prior?;
    let current = current?;
    if prior > 0.0 {
        Ok(round2((current / prior - 1.0) * 100.0))
    } else if current != 0.0 {
        Ok(round2(((current + (current - prior)) / current - 1.0) * 100.0))
    } else {
        Err(MetricGap::Degenerate)
    }
}

/// Long-term growth in percent: 3-year EPS CAGR against a positive base,
/// per-year linear-extrapolation substitute against a non-positive base.
fn long_term_growth_pct(base: MetricResult, current: MetricResult) -> MetricResult {
    let base = base?;
    let current = current?;
    if base > 0.0 {
        cagr(base, current, LONG_TERM_YEARS)
            .map(|rate| round2(rate * 100.0))
            .ok_or(MetricGap::Degenerate)
    } else if current != 0.0 {
        let extrapolated =
            (current + (current - base) / f64::from(LONG_TERM_YEARS)) / current - 1.0;
        Ok(round2(extrapolated * 100.0))
    } else {
        Err(MetricGap::Degenerate)
    }
}

/// Net liquidity (cash and short-term investments minus long-term debt) per
/// outstanding share.
fn net_liquidity_per_share(snapshot: &RawSnapshot) -> MetricResult {
    let latest = snapshot
        .balance_sheet
        .first()
        .ok_or(MetricGap::MissingField)?;

    // Combined line preferred; reconstructed from the component lines when
    // the source reports them separately.
    let cash = match latest.cash_and_short_term_investments {
        Some(v) => v,
        None => {
            let equivalents = latest.cash_and_equivalents.ok_or(MetricGap::MissingField)?;
            let short_term = latest
                .other_short_term_investments
                .ok_or(MetricGap::MissingField)?;
            equivalents + short_term
        }
    };

    // Most recent long-term debt, falling back one period before giving up.
    let debt = latest
        .long_term_debt
        .or_else(|| {
            snapshot
                .balance_sheet
                .get(1)
                .and_then(|p| p.long_term_debt)
        })
        .ok_or(MetricGap::MissingField)?;

    let shares = snapshot
        .profile
        .shares_outstanding
        .ok_or(MetricGap::MissingField)?;
    if shares == 0.0 {
        return Err(MetricGap::Degenerate);
    }

    Ok(round2((cash - debt) / shares))
}

/// Liquidity-adjusted P/E: `(price - net liquidity per share) / trailing EPS`.
fn adjusted_kgv(snapshot: &RawSnapshot) -> MetricResult {
    let price = snapshot
        .profile
        .current_price
        .ok_or(MetricGap::MissingField)?;
    let eps = snapshot
        .profile
        .trailing_eps
        .ok_or(MetricGap::MissingField)?;
    let net_liquidity = net_liquidity_per_share(snapshot)?;
    if eps == 0.0 {
        return Err(MetricGap::Degenerate);
    }
    Ok(round2((price - net_liquidity) / eps))
}

/// PEG ratio: the provider-supplied trailing figure when present, otherwise
/// trailing P/E over fiscal-year growth percent.
fn peg_ratio(trailing_peg: Option<f64>, kgv: MetricResult, gw_fy: MetricResult) -> MetricResult {
    if let Some(peg) = trailing_peg {
        return Ok(round2(peg));
    }
    let kgv = kgv?;
    let growth = gw_fy?;
    if growth == 0.0 {
        return Err(MetricGap::Degenerate);
    }
    Ok(round2(kgv / growth))
}

/// Growth percent over trailing P/E.
fn growth_over_kgv(growth: MetricResult, kgv: MetricResult) -> MetricResult {
    let growth = growth?;
    let kgv = kgv?;
    if kgv == 0.0 {
        return Err(MetricGap::Degenerate);
    }
    Ok(round2(growth / kgv))
}

/// Dividend-adjusted growth percent over trailing P/E. Without a dividend
/// rate this degrades to the plain growth-over-P/E ratio.
fn adjusted_growth_over_kgv(
    growth: MetricResult,
    dividend_rate: Option<f64>,
    kgv: MetricResult,
) -> MetricResult {
    let growth = growth?;
    let kgv = kgv?;
    if kgv == 0.0 {
        return Err(MetricGap::Degenerate);
    }
    Ok(round2((growth + dividend_rate.unwrap_or(0.0)) / kgv))
}

/// Derives the full metric record from a snapshot.
#[must_use]
pub fn derive(snapshot: &RawSnapshot) -> DerivedMetrics {
    let profile = &snapshot.profile;
    let kgv: MetricResult = profile.trailing_pe.ok_or(MetricGap::MissingField);

    let eps_fy = diluted_eps(&snapshot.income_annual, 0);
    let eps_1y = diluted_eps(&snapshot.income_annual, 1);
    let eps_3y = diluted_eps(&snapshot.income_annual, LONG_TERM_YEARS as usize);
    let eps_current_quarter = diluted_eps(&snapshot.income_quarterly, 0);
    let eps_yoy_quarter = diluted_eps(&snapshot.income_quarterly, YOY_QUARTER_OFFSET);

    let gw_fy = growth_pct(eps_1y, eps_fy);
    let gw_yoy = growth_pct(eps_yoy_quarter, eps_current_quarter);
    let long_gw = long_term_growth_pct(eps_3y, eps_fy);

    let peg = peg_ratio(profile.trailing_peg, kgv, gw_fy);

    DerivedMetrics {
        kgv,
        kgv_adj: adjusted_kgv(snapshot),
        gw_yoy,
        gw_fy,
        long_gw,
        peg,
        dividend_rate: profile.dividend_rate,
        gw_kgv_yoy: growth_over_kgv(gw_yoy, kgv),
        gw_kgv_fy: growth_over_kgv(gw_fy, kgv),
        gw_kgv_long: growth_over_kgv(long_gw, kgv),
        kgv_pro_yoy: adjusted_growth_over_kgv(gw_yoy, profile.dividend_rate, kgv),
        kgv_pro_fy: adjusted_growth_over_kgv(gw_fy, profile.dividend_rate, kgv),
        kgv_pro_long: adjusted_growth_over_kgv(long_gw, profile.dividend_rate, kgv),
    }
}
