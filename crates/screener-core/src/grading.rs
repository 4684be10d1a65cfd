//! Threshold-table grading of derived metrics.
//!
//! Two walking policies over ordered `(threshold, grade)` tables:
//!
//! - [`grade_descending`] for the growth-to-valuation ratios: highest
//!   threshold first, first threshold the value meets or exceeds wins.
//! - [`grade_ascending`] for the PEG ratio: lowest threshold first, first
//!   threshold the value is less than or equal to wins.
//!
//! A ratio that could not be computed is fed the [`UNSCORED`] sentinel, which
//! bypasses the descending table and yields no grade at all: absence of data
//! is "unscored", never "worst". The same policy applies to an uncomputable
//! PEG; the composite grade averages only the dimensions that were scored.

use crate::types::{DerivedMetrics, GradeSheet, MetricResult};

/// Threshold table for growth/valuation ratios, highest first.
const RATIO_THRESHOLDS: &[(f64, u8)] = &[(2.0, 1), (1.7, 2), (1.4, 3), (1.2, 4), (0.85, 5)];

/// Threshold table for the PEG ratio, lowest first. A non-positive PEG means
/// negative earnings or negative growth and grades worst immediately.
const PEG_THRESHOLDS: &[(f64, u8)] = &[(0.0, 6), (0.7, 1), (1.0, 2), (1.2, 3), (1.5, 4), (1.8, 5)];

/// Worst grade, assigned when no threshold matches.
const WORST: u8 = 6;

/// Sentinel standing in for an uncomputable ratio; bypasses the descending
/// table entirely.
pub const UNSCORED: f64 = 100.0;

/// Grades a value against the descending ratio table.
///
/// Returns `None` for the exact [`UNSCORED`] sentinel, the grade of the first
/// threshold the value meets or exceeds, or grade 6 if none match.
#[must_use]
pub fn grade_descending(value: f64) -> Option<u8> {
    if value == UNSCORED {
        return None;
    }
    for &(threshold, grade) in RATIO_THRESHOLDS {
        if value >= threshold {
            return Some(grade);
        }
    }
    Some(WORST)
}

/// Grades a value against the ascending PEG table.
///
/// Returns the grade of the first threshold the value is less than or equal
/// to, or grade 6 if none match.
#[must_use]
pub fn grade_ascending(value: f64) -> u8 {
    for &(threshold, grade) in PEG_THRESHOLDS {
        if value <= threshold {
            return grade;
        }
    }
    WORST
}

/// Average of the non-null sub-grades, rounded to two decimals.
///
/// `None` when no sub-grade is computable: a ticker with zero scored
/// dimensions has no composite grade.
#[must_use]
pub fn composite(grades: &[Option<u8>]) -> Option<f64> {
    let scored: Vec<f64> = grades.iter().flatten().map(|&g| f64::from(g)).collect();
    if scored.is_empty() {
        return None;
    }
    let mean = scored.iter().sum::<f64>() / scored.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

fn grade_ratio(metric: MetricResult) -> Option<u8> {
    grade_descending(metric.unwrap_or(UNSCORED))
}

fn grade_peg(metric: MetricResult) -> Option<u8> {
    metric.ok().map(grade_ascending)
}

/// Grades the seven scored dimensions of a metric record and averages them
/// into the composite grade.
#[must_use]
pub fn grade(metrics: &DerivedMetrics) -> GradeSheet {
    let mut sheet = GradeSheet {
        gw_kgv_yoy: grade_ratio(metrics.gw_kgv_yoy),
        gw_kgv_fy: grade_ratio(metrics.gw_kgv_fy),
        gw_kgv_long: grade_ratio(metrics.gw_kgv_long),
        kgv_pro_yoy: grade_ratio(metrics.kgv_pro_yoy),
        kgv_pro_fy: grade_ratio(metrics.kgv_pro_fy),
        kgv_pro_long: grade_ratio(metrics.kgv_pro_long),
        peg: grade_peg(metrics.peg),
        composite: None,
    };
    sheet.composite = composite(&sheet.sub_grades());
    sheet
}
