//! Input Sanitization
//!
//! Invalid input is normalized, never rejected.
//!
//! Functions:
//! - Grade clamping to the 2..6 exam scale
//! - Score clamping to 0..100
//! - Quarter-point rounding of predicted grades
//! - Unit-interval clamping of normalized sub-scores

use crate::types::{GRADE_MAX, GRADE_MIN, SCORE_MAX, SCORE_MIN};

/// NaN or infinite
pub fn is_invalid(x: f64) -> bool {
    x.is_nan() || x.is_infinite()
}

/// Clamp a grade to [2, 6]; NaN counts as the floor
pub fn clamp_grade(grade: f64) -> f64 {
    if grade.is_nan() {
        return GRADE_MIN;
    }
    grade.clamp(GRADE_MIN, GRADE_MAX)
}

/// Clamp a quiz score to [0, 100]; NaN counts as 0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return SCORE_MIN;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}

/// Clamp to [0, 1]
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Round to the nearest 0.25
pub fn round_to_quarter(x: f64) -> f64 {
    (x * 4.0).round() / 4.0
}

/// Round to two decimals
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Final grade: quarter-point rounding, then clamped to the scale
pub fn finalize_grade(raw: f64) -> f64 {
    if is_invalid(raw) {
        return GRADE_MIN;
    }
    clamp_grade(round_to_quarter(raw))
}

// ==================== Tests ====================
