//! FSRS-lite Spaced-Repetition Estimator
//!
//! A score-driven variant of FSRS. Quiz scores (0..100) are mapped onto the
//! continuous FSRS rating axis `g = 1 + 3 * score / 100` (1 = Again, 4 = Easy),
//! and the standard FSRS stability / difficulty updates are applied:
//!
//! - Retrievability: `R(t) = (1 + F * t / S)^C` with `F = 19/81`, `C = -0.5`
//! - Recall (score >= 60): stability grows, more so when retrievability was low
//! - Lapse (score < 60): stability falls back to the forget-stability curve
//! - Difficulty moves against the rating and mean-reverts toward the default
//!
//! Stability is kept in `[0.1, 36500]` days and difficulty in `[0.1, 1.0]`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{MemoryState, QuizAttempt, SCORE_MAX, SCORE_MIN};

const DECAY: f64 = -0.5;
const FACTOR: f64 = 19.0 / 81.0;

const MIN_STABILITY: f64 = 0.1;
const MAX_STABILITY: f64 = 36500.0;
const MIN_DIFFICULTY: f64 = 0.1;
const MAX_DIFFICULTY: f64 = 1.0;

/// Scores below this count as a failed recall
pub const RECALL_PASS_SCORE: f64 = 60.0;

/// Default retention target for scheduling
pub const DEFAULT_TARGET_RETENTION: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsParams {
    pub w: [f64; 17],
}

impl Default for FsrsParams {
    fn default() -> Self {
        Self {
            w: [
                0.4, 0.6, 2.4, 5.8, // w0-w3: initial stability
                4.93, 0.94, 0.86, 0.01, 1.49, // w4-w8
                0.14, 0.94, 2.18, 0.05, 0.34, // w9-w13
                1.26, 0.29, 2.61, // w14-w16
            ],
        }
    }
}

/// Estimator bound to a parameter set and a retention target
#[derive(Debug, Clone)]
pub struct FsrsLite {
    params: FsrsParams,
    target_retention: f64,
}

impl Default for FsrsLite {
    fn default() -> Self {
        Self::new(FsrsParams::default(), DEFAULT_TARGET_RETENTION)
    }
}

impl FsrsLite {
    pub fn new(params: FsrsParams, target_retention: f64) -> Self {
        Self {
            params,
            target_retention: clamp_retention(target_retention),
        }
    }

    pub fn target_retention(&self) -> f64 {
        self.target_retention
    }

    /// Seed a memory state from the first observed score
    pub fn initialize(&self, score: f64) -> MemoryState {
        let w = &self.params.w;
        let g = rating_from_score(score);
        MemoryState {
            stability: initial_stability(w, g),
            difficulty: initial_difficulty(w, g),
            reps: 1,
            lapses: u32::from(is_lapse(score)),
        }
    }

    /// Update assuming the review happened on schedule, i.e. when
    /// retrievability had fallen to the retention target
    pub fn update(&self, state: &MemoryState, score: f64) -> MemoryState {
        self.update_with_retrievability(state, score, self.target_retention)
    }

    /// Update with the exact gap since the previous review
    pub fn update_after(&self, state: &MemoryState, score: f64, elapsed_days: f64) -> MemoryState {
        let r = retrievability(state, elapsed_days);
        self.update_with_retrievability(state, score, r)
    }

    fn update_with_retrievability(&self, state: &MemoryState, score: f64, r: f64) -> MemoryState {
        debug_assert!(
            state.is_valid(),
            "memory state must be produced by initialize before it is updated: {:?}",
            state
        );
        let w = &self.params.w;
        let g = rating_from_score(score);
        let s = state.stability.clamp(MIN_STABILITY, MAX_STABILITY);
        let d = state.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);

        let (stability, lapses) = if is_lapse(score) {
            (next_forget_stability(w, d, s, r), state.lapses + 1)
        } else {
            (next_recall_stability(w, d, s, r, g), state.lapses)
        };

        MemoryState {
            stability,
            difficulty: next_difficulty(w, d, g),
            reps: state.reps + 1,
            lapses,
        }
    }

    /// Days until retrievability falls to `target_retention`
    pub fn next_review_in_days(&self, state: &MemoryState) -> f64 {
        next_review_in_days(state, self.target_retention)
    }

    /// Replay a quiz history, oldest first
    pub fn from_history(&self, history: &[QuizAttempt]) -> Option<MemoryState> {
        let (first, rest) = history.split_first()?;
        let mut state = self.initialize(first.score);
        let mut last_date: NaiveDate = first.date;
        for quiz in rest {
            let gap = (quiz.date - last_date).num_days().max(0) as f64;
            state = self.update_after(&state, quiz.score, gap);
            last_date = quiz.date;
        }
        Some(state)
    }
}

// ==================== Free functions ====================

/// Seed a memory state with the default parameters
pub fn initialize_memory_state(score: f64) -> MemoryState {
    FsrsLite::default().initialize(score)
}

/// Update a memory state with the default parameters
pub fn update_memory_state(state: &MemoryState, score: f64) -> MemoryState {
    FsrsLite::default().update(state, score)
}

/// Update a memory state with the exact gap since the previous review
pub fn update_memory_state_after(state: &MemoryState, score: f64, elapsed_days: f64) -> MemoryState {
    FsrsLite::default().update_after(state, score, elapsed_days)
}

/// Replay a quiz history with the default parameters
pub fn memory_state_from_history(history: &[QuizAttempt]) -> Option<MemoryState> {
    FsrsLite::default().from_history(history)
}

/// Probability the topic is still recallable after `days_since_review` days
pub fn retrievability(state: &MemoryState, days_since_review: f64) -> f64 {
    debug_assert!(
        state.is_valid(),
        "memory state must be produced by initialize before it is queried: {:?}",
        state
    );
    let s = state.stability.clamp(MIN_STABILITY, MAX_STABILITY);
    let t = if days_since_review.is_finite() {
        days_since_review.max(0.0)
    } else {
        MAX_STABILITY
    };
    (1.0 + FACTOR * t / s).powf(DECAY)
}

/// Elapsed days at which retrievability reaches `target_retention`
pub fn next_review_in_days(state: &MemoryState, target_retention: f64) -> f64 {
    debug_assert!(
        state.is_valid(),
        "memory state must be produced by initialize before it is queried: {:?}",
        state
    );
    let s = state.stability.clamp(MIN_STABILITY, MAX_STABILITY);
    let retention = clamp_retention(target_retention);
    let interval = s / FACTOR * (retention.powf(1.0 / DECAY) - 1.0);
    interval.clamp(0.0, MAX_STABILITY)
}

// ==================== Internals ====================

fn clamp_retention(r: f64) -> f64 {
    if r.is_nan() {
        return DEFAULT_TARGET_RETENTION;
    }
    r.clamp(0.0001, 0.9999)
}

fn sanitize_score(score: f64) -> f64 {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        tracing::warn!(score, "quiz score out of range, clamping");
    }
    crate::sanitize::clamp_score(score)
}

fn is_lapse(score: f64) -> bool {
    sanitize_score(score) < RECALL_PASS_SCORE
}

/// Continuous rating on the FSRS 1..4 axis
fn rating_from_score(score: f64) -> f64 {
    1.0 + 3.0 * sanitize_score(score) / SCORE_MAX
}

fn initial_stability(w: &[f64; 17], g: f64) -> f64 {
    let pos = (g - 1.0).clamp(0.0, 3.0);
    let idx = (pos.floor() as usize).min(2);
    let frac = pos - idx as f64;
    let s = w[idx] + frac * (w[idx + 1] - w[idx]);
    s.clamp(MIN_STABILITY, MAX_STABILITY)
}

fn initial_difficulty(w: &[f64; 17], g: f64) -> f64 {
    let d = w[4] - (g - 3.0) * w[5];
    d.clamp(1.0, 10.0) / 10.0
}

fn next_difficulty(w: &[f64; 17], d: f64, g: f64) -> f64 {
    let d_10 = d * 10.0;
    let d_new = d_10 - w[6] * (g - 3.0);
    let d_mean = w[7] * (w[4] - 3.0 * w[5]) + (1.0 - w[7]) * d_new;
    d_mean.clamp(1.0, 10.0) / 10.0
}

fn next_recall_stability(w: &[f64; 17], d: f64, s: f64, r: f64, g: f64) -> f64 {
    let d_10 = d * 10.0;
    let hard_penalty = if g < 3.0 { w[15] } else { 1.0 };
    let easy_bonus = if g >= 3.7 { w[16] } else { 1.0 };

    let new_s = s
        * (1.0
            + w[8].exp()
                * (11.0 - d_10)
                * s.powf(-w[9])
                * ((1.0 - r) * w[10]).exp_m1()
                * hard_penalty
                * easy_bonus);
    new_s.clamp(MIN_STABILITY, MAX_STABILITY)
}

fn next_forget_stability(w: &[f64; 17], d: f64, s: f64, r: f64) -> f64 {
    let d_10 = d * 10.0;
    let new_s = w[11] * d_10.powf(-w[12]) * ((s + 1.0).powf(w[13]) - 1.0) * ((1.0 - r) * w[14]).exp();
    new_s.clamp(MIN_STABILITY, s.max(MIN_STABILITY))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_initialize_higher_score_is_more_stable() {
        let low = initialize_memory_state(20.0);
        let mid = initialize_memory_state(60.0);
        let high = initialize_memory_state(95.0);
        assert!(low.stability < mid.stability);
        assert!(mid.stability < high.stability);
        assert!(low.difficulty > mid.difficulty);
        assert!(mid.difficulty > high.difficulty);
        assert!(low.stability > 0.0 && low.difficulty > 0.0);
    }

    #[test]
    fn test_initialize_endpoints_match_weights() {
        let w = FsrsParams::default().w;
        assert!((initialize_memory_state(0.0).stability - w[0]).abs() < 1e-9);
        assert!((initialize_memory_state(100.0).stability - w[3]).abs() < 1e-9);
    }

    #[test]
    fn test_initialize_counts_lapse() {
        assert_eq!(initialize_memory_state(30.0).lapses, 1);
        assert_eq!(initialize_memory_state(80.0).lapses, 0);
    }

    #[test]
    fn test_update_success_grows_stability() {
        let state = initialize_memory_state(80.0);
        let next = update_memory_state(&state, 90.0);
        assert!(next.stability > state.stability);
        assert!(next.difficulty < state.difficulty);
        assert_eq!(next.reps, 2);
    }

    #[test]
    fn test_update_failure_shrinks_stability() {
        let mut state = initialize_memory_state(90.0);
        for _ in 0..3 {
            state = update_memory_state(&state, 95.0);
        }
        let next = update_memory_state(&state, 10.0);
        assert!(next.stability < state.stability);
        assert!(next.difficulty > state.difficulty);
        assert_eq!(next.lapses, state.lapses + 1);
    }

    #[test]
    fn test_update_stays_in_bounds() {
        let mut state = initialize_memory_state(100.0);
        for _ in 0..200 {
            state = update_memory_state_after(&state, 100.0, 10_000.0);
        }
        assert!(state.stability <= MAX_STABILITY);
        assert!(state.difficulty >= MIN_DIFFICULTY);

        let mut state = initialize_memory_state(0.0);
        for _ in 0..200 {
            state = update_memory_state(&state, 0.0);
        }
        assert!(state.stability >= MIN_STABILITY);
        assert!(state.difficulty <= MAX_DIFFICULTY);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        assert_eq!(initialize_memory_state(150.0), initialize_memory_state(100.0));
        assert_eq!(initialize_memory_state(-20.0), initialize_memory_state(0.0));
    }

    #[test]
    fn test_retrievability_decays() {
        let state = initialize_memory_state(80.0);
        let r0 = retrievability(&state, 0.0);
        let r5 = retrievability(&state, 5.0);
        let r30 = retrievability(&state, 30.0);
        assert!((r0 - 1.0).abs() < 1e-9);
        assert!(r0 > r5 && r5 > r30);
        assert!(r30 > 0.0);
    }

    #[test]
    fn test_retrievability_increases_with_stability() {
        let weak = MemoryState { stability: 2.0, difficulty: 0.5, reps: 1, lapses: 0 };
        let strong = MemoryState { stability: 20.0, difficulty: 0.5, reps: 1, lapses: 0 };
        assert!(retrievability(&strong, 7.0) > retrievability(&weak, 7.0));
    }

    #[test]
    fn test_next_review_inverts_retrievability() {
        let state = MemoryState { stability: 12.0, difficulty: 0.4, reps: 3, lapses: 0 };
        let days = next_review_in_days(&state, 0.85);
        assert!((retrievability(&state, days) - 0.85).abs() < 1e-9);
        // At 90% the interval equals stability
        assert!((next_review_in_days(&state, 0.9) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_history() {
        assert!(memory_state_from_history(&[]).is_none());
        let history = vec![
            QuizAttempt::new(date(1), 1, 70.0),
            QuizAttempt::new(date(4), 2, 85.0),
            QuizAttempt::new(date(12), 2, 90.0),
        ];
        let state = memory_state_from_history(&history).unwrap();
        assert_eq!(state.reps, 3);
        assert!(state.stability > initialize_memory_state(70.0).stability);
    }

    #[test]
    fn test_custom_target_retention() {
        let model = FsrsLite::new(FsrsParams::default(), 0.95);
        let state = model.initialize(80.0);
        assert!(model.next_review_in_days(&state) < next_review_in_days(&state, 0.85));
        assert_eq!(model.target_retention(), 0.95);
        assert_eq!(FsrsLite::default().target_retention(), DEFAULT_TARGET_RETENTION);
        let nan = FsrsLite::new(FsrsParams::default(), f64::NAN);
        assert_eq!(nan.target_retention(), DEFAULT_TARGET_RETENTION);
    }

    #[cfg(debug_assertions)]
    fn uninitialized() -> MemoryState {
        MemoryState {
            stability: 0.0,
            difficulty: 0.0,
            reps: 0,
            lapses: 0,
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "memory state must be produced by initialize")]
    fn test_retrievability_rejects_uninitialized_state() {
        retrievability(&uninitialized(), 3.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "memory state must be produced by initialize")]
    fn test_next_review_rejects_uninitialized_state() {
        next_review_in_days(&uninitialized(), 0.85);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "memory state must be produced by initialize")]
    fn test_update_rejects_uninitialized_state() {
        update_memory_state(&uninitialized(), 80.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "memory state must be produced by initialize")]
    fn test_update_rejects_non_finite_state() {
        let state = MemoryState {
            stability: f64::NAN,
            ..initialize_memory_state(70.0)
        };
        update_memory_state_after(&state, 80.0, 2.0);
    }
}
