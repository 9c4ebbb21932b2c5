//! Predicted Grade Calculator
//!
//! Aggregates normalized sub-scores of a subject into a grade on the 2..6
//! scale, rounded to the nearest quarter point:
//!
//! ```text
//! grade = (coverage*3 + (mastery/6)*3) * time_factor
//!       + consistency*0.5 - decay_risk*0.5
//!       + question_bank*0.5   (only with enough data)
//!       + 2
//! ```
//!
//! An idealized-effort pass re-runs the same formula with boosted coverage,
//! consistency and question-bank scores and halved decay risk.

mod format;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sanitize::{clamp_unit, finalize_grade, round2};
use crate::simulation::{ExamSimulator, SimulationResult};
use crate::types::{QuestionBankRecord, Subject, TopicStatus, GRADE_MAX, GRADE_MIN};

pub use format::{analyze_exam_format, FormatAnalysis, WEAK_FORMAT_SCORE};

// ==================== Constants ====================

/// Mean grade assumed when no topic has grades
pub const DEFAULT_MASTERY_AVG: f64 = 3.5;

/// Reviewed within this many days counts toward consistency
pub const CONSISTENCY_WINDOW_DAYS: i64 = 7;

/// Unreviewed for at least this many days counts as decay risk
pub const DECAY_RISK_DAYS: i64 = 5;

/// Minimum answered questions before question-bank data is used
pub const MIN_QUESTION_BANK_ATTEMPTS: u32 = 5;

// ==================== Data Structures ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Impact {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactorKind {
    Coverage,
    Mastery,
    Consistency,
    TimePressure,
    DecayRisk,
    QuestionBank,
}

/// One explained sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFactor {
    pub kind: FactorKind,
    pub value: f64,
    pub impact: Impact,
    pub description: String,
}

/// Normalized inputs of the grade formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    /// Status-weighted fraction of topics, 0..1
    pub coverage: f64,
    /// Mean grade on the 2..6 scale
    pub mastery_avg: f64,
    /// Fraction of topics reviewed within the last week, 0..1
    pub consistency: f64,
    /// 1.0 without exam pressure, down to 0.7 in the last three days
    pub time_factor: f64,
    /// Fraction of started topics unreviewed for 5+ days, 0..1
    pub decay_risk: f64,
    /// Question-bank accuracy mapped to -1..1, `None` without enough data
    pub question_bank: Option<f64>,
}

impl SubScores {
    pub fn compute(
        subject: &Subject,
        today: NaiveDate,
        question_bank: Option<&[QuestionBankRecord]>,
    ) -> Self {
        let topics = &subject.topics;
        let n = topics.len().max(1) as f64;

        let coverage = topics.iter().map(|t| coverage_weight(t.status)).sum::<f64>() / n;

        let grades: Vec<f64> = topics.iter().filter_map(|t| t.avg_grade()).collect();
        let mastery_avg = if grades.is_empty() {
            DEFAULT_MASTERY_AVG
        } else {
            grades.iter().sum::<f64>() / grades.len() as f64
        };

        let reviewed_recently = topics
            .iter()
            .filter(|t| {
                t.days_since_review(today)
                    .is_some_and(|d| d <= CONSISTENCY_WINDOW_DAYS)
            })
            .count();
        let consistency = reviewed_recently as f64 / n;

        let started: Vec<_> = topics
            .iter()
            .filter(|t| t.status != TopicStatus::NotStarted)
            .collect();
        let decay_risk = if started.is_empty() {
            0.0
        } else {
            let at_risk = started
                .iter()
                .filter(|t| {
                    t.days_since_review(today)
                        .map_or(true, |d| d >= DECAY_RISK_DAYS)
                })
                .count();
            at_risk as f64 / started.len() as f64
        };

        Self {
            coverage: clamp_unit(coverage),
            mastery_avg,
            consistency: clamp_unit(consistency),
            time_factor: time_factor(subject.days_until_exam(today)),
            decay_risk: clamp_unit(decay_risk),
            question_bank: question_bank.and_then(question_bank_score),
        }
    }

    /// Mastery normalized onto 0..1
    pub fn mastery_normalized(&self) -> f64 {
        clamp_unit((self.mastery_avg - GRADE_MIN) / (GRADE_MAX - GRADE_MIN))
    }

    /// Counterfactual with near-optimal effort
    pub fn idealized(&self) -> Self {
        Self {
            coverage: (self.coverage * 1.3).min(1.0),
            consistency: (self.consistency + 0.5).min(1.0),
            decay_risk: self.decay_risk / 2.0,
            question_bank: self.question_bank.map(|q| (q + 0.2).min(1.0)),
            ..*self
        }
    }

    /// Grade on the 2..6 scale in quarter-point steps
    pub fn grade(&self) -> f64 {
        let knowledge = self.coverage * 3.0 + (self.mastery_normalized() / 6.0) * 3.0;
        let raw = knowledge * self.time_factor + self.consistency * 0.5 - self.decay_risk * 0.5
            + self.question_bank.unwrap_or(0.0) * 0.5
            + GRADE_MIN;
        finalize_grade(raw)
    }
}

/// Full prediction for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedGrade {
    pub current: f64,
    pub idealized: f64,
    pub improvement: f64,
    pub factors: Vec<GradeFactor>,
    pub tips: Vec<String>,
    pub simulation: SimulationResult,
    pub format_analysis: Option<FormatAnalysis>,
}

// ==================== Sub-score helpers ====================

/// Coverage weight per status
pub fn coverage_weight(status: TopicStatus) -> f64 {
    match status {
        TopicStatus::Solid => 1.0,
        TopicStatus::Learned => 0.7,
        TopicStatus::Weak => 0.3,
        TopicStatus::NotStarted => 0.0,
    }
}

/// Exam-proximity multiplier
pub fn time_factor(days_until_exam: Option<i64>) -> f64 {
    match days_until_exam {
        Some(d) if (0..=3).contains(&d) => 0.7,
        Some(d) if (0..=7).contains(&d) => 0.85,
        Some(d) if (0..=14).contains(&d) => 0.95,
        _ => 1.0,
    }
}

/// Accuracy mapped to -1..1 (50% is neutral), `None` below the minimum sample
pub fn question_bank_score(records: &[QuestionBankRecord]) -> Option<f64> {
    let attempted: u32 = records.iter().map(|r| r.attempted).sum();
    if attempted < MIN_QUESTION_BANK_ATTEMPTS {
        return None;
    }
    let correct: u32 = records.iter().map(|r| r.correct.min(r.attempted)).sum();
    let accuracy = correct as f64 / attempted as f64;
    Some(((accuracy - 0.5) * 2.0).clamp(-1.0, 1.0))
}

fn impact_above(value: f64, positive: f64, neutral: f64) -> Impact {
    if value >= positive {
        Impact::Positive
    } else if value >= neutral {
        Impact::Neutral
    } else {
        Impact::Negative
    }
}

fn build_factors(scores: &SubScores, days_until_exam: Option<i64>) -> Vec<GradeFactor> {
    let mut factors = vec![
        GradeFactor {
            kind: FactorKind::Coverage,
            value: round2(scores.coverage),
            impact: impact_above(scores.coverage, 0.7, 0.4),
            description: format!("{:.0}% of the material covered", scores.coverage * 100.0),
        },
        GradeFactor {
            kind: FactorKind::Mastery,
            value: round2(scores.mastery_avg),
            impact: impact_above(scores.mastery_avg, 4.5, 3.5),
            description: format!("average grade {:.2}", scores.mastery_avg),
        },
        GradeFactor {
            kind: FactorKind::Consistency,
            value: round2(scores.consistency),
            impact: impact_above(scores.consistency, 0.6, 0.3),
            description: format!(
                "{:.0}% of topics reviewed in the last {} days",
                scores.consistency * 100.0,
                CONSISTENCY_WINDOW_DAYS
            ),
        },
        GradeFactor {
            kind: FactorKind::TimePressure,
            value: scores.time_factor,
            impact: if scores.time_factor >= 0.95 {
                Impact::Neutral
            } else {
                Impact::Negative
            },
            description: match days_until_exam {
                Some(d) if d >= 0 => format!("exam in {d} days"),
                _ => "no upcoming exam".to_string(),
            },
        },
        GradeFactor {
            kind: FactorKind::DecayRisk,
            value: round2(scores.decay_risk),
            impact: if scores.decay_risk <= 0.2 {
                Impact::Positive
            } else if scores.decay_risk <= 0.5 {
                Impact::Neutral
            } else {
                Impact::Negative
            },
            description: format!(
                "{:.0}% of started topics not reviewed for {}+ days",
                scores.decay_risk * 100.0,
                DECAY_RISK_DAYS
            ),
        },
    ];

    if let Some(q) = scores.question_bank {
        factors.push(GradeFactor {
            kind: FactorKind::QuestionBank,
            value: round2(q),
            impact: impact_above(q, 0.2, -0.2),
            description: format!("question bank accuracy {:.0}%", (q / 2.0 + 0.5) * 100.0),
        });
    }

    factors
}

fn build_tips(
    subject: &Subject,
    scores: &SubScores,
    days_until_exam: Option<i64>,
    simulation: &SimulationResult,
) -> Vec<String> {
    let mut tips = Vec::new();

    if scores.coverage < 0.5 {
        let not_started = subject
            .topics
            .iter()
            .filter(|t| t.status == TopicStatus::NotStarted)
            .count();
        tips.push(format!(
            "Coverage is low: {not_started} topics have not been started yet."
        ));
    }
    if scores.mastery_avg < 4.0 {
        tips.push(format!(
            "Average grade is {:.2}; retake quizzes on weak topics.",
            scores.mastery_avg
        ));
    }
    if scores.consistency < 0.5 {
        tips.push("Review more regularly; most topics were not touched this week.".to_string());
    }
    if scores.time_factor < 1.0 {
        if let Some(d) = days_until_exam {
            tips.push(format!(
                "The exam is in {d} days; focus on the topics with the largest impact."
            ));
        }
    }
    if scores.decay_risk > 0.3 {
        tips.push(format!(
            "Some topics have not been reviewed for {DECAY_RISK_DAYS}+ days and may decay."
        ));
    }
    if scores.question_bank.is_some_and(|q| q < 0.0) {
        tips.push("Question bank accuracy is below 50%; practice more questions.".to_string());
    }

    if simulation.worst_case < 3.0 && !simulation.critical_topics.is_empty() {
        let names: Vec<&str> = simulation
            .impact_topics
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        tips.push(format!(
            "Worst-case outcome is {:.2}; shore up: {}.",
            simulation.worst_case,
            names.join(", ")
        ));
    }
    if let Some(top) = simulation.impact_topics.first() {
        if top.impact > 0.0 {
            tips.push(format!(
                "Mastering {} would raise the expected grade by about {:.2}.",
                top.name, top.impact
            ));
        }
    }

    tips
}

/// Topics the simulated exam draws when the format does not say
fn default_topics_on_exam(subject: &Subject) -> usize {
    match subject.exam_format.as_ref() {
        Some(format) if format.topics_drawn > 0 => format.topics_drawn as usize,
        _ => subject.topics.len().div_ceil(2),
    }
}

// ==================== Main Implementation ====================

/// Predict the grade of a subject
///
/// # Arguments
/// * `idealized_effort` - also compute the near-optimal-effort counterfactual
/// * `question_bank` - external accuracy records for this subject
/// * `simulator` - PRNG-owning Monte Carlo simulator
pub fn predict_grade(
    subject: &Subject,
    today: NaiveDate,
    idealized_effort: bool,
    question_bank: Option<&[QuestionBankRecord]>,
    simulator: &mut ExamSimulator,
) -> PredictedGrade {
    if subject.topics.is_empty() {
        return PredictedGrade {
            current: GRADE_MIN,
            idealized: GRADE_MIN,
            improvement: 0.0,
            factors: Vec::new(),
            tips: vec!["Add topics to this subject to get a grade prediction.".to_string()],
            simulation: SimulationResult::degenerate(),
            format_analysis: None,
        };
    }

    let days_until_exam = subject.days_until_exam(today);
    let scores = SubScores::compute(subject, today, question_bank);
    let current = scores.grade();
    let idealized = if idealized_effort {
        scores.idealized().grade().max(current)
    } else {
        current
    };

    let simulation = simulator.simulate(&subject.topics, default_topics_on_exam(subject));
    let format_analysis = analyze_exam_format(subject);

    let mut tips = build_tips(subject, &scores, days_until_exam, &simulation);
    if let Some(analysis) = &format_analysis {
        tips.extend(analysis.tips.iter().cloned());
    }
    if tips.is_empty() {
        tips.push("On track: keep the current review rhythm.".to_string());
    }

    tracing::debug!(
        subject_id = %subject.id,
        current,
        idealized,
        coverage = scores.coverage,
        consistency = scores.consistency,
        decay_risk = scores.decay_risk,
        iterations = simulator.iterations(),
        "grade predicted"
    );

    PredictedGrade {
        current,
        idealized,
        improvement: idealized - current,
        factors: build_factors(&scores, days_until_exam),
        tips,
        simulation,
        format_analysis,
    }
}

// ==================== Tests ====================
