//! Snapshot in, report out
//!
//! A `Snapshot` is everything the engine needs about one learner on one day.
//! `build_report` runs the pipeline in order: decay, per-topic insight,
//! grade prediction per subject, then the daily plan.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decay::apply_decay_to_all;
use crate::error::Result;
use crate::fsrs::{retrievability, FsrsLite, FsrsParams};
use crate::grade::{predict_grade, PredictedGrade};
use crate::mastery::{rank_topics, topic_priority, weighted_mastery_score};
use crate::plan::{effective_minutes, generate_daily_plan, DailyTask};
use crate::sanitize::round2;
use crate::simulation::ExamSimulator;
use crate::types::{
    DailyStatus, MemoryState, QuestionBankRecord, ScheduleEntry, Subject, Topic, TopicStatus,
};

// ==================== Input ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub today: NaiveDate,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub daily_status: DailyStatus,
    pub base_minutes: u32,
    /// Question-bank records keyed by subject id
    #[serde(default)]
    pub question_bank: BTreeMap<String, Vec<QuestionBankRecord>>,
    /// Also compute the idealized-effort grade
    #[serde(default)]
    pub idealized_effort: bool,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ==================== Output ====================

/// Status bucket lowered by decay today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub subject_id: String,
    pub topic_id: String,
    pub from: TopicStatus,
    pub to: TopicStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInsight {
    pub topic_id: String,
    pub name: String,
    pub status: TopicStatus,
    pub mastery: f64,
    pub priority: f64,
    /// Recall probability today, `None` without review data
    pub retrievability: Option<f64>,
    /// Days from the last review until recall drops to the target retention
    pub next_review_in_days: Option<f64>,
    pub memory_state: Option<MemoryState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub subject_id: String,
    pub name: String,
    pub days_until_exam: Option<i64>,
    /// Most urgent first
    pub topics: Vec<TopicInsight>,
    pub prediction: PredictedGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyReport {
    pub today: NaiveDate,
    pub effective_minutes: u32,
    pub planned_minutes: u32,
    pub status_changes: Vec<StatusChange>,
    pub subjects: Vec<SubjectReport>,
    pub plan: Vec<DailyTask>,
}

// ==================== Pipeline ====================

fn status_changes(before: &[Subject], after: &[Subject]) -> Vec<StatusChange> {
    before
        .iter()
        .zip(after)
        .flat_map(|(old, new)| {
            old.topics
                .iter()
                .zip(&new.topics)
                .filter(|(a, b)| a.status != b.status)
                .map(|(a, b)| StatusChange {
                    subject_id: old.id.clone(),
                    topic_id: a.id.clone(),
                    from: a.status,
                    to: b.status,
                })
        })
        .collect()
}

/// Most recent review, falling back to the last quiz date
fn last_activity(topic: &Topic) -> Option<NaiveDate> {
    let last_quiz = topic.quiz_history.iter().map(|q| q.date).max();
    match (topic.last_reviewed, last_quiz) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn topic_insight(topic: &Topic, today: NaiveDate, fsrs: &FsrsLite) -> TopicInsight {
    let memory_state = topic
        .memory_state
        .filter(MemoryState::is_valid)
        .or_else(|| fsrs.from_history(&topic.quiz_history));

    let (recall, next_review) = match (&memory_state, last_activity(topic)) {
        (Some(state), Some(last)) => {
            let elapsed = (today - last).num_days().max(0) as f64;
            (
                Some(round2(retrievability(state, elapsed))),
                Some(round2(fsrs.next_review_in_days(state))),
            )
        }
        (Some(state), None) => (None, Some(round2(fsrs.next_review_in_days(state)))),
        _ => (None, None),
    };

    TopicInsight {
        topic_id: topic.id.clone(),
        name: topic.display_name().to_string(),
        status: topic.status,
        mastery: weighted_mastery_score(topic),
        priority: topic_priority(topic, today),
        retrievability: recall,
        next_review_in_days: next_review,
        memory_state,
    }
}

/// Run decay, scoring, prediction and planning over one snapshot
pub fn build_report(snapshot: &Snapshot, config: &EngineConfig) -> StudyReport {
    let today = snapshot.today;
    let subjects = apply_decay_to_all(&snapshot.subjects, today);
    let changes = status_changes(&snapshot.subjects, &subjects);

    let fsrs = FsrsLite::new(FsrsParams::default(), config.target_retention);
    let mut simulator = ExamSimulator::with_options(config.simulation_options(None));

    let subject_reports: Vec<SubjectReport> = subjects
        .iter()
        .map(|subject| {
            let topics = rank_topics(&subject.topics, today)
                .into_iter()
                .map(|t| topic_insight(t, today, &fsrs))
                .collect();
            let question_bank = snapshot.question_bank.get(&subject.id).map(Vec::as_slice);
            let prediction = predict_grade(
                subject,
                today,
                snapshot.idealized_effort,
                question_bank,
                &mut simulator,
            );
            SubjectReport {
                subject_id: subject.id.clone(),
                name: subject.display_name().to_string(),
                days_until_exam: subject.days_until_exam(today),
                topics,
                prediction,
            }
        })
        .collect();

    let minutes = effective_minutes(snapshot.base_minutes, &snapshot.daily_status, config);
    let plan = generate_daily_plan(&subjects, &snapshot.schedule, minutes, today);
    let planned_minutes = plan.iter().map(|t| t.estimated_minutes).sum();

    tracing::info!(
        subjects = subject_reports.len(),
        decayed = changes.len(),
        tasks = plan.len(),
        effective_minutes = minutes,
        planned_minutes,
        target_retention = fsrs.target_retention(),
        "study report built"
    );

    StudyReport {
        today,
        effective_minutes: minutes,
        planned_minutes,
        status_changes: changes,
        subjects: subject_reports,
        plan,
    }
}
