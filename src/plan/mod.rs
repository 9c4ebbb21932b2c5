//! Daily Plan Generator
//!
//! Splits the day's study budget into four fixed-priority buckets. Each pass
//! draws only from what earlier passes left over:
//!
//! 1. **Critical** (<= 40% of the total): classes tomorrow that need
//!    preparation, up to 5 most urgent non-Solid topics each
//! 2. **High** (<= 50% of the remainder): exams within 7 days, nearest first,
//!    up to 8 non-Solid topics each
//! 3. **Medium** (<= 30% of the remainder): topics unreviewed for 7+ days,
//!    up to 5 per subject, at most two subjects sharing the bucket evenly
//! 4. **Normal** (the rest, while more than 15 minutes remain): introduce up
//!    to 3 not-started topics where the backlog outpaces the days left
//!
//! A topic is placed at most once per plan. Minutes are whole numbers and
//! the sum never exceeds the budget.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::grade::analyze_exam_format;
use crate::mastery::top_priority_topics;
use crate::types::{DailyStatus, ScheduleEntry, Subject, Topic, TopicStatus, EPSILON};

// ==================== Constants ====================

const CRITICAL_SHARE: f64 = 0.4;
const HIGH_SHARE: f64 = 0.5;
const MEDIUM_SHARE: f64 = 0.3;

const CRITICAL_TOPIC_LIMIT: usize = 5;
const HIGH_TOPIC_LIMIT: usize = 8;
const MEDIUM_TOPIC_LIMIT: usize = 5;
const NORMAL_TOPIC_LIMIT: usize = 3;

/// Exams this close (in days) go to the High bucket
const HIGH_EXAM_WINDOW_DAYS: i64 = 7;

/// Started topics unreviewed this long go to the Medium bucket
const STALE_DAYS: i64 = 7;

/// Subjects served per Medium bucket
const MEDIUM_SUBJECTS: u32 = 2;

/// Normal pass only runs while more than this many minutes remain
const NORMAL_MIN_REMAINING: u32 = 15;

/// Not-started topics per remaining day above which new topics are introduced
const NEW_TOPIC_PRESSURE: f64 = 0.5;

// ==================== Data Structures ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskBucket {
    Critical,
    High,
    Medium,
    Normal,
}

impl TaskBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub subject_id: String,
    pub bucket: TaskBucket,
    pub label: String,
    /// Topic ids, most urgent first
    pub topics: Vec<String>,
    pub estimated_minutes: u32,
}

/// Study minutes left after the day's modifiers
pub fn effective_minutes(base_minutes: u32, status: &DailyStatus, config: &EngineConfig) -> u32 {
    let mut minutes = f64::from(base_minutes);
    if status.sick {
        minutes *= config.sick_multiplier;
    }
    if status.holiday {
        minutes *= config.holiday_multiplier;
    }
    (minutes + EPSILON).max(0.0).floor() as u32
}

fn share(minutes: u32, fraction: f64) -> u32 {
    (f64::from(minutes) * fraction).floor() as u32
}

// ==================== Main Implementation ====================

struct Planner<'a> {
    today: NaiveDate,
    remaining: u32,
    planned: HashSet<(&'a str, &'a str)>,
    tasks: Vec<DailyTask>,
}

impl<'a> Planner<'a> {
    fn new(today: NaiveDate, budget: u32) -> Self {
        Self {
            today,
            remaining: budget,
            planned: HashSet::new(),
            tasks: Vec::new(),
        }
    }

    /// Most urgent unplanned topics of a subject passing `filter`
    fn pick<F>(&self, subject: &'a Subject, limit: usize, filter: F) -> Vec<&'a Topic>
    where
        F: Fn(&Topic) -> bool,
    {
        top_priority_topics(&subject.topics, self.today, limit, |t| {
            !self.planned.contains(&(subject.id.as_str(), t.id.as_str())) && filter(t)
        })
    }

    /// Record a task, bounded by the remaining budget; returns minutes spent
    fn push(
        &mut self,
        subject: &'a Subject,
        bucket: TaskBucket,
        label: String,
        topics: Vec<&'a Topic>,
        minutes: u32,
    ) -> u32 {
        let minutes = minutes.min(self.remaining);
        if minutes == 0 || topics.is_empty() {
            return 0;
        }
        for t in &topics {
            self.planned.insert((subject.id.as_str(), t.id.as_str()));
        }
        self.remaining -= minutes;
        self.tasks.push(DailyTask {
            subject_id: subject.id.clone(),
            bucket,
            label,
            topics: topics.iter().map(|t| t.id.clone()).collect(),
            estimated_minutes: minutes,
        });
        minutes
    }

    fn critical_pass(&mut self, subjects: &'a [Subject], schedule: &[ScheduleEntry], total: u32) {
        let tomorrow = self.today.weekday().succ();
        let entries: Vec<&ScheduleEntry> = schedule
            .iter()
            .filter(|e| e.day == tomorrow && e.requires_preparation)
            .collect();
        if entries.is_empty() {
            return;
        }

        let bucket = share(total, CRITICAL_SHARE).min(self.remaining);
        let per_entry = bucket / entries.len() as u32;
        tracing::debug!(
            bucket = TaskBucket::Critical.as_str(),
            budget = bucket,
            per_entry,
            entries = entries.len(),
            "plan pass"
        );

        for entry in entries {
            let Some(subject) = subjects.iter().find(|s| s.id == entry.subject_id) else {
                continue;
            };
            let topics = self.pick(subject, CRITICAL_TOPIC_LIMIT, |t| {
                t.status != TopicStatus::Solid
            });
            let label = format!("Prepare for tomorrow's {} class", subject.display_name());
            self.push(subject, TaskBucket::Critical, label, topics, per_entry);
        }
    }

    fn high_pass(&mut self, subjects: &'a [Subject]) {
        let bucket = share(self.remaining, HIGH_SHARE);

        let mut upcoming: Vec<(&'a Subject, i64)> = subjects
            .iter()
            .filter_map(|s| s.days_until_exam(self.today).map(|d| (s, d)))
            .filter(|&(_, d)| (0..=HIGH_EXAM_WINDOW_DAYS).contains(&d))
            .collect();
        upcoming.sort_by_key(|&(_, d)| d);

        let selections: Vec<(&'a Subject, i64, Vec<&'a Topic>)> = upcoming
            .into_iter()
            .map(|(s, d)| (s, d, self.pick(s, HIGH_TOPIC_LIMIT, |t| t.status != TopicStatus::Solid)))
            .filter(|(_, _, topics)| !topics.is_empty())
            .collect();
        if selections.is_empty() {
            return;
        }

        let per_subject = bucket / selections.len() as u32;
        tracing::debug!(
            bucket = TaskBucket::High.as_str(),
            budget = bucket,
            per_subject,
            subjects = selections.len(),
            "plan pass"
        );

        for (subject, days, topics) in selections {
            let label = high_label(subject, days);
            self.push(subject, TaskBucket::High, label, topics, per_subject);
        }
    }

    fn medium_pass(&mut self, subjects: &'a [Subject]) {
        let bucket = share(self.remaining, MEDIUM_SHARE);
        let today = self.today;
        let stale = move |t: &Topic| {
            t.status != TopicStatus::NotStarted
                && t.days_since_review(today).map_or(true, |d| d >= STALE_DAYS)
        };

        let qualifying = subjects
            .iter()
            .filter(|&s| !self.pick(s, MEDIUM_TOPIC_LIMIT, stale).is_empty())
            .take(MEDIUM_SUBJECTS as usize)
            .count() as u32;
        if qualifying == 0 {
            return;
        }
        let per_subject = bucket / qualifying;
        let mut left = bucket;
        tracing::debug!(
            bucket = TaskBucket::Medium.as_str(),
            budget = bucket,
            per_subject,
            subjects = qualifying,
            "plan pass"
        );

        for subject in subjects {
            if left == 0 || per_subject == 0 {
                break;
            }
            let topics = self.pick(subject, MEDIUM_TOPIC_LIMIT, stale);
            let label = format!("Refresh fading topics in {}", subject.display_name());
            let spent = self.push(subject, TaskBucket::Medium, label, topics, per_subject.min(left));
            left -= spent;
        }
    }

    fn normal_pass(&mut self, subjects: &'a [Subject]) {
        tracing::debug!(
            bucket = TaskBucket::Normal.as_str(),
            budget = self.remaining,
            "plan pass"
        );
        for subject in subjects {
            if self.remaining <= NORMAL_MIN_REMAINING {
                break;
            }
            let Some(days) = subject.days_until_exam(self.today).filter(|&d| d >= 1) else {
                continue;
            };
            let not_started = subject
                .topics
                .iter()
                .filter(|t| t.status == TopicStatus::NotStarted)
                .count();
            if (not_started as f64 / days as f64) <= NEW_TOPIC_PRESSURE {
                continue;
            }

            let topics = self.pick(subject, NORMAL_TOPIC_LIMIT, |t| {
                t.status == TopicStatus::NotStarted
            });
            let needed: u32 = topics.iter().map(|t| t.size_or_default().minutes()).sum();
            let label = format!("Start new topics in {}", subject.display_name());
            self.push(subject, TaskBucket::Normal, label, topics, needed);
        }
    }
}

fn high_label(subject: &Subject, days: i64) -> String {
    let when = match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d => format!("in {d} days"),
    };
    let mut label = format!("{} exam {}", subject.display_name(), when);

    if let (Some(format), Some(analysis)) = (&subject.exam_format, analyze_exam_format(subject)) {
        if let Some(note) = analysis.focus_note(format) {
            label.push_str(": ");
            label.push_str(&note);
        }
    }
    label
}

/// Build today's ordered task list
pub fn generate_daily_plan(
    subjects: &[Subject],
    schedule: &[ScheduleEntry],
    effective_minutes: u32,
    today: NaiveDate,
) -> Vec<DailyTask> {
    let mut planner = Planner::new(today, effective_minutes);

    planner.critical_pass(subjects, schedule, effective_minutes);
    planner.high_pass(subjects);
    planner.medium_pass(subjects);
    planner.normal_pass(subjects);

    tracing::debug!(
        tasks = planner.tasks.len(),
        unallocated = planner.remaining,
        "daily plan generated"
    );
    planner.tasks
}

// ==================== Tests ====================
