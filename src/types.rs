//! Common Types and Constants
//!
//! Learner snapshot structures shared by every engine module. All of them are
//! plain serde records read from the persistence layer; derived values
//! (mastery, priority, grade, plan) are never stored on them.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::sanitize::{clamp_grade, clamp_score};

// ==================== Constants ====================

/// Lowest grade on the exam scale
pub const GRADE_MIN: f64 = 2.0;

/// Highest grade on the exam scale
pub const GRADE_MAX: f64 = 6.0;

/// Lowest quiz score
pub const SCORE_MIN: f64 = 0.0;

/// Highest quiz score
pub const SCORE_MAX: f64 = 100.0;

/// Lowest Bloom level (remember)
pub const BLOOM_MIN: u8 = 1;

/// Highest Bloom level (create)
pub const BLOOM_MAX: u8 = 6;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Topic ====================

/// Coarse mastery bucket of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TopicStatus {
    #[default]
    NotStarted,
    Weak,
    Learned,
    Solid,
}

impl TopicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "notStarted",
            Self::Weak => "weak",
            Self::Learned => "learned",
            Self::Solid => "solid",
        }
    }

    /// Ordinal used to compare buckets (NotStarted = 0 .. Solid = 3)
    pub fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Weak => 1,
            Self::Learned => 2,
            Self::Solid => 3,
        }
    }
}

/// Categorical study-effort estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TopicSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TopicSize {
    /// Minutes a single session on a topic of this size is expected to take
    pub fn minutes(&self) -> u32 {
        match self {
            Self::Small => 15,
            Self::Medium => 25,
            Self::Large => 40,
        }
    }
}

/// One recorded quiz attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub date: NaiveDate,
    /// Bloom level the quiz was taken at (1..=6)
    pub bloom_level: u8,
    /// Score in [0, 100]
    pub score: f64,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    /// How much the attempt counts; short drills count less than full exams
    #[serde(default = "default_quiz_weight")]
    pub weight: f64,
}

fn default_quiz_weight() -> f64 {
    1.0
}

impl QuizAttempt {
    pub fn new(date: NaiveDate, bloom_level: u8, score: f64) -> Self {
        Self {
            date,
            bloom_level,
            score,
            question_count: 0,
            correct_count: 0,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Score clamped to [0, 100]
    pub fn clamped_score(&self) -> f64 {
        clamp_score(self.score)
    }

    /// Weight clamped to be non-negative
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() {
            self.weight.max(0.0)
        } else {
            0.0
        }
    }
}

/// Spaced-repetition memory state of a topic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Days until retrievability decays to the reference threshold
    pub stability: f64,
    /// Resistance to stability growth (0.1..=1.0)
    pub difficulty: f64,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub lapses: u32,
}

impl MemoryState {
    pub fn is_valid(&self) -> bool {
        self.stability.is_finite()
            && self.difficulty.is_finite()
            && self.stability > 0.0
            && self.difficulty > 0.0
    }
}

/// The atomic unit of study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: TopicStatus,
    #[serde(default)]
    pub last_reviewed: Option<NaiveDate>,
    /// Last time the status bucket changed (grade recording or decay)
    #[serde(default)]
    pub status_changed_at: Option<NaiveDate>,
    /// Grades on the 2..6 scale, oldest first
    #[serde(default)]
    pub grades: Vec<f64>,
    /// Quiz attempts, oldest first
    #[serde(default)]
    pub quiz_history: Vec<QuizAttempt>,
    #[serde(default = "default_bloom_level")]
    pub current_bloom_level: u8,
    #[serde(default)]
    pub memory_state: Option<MemoryState>,
    #[serde(default)]
    pub size: Option<TopicSize>,
}

fn default_bloom_level() -> u8 {
    BLOOM_MIN
}

impl Topic {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: TopicStatus::NotStarted,
            last_reviewed: None,
            status_changed_at: None,
            grades: Vec::new(),
            quiz_history: Vec::new(),
            current_bloom_level: BLOOM_MIN,
            memory_state: None,
            size: None,
        }
    }

    /// Mean of the (clamped) grades, `None` when there are no grades
    pub fn avg_grade(&self) -> Option<f64> {
        if self.grades.is_empty() {
            return None;
        }
        let sum: f64 = self.grades.iter().map(|&g| clamp_grade(g)).sum();
        Some(sum / self.grades.len() as f64)
    }

    /// Whole days since the last review, `None` if never reviewed
    pub fn days_since_review(&self, today: NaiveDate) -> Option<i64> {
        self.last_reviewed.map(|d| (today - d).num_days().max(0))
    }

    /// Bloom level clamped to 1..=6
    pub fn bloom_level(&self) -> u8 {
        self.current_bloom_level.clamp(BLOOM_MIN, BLOOM_MAX)
    }

    pub fn size_or_default(&self) -> TopicSize {
        self.size.unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ==================== Subject ====================

/// Structure of the real exam
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFormat {
    #[serde(default)]
    pub multiple_choice: u32,
    #[serde(default)]
    pub open_answer: u32,
    #[serde(default)]
    pub case_study: u32,
    /// How many topics the exam draws from
    #[serde(default)]
    pub topics_drawn: u32,
}

/// A named collection of topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub exam_format: Option<ExamFormat>,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            topics: Vec::new(),
            exam_date: None,
            exam_format: None,
        }
    }

    /// Days until the exam, negative once it has passed
    pub fn days_until_exam(&self, today: NaiveDate) -> Option<i64> {
        self.exam_date.map(|d| (d - today).num_days())
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ==================== Daily context ====================

/// Per-day modifiers, not persisted beyond the day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatus {
    #[serde(default)]
    pub sick: bool,
    #[serde(default)]
    pub holiday: bool,
}

/// Recurring calendar item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: Weekday,
    pub subject_id: String,
    #[serde(default)]
    pub requires_preparation: bool,
}

/// External question-bank accuracy record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBankRecord {
    #[serde(default)]
    pub topic_id: Option<String>,
    pub attempted: u32,
    pub correct: u32,
}

// ==================== Tests ====================
