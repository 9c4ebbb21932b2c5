//! # study-engine - mastery & scheduling engine for exam preparation
//!
//! Pure functions over a learner snapshot (subjects, topics, quiz history,
//! calendar) that answer three questions: what has been forgotten, what grade
//! is likely, and what to study today.
//!
//! - **Decay** - time-based status downgrades for unreviewed topics
//! - **FSRS-lite** - score-driven stability / difficulty memory model
//! - **Mastery & Priority** - recency-weighted mastery and review urgency
//! - **Grade prediction** - weighted sub-scores on the 2..6 scale
//! - **Exam simulation** - Monte Carlo over the topics an exam may draw
//! - **Daily plan** - four-bucket allocation of the day's minutes
//!
//! ## Modules
//!
//! - [`decay`] - status downgrade rules and their application
//! - [`fsrs`] - memory state, retrievability, next review interval
//! - [`mastery`] - weighted mastery score, priority, ranking
//! - [`grade`] - predicted grade, factors, tips, exam-format gaps
//! - [`simulation`] - seeded Monte Carlo exam simulator
//! - [`plan`] - daily task list
//! - [`report`] - snapshot input and the full pipeline
//! - [`sanitize`] - clamping and rounding helpers
//! - [`types`] - shared records and constants
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use study_engine::{generate_daily_plan, Subject, Topic, TopicStatus};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
//! let mut topic = Topic::new("cells", "Cells");
//! topic.status = TopicStatus::Weak;
//! let mut subject = Subject::new("bio", "Biology");
//! subject.topics.push(topic);
//! subject.exam_date = today.succ_opt();
//!
//! let plan = generate_daily_plan(&[subject], &[], 90, today);
//! assert!(plan.iter().map(|t| t.estimated_minutes).sum::<u32>() <= 90);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod sanitize;
pub mod types;
pub mod decay;
pub mod fsrs;
pub mod mastery;
pub mod simulation;
pub mod grade;
pub mod plan;
pub mod report;
pub mod config;
pub mod error;
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use decay::{apply_decay, apply_decay_to_all, decayed_status};

pub use fsrs::{
    initialize_memory_state, memory_state_from_history, next_review_in_days, retrievability,
    update_memory_state, update_memory_state_after, FsrsLite, FsrsParams,
};

pub use mastery::{rank_topics, topic_priority, weighted_mastery_score};

pub use simulation::{
    simulate_exam_outcome, ExamSimulator, SimulationOptions, SimulationResult, TopicImpact,
};

pub use grade::{
    analyze_exam_format, predict_grade, FormatAnalysis, GradeFactor, PredictedGrade, SubScores,
};

pub use plan::{effective_minutes, generate_daily_plan, DailyTask, TaskBucket};

pub use report::{build_report, Snapshot, StudyReport, SubjectReport, TopicInsight};

pub use config::EngineConfig;
pub use error::{EngineError, Result};
