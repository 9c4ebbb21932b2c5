//! Exam-format gap analysis
//!
//! Quizzes at Bloom level 4+ (analyze/evaluate/create) stand in for
//! open-answer and case-study items; levels 1..=3 stand in for multiple
//! choice. A topic averaging below `WEAK_FORMAT_SCORE` on either band is
//! flagged, and the flag only matters if the exam actually has that item type.

use serde::{Deserialize, Serialize};

use crate::types::{ExamFormat, Subject, Topic};

/// Average quiz score under which a topic is weak on a format
pub const WEAK_FORMAT_SCORE: f64 = 60.0;

/// First Bloom level treated as open-answer / case-study material
const HIGH_BLOOM_LEVEL: u8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatAnalysis {
    pub weak_on_case_study: bool,
    pub weak_on_open_answer: bool,
    pub weak_on_multiple_choice: bool,
    /// Topics scoring poorly on high-Bloom quizzes
    pub high_bloom_weak_topics: Vec<String>,
    /// Topics scoring poorly on low-Bloom quizzes
    pub low_bloom_weak_topics: Vec<String>,
    pub tips: Vec<String>,
}

impl FormatAnalysis {
    pub fn has_gap(&self) -> bool {
        self.weak_on_case_study || self.weak_on_open_answer || self.weak_on_multiple_choice
    }

    /// Short note naming the weak item types with their exam counts
    pub fn focus_note(&self, format: &ExamFormat) -> Option<String> {
        let mut parts = Vec::new();
        if self.weak_on_case_study {
            parts.push(count_label(format.case_study, "case study", "case studies"));
        }
        if self.weak_on_open_answer {
            parts.push(count_label(format.open_answer, "open question", "open questions"));
        }
        if self.weak_on_multiple_choice {
            parts.push(count_label(
                format.multiple_choice,
                "multiple-choice question",
                "multiple-choice questions",
            ));
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!("practice {}", parts.join(", ")))
        }
    }
}

fn count_label(n: u32, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

fn band_average<F>(topic: &Topic, in_band: F) -> Option<f64>
where
    F: Fn(u8) -> bool,
{
    let scores: Vec<f64> = topic
        .quiz_history
        .iter()
        .filter(|q| in_band(q.bloom_level))
        .map(|q| q.clamped_score())
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Gap analysis against the subject's exam format, `None` without a format
pub fn analyze_exam_format(subject: &Subject) -> Option<FormatAnalysis> {
    let format = subject.exam_format.as_ref()?;

    let weak_ids = |in_band: &dyn Fn(u8) -> bool| -> Vec<String> {
        subject
            .topics
            .iter()
            .filter(|t| band_average(t, in_band).is_some_and(|avg| avg < WEAK_FORMAT_SCORE))
            .map(|t| t.id.clone())
            .collect()
    };
    let high_bloom_weak_topics = weak_ids(&|level| level >= HIGH_BLOOM_LEVEL);
    let low_bloom_weak_topics = weak_ids(&|level| level < HIGH_BLOOM_LEVEL);

    let mut analysis = FormatAnalysis {
        weak_on_case_study: format.case_study > 0 && !high_bloom_weak_topics.is_empty(),
        weak_on_open_answer: format.open_answer > 0 && !high_bloom_weak_topics.is_empty(),
        weak_on_multiple_choice: format.multiple_choice > 0 && !low_bloom_weak_topics.is_empty(),
        high_bloom_weak_topics,
        low_bloom_weak_topics,
        tips: Vec::new(),
    };

    if analysis.weak_on_case_study {
        analysis.tips.push(format!(
            "The exam has {} case studies and {} topics are weak on applied questions; practice case analysis.",
            format.case_study,
            analysis.high_bloom_weak_topics.len()
        ));
    }
    if analysis.weak_on_open_answer {
        analysis.tips.push(format!(
            "The exam has {} open questions; practice writing full explanations for weak topics.",
            format.open_answer
        ));
    }
    if analysis.weak_on_multiple_choice {
        analysis.tips.push(format!(
            "The exam has {} multiple-choice questions and {} topics miss basic recall; drill definitions.",
            format.multiple_choice,
            analysis.low_bloom_weak_topics.len()
        ));
    }

    Some(analysis)
}
