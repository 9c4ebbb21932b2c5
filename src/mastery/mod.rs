//! Mastery & Priority Scorer
//!
//! - Weighted mastery: recency-weighted mean of quiz scores (0..100)
//! - Priority: ranking key for review urgency, lower = more urgent
//!
//! Both are read-only queries over a topic snapshot; nothing here mutates
//! status or memory state.

use chrono::NaiveDate;

use crate::types::{Topic, TopicStatus, EPSILON};

/// Priority cushion per Bloom level
const BLOOM_CUSHION: f64 = 5.0;

/// Staleness penalty per day since last review
const STALENESS_PER_DAY: f64 = 2.0;

/// Cap on the staleness penalty
const MAX_STALENESS_PENALTY: f64 = 20.0;

/// Extra weight the latest attempt can get over the first (1.0 -> 1.5)
const RECENCY_BOOST: f64 = 0.5;

/// Fixed priority penalty per status bucket
pub fn status_penalty(status: TopicStatus) -> f64 {
    match status {
        TopicStatus::NotStarted => 30.0,
        TopicStatus::Weak => 20.0,
        TopicStatus::Learned => 10.0,
        TopicStatus::Solid => 0.0,
    }
}

/// Recency multiplier for the i-th attempt (oldest first)
pub fn recency_factor(index: usize, history_len: usize) -> f64 {
    if history_len == 0 {
        return 1.0;
    }
    1.0 + RECENCY_BOOST * (index as f64 / history_len as f64)
}

/// Recency-weighted mastery score in [0, 100], 0 for an empty history
pub fn weighted_mastery_score(topic: &Topic) -> f64 {
    let history = &topic.quiz_history;
    if history.is_empty() {
        return 0.0;
    }

    let len = history.len();
    let (weighted_sum, weight_sum) = history.iter().enumerate().fold(
        (0.0, 0.0),
        |(ws, w), (i, quiz)| {
            let effective = quiz.effective_weight() * recency_factor(i, len);
            (ws + quiz.clamped_score() * effective, w + effective)
        },
    );

    if weight_sum <= EPSILON {
        return 0.0;
    }
    (weighted_sum / weight_sum).round().clamp(0.0, 100.0)
}

/// Staleness penalty: two points per day, capped at 20; never reviewed = 20
pub fn staleness_penalty(topic: &Topic, today: NaiveDate) -> f64 {
    match topic.days_since_review(today) {
        Some(days) => (days as f64 * STALENESS_PER_DAY).min(MAX_STALENESS_PENALTY),
        None => MAX_STALENESS_PENALTY,
    }
}

/// Review priority, lower = more urgent, never negative
pub fn topic_priority(topic: &Topic, today: NaiveDate) -> f64 {
    let priority = weighted_mastery_score(topic)
        + f64::from(topic.bloom_level()) * BLOOM_CUSHION
        - staleness_penalty(topic, today)
        - status_penalty(topic.status);
    priority.max(0.0)
}

/// Topics ordered most-urgent first; ties keep input order
pub fn rank_topics<'a>(topics: &'a [Topic], today: NaiveDate) -> Vec<&'a Topic> {
    let mut keyed: Vec<(f64, &Topic)> = topics
        .iter()
        .map(|t| (topic_priority(t, today), t))
        .collect();
    // sort_by is stable
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, t)| t).collect()
}

/// Up to `limit` most urgent topics that pass `filter`
pub fn top_priority_topics<'a, F>(
    topics: &'a [Topic],
    today: NaiveDate,
    limit: usize,
    filter: F,
) -> Vec<&'a Topic>
where
    F: Fn(&Topic) -> bool,
{
    rank_topics(topics, today)
        .into_iter()
        .filter(|t| filter(t))
        .take(limit)
        .collect()
}

// ==================== Tests ====================
