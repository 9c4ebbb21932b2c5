//! Decay State Machine
//!
//! Ages a topic's status bucket by the time elapsed since it was last touched.
//!
//! Each status owns an ordered list of `(threshold_days, downgrade_to)` rules.
//! Rules are evaluated top-down and the first match wins; the list order is
//! part of the behavior and must not be re-sorted.
//!
//! | Status    | Rules (in order)                     |
//! |-----------|--------------------------------------|
//! | Solid     | >= 28 -> Weak, >= 18 -> Learned      |
//! | Learned   | >= 28 -> NotStarted, >= 14 -> Weak   |
//! | Weak      | >= 18 -> NotStarted                  |
//! | NotStarted| never decays                         |
//!
//! The clock for a topic starts at the later of its last review and its last
//! status change, so a downgrade applied today cannot cascade further today.

use chrono::NaiveDate;

use crate::types::{Subject, Topic, TopicStatus};

/// One downgrade rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayRule {
    pub threshold_days: i64,
    pub downgrade_to: TopicStatus,
}

const fn rule(threshold_days: i64, downgrade_to: TopicStatus) -> DecayRule {
    DecayRule {
        threshold_days,
        downgrade_to,
    }
}

const SOLID_RULES: [DecayRule; 2] = [
    rule(28, TopicStatus::Weak),
    rule(18, TopicStatus::Learned),
];

const LEARNED_RULES: [DecayRule; 2] = [
    rule(28, TopicStatus::NotStarted),
    rule(14, TopicStatus::Weak),
];

const WEAK_RULES: [DecayRule; 1] = [rule(18, TopicStatus::NotStarted)];

/// Ordered rule list for a status
pub fn decay_rules(status: TopicStatus) -> &'static [DecayRule] {
    match status {
        TopicStatus::Solid => &SOLID_RULES,
        TopicStatus::Learned => &LEARNED_RULES,
        TopicStatus::Weak => &WEAK_RULES,
        TopicStatus::NotStarted => &[],
    }
}

/// Status after decay given the elapsed days (`None` = never, i.e. infinite)
pub fn decayed_status(status: TopicStatus, elapsed_days: Option<i64>) -> TopicStatus {
    decay_rules(status)
        .iter()
        .find(|r| elapsed_days.map_or(true, |d| d >= r.threshold_days))
        .map_or(status, |r| r.downgrade_to)
}

/// Days since the decay clock last reset
pub fn decay_elapsed_days(topic: &Topic, today: NaiveDate) -> Option<i64> {
    let anchor = match (topic.last_reviewed, topic.status_changed_at) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    anchor.map(|d| (today - d).num_days().max(0))
}

/// Apply one decay step to a topic
pub fn apply_decay(topic: &Topic, today: NaiveDate) -> Topic {
    let mut next = topic.clone();
    if topic.status == TopicStatus::NotStarted {
        return next;
    }

    let elapsed = decay_elapsed_days(topic, today);
    let status = decayed_status(topic.status, elapsed);
    if status != topic.status {
        tracing::debug!(
            topic_id = %topic.id,
            from = topic.status.as_str(),
            to = status.as_str(),
            elapsed_days = ?elapsed,
            "topic decayed"
        );
        next.status = status;
        next.status_changed_at = Some(today);
    }
    next
}

/// Apply one decay step to every topic of every subject
pub fn apply_decay_to_all(subjects: &[Subject], today: NaiveDate) -> Vec<Subject> {
    subjects
        .iter()
        .map(|subject| Subject {
            topics: subject
                .topics
                .iter()
                .map(|t| apply_decay(t, today))
                .collect(),
            ..subject.clone()
        })
        .collect()
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn topic(status: TopicStatus, days_ago: Option<i64>) -> Topic {
        let mut t = Topic::new("t", "Topic");
        t.status = status;
        t.last_reviewed = days_ago.map(|d| today() - Duration::days(d));
        t
    }

    #[test]
    fn test_solid_30_days_goes_to_weak() {
        let t = apply_decay(&topic(TopicStatus::Solid, Some(30)), today());
        assert_eq!(t.status, TopicStatus::Weak);
        assert_eq!(t.status_changed_at, Some(today()));
    }

    #[test]
    fn test_solid_boundaries() {
        assert_eq!(decayed_status(TopicStatus::Solid, Some(17)), TopicStatus::Solid);
        assert_eq!(decayed_status(TopicStatus::Solid, Some(18)), TopicStatus::Learned);
        assert_eq!(decayed_status(TopicStatus::Solid, Some(27)), TopicStatus::Learned);
        assert_eq!(decayed_status(TopicStatus::Solid, Some(28)), TopicStatus::Weak);
    }

    #[test]
    fn test_learned_boundaries() {
        assert_eq!(decayed_status(TopicStatus::Learned, Some(13)), TopicStatus::Learned);
        assert_eq!(decayed_status(TopicStatus::Learned, Some(14)), TopicStatus::Weak);
        assert_eq!(decayed_status(TopicStatus::Learned, Some(28)), TopicStatus::NotStarted);
    }

    #[test]
    fn test_weak_boundaries() {
        assert_eq!(decayed_status(TopicStatus::Weak, Some(17)), TopicStatus::Weak);
        assert_eq!(decayed_status(TopicStatus::Weak, Some(18)), TopicStatus::NotStarted);
    }

    #[test]
    fn test_never_reviewed_takes_first_rule() {
        assert_eq!(decayed_status(TopicStatus::Solid, None), TopicStatus::Weak);
        assert_eq!(decayed_status(TopicStatus::Learned, None), TopicStatus::NotStarted);
        assert_eq!(decayed_status(TopicStatus::Weak, None), TopicStatus::NotStarted);
    }

    #[test]
    fn test_not_started_never_decays() {
        let t = topic(TopicStatus::NotStarted, None);
        let decayed = apply_decay(&t, today());
        assert_eq!(decayed, t);
    }

    #[test]
    fn test_fresh_topic_unchanged() {
        let t = topic(TopicStatus::Solid, Some(3));
        assert_eq!(apply_decay(&t, today()), t);
    }

    #[test]
    fn test_same_day_idempotent() {
        for status in [TopicStatus::Solid, TopicStatus::Learned, TopicStatus::Weak] {
            for days in [None, Some(0), Some(14), Some(18), Some(28), Some(90)] {
                let once = apply_decay(&topic(status, days), today());
                let twice = apply_decay(&once, today());
                assert_eq!(once, twice, "status {:?} days {:?}", status, days);
            }
        }
    }

    #[test]
    fn test_clock_restarts_after_downgrade() {
        let once = apply_decay(&topic(TopicStatus::Solid, Some(30)), today());
        assert_eq!(once.status, TopicStatus::Weak);

        let later = today() + Duration::days(17);
        assert_eq!(apply_decay(&once, later).status, TopicStatus::Weak);

        let much_later = today() + Duration::days(18);
        assert_eq!(apply_decay(&once, much_later).status, TopicStatus::NotStarted);
    }

    #[test]
    fn test_last_review_is_preserved() {
        let t = topic(TopicStatus::Learned, Some(20));
        let decayed = apply_decay(&t, today());
        assert_eq!(decayed.status, TopicStatus::Weak);
        assert_eq!(decayed.last_reviewed, t.last_reviewed);
    }

    #[test]
    fn test_apply_decay_to_all() {
        let mut subject = Subject::new("s", "Subject");
        subject.topics = vec![
            topic(TopicStatus::Solid, Some(30)),
            topic(TopicStatus::Weak, Some(1)),
        ];
        let out = apply_decay_to_all(&[subject.clone()], today());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].topics[0].status, TopicStatus::Weak);
        assert_eq!(out[0].topics[1].status, TopicStatus::Weak);
        // input untouched
        assert_eq!(subject.topics[0].status, TopicStatus::Solid);
    }
}
