//! Property-Based Tests for the study engine
//!
//! Tests the following invariants:
//! - Grade bounds: current and idealized in [2, 6], quarter-point steps
//! - Mastery bounds: weighted mastery in [0, 100], 0 for empty history
//! - Priority is never negative
//! - Decay is idempotent and never raises a status
//! - Simulation ordering: worst <= expected <= best
//! - Plan budget: planned minutes never exceed the budget
//! - Memory model: retrievability falls with time, next review >= 0

mod common;

use chrono::{Duration, Weekday};
use proptest::prelude::*;

use common::today;
use study_engine::{
    apply_decay, generate_daily_plan, initialize_memory_state, next_review_in_days,
    predict_grade, retrievability, topic_priority, update_memory_state, weighted_mastery_score,
    ExamFormat, ExamSimulator, QuestionBankRecord, QuizAttempt, ScheduleEntry, SimulationOptions,
    Subject, Topic, TopicSize, TopicStatus,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_status() -> impl Strategy<Value = TopicStatus> {
    prop_oneof![
        Just(TopicStatus::NotStarted),
        Just(TopicStatus::Weak),
        Just(TopicStatus::Learned),
        Just(TopicStatus::Solid),
    ]
}

fn arb_size() -> impl Strategy<Value = Option<TopicSize>> {
    proptest::option::of(prop_oneof![
        Just(TopicSize::Small),
        Just(TopicSize::Medium),
        Just(TopicSize::Large),
    ])
}

fn arb_quiz() -> impl Strategy<Value = QuizAttempt> {
    (
        0i64..60,       // days ago
        0u8..=8,        // bloom level, out of range on purpose
        -20.0f64..130.0, // score, out of range on purpose
        0.0f64..3.0,    // weight
    )
        .prop_map(|(ago, level, score, weight)| {
            QuizAttempt::new(today() - Duration::days(ago), level, score).with_weight(weight)
        })
}

fn arb_topic() -> impl Strategy<Value = Topic> {
    (
        "[a-z]{1,6}",
        arb_status(),
        proptest::option::of(0i64..90),           // last reviewed, days ago
        proptest::option::of(0i64..90),           // status changed, days ago
        proptest::collection::vec(0.0f64..9.0, 0..5), // grades, some out of range
        proptest::collection::vec(arb_quiz(), 0..6),
        0u8..=9,
        arb_size(),
    )
        .prop_map(
            |(id, status, reviewed, changed, grades, quiz_history, bloom, size)| {
                let mut t = Topic::new(id.clone(), id);
                t.status = status;
                t.last_reviewed = reviewed.map(|d| today() - Duration::days(d));
                t.status_changed_at = changed.map(|d| today() - Duration::days(d));
                t.grades = grades;
                t.quiz_history = quiz_history;
                t.current_bloom_level = bloom;
                t.size = size;
                t
            },
        )
}

fn arb_format() -> impl Strategy<Value = Option<ExamFormat>> {
    proptest::option::of((0u32..30, 0u32..5, 0u32..3, 0u32..10).prop_map(
        |(multiple_choice, open_answer, case_study, topics_drawn)| ExamFormat {
            multiple_choice,
            open_answer,
            case_study,
            topics_drawn,
        },
    ))
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    (
        "[a-z]{1,4}",
        proptest::collection::vec(arb_topic(), 0..10),
        proptest::option::of(-5i64..40),
        arb_format(),
    )
        .prop_map(|(id, mut topics, exam_in, exam_format)| {
            // topic ids unique within a subject
            for (i, t) in topics.iter_mut().enumerate() {
                t.id = format!("{}-{i}", t.id);
            }
            let mut s = Subject::new(id.clone(), id);
            s.topics = topics;
            s.exam_date = exam_in.map(|d| today() + Duration::days(d));
            s.exam_format = exam_format;
            s
        })
}

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0u8..7).prop_map(|d| match d {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    })
}

fn small_simulator(seed: u64) -> ExamSimulator {
    ExamSimulator::with_options(SimulationOptions {
        iterations: Some(64),
        parallel_threshold: None,
        seed: Some(seed),
    })
}

fn is_quarter_step(x: f64) -> bool {
    ((x * 4.0).round() - x * 4.0).abs() < 1e-9
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_grade_bounds(
        subject in arb_subject(),
        idealized in any::<bool>(),
        attempted in 0u32..50,
        correct in 0u32..60,
        seed in any::<u64>(),
    ) {
        let records = [QuestionBankRecord { topic_id: None, attempted, correct }];
        let mut simulator = small_simulator(seed);
        let p = predict_grade(&subject, today(), idealized, Some(&records[..]), &mut simulator);

        prop_assert!((2.0..=6.0).contains(&p.current), "current {}", p.current);
        prop_assert!((2.0..=6.0).contains(&p.idealized), "idealized {}", p.idealized);
        prop_assert!(is_quarter_step(p.current));
        prop_assert!(is_quarter_step(p.idealized));
        prop_assert!(p.idealized >= p.current);
        if !idealized {
            prop_assert_eq!(p.idealized, p.current);
        }
    }

    #[test]
    fn prop_mastery_bounds(topic in arb_topic()) {
        let m = weighted_mastery_score(&topic);
        prop_assert!((0.0..=100.0).contains(&m));
        if topic.quiz_history.is_empty() {
            prop_assert_eq!(m, 0.0);
        }
    }

    #[test]
    fn prop_priority_non_negative(topic in arb_topic()) {
        let p = topic_priority(&topic, today());
        prop_assert!(p >= 0.0 && p.is_finite());
    }

    #[test]
    fn prop_decay_idempotent(topic in arb_topic(), offset in 0i64..120) {
        let day = today() + Duration::days(offset);
        let once = apply_decay(&topic, day);
        let twice = apply_decay(&once, day);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_decay_never_raises(topic in arb_topic(), offset in 0i64..120) {
        let day = today() + Duration::days(offset);
        let decayed = apply_decay(&topic, day);
        prop_assert!(decayed.status.rank() <= topic.status.rank());
        prop_assert_eq!(decayed.last_reviewed, topic.last_reviewed);
    }

    #[test]
    fn prop_simulation_ordering(
        topics in proptest::collection::vec(arb_topic(), 1..15),
        k in 1usize..20,
        iterations in 1usize..200,
        seed in any::<u64>(),
    ) {
        let mut simulator = ExamSimulator::with_seed(seed);
        let r = simulator.simulate_with_iterations(&topics, k, iterations);
        prop_assert!(r.worst_case <= r.expected, "{} > {}", r.worst_case, r.expected);
        prop_assert!(r.expected <= r.best_case, "{} > {}", r.expected, r.best_case);
        prop_assert!(r.worst_case >= 2.0 && r.best_case <= 6.0);
        prop_assert!(r.critical_topics.len() <= 5);
    }

    #[test]
    fn prop_plan_budget(
        subjects in proptest::collection::vec(arb_subject(), 0..5),
        prep in proptest::collection::vec((arb_weekday(), 0usize..5, any::<bool>()), 0..6),
        budget in 0u32..600,
    ) {
        let schedule: Vec<ScheduleEntry> = prep
            .into_iter()
            .filter_map(|(day, idx, requires_preparation)| {
                subjects.get(idx).map(|s| ScheduleEntry {
                    day,
                    subject_id: s.id.clone(),
                    requires_preparation,
                })
            })
            .collect();
        let tasks = generate_daily_plan(&subjects, &schedule, budget, today());
        let total: u32 = tasks.iter().map(|t| t.estimated_minutes).sum();
        prop_assert!(total <= budget, "planned {} of {}", total, budget);
        prop_assert!(tasks.iter().all(|t| t.estimated_minutes > 0 && !t.topics.is_empty()));

        let mut seen = std::collections::HashSet::new();
        for task in &tasks {
            for topic in &task.topics {
                prop_assert!(seen.insert((task.subject_id.clone(), topic.clone())));
            }
        }
    }

    #[test]
    fn prop_memory_model(
        first in 0.0f64..=100.0,
        scores in proptest::collection::vec(0.0f64..=100.0, 0..8),
        t1 in 0.0f64..400.0,
        dt in 0.0f64..400.0,
        retention in 0.5f64..0.99,
    ) {
        let mut state = initialize_memory_state(first);
        for score in scores {
            state = update_memory_state(&state, score);
            prop_assert!(state.is_valid());
        }
        let r1 = retrievability(&state, t1);
        let r2 = retrievability(&state, t1 + dt);
        prop_assert!(r1 > 0.0 && r1 <= 1.0);
        prop_assert!(r2 <= r1);
        prop_assert!(next_review_in_days(&state, retention) >= 0.0);
    }
}
