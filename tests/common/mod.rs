//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};

use study_engine::{QuizAttempt, Subject, Topic, TopicStatus};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub fn days_ahead(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub struct TopicBuilder {
    topic: Topic,
}

impl TopicBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            topic: Topic::new(id, id),
        }
    }

    pub fn status(mut self, status: TopicStatus) -> Self {
        self.topic.status = status;
        self
    }

    pub fn reviewed_days_ago(mut self, days: i64) -> Self {
        self.topic.last_reviewed = Some(days_ago(days));
        self
    }

    pub fn grades(mut self, grades: &[f64]) -> Self {
        self.topic.grades = grades.to_vec();
        self
    }

    pub fn quiz(mut self, days_ago_taken: i64, bloom_level: u8, score: f64) -> Self {
        self.topic
            .quiz_history
            .push(QuizAttempt::new(days_ago(days_ago_taken), bloom_level, score));
        self
    }

    pub fn build(self) -> Topic {
        self.topic
    }
}

pub fn subject(id: &str, topics: Vec<Topic>, exam_in_days: Option<i64>) -> Subject {
    let mut s = Subject::new(id, id);
    s.topics = topics;
    s.exam_date = exam_in_days.map(days_ahead);
    s
}
