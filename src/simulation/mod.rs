//! Monte Carlo Exam Simulator
//!
//! Repeatedly draws which topics "appear" on the exam and records the mean
//! topic score of each draw.
//!
//! Per-topic score:
//! - Base by status: Solid 5.5, Learned 4.5, Weak 3.5, NotStarted 2.5
//! - Averaged with the topic's grade mean when it has grades
//!
//! Outputs:
//! - `expected`: mean of trial means
//! - `variance`: population standard deviation of trial means
//! - `best_case` / `worst_case`: 95th / 5th percentile trial mean
//! - Critical topics: weakest NotStarted/Weak topics with their impact
//!
//! The simulator owns its PRNG (ChaCha8) so runs are reproducible with a seed.
//! Large iteration counts are split into chunks evaluated in parallel with
//! Rayon; each chunk gets its own PRNG seeded from the simulator, which keeps
//! seeded results stable regardless of thread scheduling.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sanitize::round2;
use crate::types::{Topic, TopicStatus, GRADE_MIN};

// ==================== Constants ====================

/// Default trial count
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Iteration count at which trials are evaluated in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Score a critical topic is hypothetically raised to
pub const IMPROVED_SCORE: f64 = 5.0;

/// Maximum number of critical topics reported
pub const MAX_CRITICAL_TOPICS: usize = 5;

/// Trials per parallel chunk
const CHUNK_SIZE: usize = 1024;

// ==================== Data Structures ====================

/// Impact of raising one weak topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicImpact {
    pub topic_id: String,
    pub name: String,
    /// Current simulated score on the 2..6 scale
    pub current_score: f64,
    /// Expected shift of the mean exam grade if raised to `IMPROVED_SCORE`
    pub impact: f64,
}

/// Simulation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub best_case: f64,
    pub worst_case: f64,
    pub expected: f64,
    /// Population standard deviation of the trial means
    pub variance: f64,
    pub iterations: usize,
    pub topics_on_exam: usize,
    /// Ids of the weakest NotStarted/Weak topics, weakest first
    pub critical_topics: Vec<String>,
    /// Critical topics ordered by impact, largest first
    pub impact_topics: Vec<TopicImpact>,
}

impl SimulationResult {
    /// All outcomes at the grade floor with no topics
    pub fn degenerate() -> Self {
        Self {
            best_case: GRADE_MIN,
            worst_case: GRADE_MIN,
            expected: GRADE_MIN,
            variance: 0.0,
            iterations: 0,
            topics_on_exam: 0,
            critical_topics: Vec::new(),
            impact_topics: Vec::new(),
        }
    }
}

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOptions {
    pub iterations: Option<usize>,
    pub parallel_threshold: Option<usize>,
    /// Random seed for reproducibility (optional)
    pub seed: Option<u64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            iterations: Some(DEFAULT_ITERATIONS),
            parallel_threshold: Some(DEFAULT_PARALLEL_THRESHOLD),
            seed: None,
        }
    }
}

// ==================== Scoring ====================

/// Base simulated score per status
pub fn status_base_score(status: TopicStatus) -> f64 {
    match status {
        TopicStatus::Solid => 5.5,
        TopicStatus::Learned => 4.5,
        TopicStatus::Weak => 3.5,
        TopicStatus::NotStarted => 2.5,
    }
}

/// Simulated score of a topic on the 2..6 scale
pub fn simulated_topic_score(topic: &Topic) -> f64 {
    let base = status_base_score(topic.status);
    match topic.avg_grade() {
        Some(avg) => (base + avg) / 2.0,
        None => base,
    }
}

// ==================== Main Implementation ====================

/// Monte Carlo exam simulator
#[derive(Debug, Clone)]
pub struct ExamSimulator {
    rng: ChaCha8Rng,
    iterations: usize,
    parallel_threshold: usize,
}

impl Default for ExamSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamSimulator {
    /// Create a simulator seeded from the system clock
    pub fn new() -> Self {
        Self::with_options(SimulationOptions::default())
    }

    /// Create a simulator with custom options
    pub fn with_options(options: SimulationOptions) -> Self {
        let seed = options.seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });

        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            iterations: options.iterations.unwrap_or(DEFAULT_ITERATIONS),
            parallel_threshold: options
                .parallel_threshold
                .unwrap_or(DEFAULT_PARALLEL_THRESHOLD)
                .max(1),
        }
    }

    /// Create a simulator with a specific seed (for testing)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_options(SimulationOptions {
            seed: Some(seed),
            ..SimulationOptions::default()
        })
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run with the configured iteration count
    pub fn simulate(&mut self, topics: &[Topic], topics_on_exam: usize) -> SimulationResult {
        self.simulate_with_iterations(topics, topics_on_exam, self.iterations)
    }

    /// Run with an explicit iteration count
    pub fn simulate_with_iterations(
        &mut self,
        topics: &[Topic],
        topics_on_exam: usize,
        iterations: usize,
    ) -> SimulationResult {
        if topics.is_empty() || topics_on_exam == 0 || iterations == 0 {
            return SimulationResult::degenerate();
        }

        let k = topics_on_exam.min(topics.len());
        let scores: Vec<f64> = topics.iter().map(simulated_topic_score).collect();

        let mut trial_means = if iterations >= self.parallel_threshold {
            tracing::debug!(iterations, topics = topics.len(), k, "running parallel exam simulation");
            self.run_parallel(&scores, k, iterations)
        } else {
            run_trials(&mut self.rng, &scores, k, iterations)
        };

        trial_means.sort_by(f64::total_cmp);

        let n = trial_means.len() as f64;
        let expected = trial_means.iter().sum::<f64>() / n;
        let std_dev = (trial_means
            .iter()
            .map(|m| (m - expected).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        let best_idx = ((iterations as f64 * 0.95).floor() as usize).min(iterations - 1);
        let worst_idx = ((iterations as f64 * 0.05).floor() as usize).min(iterations - 1);
        let best_case = trial_means[best_idx].max(expected);
        let worst_case = trial_means[worst_idx].min(expected);

        let (critical_topics, impact_topics) = critical_topic_impacts(topics, &scores);

        SimulationResult {
            best_case: round2(best_case),
            worst_case: round2(worst_case),
            expected: round2(expected),
            variance: round2(std_dev),
            iterations,
            topics_on_exam: k,
            critical_topics,
            impact_topics,
        }
    }

    /// Evaluate trials in chunks across the Rayon pool
    fn run_parallel(&mut self, scores: &[f64], k: usize, iterations: usize) -> Vec<f64> {
        let chunk_count = iterations.div_ceil(CHUNK_SIZE);
        let chunks: Vec<(u64, usize)> = (0..chunk_count)
            .map(|i| {
                let len = CHUNK_SIZE.min(iterations - i * CHUNK_SIZE);
                (self.rng.gen::<u64>(), len)
            })
            .collect();

        chunks
            .par_iter()
            .flat_map_iter(|&(seed, len)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                run_trials(&mut rng, scores, k, len)
            })
            .collect()
    }
}

/// Shuffle-and-take trials, returning one mean per trial
fn run_trials<R: Rng + ?Sized>(rng: &mut R, scores: &[f64], k: usize, iterations: usize) -> Vec<f64> {
    let mut deck: Vec<f64> = scores.to_vec();
    (0..iterations)
        .map(|_| {
            deck.shuffle(rng);
            deck[..k].iter().sum::<f64>() / k as f64
        })
        .collect()
}

/// Weakest NotStarted/Weak topics and the impact of raising each
fn critical_topic_impacts(topics: &[Topic], scores: &[f64]) -> (Vec<String>, Vec<TopicImpact>) {
    let n = topics.len() as f64;
    let mut weak: Vec<(usize, f64)> = topics
        .iter()
        .zip(scores)
        .enumerate()
        .filter(|(_, (t, _))| matches!(t.status, TopicStatus::NotStarted | TopicStatus::Weak))
        .map(|(i, (_, &s))| (i, s))
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));
    weak.truncate(MAX_CRITICAL_TOPICS);

    let critical = weak.iter().map(|&(i, _)| topics[i].id.clone()).collect();

    let mut impacts: Vec<TopicImpact> = weak
        .iter()
        .map(|&(i, score)| TopicImpact {
            topic_id: topics[i].id.clone(),
            name: topics[i].display_name().to_string(),
            current_score: round2(score),
            impact: round2(((IMPROVED_SCORE - score) / n).max(0.0)),
        })
        .collect();
    impacts.sort_by(|a, b| b.impact.total_cmp(&a.impact));

    (critical, impacts)
}

/// Run a simulation with a fresh, clock-seeded simulator
pub fn simulate_exam_outcome(
    topics: &[Topic],
    topics_on_exam: usize,
    iterations: Option<usize>,
) -> SimulationResult {
    let mut simulator = ExamSimulator::new();
    simulator.simulate_with_iterations(topics, topics_on_exam, iterations.unwrap_or(DEFAULT_ITERATIONS))
}

// ==================== Tests ====================
