// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spaced repetition scheduling for vocabulary entries.
//!
//! Both operations are pure: the caller supplies "now", and the scheduler
//! returns a fresh [`ReviewState`] without touching the clock, the database,
//! or the log.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::types::difficulty::Difficulty;
use crate::types::timestamp::Timestamp;

/// Seed interval, in days, for beginner words. Also the interval a word
/// falls back to after a failed review.
pub const BEGINNER_SEED_INTERVAL: u32 = 1;

/// Seed interval, in days, for intermediate words.
pub const INTERMEDIATE_SEED_INTERVAL: u32 = 2;

/// Seed interval, in days, for advanced words.
pub const ADVANCED_SEED_INTERVAL: u32 = 3;

/// The ease factor every new word starts with.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Added to the ease factor after a successful review.
pub const EASE_BONUS: f64 = 0.1;

/// Subtracted from the ease factor after a failed review.
pub const FAILURE_PENALTY: f64 = 0.2;

/// Successful reviews don't raise the ease factor past this.
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// The longest interval the scheduler will hand out.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// The largest interval cap a policy may configure. Far enough below the
/// end of the calendar that `now + interval` always exists.
pub const MAX_REPRESENTABLE_INTERVAL_DAYS: u32 = 1_000_000;

/// The highest accepted quality score.
pub const MAX_QUALITY_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The difficulty tier is not one of the known ones.
    InvalidDifficulty(String),
    /// The review outcome is malformed.
    InvalidOutcome(String),
    /// The state passed in breaks an invariant.
    CorruptState(String),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidDifficulty(value) => write!(f, "invalid difficulty: {value}"),
            SchedulerError::InvalidOutcome(reason) => write!(f, "invalid outcome: {reason}"),
            SchedulerError::CorruptState(reason) => write!(f, "corrupt review state: {reason}"),
        }
    }
}

impl Error for SchedulerError {}

/// The scheduling bookkeeping of a single vocabulary entry.
///
/// The counters are unsigned, so a negative value read from storage never
/// reaches the scheduler: the store reports it as a corrupt state when the
/// row is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// Days between `scheduled_at` and `next_review_at`.
    pub interval: u32,
    /// Consecutive successful reviews.
    pub repetition_count: u32,
    pub ease_factor: f64,
    /// When this state was computed.
    pub scheduled_at: Timestamp,
    /// Always `scheduled_at + interval` days.
    pub next_review_at: Timestamp,
    pub difficulty: Difficulty,
}

impl ReviewState {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at <= now
    }
}

/// The verdict of a single review. `success` is optional here only so that
/// a record decoded from the outside can be rejected when it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: Option<bool>,
    pub quality_score: Option<u8>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            success: Some(true),
            quality_score: None,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: Some(false),
            quality_score: None,
        }
    }

    pub fn with_quality(self, quality_score: u8) -> Self {
        Self {
            quality_score: Some(quality_score),
            ..self
        }
    }

    /// Check the outcome and return the success flag.
    pub fn validate(&self) -> Result<bool, SchedulerError> {
        let success = self
            .success
            .ok_or_else(|| SchedulerError::InvalidOutcome("missing success flag".to_string()))?;
        if let Some(quality) = self.quality_score {
            if quality > MAX_QUALITY_SCORE {
                return Err(SchedulerError::InvalidOutcome(format!(
                    "quality score {quality} is outside 0..={MAX_QUALITY_SCORE}"
                )));
            }
        }
        Ok(success)
    }
}

/// The tunable numbers behind the algorithm. The ease floor is not among
/// them: it is [`MIN_EASE_FACTOR`] for every policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerPolicy {
    pub beginner_seed_interval: u32,
    pub intermediate_seed_interval: u32,
    pub advanced_seed_interval: u32,
    pub initial_ease_factor: f64,
    pub ease_bonus: f64,
    pub failure_penalty: f64,
    pub max_ease_factor: f64,
    pub max_interval_days: u32,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            beginner_seed_interval: BEGINNER_SEED_INTERVAL,
            intermediate_seed_interval: INTERMEDIATE_SEED_INTERVAL,
            advanced_seed_interval: ADVANCED_SEED_INTERVAL,
            initial_ease_factor: INITIAL_EASE_FACTOR,
            ease_bonus: EASE_BONUS,
            failure_penalty: FAILURE_PENALTY,
            max_ease_factor: MAX_EASE_FACTOR,
            max_interval_days: MAX_INTERVAL_DAYS,
        }
    }
}

impl SchedulerPolicy {
    pub fn seed_interval(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Beginner => self.beginner_seed_interval,
            Difficulty::Intermediate => self.intermediate_seed_interval,
            Difficulty::Advanced => self.advanced_seed_interval,
        }
    }

    /// Returns a description of the first problem found, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.beginner_seed_interval < 1 {
            return Err("seed intervals must be at least one day".to_string());
        }
        if self.beginner_seed_interval > self.intermediate_seed_interval
            || self.intermediate_seed_interval > self.advanced_seed_interval
        {
            return Err("seed intervals must not decrease with difficulty".to_string());
        }
        if self.max_interval_days > MAX_REPRESENTABLE_INTERVAL_DAYS {
            return Err(format!(
                "the maximum interval must not exceed {MAX_REPRESENTABLE_INTERVAL_DAYS} days"
            ));
        }
        if self.advanced_seed_interval > self.max_interval_days {
            return Err("seed intervals must not exceed the maximum interval".to_string());
        }
        if !self.initial_ease_factor.is_finite() || self.initial_ease_factor < MIN_EASE_FACTOR {
            return Err(format!(
                "the initial ease factor must be at least {MIN_EASE_FACTOR}"
            ));
        }
        if !self.ease_bonus.is_finite() || self.ease_bonus < 0.0 {
            return Err("the ease bonus must be non-negative".to_string());
        }
        if !self.failure_penalty.is_finite() || self.failure_penalty < 0.0 {
            return Err("the failure penalty must be non-negative".to_string());
        }
        if !self.max_ease_factor.is_finite() || self.max_ease_factor < self.initial_ease_factor {
            return Err(
                "the maximum ease factor must be at least the initial ease factor".to_string(),
            );
        }
        Ok(())
    }
}

/// A scheduler bound to a policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    policy: SchedulerPolicy,
}

impl Scheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self { policy }
    }

    /// The state of a word that has just been logged.
    pub fn initial_state(
        &self,
        difficulty: Difficulty,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let interval = self.policy.seed_interval(difficulty);
        Ok(ReviewState {
            interval,
            repetition_count: 0,
            ease_factor: self.policy.initial_ease_factor,
            scheduled_at: now,
            next_review_at: project(now, interval)?,
            difficulty,
        })
    }

    /// The state after reviewing a word with the given outcome.
    pub fn next_state(
        &self,
        current: &ReviewState,
        outcome: &Outcome,
        now: Timestamp,
    ) -> Result<ReviewState, SchedulerError> {
        let success = outcome.validate()?;
        check_state(current)?;
        let (interval, repetition_count, ease_factor) = if success {
            (
                self.grow_interval(current),
                current.repetition_count.saturating_add(1),
                raise_ease(current.ease_factor, &self.policy),
            )
        } else {
            (
                self.policy.beginner_seed_interval,
                0,
                (current.ease_factor - self.policy.failure_penalty).max(MIN_EASE_FACTOR),
            )
        };
        Ok(ReviewState {
            interval,
            repetition_count,
            ease_factor,
            scheduled_at: now,
            next_review_at: project(now, interval)?,
            difficulty: current.difficulty,
        })
    }

    fn grow_interval(&self, current: &ReviewState) -> u32 {
        let cap = self.policy.max_interval_days;
        if current.interval >= cap {
            return current.interval;
        }
        let scaled = (f64::from(current.interval) * current.ease_factor).round();
        let grown = if scaled >= f64::from(cap) {
            cap
        } else {
            // Below the cap, so the cast is exact.
            scaled as u32
        };
        grown.max(current.interval + 1)
    }
}

/// [`Scheduler::initial_state`] with the default policy, taking the
/// difficulty as text.
pub fn initial_state(difficulty: &str, now: Timestamp) -> Result<ReviewState, SchedulerError> {
    let difficulty: Difficulty = difficulty.parse()?;
    Scheduler::default().initial_state(difficulty, now)
}

/// [`Scheduler::next_state`] with the default policy.
pub fn next_state(
    current: &ReviewState,
    outcome: &Outcome,
    now: Timestamp,
) -> Result<ReviewState, SchedulerError> {
    Scheduler::default().next_state(current, outcome, now)
}

fn raise_ease(ease: f64, policy: &SchedulerPolicy) -> f64 {
    // An ease already above the cap stays where it is.
    (ease + policy.ease_bonus).min(policy.max_ease_factor).max(ease)
}

fn check_state(state: &ReviewState) -> Result<(), SchedulerError> {
    if state.interval < 1 {
        return Err(SchedulerError::CorruptState(format!(
            "interval is {} days",
            state.interval
        )));
    }
    if !state.ease_factor.is_finite() || state.ease_factor < MIN_EASE_FACTOR {
        return Err(SchedulerError::CorruptState(format!(
            "ease factor {} is below {MIN_EASE_FACTOR}",
            state.ease_factor
        )));
    }
    Ok(())
}

fn project(now: Timestamp, interval: u32) -> Result<Timestamp, SchedulerError> {
    now.plus_days(interval).ok_or_else(|| {
        SchedulerError::CorruptState(format!(
            "review date {interval} days after {now} is out of range"
        ))
    })
}
