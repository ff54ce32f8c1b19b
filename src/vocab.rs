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

//! The vocabulary request handler: validates input, runs the scheduler, and
//! persists what it returns.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Outcome;
use crate::scheduler::Scheduler;
use crate::store::ReviewRecord;
use crate::store::VocabularyEntry;
use crate::store::VocabularyStore;
use crate::types::difficulty::Difficulty;
use crate::types::word_hash::WordHash;

/// The longest word accepted, in characters.
const MAX_WORD_LENGTH: usize = 100;

/// The longest context accepted, in characters.
const MAX_CONTEXT_LENGTH: usize = 500;

/// How many times a review is retried after losing a write race.
const MAX_UPDATE_ATTEMPTS: usize = 3;

pub struct VocabularyService<S: VocabularyStore, C: Clock> {
    store: S,
    clock: C,
    scheduler: Scheduler,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_words: usize,
    pub due_now: usize,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    pub review_count: usize,
    /// Fraction of reviews that succeeded. `None` before the first review.
    pub success_rate: Option<f64>,
    /// `None` when there are no words.
    pub mean_ease_factor: Option<f64>,
}

impl<S: VocabularyStore, C: Clock> VocabularyService<S, C> {
    pub fn new(store: S, clock: C, scheduler: Scheduler) -> Self {
        Self {
            store,
            clock,
            scheduler,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start tracking a word.
    pub fn log_word(
        &self,
        word: &str,
        difficulty: &str,
        context: Option<&str>,
    ) -> Fallible<VocabularyEntry> {
        let word = validate_word(word)?;
        let context = validate_context(context)?;
        let difficulty: Difficulty = difficulty.parse()?;
        let hash = WordHash::of(word);
        if self.store.get_entry(hash)?.is_some() {
            return fail(format!("word '{word}' is already being tracked"));
        }
        let now = self.clock.now();
        let state = self.scheduler.initial_state(difficulty, now)?;
        let entry = VocabularyEntry {
            hash,
            word: word.to_string(),
            context,
            added_at: now,
            state,
            version: 0,
        };
        self.store.insert_entry(&entry)?;
        log::info!(
            "Added '{word}' ({difficulty}), first review at {}",
            entry.state.next_review_at
        );
        Ok(entry)
    }

    /// Record the outcome of reviewing a word, and reschedule it.
    pub fn record_review(&self, word: &str, outcome: &Outcome) -> Fallible<VocabularyEntry> {
        let word = validate_word(word)?;
        let success = outcome.validate()?;
        let hash = WordHash::of(word);
        let now = self.clock.now();
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let Some(entry) = self.store.get_entry(hash)? else {
                return fail(format!("unknown word: '{word}'"));
            };
            let state = self.scheduler.next_state(&entry.state, outcome, now)?;
            let review = ReviewRecord::new(hash, success, outcome.quality_score, &state);
            if self
                .store
                .update_state(hash, entry.version, &state, &review)?
            {
                log::debug!(
                    "{} {} I={}d EF={:.2} reps={} due={}",
                    &hash.to_hex()[..8],
                    if success { "pass" } else { "fail" },
                    state.interval,
                    state.ease_factor,
                    state.repetition_count,
                    state.next_review_at
                );
                return Ok(VocabularyEntry {
                    state,
                    version: entry.version + 1,
                    ..entry
                });
            }
            log::debug!("Review of '{word}' lost a write race (attempt {attempt}).");
        }
        fail(format!(
            "could not save the review of '{word}': it kept changing concurrently"
        ))
    }

    pub fn get_word(&self, word: &str) -> Fallible<VocabularyEntry> {
        let word = validate_word(word)?;
        match self.store.get_entry(WordHash::of(word))? {
            Some(entry) => Ok(entry),
            None => fail(format!("unknown word: '{word}'")),
        }
    }

    /// Words whose review is due now, earliest first.
    pub fn due_words(&self) -> Fallible<Vec<VocabularyEntry>> {
        self.store.due_entries(self.clock.now())
    }

    pub fn stats(&self) -> Fallible<Stats> {
        let now = self.clock.now();
        let entries = self.store.all_entries()?;
        let reviews = self.store.reviews()?;

        let mut by_difficulty: BTreeMap<Difficulty, usize> =
            Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
        for entry in &entries {
            *by_difficulty.entry(entry.state.difficulty).or_default() += 1;
        }
        let due_now = entries.iter().filter(|e| e.state.is_due(now)).count();
        let success_rate = if reviews.is_empty() {
            None
        } else {
            let passed = reviews.iter().filter(|r| r.success).count();
            Some(passed as f64 / reviews.len() as f64)
        };
        let mean_ease_factor = if entries.is_empty() {
            None
        } else {
            let sum: f64 = entries.iter().map(|e| e.state.ease_factor).sum();
            Some(sum / entries.len() as f64)
        };
        Ok(Stats {
            total_words: entries.len(),
            due_now,
            by_difficulty,
            review_count: reviews.len(),
            success_rate,
            mean_ease_factor,
        })
    }
}

fn validate_word(word: &str) -> Fallible<&str> {
    let word = word.trim();
    if word.is_empty() {
        return fail("the word is empty.");
    }
    if word.chars().count() > MAX_WORD_LENGTH {
        return fail(format!(
            "the word is longer than {MAX_WORD_LENGTH} characters."
        ));
    }
    if word.chars().any(char::is_control) {
        return fail("the word contains control characters.");
    }
    Ok(word)
}

fn validate_context(context: Option<&str>) -> Fallible<Option<String>> {
    let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if context.chars().count() > MAX_CONTEXT_LENGTH {
        return fail(format!(
            "the context is longer than {MAX_CONTEXT_LENGTH} characters."
        ));
    }
    Ok(Some(context.to_string()))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::clock::FixedClock;
    use crate::clock::SystemClock;
    use crate::db::Database;
    use crate::scheduler::BEGINNER_SEED_INTERVAL;
    use crate::scheduler::ReviewState;
    use crate::types::timestamp::Timestamp;

    fn start() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap())
    }

    fn service() -> Fallible<VocabularyService<Database, FixedClock>> {
        Ok(VocabularyService::new(
            Database::in_memory()?,
            FixedClock::new(start()),
            Scheduler::default(),
        ))
    }

    #[test]
    fn test_log_word() -> Fallible<()> {
        let svc = service()?;
        let entry = svc.log_word("  Haus ", "intermediate", Some(" Das Haus ist rot. "))?;
        assert_eq!(entry.word, "Haus");
        assert_eq!(entry.context.as_deref(), Some("Das Haus ist rot."));
        assert_eq!(entry.added_at, start());
        assert_eq!(entry.state.interval, 2);
        assert_eq!(entry.state.next_review_at, start().plus_days(2).unwrap());
        assert_eq!(svc.get_word("haus")?, entry);
        Ok(())
    }

    #[test]
    fn test_returned_entry_matches_stored_entry_with_wall_clock() -> Fallible<()> {
        let svc = VocabularyService::new(
            Database::in_memory()?,
            SystemClock,
            Scheduler::default(),
        );
        let logged = svc.log_word("Haus", "beginner", None)?;
        assert_eq!(svc.get_word("Haus")?, logged);
        let reviewed = svc.record_review("Haus", &Outcome::success())?;
        assert_eq!(svc.get_word("Haus")?, reviewed);
        Ok(())
    }

    #[test]
    fn test_log_word_rejects_bad_input() -> Fallible<()> {
        let svc = service()?;
        assert!(svc.log_word("   ", "beginner", None).is_err());
        assert!(svc.log_word("a\u{7}b", "beginner", None).is_err());
        assert!(svc.log_word(&"x".repeat(101), "beginner", None).is_err());
        let err = svc.log_word("Haus", "expert", None).unwrap_err();
        assert_eq!(err.to_string(), "error: invalid difficulty: expert");
        assert!(svc.stats()?.total_words == 0);
        Ok(())
    }

    #[test]
    fn test_log_word_twice() -> Fallible<()> {
        let svc = service()?;
        svc.log_word("Haus", "beginner", None)?;
        assert!(svc.log_word("HAUS", "advanced", None).is_err());
        Ok(())
    }

    #[test]
    fn test_review_cycle() -> Fallible<()> {
        let svc = service()?;
        svc.log_word("Haus", "beginner", None)?;
        assert!(svc.due_words()?.is_empty());

        let mut clock_at = start();
        let mut previous = svc.get_word("Haus")?.state.interval;
        for _ in 0..3 {
            let due_at = svc.get_word("Haus")?.state.next_review_at;
            assert!(due_at > clock_at);
            clock_at = due_at;
            svc.clock.set(clock_at);
            assert_eq!(svc.due_words()?.len(), 1);
            let entry = svc.record_review("Haus", &Outcome::success().with_quality(4))?;
            assert!(entry.state.interval > previous);
            previous = entry.state.interval;
        }
        let entry = svc.get_word("Haus")?;
        assert_eq!(entry.state.repetition_count, 3);
        assert_eq!(entry.version, 3);
        assert_eq!(entry.state.scheduled_at, clock_at);
        assert!(svc.due_words()?.is_empty());

        let entry = svc.record_review("Haus", &Outcome::failure())?;
        assert_eq!(entry.state.repetition_count, 0);
        assert_eq!(entry.state.interval, BEGINNER_SEED_INTERVAL);
        assert_eq!(svc.store().reviews()?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_invalid_outcome_leaves_entry_untouched() -> Fallible<()> {
        let svc = service()?;
        let before = svc.log_word("Haus", "beginner", None)?;
        let err = svc.record_review("Haus", &Outcome::default()).unwrap_err();
        assert_eq!(err.to_string(), "error: invalid outcome: missing success flag");
        assert_eq!(svc.get_word("Haus")?, before);
        assert!(svc.store().reviews()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_review_unknown_word() -> Fallible<()> {
        let svc = service()?;
        assert!(svc.record_review("Baum", &Outcome::success()).is_err());
        assert!(svc.get_word("Baum").is_err());
        Ok(())
    }

    #[test]
    fn test_corrupt_state_is_surfaced() -> Fallible<()> {
        let svc = service()?;
        let mut entry = svc.log_word("Haus", "beginner", None)?;
        entry.hash = WordHash::of("Baum");
        entry.word = "Baum".to_string();
        entry.state.interval = 0;
        svc.store().insert_entry(&entry)?;
        let err = svc.record_review("Baum", &Outcome::success()).unwrap_err();
        assert!(err.to_string().contains("corrupt review state"));
        Ok(())
    }

    #[test]
    fn test_stats() -> Fallible<()> {
        let svc = service()?;
        let empty = svc.stats()?;
        assert_eq!(empty.total_words, 0);
        assert_eq!(empty.success_rate, None);
        assert_eq!(empty.mean_ease_factor, None);

        svc.log_word("eins", "beginner", None)?;
        svc.log_word("zwei", "beginner", None)?;
        svc.log_word("drei", "advanced", None)?;
        svc.clock.set(start().plus_days(1).unwrap());
        svc.record_review("eins", &Outcome::success())?;
        svc.record_review("zwei", &Outcome::failure())?;

        let stats = svc.stats()?;
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.by_difficulty[&Difficulty::Beginner], 2);
        assert_eq!(stats.by_difficulty[&Difficulty::Intermediate], 0);
        assert_eq!(stats.by_difficulty[&Difficulty::Advanced], 1);
        assert_eq!(stats.review_count, 2);
        assert_eq!(stats.success_rate, Some(0.5));
        assert_eq!(stats.due_now, 0);
        svc.clock.set(start().plus_days(3).unwrap());
        assert_eq!(svc.stats()?.due_now, 2);
        svc.clock.set(start().plus_days(4).unwrap());
        assert_eq!(svc.stats()?.due_now, 3);
        Ok(())
    }

    /// A store where another writer sneaks in just before each of our first
    /// `races` updates.
    struct RacyStore {
        inner: Database,
        races: Cell<u32>,
    }

    impl VocabularyStore for RacyStore {
        fn insert_entry(&self, entry: &VocabularyEntry) -> Fallible<()> {
            self.inner.insert_entry(entry)
        }

        fn get_entry(&self, hash: WordHash) -> Fallible<Option<VocabularyEntry>> {
            self.inner.get_entry(hash)
        }

        fn update_state(
            &self,
            hash: WordHash,
            expected_version: i64,
            state: &ReviewState,
            review: &ReviewRecord,
        ) -> Fallible<bool> {
            if self.races.get() > 0 {
                self.races.set(self.races.get() - 1);
                let theirs = crate::scheduler::next_state(
                    state,
                    &Outcome::failure(),
                    review.reviewed_at,
                )?;
                let record = ReviewRecord::new(hash, false, None, &theirs);
                assert!(
                    self.inner
                        .update_state(hash, expected_version, &theirs, &record)?
                );
            }
            self.inner.update_state(hash, expected_version, state, review)
        }

        fn due_entries(&self, now: Timestamp) -> Fallible<Vec<VocabularyEntry>> {
            self.inner.due_entries(now)
        }

        fn all_entries(&self) -> Fallible<Vec<VocabularyEntry>> {
            self.inner.all_entries()
        }

        fn reviews(&self) -> Fallible<Vec<ReviewRecord>> {
            self.inner.reviews()
        }
    }

    fn racy_service(races: u32) -> Fallible<VocabularyService<RacyStore, FixedClock>> {
        let store = RacyStore {
            inner: Database::in_memory()?,
            races: Cell::new(races),
        };
        Ok(VocabularyService::new(
            store,
            FixedClock::new(start()),
            Scheduler::default(),
        ))
    }

    #[test]
    fn test_review_retries_after_conflict() -> Fallible<()> {
        let svc = racy_service(1)?;
        svc.log_word("Haus", "advanced", None)?;
        let entry = svc.record_review("Haus", &Outcome::success())?;
        // The competing failure landed first; ours was computed on top of it.
        assert_eq!(entry.version, 2);
        assert_eq!(entry.state.repetition_count, 1);
        assert_eq!(svc.store().reviews()?.len(), 2);
        assert_eq!(svc.get_word("Haus")?, entry);
        Ok(())
    }

    #[test]
    fn test_review_gives_up_after_repeated_conflicts() -> Fallible<()> {
        let svc = racy_service(MAX_UPDATE_ATTEMPTS as u32)?;
        svc.log_word("Haus", "advanced", None)?;
        assert!(svc.record_review("Haus", &Outcome::success()).is_err());
        Ok(())
    }
}
