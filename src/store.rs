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

use serde::Serialize;

use crate::error::Fallible;
use crate::scheduler::ReviewState;
use crate::types::timestamp::Timestamp;
use crate::types::word_hash::WordHash;

/// A word being tracked, together with its current scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub hash: WordHash,
    /// The word as the user typed it.
    pub word: String,
    /// Where the word was seen, if the user said.
    pub context: Option<String>,
    pub added_at: Timestamp,
    pub state: ReviewState,
    /// Bumped on every write; see [`VocabularyStore::update_state`].
    pub version: i64,
}

/// One row of review history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub hash: WordHash,
    pub reviewed_at: Timestamp,
    pub success: bool,
    pub quality_score: Option<u8>,
    pub interval: u32,
    pub ease_factor: f64,
    pub next_review_at: Timestamp,
}

impl ReviewRecord {
    pub fn new(
        hash: WordHash,
        success: bool,
        quality_score: Option<u8>,
        state: &ReviewState,
    ) -> Self {
        Self {
            hash,
            reviewed_at: state.scheduled_at,
            success,
            quality_score,
            interval: state.interval,
            ease_factor: state.ease_factor,
            next_review_at: state.next_review_at,
        }
    }
}

/// Persistence for vocabulary entries.
pub trait VocabularyStore {
    /// Add a new entry. Fails if an entry with the same hash exists.
    fn insert_entry(&self, entry: &VocabularyEntry) -> Fallible<()>;

    fn get_entry(&self, hash: WordHash) -> Fallible<Option<VocabularyEntry>>;

    /// Replace an entry's state and append to its history, provided the
    /// stored version still equals `expected_version`. Returns `false`, and
    /// writes nothing, if someone else got there first.
    fn update_state(
        &self,
        hash: WordHash,
        expected_version: i64,
        state: &ReviewState,
        review: &ReviewRecord,
    ) -> Fallible<bool>;

    /// Entries due at or before `now`, earliest first.
    fn due_entries(&self, now: Timestamp) -> Fallible<Vec<VocabularyEntry>>;

    fn all_entries(&self) -> Fallible<Vec<VocabularyEntry>>;

    /// The full review history, oldest first.
    fn reviews(&self) -> Fallible<Vec<ReviewRecord>>;
}
