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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use rusqlite::types::Type;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::ReviewState;
use crate::scheduler::SchedulerError;
use crate::store::ReviewRecord;
use crate::store::VocabularyEntry;
use crate::store::VocabularyStore;
use crate::types::timestamp::Timestamp;
use crate::types::word_hash::WordHash;

const ENTRY_COLUMNS: &str = "word_hash, word, context, added_at, difficulty, interval_days, repetition_count, ease_factor, scheduled_at, next_review_at, version";

/// SQLite-backed [`VocabularyStore`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// An empty database that lives only as long as this value.
    pub fn in_memory() -> Fallible<Self> {
        Self::new(":memory:")
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl VocabularyStore for Database {
    fn insert_entry(&self, entry: &VocabularyEntry) -> Fallible<()> {
        log::debug!("Inserting word: {}", entry.hash);
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        if entry_exists(&tx, entry.hash)? {
            return fail(format!("word '{}' is already being tracked", entry.word));
        }
        let sql = format!(
            "insert into words ({ENTRY_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        let state = &entry.state;
        tx.execute(
            &sql,
            (
                entry.hash,
                &entry.word,
                &entry.context,
                entry.added_at,
                state.difficulty,
                state.interval,
                state.repetition_count,
                state.ease_factor,
                state.scheduled_at,
                state.next_review_at,
                entry.version,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_entry(&self, hash: WordHash) -> Fallible<Option<VocabularyEntry>> {
        let conn = self.acquire();
        let sql = format!("select {ENTRY_COLUMNS} from words where word_hash = ?;");
        let entry = conn
            .query_row(&sql, [hash], read_entry)
            .optional()?;
        Ok(entry)
    }

    fn update_state(
        &self,
        hash: WordHash,
        expected_version: i64,
        state: &ReviewState,
        review: &ReviewRecord,
    ) -> Fallible<bool> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let sql = "update words set interval_days = ?, repetition_count = ?, ease_factor = ?, scheduled_at = ?, next_review_at = ?, version = version + 1 where word_hash = ? and version = ?;";
        let updated = tx.execute(
            sql,
            (
                state.interval,
                state.repetition_count,
                state.ease_factor,
                state.scheduled_at,
                state.next_review_at,
                hash,
                expected_version,
            ),
        )?;
        if updated == 0 {
            log::debug!("Version conflict on {hash} at version {expected_version}");
            return Ok(false);
        }
        insert_review(&tx, review)?;
        tx.commit()?;
        Ok(true)
    }

    fn due_entries(&self, now: Timestamp) -> Fallible<Vec<VocabularyEntry>> {
        let conn = self.acquire();
        let sql = format!(
            "select {ENTRY_COLUMNS} from words where next_review_at <= ? order by next_review_at, word;"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([now], read_entry)?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn all_entries(&self) -> Fallible<Vec<VocabularyEntry>> {
        let conn = self.acquire();
        let sql = format!("select {ENTRY_COLUMNS} from words order by added_at, word;");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_entry)?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn reviews(&self) -> Fallible<Vec<ReviewRecord>> {
        let conn = self.acquire();
        let sql = "select word_hash, reviewed_at, success, quality_score, interval_days, ease_factor, next_review_at from reviews order by review_id;";
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ReviewRecord {
                hash: row.get(0)?,
                reviewed_at: row.get(1)?,
                success: row.get(2)?,
                quality_score: row.get(3)?,
                interval: row.get(4)?,
                ease_factor: row.get(5)?,
                next_review_at: row.get(6)?,
            })
        })?;
        let mut reviews = Vec::new();
        for review in rows {
            reviews.push(review?);
        }
        Ok(reviews)
    }
}

fn read_entry(row: &Row) -> rusqlite::Result<VocabularyEntry> {
    Ok(VocabularyEntry {
        hash: row.get(0)?,
        word: row.get(1)?,
        context: row.get(2)?,
        added_at: row.get(3)?,
        state: ReviewState {
            difficulty: row.get(4)?,
            interval: read_count(row, 5, "interval", "days")?,
            repetition_count: read_count(row, 6, "repetition count", "reviews")?,
            ease_factor: row.get(7)?,
            scheduled_at: row.get(8)?,
            next_review_at: row.get(9)?,
        },
        version: row.get(10)?,
    })
}

/// Decode a non-negative counter. Anything else is a corrupt state, not a
/// type mismatch.
fn read_count(row: &Row, idx: usize, name: &str, unit: &str) -> rusqlite::Result<u32> {
    let value: i64 = row.get(idx)?;
    u32::try_from(value).map_err(|_| {
        let err = SchedulerError::CorruptState(format!("{name} is {value} {unit}"));
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err))
    })
}

fn entry_exists(tx: &Transaction, hash: WordHash) -> Fallible<bool> {
    let sql = "select count(*) from words where word_hash = ?;";
    let count: i64 = tx.query_row(sql, [hash], |row| row.get(0))?;
    Ok(count > 0)
}

type ReviewId = i64;

fn insert_review(tx: &Transaction, review: &ReviewRecord) -> Fallible<ReviewId> {
    let sql = "insert into reviews (word_hash, reviewed_at, success, quality_score, interval_days, ease_factor, next_review_at) values (?, ?, ?, ?, ?, ?, ?) returning review_id;";
    let review_id: ReviewId = tx.query_row(
        sql,
        (
            review.hash,
            review.reviewed_at,
            review.success,
            review.quality_score,
            review.interval,
            review.ease_factor,
            review.next_review_at,
        ),
        |row| row.get(0),
    )?;
    Ok(review_id)
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["words"], |row| row.get(0))?;
    Ok(count > 0)
}
