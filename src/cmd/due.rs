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

use crate::clock::Clock;
use crate::clock::FixedClock;
use crate::collection::Collection;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::VocabularyEntry;
use crate::types::timestamp::Timestamp;
use crate::vocab::VocabularyService;

/// List the words due for review, now or at the given RFC 3339 instant.
pub fn list_due(directory: Option<String>, at: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let output = match at {
        Some(at) => {
            let Some(at) = Timestamp::parse(&at) else {
                return fail(format!("invalid timestamp: {at}"));
            };
            due_report(&coll.service_with_clock(FixedClock::new(at)))?
        }
        None => due_report(&coll.service())?,
    };
    print!("{output}");
    Ok(())
}

fn due_report<C: Clock>(service: &VocabularyService<Database, C>) -> Fallible<String> {
    let due: Vec<VocabularyEntry> = service.due_words()?;
    if due.is_empty() {
        return Ok("No words due.\n".to_string());
    }
    let mut out = String::new();
    for entry in &due {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            entry.word, entry.state.difficulty, entry.state.next_review_at
        ));
    }
    out.push_str(&format!("{} due.\n", due.len()));
    Ok(out)
}
