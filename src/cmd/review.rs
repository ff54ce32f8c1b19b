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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::scheduler::Outcome;

/// Build an outcome from the command-line flags. With neither flag set the
/// success field is left empty, and the scheduler will reject it.
pub fn outcome_from_flags(success: bool, failure: bool, quality: Option<u8>) -> Outcome {
    let success = match (success, failure) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    };
    Outcome {
        success,
        quality_score: quality,
    }
}

pub fn review_word(directory: Option<String>, word: &str, outcome: Outcome) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let entry = coll.service().record_review(word, &outcome)?;
    let days = if entry.state.interval == 1 {
        "day"
    } else {
        "days"
    };
    println!(
        "'{}': next review in {} {days} ({}).",
        entry.word, entry.state.interval, entry.state.next_review_at
    );
    Ok(())
}
