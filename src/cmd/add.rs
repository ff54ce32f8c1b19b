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

pub fn add_word(
    directory: Option<String>,
    word: &str,
    difficulty: &str,
    context: Option<&str>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let entry = coll.service().log_word(word, difficulty, context)?;
    println!(
        "Added '{}'. First review: {}.",
        entry.word, entry.state.next_review_at
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_existent_directory() {
        let result = add_word(Some("./derpherp".to_string()), "Haus", "beginner", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_add() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        let directory = Some(dir.path().display().to_string());
        add_word(directory.clone(), "Haus", "beginner", Some("Das Haus"))?;
        assert!(add_word(directory.clone(), "haus", "beginner", None).is_err());
        assert!(add_word(directory.clone(), "Baum", "hard", None).is_err());
        let coll = Collection::new(directory)?;
        assert_eq!(coll.service().stats()?.total_words, 1);
        Ok(())
    }
}
