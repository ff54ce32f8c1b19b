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

use std::env::current_dir;
use std::path::PathBuf;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Scheduler;
use crate::vocab::VocabularyService;

/// The name of the database file in a collection directory.
pub const DATABASE_FILE_NAME: &str = "vocab.db";

/// A directory holding a vocabulary database and, optionally, its config.
pub struct Collection {
    pub directory: PathBuf,
    pub db: Database,
    pub config: Config,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE_NAME);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        log::debug!("Opening database at {db_path}");
        let db: Database = Database::new(db_path)?;

        Ok(Self {
            directory,
            db,
            config,
        })
    }

    /// A service over this collection that reads the wall clock.
    pub fn service(&self) -> VocabularyService<Database, SystemClock> {
        self.service_with_clock(SystemClock)
    }

    pub fn service_with_clock<C: Clock>(&self, clock: C) -> VocabularyService<Database, C> {
        VocabularyService::new(self.db.clone(), clock, Scheduler::new(self.config.policy))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::config::CONFIG_FILE_NAME;

    #[test]
    fn test_non_existent_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().to_string(),
            "error: directory does not exist."
        );
    }

    #[test]
    fn test_creates_database() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert!(coll.directory.join(DATABASE_FILE_NAME).exists());
        assert_eq!(coll.config, Config::default());
        Ok(())
    }

    #[test]
    fn test_config_reaches_the_scheduler() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        write(
            dir.path().join(CONFIG_FILE_NAME),
            "[scheduler]\nbeginner_seed_interval = 2\nintermediate_seed_interval = 3\nadvanced_seed_interval = 4\n",
        )?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let entry = coll.service().log_word("Haus", "beginner", None)?;
        assert_eq!(entry.state.interval, 2);
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        write(dir.path().join(CONFIG_FILE_NAME), "[scheduler]\nease_bonus = -1.0\n")?;
        assert!(Collection::new(Some(dir.path().display().to_string())).is_err());
        Ok(())
    }
}
