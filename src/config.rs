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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::SchedulerPolicy;

/// The name of the optional config file in a collection directory.
pub const CONFIG_FILE_NAME: &str = "vocab.toml";

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    scheduler: SchedulerSection,
}

/// The `[scheduler]` table. Any key left out keeps its default.
#[derive(Deserialize)]
#[serde(deny_unknown_fields, default)]
struct SchedulerSection {
    beginner_seed_interval: u32,
    intermediate_seed_interval: u32,
    advanced_seed_interval: u32,
    initial_ease_factor: f64,
    ease_bonus: f64,
    failure_penalty: f64,
    max_ease_factor: f64,
    max_interval_days: u32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let policy = SchedulerPolicy::default();
        Self {
            beginner_seed_interval: policy.beginner_seed_interval,
            intermediate_seed_interval: policy.intermediate_seed_interval,
            advanced_seed_interval: policy.advanced_seed_interval,
            initial_ease_factor: policy.initial_ease_factor,
            ease_bonus: policy.ease_bonus,
            failure_penalty: policy.failure_penalty,
            max_ease_factor: policy.max_ease_factor,
            max_interval_days: policy.max_interval_days,
        }
    }
}

impl From<SchedulerSection> for SchedulerPolicy {
    fn from(section: SchedulerSection) -> Self {
        Self {
            beginner_seed_interval: section.beginner_seed_interval,
            intermediate_seed_interval: section.intermediate_seed_interval,
            advanced_seed_interval: section.advanced_seed_interval,
            initial_ease_factor: section.initial_ease_factor,
            ease_bonus: section.ease_bonus,
            failure_penalty: section.failure_penalty,
            max_ease_factor: section.max_ease_factor,
            max_interval_days: section.max_interval_days,
        }
    }
}

/// Collection-level settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub policy: SchedulerPolicy,
}

impl Config {
    pub fn parse(content: &str) -> Fallible<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let policy: SchedulerPolicy = file.scheduler.into();
        if let Err(reason) = policy.check() {
            return fail(format!("invalid scheduler configuration: {reason}"));
        }
        Ok(Self { policy })
    }

    /// Read `vocab.toml` from the directory, or use the defaults if there
    /// isn't one.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE_NAME}, using default scheduler policy.");
            return Ok(Self::default());
        }
        log::debug!("Loading configuration from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;

    #[test]
    fn test_empty() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_override() -> Fallible<()> {
        let config = Config::parse("[scheduler]\nadvanced_seed_interval = 5\nease_bonus = 0.15\n")?;
        assert_eq!(config.policy.advanced_seed_interval, 5);
        assert_eq!(config.policy.ease_bonus, 0.15);
        assert_eq!(config.policy.beginner_seed_interval, 1);
        assert_eq!(config.policy.initial_ease_factor, 2.5);
        Ok(())
    }

    #[test]
    fn test_unknown_key() {
        assert!(Config::parse("[scheduler]\nmin_ease_factor = 1.0\n").is_err());
        assert!(Config::parse("[billing]\nplan = \"pro\"\n").is_err());
    }

    #[test]
    fn test_non_monotonic_seeds() {
        let result = Config::parse("[scheduler]\nbeginner_seed_interval = 4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_interval_cap_beyond_the_calendar() -> Fallible<()> {
        assert!(Config::parse("[scheduler]\nmax_interval_days = 4000000000\n").is_err());
        let config = Config::parse("[scheduler]\nmax_interval_days = 1000000\n")?;
        assert_eq!(config.policy.max_interval_days, 1_000_000);
        Ok(())
    }

    #[test]
    fn test_wrong_type() {
        assert!(Config::parse("[scheduler]\nease_bonus = \"lots\"\n").is_err());
    }

    #[test]
    fn test_load() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        write(
            dir.path().join(CONFIG_FILE_NAME),
            "[scheduler]\nfailure_penalty = 0.3\n",
        )?;
        assert_eq!(Config::load(dir.path())?.policy.failure_penalty, 0.3);
        Ok(())
    }
}
