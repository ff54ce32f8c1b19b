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

//! Vocabulary tracking with spaced repetition.
//!
//! The scheduling algorithm lives in [`scheduler`] and is pure. Everything
//! else is plumbing around it:
//! - [`db`] persists entries behind the [`store::VocabularyStore`] trait,
//! - [`vocab`] validates requests and drives the scheduler,
//! - [`cli`] and [`cmd`] expose it all as the `vocab` command.

pub mod cli;
pub mod clock;
pub mod cmd;
pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod vocab;

pub use error::{ErrorReport, Fallible, fail};
pub use scheduler::{
    Outcome, ReviewState, Scheduler, SchedulerError, SchedulerPolicy, initial_state, next_state,
};
pub use types::difficulty::Difficulty;
pub use types::timestamp::Timestamp;
