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

use clap::Parser;

use crate::cmd::add::add_word;
use crate::cmd::due::list_due;
use crate::cmd::export::export_collection;
use crate::cmd::review::outcome_from_flags;
use crate::cmd::review::review_word;
use crate::cmd::show::show_word;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Start tracking a word.
    Add {
        /// The word to learn.
        word: String,
        /// One of: beginner, intermediate, advanced.
        #[arg(long)]
        difficulty: String,
        /// Where the word was seen.
        #[arg(long)]
        context: Option<String>,
        /// Path to the collection directory.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Record the outcome of reviewing a word.
    Review {
        word: String,
        /// The word was recalled.
        #[arg(long, conflicts_with = "failure")]
        success: bool,
        /// The word was forgotten.
        #[arg(long)]
        failure: bool,
        /// Optional recall quality, from 0 to 5.
        #[arg(long)]
        quality: Option<u8>,
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the words due for review.
    Due {
        /// List what is due at this RFC 3339 instant instead of now.
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print a word's scheduling state as JSON.
    Show {
        word: String,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print collection statistics.
    Stats {
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
        #[arg(long)]
        directory: Option<String>,
    },
    /// Export the collection as JSON.
    Export {
        #[arg(long)]
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Add {
            word,
            difficulty,
            context,
            directory,
        } => add_word(directory, &word, &difficulty, context.as_deref()),
        Command::Review {
            word,
            success,
            failure,
            quality,
            directory,
        } => review_word(directory, &word, outcome_from_flags(success, failure, quality)),
        Command::Due { at, directory } => list_due(directory, at),
        Command::Show { word, directory } => show_word(directory, &word),
        Command::Stats { format, directory } => print_stats(directory, format),
        Command::Export { directory } => export_collection(directory),
    }
}
