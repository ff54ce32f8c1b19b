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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::vocab::Stats;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Human-readable output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(directory: Option<String>, format: StatsFormat) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let stats = coll.service().stats()?;
    match format {
        StatsFormat::Text => print!("{}", render_text(&stats)),
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

fn render_text(stats: &Stats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Words:      {}\n", stats.total_words));
    for (difficulty, count) in &stats.by_difficulty {
        out.push_str(&format!("  {:<14}{count}\n", difficulty.as_str()));
    }
    out.push_str(&format!("Due now:    {}\n", stats.due_now));
    out.push_str(&format!("Reviews:    {}\n", stats.review_count));
    if let Some(rate) = stats.success_rate {
        out.push_str(&format!("Success:    {:.0}%\n", rate * 100.0));
    }
    if let Some(ease) = stats.mean_ease_factor {
        out.push_str(&format!("Mean ease:  {ease:.2}\n"));
    }
    out
}
