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

pub fn show_word(directory: Option<String>, word: &str) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let entry = coll.service().get_word(word)?;
    let json = serde_json::to_string_pretty(&entry)?;
    println!("{json}");
    Ok(())
}
