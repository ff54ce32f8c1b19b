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

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::TimeDelta;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

/// A UTC instant. Stored as fixed-width RFC 3339 text, so that string
/// comparison in SQL agrees with chronological order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse an RFC 3339 string, normalizing it to UTC.
    pub fn parse(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| Self(ts.with_timezone(&Utc)))
    }

    /// The instant `days` whole days later, or `None` if that falls outside
    /// the representable range.
    pub fn plus_days(self, days: u32) -> Option<Self> {
        let delta = TimeDelta::try_days(i64::from(days))?;
        self.0.checked_add_signed(delta).map(Self)
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    fn to_fixed_string(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_fixed_string()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(Timestamp(ts.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_plus_days() {
        let start = ts(2025, 1, 30);
        assert_eq!(start.plus_days(3), Some(ts(2025, 2, 2)));
        assert_eq!(start.plus_days(0), Some(start));
    }

    #[test]
    fn test_fixed_width_strings_sort_chronologically() {
        let a = Timestamp::new(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let b = Timestamp::new(Utc.timestamp_opt(a.into_inner().timestamp(), 500).unwrap());
        assert!(a < b);
        assert!(a.to_fixed_string() < b.to_fixed_string());
    }

    #[test]
    fn test_sql_roundtrip_keeps_nanoseconds() -> rusqlite::Result<()> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let original = Timestamp::new(Utc.timestamp_opt(1_750_000_000, 978_170_382).unwrap());
        let stored: Timestamp = conn.query_row("select ?", [original], |row| row.get(0))?;
        assert_eq!(stored, original);
        Ok(())
    }

    #[test]
    fn test_parse() {
        let parsed = Timestamp::parse("2025-01-30T11:30:00+02:00").unwrap();
        assert_eq!(parsed, ts(2025, 1, 30));
        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(ts(2025, 1, 30).to_string(), "2025-01-30T09:30:00Z");
    }
}
