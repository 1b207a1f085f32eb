//! Canonical local-day keys.
//!
//! Every aggregation in the crate (streaks, week progress, journal lookups)
//! compares calendar days through [`DateKey`], a `YYYY-MM-DD` string built
//! from the **local** year/month/day. Two instants on the same local day
//! always produce the same key, whatever their time-of-day.
//!
//! Inputs arrive in several shapes (epoch milliseconds, RFC 3339 strings,
//! naive date-times, bare dates). [`normalize_date`] accepts all of them and
//! returns `None` for anything it cannot read; it never panics.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use serde::{Deserialize, Serialize};

const KEY_FORMAT: &str = "%Y-%m-%d";

/// A local calendar day, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The day before, or `None` at the calendar's lower bound.
    pub fn previous(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    /// Shift by a signed number of days.
    pub fn offset(&self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    /// Signed day count from `self` to `other`.
    pub fn days_until(&self, other: &DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Monday of the week containing this day.
    pub fn week_start(&self) -> Self {
        let back = i64::from(self.0.weekday().num_days_from_monday());
        self.offset(-back).unwrap_or(*self)
    }

    /// Local midnight of this day.
    pub fn to_local_midnight(&self) -> Option<DateTime<Local>> {
        local_start_of_day(self.0)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), KEY_FORMAT).map(Self)
    }
}

impl TryFrom<String> for DateKey {
    type Error = chrono::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// A date-like value of unknown shape, as stored by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Any textual form: RFC 3339, naive date-time, or a bare date.
    Text(String),
}

impl DateInput {
    /// Local day key for this value, or `None` when it cannot be read.
    pub fn local_date_key(&self) -> Option<DateKey> {
        normalize_date(self).map(|dt| get_local_date_key(&dt))
    }
}

impl From<DateKey> for DateInput {
    fn from(key: DateKey) -> Self {
        DateInput::Text(key.to_string())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateKey(date).into()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput
where
    Tz::Offset: fmt::Display,
{
    fn from(dt: DateTime<Tz>) -> Self {
        DateInput::Text(dt.to_rfc3339())
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

/// Key for the local calendar day containing `dt`.
pub fn get_local_date_key<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateKey {
    DateKey(dt.with_timezone(&Local).date_naive())
}

/// Parse a `YYYY-MM-DD` key back to local midnight of that day.
pub fn parse_local_date_key(key: &str) -> Option<DateTime<Local>> {
    key.parse::<DateKey>().ok()?.to_local_midnight()
}

/// Key for the current local day.
pub fn today_key() -> DateKey {
    get_local_date_key(&Local::now())
}

/// Read a date-like value into a local instant. `None` signals invalid input.
pub fn normalize_date(input: &DateInput) -> Option<DateTime<Local>> {
    match input {
        DateInput::Millis(ms) => {
            DateTime::from_timestamp_millis(*ms).map(|utc| utc.with_timezone(&Local))
        }
        DateInput::Text(text) => normalize_text(text.trim()),
    }
}

fn normalize_text(text: &str) -> Option<DateTime<Local>> {
    if text.is_empty() {
        return None;
    }

    // Bare dates name a local day; reading them as UTC would shift the day
    // for anyone west of Greenwich.
    if let Ok(key) = text.parse::<DateKey>() {
        return key.to_local_midnight();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }

    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .and_then(resolve_local)
}

fn local_start_of_day(date: NaiveDate) -> Option<DateTime<Local>> {
    resolve_local(date.and_time(NaiveTime::MIN))
}

/// Resolve a wall-clock time in the local zone. Ambiguous times take the
/// earlier instant; times inside a DST gap move forward to the first valid hour.
fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    resolve_with(naive, |candidate| Local.from_local_datetime(candidate))
}

fn resolve_with<T>(
    naive: NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> LocalResult<T>,
) -> Option<T> {
    for hours in 0..=3 {
        let candidate = naive.checked_add_signed(Duration::hours(hours))?;
        match lookup(&candidate) {
            LocalResult::Single(dt) => return Some(dt),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest),
            LocalResult::None => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};
    use proptest::prelude::*;

    fn wall(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn at(offset_hours: i32, naive: &NaiveDateTime) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .from_local_datetime(naive)
            .single()
            .unwrap()
    }

    #[test]
    fn wall_time_in_dst_gap_moves_forward() {
        // Clocks jump from 02:00 (+01:00) to 03:00 (+02:00).
        let spring = |c: &NaiveDateTime| match c.hour() {
            2 => LocalResult::None,
            h if h < 2 => LocalResult::Single(at(1, c)),
            _ => LocalResult::Single(at(2, c)),
        };
        let resolved = resolve_with(wall(2, 30), spring).unwrap();
        assert_eq!(resolved.naive_local(), wall(3, 30));
        assert_eq!(resolved.offset().local_minus_utc(), 2 * 3600);

        assert_eq!(resolve_with(wall(1, 59), spring).unwrap().naive_local(), wall(1, 59));
    }

    #[test]
    fn repeated_wall_time_takes_earlier_instant() {
        // 02:00-02:59 happens twice: first at +02:00, then at +01:00.
        let autumn = |c: &NaiveDateTime| match c.hour() {
            2 => LocalResult::Ambiguous(at(2, c), at(1, c)),
            _ => LocalResult::Single(at(1, c)),
        };
        let resolved = resolve_with(wall(2, 15), autumn).unwrap();
        assert_eq!(resolved, at(2, &wall(2, 15)));
        assert!(resolved < at(1, &wall(2, 15)));
    }

    #[test]
    fn unresolvable_wall_time_is_none() {
        assert!(resolve_with(wall(2, 0), |_| LocalResult::<DateTime<FixedOffset>>::None).is_none());
    }

    #[test]
    fn fixed_offset_resolves_unchanged() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let resolved = resolve_with(wall(0, 0), |c| offset.from_local_datetime(c)).unwrap();
        assert_eq!(resolved.naive_local(), wall(0, 0));
        assert_eq!(resolved.offset(), &offset);
    }

    #[test]
    fn key_is_zero_padded() {
        let key = DateKey::from_ymd(2024, 3, 7).unwrap();
        assert_eq!(key.to_string(), "2024-03-07");
    }

    #[test]
    fn same_local_day_same_key() {
        let morning = Local.with_ymd_and_hms(2024, 5, 10, 0, 5, 0).earliest().unwrap();
        let night = Local.with_ymd_and_hms(2024, 5, 10, 23, 55, 0).earliest().unwrap();
        assert_eq!(get_local_date_key(&morning), get_local_date_key(&night));
    }

    #[test]
    fn date_only_text_is_a_local_day() {
        let input = DateInput::Text("2024-01-31".into());
        assert_eq!(input.local_date_key().unwrap().to_string(), "2024-01-31");
    }

    #[test]
    fn rfc3339_and_millis_are_accepted() {
        let dt = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).earliest().unwrap();
        let from_text = DateInput::from(dt);
        let from_millis = DateInput::Millis(dt.timestamp_millis());
        assert_eq!(from_text.local_date_key(), Some(get_local_date_key(&dt)));
        assert_eq!(from_millis.local_date_key(), Some(get_local_date_key(&dt)));
    }

    #[test]
    fn naive_datetime_text_is_local() {
        let input = DateInput::Text("2024-02-29T18:30:00".into());
        assert_eq!(input.local_date_key().unwrap().to_string(), "2024-02-29");
    }

    #[test]
    fn garbage_is_invalid_not_a_panic() {
        for bad in ["", "   ", "yesterday", "2024-13-01", "2024-02-30", "12/01/2024"] {
            assert!(normalize_date(&DateInput::Text(bad.into())).is_none(), "{bad}");
        }
        assert!(normalize_date(&DateInput::Millis(i64::MAX)).is_none());
    }

    #[test]
    fn week_start_is_monday() {
        // 2024-05-16 is a Thursday.
        let thu = DateKey::from_ymd(2024, 5, 16).unwrap();
        assert_eq!(thu.week_start().to_string(), "2024-05-13");
        let mon = DateKey::from_ymd(2024, 5, 13).unwrap();
        assert_eq!(mon.week_start(), mon);
        let sun = DateKey::from_ymd(2024, 5, 19).unwrap();
        assert_eq!(sun.week_start(), mon);
    }

    #[test]
    fn serde_as_plain_string() {
        let key = DateKey::from_ymd(2023, 12, 1).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2023-12-01\"");
        let back: DateKey = serde_json::from_str("\"2023-12-01\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<DateKey>("\"not a date\"").is_err());
    }

    #[test]
    fn untagged_date_input() {
        let n: DateInput = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(n, DateInput::Millis(1_700_000_000_000));
        let s: DateInput = serde_json::from_str("\"2024-01-01\"").unwrap();
        assert_eq!(s, DateInput::Text("2024-01-01".into()));
    }

    proptest! {
        #[test]
        fn round_trip_keeps_calendar_day(
            year in 1971i32..2100,
            ordinal in 1u32..=365,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let date = NaiveDate::from_yo_opt(year, ordinal).unwrap();
            let naive = date.and_hms_opt(hour, minute, 0).unwrap();
            if let Some(dt) = Local.from_local_datetime(&naive).earliest() {
                let key = get_local_date_key(&dt);
                let parsed = parse_local_date_key(&key.to_string()).unwrap();
                prop_assert_eq!(parsed.year(), dt.year());
                prop_assert_eq!(parsed.month(), dt.month());
                prop_assert_eq!(parsed.day(), dt.day());
            }
        }
    }
}
