//! Studio workout summary grammar and the typed record built from it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{CompileError, Extractor, Record, Schema};

/// Address the workout summary emails are sent from.
pub const DEFAULT_SENDER: &str = "OTbeatReport@orangetheoryfitness.com";

/// Column headers of the CSV report, in output order.
pub const CSV_HEADER: [&str; 11] = [
    "Date",
    "Time",
    "Zone 1",
    "Zone 2",
    "Zone 3",
    "Zone 4",
    "Zone 5",
    "Calories",
    "Average Heart Rate",
    "Peak Heart Rate",
    "Location",
];

/// ASCII digits only; other scripts' digits are not dates or counts.
const DIGITS: &str = "[0-9]+";

/// ASCII word characters.
const WORD: &str = "[0-9A-Za-z_]+";

/// Grammar of a workout summary snippet, e.g.
///
/// ```text
/// STUDIO WORKOUT SUMMARY Bothell, WA 06/13/2021 12\u{200c}:15 PM Tiffany 15 0 0 0 0 MINUTES / ZONE 55 CALORIES BURNED 0 SPLAT POINTS 75 AVG. HEART-RATE Peak HR: 80
/// ```
///
/// The summary emails put a zero-width non-joiner before the colon between
/// hour and minute. It is optional here so pasted text with a plain colon
/// parses too.
#[must_use]
pub fn workout_schema() -> Schema {
    Schema::new()
        .separator("STUDIO WORKOUT SUMMARY ")
        .field("City", WORD)
        .separator(", ")
        .field("State", WORD)
        .separator(" ")
        .field("Month", DIGITS)
        .separator("/")
        .field("Day", DIGITS)
        .separator("/")
        .field("Year", DIGITS)
        .separator(" ")
        .field("Hour", DIGITS)
        .separator("\u{200c}?:")
        .field("Minute", DIGITS)
        .separator(" ")
        .field("AMPM", "[0-9A-Za-z_]{2}")
        .separator(" ")
        .field("Instructor", WORD)
        .separator(" ")
        .field("Zone1", DIGITS)
        .separator(" ")
        .field("Zone2", DIGITS)
        .separator(" ")
        .field("Zone3", DIGITS)
        .separator(" ")
        .field("Zone4", DIGITS)
        .separator(" ")
        .field("Zone5", DIGITS)
        .separator(" MINUTES / ZONE ")
        .field("Calories", DIGITS)
        .separator(" CALORIES BURNED ")
        .field("SplatPoints", DIGITS)
        .separator(" SPLAT POINTS ")
        .field("AverageHeartRate", DIGITS)
        .separator(" AVG. HEART-RATE Peak HR: ")
        .field("PeakHeartRate", DIGITS)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkoutError {
    #[error("record has no {0} field")]
    MissingField(&'static str),
}

/// The compiled workout grammar.
///
/// Build it once at startup and hand out references.
#[derive(Debug, Clone)]
pub struct WorkoutSchema {
    extractor: Extractor,
}

impl WorkoutSchema {
    pub fn compile() -> Result<Self, CompileError> {
        Ok(Self {
            extractor: workout_schema().compile()?,
        })
    }

    #[must_use]
    pub const fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Parse one snippet. `None` means the snippet is not a workout summary.
    #[must_use]
    pub fn parse(&self, snippet: &str) -> Option<WorkoutSummary> {
        self.extractor
            .extract(snippet)
            .into_record()
            .and_then(|record| WorkoutSummary::try_from(record).ok())
    }
}

/// One parsed workout. All values are the raw snippet text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSummary {
    pub city: String,
    pub state: String,
    pub month: String,
    pub day: String,
    pub year: String,
    pub hour: String,
    pub minute: String,
    pub am_pm: String,
    pub instructor: String,
    /// Minutes spent in heart-rate zones 1 through 5.
    pub zones: [String; 5],
    pub calories: String,
    pub splat_points: String,
    pub average_heart_rate: String,
    pub peak_heart_rate: String,
}

impl TryFrom<Record> for WorkoutSummary {
    type Error = WorkoutError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut fields: HashMap<String, String> = record.into_iter().collect();
        let mut take = |name: &'static str| {
            fields
                .remove(name)
                .ok_or(WorkoutError::MissingField(name))
        };

        Ok(Self {
            city: take("City")?,
            state: take("State")?,
            month: take("Month")?,
            day: take("Day")?,
            year: take("Year")?,
            hour: take("Hour")?,
            minute: take("Minute")?,
            am_pm: take("AMPM")?,
            instructor: take("Instructor")?,
            zones: [
                take("Zone1")?,
                take("Zone2")?,
                take("Zone3")?,
                take("Zone4")?,
                take("Zone5")?,
            ],
            calories: take("Calories")?,
            splat_points: take("SplatPoints")?,
            average_heart_rate: take("AverageHeartRate")?,
            peak_heart_rate: take("PeakHeartRate")?,
        })
    }
}

impl WorkoutSummary {
    /// `Month/Day/Year`
    #[must_use]
    pub fn date(&self) -> String {
        format!("{}/{}/{}", self.month, self.day, self.year)
    }

    /// `Hour:Minute`, without the AM/PM marker.
    #[must_use]
    pub fn time(&self) -> String {
        format!("{}:{}", self.hour, self.minute)
    }

    /// `City, State`
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    /// Row values in [`CSV_HEADER`] order.
    #[must_use]
    pub fn csv_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(CSV_HEADER.len());
        row.push(self.date());
        row.push(self.time());
        row.extend(self.zones.iter().cloned());
        row.push(self.calories.clone());
        row.push(self.average_heart_rate.clone());
        row.push(self.peak_heart_rate.clone());
        row.push(self.location());
        row
    }

    /// `Year-Month-Day` as written in the snippet.
    #[must_use]
    pub fn lexicographic_key(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// Numeric `(year, month, day)`; components that do not parse sort last.
    #[must_use]
    pub fn calendar_key(&self) -> (u32, u32, u32) {
        let number = |s: &str| s.parse::<u32>().unwrap_or(u32::MAX);
        (number(&self.year), number(&self.month), number(&self.day))
    }
}

/// How report rows are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Compare `Year-Month-Day` strings byte by byte. Month `"10"` sorts
    /// before month `"2"` unless the snippets zero-pad.
    #[default]
    Lexicographic,
    /// Compare numeric year, month and day.
    Calendar,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lexicographic => "lexicographic",
            Self::Calendar => "calendar",
        }
    }

    fn compare(self, a: &WorkoutSummary, b: &WorkoutSummary) -> Ordering {
        match self {
            Self::Lexicographic => a.lexicographic_key().cmp(&b.lexicographic_key()),
            Self::Calendar => a
                .calendar_key()
                .cmp(&b.calendar_key())
                .then_with(|| a.lexicographic_key().cmp(&b.lexicographic_key())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            "calendar" => Ok(Self::Calendar),
            other => Err(format!(
                "unknown sort order {other:?}, expected 'lexicographic' or 'calendar'"
            )),
        }
    }
}

/// Stable sort: workouts with equal keys keep their input order.
pub fn sort_summaries(summaries: &mut [WorkoutSummary], order: SortOrder) {
    summaries.sort_by(|a, b| order.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(year: &str, month: &str, day: &str) -> WorkoutSummary {
        WorkoutSummary {
            city: "Bothell".to_string(),
            state: "WA".to_string(),
            month: month.to_string(),
            day: day.to_string(),
            year: year.to_string(),
            hour: "12".to_string(),
            minute: "15".to_string(),
            am_pm: "PM".to_string(),
            instructor: "Tiffany".to_string(),
            zones: ["15", "0", "0", "0", "0"].map(str::to_string),
            calories: "55".to_string(),
            splat_points: "0".to_string(),
            average_heart_rate: "75".to_string(),
            peak_heart_rate: "80".to_string(),
        }
    }

    fn months(summaries: &[WorkoutSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.month.as_str()).collect()
    }

    #[test]
    fn composite_fields() {
        let s = summary("2021", "06", "13");
        assert_eq!(s.date(), "06/13/2021");
        assert_eq!(s.time(), "12:15");
        assert_eq!(s.location(), "Bothell, WA");
    }

    #[test]
    fn csv_row_follows_header() {
        let row = summary("2021", "06", "13").csv_row();
        assert_eq!(row.len(), CSV_HEADER.len());
        assert_eq!(
            row,
            [
                "06/13/2021",
                "12:15",
                "15",
                "0",
                "0",
                "0",
                "0",
                "55",
                "75",
                "80",
                "Bothell, WA"
            ]
        );
    }

    #[test]
    fn lexicographic_sort_is_not_calendar_order() {
        let mut summaries = vec![
            summary("2021", "2", "01"),
            summary("2021", "10", "01"),
            summary("2021", "09", "01"),
        ];
        sort_summaries(&mut summaries, SortOrder::Lexicographic);
        assert_eq!(months(&summaries), ["09", "10", "2"]);
    }

    #[test]
    fn calendar_sort_compares_numbers() {
        let mut summaries = vec![
            summary("2021", "10", "01"),
            summary("2021", "2", "01"),
            summary("2021", "09", "01"),
        ];
        sort_summaries(&mut summaries, SortOrder::Calendar);
        assert_eq!(months(&summaries), ["2", "09", "10"]);
    }

    #[test]
    fn sort_is_stable() {
        let mut first = summary("2021", "06", "13");
        first.instructor = "First".to_string();
        let mut second = summary("2021", "06", "13");
        second.instructor = "Second".to_string();

        let mut summaries = vec![first, second];
        sort_summaries(&mut summaries, SortOrder::Lexicographic);
        assert_eq!(summaries[0].instructor, "First");
        assert_eq!(summaries[1].instructor, "Second");
    }

    #[test]
    fn missing_field_is_reported() {
        let record = Schema::new()
            .field("City", r"\w+")
            .compile()
            .unwrap()
            .extract("Bothell")
            .into_record()
            .unwrap();
        assert_eq!(
            WorkoutSummary::try_from(record),
            Err(WorkoutError::MissingField("State"))
        );
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("calendar".parse::<SortOrder>(), Ok(SortOrder::Calendar));
        assert_eq!("Lexicographic".parse::<SortOrder>(), Ok(SortOrder::Lexicographic));
        assert!("random".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Lexicographic);
    }
}
