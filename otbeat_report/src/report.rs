use std::io::{self, Write};

use otbeat_core::{CSV_HEADER, SortOrder, WorkoutSummary, sort_summaries};

use crate::csv::CsvWriter;

/// Sorted workouts ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutReport {
    summaries: Vec<WorkoutSummary>,
}

impl WorkoutReport {
    #[must_use]
    pub fn new(mut summaries: Vec<WorkoutSummary>, order: SortOrder) -> Self {
        sort_summaries(&mut summaries, order);
        Self { summaries }
    }

    #[must_use]
    pub fn summaries(&self) -> &[WorkoutSummary] {
        &self.summaries
    }

    /// Header row followed by one row per workout.
    pub fn write_csv<W: Write>(&self, writer: W) -> io::Result<W> {
        let mut csv = CsvWriter::new(writer);
        csv.write_record(CSV_HEADER)?;
        for summary in &self.summaries {
            csv.write_record(summary.csv_row())?;
        }
        let mut writer = csv.finish()?;
        writer.flush()?;
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otbeat_core::WorkoutSchema;

    fn snippet(date: &str, city: &str) -> String {
        format!(
            "STUDIO WORKOUT SUMMARY {city}, WA {date} 6\u{200c}:05 AM Sam 2 10 20 8 1 MINUTES / ZONE 480 CALORIES BURNED 9 SPLAT POINTS 140 AVG. HEART-RATE Peak HR: 175"
        )
    }

    #[test]
    fn writes_header_and_sorted_rows() {
        let schema = WorkoutSchema::compile().unwrap();
        let summaries = vec![
            schema.parse(&snippet("07/01/2021", "Seattle")).unwrap(),
            schema.parse(&snippet("06/13/2021", "Bothell")).unwrap(),
        ];

        let report = WorkoutReport::new(summaries, SortOrder::Lexicographic);
        let csv = String::from_utf8(report.write_csv(Vec::new()).unwrap()).unwrap();

        assert_eq!(
            csv,
            "Date,Time,Zone 1,Zone 2,Zone 3,Zone 4,Zone 5,Calories,Average Heart Rate,Peak Heart Rate,Location\n\
             06/13/2021,6:05,2,10,20,8,1,480,140,175,\"Bothell, WA\"\n\
             07/01/2021,6:05,2,10,20,8,1,480,140,175,\"Seattle, WA\"\n"
        );
    }

    #[test]
    fn empty_report_has_only_header() {
        let report = WorkoutReport::new(Vec::new(), SortOrder::Calendar);
        let csv = String::from_utf8(report.write_csv(Vec::new()).unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("Date,Time,"));
    }
}
