use crate::domain::model::Doctor;
use chrono::{NaiveTime, Timelike};

pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_END_HOUR: u32 = 21;

/// Row 1 holds doctor names, column 1 holds the time axis.
const HEADER_ROW: usize = 1;
const FIRST_DOCTOR_COLUMN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridAddressing {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for GridAddressing {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl GridAddressing {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start_hour..=self.end_hour
    }

    pub fn time_to_row(&self, hour: u32) -> Option<usize> {
        if hour < self.start_hour || hour > self.end_hour {
            return None;
        }
        Some((hour - self.start_hour) as usize + HEADER_ROW + 1)
    }

    pub fn row_to_time(&self, row: usize) -> Option<u32> {
        let offset = row.checked_sub(HEADER_ROW + 1)?;
        let hour = self.start_hour.checked_add(u32::try_from(offset).ok()?)?;
        (hour <= self.end_hour).then_some(hour)
    }

    /// Column of `name` in `header_row` (index 0 is column 1).
    ///
    /// A header naming one of `candidates` wins over a header that only
    /// shares a substring with `name`.
    pub fn doctor_to_column(
        &self,
        name: &str,
        header_row: &[String],
        candidates: &[Doctor],
    ) -> Option<usize> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let headers = || {
            header_row
                .iter()
                .enumerate()
                .skip(FIRST_DOCTOR_COLUMN - 1)
                .map(|(index, header)| (index + 1, header.trim().to_lowercase()))
                .filter(|(_, header)| !header.is_empty())
        };

        let candidate_names: Vec<String> = candidates
            .iter()
            .map(|doctor| doctor.name.trim().to_lowercase())
            .filter(|candidate| !candidate.is_empty())
            .collect();

        let by_candidate = headers().find(|(_, header)| {
            candidate_names
                .iter()
                .any(|candidate| contains_either(header, candidate))
        });

        by_candidate
            .or_else(|| headers().find(|(_, header)| contains_either(header, &query)))
            .map(|(column, _)| column)
    }
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Parses "14", "14:00" or "14:00:00" into an hour.
///
/// Only the leading field before `:` decides the hour. Values past 23 still
/// parse so the grid range check can reject them as out of range.
pub fn parse_hour(time: &str) -> Option<u32> {
    let time = time.trim();
    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(parsed) = NaiveTime::parse_from_str(time, format) {
            return Some(parsed.hour());
        }
    }
    time.split(':').next()?.trim().parse::<u32>().ok()
}

/// Renders an hour the way messages show it, e.g. "14:00".
pub fn display_time(time: &str) -> String {
    let time = time.trim();
    if time.contains(':') {
        time.to_string()
    } else {
        format!("{time}:00")
    }
}

/// 1-based (row, column) to A1 notation, e.g. (6, 2) -> "B6".
pub fn to_a1(row: usize, column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row)
}
