use crate::domain::model::{CellData, Rgb, RosterRecord};
use crate::domain::ports::ScheduleStore;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Schedule grid as stored in a fixture file; cells not listed are empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridFixture {
    pub header: Vec<String>,
    #[serde(default)]
    pub cells: Vec<FixtureCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCell {
    pub row: usize,
    pub column: usize,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub background: Option<Rgb>,
}

/// Fixed roster and grid held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    roster: Vec<RosterRecord>,
    header: Vec<String>,
    cells: HashMap<(usize, usize), CellData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster from a CSV with a header row, grid from a [`GridFixture`] JSON file.
    pub fn from_fixture_files<P: AsRef<Path>, Q: AsRef<Path>>(roster_csv: P, grid_json: Q) -> Result<Self> {
        let mut reader = csv::Reader::from_path(roster_csv.as_ref())?;
        let labels = reader.headers()?.clone();
        let mut roster = Vec::new();
        for row in reader.records() {
            let row = row?;
            roster.push(RosterRecord::from_pairs(
                labels.iter().zip(row.iter()).map(|(k, v)| (k.trim(), v)),
            ));
        }

        let content = std::fs::read_to_string(grid_json.as_ref())?;
        let fixture: GridFixture = serde_json::from_str(&content)?;

        tracing::debug!(
            "Loaded fixture with {} roster rows and {} grid cells",
            roster.len(),
            fixture.cells.len()
        );
        Ok(Self::from_parts(roster, fixture))
    }

    pub fn from_parts(roster: Vec<RosterRecord>, grid: GridFixture) -> Self {
        let cells = grid
            .cells
            .into_iter()
            .map(|cell| {
                (
                    (cell.row, cell.column),
                    CellData {
                        text: cell.text,
                        background: cell.background,
                    },
                )
            })
            .collect();
        Self {
            roster,
            header: grid.header,
            cells,
        }
    }

    pub fn with_doctor(mut self, name: &str, specialty: &str) -> Self {
        self.roster.push(RosterRecord::from_pairs([
            ("ФИО врача", name),
            ("Специальность", specialty),
        ]));
        self
    }

    pub fn with_record(mut self, record: RosterRecord) -> Self {
        self.roster.push(record);
        self
    }

    pub fn with_header<I, T>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.header = header.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cell(mut self, row: usize, column: usize, cell: CellData) -> Self {
        self.cells.insert((row, column), cell);
        self
    }

    pub fn with_color(self, row: usize, column: usize, color: Rgb) -> Self {
        self.with_cell(
            row,
            column,
            CellData {
                text: None,
                background: Some(color),
            },
        )
    }

    pub fn with_text(self, row: usize, column: usize, text: &str) -> Self {
        self.with_cell(
            row,
            column,
            CellData {
                text: Some(text.to_string()),
                background: None,
            },
        )
    }
}

impl ScheduleStore for MemoryStore {
    async fn roster_records(&self) -> Result<Vec<RosterRecord>> {
        Ok(self.roster.clone())
    }

    async fn header_row(&self) -> Result<Vec<String>> {
        Ok(self.header.clone())
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellData> {
        Ok(self.cells.get(&(row, column)).cloned().unwrap_or_default())
    }
}
