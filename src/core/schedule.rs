use crate::core::addressing::GridAddressing;
use crate::core::color::ColorClassifier;
use crate::core::directory::DoctorDirectory;
use crate::domain::model::{CellData, Doctor, ScheduleCell, SlotLookup, SlotStatus, StatusSource};
use crate::domain::ports::ScheduleStore;
use crate::utils::error::Result;

const FREE_WORDS: &[&str] = &["свободно", "free"];
const BUSY_WORDS: &[&str] = &["занято", "busy", "занят"];
const HOLIDAY_WORDS: &[&str] = &["выходной", "holiday", "вых"];

/// Decodes a cell's text when it carries no background color.
pub fn status_from_text(text: Option<&str>) -> SlotStatus {
    let text = text.map(|t| t.trim().to_lowercase()).unwrap_or_default();
    let word = text.as_str();
    if word.is_empty() || FREE_WORDS.contains(&word) {
        SlotStatus::Free
    } else if BUSY_WORDS.contains(&word) {
        SlotStatus::Busy
    } else if HOLIDAY_WORDS.contains(&word) {
        SlotStatus::Holiday
    } else {
        SlotStatus::Unknown
    }
}

/// Per-call view over the schedule grid of a [`ScheduleStore`].
pub struct ScheduleGrid<'a, S: ScheduleStore> {
    store: &'a S,
    addressing: GridAddressing,
    classifier: ColorClassifier,
}

impl<'a, S: ScheduleStore> ScheduleGrid<'a, S> {
    pub fn new(store: &'a S, addressing: GridAddressing, classifier: ColorClassifier) -> Self {
        Self {
            store,
            addressing,
            classifier,
        }
    }

    /// Background color wins over text; text is only read when no color is set.
    pub fn classify_cell(&self, cell: &CellData) -> (SlotStatus, StatusSource) {
        match cell.background {
            Some(color) => (self.classifier.classify(color), StatusSource::Color),
            None => (status_from_text(cell.text.as_deref()), StatusSource::Text),
        }
    }

    /// Status of `doctor_name` at `hour`, resolving directory matches from the store.
    pub async fn get_status(&self, doctor_name: &str, hour: u32) -> Result<SlotLookup> {
        if self.addressing.time_to_row(hour).is_none() {
            return Ok(SlotLookup::OutOfRange { hour });
        }
        let directory = DoctorDirectory::load(self.store).await?;
        let candidates = directory.find_by_name(doctor_name);
        self.get_status_for(doctor_name, hour, &candidates).await
    }

    /// Like [`get_status`](Self::get_status) with directory matches already resolved.
    pub async fn get_status_for(
        &self,
        doctor_name: &str,
        hour: u32,
        candidates: &[Doctor],
    ) -> Result<SlotLookup> {
        let Some(row) = self.addressing.time_to_row(hour) else {
            return Ok(SlotLookup::OutOfRange { hour });
        };

        let Some(column) = self.locate_column(doctor_name, candidates).await? else {
            return Ok(SlotLookup::DoctorNotInGrid);
        };

        let cell = self.read(row, column).await?;
        Ok(SlotLookup::Resolved(cell))
    }

    /// Every hour of one doctor's day, `None` when the doctor has no column.
    pub async fn day_schedule(
        &self,
        doctor_name: &str,
        candidates: &[Doctor],
    ) -> Result<Option<Vec<(u32, SlotStatus)>>> {
        let Some(column) = self.locate_column(doctor_name, candidates).await? else {
            return Ok(None);
        };

        let mut day = Vec::new();
        for hour in self.addressing.hours() {
            if let Some(row) = self.addressing.time_to_row(hour) {
                let cell = self.read(row, column).await?;
                day.push((hour, cell.status));
            }
        }
        Ok(Some(day))
    }

    async fn locate_column(&self, doctor_name: &str, candidates: &[Doctor]) -> Result<Option<usize>> {
        let header_row = self.store.header_row().await?;
        let column = self
            .addressing
            .doctor_to_column(doctor_name, &header_row, candidates);
        if column.is_none() {
            tracing::debug!(
                "Doctor '{}' not found among {} grid headers",
                doctor_name,
                header_row.len()
            );
        }
        Ok(column)
    }

    async fn read(&self, row: usize, column: usize) -> Result<ScheduleCell> {
        let data = self.store.read_cell(row, column).await?;
        let (status, decided_by) = self.classify_cell(&data);
        tracing::debug!(
            "Cell ({}, {}) -> {} by {:?}",
            row,
            column,
            status,
            decided_by
        );
        Ok(ScheduleCell {
            row,
            column,
            status,
            decided_by,
        })
    }
}
