use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One raw roster row keyed by its header label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub data: HashMap<String, String>,
}

impl RosterRecord {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First non-empty value among `labels`.
    pub fn first_of(&self, labels: &[&str]) -> Option<&str> {
        labels
            .iter()
            .filter_map(|label| self.data.get(*label))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub name: String,
    pub specialty: String,
}

impl Doctor {
    pub fn new(name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specialty: specialty.into(),
        }
    }
}

/// Background color with channels in 0..=1, as the Sheets API reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

impl Rgb {
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

impl From<[f64; 3]> for Rgb {
    fn from([red, green, blue]: [f64; 3]) -> Self {
        Self { red, green, blue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Busy,
    Holiday,
    Unknown,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SlotStatus::Free => "free",
            SlotStatus::Busy => "busy",
            SlotStatus::Holiday => "holiday",
            SlotStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// What a backing store returns for one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub background: Option<Rgb>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    Color,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCell {
    pub row: usize,
    pub column: usize,
    pub status: SlotStatus,
    pub decided_by: StatusSource,
}

/// Outcome of addressing and reading one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLookup {
    Resolved(ScheduleCell),
    OutOfRange { hour: u32 },
    DoctorNotInGrid,
}

impl SlotLookup {
    pub fn status(&self) -> Option<SlotStatus> {
        match self {
            SlotLookup::Resolved(cell) => Some(cell.status),
            _ => None,
        }
    }
}

/// Structured request as produced by the upstream extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AppointmentRequest {
    pub fn for_doctor(doctor_name: impl Into<String>) -> Self {
        Self {
            doctor_name: doctor_name.into(),
            ..Self::default()
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Requested specialty, `None` when absent or blank.
    pub fn requested_specialty(&self) -> Option<&str> {
        non_blank(self.specialty.as_deref())
    }

    /// Requested time, `None` when absent or blank.
    pub fn requested_time(&self) -> Option<&str> {
        non_blank(self.time.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Tag of the message template a verdict carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictCause {
    DoctorNotSpecified,
    DoctorNotFound,
    SpecialtyMismatch,
    InvalidTime,
    TimeOutOfRange,
    DoctorNotInGrid,
    SlotFree,
    SlotBusy,
    SlotHoliday,
    SlotUnknown,
    DoctorFound,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarificationSuggestion {
    #[serde(default)]
    pub doctor_exists_alternative: Option<bool>,
    #[serde(default)]
    pub suggested_specialty: Option<String>,
    #[serde(default)]
    pub alternative_doctors: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
    /// Set when the clarifier answered but the answer could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ClarificationSuggestion {
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            raw_response: Some(raw.into()),
            ..Self::default()
        }
    }

    pub fn is_unparsed(&self) -> bool {
        self.raw_response.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub verified: bool,
    pub doctor_exists: bool,
    pub specialty_matches: bool,
    pub available_at_time: bool,
    pub message: String,
    pub cause: VerdictCause,
    pub candidate_count: usize,
    pub matched_doctor: Option<Doctor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<ClarificationSuggestion>,
}

impl VerificationVerdict {
    /// Builds a verdict with `verified` derived from the three signals.
    pub fn new(
        doctor_exists: bool,
        specialty_matches: bool,
        available_at_time: bool,
        cause: VerdictCause,
        message: impl Into<String>,
    ) -> Self {
        Self {
            verified: doctor_exists && specialty_matches && available_at_time,
            doctor_exists,
            specialty_matches,
            available_at_time,
            message: message.into(),
            cause,
            candidate_count: 0,
            matched_doctor: None,
            clarification: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_record_first_of_skips_blank_labels() {
        let record = RosterRecord::from_pairs([("ФИО врача", "  "), ("Имя", "Иванов И.И.")]);
        assert_eq!(record.first_of(&["ФИО врача", "Имя"]), Some("Иванов И.И."));
        assert_eq!(record.first_of(&["name"]), None);
    }

    #[test]
    fn test_verdict_derives_verified() {
        let verdict = VerificationVerdict::new(true, true, false, VerdictCause::SlotBusy, "busy");
        assert!(!verdict.verified);
        let verdict = VerificationVerdict::new(true, true, true, VerdictCause::SlotFree, "free");
        assert!(verdict.verified);
    }

    #[test]
    fn test_request_blank_fields_are_absent() {
        let request = AppointmentRequest::for_doctor("Иванов")
            .with_specialty("  ")
            .with_time("");
        assert_eq!(request.requested_specialty(), None);
        assert_eq!(request.requested_time(), None);
    }

    #[test]
    fn test_request_deserializes_partial_json() {
        let request: AppointmentRequest =
            serde_json::from_str(r#"{"doctor_name": "Иванов", "time": "14:00"}"#).unwrap();
        assert_eq!(request.doctor_name, "Иванов");
        assert_eq!(request.requested_time(), Some("14:00"));
        assert_eq!(request.specialty, None);
    }
}
