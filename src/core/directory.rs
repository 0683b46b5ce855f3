use crate::domain::model::{Doctor, RosterRecord};
use crate::domain::ports::ScheduleStore;
use crate::utils::error::Result;

/// Header labels accepted for the doctor's name, in priority order.
pub const NAME_LABELS: &[&str] = &["ФИО врача", "Имя", "name"];
/// Header labels accepted for the specialty, in priority order.
pub const SPECIALTY_LABELS: &[&str] = &["Специальность", "Специализация", "specialty"];

/// Snapshot of the doctor roster, kept in roster order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorDirectory {
    doctors: Vec<Doctor>,
}

impl DoctorDirectory {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }

    /// Rows without a name are dropped.
    pub fn from_records(records: &[RosterRecord]) -> Self {
        let doctors = records
            .iter()
            .filter_map(|record| {
                let name = record.first_of(NAME_LABELS)?;
                let specialty = record.first_of(SPECIALTY_LABELS).unwrap_or_default();
                Some(Doctor::new(name, specialty))
            })
            .collect();
        Self { doctors }
    }

    /// Reads the roster fresh from `store`.
    pub async fn load<S: ScheduleStore>(store: &S) -> Result<Self> {
        let records = store.roster_records().await?;
        let directory = Self::from_records(&records);
        tracing::debug!(
            "Loaded {} doctors from {} roster rows",
            directory.len(),
            records.len()
        );
        Ok(directory)
    }

    pub fn all(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    pub fn find_by_name(&self, query: &str) -> Vec<Doctor> {
        self.find_by(query, |doctor| &doctor.name)
    }

    pub fn find_by_specialty(&self, query: &str) -> Vec<Doctor> {
        self.find_by(query, |doctor| &doctor.specialty)
    }

    fn find_by(&self, query: &str, field: impl Fn(&Doctor) -> &str) -> Vec<Doctor> {
        let query = query.trim().to_lowercase();
        self.doctors
            .iter()
            .filter(|doctor| {
                let value = field(doctor).to_lowercase();
                value.contains(&query) || (!value.is_empty() && query.contains(&value))
            })
            .cloned()
            .collect()
    }
}
