use crate::domain::model::{AppointmentRequest, CellData, ClarificationSuggestion, RosterRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read access to the roster and the schedule grid. Rows and columns are 1-based.
///
/// Implementations report transport failures as
/// [`VerifierError::BackingStoreUnavailable`](crate::utils::error::VerifierError).
pub trait ScheduleStore: Send + Sync {
    fn roster_records(&self) -> impl std::future::Future<Output = Result<Vec<RosterRecord>>> + Send;

    fn header_row(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    fn read_cell(
        &self,
        row: usize,
        column: usize,
    ) -> impl std::future::Future<Output = Result<CellData>> + Send;
}

pub struct ClarificationInput<'a> {
    pub request: &'a AppointmentRequest,
    pub directory_context: &'a str,
    pub failure_message: &'a str,
}

#[async_trait]
pub trait Clarifier: Send + Sync {
    async fn clarify(&self, input: ClarificationInput<'_>) -> Result<ClarificationSuggestion>;
}
