use crate::core::addressing::{display_time, parse_hour, GridAddressing};
use crate::core::color::ColorClassifier;
use crate::core::directory::DoctorDirectory;
use crate::core::rag_context::{is_not_found, ContextFilter, RagContextBuilder};
use crate::core::schedule::ScheduleGrid;
use crate::domain::model::{
    AppointmentRequest, Doctor, SlotLookup, SlotStatus, VerdictCause, VerificationVerdict,
};
use crate::domain::ports::{ClarificationInput, Clarifier, ScheduleStore};
use crate::utils::error::Result;

/// Checks an appointment request against the roster and the schedule grid.
///
/// Every business outcome is returned as a verdict. The only error `verify`
/// returns is a store failure, so "doctor not found" can never be confused
/// with "schedule unreachable".
pub struct AvailabilityVerifier<S: ScheduleStore> {
    store: S,
    addressing: GridAddressing,
    classifier: ColorClassifier,
    context_builder: RagContextBuilder,
    clarifier: Option<Box<dyn Clarifier>>,
}

impl<S: ScheduleStore> AvailabilityVerifier<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            addressing: GridAddressing::default(),
            classifier: ColorClassifier::default(),
            context_builder: RagContextBuilder::default(),
            clarifier: None,
        }
    }

    pub fn with_addressing(mut self, addressing: GridAddressing) -> Self {
        self.addressing = addressing;
        self
    }

    pub fn with_classifier(mut self, classifier: ColorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_context_builder(mut self, context_builder: RagContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    pub fn with_clarifier(mut self, clarifier: impl Clarifier + 'static) -> Self {
        self.clarifier = Some(Box::new(clarifier));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn context_builder(&self) -> &RagContextBuilder {
        &self.context_builder
    }

    pub fn grid(&self) -> ScheduleGrid<'_, S> {
        ScheduleGrid::new(&self.store, self.addressing, self.classifier)
    }

    pub async fn verify(&self, request: &AppointmentRequest) -> Result<VerificationVerdict> {
        let (verdict, directory) = self.evaluate(request).await?;

        tracing::info!(
            "Verdict for '{}': verified={} cause={:?}",
            request.doctor_name,
            verdict.verified,
            verdict.cause
        );

        match directory {
            Some(directory) if !verdict.verified => Ok(self.escalate(request, verdict, &directory).await),
            _ => Ok(verdict),
        }
    }

    async fn evaluate(
        &self,
        request: &AppointmentRequest,
    ) -> Result<(VerificationVerdict, Option<DoctorDirectory>)> {
        let query = request.doctor_name.trim();
        if query.is_empty() {
            let verdict = VerificationVerdict::new(
                false,
                true,
                true,
                VerdictCause::DoctorNotSpecified,
                "doctor not specified",
            );
            return Ok((verdict, None));
        }

        let directory = DoctorDirectory::load(&self.store).await?;
        let candidates = directory.find_by_name(query);

        let Some(doctor) = candidates.first().cloned() else {
            let verdict = VerificationVerdict::new(
                false,
                true,
                true,
                VerdictCause::DoctorNotFound,
                format!("doctor '{query}' not found in the directory"),
            );
            return Ok((verdict, Some(directory)));
        };

        let mut verdict = self.check_doctor(request, &doctor).await?;
        verdict.candidate_count = candidates.len();
        if candidates.len() > 1 {
            verdict.message = format!(
                "{}; note: {} doctors match '{}', using {}",
                verdict.message,
                candidates.len(),
                query,
                doctor.name
            );
        }
        verdict.matched_doctor = Some(doctor);

        Ok((verdict, Some(directory)))
    }

    async fn check_doctor(
        &self,
        request: &AppointmentRequest,
        doctor: &Doctor,
    ) -> Result<VerificationVerdict> {
        if let Some(requested) = request.requested_specialty() {
            if !doctor
                .specialty
                .to_lowercase()
                .contains(&requested.to_lowercase())
            {
                return Ok(VerificationVerdict::new(
                    true,
                    false,
                    true,
                    VerdictCause::SpecialtyMismatch,
                    format!(
                        "doctor {} found, but specialty '{}' does not match requested '{}'",
                        doctor.name, doctor.specialty, requested
                    ),
                ));
            }
        }

        let Some(time) = request.requested_time() else {
            return Ok(VerificationVerdict::new(
                true,
                true,
                true,
                VerdictCause::DoctorFound,
                format!("doctor {} found: {}", doctor.name, doctor.specialty),
            ));
        };

        let Some(hour) = parse_hour(time) else {
            return Ok(VerificationVerdict::new(
                true,
                true,
                false,
                VerdictCause::InvalidTime,
                format!("time '{time}' is not a valid hour"),
            ));
        };

        let lookup = self
            .grid()
            .get_status_for(&doctor.name, hour, std::slice::from_ref(doctor))
            .await?;

        let (cause, message) = self.describe_lookup(&lookup, doctor, time);
        let available = lookup.status() == Some(SlotStatus::Free);
        Ok(VerificationVerdict::new(true, true, available, cause, message))
    }

    fn describe_lookup(&self, lookup: &SlotLookup, doctor: &Doctor, time: &str) -> (VerdictCause, String) {
        let at = display_time(time);
        let name = &doctor.name;
        match lookup {
            SlotLookup::OutOfRange { .. } => (
                VerdictCause::TimeOutOfRange,
                format!(
                    "time out of range: '{}' is outside {}:00-{}:00",
                    time, self.addressing.start_hour, self.addressing.end_hour
                ),
            ),
            SlotLookup::DoctorNotInGrid => (
                VerdictCause::DoctorNotInGrid,
                format!("doctor {name} not found in the schedule grid"),
            ),
            SlotLookup::Resolved(cell) => match cell.status {
                SlotStatus::Free => (VerdictCause::SlotFree, format!("doctor {name} is free at {at}")),
                SlotStatus::Busy => (VerdictCause::SlotBusy, format!("doctor {name} is busy at {at}")),
                SlotStatus::Holiday => (
                    VerdictCause::SlotHoliday,
                    format!("doctor {name} is off (holiday) at {at}"),
                ),
                SlotStatus::Unknown => (
                    VerdictCause::SlotUnknown,
                    format!("status of doctor {name} at {at} is undetermined"),
                ),
            },
        }
    }

    /// Asks the clarifier for advice. Never touches the deterministic fields.
    async fn escalate(
        &self,
        request: &AppointmentRequest,
        mut verdict: VerificationVerdict,
        directory: &DoctorDirectory,
    ) -> VerificationVerdict {
        let Some(clarifier) = self.clarifier.as_deref() else {
            return verdict;
        };

        let context = self.clarifier_context(request, directory);
        let input = ClarificationInput {
            request,
            directory_context: &context,
            failure_message: &verdict.message,
        };

        let outcome = clarifier.clarify(input).await;
        match outcome {
            Ok(suggestion) => {
                if suggestion.is_unparsed() {
                    tracing::warn!("Clarifier answered but the answer could not be parsed");
                }
                verdict.clarification = Some(suggestion);
            }
            Err(e) => {
                tracing::warn!("Clarifier failed, verdict returned without clarification: {}", e);
            }
        }
        verdict
    }

    fn clarifier_context(&self, request: &AppointmentRequest, directory: &DoctorDirectory) -> String {
        if let Some(specialty) = request.requested_specialty() {
            let context = self
                .context_builder
                .render(directory, &ContextFilter::by_specialty(specialty));
            if !is_not_found(&context) {
                return context;
            }
        }
        self.context_builder.render(directory, &ContextFilter::default())
    }
}
