pub mod addressing;
pub mod color;
pub mod directory;
pub mod rag_context;
pub mod schedule;
pub mod verifier;

pub use crate::domain::model::{
    AppointmentRequest, ClarificationSuggestion, Doctor, SlotLookup, SlotStatus, VerdictCause,
    VerificationVerdict,
};
pub use crate::domain::ports::{ClarificationInput, Clarifier, ScheduleStore};
pub use crate::utils::error::Result;
