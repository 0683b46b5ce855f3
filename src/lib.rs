pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::VerifierConfig;

pub use adapters::{MemoryStore, OpenAiClarifier, SheetsStore};
pub use core::{
    rag_context::RagContextBuilder, schedule::ScheduleGrid, verifier::AvailabilityVerifier,
};
pub use domain::model::{
    AppointmentRequest, ClarificationSuggestion, Doctor, SlotStatus, VerdictCause,
    VerificationVerdict,
};
pub use domain::ports::{ClarificationInput, Clarifier, ScheduleStore};
pub use utils::error::{Result, VerifierError};
