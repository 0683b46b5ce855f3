use crate::domain::model::AppointmentRequest;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "slot-verifier")]
#[command(about = "Verify appointment requests against a color-coded doctor schedule")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "slot-verifier.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Verify one appointment request and print the verdict as JSON
    Verify {
        /// Read the request from a JSON file ("-" for stdin) instead of flags
        #[arg(long, conflicts_with_all = ["doctor", "specialty", "time", "date"])]
        request: Option<String>,

        #[arg(long)]
        doctor: Option<String>,

        #[arg(long)]
        specialty: Option<String>,

        /// Hour as "14" or "14:00"
        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Print the directory context used to ground extraction
    Context {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        specialty: Option<String>,
    },

    /// Print every hour of one doctor's day
    Day {
        #[arg(long)]
        doctor: String,
    },

    /// Load and validate the configuration without contacting any service
    CheckConfig,
}

impl Command {
    /// Request built from `verify` flags; `None` for other commands or when `--request` is used.
    pub fn request_from_flags(&self) -> Option<AppointmentRequest> {
        match self {
            Command::Verify {
                request: None,
                doctor,
                specialty,
                time,
                date,
            } => Some(AppointmentRequest {
                doctor_name: doctor.clone().unwrap_or_default(),
                specialty: specialty.clone(),
                time: time.clone(),
                date: date.clone(),
                ..AppointmentRequest::default()
            }),
            _ => None,
        }
    }
}
