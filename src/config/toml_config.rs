use crate::adapters::{ClarifierSettings, OpenAiClarifier, SheetsSettings};
use crate::core::addressing::{GridAddressing, DEFAULT_END_HOUR, DEFAULT_START_HOUR};
use crate::core::color::{ColorClassifier, DEFAULT_TOLERANCE};
use crate::core::rag_context::{RagContextBuilder, DEFAULT_MAX_CHARS, DEFAULT_MAX_ITEMS};
use crate::core::verifier::AvailabilityVerifier;
use crate::domain::ports::ScheduleStore;
use crate::utils::error::{Result, VerifierError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SOURCE_SHEETS: &str = "sheets";
pub const SOURCE_FIXTURE: &str = "fixture";

const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
const DEFAULT_CLARIFIER_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub clarifier: Option<ClarifierConfig>,
    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    pub tolerance: Option<f64>,
    pub free: Option<[f64; 3]>,
    pub busy: Option<[f64; 3]>,
    pub holiday: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: String,
    pub endpoint: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub doctors_sheet: Option<String>,
    pub schedule_sheet: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub roster_csv: Option<String>,
    pub grid_json: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarifierConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    pub max_items: Option<usize>,
    pub max_chars: Option<usize>,
}

impl VerifierConfig {
    /// Reads a TOML file, substituting `${VAR}` placeholders first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VerifierError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VerifierError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| VerifierError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let addressing = self.addressing();
        validation::validate_range("schedule.start_hour", addressing.start_hour, 0, 23)?;
        validation::validate_range("schedule.end_hour", addressing.end_hour, 0, 23)?;
        if addressing.start_hour > addressing.end_hour {
            return Err(VerifierError::InvalidConfigValueError {
                field: "schedule.end_hour".to_string(),
                value: addressing.end_hour.to_string(),
                reason: format!("must not be before start_hour {}", addressing.start_hour),
            });
        }

        validation::validate_range("colors.tolerance", self.classifier().tolerance, 0.0, 1.0)?;
        for (field, color) in [
            ("colors.free", self.colors.free),
            ("colors.busy", self.colors.busy),
            ("colors.holiday", self.colors.holiday),
        ] {
            for channel in color.into_iter().flatten() {
                validation::validate_range(field, channel, 0.0, 1.0)?;
            }
        }

        match self.source.r#type.as_str() {
            SOURCE_SHEETS => {
                validation::validate_url("source.endpoint", &self.sheets_endpoint())?;
                let id = validation::validate_required_field(
                    "source.spreadsheet_id",
                    &self.source.spreadsheet_id,
                )?;
                validation::validate_non_empty_string("source.spreadsheet_id", id)?;
            }
            SOURCE_FIXTURE => {
                let roster = validation::validate_required_field("source.roster_csv", &self.source.roster_csv)?;
                let grid = validation::validate_required_field("source.grid_json", &self.source.grid_json)?;
                validation::validate_path("source.roster_csv", roster)?;
                validation::validate_path("source.grid_json", grid)?;
                validation::validate_file_extension("source.roster_csv", roster, &["csv"])?;
                validation::validate_file_extension("source.grid_json", grid, &["json"])?;
            }
            other => {
                return Err(VerifierError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: format!("Supported sources: {}, {}", SOURCE_SHEETS, SOURCE_FIXTURE),
                });
            }
        }

        if let Some(settings) = self.clarifier_settings() {
            validation::validate_url("clarifier.endpoint", &settings.endpoint)?;
            validation::validate_non_empty_string("clarifier.model", &settings.model)?;
            validation::validate_range("clarifier.temperature", settings.temperature, 0.0, 2.0)?;
        }

        let rag = self.context_builder();
        validation::validate_positive_number("rag.max_items", rag.max_items, 1)?;
        validation::validate_positive_number("rag.max_chars", rag.max_chars, 16)?;

        Ok(())
    }

    pub fn addressing(&self) -> GridAddressing {
        GridAddressing::new(
            self.schedule.start_hour.unwrap_or(DEFAULT_START_HOUR),
            self.schedule.end_hour.unwrap_or(DEFAULT_END_HOUR),
        )
    }

    pub fn classifier(&self) -> ColorClassifier {
        let defaults = ColorClassifier::default();
        ColorClassifier {
            free: self.colors.free.map(Into::into).unwrap_or(defaults.free),
            busy: self.colors.busy.map(Into::into).unwrap_or(defaults.busy),
            holiday: self.colors.holiday.map(Into::into).unwrap_or(defaults.holiday),
            tolerance: self.colors.tolerance.unwrap_or(DEFAULT_TOLERANCE),
        }
    }

    pub fn context_builder(&self) -> RagContextBuilder {
        RagContextBuilder::new(
            self.rag.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            self.rag.max_chars.unwrap_or(DEFAULT_MAX_CHARS),
        )
    }

    fn sheets_endpoint(&self) -> String {
        self.source
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_SHEETS_ENDPOINT.to_string())
    }

    pub fn sheets_settings(&self) -> Result<SheetsSettings> {
        let spreadsheet_id =
            validation::validate_required_field("source.spreadsheet_id", &self.source.spreadsheet_id)?;
        Ok(SheetsSettings {
            endpoint: self.sheets_endpoint(),
            spreadsheet_id: spreadsheet_id.clone(),
            doctors_sheet: self
                .source
                .doctors_sheet
                .clone()
                .unwrap_or_else(|| "Врачи".to_string()),
            schedule_sheet: self
                .source
                .schedule_sheet
                .clone()
                .unwrap_or_else(|| "Расписание".to_string()),
            api_key: non_placeholder(self.source.api_key.as_deref()),
            access_token: non_placeholder(self.source.access_token.as_deref()),
            timeout: Duration::from_secs(self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
        })
    }

    /// `(roster_csv, grid_json)` for the fixture source.
    pub fn fixture_paths(&self) -> Result<(&str, &str)> {
        let roster = validation::validate_required_field("source.roster_csv", &self.source.roster_csv)?;
        let grid = validation::validate_required_field("source.grid_json", &self.source.grid_json)?;
        Ok((roster.as_str(), grid.as_str()))
    }

    /// `None` when the clarifier is absent or disabled.
    pub fn clarifier_settings(&self) -> Option<ClarifierSettings> {
        let config = self.clarifier.as_ref().filter(|c| c.enabled)?;
        Some(ClarifierSettings {
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_CLARIFIER_ENDPOINT.to_string()),
            api_key: non_placeholder(config.api_key.as_deref()),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature.unwrap_or(0.3),
            timeout: Duration::from_secs(config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
        })
    }

    /// Wires a verifier over `store` with every configured component.
    pub fn build_verifier<S: ScheduleStore>(&self, store: S) -> Result<AvailabilityVerifier<S>> {
        let verifier = AvailabilityVerifier::new(store)
            .with_addressing(self.addressing())
            .with_classifier(self.classifier())
            .with_context_builder(self.context_builder());

        match self.clarifier_settings() {
            Some(settings) => {
                tracing::debug!("Clarifier enabled with model {}", settings.model);
                Ok(verifier.with_clarifier(OpenAiClarifier::new(settings)?))
            }
            None => Ok(verifier),
        }
    }
}

/// Drops empty values and `${VAR}` placeholders left by unset variables.
fn non_placeholder(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
        .map(str::to_string)
}

impl Validate for VerifierConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
