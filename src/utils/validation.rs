use crate::utils::error::{Result, VerifierError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> VerifierError {
    VerifierError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Accepts absolute http(s) URLs only.
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "URL cannot be empty"));
    }

    let url = Url::parse(value).map_err(|e| invalid(field, value, format!("Invalid URL format: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, value, format!("Unsupported URL scheme: {scheme}"))),
    }
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        Err(invalid(field, path, "Path cannot be empty"))
    } else if path.contains('\0') {
        Err(invalid(field, path, "Path contains null bytes"))
    } else {
        Ok(())
    }
}

pub fn validate_positive_number(field: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(field, value, format!("Value must be at least {min_value}")));
    }
    Ok(())
}

/// Extension match is case-insensitive, so `ROSTER.CSV` passes for `csv`.
pub fn validate_file_extension(field: &str, path: &str, allowed: &[&str]) -> Result<()> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| invalid(field, path, "File has no extension"))?;

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(extension)) {
        Ok(())
    } else {
        Err(invalid(
            field,
            path,
            format!("Unsupported file extension '{}', expected {}", extension, allowed.join(", ")),
        ))
    }
}

pub fn validate_required_field<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| VerifierError::MissingConfigError {
        field: field.to_string(),
    })
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

/// Inclusive on both ends.
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("Value must be between {min} and {max}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("source.endpoint", "https://sheets.googleapis.com").is_ok());
        assert!(validate_url("source.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("source.endpoint", "").is_err());
        assert!(validate_url("source.endpoint", "sheets.googleapis.com").is_err());
        assert!(validate_url("source.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range_hours() {
        assert!(validate_range("schedule.start_hour", 9u32, 0, 23).is_ok());
        assert!(validate_range("schedule.end_hour", 23u32, 0, 23).is_ok());
        assert!(validate_range("schedule.end_hour", 24u32, 0, 23).is_err());
        assert!(validate_range("colors.tolerance", 0.1f64, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("source.roster_csv", "fixtures/roster.csv", &["csv"]).is_ok());
        assert!(validate_file_extension("source.roster_csv", "ROSTER.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("source.roster_csv", "roster.xlsx", &["csv"]).is_err());
        assert!(validate_file_extension("source.grid_json", "grid", &["json"]).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("source.grid_json", "grid.json").is_ok());
        assert!(validate_path("source.grid_json", "  ").is_err());
        assert!(validate_path("source.grid_json", "gr\0id.json").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("sheet-id".to_string());
        let missing: Option<String> = None;
        assert_eq!(
            validate_required_field("source.spreadsheet_id", &present).unwrap(),
            "sheet-id"
        );
        assert!(matches!(
            validate_required_field("source.spreadsheet_id", &missing),
            Err(VerifierError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_value_carries_field_and_reason() {
        let err = validate_positive_number("rag.max_items", 0, 1).unwrap_err();
        match err {
            VerifierError::InvalidConfigValueError { field, value, reason } => {
                assert_eq!(field, "rag.max_items");
                assert_eq!(value, "0");
                assert!(reason.contains("at least 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
