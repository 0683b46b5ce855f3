use anyhow::Result;
use httpmock::prelude::*;
use slot_verifier::{AppointmentRequest, SheetsStore, VerdictCause, VerifierConfig, VerifierError};

fn config(server: &MockServer) -> Result<VerifierConfig> {
    let toml = format!(
        r#"
[source]
type = "sheets"
endpoint = "{}"
spreadsheet_id = "clinic"
api_key = "sheets-key"
doctors_sheet = "Doctors"
schedule_sheet = "Schedule"

[clarifier]
enabled = true
endpoint = "{}"
api_key = "sk-test"
model = "gpt-test"
"#,
        server.base_url(),
        server.url("/v1")
    );
    Ok(VerifierConfig::from_toml_str(&toml)?)
}

async fn mock_roster(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/values/")
                .path_contains("Doctors")
                .query_param("key", "sheets-key");
            then.status(200).json_body(serde_json::json!({
                "values": [
                    ["ФИО врача", "Специальность"],
                    ["Иванов И.И.", "Терапевт"],
                    ["Петрова А.С.", "Кардиолог"]
                ]
            }));
        })
        .await;
}

async fn mock_busy_grid(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/values/").path_contains("1:1");
            then.status(200).json_body(serde_json::json!({
                "values": [["Время", "Иванов И.И.", "Петрова А.С."]]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/values/").path_contains("B7");
            then.status(200).json_body(serde_json::json!({"values": [["Смирнов"]]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/clinic")
                .query_param_exists("fields");
            then.status(200).json_body(serde_json::json!({
                "sheets": [{"data": [{"rowData": [{"values": [{
                    "userEnteredFormat": {"backgroundColor": {"red": 0.95686275, "green": 0.8, "blue": 0.8}}
                }]}]}]}]
            }));
        })
        .await;
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_busy_slot_is_escalated_to_clarifier() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_roster(&server).await;
    mock_busy_grid(&server).await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_contains("is busy at 14:00");
            then.status(200).json_body(completion(
                "```json\n{\"doctor_exists_alternative\": true, \"alternative_doctors\": [], \
                 \"recommendation\": \"Предложите 15:00\"}\n```",
            ));
        })
        .await;

    let config = config(&server)?;
    let verifier = config.build_verifier(SheetsStore::new(config.sheets_settings()?)?)?;
    let verdict = verifier
        .verify(&AppointmentRequest::for_doctor("Иванов").with_time("14"))
        .await?;

    chat.assert_async().await;
    assert_eq!(verdict.cause, VerdictCause::SlotBusy);
    assert!(!verdict.verified);
    assert!(verdict.doctor_exists && verdict.specialty_matches);
    let suggestion = verdict.clarification.expect("clarification attached");
    assert_eq!(suggestion.recommendation, "Предложите 15:00");
    assert!(!suggestion.is_unparsed());
    Ok(())
}

#[tokio::test]
async fn test_unparseable_clarifier_reply_is_kept_raw() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_roster(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(completion("Попробуйте другого терапевта."));
        })
        .await;

    let config = config(&server)?;
    let verifier = config.build_verifier(SheetsStore::new(config.sheets_settings()?)?)?;
    let verdict = verifier
        .verify(&AppointmentRequest::for_doctor("Сидоров"))
        .await?;

    assert_eq!(verdict.cause, VerdictCause::DoctorNotFound);
    let suggestion = verdict.clarification.expect("clarification attached");
    assert!(suggestion.is_unparsed());
    assert_eq!(suggestion.raw_response.as_deref(), Some("Попробуйте другого терапевта."));
    assert!(suggestion.alternative_doctors.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_clarifier_outage_keeps_verdict() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_roster(&server).await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503);
        })
        .await;

    let config = config(&server)?;
    let verifier = config.build_verifier(SheetsStore::new(config.sheets_settings()?)?)?;
    let verdict = verifier
        .verify(&AppointmentRequest::for_doctor("Петрова").with_specialty("Терапевт"))
        .await?;

    chat.assert_hits_async(1).await;
    assert_eq!(verdict.cause, VerdictCause::SpecialtyMismatch);
    assert!(verdict.doctor_exists);
    assert!(!verdict.specialty_matches);
    assert!(verdict.clarification.is_none());
    Ok(())
}

#[tokio::test]
async fn test_verified_request_skips_clarifier() -> Result<()> {
    let server = MockServer::start_async().await;
    mock_roster(&server).await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("{}"));
        })
        .await;

    let config = config(&server)?;
    let verifier = config.build_verifier(SheetsStore::new(config.sheets_settings()?)?)?;
    let verdict = verifier
        .verify(&AppointmentRequest::for_doctor("Петрова").with_specialty("Кардиолог"))
        .await?;

    assert!(verdict.verified);
    chat.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_sheets_outage_is_not_doctor_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/values/");
            then.status(503);
        })
        .await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("{}"));
        })
        .await;

    let config = config(&server)?;
    let verifier = config.build_verifier(SheetsStore::new(config.sheets_settings()?)?)?;
    let err = verifier
        .verify(&AppointmentRequest::for_doctor("Иванов").with_time("14"))
        .await
        .unwrap_err();

    assert!(matches!(err, VerifierError::BackingStoreUnavailable { .. }));
    chat.assert_hits_async(0).await;
    Ok(())
}
