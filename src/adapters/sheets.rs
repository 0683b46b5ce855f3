use crate::core::addressing::to_a1;
use crate::domain::model::{CellData, Rgb, RosterRecord};
use crate::domain::ports::ScheduleStore;
use crate::utils::error::{Result, VerifierError};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const STORE_NAME: &str = "google-sheets";
const BACKGROUND_FIELDS: &str = "sheets.data.rowData.values.userEnteredFormat.backgroundColor";

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub endpoint: String,
    pub spreadsheet_id: String,
    pub doctors_sheet: String,
    pub schedule_sheet: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

/// Reads the roster and the color-coded grid through the Sheets v4 REST API.
///
/// Credentials are used as given; no token exchange happens here.
pub struct SheetsStore {
    client: Client,
    endpoint: Url,
    settings: SheetsSettings,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sheet {
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowData {
    #[serde(default)]
    values: Vec<ApiCell>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCell {
    #[serde(default)]
    user_entered_format: Option<CellFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellFormat {
    #[serde(default)]
    background_color: Option<HashMap<String, f64>>,
}

impl Spreadsheet {
    /// The API omits zero channels; an empty color object means "no color".
    fn first_background(self) -> Option<Rgb> {
        let channels = self
            .sheets
            .into_iter()
            .next()?
            .data
            .into_iter()
            .next()?
            .row_data
            .into_iter()
            .next()?
            .values
            .into_iter()
            .next()?
            .user_entered_format?
            .background_color?;

        if channels.is_empty() {
            return None;
        }
        let channel = |key: &str| channels.get(key).copied().unwrap_or(0.0);
        Some(Rgb::new(channel("red"), channel("green"), channel("blue")))
    }
}

impl SheetsStore {
    pub fn new(settings: SheetsSettings) -> Result<Self> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| VerifierError::InvalidConfigValueError {
            field: "source.endpoint".to_string(),
            value: settings.endpoint.clone(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            settings,
        })
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| VerifierError::ConfigError {
                message: format!("endpoint '{}' cannot be used as a base URL", self.endpoint),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.settings.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.settings.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.settings.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.spreadsheet_url(&["values", range])?;
        tracing::debug!("Reading range {} from spreadsheet", range);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| VerifierError::backing_store(STORE_NAME, format!("reading '{range}': {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifierError::backing_store(
                STORE_NAME,
                format!("reading '{range}' returned HTTP {status}"),
            ));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| VerifierError::backing_store(STORE_NAME, format!("decoding '{range}': {e}")))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(value_to_text).collect())
            .collect())
    }

    async fn fetch_background(&self, a1: &str) -> Result<Option<Rgb>> {
        let url = self.spreadsheet_url(&[])?;
        let range = self.schedule_range(a1);
        let response = self
            .authorize(self.client.get(url))
            .query(&[("ranges", range.as_str()), ("fields", BACKGROUND_FIELDS)])
            .send()
            .await?
            .error_for_status()?;
        let spreadsheet: Spreadsheet = response.json().await?;
        Ok(spreadsheet.first_background())
    }

    fn schedule_range(&self, cells: &str) -> String {
        format!("'{}'!{}", self.settings.schedule_sheet.replace('\'', "''"), cells)
    }
}

impl ScheduleStore for SheetsStore {
    async fn roster_records(&self) -> Result<Vec<RosterRecord>> {
        let sheet = format!("'{}'", self.settings.doctors_sheet.replace('\'', "''"));
        let mut rows = self.fetch_values(&sheet).await?.into_iter();
        let Some(labels) = rows.next() else {
            return Ok(Vec::new());
        };

        Ok(rows
            .map(|row| {
                RosterRecord::from_pairs(labels.iter().enumerate().map(|(i, label)| {
                    (label.trim().to_string(), row.get(i).cloned().unwrap_or_default())
                }))
            })
            .collect())
    }

    async fn header_row(&self) -> Result<Vec<String>> {
        let rows = self.fetch_values(&self.schedule_range("1:1")).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn read_cell(&self, row: usize, column: usize) -> Result<CellData> {
        let a1 = to_a1(row, column);
        let text = self
            .fetch_values(&self.schedule_range(&a1))
            .await?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next());

        let background = match self.fetch_background(&a1).await {
            Ok(color) => color,
            Err(e) => {
                tracing::warn!("Could not read background of {}, using cell text: {}", a1, e);
                None
            }
        };

        Ok(CellData { text, background })
    }
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store(server: &MockServer) -> SheetsStore {
        SheetsStore::new(SheetsSettings {
            endpoint: server.base_url(),
            spreadsheet_id: "test-sheet".to_string(),
            doctors_sheet: "Doctors".to_string(),
            schedule_sheet: "Schedule".to_string(),
            api_key: Some("test-key".to_string()),
            access_token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_roster_records_use_first_row_as_labels() {
        let server = MockServer::start_async().await;
        let roster_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet/values/'Doctors'")
                    .query_param("key", "test-key");
                then.status(200).json_body(serde_json::json!({
                    "range": "Doctors!A1:B3",
                    "values": [
                        ["ФИО врача", "Специальность"],
                        ["Иванов И.И.", "Терапевт"],
                        ["Петрова А.С."]
                    ]
                }));
            })
            .await;

        let records = store(&server).roster_records().await.unwrap();

        roster_mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_of(&["Специальность"]), Some("Терапевт"));
        assert_eq!(records[1].first_of(&["ФИО врача"]), Some("Петрова А.С."));
        assert_eq!(records[1].first_of(&["Специальность"]), None);
    }

    #[tokio::test]
    async fn test_header_row() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet/values/'Schedule'!1:1");
                then.status(200).json_body(serde_json::json!({
                    "values": [["Время", "Иванов И.И.", "Петрова А.С."]]
                }));
            })
            .await;

        let header = store(&server).header_row().await.unwrap();
        assert_eq!(header, vec!["Время", "Иванов И.И.", "Петрова А.С."]);
    }

    #[tokio::test]
    async fn test_read_cell_with_background() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet/values/'Schedule'!B7");
                then.status(200).json_body(serde_json::json!({"range": "Schedule!B7"}));
            })
            .await;
        let color_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet")
                    .query_param("ranges", "'Schedule'!B7")
                    .query_param("fields", BACKGROUND_FIELDS);
                then.status(200).json_body(serde_json::json!({
                    "sheets": [{"data": [{"rowData": [{"values": [{
                        "userEnteredFormat": {"backgroundColor": {"red": 0.95686275, "green": 0.8, "blue": 0.8}}
                    }]}]}]}]
                }));
            })
            .await;

        let cell = store(&server).read_cell(7, 2).await.unwrap();

        color_mock.assert_async().await;
        assert_eq!(cell.text, None);
        assert_eq!(cell.background, Some(Rgb::new(0.95686275, 0.8, 0.8)));
    }

    #[tokio::test]
    async fn test_read_cell_missing_channels_are_zero_and_empty_color_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/values/");
                then.status(200).json_body(serde_json::json!({"values": [["занято"]]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet")
                    .query_param("ranges", "'Schedule'!C3");
                then.status(200).json_body(serde_json::json!({
                    "sheets": [{"data": [{"rowData": [{"values": [{
                        "userEnteredFormat": {"backgroundColor": {"green": 1.0}}
                    }]}]}]}]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/test-sheet")
                    .query_param("ranges", "'Schedule'!C4");
                then.status(200).json_body(serde_json::json!({
                    "sheets": [{"data": [{"rowData": [{"values": [{
                        "userEnteredFormat": {"backgroundColor": {}}
                    }]}]}]}]
                }));
            })
            .await;

        let store = store(&server);
        let green = store.read_cell(3, 3).await.unwrap();
        assert_eq!(green.background, Some(Rgb::new(0.0, 1.0, 0.0)));
        assert_eq!(green.text.as_deref(), Some("занято"));

        let plain = store.read_cell(4, 3).await.unwrap();
        assert_eq!(plain.background, None);
    }

    #[tokio::test]
    async fn test_color_failure_degrades_to_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/values/");
                then.status(200).json_body(serde_json::json!({"values": [["свободно"]]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/spreadsheets/test-sheet");
                then.status(403);
            })
            .await;

        let cell = store(&server).read_cell(2, 2).await.unwrap();
        assert_eq!(cell.text.as_deref(), Some("свободно"));
        assert_eq!(cell.background, None);
    }

    #[tokio::test]
    async fn test_unreachable_roster_is_backing_store_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/values/");
                then.status(500);
            })
            .await;

        let err = store(&server).roster_records().await.unwrap_err();
        assert!(matches!(err, VerifierError::BackingStoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_backing_store_error() {
        let store = SheetsStore::new(SheetsSettings {
            endpoint: "http://127.0.0.1:1".to_string(),
            spreadsheet_id: "test-sheet".to_string(),
            doctors_sheet: "Doctors".to_string(),
            schedule_sheet: "Schedule".to_string(),
            api_key: None,
            access_token: Some("token".to_string()),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = store.header_row().await.unwrap_err();
        assert!(matches!(err, VerifierError::BackingStoreUnavailable { .. }));
    }
}
