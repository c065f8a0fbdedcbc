//! Google Sheets REST (v4) implementation of [`SheetBackend`].

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::credentials::{fetch_access_token, AccessToken, ServiceAccountKey};
use super::{column_range, quote_sheet_name, SheetBackend, SheetError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Client for one spreadsheet, authenticated as a service account
pub struct GoogleSheets {
    http: Client,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GoogleSheets {
    /// Authenticate and check that the spreadsheet is reachable
    ///
    /// Fails when the key cannot be exchanged for a token or the service
    /// account has no access to the spreadsheet.
    pub async fn connect(key: ServiceAccountKey, spreadsheet_id: &str) -> Result<Self, SheetError> {
        let sheets = Self {
            http: Client::new(),
            key,
            spreadsheet_id: spreadsheet_id.to_string(),
            token: Mutex::new(None),
        };

        let mut url = sheets.spreadsheet_url()?;
        url.query_pairs_mut().append_pair("fields", "spreadsheetId");
        let token = sheets.bearer().await?;
        let response = sheets.http.get(url).bearer_auth(token).send().await?;
        Self::check_status(response, spreadsheet_id).await?;

        info!(spreadsheet_id = %spreadsheet_id, "Connected to spreadsheet");
        Ok(sheets)
    }

    fn spreadsheet_url(&self) -> Result<Url, SheetError> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| SheetError::Transport(format!("invalid API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Transport("API base cannot be a base URL".to_string()))?
            .push(&self.spreadsheet_id);
        Ok(url)
    }

    /// `…/spreadsheets/{id}/values/{segment}`
    fn values_url(&self, segment: &str) -> Result<Url, SheetError> {
        let mut url = self.spreadsheet_url()?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Transport("API base cannot be a base URL".to_string()))?
            .push("values")
            .push(segment);
        Ok(url)
    }

    /// Current access token, refreshed when close to expiry
    async fn bearer(&self) -> Result<String, SheetError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }
        let token = fetch_access_token(&self.http, &self.key).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn check_status(
        response: reqwest::Response,
        sheet: &str,
    ) -> Result<reqwest::Response, SheetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        // A missing tab is reported as a range parse failure
        if status == StatusCode::BAD_REQUEST && message.contains("Unable to parse range") {
            return Err(SheetError::SheetNotFound(sheet.to_string()));
        }
        Err(SheetError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl SheetBackend for GoogleSheets {
    async fn read_column(&self, sheet: &str, column: usize) -> Result<Vec<String>, SheetError> {
        let mut url = self.values_url(&column_range(sheet, column))?;
        url.query_pairs_mut().append_pair("majorDimension", "COLUMNS");

        let token = self.bearer().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = Self::check_status(response, sheet).await?.json().await?;

        // Interior blanks come back as "", trailing ones are omitted
        let values = range.values.into_iter().next().unwrap_or_default();
        debug!(sheet = %sheet, column, count = values.len(), "Read sheet column");
        Ok(values)
    }

    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), SheetError> {
        let segment = format!("{}!A1:append", quote_sheet_name(sheet));
        let mut url = self.values_url(&segment)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "majorDimension": "ROWS", "values": [values] });
        let token = self.bearer().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response, sheet).await?;

        info!(sheet = %sheet, cells = values.len(), "Appended row");
        Ok(())
    }
}
