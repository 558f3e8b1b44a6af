//! Sheets v4 REST client.

use std::{sync::Arc, time::Duration};

use humidor_engine::{Cell, RowIndex, RowPosition};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CredentialProvider, Result, SheetRef, SheetsError};

/// Values are interpreted as if typed into the sheet.
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Body of a `values.get` response. Trailing empty rows and cells are
/// omitted by the API, and `values` is absent for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl SheetsClient {
    pub fn new(
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SheetsError::InvalidBaseUrl(base_url.to_string()))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
        })
    }

    /// `{base}/v4/spreadsheets/{id}` followed by `segments`.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetsError::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty().push("v4").push("spreadsheets");
            path.extend(segments);
        }
        Ok(url)
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        self.url(&[self.spreadsheet_id.as_str(), "values", range])
    }

    fn batch_update_url(&self) -> Result<Url> {
        self.url(&[format!("{}:batchUpdate", self.spreadsheet_id).as_str()])
    }

    /// Attach the credential, send, and turn non-success into an error.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(SheetsError::MissingCredential)?;

        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        Err(SheetsError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Read a range as rows of formatted cell strings.
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        tracing::debug!(range = %range, "Reading range");

        let response = self.send(self.client.get(self.values_url(range)?)).await?;
        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Read the first `width` columns of a sheet from row 1.
    pub async fn read_rows(&self, sheet: &SheetRef, width: usize) -> Result<Vec<Vec<String>>> {
        self.read_range(&sheet.columns(width)).await
    }

    /// Read one column of a sheet from row 1.
    pub async fn read_column(&self, sheet: &SheetRef, column: usize) -> Result<Vec<String>> {
        let rows = self.read_range(&sheet.column(column)).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    async fn put_values(&self, range: &str, rows: Vec<Vec<Cell>>) -> Result<()> {
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn write_row(&self, sheet: &SheetRef, row: RowIndex, values: Vec<Cell>) -> Result<()> {
        let range = sheet.row(row, values.len().max(1));
        self.put_values(&range, vec![values]).await
    }

    async fn batch_update(&self, request: Value) -> Result<()> {
        let body = json!({ "requests": [request] });
        self.send(self.client.post(self.batch_update_url()?).json(&body))
            .await?;
        Ok(())
    }

    /// Overwrite one cell.
    pub async fn update_cell(
        &self,
        sheet: &SheetRef,
        column: usize,
        position: RowPosition,
        value: Cell,
    ) -> Result<()> {
        let range = sheet.cell(column, position.index());
        tracing::debug!(range = %range, "Updating cell");
        self.put_values(&range, vec![vec![value]]).await
    }

    /// Overwrite a row starting at column A.
    pub async fn update_row(
        &self,
        sheet: &SheetRef,
        position: RowPosition,
        values: Vec<Cell>,
    ) -> Result<()> {
        tracing::debug!(sheet = %sheet.title, row = position.index(), "Updating row");
        self.write_row(sheet, position.index(), values).await
    }

    /// Insert a blank row at `position`, then fill it.
    ///
    /// The new row inherits formatting from the row above, except at the
    /// top of the sheet where there is none.
    pub async fn insert_row(
        &self,
        sheet: &SheetRef,
        position: RowPosition,
        values: Vec<Cell>,
    ) -> Result<()> {
        let start = position.zero_based();
        tracing::debug!(sheet = %sheet.title, row = position.index(), "Inserting row");

        self.batch_update(json!({
            "insertDimension": {
                "range": {
                    "sheetId": sheet.id,
                    "dimension": "ROWS",
                    "startIndex": start,
                    "endIndex": start + 1,
                },
                "inheritFromBefore": start > 0,
            }
        }))
        .await?;

        self.write_row(sheet, position.index(), values).await
    }

    /// Delete exactly one row. Rows below move up by one.
    pub async fn delete_row(&self, sheet: &SheetRef, position: RowPosition) -> Result<()> {
        let start = position.zero_based();
        tracing::debug!(sheet = %sheet.title, row = position.index(), "Deleting row");

        self.batch_update(json!({
            "deleteDimension": {
                "range": {
                    "sheetId": sheet.id,
                    "dimension": "ROWS",
                    "startIndex": start,
                    "endIndex": start + 1,
                }
            }
        }))
        .await
    }

    /// Append a row after the last non-empty row of a sheet.
    pub async fn append_row(&self, sheet: &SheetRef, values: Vec<Cell>) -> Result<()> {
        let range = sheet.columns(values.len().max(1));
        let target = format!("{}:append", range);
        let mut url = self.url(&[self.spreadsheet_id.as_str(), "values", target.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION)
            .append_pair("insertDataOption", "INSERT_ROWS");

        tracing::debug!(sheet = %sheet.title, "Appending row");
        let body = json!({ "majorDimension": "ROWS", "values": [values] });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

/// Formatted values arrive as strings; anything else is stringified.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
