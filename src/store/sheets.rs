//! Google Sheets backend over the values REST API.
//!
//! All operations re-fetch the grid so writes land on the row matching the
//! record's email key even when row order shifted since the last read.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{ConfigError, StoreError};
use crate::record::LeadRecord;
use crate::schema::{self, ColumnSchema};
use crate::store::RecordStore;

/// Sheets connection settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub api_token: SecretString,
    pub base_url: String,
}

impl SheetsConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let spreadsheet_id = std::env::var("SPREADSHEET_ID")
            .map_err(|_| ConfigError::MissingEnvVar("SPREADSHEET_ID".into()))?;
        let api_token = std::env::var("SHEETS_API_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("SHEETS_API_TOKEN".into()))?;
        let worksheet = std::env::var("WORKSHEET_NAME").unwrap_or_else(|_| "Leads".to_string());
        let base_url = std::env::var("SHEETS_BASE_URL")
            .unwrap_or_else(|_| "https://sheets.googleapis.com".to_string());

        Ok(Self {
            spreadsheet_id,
            worksheet,
            api_token: SecretString::from(api_token),
            base_url,
        })
    }
}

/// `values.get` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Record store backed by a Google Sheets worksheet.
pub struct SheetsStore {
    config: SheetsConfig,
    client: reqwest::Client,
}

impl SheetsStore {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn values_url(&self, range: &str, params: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{range}{params}",
            self.config.base_url, self.config.spreadsheet_id
        )
    }

    /// Fetch the whole grid, header row included.
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url(&self.config.worksheet, "");
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.config.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(range.values)
    }

    /// Write one cell. `sheet_row` is 1-based (row 1 is the header).
    async fn write_cell(
        &self,
        sheet_row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let range = format!("{}!{}{}", self.config.worksheet, col_letter(col), sheet_row);
        let url = self.values_url(&range, "?valueInputOption=RAW");
        let body = serde_json::json!({ "values": [[value]] });

        let resp = self
            .client
            .put(url)
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        let range = format!("{}:append", self.config.worksheet);
        let url = self.values_url(&range, "?valueInputOption=RAW");
        let body = serde_json::json!({ "values": [row] });

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn fetch_all(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let grid = self.fetch_grid().await?;
        let Some((headers, rows)) = grid.split_first() else {
            return Ok(Vec::new());
        };
        let schema = ColumnSchema::from_headers(headers)?;
        Ok(rows.iter().map(|row| schema.record_from_row(row)).collect())
    }

    async fn find_by_key(&self, email: &str) -> Result<Option<LeadRecord>, StoreError> {
        let grid = self.fetch_grid().await?;
        let Some((headers, rows)) = grid.split_first() else {
            return Ok(None);
        };
        let schema = ColumnSchema::from_headers(headers)?;
        Ok(rows
            .iter()
            .find(|row| schema.cell(row, schema::CONTACT_EMAIL).trim() == email)
            .map(|row| schema.record_from_row(row)))
    }

    async fn update_fields(
        &self,
        email: &str,
        fields: &[(&str, String)],
    ) -> Result<(), StoreError> {
        // Re-resolve the row by key at write time; never trust an earlier index.
        let grid = self.fetch_grid().await?;
        let Some((headers, rows)) = grid.split_first() else {
            return Err(StoreError::RecordNotFound {
                email: email.to_string(),
            });
        };
        let schema = ColumnSchema::from_headers(headers)?;
        let row_idx = rows
            .iter()
            .position(|row| schema.cell(row, schema::CONTACT_EMAIL).trim() == email)
            .ok_or_else(|| StoreError::RecordNotFound {
                email: email.to_string(),
            })?;

        // Data row 0 sits at sheet row 2, just below the header.
        let sheet_row = row_idx + 2;
        for (field, value) in fields {
            match schema.position(field) {
                Some(col) => self.write_cell(sheet_row, col, value).await?,
                None => {
                    tracing::debug!(field, "Sheet has no column for field; skipping write");
                }
            }
        }
        Ok(())
    }

    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        let grid = self.fetch_grid().await?;
        let Some((headers, _)) = grid.split_first() else {
            return Err(StoreError::InvalidResponse(
                "cannot append to a sheet with no header row".into(),
            ));
        };
        let schema = ColumnSchema::from_headers(headers)?;
        self.append_row(schema.project(&record.to_fields())).await
    }
}

/// Spreadsheet column letters for a zero-based column index.
fn col_letter(mut col: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters
}
