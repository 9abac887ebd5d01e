use crate::BoxError;
use crate::config::SheetConfig;
use crate::table::SheetTable;
use serde::{Deserialize, Serialize};

/// Wire shape of the worksheet service: a rectangular block of cell values,
/// header row first.
#[derive(Debug, Serialize, Deserialize)]
struct ValuesBody {
    values: Vec<Vec<String>>,
}

/// Client for the remote worksheet backend.
///
/// The service exposes full-table reads and writes against a named
/// worksheet; there is no partial-update call, so appending one record means
/// reading the whole table, concatenating, and writing the whole table back.
pub struct SheetClient {
    http: reqwest::Client,
    base_url: String,
    worksheet: String,
    token: Option<String>,
}

impl SheetClient {
    pub fn new(config: &SheetConfig) -> Self {
        SheetClient {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            worksheet: config.worksheet.clone(),
            token: config.token.clone(),
        }
    }

    fn values_url(&self) -> String {
        format!(
            "{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.worksheet)
        )
    }

    /// Read the full table from the worksheet.
    ///
    /// A failed read is treated as an empty sheet: the worksheet may simply
    /// not have been written yet, and the subsequent write creates it. The
    /// failure is still logged.
    pub async fn read_table(&self) -> SheetTable {
        match self.try_read().await {
            Ok(table) => table,
            Err(e) => {
                log::warn!(
                    "worksheet '{}' read failed, treating as empty: {}",
                    self.worksheet,
                    e
                );
                SheetTable::empty()
            }
        }
    }

    async fn try_read(&self) -> Result<SheetTable, BoxError> {
        let mut request = self.http.get(self.values_url());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body: ValuesBody = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(SheetTable::from_values(body.values))
    }

    /// Write the full table back to the worksheet, replacing its contents.
    pub async fn write_table(&self, table: &SheetTable) -> Result<(), BoxError> {
        let body = ValuesBody {
            values: table.to_values(),
        };

        let mut request = self.http.put(self.values_url()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worksheet_name_is_percent_encoded() {
        let client = SheetClient::new(&SheetConfig {
            base_url: "https://sheets.example/v1/abc/".to_string(),
            worksheet: "Plant 2 Data".to_string(),
            token: None,
        });
        assert_eq!(
            client.values_url(),
            "https://sheets.example/v1/abc/values/Plant%202%20Data"
        );
    }
}
