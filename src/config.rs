use crate::BoxError;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Constants
pub const CONFIG_FILE: &str = "config/app.json";
pub const CONFIG_ENV: &str = "NNI_CONFIG";

/// Application configuration, read once at startup.
///
/// Secrets (worksheet URL, messaging credentials, git remote) are supplied
/// externally through this file; they are checked for presence only.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the form application listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Address the webhook listener listens on
    #[serde(default = "default_webhook_addr")]
    pub webhook_addr: String,

    /// Path to the exported model parameter file
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Path to the subscriber id list
    #[serde(default = "default_subscribers_path")]
    pub subscribers_path: String,

    /// Remote worksheet sink, if configured
    #[serde(default)]
    pub sheet: Option<SheetConfig>,

    /// Local CSV sink, if configured
    #[serde(default)]
    pub csv: Option<CsvConfig>,

    /// Messaging platform credentials, if configured
    #[serde(default)]
    pub messaging: Option<MessagingConfig>,
}

/// Remote worksheet backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    /// Base URL of the worksheet service
    pub base_url: String,

    /// Worksheet name within the spreadsheet
    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// Optional bearer credential for the worksheet service
    #[serde(default)]
    pub token: Option<String>,
}

/// Local CSV backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvConfig {
    /// Path of the CSV file
    pub path: String,

    /// Git remote URL (credential embedded) to push the file to, if any
    #[serde(default)]
    pub git_remote: Option<String>,

    /// Branch to push to
    #[serde(default = "default_git_branch")]
    pub git_branch: String,
}

/// Messaging platform settings (LINE-style push API).
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Channel secret used to verify webhook signatures
    pub channel_secret: String,

    /// Channel access token used as the bearer credential on push/reply
    pub channel_token: String,

    /// API base URL; overridable so tests can point at a local server
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_webhook_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_model_path() -> String {
    "model/params.json".to_string()
}

fn default_subscribers_path() -> String {
    "data/subscribers.txt".to_string()
}

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

fn default_git_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.line.me".to_string()
}

impl AppConfig {
    /// Load the configuration from the path in `NNI_CONFIG`, falling back to
    /// `config/app.json`.
    pub fn load() -> Result<Self, BoxError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_FILE.to_string());
        Self::from_file(&path)
    }

    /// Load and validate the configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BoxError> {
        let file = File::open(path.as_ref()).map_err(|e| {
            format!(
                "cannot open config file {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        let reader = BufReader::new(file);
        let config: AppConfig = serde_json::from_reader(reader)?;
        config.check()?;
        Ok(config)
    }

    /// Presence checks on the configured sections. No secret is validated
    /// beyond being non-empty.
    pub fn check(&self) -> Result<(), BoxError> {
        if self.sheet.is_none() && self.csv.is_none() {
            return Err("no persistence backend configured: set \"sheet\", \"csv\", or both".into());
        }
        if let Some(sheet) = &self.sheet {
            if sheet.base_url.trim().is_empty() {
                return Err("sheet.base_url must not be empty".into());
            }
            if sheet.worksheet.trim().is_empty() {
                return Err("sheet.worksheet must not be empty".into());
            }
        }
        if let Some(csv) = &self.csv {
            if csv.path.trim().is_empty() {
                return Err("csv.path must not be empty".into());
            }
        }
        if let Some(messaging) = &self.messaging {
            if messaging.channel_secret.trim().is_empty() {
                return Err("messaging.channel_secret must not be empty".into());
            }
            if messaging.channel_token.trim().is_empty() {
                return Err("messaging.channel_token must not be empty".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_csv_config_passes_checks() {
        let config = parse(r#"{"csv": {"path": "data/predictions.csv"}}"#);
        assert!(config.check().is_ok());
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.csv.unwrap().git_branch, "main");
    }

    #[test]
    fn sheet_defaults_to_sheet1() {
        let config = parse(r#"{"sheet": {"base_url": "https://sheets.example/v1/abc"}}"#);
        assert!(config.check().is_ok());
        assert_eq!(config.sheet.unwrap().worksheet, "Sheet1");
    }

    #[test]
    fn missing_backends_rejected() {
        let config = parse("{}");
        assert!(config.check().is_err());
    }

    #[test]
    fn empty_messaging_secret_rejected() {
        let config = parse(
            r#"{"csv": {"path": "p.csv"},
                "messaging": {"channel_secret": "", "channel_token": "t"}}"#,
        );
        assert!(config.check().is_err());
    }
}
