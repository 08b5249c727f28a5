use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{NudgeError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Outbound mail settings. `to` is the deployment-configured recipient for
/// every reminder alert; reminders themselves carry no addressee.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    pub sqlite_path: Option<String>,
    pub extraction_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub openai: Option<OpenAiConfig>,
    pub email: Option<EmailConfig>,
    pub reminders: Option<ReminderConfig>,
}

impl Config {
    pub fn convention_defaults(db_path: &str) -> Self {
        Self {
            openai: Some(OpenAiConfig {
                api_key: None,
                model: Some("gpt-4.1-mini".to_string()),
                base_url: Some("https://api.openai.com/v1".to_string()),
            }),
            email: None,
            reminders: Some(ReminderConfig {
                sqlite_path: Some(db_path.to_string()),
                extraction_timeout_seconds: None,
            }),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| NudgeError::Config(format!("failed to read {path}: {e}")))?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|e| NudgeError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Fill the OpenAI key from the environment when the file leaves it out.
    pub fn resolve_env(mut self) -> Self {
        if let Some(openai) = &mut self.openai {
            if openai.api_key.is_none() {
                if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                    let trimmed = key.trim();
                    if !trimmed.is_empty() {
                        openai.api_key = Some(trimmed.to_string());
                    }
                }
            }
        }
        self
    }

    pub fn sqlite_path(&self, fallback: &str) -> String {
        self.reminders
            .as_ref()
            .and_then(|r| r.sqlite_path.as_deref())
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convention_defaults_point_at_openai() {
        let config = Config::convention_defaults("reminders.db");
        let openai = config.openai.expect("openai section");
        assert_eq!(openai.base_url.as_deref(), Some("https://api.openai.com/v1"));
        assert_eq!(config.reminders.unwrap().sqlite_path.as_deref(), Some("reminders.db"));
    }

    #[test]
    fn sqlite_path_prefers_configured_value() {
        let config = Config::convention_defaults("default.db");
        assert_eq!(config.sqlite_path("other.db"), "default.db");

        let empty = Config {
            openai: None,
            email: None,
            reminders: Some(ReminderConfig {
                sqlite_path: Some("  ".to_string()),
                extraction_timeout_seconds: None,
            }),
        };
        assert_eq!(empty.sqlite_path("other.db"), "other.db");
    }

    #[test]
    fn from_file_parses_email_section() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "openai": {"api_key": "key", "model": "gpt-4.1-mini", "base_url": "http://localhost:1"},
                "email": {
                    "smtp_host": "smtp.example.com",
                    "from": "nudge@example.com",
                    "to": "me@example.com"
                },
                "reminders": {"sqlite_path": "reminders.db"}
            })
            .to_string(),
        )
        .unwrap();

        let config = Config::from_file(&path.to_string_lossy()).expect("config");
        let email = config.email.expect("email section");
        assert_eq!(email.smtp_host, "smtp.example.com");
        assert_eq!(email.to, "me@example.com");
        assert_eq!(email.smtp_port, None);
    }
}
