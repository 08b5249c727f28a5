use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{NudgeError, Result};
use crate::interfaces::providers::LlmProvider;

pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns free-text reminder requests into a candidate structured payload by
/// prompting the configured provider. The output is untrusted text; callers
/// must run it through `sanitize::parse_extraction` before using it.
pub struct ReminderExtractor {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl ReminderExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Option<Duration>) -> Self {
        Self {
            provider,
            timeout: timeout.unwrap_or(DEFAULT_EXTRACTION_TIMEOUT),
        }
    }

    fn prompt(text: &str, current_date: NaiveDate) -> String {
        format!(
            "Extract the reminder from the text. Return JSON strictly like:\n\
             {{\n  \"task\": \"...\",\n  \"datetime\": \"YYYY-MM-DD HH:MM\"\n}}\n\n\
             Important: If no year is specified, assume the current year. \
             If the date would be in the past, use the next occurrence of that date.\n\n\
             Current date: {current_date}\n\
             User input: {text}\n"
        )
    }

    pub async fn extract(&self, text: &str, current_date: NaiveDate) -> Result<String> {
        let prompt = Self::prompt(text, current_date);
        tokio::time::timeout(self.timeout, self.provider.generate_text(&prompt, ""))
            .await
            .map_err(|_| {
                NudgeError::Http(format!(
                    "reminder extraction timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }
}
