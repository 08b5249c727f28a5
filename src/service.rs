use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::delivery::DeliveryDispatcher;
use crate::error::{NudgeError, Result};
use crate::extractor::ReminderExtractor;
use crate::reminders::{Reminder, ReminderStore};
use crate::sanitize;
use crate::scheduler::{now_ts, ReminderScheduler};

/// The add-reminder pipeline: extract, sanitize, validate, persist, then
/// register the one-shot delivery job. Persist completes before schedule;
/// schedule completes before any possible fire. A failure at any stage
/// leaves no record and no job behind.
pub struct ReminderService {
    extractor: ReminderExtractor,
    store: Arc<ReminderStore>,
    scheduler: Arc<ReminderScheduler>,
    dispatcher: Arc<DeliveryDispatcher>,
}

impl ReminderService {
    pub fn new(
        extractor: ReminderExtractor,
        store: Arc<ReminderStore>,
        scheduler: Arc<ReminderScheduler>,
        dispatcher: Arc<DeliveryDispatcher>,
    ) -> Self {
        Self {
            extractor,
            store,
            scheduler,
            dispatcher,
        }
    }

    pub async fn add_reminder(&self, text: &str) -> Result<Reminder> {
        let now = Utc::now();
        let raw = self.extractor.extract(text, now.date_naive()).await?;
        let extracted = sanitize::parse_extraction(&raw)?;

        // Extracted datetimes are interpreted as UTC throughout.
        let remind_at = extracted.remind_at.and_utc().timestamp();
        if remind_at <= now.timestamp() {
            return Err(NudgeError::PastOrInvalidTime);
        }

        let reminder = self
            .store
            .insert(&extracted.task, remind_at, now_ts())
            .await?;
        self.schedule_job(&reminder);
        info!(
            reminder_id = reminder.id,
            remind_at = reminder.remind_at,
            "reminder stored and scheduled"
        );
        Ok(reminder)
    }

    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        self.store.list().await
    }

    /// Re-registers jobs for stored reminders whose time has not passed.
    /// Run once at process start; pending timers do not survive restarts on
    /// their own.
    pub async fn rehydrate(&self) -> Result<usize> {
        let now = now_ts();
        let mut registered = 0;
        for reminder in self.store.list().await? {
            if reminder.remind_at > now {
                self.schedule_job(&reminder);
                registered += 1;
            } else {
                warn!(
                    reminder_id = reminder.id,
                    remind_at = reminder.remind_at,
                    "reminder came due while the process was down; not re-registering"
                );
            }
        }
        Ok(registered)
    }

    fn schedule_job(&self, reminder: &Reminder) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let id = reminder.id;
        let task = reminder.task.clone();
        self.scheduler.schedule(id, reminder.remind_at, move || async move {
            dispatcher.dispatch(id, &task).await;
        });
    }
}
