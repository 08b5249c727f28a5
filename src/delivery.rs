use std::sync::Arc;

use tracing::{error, info};

use crate::error::Result;
use crate::interfaces::mailer::Mailer;
use crate::notify::NotificationHub;

pub const EMAIL_SUBJECT: &str = "Reminder alert";

/// Per-action outcomes of one fired reminder. The two deliveries are
/// independent; neither result is ever folded into the other.
pub struct DeliveryReport {
    /// How many live listeners accepted the broadcast.
    pub notification: Result<usize>,
    /// Ok(true) if an email went out, Ok(false) if no mailer is configured.
    pub email: Result<bool>,
}

/// Runs the side effects of a fired reminder: a push notification to every
/// connected listener and an email summary. Failures are caught and logged
/// here; nothing propagates back into the scheduler's task.
pub struct DeliveryDispatcher {
    hub: Arc<NotificationHub>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl DeliveryDispatcher {
    pub fn new(hub: Arc<NotificationHub>, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { hub, mailer }
    }

    pub async fn dispatch(&self, reminder_id: i32, task: &str) -> DeliveryReport {
        let message = format!("Reminder: {task}");

        let delivered = self.hub.broadcast(&message);
        info!(reminder_id, delivered, "reminder notification broadcast");
        let notification = Ok(delivered);

        let email = match &self.mailer {
            Some(mailer) => mailer.send(EMAIL_SUBJECT, &message).await.map(|_| true),
            None => Ok(false),
        };
        match &email {
            Ok(true) => info!(reminder_id, "reminder email sent"),
            Ok(false) => {}
            Err(err) => error!(reminder_id, "reminder email delivery failed: {err}"),
        }

        DeliveryReport {
            notification,
            email,
        }
    }
}
