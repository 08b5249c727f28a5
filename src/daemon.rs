use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::delivery::DeliveryDispatcher;
use crate::email::SmtpMailer;
use crate::error::{NudgeError, Result};
use crate::extractor::ReminderExtractor;
use crate::interfaces::mailer::Mailer;
use crate::notify::NotificationHub;
use crate::providers::OpenAiProvider;
use crate::reminders::{Reminder, ReminderStore};
use crate::scheduler::ReminderScheduler;
use crate::service::ReminderService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReminderService>,
    pub hub: Arc<NotificationHub>,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct AddReminderRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct RemindersResponse {
    reminders: Vec<Reminder>,
}

fn authorize(headers: &HeaderMap, token: &str) -> std::result::Result<(), Response> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized".to_string(),
            }),
        )
            .into_response()
    };

    // an empty configured token fails closed
    if token.is_empty() {
        return Err(unauthorized());
    }

    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let api_key = headers.get("x-api-key").and_then(|value| value.to_str().ok());

    if bearer == Some(token) || api_key == Some(token) {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn add_reminder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddReminderRequest>,
) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err;
    }

    match state.service.add_reminder(&payload.text).await {
        Ok(reminder) => (StatusCode::OK, Json(reminder)).into_response(),
        Err(err) => {
            let status = if err.is_rejection() {
                tracing::warn!("add_reminder rejected: {err}");
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!("add_reminder failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn list_reminders(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err;
    }

    match state.service.list_reminders().await {
        Ok(reminders) => (StatusCode::OK, Json(RemindersResponse { reminders })).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Long-lived push channel. Each connection registers one hub listener and
/// streams every fired reminder as an SSE `data:` line. Disconnection is
/// detected by the hub when its next send fails.
async fn reminder_stream(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(err) = authorize(&headers, &state.token) {
        return err;
    }

    let (listener_id, mut rx) = state.hub.register();
    tracing::debug!(listener_id, "notification listener connected");

    let body = Body::from_stream(async_stream::stream! {
        while let Some(message) = rx.recv().await {
            let line = format!("data: {}\n\n", message);
            yield Ok::<Bytes, std::convert::Infallible>(Bytes::from(line));
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .body(body)
        .unwrap()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reminders", post(add_reminder).get(list_reminders))
        .route("/reminders/stream", get(reminder_stream))
        .with_state(state)
}

pub async fn run(host: &str, port: u16, config: Config, token: &str) -> Result<()> {
    run_with_shutdown(host, port, config, token, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(
    host: &str,
    port: u16,
    config: Config,
    token: &str,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let db_path = config.sqlite_path("nudge.db");
    let store = Arc::new(ReminderStore::new(&db_path).await?);

    let hub = Arc::new(NotificationHub::new());
    let mailer: Option<Arc<dyn Mailer>> = match &config.email {
        Some(email) => Some(Arc::new(SmtpMailer::from_config(email)?)),
        None => {
            tracing::warn!("no email section configured; reminder emails are disabled");
            None
        }
    };
    let dispatcher = Arc::new(DeliveryDispatcher::new(hub.clone(), mailer));
    let scheduler = Arc::new(ReminderScheduler::new());

    let openai = config
        .openai
        .clone()
        .ok_or_else(|| NudgeError::Config("missing openai section".to_string()))?;
    let api_key = openai
        .api_key
        .ok_or_else(|| NudgeError::Config("missing OpenAI api key".to_string()))?;
    let provider = Arc::new(OpenAiProvider::new(api_key, openai.model, openai.base_url));
    let timeout = config
        .reminders
        .as_ref()
        .and_then(|r| r.extraction_timeout_seconds)
        .map(Duration::from_secs);
    let extractor = ReminderExtractor::new(provider, timeout);

    let service = Arc::new(ReminderService::new(
        extractor,
        store,
        scheduler.clone(),
        dispatcher,
    ));
    let registered = service.rehydrate().await?;
    tracing::info!(registered, "re-registered jobs for stored future reminders");

    let state = AppState {
        service,
        hub,
        token: token.to_string(),
    };
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NudgeError::Runtime(e.to_string()))?;
    tracing::info!(%addr, "nudged listening");

    let shutdown = async move {
        shutdown.await;
        scheduler.stop().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| NudgeError::Runtime(e.to_string()))?;

    Ok(())
}
