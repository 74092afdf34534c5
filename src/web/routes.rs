//! Frame routes

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tumbller_shared::Direction;

use crate::command::CaptureResult;
use crate::error::{AppError, Result};
use crate::payment::FrameAction;
use crate::session::{AcquireOutcome, Admission, Recorded};
use crate::snapshot::{annotate, OverlayError};
use crate::store::{StoreError, TransactionRecord};

use super::render::Panel;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(selection).post(selection))
        .route("/select/:device_id", post(select_device))
        .route("/callback/:device_id", post(payment_callback))
        .route("/control/:device_id/:direction", post(control))
        .route("/camera/:device_id", post(camera))
        .route("/transactions", get(list_transactions))
        .route("/status", get(status))
        .route("/healthz", get(health))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run blocking storage work off the async workers
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn ensure_device(state: &AppState, device_id: &str) -> Result<()> {
    if state.arbiter.registry().contains(device_id) {
        Ok(())
    } else {
        Err(AppError::InvalidDevice(device_id.to_string()))
    }
}

fn selection_page(state: &AppState) -> Html<String> {
    let ids = state.arbiter.registry().device_ids();
    Html(state.views.selection(&ids).render())
}

async fn selection(State(state): State<AppState>) -> Html<String> {
    selection_page(&state)
}

/// Acquisition decision: pay for a free rover or wait for a busy one
async fn select_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Bytes,
) -> Result<Html<String>> {
    match state.arbiter.admission(&device_id).await? {
        Admission::Wait { time_left } => {
            tracing::debug!(device_id = %device_id, time_left = %time_left, "Device busy");
            Ok(Html(state.views.waiting(&device_id, &time_left).render()))
        }
        Admission::Available => {
            let sender = FrameAction::parse(&body)
                .ok()
                .and_then(|action| action.fid())
                .unwrap_or_default();
            let request = state.payment_request(&device_id, sender);

            match state.payments.request_payment(&request).await {
                Ok(frame) => {
                    tracing::info!(device_id = %device_id, sender = %request.sender, "Payment frame issued");
                    Ok(Html(state.views.payment(&device_id, &frame).render()))
                }
                Err(e) => {
                    tracing::warn!(device_id = %device_id, error = %e, "Payment request failed");
                    Err(e.into())
                }
            }
        }
    }
}

/// Payment processor post-back: record the transaction and acquire in one step
async fn payment_callback(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Bytes,
) -> Result<Html<String>> {
    ensure_device(&state, &device_id)?;
    let failed = |reason: &str| Html(state.views.payment_failed(&device_id, reason).render());

    let confirmation = match FrameAction::parse(&body).and_then(|action| action.confirmation()) {
        Ok(confirmation) => confirmation,
        Err(e) => {
            tracing::warn!(device_id = %device_id, error = %e, "Malformed payment callback");
            return Ok(failed("Payment could not be confirmed"));
        }
    };
    let transaction_id = confirmation.transaction_id.clone();
    let user = confirmation.user.clone();

    let record = TransactionRecord::new(&transaction_id, &user, &device_id);
    let store = state.transactions.clone();
    let registry = state.arbiter.registry();
    let outcome = registry
        .try_acquire(&device_id, &transaction_id, &user, || async move {
            match tokio::task::spawn_blocking(move || store.insert(&record)).await {
                Ok(Ok(())) => Ok(Recorded::New),
                Ok(Err(StoreError::Duplicate(_))) => Ok(Recorded::Existing),
                Ok(Err(e)) => Err(AppError::Store(e)),
                Err(e) => Err(AppError::Internal(e.to_string())),
            }
        })
        .await?;

    match outcome {
        Err(e) => {
            tracing::error!(device_id = %device_id, transaction_id = %transaction_id, error = %e, "Failed to record transaction");
            Ok(failed("Payment could not be recorded"))
        }
        Ok(AcquireOutcome::Acquired) => {
            tracing::info!(
                device_id = %device_id,
                transaction_id = %transaction_id,
                user = %user,
                "Transaction recorded"
            );
            let time_left = registry.get_time_left(&device_id).await?;
            Ok(control_page(&state, &device_id, &time_left, None, Some("Session started"), Panel::Drive).await)
        }
        Ok(AcquireOutcome::AlreadyHeld) => {
            tracing::debug!(device_id = %device_id, transaction_id = %transaction_id, "Repeated callback");
            let time_left = registry.get_time_left(&device_id).await?;
            Ok(control_page(&state, &device_id, &time_left, None, None, Panel::Drive).await)
        }
        Ok(AcquireOutcome::Occupied { time_left }) => {
            tracing::warn!(
                device_id = %device_id,
                transaction_id = %transaction_id,
                user = %user,
                "Paid while device occupied"
            );
            Ok(Html(state.views.waiting(&device_id, &time_left).render()))
        }
        Ok(AcquireOutcome::Spent) => Ok(failed("This payment was already used")),
    }
}

async fn control_page(
    state: &AppState,
    device_id: &str,
    time_left: &str,
    previous: Option<Direction>,
    status: Option<&str>,
    panel: Panel,
) -> Html<String> {
    let image = state.snapshots.latest_url(device_id).await;
    Html(
        state
            .views
            .control(device_id, image.as_deref(), time_left, previous, status, panel)
            .render(),
    )
}

async fn control(
    State(state): State<AppState>,
    Path((device_id, direction)): Path<(String, String)>,
) -> Result<Html<String>> {
    ensure_device(&state, &device_id)?;
    let direction: Direction = direction
        .parse()
        .map_err(|e: tumbller_shared::InvalidDirection| AppError::InvalidDirection(e.0))?;

    if !state.arbiter.validate_session(&device_id).await {
        return Ok(selection_page(&state));
    }

    let outcome = state.relay.relay(&device_id, direction.as_str()).await?;
    let time_left = state.arbiter.registry().get_time_left(&device_id).await?;

    Ok(control_page(
        &state,
        &device_id,
        &time_left,
        Some(direction),
        Some(&outcome.message),
        Panel::after(direction),
    )
    .await)
}

async fn camera(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Html<String>> {
    ensure_device(&state, &device_id)?;
    if !state.arbiter.validate_session(&device_id).await {
        return Ok(selection_page(&state));
    }

    let image = match state.relay.capture(&device_id).await? {
        CaptureResult::Image(image) => image,
        CaptureResult::Failed(outcome) => {
            let time_left = state.arbiter.registry().get_time_left(&device_id).await?;
            return Ok(control_page(&state, &device_id, &time_left, None, Some(&outcome.message), Panel::Turn).await);
        }
    };

    let time_left = state.arbiter.registry().get_time_left(&device_id).await?;
    let label = time_left.clone();
    let annotated = blocking(move || annotate(&image, &label)).await?;

    let jpeg = match annotated {
        Ok(jpeg) => jpeg,
        Err(e) => {
            tracing::warn!(device_id = %device_id, error = %e, "Snapshot could not be annotated");
            return Ok(control_page(&state, &device_id, &time_left, None, Some("Unable to read camera image"), Panel::Turn).await);
        }
    };

    let url = state
        .snapshots
        .save(&device_id, &jpeg)
        .await
        .map_err(OverlayError::from)?;
    tracing::info!(device_id = %device_id, url = %url, "Snapshot updated");

    Ok(Html(
        state
            .views
            .control(&device_id, Some(&url), &time_left, None, Some("Snapshot updated"), Panel::Turn)
            .render(),
    ))
}

async fn list_transactions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let store = state.transactions.clone();
    let records = blocking(move || store.list_all()).await??;
    Ok(Json(records))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.arbiter.registry().snapshot().await)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
