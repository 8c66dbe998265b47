use axum::extract::{Multipart, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::submission::Submission;
use crate::services::webhook::DeliveryOutcome;

pub const DELIVERY_HEADER: &str = "x-webhook-delivery";

/// POST /api/submit-request — validate and relay a generation request.
///
/// The body is relayed exactly as received. Delivery is best effort: after
/// validation the caller always gets a success answer, with the webhook's
/// own JSON when it returned one.
pub async fn submit_request(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let submission: Submission = serde_json::from_value(body.clone())
        .map_err(|e| AppError::Validation(format!("invalid submission: {e}")))?;
    submission.check().map_err(AppError::Validation)?;

    metrics::counter!("submissions_total").increment(1);
    tracing::info!(
        template_code = %submission.template_code,
        job_count = submission.job_count,
        "Relaying submission"
    );

    let outcome = state.submit_hook.notify(&body).await;
    let label = HeaderValue::from_static(outcome.label());
    if !outcome.is_delivered() {
        tracing::warn!(
            template_code = %submission.template_code,
            outcome = outcome.label(),
            "Submission accepted but not delivered"
        );
    }

    let reply = match outcome {
        DeliveryOutcome::Delivered { body: Some(reply), .. } => reply,
        _ => json!({ "success": true }),
    };

    Ok(([(DELIVERY_HEADER, label)], Json(reply)).into_response())
}

/// POST /api/admin/templates — ask the automation to duplicate a slide.
pub async fn request_slide_copy(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut presentation_id = None;
    let mut slide_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "presentation_id" => presentation_id = value,
            "slide_id" => slide_id = value,
            _ => {}
        }
    }

    let (Some(presentation_id), Some(slide_id)) = (presentation_id, slide_id) else {
        return Err(AppError::Validation(
            "presentation_id and slide_id are required".into(),
        ));
    };

    let outcome = state
        .slide_hook
        .notify(&json!({ "presentation_id": presentation_id, "slide_id": slide_id }))
        .await;

    Ok((
        [(DELIVERY_HEADER, HeaderValue::from_static(outcome.label()))],
        Json(json!({
            "success": true,
            "message": "Slide copy request sent",
        })),
    )
        .into_response())
}
