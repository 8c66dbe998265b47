use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::options::{OptionVersion, OptionVersionBumped, OptionsSnapshot};
use crate::services::{catalog, lark::Table};

/// GET /api/lark/options — companies and their positions.
pub async fn get_options(
    State(state): State<AppState>,
) -> Result<Json<OptionsSnapshot>, AppError> {
    let records = state.records.list_records(Table::Options).await?;
    let options = catalog::build_options(&records);
    tracing::debug!(companies = options.companies.len(), "Built options snapshot");
    Ok(Json(options))
}

fn etag_for(version: i64) -> String {
    format!("\"{version}\"")
}

/// Weak comparison over an `If-None-Match` list; `*` matches any stamp.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// GET /api/option-version — current stamp, with ETag revalidation.
pub async fn get_option_version(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let version = state.versions.current().await?;
    let etag = etag_for(version);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|candidates| etag_matches(candidates, &etag));

    // The stamp is digits inside quotes, always a valid header value.
    let etag_value = HeaderValue::from_str(&etag).unwrap_or(HeaderValue::from_static("\"0\""));

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    Ok((
        [
            (header::ETAG, etag_value),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        Json(OptionVersion { version }),
    )
        .into_response())
}

/// POST /api/option-version — called by the automation when options change.
pub async fn bump_option_version(
    State(state): State<AppState>,
) -> Result<Json<OptionVersionBumped>, AppError> {
    let version = state.versions.bump().await?;
    tracing::info!(version, "Option version bumped");
    Ok(Json(OptionVersionBumped { ok: true, version }))
}
