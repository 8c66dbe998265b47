use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::template::{
    template_code, CreateTemplateResponse, Template, TemplateListResponse,
};
use crate::services::{catalog, lark::Table, storage::template_key};

/// Raw multipart fields of a template upload.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    style: Option<String>,
    job_count: Option<String>,
    presentation_id: Option<String>,
    slide_id: Option<String>,
    max_company_chars: Option<String>,
    max_position_chars: Option<String>,
    is_active: Option<String>,
}

/// A validated upload, ready for the storage and record writes.
#[derive(Debug)]
struct ValidatedUpload {
    image: Vec<u8>,
    content_type: &'static str,
    template: Template,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let bad_part = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("malformed multipart body: {e}"))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let data = field.bytes().await.map_err(bad_part)?;
            form.file = Some(data.to_vec());
            continue;
        }

        let slot = match name.as_str() {
            "style" => &mut form.style,
            "job_count" => &mut form.job_count,
            "presentation_id" => &mut form.presentation_id,
            "slide_id" => &mut form.slide_id,
            "max_company_chars" => &mut form.max_company_chars,
            "max_position_chars" => &mut form.max_position_chars,
            "is_active" => &mut form.is_active,
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload field");
                continue;
            }
        };
        let text = field.text().await.map_err(bad_part)?;
        let text = text.trim();
        if !text.is_empty() {
            *slot = Some(text.to_string());
        }
    }

    Ok(form)
}

fn parse_limit(name: &str, value: Option<String>) -> Result<Option<u32>, AppError> {
    value
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| AppError::Validation(format!("{name} must be a non-negative integer")))
        })
        .transpose()
}

fn validate_upload(form: UploadForm) -> Result<ValidatedUpload, AppError> {
    let image = form
        .file
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::Validation("file is required".into()))?;
    let style = form
        .style
        .ok_or_else(|| AppError::Validation("style is required".into()))?;
    let job_count = form
        .job_count
        .ok_or_else(|| AppError::Validation("job_count is required".into()))?
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| AppError::Validation("job_count must be a positive integer".into()))?;

    let format = image::guess_format(&image)
        .map_err(|_| AppError::UnsupportedMedia("file is not a recognised image".into()))?;

    let is_active = match form.is_active.as_deref() {
        None => true,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "off" | "no"),
    };

    Ok(ValidatedUpload {
        image,
        content_type: format.to_mime_type(),
        template: Template {
            code: template_code(&style, job_count),
            style,
            job_count,
            thumbnail_url: String::new(),
            is_active,
            presentation_id: form.presentation_id,
            slide_id: form.slide_id,
            max_company_chars: parse_limit("max_company_chars", form.max_company_chars)?,
            max_position_chars: parse_limit("max_position_chars", form.max_position_chars)?,
        },
    })
}

/// POST /api/lark/create-template — upload a template image and register it.
pub async fn create_template(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CreateTemplateResponse>, AppError> {
    let upload = validate_upload(read_form(multipart).await?)?;
    let mut template = upload.template;

    let key = template_key(&template.code, state.key_clock.next_stamp());
    template.thumbnail_url = state
        .blobs
        .put(&key, &upload.image, upload.content_type)
        .await?;

    // No rollback: a failed record write leaves the blob in place.
    let record = match state
        .records
        .create_record(Table::Templates, template.to_fields())
        .await
    {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(key = %key, code = %template.code, "Record write failed after upload; blob orphaned");
            return Err(e.into());
        }
    };

    metrics::counter!("template_uploads_total").increment(1);
    tracing::info!(code = %template.code, record_id = %record.record_id, "Template created");

    Ok(Json(CreateTemplateResponse {
        success: true,
        template_code: template.code,
        thumbnail: template.thumbnail_url,
        lark: serde_json::to_value(&record).unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub job_count: Option<String>,
}

/// GET /api/templates?job_count=N — active templates for a job count.
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let Some(raw) = query.job_count.filter(|v| !v.trim().is_empty()) else {
        return Ok(Json(TemplateListResponse { data: Vec::new() }));
    };
    let job_count = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| AppError::Validation("job_count must be an integer".into()))?;

    let records = state.records.list_records(Table::Templates).await?;
    let data = catalog::active_templates(&records, job_count);
    tracing::debug!(job_count, found = data.len(), "Listed templates");

    Ok(Json(TemplateListResponse { data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn form() -> UploadForm {
        UploadForm {
            file: Some(PNG.to_vec()),
            style: Some("noel".into()),
            job_count: Some("3".into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_derives_code_and_defaults_active() {
        let upload = validate_upload(form()).unwrap();
        assert_eq!(upload.template.code, "noel_3");
        assert!(upload.template.is_active);
        assert_eq!(upload.content_type, "image/png");
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        for broken in [
            UploadForm { file: None, ..form() },
            UploadForm { style: None, ..form() },
            UploadForm { job_count: Some("three".into()), ..form() },
            UploadForm { job_count: Some("0".into()), ..form() },
        ] {
            assert!(matches!(validate_upload(broken), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn non_image_is_unsupported() {
        let broken = UploadForm { file: Some(b"hello".to_vec()), ..form() };
        assert!(matches!(validate_upload(broken), Err(AppError::UnsupportedMedia(_))));
    }

    #[test]
    fn limits_and_flags_are_parsed() {
        let upload = validate_upload(UploadForm {
            max_company_chars: Some("30".into()),
            is_active: Some("false".into()),
            ..form()
        })
        .unwrap();
        assert_eq!(upload.template.max_company_chars, Some(30));
        assert!(!upload.template.is_active);

        let broken = UploadForm { max_position_chars: Some("-1".into()), ..form() };
        assert!(validate_upload(broken).is_err());
    }
}
