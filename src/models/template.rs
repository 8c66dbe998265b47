use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::record::Record;

/// Column names in the templates table. This is the only place internal
/// field names are mapped onto provider columns.
pub mod columns {
    pub const TEMPLATE_CODE: &str = "template_code";
    pub const STYLE: &str = "style";
    pub const JOB_COUNT: &str = "job_count";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const IS_ACTIVE: &str = "is_active";
    pub const PRESENTATION_ID: &str = "presentation_id";
    pub const SLIDE_ID: &str = "slide_id";
    pub const MAX_COMPANY_CHARS: &str = "max_company_chars";
    pub const MAX_POSITION_CHARS: &str = "max_position_chars";
}

/// Derive the template code from its style and job count.
pub fn template_code(style: &str, job_count: u32) -> String {
    format!("{style}_{job_count}")
}

/// A template row as stored in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub code: String,
    pub style: String,
    pub job_count: u32,
    pub thumbnail_url: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_company_chars: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_chars: Option<u32>,
}

impl Template {
    /// Provider field map for a record write.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(columns::TEMPLATE_CODE.into(), json!(self.code));
        fields.insert(columns::STYLE.into(), json!(self.style));
        fields.insert(columns::JOB_COUNT.into(), json!(self.job_count));
        fields.insert(columns::THUMBNAIL.into(), json!(self.thumbnail_url));
        fields.insert(columns::IS_ACTIVE.into(), json!(self.is_active));

        let optional = [
            (columns::PRESENTATION_ID, self.presentation_id.as_ref().map(|v| json!(v))),
            (columns::SLIDE_ID, self.slide_id.as_ref().map(|v| json!(v))),
            (columns::MAX_COMPANY_CHARS, self.max_company_chars.map(|v| json!(v))),
            (columns::MAX_POSITION_CHARS, self.max_position_chars.map(|v| json!(v))),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                fields.insert(column.into(), value);
            }
        }
        fields
    }

    /// Rebuild a template from a provider record. Rows without a code or a
    /// usable job count are skipped.
    pub fn from_record(record: &Record) -> Option<Self> {
        let code = record.text(columns::TEMPLATE_CODE)?;
        let job_count = u32::try_from(record.integer(columns::JOB_COUNT)?).ok()?;

        Some(Self {
            code,
            style: record.text(columns::STYLE).unwrap_or_default(),
            job_count,
            thumbnail_url: record.link(columns::THUMBNAIL).unwrap_or_default(),
            is_active: record.flag(columns::IS_ACTIVE),
            presentation_id: record.text(columns::PRESENTATION_ID),
            slide_id: record.text(columns::SLIDE_ID),
            max_company_chars: record
                .integer(columns::MAX_COMPANY_CHARS)
                .and_then(|v| u32::try_from(v).ok()),
            max_position_chars: record
                .integer(columns::MAX_POSITION_CHARS)
                .and_then(|v| u32::try_from(v).ok()),
        })
    }
}

/// Public shape served to the selection page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub template_code: String,
    pub style: String,
    pub thumbnail: String,
}

impl From<Template> for TemplateSummary {
    fn from(t: Template) -> Self {
        Self {
            template_code: t.code,
            style: t.style,
            thumbnail: t.thumbnail_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub data: Vec<TemplateSummary>,
}

/// Response after uploading a template.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTemplateResponse {
    pub success: bool,
    pub template_code: String,
    pub thumbnail: String,
    /// Record as echoed back by the provider
    pub lark: Value,
}
