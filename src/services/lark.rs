//! Lark Base (Bitable) record store client.
//!
//! Every operation exchanges the app credentials for a fresh tenant token
//! unless a static token is configured. Reads walk all pages of a table;
//! writes create one record at a time.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use strum::Display;

use crate::config::AppConfig;
use crate::models::record::Record;

const PAGE_SIZE: u32 = 500;

/// Logical tables used by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Templates,
    Options,
}

/// Tabular store holding templates and lookup options.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every record of a table, following continuation tokens.
    async fn list_records(&self, table: Table) -> Result<Vec<Record>, RecordStoreError>;

    /// Create a single record and return it as stored.
    async fn create_record(
        &self,
        table: Table,
        fields: Map<String, Value>,
    ) -> Result<Record, RecordStoreError>;
}

/// Connection settings for [`LarkClient`].
#[derive(Debug, Clone)]
pub struct LarkSettings {
    pub api_base: String,
    pub app_id: String,
    pub app_secret: String,
    pub base_id: String,
    pub template_table_id: String,
    pub options_table_id: String,
    pub tenant_token: Option<String>,
    pub max_pages: usize,
}

impl From<&AppConfig> for LarkSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_base: config.lark_api_base.clone(),
            app_id: config.lark_app_id.clone(),
            app_secret: config.lark_app_secret.clone(),
            base_id: config.lark_base_id.clone(),
            template_table_id: config.lark_template_table_id.clone(),
            options_table_id: config.lark_options_table_id.clone(),
            tenant_token: config.lark_tenant_token.clone(),
            max_pages: config.lark_max_pages,
        }
    }
}

pub struct LarkClient {
    http: Client,
    settings: LarkSettings,
}

#[derive(Deserialize)]
struct ListResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<ListData>,
}

#[derive(Deserialize)]
struct ListData {
    #[serde(default)]
    items: Option<Vec<Record>>,
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Deserialize)]
struct CreateResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<CreateData>,
}

#[derive(Deserialize)]
struct CreateData {
    record: Record,
}

impl LarkClient {
    pub fn new(settings: LarkSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn table_id(&self, table: Table) -> &str {
        match table {
            Table::Templates => &self.settings.template_table_id,
            Table::Options => &self.settings.options_table_id,
        }
    }

    fn records_url(&self, table: Table) -> String {
        format!(
            "{}/bitable/v1/apps/{}/tables/{}/records",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.base_id,
            self.table_id(table)
        )
    }

    /// Obtain a bearer token through the internal-app credential exchange.
    pub async fn tenant_token(&self) -> Result<String, RecordStoreError> {
        if let Some(token) = &self.settings.tenant_token {
            return Ok(token.clone());
        }

        let url = format!(
            "{}/auth/v3/tenant_access_token/internal",
            self.settings.api_base.trim_end_matches('/')
        );
        let payload: Value = self
            .http
            .post(&url)
            .json(&json!({
                "app_id": self.settings.app_id,
                "app_secret": self.settings.app_secret,
            }))
            .send()
            .await?
            .json()
            .await?;

        match payload.get("tenant_access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => {
                tracing::error!(response = %payload, "Tenant token exchange returned no token");
                Err(RecordStoreError::Auth { payload })
            }
        }
    }

    async fn fetch_page(
        &self,
        token: &str,
        table: Table,
        page_token: Option<&str>,
    ) -> Result<ListData, RecordStoreError> {
        let mut request = self
            .http
            .get(self.records_url(table))
            .bearer_auth(token)
            .query(&[("page_size", PAGE_SIZE.to_string())]);
        if let Some(page_token) = page_token {
            request = request.query(&[("page_token", page_token)]);
        }

        let payload: Value = request.send().await?.json().await?;
        let response: ListResponse =
            serde_json::from_value(payload.clone()).map_err(RecordStoreError::Decode)?;

        if response.code != 0 {
            return Err(RecordStoreError::Api {
                code: response.code,
                msg: response.msg,
                payload,
            });
        }

        Ok(response.data.unwrap_or(ListData {
            items: None,
            has_more: Some(false),
            page_token: None,
        }))
    }
}

#[async_trait]
impl RecordStore for LarkClient {
    async fn list_records(&self, table: Table) -> Result<Vec<Record>, RecordStoreError> {
        let start = Instant::now();
        let token = self.tenant_token().await?;

        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if pages >= self.settings.max_pages {
                tracing::error!(%table, pages, "Record listing exceeded page cap");
                return Err(RecordStoreError::PageLimit(self.settings.max_pages));
            }

            let page = self.fetch_page(&token, table, page_token.as_deref()).await?;
            pages += 1;
            metrics::counter!("record_store_pages_total", "table" => table.to_string())
                .increment(1);

            let items = page.items.unwrap_or_default();
            tracing::debug!(%table, page = pages, items = items.len(), "Fetched record page");
            records.extend(items);

            page_token = match (page.has_more, page.page_token) {
                (Some(false), _) => None,
                (_, Some(next)) if !next.is_empty() => Some(next),
                _ => None,
            };
            if page_token.is_none() {
                break;
            }
        }

        metrics::histogram!("record_store_list_seconds", "table" => table.to_string())
            .record(start.elapsed().as_secs_f64());
        tracing::info!(%table, pages, records = records.len(), "Listed records");
        Ok(records)
    }

    async fn create_record(
        &self,
        table: Table,
        fields: Map<String, Value>,
    ) -> Result<Record, RecordStoreError> {
        let token = self.tenant_token().await?;

        let payload: Value = self
            .http
            .post(self.records_url(table))
            .bearer_auth(&token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?
            .json()
            .await?;

        let response: CreateResponse =
            serde_json::from_value(payload.clone()).map_err(RecordStoreError::Decode)?;

        if response.code != 0 {
            tracing::error!(%table, code = response.code, msg = %response.msg, "Record write rejected");
            return Err(RecordStoreError::Api {
                code: response.code,
                msg: response.msg,
                payload,
            });
        }

        let record = response.data.map(|d| d.record).unwrap_or_default();
        tracing::info!(%table, record_id = %record.record_id, "Created record");
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("HTTP request to record store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record store returned no tenant access token")]
    Auth { payload: Value },

    #[error("Record store error {code}: {msg}")]
    Api { code: i64, msg: String, payload: Value },

    #[error("Unexpected record store response: {0}")]
    Decode(serde_json::Error),

    #[error("Record listing exceeded {0} pages")]
    PageLimit(usize),
}

impl RecordStoreError {
    /// Provider payload worth echoing to the caller, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            RecordStoreError::Auth { payload } | RecordStoreError::Api { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }
}
