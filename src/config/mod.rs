use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Lark custom app id used for the tenant token exchange
    pub lark_app_id: String,

    /// Lark custom app secret
    pub lark_app_secret: String,

    /// Bitable app token (the "base" holding both tables)
    pub lark_base_id: String,

    /// Table holding uploaded templates
    pub lark_template_table_id: String,

    /// Table holding company / position options
    pub lark_options_table_id: String,

    /// Pre-issued tenant token. When set, the credential exchange is skipped.
    #[serde(default)]
    pub lark_tenant_token: Option<String>,

    /// Open API root, overridable for tests and private deployments
    #[serde(default = "default_lark_api_base")]
    pub lark_api_base: String,

    /// Upper bound on pages fetched by a single paginated read
    #[serde(default = "default_lark_max_pages")]
    pub lark_max_pages: usize,

    /// R2 bucket name
    pub r2_bucket: String,

    /// R2 endpoint URL
    pub r2_endpoint: String,

    /// R2 access key ID (S3-compatible)
    pub r2_access_key: String,

    /// R2 secret access key (S3-compatible)
    pub r2_secret_key: String,

    /// Public URL prefix the bucket is served under
    pub r2_public_url: String,

    /// Automation webhook receiving end-user submissions
    pub submit_webhook_url: String,

    /// Automation webhook receiving slide duplication requests from the admin page
    pub slide_webhook_url: String,

    /// Redis connection string. Without it the option version lives in memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Request body limit for uploads, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_lark_api_base() -> String {
    "https://open.larksuite.com/open-apis".to_string()
}

fn default_lark_max_pages() -> usize {
    100
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

/// Settings for the `options_sync` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_options_api_base")]
    pub options_api_base: String,

    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

fn default_options_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_snapshot_path() -> String {
    "options_snapshot.json".to_string()
}

fn default_sync_interval_secs() -> u64 {
    30
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
