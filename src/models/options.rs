use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column names in the company / position options table.
pub mod columns {
    pub const COMPANY: &str = "Công ty";
    pub const POSITION: &str = "Công việc";
    pub const POSITION_CODE: &str = "Mã công việc";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOption {
    pub position: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Full snapshot of lookup data served to the selection page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub companies: Vec<CompanyOption>,
    #[serde(rename = "jobsByCompany")]
    pub jobs_by_company: BTreeMap<String, Vec<PositionOption>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionVersion {
    pub version: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionVersionBumped {
    pub ok: bool,
    pub version: i64,
}
