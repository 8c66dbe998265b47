//! Shaping record store rows into what the selection page consumes.

use std::collections::{BTreeMap, HashSet};

use crate::models::options::{columns, CompanyOption, OptionsSnapshot, PositionOption};
use crate::models::record::Record;
use crate::models::template::{Template, TemplateSummary};

/// Active templates whose job count equals `job_count`.
pub fn active_templates(records: &[Record], job_count: u32) -> Vec<TemplateSummary> {
    records
        .iter()
        .filter_map(Template::from_record)
        .filter(|t| t.is_active && t.job_count == job_count)
        .map(TemplateSummary::from)
        .collect()
}

/// Companies in first-seen order and their positions, each de-duplicated.
pub fn build_options(records: &[Record]) -> OptionsSnapshot {
    let mut companies = Vec::new();
    let mut seen_companies = HashSet::new();
    let mut jobs_by_company: BTreeMap<String, Vec<PositionOption>> = BTreeMap::new();

    for record in records {
        let Some(company) = record.text(columns::COMPANY) else {
            continue;
        };

        if seen_companies.insert(company.clone()) {
            companies.push(CompanyOption {
                id: company.clone(),
                name: company.clone(),
            });
        }

        let positions = jobs_by_company.entry(company).or_default();
        if let Some(position) = record.text(columns::POSITION) {
            if !positions.iter().any(|p| p.position == position) {
                positions.push(PositionOption {
                    position,
                    code: record.text(columns::POSITION_CODE),
                });
            }
        }
    }

    OptionsSnapshot {
        companies,
        jobs_by_company,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(fields: Value) -> Record {
        serde_json::from_value(json!({ "record_id": "r", "fields": fields })).unwrap()
    }

    #[test]
    fn only_active_templates_with_matching_count() {
        let records = vec![
            record(json!({ "template_code": "noel_2", "style": "noel", "job_count": 2, "thumbnail": "a", "is_active": true })),
            record(json!({ "template_code": "sun_2", "style": "sun", "job_count": "2", "thumbnail": "b", "is_active": false })),
            record(json!({ "template_code": "noel_3", "style": "noel", "job_count": 3, "thumbnail": "c", "is_active": true })),
            record(json!({ "template_code": "tet_2", "style": "tet", "job_count": "2", "thumbnail": { "link": "d" }, "is_active": true })),
            record(json!({ "style": "orphan", "job_count": 2, "is_active": true })),
        ];

        let found = active_templates(&records, 2);
        let codes: Vec<_> = found.iter().map(|t| t.template_code.as_str()).collect();
        assert_eq!(codes, ["noel_2", "tet_2"]);
        assert_eq!(found[1].thumbnail, "d");
    }

    #[test]
    fn options_group_positions_by_company() {
        let records = vec![
            record(json!({ "Công ty": "Highlands", "Công việc": "Barista", "Mã công việc": "HL01" })),
            record(json!({ "Công ty": "Phúc Long", "Công việc": "Thu ngân" })),
            record(json!({ "Công ty": "Highlands", "Công việc": "Barista", "Mã công việc": "HL09" })),
            record(json!({ "Công ty": "Highlands", "Công việc": "Quản lý" })),
            record(json!({ "Công việc": "No company" })),
        ];

        let options = build_options(&records);
        let names: Vec<_> = options.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Highlands", "Phúc Long"]);
        assert_eq!(options.companies[0].id, "Highlands");

        let highlands = &options.jobs_by_company["Highlands"];
        assert_eq!(highlands.len(), 2);
        assert_eq!(highlands[0].code.as_deref(), Some("HL01"));
        assert_eq!(highlands[1].position, "Quản lý");
        assert_eq!(options.jobs_by_company["Phúc Long"][0].code, None);
    }

    #[test]
    fn empty_records_give_empty_options() {
        assert_eq!(build_options(&[]), OptionsSnapshot::default());
    }
}
