use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row as returned by the Bitable records API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub record_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            record_id: String::new(),
            fields,
        }
    }

    /// Text value of a column. Bitable may return plain strings, numbers,
    /// `{ text, link }` objects, or arrays of text segments.
    pub fn text(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(value_text)
    }

    /// Integer value of a column, accepting numbers and numeric strings.
    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.fields.get(column)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Checkbox-style flag: `true`, `"true"`, or `1`.
    pub fn flag(&self, column: &str) -> bool {
        match self.fields.get(column) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    /// URL column value: either a bare string or a `{ link, text }` object.
    pub fn link(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::Object(obj) => obj
                .get("link")
                .and_then(Value::as_str)
                .map(str::to_string),
            other => value_text(other),
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str)?.trim().to_string(),
        // rich text comes back as a list of segments
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        serde_json::from_value(json!({ "record_id": "rec1", "fields": fields })).unwrap()
    }

    #[test]
    fn integer_accepts_numbers_and_strings() {
        let r = record(json!({ "a": 3, "b": "4", "c": 5.0, "d": "x" }));
        assert_eq!(r.integer("a"), Some(3));
        assert_eq!(r.integer("b"), Some(4));
        assert_eq!(r.integer("c"), Some(5));
        assert_eq!(r.integer("d"), None);
        assert_eq!(r.integer("missing"), None);
    }

    #[test]
    fn flag_variants() {
        let r = record(json!({ "a": true, "b": "TRUE", "c": 1, "d": false, "e": "no" }));
        assert!(r.flag("a"));
        assert!(r.flag("b"));
        assert!(r.flag("c"));
        assert!(!r.flag("d"));
        assert!(!r.flag("e"));
        assert!(!r.flag("missing"));
    }

    #[test]
    fn text_handles_rich_text_segments() {
        let r = record(json!({
            "name": [{ "type": "text", "text": "Happy" }, { "type": "text", "text": "Work" }],
            "blank": "   ",
        }));
        assert_eq!(r.text("name").as_deref(), Some("HappyWork"));
        assert_eq!(r.text("blank"), None);
    }

    #[test]
    fn link_reads_url_objects() {
        let r = record(json!({
            "a": { "link": "https://cdn.example.com/a.png", "text": "a" },
            "b": "https://cdn.example.com/b.png",
        }));
        assert_eq!(r.link("a").as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(r.link("b").as_deref(), Some("https://cdn.example.com/b.png"));
    }
}
