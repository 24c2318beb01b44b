pub mod alerter;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod record;
pub mod stats;
pub mod window;

/// Common types used across modules
pub mod types {
    use serde_json::Value;
    use smallvec::SmallVec;
    use std::collections::BTreeMap;

    /// One table's worth of rows delivered by a WAL flush
    #[derive(Debug, Clone)]
    pub struct TableBatch {
        pub table_name: String,
        pub rows: Vec<Row>,
    }

    /// A normalized row: timestamp + tag set + field set.
    ///
    /// All incoming row shapes are converted to this representation at the
    /// boundary; core logic never inspects the wire shape.
    #[derive(Debug, Clone, Default)]
    pub struct Row {
        pub time: Option<FieldValue>,
        pub tags: SmallVec<[Tag; 4]>,
        pub fields: BTreeMap<String, FieldValue>,
    }

    /// A tag key-value pair
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Tag {
        pub key: String,
        pub value: String,
    }

    /// A line-protocol field scalar
    #[derive(Debug, Clone, PartialEq)]
    pub enum FieldValue {
        Float(f64),
        Int(i64),
        UInt(u64),
        Bool(bool),
        Str(String),
    }

    impl FieldValue {
        /// Numeric value for aggregation. Strings are accepted when they
        /// parse as floats; booleans never count as numeric.
        pub fn coerce_f64(&self) -> Option<f64> {
            match self {
                FieldValue::Float(v) => Some(*v),
                FieldValue::Int(v) => Some(*v as f64),
                FieldValue::UInt(v) => Some(*v as f64),
                FieldValue::Str(s) => s.trim().parse::<f64>().ok(),
                FieldValue::Bool(_) => None,
            }
        }

        /// Numeric value for anomaly monitoring: actual numbers only,
        /// no string coercion.
        pub fn strict_f64(&self) -> Option<f64> {
            match self {
                FieldValue::Float(v) => Some(*v),
                FieldValue::Int(v) => Some(*v as f64),
                FieldValue::UInt(v) => Some(*v as f64),
                _ => None,
            }
        }

        fn from_json(value: &Value) -> Option<FieldValue> {
            match value {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Some(FieldValue::Int(i))
                    } else if let Some(u) = n.as_u64() {
                        Some(FieldValue::UInt(u))
                    } else {
                        n.as_f64().map(FieldValue::Float)
                    }
                }
                Value::Bool(b) => Some(FieldValue::Bool(*b)),
                Value::String(s) => Some(FieldValue::Str(s.clone())),
                _ => None,
            }
        }
    }

    impl std::fmt::Display for FieldValue {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                FieldValue::Float(v) => write!(f, "{}", v),
                FieldValue::Int(v) => write!(f, "{}", v),
                FieldValue::UInt(v) => write!(f, "{}", v),
                FieldValue::Bool(v) => write!(f, "{}", v),
                FieldValue::Str(s) => write!(f, "{}", s),
            }
        }
    }

    impl Row {
        /// Normalize a wire row. Two shapes are accepted: a nested object
        /// with `fields` (and optionally `tags`) sub-maps, or a flat map
        /// where `time` is the timestamp and every other key is a field.
        /// Nulls and non-scalar values are dropped.
        pub fn from_json(value: &Value) -> Row {
            let mut row = Row::default();
            let Some(map) = value.as_object() else {
                return row;
            };

            if let Some(fields) = map.get("fields").and_then(Value::as_object) {
                row.time = map.get("time").and_then(FieldValue::from_json);
                for (k, v) in fields {
                    if let Some(fv) = FieldValue::from_json(v) {
                        row.fields.insert(k.clone(), fv);
                    }
                }
                if let Some(tags) = map.get("tags").and_then(Value::as_object) {
                    for (k, v) in tags {
                        if let Some(s) = v.as_str() {
                            row.tags.push(Tag { key: k.clone(), value: s.to_string() });
                        }
                    }
                }
            } else {
                for (k, v) in map {
                    if k == "time" {
                        row.time = FieldValue::from_json(v);
                        continue;
                    }
                    if let Some(fv) = FieldValue::from_json(v) {
                        row.fields.insert(k.clone(), fv);
                    }
                }
            }

            row
        }
    }

    impl TableBatch {
        pub fn new(table_name: impl Into<String>, rows: Vec<Row>) -> Self {
            Self { table_name: table_name.into(), rows }
        }

        /// Normalize a wire batch: `{"table_name": ..., "rows": [...]}`
        pub fn from_json(value: &Value) -> Option<TableBatch> {
            let map = value.as_object()?;
            let table_name = map.get("table_name")?.as_str()?.to_string();
            let rows = map
                .get("rows")
                .and_then(Value::as_array)
                .map(|rows| rows.iter().map(Row::from_json).collect())
                .unwrap_or_default();
            Some(TableBatch { table_name, rows })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn flat_row_normalizes_time_and_fields() {
            let row = Row::from_json(&json!({
                "time": 1700000000i64,
                "usage": 42.5,
                "host": "db-1"
            }));
            assert_eq!(row.time, Some(FieldValue::Int(1700000000)));
            assert_eq!(row.fields.get("usage"), Some(&FieldValue::Float(42.5)));
            assert_eq!(row.fields.get("host"), Some(&FieldValue::Str("db-1".into())));
            assert!(row.fields.get("time").is_none());
        }

        #[test]
        fn nested_row_splits_tags_from_fields() {
            let row = Row::from_json(&json!({
                "time": "2025-03-31T12:00:00Z",
                "tags": {"region": "eu-1"},
                "fields": {"usage": 10, "ok": true}
            }));
            assert_eq!(row.tags.len(), 1);
            assert_eq!(row.tags[0].key, "region");
            assert_eq!(row.fields.get("usage"), Some(&FieldValue::Int(10)));
            assert_eq!(row.fields.get("ok"), Some(&FieldValue::Bool(true)));
        }

        #[test]
        fn coercion_accepts_numeric_strings_only() {
            assert_eq!(FieldValue::Str("3.5".into()).coerce_f64(), Some(3.5));
            assert_eq!(FieldValue::Str("abc".into()).coerce_f64(), None);
            assert_eq!(FieldValue::Bool(true).coerce_f64(), None);
            assert_eq!(FieldValue::Str("3.5".into()).strict_f64(), None);
            assert_eq!(FieldValue::UInt(7).strict_f64(), Some(7.0));
        }
    }
}
