/// A structured output record: measurement name, tag set, typed field set
/// and an optional explicit timestamp. This is the unit handed to the
/// host's persistence path.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldScalar)>,
    timestamp_ns: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldScalar {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Record {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp_ns: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn float_field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.push((key.into(), FieldScalar::Float(value)));
        self
    }

    pub fn int_field(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.push((key.into(), FieldScalar::Int(value)));
        self
    }

    pub fn bool_field(mut self, key: impl Into<String>, value: bool) -> Self {
        self.fields.push((key.into(), FieldScalar::Bool(value)));
        self
    }

    pub fn string_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), FieldScalar::Str(value.into())));
        self
    }

    /// Explicit timestamp in nanoseconds since the epoch
    pub fn timestamp(mut self, ns: i64) -> Self {
        self.timestamp_ns = Some(ns);
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    pub fn fields(&self) -> &[(String, FieldScalar)] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldScalar> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn timestamp_ns(&self) -> Option<i64> {
        self.timestamp_ns
    }

    /// Render as a line-protocol string: integers suffixed `i`, strings
    /// quoted, booleans lowercase.
    pub fn to_line_protocol(&self) -> String {
        let mut line = self.measurement.clone();
        for (k, v) in &self.tags {
            line.push(',');
            line.push_str(k);
            line.push('=');
            line.push_str(v);
        }
        line.push(' ');
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| match v {
                FieldScalar::Float(x) => format!("{}={}", k, x),
                FieldScalar::Int(x) => format!("{}={}i", k, x),
                FieldScalar::Bool(x) => format!("{}={}", k, x),
                FieldScalar::Str(x) => format!("{}=\"{}\"", k, x),
            })
            .collect();
        line.push_str(&fields.join(","));
        if let Some(ts) = self.timestamp_ns {
            line.push(' ');
            line.push_str(&ts.to_string());
        }
        line
    }
}
