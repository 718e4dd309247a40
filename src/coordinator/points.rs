//! Points and write requests
//!
//! A point is identified for placement purposes by its series key
//! (measurement + sorted tags) and its timestamp; field values are payload.

use crate::common::{Error, Result};
use crate::coordinator::consistency::ConsistencyLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the field written by `WriteRequest::add_point`
pub const DEFAULT_FIELD: &str = "value";

/// A field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    fn approx_size(&self) -> usize {
        match self {
            FieldValue::String(s) => s.len(),
            _ => 8,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// A single time-series sample. Timestamps are nanoseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    measurement: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    time: i64,
}

impl Point {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        time: i64,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            fields,
            time,
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Timestamp in nanoseconds since the Unix epoch
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Series key: `measurement,tag1=v1,tag2=v2` with tags in sorted order.
    /// Commas, equals signs and spaces are backslash-escaped.
    pub fn series_key(&self) -> String {
        let mut key = String::with_capacity(self.measurement.len() + 16 * self.tags.len());
        escape_into(&mut key, &self.measurement, &[',', ' ']);
        for (k, v) in &self.tags {
            key.push(',');
            escape_into(&mut key, k, &[',', '=', ' ']);
            key.push('=');
            escape_into(&mut key, v, &[',', '=', ' ']);
        }
        key
    }

    /// Rough in-memory footprint, used for cache accounting
    pub fn approx_size(&self) -> usize {
        let tags: usize = self.tags.iter().map(|(k, v)| k.len() + v.len()).sum();
        let fields: usize = self
            .fields
            .iter()
            .map(|(k, v)| k.len() + v.approx_size())
            .sum();
        self.measurement.len() + tags + fields + std::mem::size_of::<i64>()
    }

    /// Reject points that cannot be stored: no measurement, no fields,
    /// or empty tag/field keys.
    pub fn validate(&self) -> Result<()> {
        if self.measurement.is_empty() {
            return Err(Error::InvalidRequest("point has an empty measurement".into()));
        }
        if self.fields.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "point in '{}' has no fields",
                self.measurement
            )));
        }
        if self.tags.keys().any(String::is_empty) || self.fields.keys().any(String::is_empty) {
            return Err(Error::InvalidRequest(format!(
                "point in '{}' has an empty tag or field key",
                self.measurement
            )));
        }
        Ok(())
    }
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// A batch of points for one database / retention policy, built by the
/// caller and handed to the coordinator by reference.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub database: String,
    /// Empty means the database's default policy
    pub retention_policy: String,
    pub consistency: ConsistencyLevel,
    pub points: Vec<Point>,
}

impl WriteRequest {
    pub fn new(
        database: impl Into<String>,
        retention_policy: impl Into<String>,
        consistency: ConsistencyLevel,
    ) -> Self {
        Self {
            database: database.into(),
            retention_policy: retention_policy.into(),
            consistency,
            points: Vec::new(),
        }
    }

    /// Append a single-field point (`value = <value>`)
    pub fn add_point(
        &mut self,
        measurement: &str,
        value: impl Into<FieldValue>,
        time: DateTime<Utc>,
        tags: &[(&str, &str)],
    ) {
        let tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut fields = BTreeMap::new();
        fields.insert(DEFAULT_FIELD.to_string(), value.into());

        // Outside the representable range (before 1677 or after 2262) clamp
        let nanos = time.timestamp_nanos_opt().unwrap_or(if time.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        });

        self.points.push(Point::new(measurement, tags, fields, nanos));
    }

    /// Append an already built point
    pub fn push_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
