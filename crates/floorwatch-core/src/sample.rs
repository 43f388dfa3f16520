//! Telemetry samples.
//!
//! A [`Sample`] is one timestamped reading of a device. Its attributes are
//! sparse: a sample only carries the metrics the device reported at that
//! instant, and a reported value may be a JSON string, a JSON number, or
//! `null`. Accessors return `Option` so an absent or unparseable value
//! contributes nothing instead of silently becoming zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One telemetry reading of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Sample {
    pub fn new(device_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the attribute key was reported at all, even as `null`.
    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Numeric value of an attribute, accepting numbers and numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        let v = match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Textual value of an attribute. Integral numbers render without a
    /// fraction so `1` and `"1"` compare equal.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            }),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Sort samples by timestamp, keeping insertion order for equal instants.
pub fn sort_chronologically(samples: &mut [Sample]) {
    samples.sort_by_key(|s| s.timestamp);
}
