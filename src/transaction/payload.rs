use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// A scalar value inside a structured message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PayloadValue {
    /// Numeric view; numeric strings ("25.3") are accepted since sensor
    /// clients tend to send readings as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Number(n) => Some(*n),
            PayloadValue::Text(s) => s.trim().parse().ok(),
            PayloadValue::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            PayloadValue::Text(s) => s.clone(),
            PayloadValue::Number(n) => n.to_string(),
            PayloadValue::Bool(b) => b.to_string(),
        }
    }
}

/// A transaction message decoded as a flat JSON object of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagePayload(pub BTreeMap<String, PayloadValue>);

/// Temperature / humidity / particulate sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    #[serde(rename = "PM2.5")]
    pub pm25: Option<f64>,
}

/// Tagged weight measurement (`id` is the tag that was read).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightReading {
    pub id: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Environment(EnvironmentReading),
    Weight(WeightReading),
}

impl MessagePayload {
    /// Decode a message. Anything other than a JSON object of scalars is an
    /// `Encoding` error; nothing is ever evaluated.
    pub fn decode(message: &str) -> Result<Self> {
        serde_json::from_str(message).map_err(|e| LedgerError::Encoding(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    /// Typed view of the payload, if it looks like one of the known readings.
    pub fn reading(&self) -> Option<Reading> {
        if let (Some(id), Some(weight)) = (self.get("id"), self.get("weight")) {
            return Some(Reading::Weight(WeightReading {
                id: id.as_text(),
                weight: weight.as_f64()?,
            }));
        }

        let field = |k: &str| self.get(k).and_then(PayloadValue::as_f64);
        if ["temperature", "humidity", "PM2.5"]
            .iter()
            .any(|k| self.0.contains_key(*k))
        {
            return Some(Reading::Environment(EnvironmentReading {
                temperature: field("temperature"),
                humidity: field("humidity"),
                pm25: field("PM2.5"),
            }));
        }
        None
    }
}
