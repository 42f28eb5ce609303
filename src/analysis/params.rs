//! Scenario parameters echoed alongside each transcript.
//!
//! Parameters are opaque labels except for the frame-size hints used by the
//! estimated frame delivery rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default packet size in bytes when a scenario does not set `packetSize`
pub const DEFAULT_PACKET_SIZE: f64 = 1000.0;

/// Average frame size as a multiple of the packet size
pub const FRAME_TO_PACKET_RATIO: f64 = 2.5;

/// A scalar parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value; text is parsed if it is a plain number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ParamValue {
    /// Interpret a command-line value, preferring numbers and booleans
    fn from(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            ParamValue::Int(i)
        } else if let Ok(x) = s.parse::<f64>() {
            ParamValue::Float(x)
        } else if let Ok(b) = s.parse::<bool>() {
            ParamValue::Bool(b)
        } else {
            ParamValue::Text(s.to_string())
        }
    }
}

/// Parameter mapping of one scenario, e.g. `dataRate: 10Mbps, delayMs: 50`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioParams(pub BTreeMap<String, ParamValue>);

impl ScenarioParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Assumed average frame size in bytes: `frameSize` if set, otherwise
    /// `packetSize` (default 1000) times 2.5
    pub fn average_frame_bytes(&self) -> f64 {
        if let Some(frame) = self.get_f64("frameSize").filter(|v| *v > 0.0) {
            return frame;
        }
        let packet = self
            .get_f64("packetSize")
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_PACKET_SIZE);
        packet * FRAME_TO_PACKET_RATIO
    }

    /// Parse `key=value` pairs as given on the command line
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let mut params = ScenarioParams::new();
        for pair in pairs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Expected key=value, got: {}", pair))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("Empty parameter name in: {}", pair));
            }
            params.insert(key, ParamValue::from(value.trim()));
        }
        Ok(params)
    }
}
