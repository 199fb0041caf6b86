//! Bedside telemetry readings
//!
//! Sensors stream one text line per reading:
//! - `G:<integer>` carries a single raw ECG amplitude
//! - `D:<key>:<value>,...` carries a vitals snapshot (HR, SpO2, Temp, ...)
//!
//! Readings are transient. Vitals are forwarded to viewers as-is and ECG
//! samples only matter while a capture session is recording.

pub mod parser;

pub use parser::{parse_line, ParseError};

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// A single ECG amplitude, nominally in `[0, 1024]`.
pub type EcgSample = i32;

/// One decoded vitals field.
///
/// Fields decode independently: a value that is not a number becomes
/// `NotANumber` and the remaining fields of the line are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    NotANumber,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::NotANumber => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(v) => serializer.serialize_f64(*v),
            FieldValue::NotANumber => serializer.serialize_str("NaN"),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(v) => FieldValue::Number(v),
            Raw::Text(_) => FieldValue::NotANumber,
        })
    }
}

/// Vitals decoded from a `D:` line, keyed by the sensor's field name.
///
/// Only keys present on the line appear here; nothing is defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VitalsSample {
    fields: BTreeMap<String, FieldValue>,
}

impl VitalsSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Numeric value of `key`, if present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A successfully decoded telemetry line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Vitals(VitalsSample),
    Ecg(EcgSample),
}
