//! Triage scoring
//!
//! Maps a vitals snapshot to an integer priority, higher meaning more
//! urgent. Each vital is scored on its own and the parts are summed.
//! Temperature is carried but does not contribute.

use serde::{Deserialize, Serialize};

use crate::telemetry::VitalsSample;

pub type TriageScore = u32;

/// The vitals a patient is admitted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    #[serde(rename = "HR", default, skip_serializing_if = "Option::is_none")]
    pub hr: Option<f64>,
    #[serde(rename = "SpO2", default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    #[serde(rename = "Temp", default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
}

impl VitalsSnapshot {
    pub fn new(hr: f64, spo2: f64, temp: f64) -> Self {
        VitalsSnapshot {
            hr: Some(hr),
            spo2: Some(spo2),
            temp: Some(temp),
        }
    }
}

impl From<&VitalsSample> for VitalsSnapshot {
    fn from(sample: &VitalsSample) -> Self {
        VitalsSnapshot {
            hr: sample.number("HR"),
            spo2: sample.number("SpO2"),
            temp: sample.number("Temp"),
        }
    }
}

/// Score a snapshot. Absent input, or an absent vital, contributes nothing.
pub fn score(vitals: Option<&VitalsSnapshot>) -> TriageScore {
    let Some(vitals) = vitals else {
        return 0;
    };

    heart_rate_points(vitals.hr) + saturation_points(vitals.spo2)
}

fn heart_rate_points(hr: Option<f64>) -> TriageScore {
    match hr {
        Some(hr) if hr < 50.0 || hr > 130.0 => 10,
        Some(hr) if hr < 60.0 || hr > 110.0 => 5,
        _ => 0,
    }
}

fn saturation_points(spo2: Option<f64>) -> TriageScore {
    match spo2 {
        Some(spo2) if spo2 < 92.0 => 15,
        Some(spo2) if spo2 < 95.0 => 5,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::FieldValue;

    #[test]
    fn test_score_reference_cases() {
        assert_eq!(score(Some(&VitalsSnapshot::new(45.0, 90.0, 37.0))), 25);
        assert_eq!(score(Some(&VitalsSnapshot::new(70.0, 97.0, 37.0))), 0);
        assert_eq!(score(Some(&VitalsSnapshot::new(58.0, 94.0, 37.0))), 10);
    }

    #[test]
    fn test_heart_rate_tiers_are_exclusive() {
        assert_eq!(score(Some(&VitalsSnapshot::new(140.0, 99.0, 37.0))), 10);
        assert_eq!(score(Some(&VitalsSnapshot::new(120.0, 99.0, 37.0))), 5);
        assert_eq!(score(Some(&VitalsSnapshot::new(50.0, 99.0, 37.0))), 5);
        assert_eq!(score(Some(&VitalsSnapshot::new(60.0, 99.0, 37.0))), 0);
        assert_eq!(score(Some(&VitalsSnapshot::new(110.0, 99.0, 37.0))), 0);
        assert_eq!(score(Some(&VitalsSnapshot::new(130.0, 99.0, 37.0))), 5);
    }

    #[test]
    fn test_saturation_boundaries() {
        assert_eq!(score(Some(&VitalsSnapshot::new(70.0, 92.0, 37.0))), 5);
        assert_eq!(score(Some(&VitalsSnapshot::new(70.0, 95.0, 37.0))), 0);
        assert_eq!(score(Some(&VitalsSnapshot::new(70.0, 91.9, 37.0))), 15);
    }

    #[test]
    fn test_temperature_does_not_contribute() {
        let fever = VitalsSnapshot::new(70.0, 97.0, 41.0);
        let hypothermia = VitalsSnapshot::new(70.0, 97.0, 33.0);
        assert_eq!(score(Some(&fever)), 0);
        assert_eq!(score(Some(&hypothermia)), 0);
    }

    #[test]
    fn test_missing_input_scores_zero() {
        assert_eq!(score(None), 0);
        assert_eq!(score(Some(&VitalsSnapshot::default())), 0);

        let hr_only = VitalsSnapshot {
            hr: Some(40.0),
            ..Default::default()
        };
        assert_eq!(score(Some(&hr_only)), 10);
    }

    #[test]
    fn test_score_is_deterministic() {
        let vitals = VitalsSnapshot::new(125.0, 93.0, 38.2);
        let first = score(Some(&vitals));
        assert!((0..100).all(|_| score(Some(&vitals)) == first));
    }

    #[test]
    fn test_snapshot_from_live_sample() {
        let mut sample = VitalsSample::new();
        sample.insert("HR", FieldValue::Number(45.0));
        sample.insert("SpO2", FieldValue::NotANumber);

        let snapshot = VitalsSnapshot::from(&sample);
        assert_eq!(snapshot.hr, Some(45.0));
        assert_eq!(snapshot.spo2, None);
        assert_eq!(score(Some(&snapshot)), 10);
    }
}
