use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Unit of the outbound and recorded stream.
///
/// Each update plays exactly one role: a sensor sample (carries `value`), a
/// manual label, or a reset marker. Fields that do not apply are omitted on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Wall-clock milliseconds. Stamped by the hub when absent.
    #[serde(rename = "Time", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    #[serde(rename = "Reset", default, skip_serializing_if = "is_false")]
    pub reset: bool,

    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,

    #[serde(rename = "Label", default, skip_serializing_if = "is_false")]
    pub label: bool,

    #[serde(rename = "Pred", default, skip_serializing_if = "is_false")]
    pub pred: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// What an [`Update`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRole {
    Sample,
    Label,
    Reset,
}

impl Update {
    /// Sensor sample, stamped on arrival at the hub.
    pub fn sample(value: f32) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn sample_at(time: i64, value: f32) -> Self {
        Self {
            time: Some(time),
            value: Some(value),
            ..Self::default()
        }
    }

    /// Viewer-initiated annotation.
    pub fn label() -> Self {
        Self {
            label: true,
            ..Self::default()
        }
    }

    /// Stream discontinuity, e.g. a replay loop restart.
    pub fn reset_marker() -> Self {
        Self {
            reset: true,
            ..Self::default()
        }
    }

    /// Reset wins over label; an update is a sample only if it carries a
    /// value and neither flag.
    pub fn role(&self) -> UpdateRole {
        if self.reset {
            UpdateRole::Reset
        } else if self.label || self.value.is_none() {
            UpdateRole::Label
        } else {
            UpdateRole::Sample
        }
    }

    /// Clear every field that does not belong to [`role`](Self::role), so
    /// the serialized form carries exactly one role. `pred` is always
    /// cleared; only the hub sets it.
    pub fn normalize(&mut self) {
        match self.role() {
            UpdateRole::Reset => {
                self.value = None;
                self.label = false;
            }
            UpdateRole::Label => {
                self.value = None;
                self.label = true;
            }
            UpdateRole::Sample => {}
        }
        self.pred = false;
    }

    /// A sample whose value is NaN or infinite; it would serialize as
    /// `null` and read back as a label.
    pub fn is_non_finite_sample(&self) -> bool {
        self.role() == UpdateRole::Sample && self.value.is_some_and(|v| !v.is_finite())
    }
}

/// Current wall-clock time in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_wire_format() {
        let json = serde_json::to_string(&Update::sample_at(1700000000123, 1.5)).unwrap();
        assert_eq!(json, r#"{"Time":1700000000123,"Value":1.5}"#);
    }

    #[test]
    fn test_label_omits_value() {
        let mut update = Update::label();
        update.time = Some(42);
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"Time":42,"Label":true}"#);
    }

    #[test]
    fn test_reset_and_pred_flags() {
        let mut reset = Update::reset_marker();
        reset.time = Some(7);
        assert_eq!(
            serde_json::to_string(&reset).unwrap(),
            r#"{"Time":7,"Reset":true}"#
        );

        let mut sample = Update::sample_at(8, -0.25);
        sample.pred = true;
        assert_eq!(
            serde_json::to_string(&sample).unwrap(),
            r#"{"Time":8,"Value":-0.25,"Pred":true}"#
        );
    }

    #[test]
    fn test_parse_recorded_line() {
        let update: Update = serde_json::from_str(r#"{"Time":5,"Value":301}"#).unwrap();
        assert_eq!(update, Update::sample_at(5, 301.0));

        let label: Update = serde_json::from_str(r#"{"Time":6,"Label":true}"#).unwrap();
        assert_eq!(label.role(), UpdateRole::Label);
        assert_eq!(label.value, None);

        // Explicit null is accepted for an absent value.
        let null_value: Update = serde_json::from_str(r#"{"Time":9,"Value":null}"#).unwrap();
        assert_eq!(null_value.value, None);
    }

    #[test]
    fn test_roles() {
        assert_eq!(Update::sample(1.0).role(), UpdateRole::Sample);
        assert_eq!(Update::label().role(), UpdateRole::Label);
        assert_eq!(Update::reset_marker().role(), UpdateRole::Reset);
    }

    #[test]
    fn test_normalize_leaves_one_role() {
        let mut bare = Update {
            time: Some(5),
            ..Update::default()
        };
        bare.normalize();
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"Time":5,"Label":true}"#);

        let mut labelled_sample = Update::sample_at(6, 2.0);
        labelled_sample.label = true;
        labelled_sample.pred = true;
        labelled_sample.normalize();
        assert_eq!(
            serde_json::to_string(&labelled_sample).unwrap(),
            r#"{"Time":6,"Label":true}"#
        );

        let mut reset = Update::sample_at(7, 3.0);
        reset.reset = true;
        reset.label = true;
        reset.normalize();
        assert_eq!(serde_json::to_string(&reset).unwrap(), r#"{"Time":7,"Reset":true}"#);

        let mut sample = Update::sample_at(8, 4.0);
        sample.pred = true;
        sample.normalize();
        assert_eq!(sample, Update::sample_at(8, 4.0));
    }

    #[test]
    fn test_non_finite_samples() {
        assert!(Update::sample(f32::NAN).is_non_finite_sample());
        assert!(Update::sample(f32::INFINITY).is_non_finite_sample());
        assert!(!Update::sample(1.0).is_non_finite_sample());
        assert!(!Update::label().is_non_finite_sample());

        // The wire form of NaN is null, which would read back as a label.
        let json = serde_json::to_string(&Update::sample_at(1, f32::NAN)).unwrap();
        let parsed: Update = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.role(), UpdateRole::Label);
    }
}
