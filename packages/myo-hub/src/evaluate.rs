//! Offline scoring of the detector against a labelled recording.

use std::path::Path;

use myo_stats::{match_events, DetectorParams, EventCounts, StreamStats};
use serde::Serialize;

use crate::error::HubResult;
use crate::recorder::load_recording;
use crate::update::{Update, UpdateRole};

/// Outcome of running the detector over one recording
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub samples: usize,
    pub labels: usize,
    /// Ticks at which the detector reported a spike
    pub predictions: usize,
    pub tolerance_ms: i64,
    pub counts: EventCounts,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

pub async fn evaluate_file(
    path: impl AsRef<Path>,
    params: DetectorParams,
    tolerance_ms: i64,
) -> HubResult<Evaluation> {
    let updates = load_recording(path).await?;
    evaluate(&updates, params, tolerance_ms)
}

/// Feed every sample through a fresh [`StreamStats`] and match the flagged
/// ticks against the label timestamps.
pub fn evaluate(
    updates: &[Update],
    params: DetectorParams,
    tolerance_ms: i64,
) -> HubResult<Evaluation> {
    let mut stats = StreamStats::new(params)?;
    let mut samples = 0;
    let mut labels = Vec::new();
    let mut preds = Vec::new();

    for update in updates {
        let time = update.time.unwrap_or_default();
        match update.role() {
            UpdateRole::Sample => {
                if let Some(value) = update.value {
                    samples += 1;
                    stats.push(f64::from(value));
                    if stats.is_full() && stats.pred() {
                        preds.push(time);
                    }
                }
            }
            UpdateRole::Label => labels.push(time),
            UpdateRole::Reset => {}
        }
    }

    labels.sort_unstable();
    let counts = match_events(&labels, &preds, tolerance_ms);
    Ok(Evaluation {
        samples,
        labels: labels.len(),
        predictions: preds.len(),
        tolerance_ms,
        counts,
        precision: counts.precision(),
        recall: counts.recall(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> Vec<Update> {
        let mut updates = Vec::new();
        let mut t = 0;
        let mut push = |value: f32, count: usize, updates: &mut Vec<Update>| {
            for _ in 0..count {
                updates.push(Update::sample_at(t, value));
                t += 10;
            }
        };
        push(300.0, 600, &mut updates);
        push(280.0, 50, &mut updates);
        let mut label = Update::label();
        label.time = Some(6600);
        updates.push(label);
        push(320.0, 100, &mut updates);
        updates
    }

    #[test]
    fn test_detects_labelled_event() {
        let result = evaluate(&recording(), DetectorParams::default(), 500).unwrap();
        assert_eq!(result.samples, 750);
        assert_eq!(result.labels, 1);
        assert!(result.predictions > 0);
        assert_eq!(result.counts.true_positives, 1);
        assert_eq!(result.counts.false_negatives, 0);
    }

    #[test]
    fn test_unlabelled_steady_signal() {
        let updates: Vec<Update> = (0..1000).map(|i| Update::sample_at(i * 10, 300.0)).collect();
        let result = evaluate(&updates, DetectorParams::default(), 500).unwrap();
        assert_eq!(result.predictions, 0);
        assert_eq!(result.counts, EventCounts::default());
        assert_eq!(result.precision, None);
    }
}
