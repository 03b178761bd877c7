//! Scoring predicted event times against manual labels.

use serde::{Deserialize, Serialize};

/// Detection counts from [`match_events`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EventCounts {
    /// `None` when nothing was predicted.
    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positives + self.false_positives;
        (predicted > 0).then(|| self.true_positives as f64 / predicted as f64)
    }

    /// `None` when there were no labels.
    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positives + self.false_negatives;
        (actual > 0).then(|| self.true_positives as f64 / actual as f64)
    }
}

/// Match sorted label and prediction timestamps within `tolerance`.
///
/// Each label counts once: as a true positive if some prediction lies within
/// `tolerance` of it, otherwise as a false negative. One prediction may
/// satisfy several labels. A prediction with no label within `tolerance` is
/// a false positive.
pub fn match_events(labels: &[i64], preds: &[i64], tolerance: i64) -> EventCounts {
    let mut counts = EventCounts::default();

    let mut i = 0;
    for &label in labels {
        while i < preds.len() && preds[i] < label - tolerance {
            i += 1;
        }
        match preds.get(i) {
            Some(&pred) if pred <= label + tolerance => counts.true_positives += 1,
            _ => counts.false_negatives += 1,
        }
    }

    let mut j = 0;
    for &pred in preds {
        while j < labels.len() && labels[j] < pred - tolerance {
            j += 1;
        }
        match labels.get(j) {
            Some(&label) if label <= pred + tolerance => {}
            _ => counts.false_positives += 1,
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(labels: &[i64], preds: &[i64], tolerance: i64) -> (usize, usize, usize) {
        let c = match_events(labels, preds, tolerance);
        (c.true_positives, c.false_positives, c.false_negatives)
    }

    #[test]
    fn test_zero_tolerance() {
        assert_eq!(counts(&[], &[], 0), (0, 0, 0));
        assert_eq!(counts(&[0], &[], 0), (0, 0, 1));
        assert_eq!(counts(&[], &[0], 0), (0, 1, 0));
        assert_eq!(counts(&[0], &[0], 0), (1, 0, 0));
        assert_eq!(counts(&[0], &[0, 0], 0), (1, 0, 0));
        assert_eq!(counts(&[0], &[1], 0), (0, 1, 1));
        assert_eq!(counts(&[1], &[0], 0), (0, 1, 1));
        assert_eq!(counts(&[0], &[0, 1], 0), (1, 1, 0));
        assert_eq!(counts(&[0, 1], &[0], 0), (1, 0, 1));
        assert_eq!(counts(&[0, 1], &[0, 1], 0), (2, 0, 0));
        assert_eq!(counts(&[0, 2], &[0, 1], 0), (1, 1, 1));
        assert_eq!(counts(&[2, 3], &[0, 1], 0), (0, 2, 2));
    }

    #[test]
    fn test_with_tolerance() {
        assert_eq!(counts(&[0], &[100], 100), (1, 0, 0));
        assert_eq!(counts(&[100], &[0], 100), (1, 0, 0));
        assert_eq!(counts(&[0], &[0, 100], 100), (1, 0, 0));
        assert_eq!(counts(&[100], &[0, 100], 100), (1, 0, 0));
        assert_eq!(counts(&[0, 200], &[100], 100), (2, 0, 0));
    }

    #[test]
    fn test_precision_recall() {
        let c = match_events(&[0, 1000], &[10, 500], 50);
        assert_eq!(c.precision(), Some(0.5));
        assert_eq!(c.recall(), Some(0.5));
        assert_eq!(EventCounts::default().precision(), None);
        assert_eq!(EventCounts::default().recall(), None);
    }
}
