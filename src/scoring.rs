//! Shared numeric helpers: polarity ratios, banding, dominance and rounding.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::signals::SignalEvidence;

/// Score returned whenever there is nothing to measure.
pub const NEUTRAL: f64 = 0.5;

/// Evidence attached to a dimension score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    Signals(Vec<SignalEvidence>),
    GroupPairs(Vec<PairAlignment>),
    Coherence(CoherenceEvidence),
    Stories(Vec<String>),
}

impl Default for Evidence {
    fn default() -> Self {
        Evidence::Signals(Vec::new())
    }
}

/// Pairwise alignment between two groups' stories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAlignment {
    pub groups: [String; 2],
    pub alignment: f64,
    pub frame_alignment: f64,
    pub sentiment_alignment: f64,
    pub theme_alignment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceEvidence {
    pub leadership_story_count: usize,
    pub frame_consistency: f64,
    pub sentiment_consistency: f64,
    pub theme_consistency: f64,
    pub sample_stories: Vec<String>,
}

/// A normalized [0, 1] measurement of one attribute of a story collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_signals: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_signals: Option<usize>,
    pub evidence: Evidence,
    pub interpretation: String,
}

impl DimensionScore {
    pub fn neutral(interpretation: impl Into<String>) -> Self {
        Self {
            score: NEUTRAL,
            interpretation: interpretation.into(),
            ..Default::default()
        }
    }
}

/// `positive / (positive + negative)`, or [`NEUTRAL`] with no hits.
pub fn polarity_ratio(positive: usize, negative: usize) -> f64 {
    let total = positive + negative;
    if total == 0 {
        NEUTRAL
    } else {
        positive as f64 / total as f64
    }
}

/// How a score is compared against a band threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `score >= threshold`
    AtLeast,
    /// `score > threshold`
    Above,
}

/// Map `score` to a label using descending `thresholds`.
///
/// `labels` holds one more entry than `thresholds`; the last label is the
/// fallthrough for scores below every threshold.
pub fn classify<T: Clone>(score: f64, thresholds: &[f64], labels: &[T], boundary: Boundary) -> T {
    debug_assert_eq!(labels.len(), thresholds.len() + 1);
    let idx = thresholds
        .iter()
        .position(|&t| match boundary {
            Boundary::AtLeast => score >= t,
            Boundary::Above => score > t,
        })
        .unwrap_or(thresholds.len());
    labels[idx.min(labels.len() - 1)].clone()
}

/// The common four-band interpretation split at 0.7 / 0.5 / 0.3.
pub const STANDARD_BANDS: [f64; 3] = [0.7, 0.5, 0.3];

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `|a ∩ b| / |a ∪ b|`, or `None` when both sets are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Option<f64> {
    let union = a.union(b).count();
    if union == 0 {
        return None;
    }
    Some(a.intersection(b).count() as f64 / union as f64)
}

pub fn count_labels<I, S>(labels: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.into()).or_insert(0) += 1;
    }
    counts
}

/// Most frequent label; ties go to the lexicographically smallest.
pub fn dominant(counts: &BTreeMap<String, usize>) -> Option<(&str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for (label, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((label.as_str(), count));
        }
    }
    best
}

/// Labels ordered by count descending, ties by label.
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Character-safe prefix of at most `max` chars.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_defaults_to_neutral() {
        assert_eq!(polarity_ratio(0, 0), 0.5);
        assert_eq!(polarity_ratio(3, 1), 0.75);
        assert_eq!(polarity_ratio(0, 4), 0.0);
    }

    #[test]
    fn classify_respects_boundary_kind() {
        let labels = ["high", "mid", "low"];
        assert_eq!(classify(0.7, &[0.7, 0.4], &labels, Boundary::AtLeast), "high");
        assert_eq!(classify(0.7, &[0.7, 0.4], &labels, Boundary::Above), "mid");
        assert_eq!(classify(0.1, &[0.7, 0.4], &labels, Boundary::Above), "low");
    }

    #[test]
    fn dominant_breaks_ties_by_label() {
        let counts = count_labels(["tool", "partnership", "tool", "partnership"]);
        assert_eq!(dominant(&counts), Some(("partnership", 2)));
        assert_eq!(dominant(&BTreeMap::new()), None);
    }

    #[test]
    fn jaccard_bounds() {
        let a: BTreeSet<&str> = ["ai", "model"].into_iter().collect();
        let b: BTreeSet<&str> = ["ai", "bot"].into_iter().collect();
        assert!((jaccard(&a, &b).unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard(&a, &a), Some(1.0));
        assert_eq!(jaccard::<&str>(&BTreeSet::new(), &BTreeSet::new()), None);
    }

    #[test]
    fn std_dev_is_population() {
        let sd = std_dev(&[1.0, -1.0]).unwrap();
        assert!((sd - 1.0).abs() < 1e-12);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ab", 10), "ab");
    }
}
