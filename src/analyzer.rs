//! Pattern analyzer
//!
//! Scores the four somatic patterns from combined face/body metrics using the
//! static pattern configuration: each available metric is normalized onto
//! 0-100 dysfunction and accumulated into a weighted average.
//!
//! Missing metrics are skipped entirely — they drop out of both the weighted
//! sum and the weight denominator. This graceful-degradation design lets a
//! missing sensor shrink the evidence base instead of injecting a fake
//! "normal" reading that would bias the score toward healthy.

use crate::patterns::{MetricConfig, MetricKey, PATTERNS};
use crate::types::{CombinedMetrics, PatternKey, PerPattern, Severity};
use serde::Serialize;

/// One metric's contribution to a pattern score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBreakdown {
    pub key: MetricKey,
    pub name: &'static str,
    pub raw_value: f64,
    pub normalized_value: f64,
    pub weight: f64,
    pub contribution: f64,
    /// Whether the raw magnitude exceeded the metric's flag threshold.
    pub exceeds_threshold: bool,
}

/// Analysis result for one pattern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternResult {
    pub key: PatternKey,
    pub name: &'static str,
    pub description: &'static str,
    /// Weighted-average dysfunction score, 0-100.
    pub score: f64,
    /// Severity per this pattern's configured thresholds.
    pub severity: Severity,
    pub recommendations: &'static [&'static str],
    /// Contributing metrics, highest contribution first.
    pub metric_breakdown: Vec<MetricBreakdown>,
}

/// Full visual (body + face) pattern analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalysis {
    /// Per-pattern results in [`PatternKey::ALL`] order.
    pub patterns: Vec<PatternResult>,
    /// Just the scores, keyed for the fusion engine.
    pub scores: PerPattern<f64>,
    /// Highest-scoring pattern with a non-`None` severity, if any.
    pub dominant_pattern: Option<PatternKey>,
    pub summary: String,
}

impl PatternAnalysis {
    pub fn pattern(&self, key: PatternKey) -> &PatternResult {
        self.patterns
            .iter()
            .find(|p| p.key == key)
            .expect("analysis always carries all four patterns")
    }
}

/// Analyze all four patterns from combined metrics.
pub fn analyze_patterns(metrics: &CombinedMetrics) -> PatternAnalysis {
    let mut patterns = Vec::with_capacity(PATTERNS.len());

    for config in PATTERNS.iter() {
        let score = score_pattern(config.metrics, metrics);
        let severity = config.severity_thresholds.severity_for(score);

        patterns.push(PatternResult {
            key: config.key,
            name: config.name,
            description: config.description,
            score,
            severity,
            recommendations: config.recommendations.for_severity(severity),
            metric_breakdown: metric_breakdown(config.metrics, metrics),
        });
    }

    let scores = PerPattern::from_fn(|key| {
        patterns
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.score)
            .unwrap_or(0.0)
    });

    let dominant_pattern = find_dominant(&patterns);
    let summary = generate_summary(&patterns);

    PatternAnalysis {
        patterns,
        scores,
        dominant_pattern,
        summary,
    }
}

/// Weighted-average score over the metrics that are actually present.
///
/// Returns exactly 0 when no configured metric has a value (empty weight
/// denominator), never NaN.
pub fn score_pattern(configs: &[MetricConfig], metrics: &CombinedMetrics) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for config in configs {
        let Some(raw) = config.key.resolve(metrics) else {
            continue;
        };
        if raw.is_nan() {
            continue;
        }

        let normalized = config.normalize.apply(raw);
        weighted_sum += normalized * config.weight;
        weight_sum += config.weight;
    }

    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    }
}

fn metric_breakdown(configs: &[MetricConfig], metrics: &CombinedMetrics) -> Vec<MetricBreakdown> {
    let mut breakdown: Vec<MetricBreakdown> = configs
        .iter()
        .filter_map(|config| {
            let raw = config.key.resolve(metrics)?;
            if raw.is_nan() {
                return None;
            }
            let normalized = config.normalize.apply(raw);
            Some(MetricBreakdown {
                key: config.key,
                name: config.key.display_name(),
                raw_value: raw,
                normalized_value: normalized,
                weight: config.weight,
                contribution: normalized * config.weight,
                exceeds_threshold: config
                    .threshold
                    .map(|t| raw.abs() > t)
                    .unwrap_or(false),
            })
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    breakdown
}

fn find_dominant(patterns: &[PatternResult]) -> Option<PatternKey> {
    let mut max_score = 0.0;
    let mut dominant = None;

    for pattern in patterns {
        if pattern.score > max_score && pattern.severity != Severity::None {
            max_score = pattern.score;
            dominant = Some(pattern.key);
        }
    }
    dominant
}

fn generate_summary(patterns: &[PatternResult]) -> String {
    let mut active: Vec<&PatternResult> = patterns
        .iter()
        .filter(|p| p.severity != Severity::None)
        .collect();
    active.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if active.is_empty() {
        return "No significant somatic patterns detected. Your posture and alignment \
                are within normal ranges."
            .to_string();
    }

    let dominant = active[0];
    let mut summary = format!(
        "Primary pattern: {} ({}). ",
        dominant.name, dominant.severity
    );

    let secondary_names: Vec<&str> = active.iter().skip(1).take(2).map(|p| p.name).collect();
    match secondary_names.len() {
        0 => {}
        1 => summary.push_str(&format!("Secondary pattern: {}.", secondary_names[0])),
        _ => summary.push_str(&format!(
            "Secondary patterns include {}.",
            secondary_names.join(" and ")
        )),
    }

    summary
}
