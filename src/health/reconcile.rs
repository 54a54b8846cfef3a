//! Reconciles every historical risk-assessment shape into one presentation
//! form.
//!
//! Stored records carry whatever the scoring service returned at the time
//! they were written. Three vintages exist in the wild:
//!
//! 1. current: `{"risk_score": 37.2, "risk_level": "low", "recommendations": [..]}`
//! 2. legacy flat: `{"riskScore": 62, "probability": "high", "lastUpdated": ..}`
//! 3. nested: `{"score": {"value": 44.0}, "probability": {"level": "medium"}}`
//!
//! Whatever the vintage, a missing or unreadable sub-field becomes the
//! `"unknown"` sentinel; this module never fails on stored data.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Unknown,
}

impl RiskLevel {
    /// Normalizes any historical level label onto the fixed 3-level set.
    /// `medium` was renamed to `moderate` between model generations.
    fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" | "moderate" => RiskLevel::Moderate,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RiskScore {
    Known(f64),
    Unknown(&'static str),
}

impl RiskScore {
    pub fn unknown() -> Self {
        RiskScore::Unknown(UNKNOWN)
    }
}

/// The one presentation shape handed to callers, fresh or historical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionReport {
    pub risk_score: RiskScore,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl ConditionReport {
    fn sentinel() -> Self {
        Self {
            risk_score: RiskScore::unknown(),
            risk_level: RiskLevel::Unknown,
            recommendations: Vec::new(),
        }
    }
}

/// Reconcile a raw assessment map. Every condition present in the input
/// appears in the output; every condition in `expected` appears even when
/// the input lacks it, filled with sentinels.
pub fn reconcile(assessment: &Value, expected: &[&str]) -> BTreeMap<String, ConditionReport> {
    let mut reports = BTreeMap::new();

    if let Some(conditions) = assessment.as_object() {
        for (condition, result) in conditions {
            reports.insert(condition.clone(), reconcile_condition(result));
        }
    }
    for condition in expected {
        reports
            .entry(condition.to_string())
            .or_insert_with(ConditionReport::sentinel);
    }
    reports
}

fn reconcile_condition(result: &Value) -> ConditionReport {
    let Some(fields) = result.as_object() else {
        return ConditionReport::sentinel();
    };

    let risk_score = read_score(fields);
    let risk_level = read_level(fields);
    let recommendations = fields
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ConditionReport {
        risk_score,
        risk_level,
        recommendations,
    }
}

fn read_score(fields: &serde_json::Map<String, Value>) -> RiskScore {
    let candidate = fields
        .get("risk_score")
        .or_else(|| fields.get("riskScore"))
        .or_else(|| fields.get("score").map(nested_value));
    match candidate.and_then(as_number) {
        Some(score) => RiskScore::Known(score),
        None => RiskScore::unknown(),
    }
}

fn read_level(fields: &serde_json::Map<String, Value>) -> RiskLevel {
    let candidate = fields
        .get("risk_level")
        .or_else(|| fields.get("probability").map(nested_level));
    match candidate.and_then(Value::as_str) {
        Some(label) => RiskLevel::parse(label),
        None => RiskLevel::Unknown,
    }
}

/// The nested vintage wraps the number as `{"value": ..}`.
fn nested_value(value: &Value) -> &Value {
    match value {
        Value::Object(inner) => inner.get("value").unwrap_or(value),
        _ => value,
    }
}

/// The nested vintage wraps the label as `{"level": ..}`.
fn nested_level(value: &Value) -> &Value {
    match value {
        Value::Object(inner) => inner.get("level").unwrap_or(value),
        _ => value,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) => value.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::catalog::CURRENT_CONDITIONS;
    use serde_json::json;

    #[test]
    fn current_shape_passes_through() {
        let assessment = json!({
            "diabetes": {
                "risk_score": 37.2,
                "risk_level": "low",
                "recommendations": ["Maintain a balanced diet", "Stay physically active"]
            }
        });
        let reports = reconcile(&assessment, &[]);
        let diabetes = &reports["diabetes"];
        assert_eq!(diabetes.risk_score, RiskScore::Known(37.2));
        assert_eq!(diabetes.risk_level, RiskLevel::Low);
        assert_eq!(diabetes.recommendations.len(), 2);
    }

    #[test]
    fn legacy_flat_shape_is_normalized() {
        let assessment = json!({
            "bloodPressure": {
                "riskScore": 62,
                "probability": "high",
                "lastUpdated": "2023-04-11T10:00:00Z",
                "featuresUsed": ["Age", "Salt intake"]
            }
        });
        let reports = reconcile(&assessment, &[]);
        let bp = &reports["bloodPressure"];
        assert_eq!(bp.risk_score, RiskScore::Known(62.0));
        assert_eq!(bp.risk_level, RiskLevel::High);
        assert!(bp.recommendations.is_empty());
    }

    #[test]
    fn nested_shape_is_normalized() {
        let assessment = json!({
            "cardiovascular": {
                "score": { "value": 44.0 },
                "probability": { "level": "medium" }
            }
        });
        let reports = reconcile(&assessment, &[]);
        let cardio = &reports["cardiovascular"];
        assert_eq!(cardio.risk_score, RiskScore::Known(44.0));
        assert_eq!(cardio.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn medium_normalizes_to_moderate() {
        assert_eq!(RiskLevel::parse("medium"), RiskLevel::Moderate);
        assert_eq!(RiskLevel::parse("Moderate"), RiskLevel::Moderate);
        assert_eq!(RiskLevel::parse("HIGH"), RiskLevel::High);
        assert_eq!(RiskLevel::parse("62%"), RiskLevel::Unknown);
    }

    #[test]
    fn missing_condition_becomes_sentinel_entry() {
        let assessment = json!({
            "diabetes": { "risk_score": 12.0, "risk_level": "low", "recommendations": [] },
            "cardiovascular": { "risk_score": 9.0, "risk_level": "low", "recommendations": [] }
        });
        let reports = reconcile(&assessment, CURRENT_CONDITIONS);
        let kidney = &reports["kidney_stone"];
        assert_eq!(kidney.risk_score, RiskScore::unknown());
        assert_eq!(kidney.risk_level, RiskLevel::Unknown);
        assert!(kidney.recommendations.is_empty());
    }

    #[test]
    fn non_object_condition_yields_full_sentinel() {
        let assessment = json!({ "diabetes": "corrupted" });
        let reports = reconcile(&assessment, &[]);
        assert_eq!(reports["diabetes"], ConditionReport::sentinel());
    }

    #[test]
    fn non_object_assessment_yields_expected_sentinels() {
        let reports = reconcile(&json!(null), CURRENT_CONDITIONS);
        assert_eq!(reports.len(), CURRENT_CONDITIONS.len());
        for report in reports.values() {
            assert_eq!(*report, ConditionReport::sentinel());
        }
    }

    #[test]
    fn percent_string_scores_still_parse() {
        let assessment = json!({ "respiratory": { "riskScore": "70%", "probability": "low" } });
        let reports = reconcile(&assessment, &[]);
        assert_eq!(reports["respiratory"].risk_score, RiskScore::Known(70.0));
    }

    #[test]
    fn non_string_recommendations_are_dropped() {
        let assessment = json!({
            "diabetes": {
                "risk_score": 55.0,
                "risk_level": "medium",
                "recommendations": ["Reduce sugar intake", 42, null]
            }
        });
        let reports = reconcile(&assessment, &[]);
        assert_eq!(
            reports["diabetes"].recommendations,
            vec!["Reduce sugar intake"]
        );
    }

    #[test]
    fn sentinel_serializes_with_unknown_strings() {
        let json = serde_json::to_value(ConditionReport::sentinel()).unwrap();
        assert_eq!(json["risk_score"], json!("unknown"));
        assert_eq!(json["risk_level"], json!("unknown"));
        assert_eq!(json["recommendations"], json!([]));
    }
}
