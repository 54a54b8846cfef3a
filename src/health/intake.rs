//! Form intake: shapes a raw questionnaire body into the exact record the
//! scoring service accepts.
//!
//! Two submitted-form generations are supported, selected by the optional
//! `schemaVersion` discriminator: the classic vitals form (version 1, the
//! default) and the expanded survey (version 2). Validation is one pass and
//! collects every violation before reporting.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::catalog;
use crate::error::Violation;

/// The flat feature map sent upstream: canonical feature name to encoded
/// numeric value. Categorical answers are already ordinal-encoded here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<String, f64>);

impl CanonicalRecord {
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    fn insert(&mut self, feature: &str, value: f64) {
        self.0.insert(feature.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Numeric,
    Categorical,
    Boolean,
}

struct FieldSpec {
    /// Field name as submitted by the form.
    field: &'static str,
    /// Human label used in violation messages.
    label: &'static str,
    /// Canonical feature name in the catalog / upstream contract.
    canonical: &'static str,
    kind: Kind,
    required: bool,
}

const fn required(
    field: &'static str,
    label: &'static str,
    canonical: &'static str,
    kind: Kind,
) -> FieldSpec {
    FieldSpec {
        field,
        label,
        canonical,
        kind,
        required: true,
    }
}

const fn optional(
    field: &'static str,
    label: &'static str,
    canonical: &'static str,
    kind: Kind,
) -> FieldSpec {
    FieldSpec {
        field,
        label,
        canonical,
        kind,
        required: false,
    }
}

/// Version 1: the classic vitals form. Every field is mandatory.
const CLASSIC_FIELDS: &[FieldSpec] = &[
    required("age", "Age", "Age", Kind::Numeric),
    required("sex", "Sex", "Sex", Kind::Categorical),
    required("bmi", "BMI", "BMI", Kind::Numeric),
    required(
        "bloodPressureSystolic",
        "Systolic blood pressure",
        "Systolic blood pressure",
        Kind::Numeric,
    ),
    required(
        "bloodPressureDiastolic",
        "Diastolic blood pressure",
        "Diastolic blood pressure",
        Kind::Numeric,
    ),
    required("bloodSugar", "Blood sugar", "Blood sugar", Kind::Numeric),
    required("cholesterol", "Cholesterol", "Cholesterol", Kind::Numeric),
    required("smoking", "Smoking", "Smoking", Kind::Boolean),
    required(
        "diabetesFamilyHistory",
        "Family history of diabetes",
        "Family history of diabetes",
        Kind::Boolean,
    ),
    required(
        "environmentalExposure",
        "Environmental exposure",
        "Environmental exposure",
        Kind::Categorical,
    ),
    required(
        "coughingFrequency",
        "Coughing frequency",
        "Coughing frequency",
        Kind::Categorical,
    ),
];

/// Version 2: the expanded survey. Demographics are mandatory, everything
/// else optional; BMI is derived from height/weight when not submitted.
/// Absent optional answers are left out of the record entirely.
const SURVEY_FIELDS: &[FieldSpec] = &[
    required("age", "Age", "Age", Kind::Numeric),
    required("sex", "Sex", "Sex", Kind::Categorical),
    required("height", "Height", "Height", Kind::Numeric),
    required("weight", "Weight", "Weight", Kind::Numeric),
    optional("bmi", "BMI", "BMI", Kind::Numeric),
    optional(
        "physicalActivityLevel",
        "Physical activity level",
        "Physical activity level",
        Kind::Categorical,
    ),
    optional(
        "activityIntensity",
        "Activity intensity",
        "Activity intensity",
        Kind::Categorical,
    ),
    optional(
        "smokingStatus",
        "Smoking status",
        "Smoking status",
        Kind::Categorical,
    ),
    optional(
        "alcoholConsumption",
        "Alcohol consumption",
        "Alcohol consumption",
        Kind::Categorical,
    ),
    optional(
        "sleepDuration",
        "Sleep duration",
        "Sleep duration",
        Kind::Categorical,
    ),
    optional(
        "stressLevels",
        "Stress levels",
        "Stress levels",
        Kind::Categorical,
    ),
    optional(
        "waterIntake",
        "Daily water intake",
        "Daily water intake",
        Kind::Categorical,
    ),
    optional(
        "fruitVegetableConsumption",
        "Fruit and vegetable consumption",
        "Fruit and vegetable consumption",
        Kind::Categorical,
    ),
    optional(
        "processedFoodConsumption",
        "Processed food consumption",
        "Processed food consumption",
        Kind::Categorical,
    ),
    optional(
        "addedSugarIntake",
        "Added sugar intake",
        "Added sugar intake",
        Kind::Categorical,
    ),
    optional("saltIntake", "Salt intake", "Salt intake", Kind::Categorical),
    optional(
        "redMeatConsumption",
        "Red meat consumption",
        "Red meat consumption",
        Kind::Categorical,
    ),
    optional(
        "familyHistoryDiabetes",
        "Family history of diabetes",
        "Family history of diabetes",
        Kind::Boolean,
    ),
    optional(
        "familyHistoryCardiovascular",
        "Family history of cardiovascular disease",
        "Family history of cardiovascular disease",
        Kind::Boolean,
    ),
    optional(
        "familyHistoryKidneyStones",
        "Family history of kidney stones",
        "Family history of kidney stones",
        Kind::Boolean,
    ),
    optional(
        "previousKidneyStones",
        "Previous kidney stones",
        "Previous kidney stones",
        Kind::Boolean,
    ),
    optional(
        "frequentUrination",
        "Frequent urination",
        "Frequent urination",
        Kind::Categorical,
    ),
    optional(
        "unexplainedThirst",
        "Unexplained thirst",
        "Unexplained thirst",
        Kind::Categorical,
    ),
    optional(
        "unexplainedWeightLoss",
        "Unexplained weight loss",
        "Unexplained weight loss",
        Kind::Categorical,
    ),
    optional(
        "chestPain",
        "Chest pain or discomfort",
        "Chest pain or discomfort",
        Kind::Categorical,
    ),
    optional(
        "shortnessOfBreath",
        "Shortness of breath",
        "Shortness of breath during normal activities",
        Kind::Categorical,
    ),
    optional("fatigue", "Fatigue", "Fatigue", Kind::Categorical),
    optional(
        "backFlankPain",
        "Back or flank pain",
        "Back or flank pain",
        Kind::Categorical,
    ),
    optional(
        "painfulUrination",
        "Painful urination",
        "Painful urination",
        Kind::Categorical,
    ),
    optional(
        "bloodInUrine",
        "Blood in urine",
        "Blood in urine",
        Kind::Boolean,
    ),
];

/// Normalize a raw form body into a [`CanonicalRecord`].
///
/// Pure: no I/O, fully determined by the input value and the catalog.
/// Returns the full violation list on failure, never just the first one.
pub fn normalize(payload: &Value) -> Result<CanonicalRecord, Vec<Violation>> {
    let Some(body) = payload.as_object() else {
        return Err(vec![Violation::new("body", "Expected a JSON object")]);
    };

    match schema_version(payload) {
        Some(1) => normalize_fields(CLASSIC_FIELDS, body),
        Some(2) => {
            let mut record = CanonicalRecord::default();
            let mut violations = Vec::new();
            collect_fields(SURVEY_FIELDS, body, &mut record, &mut violations);
            derive_bmi(&mut record, &mut violations);
            if violations.is_empty() {
                Ok(record)
            } else {
                Err(violations)
            }
        }
        _ => Err(vec![Violation::new(
            "schemaVersion",
            "Unsupported form schema version",
        )]),
    }
}

fn schema_version(payload: &Value) -> Option<u64> {
    match payload.get("schemaVersion") {
        None | Some(Value::Null) => Some(1),
        Some(v) => v.as_u64(),
    }
}

fn normalize_fields(
    fields: &[FieldSpec],
    body: &serde_json::Map<String, Value>,
) -> Result<CanonicalRecord, Vec<Violation>> {
    let mut record = CanonicalRecord::default();
    let mut violations = Vec::new();
    collect_fields(fields, body, &mut record, &mut violations);
    if violations.is_empty() {
        Ok(record)
    } else {
        Err(violations)
    }
}

fn collect_fields(
    fields: &[FieldSpec],
    body: &serde_json::Map<String, Value>,
    record: &mut CanonicalRecord,
    violations: &mut Vec<Violation>,
) {
    for spec in fields {
        let value = body.get(spec.field).filter(|v| !v.is_null());
        let Some(value) = value else {
            if spec.required {
                violations.push(Violation::new(
                    spec.field,
                    format!("{} is required", spec.label),
                ));
            }
            continue;
        };

        match encode_value(spec, value) {
            Ok(encoded) => record.insert(spec.canonical, encoded),
            Err(violation) => violations.push(violation),
        }
    }
}

fn encode_value(spec: &FieldSpec, value: &Value) -> Result<f64, Violation> {
    match spec.kind {
        Kind::Numeric => encode_numeric(spec, value),
        Kind::Categorical => encode_categorical(spec, value),
        Kind::Boolean => encode_boolean(spec, value),
    }
}

fn encode_numeric(spec: &FieldSpec, value: &Value) -> Result<f64, Violation> {
    let Some(number) = coerce_number(value) else {
        return Err(Violation::new(
            spec.field,
            format!("{} must be a number", spec.label),
        ));
    };
    check_range(spec.field, spec.label, spec.canonical, number)?;
    Ok(number)
}

/// A categorical answer is either a catalog label or an already-encoded
/// ordinal. Anything else fails closed; there is no default category.
fn encode_categorical(spec: &FieldSpec, value: &Value) -> Result<f64, Violation> {
    let labels = catalog::labels_for(spec.canonical).unwrap_or(&[]);
    match value {
        Value::String(label) => catalog::ordinal_for(spec.canonical, label)
            .map(|ordinal| ordinal as f64)
            .ok_or_else(|| unknown_category(spec, labels)),
        Value::Number(_) => {
            let ordinal = value.as_f64().unwrap_or(-1.0);
            if ordinal.fract() == 0.0 && ordinal >= 0.0 && (ordinal as usize) < labels.len() {
                Ok(ordinal)
            } else {
                Err(unknown_category(spec, labels))
            }
        }
        _ => Err(unknown_category(spec, labels)),
    }
}

fn unknown_category(spec: &FieldSpec, labels: &[&str]) -> Violation {
    Violation::new(
        spec.field,
        format!("{} must be one of: {}", spec.label, labels.join(", ")),
    )
}

fn encode_boolean(spec: &FieldSpec, value: &Value) -> Result<f64, Violation> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => None,
        },
        Value::Number(_) => match value.as_f64() {
            Some(n) if n == 0.0 => Some(false),
            Some(n) if n == 1.0 => Some(true),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(|b| if b { 1.0 } else { 0.0 })
        .ok_or_else(|| Violation::new(spec.field, format!("{} must be a yes/no answer", spec.label)))
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) => value.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Closed-interval check against the catalog; boundary values are valid.
fn check_range(field: &str, label: &str, canonical: &str, value: f64) -> Result<(), Violation> {
    if let Some((min, max)) = catalog::range_for(canonical) {
        if value < min || value > max {
            return Err(Violation::new(
                field,
                format!(
                    "{} must be between {} and {}",
                    label,
                    fmt_bound(min),
                    fmt_bound(max)
                ),
            ));
        }
    }
    Ok(())
}

fn fmt_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}

fn derive_bmi(record: &mut CanonicalRecord, violations: &mut Vec<Violation>) {
    if record.get("BMI").is_some() {
        return;
    }
    let (Some(height), Some(weight)) = (record.get("Height"), record.get("Weight")) else {
        return;
    };
    let height_m = height / 100.0;
    let bmi = weight / (height_m * height_m);
    match check_range("bmi", "BMI", "BMI", bmi) {
        Ok(()) => record.insert("BMI", (bmi * 10.0).round() / 10.0),
        Err(violation) => violations.push(violation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classic_body() -> Value {
        json!({
            "age": 45,
            "sex": "Female",
            "bmi": 27,
            "bloodPressureSystolic": 130,
            "bloodPressureDiastolic": 85,
            "bloodSugar": 95,
            "cholesterol": 190,
            "smoking": false,
            "diabetesFamilyHistory": true,
            "environmentalExposure": "medium",
            "coughingFrequency": "rare"
        })
    }

    #[test]
    fn classic_form_normalizes() {
        let record = normalize(&classic_body()).expect("valid form");
        assert_eq!(record.get("Age"), Some(45.0));
        assert_eq!(record.get("Sex"), Some(1.0));
        assert_eq!(record.get("BMI"), Some(27.0));
        assert_eq!(record.get("Systolic blood pressure"), Some(130.0));
        assert_eq!(record.get("Smoking"), Some(0.0));
        assert_eq!(record.get("Family history of diabetes"), Some(1.0));
        assert_eq!(record.get("Environmental exposure"), Some(1.0));
        assert_eq!(record.get("Coughing frequency"), Some(0.0));
        assert_eq!(record.len(), 11);
    }

    #[test]
    fn ordinals_stay_within_label_bounds() {
        let record = normalize(&classic_body()).expect("valid form");
        for feature in ["Sex", "Environmental exposure", "Coughing frequency"] {
            let labels = catalog::labels_for(feature).unwrap();
            let encoded = record.get(feature).unwrap();
            assert!(encoded >= 0.0);
            assert!((encoded as usize) < labels.len());
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        for (field, value) in [("age", 0), ("age", 120), ("bmi", 10), ("bmi", 50)] {
            let mut body = classic_body();
            body[field] = json!(value);
            assert!(
                normalize(&body).is_ok(),
                "{field}={value} should be accepted"
            );
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (field, value) in [("age", -1), ("age", 121), ("bmi", 9), ("bmi", 51)] {
            let mut body = classic_body();
            body[field] = json!(value);
            assert!(
                normalize(&body).is_err(),
                "{field}={value} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_age_names_the_field() {
        let mut body = classic_body();
        body["age"] = json!(150);
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "age");
        assert!(violations[0].message.contains("Age"));
        assert_eq!(violations[0].message, "Age must be between 0 and 120");
    }

    #[test]
    fn every_missing_field_is_reported_at_once() {
        let body = json!({
            "age": 45,
            "sex": "Female",
            "bmi": 27
        });
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations.len(), 8);
        for violation in &violations {
            assert!(violation.message.ends_with("is required"));
        }
    }

    #[test]
    fn missing_and_invalid_fields_combine_in_one_pass() {
        let mut body = classic_body();
        body.as_object_mut().unwrap().remove("cholesterol");
        body["age"] = json!(150);
        body["sex"] = json!("Unspecified");
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn unknown_category_fails_closed() {
        let mut body = classic_body();
        body["coughingFrequency"] = json!("sometimes");
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "coughingFrequency");
        assert!(violations[0].message.contains("must be one of"));
    }

    #[test]
    fn categorical_accepts_preencoded_ordinal() {
        let mut body = classic_body();
        body["sex"] = json!(2);
        let record = normalize(&body).expect("ordinal is valid");
        assert_eq!(record.get("Sex"), Some(2.0));
    }

    #[test]
    fn categorical_rejects_out_of_range_ordinal() {
        let mut body = classic_body();
        body["sex"] = json!(3);
        assert!(normalize(&body).is_err());
    }

    #[test]
    fn boolean_answers_coerce_from_strings_and_numbers() {
        let mut body = classic_body();
        body["smoking"] = json!("Yes");
        body["diabetesFamilyHistory"] = json!(0);
        let record = normalize(&body).expect("coercible booleans");
        assert_eq!(record.get("Smoking"), Some(1.0));
        assert_eq!(record.get("Family history of diabetes"), Some(0.0));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let mut body = classic_body();
        body["age"] = json!("45");
        let record = normalize(&body).expect("numeric string");
        assert_eq!(record.get("Age"), Some(45.0));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let violations = normalize(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "body");
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let mut body = classic_body();
        body["schemaVersion"] = json!(9);
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations[0].field, "schemaVersion");
    }

    fn survey_body() -> Value {
        json!({
            "schemaVersion": 2,
            "age": 38,
            "sex": "Male",
            "height": 180,
            "weight": 81,
            "smokingStatus": "Never smoked",
            "alcoholConsumption": "Occasional (1-2 drinks/week)",
            "familyHistoryDiabetes": "no",
            "bloodInUrine": "no",
            "fatigue": "Mild"
        })
    }

    #[test]
    fn survey_form_normalizes_and_derives_bmi() {
        let record = normalize(&survey_body()).expect("valid survey");
        assert_eq!(record.get("Age"), Some(38.0));
        assert_eq!(record.get("Sex"), Some(0.0));
        assert_eq!(record.get("BMI"), Some(25.0));
        assert_eq!(record.get("Smoking status"), Some(0.0));
        assert_eq!(record.get("Alcohol consumption"), Some(1.0));
        assert_eq!(record.get("Family history of diabetes"), Some(0.0));
        assert_eq!(record.get("Fatigue"), Some(1.0));
    }

    #[test]
    fn survey_submitted_bmi_wins_over_derivation() {
        let mut body = survey_body();
        body["bmi"] = json!(30.5);
        let record = normalize(&body).expect("valid survey");
        assert_eq!(record.get("BMI"), Some(30.5));
    }

    #[test]
    fn survey_requires_demographics() {
        let body = json!({ "schemaVersion": 2, "age": 38 });
        let violations = normalize(&body).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["sex", "height", "weight"]);
    }

    #[test]
    fn survey_skips_absent_optional_answers() {
        let body = json!({
            "schemaVersion": 2,
            "age": 38,
            "sex": "Other",
            "height": 170,
            "weight": 70
        });
        let record = normalize(&body).expect("valid survey");
        assert_eq!(record.get("Stress levels"), None);
        // Age, Sex, Height, Weight plus the derived BMI.
        assert_eq!(record.len(), 5);
    }

    #[test]
    fn survey_rejects_unknown_optional_label() {
        let mut body = survey_body();
        body["fatigue"] = json!("always");
        let violations = normalize(&body).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "fatigue");
    }

    #[test]
    fn canonical_record_serializes_flat() {
        let record = normalize(&classic_body()).expect("valid form");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Age"], json!(45.0));
        assert_eq!(json["Sex"], json!(1.0));
    }
}
