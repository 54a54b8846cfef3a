//! Canonical feature catalog shared by every form schema.
//!
//! The scoring service identifies features by the Title Case names listed
//! here. Each categorical feature has one ordered label list; the ordinal
//! sent upstream is the label's position in that list, so an encoded value
//! is always within `[0, len - 1]`. Unknown labels are not mapped to a
//! default anywhere; lookups fail and the caller reports the violation.

/// Bumped whenever a label list or range changes; stored alongside nothing
/// today but kept explicit so form layer and normalizer can assert they
/// agree on the same table.
pub const CATALOG_VERSION: u32 = 2;

/// Conditions the current scoring service models.
pub const CURRENT_CONDITIONS: &[&str] = &["cardiovascular", "diabetes", "kidney_stone"];

pub struct EnumSpec {
    pub feature: &'static str,
    pub labels: &'static [&'static str],
}

pub struct RangeSpec {
    pub feature: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const ENUMS: &[EnumSpec] = &[
    EnumSpec {
        feature: "Sex",
        labels: &["Male", "Female", "Other"],
    },
    EnumSpec {
        feature: "Environmental exposure",
        labels: &["low", "medium", "high"],
    },
    EnumSpec {
        feature: "Coughing frequency",
        labels: &["rare", "occasional", "frequent"],
    },
    EnumSpec {
        feature: "Physical activity level",
        labels: &[
            "None",
            "Light (1-2 days/week)",
            "Moderate (3-5 days/week)",
            "High (6-7 days/week)",
        ],
    },
    EnumSpec {
        feature: "Smoking status",
        labels: &[
            "Never smoked",
            "Former smoker (quit >1 year ago)",
            "Former smoker (quit <1 year ago)",
            "Current smoker (occasional)",
            "Current smoker (daily)",
        ],
    },
    EnumSpec {
        feature: "Alcohol consumption",
        labels: &[
            "None",
            "Occasional (1-2 drinks/week)",
            "Moderate (3-7 drinks/week)",
            "Heavy (>7 drinks/week)",
        ],
    },
    EnumSpec {
        feature: "Sleep duration",
        labels: &["<6 hours", "6-7 hours", "7-8 hours", ">8 hours"],
    },
    EnumSpec {
        feature: "Fruit and vegetable consumption",
        labels: &[
            "Less than 1 serving/day",
            "1-2 servings/day",
            "3-4 servings/day",
            "5+ servings/day",
        ],
    },
    EnumSpec {
        feature: "Processed food consumption",
        labels: &["Rarely", "1-3 times/week", "4-6 times/week", "Daily"],
    },
    EnumSpec {
        feature: "Added sugar intake",
        labels: &["Low", "Moderate", "High"],
    },
    EnumSpec {
        feature: "Daily water intake",
        labels: &["<4 glasses", "4-6 glasses", "7-8 glasses", ">8 glasses"],
    },
    EnumSpec {
        feature: "Salt intake",
        labels: &["Low", "Moderate", "High"],
    },
    EnumSpec {
        feature: "Red meat consumption",
        labels: &["Rarely", "1-2 times/week", "3-4 times/week", "5+ times/week"],
    },
    EnumSpec {
        feature: "Stress levels",
        labels: &["Low", "Moderate", "High", "Very high"],
    },
    EnumSpec {
        feature: "Activity intensity",
        labels: &["Low", "Moderate", "High", "Very high"],
    },
    EnumSpec {
        feature: "Frequent urination",
        labels: &["No", "Occasionally", "Frequently", "Very frequently"],
    },
    EnumSpec {
        feature: "Unexplained thirst",
        labels: &["No", "Yes (slight)", "Yes (significant)"],
    },
    EnumSpec {
        feature: "Unexplained weight loss",
        labels: &["No", "Yes (slight)", "Yes (significant)"],
    },
    EnumSpec {
        feature: "Chest pain or discomfort",
        labels: &["No", "Rarely", "Occasionally", "Frequently"],
    },
    EnumSpec {
        feature: "Shortness of breath during normal activities",
        labels: &["No", "Mild", "Moderate", "Severe"],
    },
    EnumSpec {
        feature: "Fatigue",
        labels: &["None", "Mild", "Moderate", "Severe"],
    },
    EnumSpec {
        feature: "Back or flank pain",
        labels: &["No", "Mild", "Moderate", "Severe"],
    },
    EnumSpec {
        feature: "Painful urination",
        labels: &["No", "Mild", "Moderate", "Severe"],
    },
];

pub const RANGES: &[RangeSpec] = &[
    RangeSpec {
        feature: "Age",
        min: 0.0,
        max: 120.0,
    },
    RangeSpec {
        feature: "Height",
        min: 50.0,
        max: 250.0,
    },
    RangeSpec {
        feature: "Weight",
        min: 20.0,
        max: 300.0,
    },
    RangeSpec {
        feature: "BMI",
        min: 10.0,
        max: 50.0,
    },
    RangeSpec {
        feature: "Systolic blood pressure",
        min: 70.0,
        max: 250.0,
    },
    RangeSpec {
        feature: "Diastolic blood pressure",
        min: 40.0,
        max: 150.0,
    },
    RangeSpec {
        feature: "Blood sugar",
        min: 30.0,
        max: 500.0,
    },
    RangeSpec {
        feature: "Cholesterol",
        min: 100.0,
        max: 500.0,
    },
];

pub fn labels_for(feature: &str) -> Option<&'static [&'static str]> {
    ENUMS
        .iter()
        .find(|spec| spec.feature == feature)
        .map(|spec| spec.labels)
}

/// Position of `label` in the feature's canonical list, matched
/// case-insensitively. `None` for unknown features or labels.
pub fn ordinal_for(feature: &str, label: &str) -> Option<usize> {
    labels_for(feature)?
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(label))
}

pub fn range_for(feature: &str) -> Option<(f64, f64)> {
    RANGES
        .iter()
        .find(|spec| spec.feature == feature)
        .map(|spec| (spec.min, spec.max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_cover_exactly_the_label_positions() {
        for spec in ENUMS {
            for (idx, label) in spec.labels.iter().enumerate() {
                let ordinal = ordinal_for(spec.feature, label).expect("known label");
                assert_eq!(ordinal, idx);
                assert!(ordinal < spec.labels.len());
            }
        }
    }

    #[test]
    fn label_lookup_is_case_insensitive() {
        assert_eq!(ordinal_for("Sex", "female"), Some(1));
        assert_eq!(ordinal_for("Sex", "FEMALE"), Some(1));
        assert_eq!(ordinal_for("Environmental exposure", "Medium"), Some(1));
    }

    #[test]
    fn unknown_labels_fail_closed() {
        assert_eq!(ordinal_for("Sex", "Unspecified"), None);
        assert_eq!(ordinal_for("Coughing frequency", "sometimes"), None);
        assert_eq!(ordinal_for("No such feature", "low"), None);
    }

    #[test]
    fn no_duplicate_labels_within_a_feature() {
        for spec in ENUMS {
            for (idx, label) in spec.labels.iter().enumerate() {
                assert_eq!(
                    ordinal_for(spec.feature, label),
                    Some(idx),
                    "duplicate label {label:?} in {}",
                    spec.feature
                );
            }
        }
    }

    #[test]
    fn ranges_are_well_formed() {
        for spec in RANGES {
            assert!(spec.min < spec.max, "{} range inverted", spec.feature);
        }
        assert_eq!(range_for("Age"), Some((0.0, 120.0)));
        assert_eq!(range_for("BMI"), Some((10.0, 50.0)));
        assert_eq!(range_for("Shoe size"), None);
    }
}
