use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::catalog::CURRENT_CONDITIONS;
use super::gateway::RequiredFields;
use super::reconcile::{reconcile, ConditionReport};
use super::repo::HealthRecord;

/// A stored record with its assessment reconciled for presentation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input: serde_json::Value,
    pub risk_assessment: BTreeMap<String, ConditionReport>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<HealthRecord> for RecordView {
    fn from(record: HealthRecord) -> Self {
        let risk_assessment = reconcile(&record.risk_assessment, CURRENT_CONDITIONS);
        Self {
            id: record.id,
            user_id: record.user_id,
            input: record.input,
            risk_assessment,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for a scored-and-saved submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub results: BTreeMap<String, ConditionReport>,
    pub record: RecordView,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<RecordView>,
}

/// Response for score-only assessment, nothing persisted.
#[derive(Debug, Serialize)]
pub struct AssessmentResponse {
    pub success: bool,
    pub results: BTreeMap<String, ConditionReport>,
}

#[derive(Debug, Serialize)]
pub struct RequiredFieldsResponse {
    pub success: bool,
    pub required_fields: RequiredFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn record_view_reconciles_legacy_assessment() {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            input: json!({ "Age": 45.0 }),
            risk_assessment: json!({
                "heartDisease": { "riskScore": 71, "probability": "high" }
            }),
            created_at: datetime!(2023-01-01 00:00 UTC),
            updated_at: datetime!(2023-01-01 00:00 UTC),
        };

        let view = RecordView::from(record);
        // Legacy condition kept, current conditions sentinel-filled.
        assert!(view.risk_assessment.contains_key("heartDisease"));
        for condition in CURRENT_CONDITIONS {
            assert!(view.risk_assessment.contains_key(*condition));
        }

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["riskAssessment"]["heartDisease"]["risk_score"], json!(71.0));
        assert_eq!(json["riskAssessment"]["kidney_stone"]["risk_score"], json!("unknown"));
    }
}
