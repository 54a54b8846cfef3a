use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::gateway::RiskAssessment;
use super::intake::CanonicalRecord;

/// One submission: the normalized questionnaire plus the scoring results,
/// owned by a user. Records are append-only; nothing updates or deletes
/// them, so concurrent submissions from one user simply create siblings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input: serde_json::Value,
    pub risk_assessment: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl HealthRecord {
    /// Persist one record in a single INSERT; either the whole row lands
    /// or nothing does.
    pub async fn save(
        db: &PgPool,
        user_id: Uuid,
        input: &CanonicalRecord,
        assessment: &RiskAssessment,
    ) -> anyhow::Result<HealthRecord> {
        let record = sqlx::query_as::<_, HealthRecord>(
            r#"
            INSERT INTO health_records (user_id, input, risk_assessment, updated_at)
            VALUES ($1, $2, $3, now())
            RETURNING id, user_id, input, risk_assessment, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(serde_json::to_value(input)?)
        .bind(serde_json::to_value(assessment)?)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    /// All of a user's records, newest first. No records is an empty list,
    /// not an error.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, user_id, input, risk_assessment, created_at, updated_at
            FROM health_records
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn record_serializes_camel_case_with_assessment_intact() {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            input: json!({ "Age": 45.0 }),
            risk_assessment: json!({
                "diabetes": { "risk_score": 42.0, "risk_level": "medium", "recommendations": [] }
            }),
            created_at: datetime!(2024-03-01 12:00 UTC),
            updated_at: datetime!(2024-03-01 12:00 UTC),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("riskAssessment").is_some());
        assert_eq!(
            value["riskAssessment"]["diabetes"]["risk_score"],
            json!(42.0)
        );
    }
}
