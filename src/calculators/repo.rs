use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Calculator kind. Stored as TEXT; parsed at the boundary so the
/// repository only ever sees a valid variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalculatorType {
    Emi,
    Sip,
    Budget,
}

impl CalculatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculatorType::Emi => "EMI",
            CalculatorType::Sip => "SIP",
            CalculatorType::Budget => "BUDGET",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalculatorEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub calc_type: String,
    pub input_data: serde_json::Value,
    pub result_data: serde_json::Value,
    // Derived upsert key; clients only see created_at.
    #[serde(skip_serializing)]
    pub entry_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const ENTRY_COLUMNS: &str =
    "id, user_id, lead_id, calc_type, input_data, result_data, entry_date, created_at";

/// One entry per (user, type, UTC day): the partial unique index is
/// the conflict target, so a same-day save overwrites the payload in
/// one statement and a new day inserts a fresh row.
pub async fn upsert_daily(
    db: &PgPool,
    user_id: Uuid,
    calc_type: CalculatorType,
    input_data: &serde_json::Value,
    result_data: &serde_json::Value,
) -> anyhow::Result<(Uuid, bool)> {
    let (id, inserted): (Uuid, bool) = sqlx::query_as(
        r#"
        INSERT INTO calculator_entries (user_id, calc_type, input_data, result_data)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, calc_type, entry_date) WHERE user_id IS NOT NULL
        DO UPDATE SET input_data = EXCLUDED.input_data,
                      result_data = EXCLUDED.result_data,
                      created_at = now()
        RETURNING id, (xmax = 0) AS inserted
        "#,
    )
    .bind(user_id)
    .bind(calc_type.as_str())
    .bind(input_data)
    .bind(result_data)
    .fetch_one(db)
    .await?;
    Ok((id, !inserted))
}

/// Context snapshot attached to a lead submission; never owned by an
/// account and exempt from the per-day rule.
pub async fn insert_for_lead(
    db: impl sqlx::PgExecutor<'_>,
    lead_id: Uuid,
    calc_type: CalculatorType,
    input_data: &serde_json::Value,
    result_data: &serde_json::Value,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO calculator_entries (lead_id, calc_type, input_data, result_data)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(lead_id)
    .bind(calc_type.as_str())
    .bind(input_data)
    .bind(result_data)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CalculatorEntry>> {
    let entry = sqlx::query_as::<_, CalculatorEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM calculator_entries WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(entry)
}

pub async fn update_payload(
    db: &PgPool,
    id: Uuid,
    input_data: &serde_json::Value,
    result_data: &serde_json::Value,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE calculator_entries SET input_data = $2, result_data = $3 WHERE id = $1")
        .bind(id)
        .bind(input_data)
        .bind(result_data)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn history_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CalculatorEntry>> {
    let rows = sqlx::query_as::<_, CalculatorEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM calculator_entries \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT 10"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calc_type_parses_wire_names() {
        assert_eq!(
            serde_json::from_str::<CalculatorType>("\"EMI\"").unwrap(),
            CalculatorType::Emi
        );
        assert_eq!(
            serde_json::from_str::<CalculatorType>("\"SIP\"").unwrap(),
            CalculatorType::Sip
        );
        assert_eq!(
            serde_json::from_str::<CalculatorType>("\"BUDGET\"").unwrap(),
            CalculatorType::Budget
        );
        assert!(serde_json::from_str::<CalculatorType>("\"emi\"").is_err());
        assert!(serde_json::from_str::<CalculatorType>("\"LOAN\"").is_err());
    }

    #[test]
    fn calc_type_round_trips_as_str() {
        for t in [
            CalculatorType::Emi,
            CalculatorType::Sip,
            CalculatorType::Budget,
        ] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }
}
