use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Captured contact-and-intent record. Immutable once created and
/// never tied to an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub full_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub income: Option<String>,
    pub consent: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: impl sqlx::PgExecutor<'_>,
    full_name: &str,
    mobile: &str,
    email: Option<&str>,
    city: Option<&str>,
    income: Option<&str>,
    consent: bool,
) -> anyhow::Result<Lead> {
    let lead = sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (full_name, mobile, email, city, income, consent)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, full_name, mobile, email, city, income, consent, created_at
        "#,
    )
    .bind(full_name)
    .bind(mobile)
    .bind(email)
    .bind(city)
    .bind(income)
    .bind(consent)
    .fetch_one(db)
    .await?;
    Ok(lead)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, full_name, mobile, email, city, income, consent, created_at
        FROM leads
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(leads)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
        .fetch_one(db)
        .await?;
    Ok(n)
}
