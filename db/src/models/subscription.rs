use chrono::{DateTime, Utc};
use common::dates::MonthYear;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A live subscription row. Soft-deleted rows are never materialized.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
