use std::sync::Arc;

use async_trait::async_trait;
use common::error::{AppError, Res};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::subscription::{CostFilter, SubscriptionFilter},
    models::subscription::Subscription,
    store::SubscriptionStore,
};

const SUBSCRIPTION_COLUMNS: &str =
    "id, service_name, price, user_id, start_date, end_date, created_at, updated_at";

pub async fn insert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &Subscription,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(data.id)
    .bind(&data.service_name)
    .bind(data.price)
    .bind(data.user_id)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.created_at)
    .bind(data.updated_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_subscription_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: &Subscription,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET service_name = $2, price = $3, start_date = $4, end_date = $5, updated_at = $6
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(data.id)
    .bind(&data.service_name)
    .bind(data.price)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.updated_at)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn soft_delete_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
) -> Res<bool> {
    let result = sqlx::query(
        "UPDATE subscriptions SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Appends the live-row condition plus the optional equality filters.
fn push_common_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    user_id: Option<Uuid>,
    service_name: Option<&str>,
) {
    qb.push(" WHERE deleted_at IS NULL");

    if let Some(user_id) = user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }

    if let Some(service_name) = service_name {
        qb.push(" AND service_name = ")
            .push_bind(service_name.to_string());
    }
}

pub async fn list_subscriptions<'e, E>(
    executor: E,
    filter: &SubscriptionFilter,
) -> Res<Vec<Subscription>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions"));

    push_common_filters(&mut qb, filter.user_id, filter.service_name.as_deref());

    qb.push(" ORDER BY created_at DESC, id DESC");

    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }

    if let Some(offset) = filter.offset {
        qb.push(" OFFSET ").push_bind(offset);
    }

    qb.build_query_as::<Subscription>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

/// Computes the prorated total in a single statement.
///
/// Each row overlapping the window contributes `price` times the inclusive
/// number of months in the intersection of its active interval and the
/// window; an open-ended row runs through the window end.
pub async fn total_subscription_cost<'e, E>(executor: E, filter: &CostFilter) -> Res<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT COALESCE(SUM(
            ((EXTRACT(YEAR FROM effective_end)::bigint - EXTRACT(YEAR FROM effective_start)::bigint) * 12
            + (EXTRACT(MONTH FROM effective_end)::bigint - EXTRACT(MONTH FROM effective_start)::bigint)
            + 1) * price
        ), 0)::bigint AS total_cost
        FROM (
            SELECT price::bigint AS price,
                   GREATEST(start_date, "#,
    );
    qb.push_bind(filter.window_start);
    qb.push(") AS effective_start, LEAST(COALESCE(end_date, ");
    qb.push_bind(filter.window_end);
    qb.push("), ");
    qb.push_bind(filter.window_end);
    qb.push(") AS effective_end FROM subscriptions");

    push_common_filters(&mut qb, filter.user_id, filter.service_name.as_deref());

    qb.push(" AND start_date <= ").push_bind(filter.window_end);
    qb.push(" AND (end_date IS NULL OR end_date >= ")
        .push_bind(filter.window_start)
        .push(")");
    qb.push(") AS overlapping WHERE effective_end >= effective_start");

    qb.build_query_scalar::<i64>()
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

/// [`SubscriptionStore`] backed by the Postgres pool.
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: Arc<PgPool>,
}

impl PgSubscriptionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Res<Subscription> {
        insert_subscription(&*self.pool, subscription).await
    }

    async fn get_by_id(&self, id: Uuid) -> Res<Option<Subscription>> {
        get_subscription_by_id(&*self.pool, id).await
    }

    async fn update(&self, subscription: &Subscription) -> Res<Option<Subscription>> {
        update_subscription(&*self.pool, subscription).await
    }

    async fn soft_delete(&self, id: Uuid) -> Res<bool> {
        soft_delete_subscription(&*self.pool, id).await
    }

    async fn list(&self, filter: &SubscriptionFilter) -> Res<Vec<Subscription>> {
        list_subscriptions(&*self.pool, filter).await
    }

    async fn total_cost(&self, filter: &CostFilter) -> Res<i64> {
        total_subscription_cost(&*self.pool, filter).await
    }
}
