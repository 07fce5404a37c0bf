//! In-memory subscription store for testing

use std::sync::Arc;

use api_subs::services::cost::{overlaps, subscription_cost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use dashmap::DashMap;
use db::{
    SubscriptionStore,
    dtos::subscription::{CostFilter, SubscriptionFilter},
    models::subscription::Subscription,
};
use uuid::Uuid;

#[derive(Clone)]
struct StoredRow {
    subscription: Subscription,
    deleted_at: Option<DateTime<Utc>>,
}

/// Keeps soft-deleted rows around like the real table does.
#[derive(Default, Clone)]
pub struct MemoryStore {
    rows: Arc<DashMap<Uuid, StoredRow>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing the service
    pub fn seed(&self, subscription: Subscription) {
        self.rows.insert(
            subscription.id,
            StoredRow {
                subscription,
                deleted_at: None,
            },
        );
    }

    /// Total rows including soft-deleted ones
    pub fn stored_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_soft_deleted(&self, id: Uuid) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|row| row.deleted_at.is_some())
    }

    fn live(&self) -> Vec<Subscription> {
        self.rows
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.subscription.clone())
            .collect()
    }
}

fn matches(sub: &Subscription, user_id: Option<Uuid>, service_name: Option<&str>) -> bool {
    user_id.is_none_or(|id| sub.user_id == id)
        && service_name.is_none_or(|name| sub.service_name == name)
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn insert(&self, subscription: &Subscription) -> Res<Subscription> {
        if self.rows.contains_key(&subscription.id) {
            return Err(AppError::Internal(format!(
                "duplicate key {}",
                subscription.id
            )));
        }
        self.seed(subscription.clone());
        Ok(subscription.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Res<Option<Subscription>> {
        Ok(self
            .rows
            .get(&id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.subscription.clone()))
    }

    async fn update(&self, subscription: &Subscription) -> Res<Option<Subscription>> {
        let Some(mut row) = self.rows.get_mut(&subscription.id) else {
            return Ok(None);
        };
        if row.deleted_at.is_some() {
            return Ok(None);
        }

        let stored = &mut row.subscription;
        stored.service_name = subscription.service_name.clone();
        stored.price = subscription.price;
        stored.start_date = subscription.start_date;
        stored.end_date = subscription.end_date;
        stored.updated_at = subscription.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> Res<bool> {
        match self.rows.get_mut(&id) {
            Some(mut row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, filter: &SubscriptionFilter) -> Res<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .live()
            .into_iter()
            .filter(|sub| matches(sub, filter.user_id, filter.service_name.as_deref()))
            .collect();

        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(subs.into_iter().skip(offset).take(limit).collect())
    }

    async fn total_cost(&self, filter: &CostFilter) -> Res<i64> {
        Ok(self
            .live()
            .iter()
            .filter(|sub| matches(sub, filter.user_id, filter.service_name.as_deref()))
            .filter(|sub| {
                overlaps(
                    sub.start_date,
                    sub.end_date,
                    filter.window_start,
                    filter.window_end,
                )
            })
            .map(|sub| subscription_cost(sub, filter.window_start, filter.window_end))
            .sum())
    }
}
