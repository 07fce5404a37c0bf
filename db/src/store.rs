use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::{
    dtos::subscription::{CostFilter, SubscriptionFilter},
    models::subscription::Subscription,
};

/// Persistence operations the subscription service depends on.
///
/// Implementations only ever see and return live rows: anything soft-deleted
/// behaves as if it did not exist. "Nothing matched" is reported through
/// `Option`/`bool` rather than an error so callers decide what it means.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persists a new row exactly as given and returns what was stored.
    async fn insert(&self, subscription: &Subscription) -> Res<Subscription>;

    async fn get_by_id(&self, id: Uuid) -> Res<Option<Subscription>>;

    /// Overwrites the mutable columns (service name, price, dates and
    /// `updated_at`) of a live row. `id`, `user_id` and `created_at` are
    /// left untouched. Returns `None` when no live row has that id.
    async fn update(&self, subscription: &Subscription) -> Res<Option<Subscription>>;

    /// Marks a live row deleted. Returns `false` when no live row has that id.
    async fn soft_delete(&self, id: Uuid) -> Res<bool>;

    /// Rows matching the filter, newest first (ties broken by id, descending).
    async fn list(&self, filter: &SubscriptionFilter) -> Res<Vec<Subscription>>;

    /// Sum of the prorated cost of every matching row over the filter window.
    async fn total_cost(&self, filter: &CostFilter) -> Res<i64>;
}
