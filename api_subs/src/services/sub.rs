use chrono::{DateTime, Utc};
use common::{
    dates::MonthYear,
    error::{AppError, Res},
};
use db::{
    SubscriptionStore,
    dtos::subscription::{CostFilter, SubscriptionFilter},
    models::subscription::Subscription,
};
use uuid::Uuid;

use crate::dtos::sub::{
    CreateSubscriptionRequest, ListSubscriptionsQuery, TotalCostQuery, TotalCostResponse,
    UpdateSubscriptionRequest,
};

/// What an update does to the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDateChange {
    Keep,
    SetTo(MonthYear),
    ClearToOpenEnded,
}

/// A parsed partial update. `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPatch {
    pub service_name: Option<String>,
    pub price: Option<i32>,
    pub start_date: Option<MonthYear>,
    pub end_date: EndDateChange,
}

impl TryFrom<UpdateSubscriptionRequest> for SubscriptionPatch {
    type Error = AppError;

    fn try_from(req: UpdateSubscriptionRequest) -> Res<Self> {
        if let Some(name) = &req.service_name {
            validate_service_name(name)?;
        }
        let price = req.price.map(validate_price).transpose()?;
        let start_date = req
            .start_date
            .as_deref()
            .map(|s| parse_month_year("start date", s))
            .transpose()?;
        let end_date = match req.end_date.as_deref() {
            None => EndDateChange::Keep,
            Some(s) if s.trim().is_empty() => EndDateChange::ClearToOpenEnded,
            Some(s) => EndDateChange::SetTo(parse_month_year("end date", s)?),
        };

        Ok(SubscriptionPatch {
            service_name: req.service_name,
            price,
            start_date,
            end_date,
        })
    }
}

impl SubscriptionPatch {
    /// Merges the patch over `current`. `id`, `user_id` and `created_at`
    /// always come from `current`; `updated_at` is set to `now`.
    pub fn apply(self, current: Subscription, now: DateTime<Utc>) -> Subscription {
        Subscription {
            service_name: self.service_name.unwrap_or(current.service_name),
            price: self.price.unwrap_or(current.price),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: match self.end_date {
                EndDateChange::Keep => current.end_date,
                EndDateChange::SetTo(end) => Some(end),
                EndDateChange::ClearToOpenEnded => None,
            },
            updated_at: now,
            ..current
        }
    }
}

fn validate_service_name(name: &str) -> Res<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("service name is required"));
    }
    Ok(())
}

fn validate_price(price: i64) -> Res<i32> {
    if price <= 0 {
        return Err(AppError::validation("price must be above zero"));
    }
    i32::try_from(price).map_err(|_| AppError::validation("price is too large"))
}

fn validate_date_order(start: MonthYear, end: Option<MonthYear>) -> Res<()> {
    match end {
        Some(end) if end < start => Err(AppError::validation(
            "end date cannot precede start date",
        )),
        _ => Ok(()),
    }
}

fn parse_month_year(field: &str, raw: &str) -> Res<MonthYear> {
    if raw.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    raw.parse()
        .map_err(|e| AppError::validation(format!("{}: {}", field, e)))
}

/// Parses a subscription id taken from the request path.
pub fn parse_subscription_id(raw: &str) -> Res<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation("invalid subscription UUID"))
}

// Query parameters treat an empty value the same as a missing one.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_user_filter(raw: Option<String>) -> Res<Option<Uuid>> {
    non_empty(raw)
        .map(|id| Uuid::parse_str(id.trim()).map_err(|_| AppError::validation("invalid user ID")))
        .transpose()
}

/// Checks every invariant a stored subscription must hold.
pub fn validate_subscription(subscription: &Subscription) -> Res<()> {
    validate_service_name(&subscription.service_name)?;
    if subscription.price <= 0 {
        return Err(AppError::validation("price must be above zero"));
    }
    validate_date_order(subscription.start_date, subscription.end_date)
}

/// Validates a create request and builds the record to persist.
pub fn new_subscription(req: CreateSubscriptionRequest, now: DateTime<Utc>) -> Res<Subscription> {
    validate_service_name(&req.service_name)?;
    let price = validate_price(req.price)?;

    if req.user_id.trim().is_empty() {
        return Err(AppError::validation("user ID is required"));
    }
    let user_id = Uuid::parse_str(req.user_id.trim())
        .map_err(|_| AppError::validation("user ID must be a valid UUID"))?;

    let start_date = parse_month_year("start date", &req.start_date)?;
    let end_date = req
        .end_date
        .as_deref()
        .map(|s| parse_month_year("end date", s))
        .transpose()?;
    validate_date_order(start_date, end_date)?;

    Ok(Subscription {
        id: Uuid::new_v4(),
        service_name: req.service_name,
        price,
        user_id,
        start_date,
        end_date,
        created_at: now,
        updated_at: now,
    })
}

/// Creates a subscription.
///
/// # Returns
///
/// The persisted subscription, or `AppError::Validation` naming the first
/// offending field. Nothing is stored when validation fails.
pub async fn create_subscription(
    store: &dyn SubscriptionStore,
    req: CreateSubscriptionRequest,
) -> Res<Subscription> {
    let subscription = new_subscription(req, Utc::now()).inspect_err(|e| {
        log::warn!("Rejected subscription payload: {}", e);
    })?;

    let created = store.insert(&subscription).await?;

    log::info!(
        "Subscription created id={} user_id={}",
        created.id,
        created.user_id
    );
    Ok(created)
}

/// Fetches a live subscription by its id.
pub async fn get_subscription(store: &dyn SubscriptionStore, id: &str) -> Res<Subscription> {
    let id = parse_subscription_id(id)?;

    match store.get_by_id(id).await? {
        Some(subscription) => {
            log::debug!("Subscription retrieved id={}", id);
            Ok(subscription)
        }
        None => {
            log::warn!("Requested subscription not found id={}", id);
            Err(AppError::subscription_not_found())
        }
    }
}

/// Applies a partial update.
///
/// The merged record is validated as a whole, so e.g. moving only the start
/// date past the stored end date is rejected.
pub async fn update_subscription(
    store: &dyn SubscriptionStore,
    id: &str,
    req: UpdateSubscriptionRequest,
) -> Res<Subscription> {
    let id = parse_subscription_id(id)?;
    let patch = SubscriptionPatch::try_from(req).inspect_err(|e| {
        log::warn!("Rejected subscription update id={}: {}", id, e);
    })?;

    let Some(current) = store.get_by_id(id).await? else {
        log::warn!("Requested subscription not found id={}", id);
        return Err(AppError::subscription_not_found());
    };

    let merged = patch.apply(current, Utc::now());
    validate_subscription(&merged).inspect_err(|e| {
        log::warn!("Rejected subscription update id={}: {}", id, e);
    })?;

    // the row may have been deleted since it was read
    let updated = store
        .update(&merged)
        .await?
        .ok_or_else(AppError::subscription_not_found)?;

    log::info!("Subscription updated id={}", id);
    Ok(updated)
}

/// Soft-deletes a subscription. Deleting an unknown or already deleted id
/// is `NotFound`.
pub async fn delete_subscription(store: &dyn SubscriptionStore, id: &str) -> Res<()> {
    let id = parse_subscription_id(id)?;

    if !store.soft_delete(id).await? {
        log::warn!("Requested subscription not found id={}", id);
        return Err(AppError::subscription_not_found());
    }

    log::info!("Subscription deleted id={}", id);
    Ok(())
}

/// Lists subscriptions, newest first.
pub async fn list_subscriptions(
    store: &dyn SubscriptionStore,
    query: ListSubscriptionsQuery,
) -> Res<Vec<Subscription>> {
    let user_id = parse_user_filter(query.user_id)?;

    if query.limit.is_some_and(|limit| limit <= 0) {
        return Err(AppError::validation("invalid limit"));
    }
    if query.offset.is_some_and(|offset| offset < 0) {
        return Err(AppError::validation("invalid offset"));
    }

    let filter = SubscriptionFilter {
        user_id,
        service_name: non_empty(query.service_name),
        limit: query.limit,
        offset: query.offset,
    };
    let subscriptions = store.list(&filter).await?;

    log::debug!(
        "Subscriptions listed count={} filter={:?}",
        subscriptions.len(),
        filter
    );
    Ok(subscriptions)
}

/// Sums the prorated cost of matching subscriptions over an inclusive
/// `MM-YYYY` window.
pub async fn total_cost(
    store: &dyn SubscriptionStore,
    query: TotalCostQuery,
) -> Res<TotalCostResponse> {
    let window_start = parse_month_year("start date", query.start_date.as_deref().unwrap_or(""))?;
    let window_end = parse_month_year("end date", query.end_date.as_deref().unwrap_or(""))?;
    if window_end < window_start {
        return Err(AppError::validation("end date cannot precede start date"));
    }

    let filter = CostFilter {
        user_id: parse_user_filter(query.user_id)?,
        service_name: non_empty(query.service_name),
        window_start,
        window_end,
    };
    let total_cost = store.total_cost(&filter).await?;

    log::info!(
        "Calculated total cost total={} user_id={:?} service_name={:?} start={} end={}",
        total_cost,
        filter.user_id,
        filter.service_name,
        window_start,
        window_end
    );
    Ok(TotalCostResponse { total_cost })
}
