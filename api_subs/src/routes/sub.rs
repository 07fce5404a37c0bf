use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use common::{error::Res, http::Success};
use db::SubscriptionStore;

use crate::{
    dtos::sub::{
        CreateSubscriptionRequest, ListSubscriptionsQuery, TotalCostQuery,
        UpdateSubscriptionRequest,
    },
    services,
};

/// Creates a subscription.
///
/// # Arguments
///
/// * `store` - The subscription store.
/// * `req` - Service name, price, user id, `MM-YYYY` start date and optional end date.
///
/// # Returns
///
/// `201 Created` with the stored subscription, `400` if a field is invalid.
#[post("")]
pub async fn post_subscription(
    store: web::Data<dyn SubscriptionStore>,
    req: web::Json<CreateSubscriptionRequest>,
) -> Res<impl Responder> {
    let subscription =
        services::sub::create_subscription(store.get_ref(), req.into_inner()).await?;
    Success::created(subscription)
}

/// Sums the prorated cost of matching subscriptions over a month window.
///
/// # Arguments
///
/// * `store` - The subscription store.
/// * `query` - Required `start_date` and `end_date` (`MM-YYYY`), optional
///   `user_id` and `service_name` filters.
///
/// # Returns
///
/// `200 OK` with `{"total_cost": <integer>}`.
#[get("/total")]
pub async fn get_total_cost(
    store: web::Data<dyn SubscriptionStore>,
    query: web::Query<TotalCostQuery>,
) -> Res<impl Responder> {
    let total = services::sub::total_cost(store.get_ref(), query.into_inner()).await?;
    Success::ok(total)
}

/// Lists subscriptions filtered by `user_id` and/or `service_name`, with
/// optional `limit` and `offset`. Newest first.
#[get("")]
pub async fn get_subscriptions(
    store: web::Data<dyn SubscriptionStore>,
    query: web::Query<ListSubscriptionsQuery>,
) -> Res<impl Responder> {
    let subscriptions =
        services::sub::list_subscriptions(store.get_ref(), query.into_inner()).await?;
    Success::ok(subscriptions)
}

/// Retrieves one subscription by id.
#[get("/{id}")]
pub async fn get_subscription(
    store: web::Data<dyn SubscriptionStore>,
    id: web::Path<String>,
) -> Res<impl Responder> {
    let subscription = services::sub::get_subscription(store.get_ref(), &id).await?;
    Success::ok(subscription)
}

/// Partially updates a subscription.
///
/// # Arguments
///
/// * `store` - The subscription store.
/// * `id` - The subscription id.
/// * `req` - Fields to change. Omitted fields are kept; `"end_date": ""`
///   makes the subscription open-ended.
///
/// # Returns
///
/// `200 OK` with the merged subscription, `404` if it does not exist.
#[put("/{id}")]
pub async fn put_subscription(
    store: web::Data<dyn SubscriptionStore>,
    id: web::Path<String>,
    req: web::Json<UpdateSubscriptionRequest>,
) -> Res<impl Responder> {
    let subscription =
        services::sub::update_subscription(store.get_ref(), &id, req.into_inner()).await?;
    Success::ok(subscription)
}

/// Soft-deletes a subscription. Responds `200 OK` with an empty body.
#[delete("/{id}")]
pub async fn delete_subscription(
    store: web::Data<dyn SubscriptionStore>,
    id: web::Path<String>,
) -> Res<HttpResponse> {
    services::sub::delete_subscription(store.get_ref(), &id).await?;
    Success::empty()
}
