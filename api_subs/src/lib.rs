use actix_web::web::{self};
use common::error::AppError;

pub mod routes {
    pub mod sub;
}

pub mod services {
    pub mod cost;
    pub mod sub;
}

pub mod dtos {
    pub mod sub;
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request body: {}", err);
        AppError::BadRequest("Invalid request body".to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected query string: {}", err);
        AppError::BadRequest("Invalid query parameters".to_string()).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request path: {}", err);
        AppError::BadRequest("Invalid request uri".to_string()).into()
    })
}

/// Subscription CRUD and cost aggregation, expecting a
/// `web::Data<dyn SubscriptionStore>` in app data.
pub fn mount_subscriptions() -> actix_web::Scope {
    web::scope("/subscriptions")
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(routes::sub::post_subscription)
        .service(routes::sub::get_subscriptions)
        // must stay ahead of "/{id}"
        .service(routes::sub::get_total_cost)
        .service(routes::sub::get_subscription)
        .service(routes::sub::put_subscription)
        .service(routes::sub::delete_subscription)
}
