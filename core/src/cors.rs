use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use logger::REQUEST_ID_HEADER;

/// `*` allows any origin, anything else is matched exactly.
pub fn middleware(origin: &str) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers(vec![HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(3600);

    if origin == "*" {
        cors.allow_any_origin()
    } else {
        cors.allowed_origin(origin)
    }
}
