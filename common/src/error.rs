use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    // === APPLICATION ERRORS ===
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::Validation(reason.into())
    }

    pub fn subscription_not_found() -> Self {
        AppError::NotFound("Subscription not found".to_string())
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let error_json = |message: &str| serde_json::json!({ "error": message });

        match self {
            // === CONVERSION ERRORS ===
            AppError::Storage(error) => {
                log::error!("Storage error: {}", error);
                HttpResponse::InternalServerError().json(error_json(INTERNAL_ERROR_MESSAGE))
            }

            // === APPLICATION ERRORS ===
            AppError::Validation(_) | AppError::BadRequest(_) => {
                HttpResponse::BadRequest().json(error_json(&self.to_string()))
            }
            AppError::NotFound(_) => HttpResponse::NotFound().json(error_json(&self.to_string())),

            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(error_json(INTERNAL_ERROR_MESSAGE))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{ResponseError, body::MessageBody};

    use super::*;

    fn body_json(err: &AppError) -> serde_json::Value {
        let bytes = err
            .error_response()
            .into_body()
            .try_into_bytes()
            .expect("json body");
        serde_json::from_slice(&bytes).expect("valid json")
    }

    #[test]
    fn validation_maps_to_bad_request_with_reason() {
        let err = AppError::validation("price must be above zero");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&err)["error"],
            "Validation error: price must be above zero"
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::subscription_not_found();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&err)["error"], "Subscription not found");
    }

    #[test]
    fn storage_errors_do_not_leak_details() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&err)["error"], INTERNAL_ERROR_MESSAGE);

        let err = AppError::Internal("connection reset by peer".to_string());
        assert_eq!(body_json(&err)["error"], INTERNAL_ERROR_MESSAGE);
    }
}
