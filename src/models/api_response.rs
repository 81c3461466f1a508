use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::{exchange::Validation, transaction::TransactionResult};

// Generic API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: u16,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

// Success response helper
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        status: "SUCCESS".to_string(),
        code: 200,
        result: Some(data),
        error: None,
    })
}

/// Failed operations still return their result body, under a 422.
pub fn transaction_response(result: TransactionResult) -> HttpResponse {
    match result.reason().map(str::to_string) {
        None => success_response(result),
        Some(reason) => unprocessable(result, reason),
    }
}

pub fn validation_response(validation: Validation) -> HttpResponse {
    match validation.reason.clone() {
        Some(reason) if !validation.valid => unprocessable(validation, reason),
        _ => success_response(validation),
    }
}

fn unprocessable<T: Serialize>(data: T, reason: String) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiResponse {
        status: "FAILURE".to_string(),
        code: 422,
        result: Some(data),
        error: Some(ApiError::new(422, reason)),
    })
}
