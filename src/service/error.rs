use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Course {0} not found")]
    CourseNotFound(Uuid),

    #[error("Payment not found for {0}")]
    PaymentNotFound(String),

    #[error("Payment {0} has not been captured")]
    PaymentNotCaptured(Uuid),

    #[error("Payout file {0} not found")]
    PayoutFileNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::UserNotFound(_)
            | ServiceError::CourseNotFound(_)
            | ServiceError::PaymentNotFound(_)
            | ServiceError::PayoutFileNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::Validation(_) | ServiceError::Csv(_) => HttpError::bad_request(error.to_string()),

            ServiceError::PaymentNotCaptured(_) => HttpError::conflict(error.to_string()),

            ServiceError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }

            _ => HttpError::server_error(error.to_string()),
        }
    }
}
