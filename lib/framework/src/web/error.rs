use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::exception::Exception;
use crate::exception::Severity;
use crate::exception::error_code;
use crate::json;
use crate::log;

pub type HttpResult<T> = Result<T, HttpError>;

pub struct HttpError {
    exception: Exception,
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    id: Option<String>,
    error_code: Option<&'a str>,
    message: &'a str,
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.exception.code {
            Some(error_code::VALIDATION_ERROR | error_code::BAD_REQUEST) => StatusCode::BAD_REQUEST,
            Some(error_code::FORBIDDEN) => StatusCode::FORBIDDEN,
            Some(error_code::NOT_FOUND) => StatusCode::NOT_FOUND,
            Some(error_code::UPSTREAM_ERROR) => StatusCode::BAD_GATEWAY,
            _ if self.exception.severity == Severity::Warn => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Exception> for HttpError {
    fn from(exception: Exception) -> Self {
        HttpError { exception }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        log::log_exception(&self.exception);
        let status = self.status();
        let response = ErrorResponse {
            id: log::current_action_id(),
            error_code: self.exception.code,
            message: &self.exception.message,
        };
        match json::to_json(&response) {
            Ok(body) => (status, [(axum::http::header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(_) => status.into_response(),
        }
    }
}
