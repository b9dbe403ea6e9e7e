use std::fmt::Debug;

use axum::extract::FromRequest;
use axum::extract::Request;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::exception::error_code;
use crate::json;
use crate::validate::Validator;
use crate::web::error::HttpError;

/// Json body, validated on extraction.
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validator,
{
    type Rejection = HttpError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match String::from_request(request, state).await {
            Ok(body) => body,
            Err(rejection) => {
                let error_message = rejection.body_text();
                return Err(validation_error!(
                    code = error_code::BAD_REQUEST,
                    message = format!("failed to read body, error={error_message}")
                )
                .into());
            }
        };
        debug!("[request] body={body}");
        let value: T = json::from_json(&body).map_err(|exception| {
            HttpError::from(exception!(
                severity = crate::exception::Severity::Warn,
                code = error_code::BAD_REQUEST,
                message = "failed to parse json body",
                source = exception
            ))
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        match json::to_json(&self.0) {
            Ok(body) => {
                debug!("[response] body={body}");
                ([(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Err(exception) => HttpError::from(exception).into_response(),
        }
    }
}
