//! Body and query extractors whose rejections render as `VALIDATION_ERROR`.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Axum rejections that can be reported to the client as plain text.
trait RejectionText {
    fn text(&self) -> String;
}

impl RejectionText for JsonRejection {
    fn text(&self) -> String {
        self.body_text()
    }
}

impl RejectionText for QueryRejection {
    fn text(&self) -> String {
        self.body_text()
    }
}

fn invalid_input(rejection: impl RejectionText) -> AppError {
    AppError::validation(rejection.text())
}

/// JSON request body.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| AppJson(value))
            .map_err(invalid_input)
    }
}

/// Query string parameters.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| AppQuery(value))
            .map_err(invalid_input)
    }
}
