//! Request extractors that reject with structured errors.
//!
//! Drop-in counterparts of the stock axum extractors. Every rejection is
//! converted into the handler [`Error`] type so malformed requests produce
//! the same JSON error shape as every other failure path.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Json as AxumJson, Path as AxumPath, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::handler::{Error, ErrorKind};

/// JSON body extractor with structured rejections.
///
/// Also see [`axum::Json`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Creates a new [`Json`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::BadRequest
                .with_message("Request body does not match the expected schema")
                .with_context(sanitize_rejection(&err.to_string())),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::BadRequest
                .with_message("Request body is not well-formed JSON")
                .with_context(sanitize_rejection(&err.to_string())),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message("Content-Type header must be set to application/json"),
            rejection => ErrorKind::BadRequest
                .with_message("Failed to read request body")
                .with_context(sanitize_rejection(&rejection.to_string())),
        }
    }
}

/// Path parameter extractor with structured rejections.
///
/// Also see [`axum::extract::Path`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Path<T>(pub T);

impl<T> Path<T> {
    /// Creates a new [`Path`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner path parameters.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extractor =
            <AxumPath<T> as FromRequestParts<S>>::from_request_parts(parts, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                let message = err.to_string();
                let hint = if message.to_lowercase().contains("uuid") {
                    "Identifiers must be UUIDs in the canonical hyphenated form"
                } else {
                    "Check that the parameter matches the expected type"
                };
                ErrorKind::BadRequest
                    .with_message("Invalid path parameter")
                    .with_context(format!("{}. {}", sanitize_rejection(&message), hint))
            }
            PathRejection::MissingPathParams(err) => ErrorKind::MissingPathParam
                .with_message("Required path parameter missing")
                .with_context(sanitize_rejection(&err.to_string())),
            _ => ErrorKind::InternalServerError.with_message("Path processing failed"),
        }
    }
}

/// JSON body extractor that validates after deserializing.
///
/// Combines [`Json`] with the `validator` crate. Any type implementing
/// both `Deserialize` and `Validate` works.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Creates a new instance of [`ValidateJson`].
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self::new(data))
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors
                    .iter()
                    .map(move |error| describe_validation_error(field, error))
            })
            .collect();

        let user_message = match messages.as_slice() {
            [] => "Validation failed".to_string(),
            [single] => single.clone(),
            multiple => multiple.join(". "),
        };

        tracing::warn!(
            errors = ?errors.field_errors(),
            "request validation failed"
        );

        ErrorKind::BadRequest
            .with_message(user_message)
            .with_resource("request")
    }
}

fn describe_validation_error(field: &str, error: &validator::ValidationError) -> String {
    if let Some(custom) = &error.message {
        return format!("Field '{}': {}", field, custom);
    }

    match error.code.as_ref() {
        "range" => {
            let min = error.params.get("min").and_then(param_number);
            let max = error.params.get("max").and_then(param_number);
            match (min, max) {
                (Some(min), Some(max)) => {
                    format!("Field '{}' must be between {} and {}", field, min, max)
                }
                (Some(min), None) => format!("Field '{}' must be at least {}", field, min),
                (None, Some(max)) => format!("Field '{}' must be at most {}", field, max),
                (None, None) => format!("Field '{}' is out of valid range", field),
            }
        }
        "length" => format!("Field '{}' has invalid length", field),
        "required" => format!("Field '{}' is required", field),
        code => format!("Field '{}' failed validation: {}", field, code),
    }
}

fn param_number(value: &serde_json::Value) -> Option<f64> {
    value.as_f64()
}

/// Trims rejection text to a couple of lines so internals do not leak
/// into client-facing context.
fn sanitize_rejection(message: &str) -> String {
    message
        .lines()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(200)
        .collect()
}

impl<T> aide::OperationInput for Json<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumJson::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_early_responses(ctx, operation)
    }
}

impl<T> aide::OperationOutput for Json<T>
where
    T: schemars::JsonSchema + Serialize,
{
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        AxumJson::<T>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_responses(ctx, operation)
    }
}

impl<T> aide::OperationInput for Path<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumPath::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumPath::<T>::inferred_early_responses(ctx, operation)
    }
}

impl<T> aide::OperationInput for ValidateJson<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumJson::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_early_responses(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Debug, serde::Deserialize, Validate)]
    struct ExtendBody {
        #[validate(range(min = 1, max = 7))]
        days: i64,
    }

    #[test]
    fn sanitize_rejection_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_rejection(&long).len(), 200);

        let multiline = "first\nsecond\nthird\nfourth";
        assert_eq!(sanitize_rejection(multiline), "first second");
    }

    #[test]
    fn validation_errors_become_bad_request() {
        let body = ExtendBody { days: 30 };
        let errors = body.validate().unwrap_err();

        let error: Error<'static> = errors.into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        let message = error.message().unwrap_or_default().to_string();
        assert!(message.contains("days"));
        assert!(message.contains('7'));
    }

    #[test]
    fn valid_body_passes_validation() {
        let body = ExtendBody { days: 3 };
        assert!(body.validate().is_ok());
    }
}
