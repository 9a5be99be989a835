use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{NewUser, UserPatch};
use super::service::{AccountError, AccountService, LoginRequest};
use crate::brokerage::domain::ValidationError;
use crate::brokerage::BrokerageError;
use crate::store::EntityStore;

type SharedAccounts<S> = Arc<AccountService<S>>;

/// Registration, login and user maintenance routes.
pub fn account_router<S>(service: SharedAccounts<S>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/api/register", post(register_handler::<S>))
        .route("/api/login", post(login_handler::<S>))
        .route("/api/users", get(list_handler::<S>))
        .route(
            "/api/users/:id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .patch(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .with_state(service)
}

fn malformed(field: &'static str, reason: String) -> Response {
    AccountError::from(ValidationError::InvalidInput { field, reason }).into_response()
}

pub(crate) async fn register_handler<S>(
    State(service): State<SharedAccounts<S>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Response
where
    S: EntityStore + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed("body", rejection.body_text()),
    };
    match service.register(draft) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn login_handler<S>(
    State(service): State<SharedAccounts<S>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response
where
    S: EntityStore + 'static,
{
    let Json(login) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed("body", rejection.body_text()),
    };
    match service.authenticate(&login) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_handler<S>(State(service): State<SharedAccounts<S>>) -> Response
where
    S: EntityStore + 'static,
{
    match service.list() {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<SharedAccounts<S>>,
    id: Result<Path<String>, PathRejection>,
) -> Response
where
    S: EntityStore + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return malformed("id", rejection.body_text()),
    };
    match service.get(&id) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<SharedAccounts<S>>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Response
where
    S: EntityStore + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return malformed("id", rejection.body_text()),
    };
    let Json(patch) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed("body", rejection.body_text()),
    };
    match service.update(&id, patch) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<SharedAccounts<S>>,
    id: Result<Path<String>, PathRejection>,
) -> Response
where
    S: EntityStore + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return malformed("id", rejection.body_text()),
    };
    match service.delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        match self {
            AccountError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            AccountError::Validation(error) => BrokerageError::from(error).into_response(),
            AccountError::Store(error) => BrokerageError::from(error).into_response(),
            AccountError::Credentials(_) => {
                error!(error = %self, "credential handling failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "credential check failed" })),
                )
                    .into_response()
            }
        }
    }
}
