use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::documents::{DocumentRenderer, RenderedDocument};
use super::domain::{Carrier, Customer, Dispatch, FollowUp, Invoice, Lead, Order, Quote, Resource};
use super::service::{BrokerageError, BrokerageService};
use crate::store::EntityStore;

type SharedService<S, D> = Arc<BrokerageService<S, D>>;

/// Router builder exposing the brokerage entities, dashboard and documents.
pub fn brokerage_router<S, D>(service: SharedService<S, D>) -> Router
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    Router::new()
        .merge(resource_routes::<Lead, S, D>())
        .merge(resource_routes::<Customer, S, D>())
        .merge(resource_routes::<Carrier, S, D>())
        .merge(resource_routes::<Order, S, D>())
        .merge(resource_routes::<Dispatch, S, D>())
        .merge(resource_routes::<Quote, S, D>())
        .merge(resource_routes::<Invoice, S, D>())
        .merge(resource_routes::<FollowUp, S, D>())
        .route("/api/dashboard/stats", get(dashboard_handler::<S, D>))
        .route("/api/followups/urgent", get(urgent_follow_ups_handler::<S, D>))
        .route(
            "/api/dispatches/:id/rate-confirmation",
            get(rate_confirmation_handler::<S, D>),
        )
        .route("/api/invoices/:id/pdf", get(invoice_document_handler::<S, D>))
        .route("/api/quotes/:id/pdf", get(quote_document_handler::<S, D>))
        .with_state(service)
}

/// Collection and member routes for one entity kind.
fn resource_routes<E, S, D>() -> Router<SharedService<S, D>>
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let collection = format!("/api/{}", E::KIND.collection());
    let member = format!("{collection}/:id");

    Router::new()
        .route(
            &collection,
            get(list_handler::<E, S, D>).post(create_handler::<E, S, D>),
        )
        .route(
            &member,
            get(get_handler::<E, S, D>)
                .put(update_handler::<E, S, D>)
                .patch(update_handler::<E, S, D>)
                .delete(delete_handler::<E, S, D>),
        )
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    status: Option<String>,
}

pub(crate) async fn list_handler<E, S, D>(
    State(service): State<SharedService<S, D>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected("query", rejection.body_text()),
    };
    match service.list::<E>(query.status.as_deref()) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_handler<E, S, D>(
    State(service): State<SharedService<S, D>>,
    payload: Result<Json<E::Draft>, JsonRejection>,
) -> Response
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let Json(draft) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("body", rejection.body_text()),
    };
    match service.create::<E>(draft) {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<E, S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected("id", rejection.body_text()),
    };
    match service.get::<E>(&id.into()) {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_handler<E, S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<E::Patch>, JsonRejection>,
) -> Response
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected("id", rejection.body_text()),
    };
    let Json(patch) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("body", rejection.body_text()),
    };
    match service.update::<E>(&id.into(), patch) {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<E, S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response
where
    E: Resource,
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected("id", rejection.body_text()),
    };
    match service.delete::<E>(&id.into()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn dashboard_handler<S, D>(State(service): State<SharedService<S, D>>) -> Response
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    match service.dashboard() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn urgent_follow_ups_handler<S, D>(
    State(service): State<SharedService<S, D>>,
) -> Response
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    match service.urgent_follow_ups() {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `GET /api/invoices/:id/pdf`. The path keeps its existing name for clients;
/// the body and content type are whatever the renderer produces, plain text
/// for [`TextDocumentRenderer`](super::TextDocumentRenderer).
pub(crate) async fn invoice_document_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    match id {
        Ok(Path(id)) => document_response(service.invoice_document(id)),
        Err(rejection) => rejected("id", rejection.body_text()),
    }
}

/// `GET /api/quotes/:id/pdf`, served from the renderer like the invoice route.
pub(crate) async fn quote_document_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    match id {
        Ok(Path(id)) => document_response(service.quote_document(id)),
        Err(rejection) => rejected("id", rejection.body_text()),
    }
}

pub(crate) async fn rate_confirmation_handler<S, D>(
    State(service): State<SharedService<S, D>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response
where
    S: EntityStore + 'static,
    D: DocumentRenderer + 'static,
{
    match id {
        Ok(Path(id)) => document_response(service.rate_confirmation(id)),
        Err(rejection) => rejected("id", rejection.body_text()),
    }
}

fn document_response(result: Result<RenderedDocument, BrokerageError>) -> Response {
    match result {
        Ok(document) => {
            let headers = [
                (header::CONTENT_TYPE, document.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", document.file_name),
                ),
            ];
            (StatusCode::OK, headers, document.body).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Malformed requests are reported like any other invalid input.
fn rejected(field: &'static str, reason: String) -> Response {
    BrokerageError::InvalidInput { field, reason }.into_response()
}

impl BrokerageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateKey { .. }
            | Self::ReferencedByDependents { .. }
            | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::DanglingReference { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidStatus { .. } => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BrokerageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "brokerage request failed");
        }

        let payload = match &self {
            Self::ReferencedByDependents { dependents, .. } => json!({
                "error": self.to_string(),
                "dependents": dependents,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(payload)).into_response()
    }
}
