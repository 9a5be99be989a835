use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::brokerage::documents::{
    DocumentRenderer, InvoiceDocument, QuoteDocument, RateConfirmationDocument, RenderError,
    RenderedDocument, TextDocumentRenderer,
};
use crate::brokerage::domain::{
    NewCarrier, NewCustomer, NewDispatch, NewFollowUp, NewInvoice, NewLead, NewOrder, NewQuote,
};
use crate::brokerage::{brokerage_router, BrokerageService};
use crate::store::{EntityStore, InMemoryStore, Record, RecordKey, StoreError};

pub(super) type TestService = BrokerageService<InMemoryStore, TextDocumentRenderer>;

pub(super) fn build_service() -> Arc<TestService> {
    Arc::new(BrokerageService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(TextDocumentRenderer::default()),
    ))
}

pub(super) fn router_for(service: Arc<TestService>) -> axum::Router {
    brokerage_router(service)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn instant(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn money(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

pub(super) fn acme() -> NewCustomer {
    NewCustomer {
        company_name: "Acme".to_string(),
        contact_person: "Wile E. Coyote".to_string(),
        email: "shipping@acme.test".to_string(),
        phone: "555-0100".to_string(),
        billing_address: Some("1 Mesa Way".to_string()),
        billing_city: Some("Phoenix".to_string()),
        billing_state: Some("AZ".to_string()),
        billing_zip_code: Some("85001".to_string()),
        ..NewCustomer::default()
    }
}

pub(super) fn globex() -> NewLead {
    NewLead {
        company_name: "Globex".to_string(),
        contact_person: "Hank Scorpio".to_string(),
        email: "hank@globex.test".to_string(),
        phone: "555-0199".to_string(),
        origin_city: Some("Cypress Creek".to_string()),
        commodity: Some("Hammocks".to_string()),
        weight: Some(18_000),
        ..NewLead::default()
    }
}

pub(super) fn roadrunner() -> NewCarrier {
    NewCarrier {
        company_name: "Roadrunner Freight".to_string(),
        contact_person: "Beep Beep".to_string(),
        email: "dispatch@roadrunner.test".to_string(),
        phone: "555-0142".to_string(),
        mc_number: Some("MC-123456".to_string()),
        dot_number: Some("DOT-654321".to_string()),
        ..NewCarrier::default()
    }
}

pub(super) fn order_for(customer_id: Option<u64>) -> NewOrder {
    NewOrder {
        order_number: None,
        customer_id,
        customer_name: None,
        lead_id: None,
        origin_company: Some("Acme Plant 2".to_string()),
        origin_address: "100 Dock St".to_string(),
        origin_city: "Chicago".to_string(),
        origin_state: "IL".to_string(),
        origin_zip_code: "60601".to_string(),
        destination_company: None,
        destination_address: "200 Yard Rd".to_string(),
        destination_city: "Dallas".to_string(),
        destination_state: "TX".to_string(),
        destination_zip_code: "75201".to_string(),
        pickup_date: date(2024, 5, 1),
        delivery_date: None,
        equipment_type: "dry_van".to_string(),
        weight: Some(42_000.0),
        commodity: Some("Anvils".to_string()),
        customer_rate: money("1200.00"),
        status: None,
        special_instructions: None,
    }
}

pub(super) fn order_with_status(customer_id: Option<u64>, status: &str) -> NewOrder {
    NewOrder {
        status: Some(status.to_string()),
        ..order_for(customer_id)
    }
}

pub(super) fn dispatch_for(order_id: u64, carrier_id: u64) -> NewDispatch {
    NewDispatch {
        order_id,
        carrier_id,
        carrier_rate: money("950.00"),
        driver_name: Some("Pat Driver".to_string()),
        truck_number: Some("T-42".to_string()),
        ..NewDispatch::default()
    }
}

pub(super) fn delivered_dispatch(
    order_id: u64,
    carrier_id: u64,
    pickup: DateTime<Utc>,
    delivery: DateTime<Utc>,
) -> NewDispatch {
    NewDispatch {
        status: Some("delivered".to_string()),
        actual_pickup_time: Some(pickup),
        actual_delivery_time: Some(delivery),
        ..dispatch_for(order_id, carrier_id)
    }
}

pub(super) fn quote_for(lead_id: Option<u64>, customer_id: Option<u64>) -> NewQuote {
    NewQuote {
        quote_number: None,
        lead_id,
        customer_id,
        origin_city: "Reno".to_string(),
        origin_state: "NV".to_string(),
        destination_city: "Boise".to_string(),
        destination_state: "ID".to_string(),
        pickup_date: Some(date(2024, 6, 3)),
        equipment_type: "reefer".to_string(),
        weight: Some(30_000.0),
        commodity: None,
        quoted_rate: money("2100.00"),
        valid_until: date(2024, 6, 30),
        status: None,
        notes: None,
    }
}

pub(super) fn invoice(invoice_type: &str, status: &str, amount: &str) -> NewInvoice {
    NewInvoice {
        invoice_number: None,
        invoice_type: invoice_type.to_string(),
        customer_id: None,
        carrier_id: None,
        order_id: None,
        dispatch_id: None,
        amount: money(amount),
        status: Some(status.to_string()),
        due_date: date(2024, 6, 15),
        paid_date: None,
        notes: None,
    }
}

pub(super) fn follow_up(title: &str, priority: &str, due_day: u32) -> NewFollowUp {
    NewFollowUp {
        title: title.to_string(),
        description: None,
        follow_up_type: "call".to_string(),
        lead_id: None,
        customer_id: None,
        carrier_id: None,
        order_id: None,
        due_date: instant(due_day, 9),
        completed: None,
        priority: Some(priority.to_string()),
        assigned_to: Some("dispatcher".to_string()),
        notes: None,
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

impl EntityStore for UnavailableStore {
    fn create<E: Record>(&self, _record: E) -> Result<E, StoreError> {
        Err(offline())
    }

    fn get<E: Record>(&self, _key: &RecordKey) -> Result<E, StoreError> {
        Err(offline())
    }

    fn list<E: Record>(&self, _filter: &dyn Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        Err(offline())
    }

    fn update<E, F, Err>(&self, _key: &RecordKey, _apply: F) -> Result<E, Err>
    where
        E: Record,
        F: FnOnce(&mut E) -> Result<(), Err>,
        Err: From<StoreError>,
    {
        Err(offline().into())
    }

    fn delete<E: Record>(&self, _key: &RecordKey) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// Renderer that refuses every document.
pub(super) struct RefusingRenderer;

impl RefusingRenderer {
    fn refuse(document: &'static str) -> RenderError {
        RenderError::Rejected {
            document,
            reason: "printer on fire".to_string(),
        }
    }
}

impl DocumentRenderer for RefusingRenderer {
    fn invoice(&self, _document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        Err(Self::refuse("invoice"))
    }

    fn quote(&self, _document: &QuoteDocument) -> Result<RenderedDocument, RenderError> {
        Err(Self::refuse("quote"))
    }

    fn rate_confirmation(
        &self,
        _document: &RateConfirmationDocument,
    ) -> Result<RenderedDocument, RenderError> {
        Err(Self::refuse("rate confirmation"))
    }
}
