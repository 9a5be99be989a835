//! Freight brokerage workflow: leads and customers, carriers, quotes, orders,
//! dispatches, invoices and follow-up tasks.
//!
//! Entities live in an [`EntityStore`](crate::store::EntityStore); the
//! [`BrokerageService`] validates payloads, applies lifecycle rules and maps
//! store failures onto [`BrokerageError`]. [`brokerage_router`] exposes the
//! service under `/api`.

pub mod dashboard;
pub mod documents;
pub mod domain;
pub mod ids;
pub mod integrity;
pub mod lifecycle;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use dashboard::DashboardStats;
pub use documents::{
    DocumentRenderer, InvoiceDocument, QuoteDocument, QuoteRecipient, RateConfirmationDocument,
    RenderError, RenderedDocument, TextDocumentRenderer,
};
pub use domain::{
    Carrier, CarrierPatch, Customer, CustomerPatch, Dispatch, DispatchPatch, EntityKind, FollowUp,
    FollowUpPatch, Invoice, InvoicePatch, Lead, LeadPatch, NewCarrier, NewCustomer, NewDispatch,
    NewFollowUp, NewInvoice, NewLead, NewOrder, NewQuote, Order, OrderPatch, Quote, QuotePatch,
    Resource, ValidationError,
};
pub use ids::{NumberAllocator, NumberPrefix};
pub use integrity::{DeletePolicy, Dependent, IntegrityError, Reference, Relationship};
pub use lifecycle::{
    DispatchStatus, FollowUpPriority, InvoiceStatus, InvoiceType, LeadStatus, Lifecycle,
    OrderStatus, QuoteStatus, Vocabulary,
};
pub use router::brokerage_router;
pub use service::{BrokerageError, BrokerageService};
